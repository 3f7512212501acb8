//! Dense two-layer classifier over flat MFCC vectors.

mod model;

pub use model::MlpModel;
