use std::path::{Path, PathBuf};

use cryscope::ml::CryLabel;
use serde_json::json;

/// Write a one-tree forest that always votes for `label`.
pub fn write_constant_forest(dir: &Path, label: CryLabel, feature_len: usize) -> PathBuf {
    let model = json!({
        "model_version": 1,
        "feature_len_f32": feature_len,
        "classes": CryLabel::ALL,
        "trees": [{"nodes": [{"kind": "leaf", "class": label.index()}]}]
    });
    let path = dir.join("forest.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&model).expect("serialize forest"))
        .expect("write forest");
    path
}

/// Write an MLP whose output bias alone decides the class.
pub fn write_biased_mlp(dir: &Path, label: CryLabel, feature_len: usize) -> PathBuf {
    let hidden = 2usize;
    let mut bias2 = vec![0.0_f32; CryLabel::ALL.len()];
    bias2[label.index()] = 5.0;
    let model = json!({
        "model_version": 1,
        "feature_len_f32": feature_len,
        "classes": CryLabel::ALL,
        "hidden_size": hidden,
        "weights1": vec![0.0_f32; feature_len * hidden],
        "bias1": vec![0.0_f32; hidden],
        "weights2": vec![0.0_f32; CryLabel::ALL.len() * hidden],
        "bias2": bias2,
        "feature_mean": vec![0.0_f32; feature_len],
        "feature_std": vec![1.0_f32; feature_len],
    });
    let path = dir.join("dense.json");
    std::fs::write(&path, serde_json::to_vec(&model).expect("serialize mlp"))
        .expect("write mlp");
    path
}
