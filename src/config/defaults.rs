use crate::features::{DEFAULT_FLAT_LENGTH, DEFAULT_IMAGE_SIZE};

pub(super) const MAX_WORKER_COUNT: u32 = 32;
const MIN_IMAGE_SIZE: u32 = 16;
const MAX_IMAGE_SIZE: u32 = 1024;

pub(super) fn default_image_size() -> u32 {
    DEFAULT_IMAGE_SIZE
}

pub(super) fn default_flat_length() -> usize {
    DEFAULT_FLAT_LENGTH
}

pub(super) fn default_worker_count() -> u32 {
    0
}

pub(super) fn clamp_worker_count(value: u32) -> u32 {
    value.min(MAX_WORKER_COUNT)
}

pub(super) fn clamp_image_size(value: u32) -> u32 {
    value.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE)
}
