pub mod atrous;
pub mod noise;

pub use atrous::{decompose, mirror_index};
pub use noise::{estimate_noise, noise_ksigma, noise_mrs, NoiseEstimate};
