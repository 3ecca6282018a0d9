pub mod crop;
pub mod difference_of_gaussian;
pub mod eye_alignment;
pub mod gamma_correction;
mod gaussian;
pub mod grayscale;
pub mod histogram_equalization;
pub mod local_binary_pattern;
pub mod masking;
pub mod resize;
