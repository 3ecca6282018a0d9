pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Directory name used under the platform config and cache dirs.
pub const APP_DIR_NAME: &str = "FacePrep";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Edge length of recognition images after the resize step.
pub const DEFAULT_FACE_SIZE: u32 = 160;
pub const DEFAULT_GAMMA: f64 = 0.2;
pub const DEFAULT_SIGMAS: [f64; 2] = [0.25, 2.0];

/// Largest accepted difference-of-Gaussian blur width.
pub const MAX_SIGMA: f64 = 32.0;
