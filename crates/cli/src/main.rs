use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use face_prep_core::detection::domain::face_detector::FaceDetector;
use face_prep_core::detection::infrastructure::model_resolver::{
    ModelResolver, ModelSource, ProgressFn,
};
use face_prep_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use face_prep_core::io::domain::image_reader::ImageReader;
use face_prep_core::io::domain::image_writer::ImageWriter;
use face_prep_core::io::infrastructure::image_file_reader::ImageFileReader;
use face_prep_core::io::infrastructure::image_file_writer::ImageFileWriter;
use face_prep_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use face_prep_core::pipeline::preprocessor::Preprocessor;
use face_prep_core::settings::Settings;
use face_prep_core::shared::image::Image;
use face_prep_core::shared::usage::Usage;

/// Face preprocessing for detection and recognition.
#[derive(Parser)]
#[command(name = "face-prep")]
struct Cli {
    /// Input image files.
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Directory for the processed face images.
    #[arg(long)]
    output: PathBuf,

    /// Pipeline to run: detection or recognition.
    #[arg(long, default_value = "recognition")]
    usage: Usage,

    /// Only crop the detected faces, skipping the recognition steps.
    #[arg(long)]
    cropped: bool,

    /// Settings file (defaults to the user settings).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Drop faces whose eyes cannot be detected.
    #[arg(long)]
    eye_detection: bool,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Face detection model (downloaded on first use when omitted).
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = load_settings(&cli)?;
    let names = settings.load_step_names()?;
    let detector = build_detector(cli.model.as_deref(), settings.confidence)?;

    let mut preprocessor = Preprocessor::new(settings, names, detector)
        .with_logger(Box::new(StdoutPipelineLogger::new()));
    let reader = ImageFileReader::new();
    let writer = ImageFileWriter::new();

    let total = cli.input.len();
    let mut written = 0;
    for (i, input) in cli.input.iter().enumerate() {
        preprocessor.logger_mut().progress(i + 1, total);
        let image = reader.read(input)?;

        let result = if cli.cropped {
            preprocessor.produce_cropped_faces(image)?
        } else {
            preprocessor.produce_processed_faces(image, cli.usage)?
        };

        let Some(faces) = result else {
            log::info!("No face found in {}", input.display());
            continue;
        };

        if let Some(regions) = preprocessor.faces_for_recognition() {
            log::info!("{}: faces at {regions:?}", input.display());
        }
        if let Some(angle) = preprocessor.angle_for_recognition() {
            log::info!("{}: aligned by {angle:.2} degrees", input.display());
        }
        written += write_faces(&writer, &cli.output, input, &faces)?;
    }

    preprocessor.logger_mut().summary();
    log::info!("Wrote {written} image(s) to {}", cli.output.display());
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if cli.eye_detection {
        settings.eye_detection_enabled = true;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    settings.validate()?;
    Ok(settings)
}

fn build_detector(
    model: Option<&Path>,
    confidence: f64,
) -> Result<Arc<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = match model {
        Some(path) => path.to_path_buf(),
        None => {
            let resolver = ModelResolver::user()?;
            log::info!(
                "Resolving {} in {}",
                ModelSource::FACE_DETECTOR.name,
                resolver.cache_dir().display()
            );
            let progress: ProgressFn<'_> = &download_progress;
            let path = resolver.resolve(&ModelSource::FACE_DETECTOR, Some(progress))?;
            eprintln!();
            path
        }
    };
    Ok(Arc::new(OnnxYoloDetector::new(&model_path, confidence)?))
}

fn write_faces(
    writer: &dyn ImageWriter,
    output_dir: &Path,
    input: &Path,
    faces: &[Image],
) -> Result<usize, Box<dyn std::error::Error>> {
    for (n, face) in faces.iter().enumerate() {
        writer.write(&output_path(output_dir, input, n), face)?;
    }
    Ok(faces.len())
}

/// `<output_dir>/<input stem>_<n>.png`
fn output_path(output_dir: &Path, input: &Path, n: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{stem}_{n}.png"))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !ImageFileReader::is_supported(input) {
            return Err(format!("Unsupported image format: {}", input.display()).into());
        }
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(
                format!("Confidence must be between 0.0 and 1.0, got {confidence}").into(),
            );
        }
    }
    if let Some(model) = &cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
