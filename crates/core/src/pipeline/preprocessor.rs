use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::preprocess_error::PreprocessError;
use crate::pipeline::step_registry::{PlannedStep, StepRegistry};
use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::StepError;
use crate::preprocessing::domain::step_kind::{StepKind, StepNames};
use crate::settings::Settings;
use crate::shared::image::Image;
use crate::shared::region::Region;
use crate::shared::usage::Usage;

/// What the recognition track looked like at the end of the last request.
struct RecognitionSnapshot {
    faces: Option<Vec<Region>>,
    angle: Option<f64>,
}

impl RecognitionSnapshot {
    fn of(state: &PipelineState) -> Self {
        Self {
            faces: state.faces().map(<[Region]>::to_vec),
            angle: state.angle(),
        }
    }
}

/// Face preprocessing orchestrator.
///
/// Every request runs two tracks over the same input: a detection track
/// (working on a copy) that finds the faces, and a recognition track
/// (working on the original) that receives those faces and is transformed
/// into the output. "No face" is an ordinary outcome and comes back as
/// `Ok(None)`; only a misconfigured step list is an error.
pub struct Preprocessor {
    registry: Arc<StepRegistry>,
    names: StepNames,
    detector: Arc<dyn FaceDetector>,
    settings: Settings,
    last_recognition: Option<RecognitionSnapshot>,
    logger: Box<dyn PipelineLogger>,
}

impl Preprocessor {
    /// Builds the orchestrator with the built-in steps bound to `detector`.
    pub fn new(settings: Settings, names: StepNames, detector: Arc<dyn FaceDetector>) -> Self {
        let registry = Arc::new(StepRegistry::canonical(&settings, Arc::clone(&detector)));
        Self::with_registry(settings, names, detector, registry)
    }

    pub fn with_registry(
        settings: Settings,
        names: StepNames,
        detector: Arc<dyn FaceDetector>,
        registry: Arc<StepRegistry>,
    ) -> Self {
        Self {
            registry,
            names,
            detector,
            settings,
            last_recognition: None,
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Detects faces and returns them cut out of `image`.
    ///
    /// Only the detection step list is applied before the crop; the
    /// recognition list is not consulted.
    pub fn produce_cropped_faces(
        &mut self,
        image: Image,
    ) -> Result<Option<Vec<Image>>, PreprocessError> {
        let registry = Arc::clone(&self.registry);
        let detection_plan =
            registry.plan(&self.names, &self.settings.steps(Usage::Detection).assembled())?;
        let crop_plan = registry.plan_kinds(&self.names, &[StepKind::Crop])?;
        Ok(self.execute(image, Usage::Recognition, &detection_plan, &crop_plan))
    }

    /// Runs the configured chain for `usage` and returns that track's images.
    pub fn produce_processed_faces(
        &mut self,
        image: Image,
        usage: Usage,
    ) -> Result<Option<Vec<Image>>, PreprocessError> {
        let registry = Arc::clone(&self.registry);
        let detection_plan =
            registry.plan(&self.names, &self.settings.steps(Usage::Detection).assembled())?;
        let recognition_plan = match usage {
            Usage::Detection => Vec::new(),
            Usage::Recognition => {
                registry.plan(&self.names, &self.settings.steps(Usage::Recognition).assembled())?
            }
        };
        Ok(self.execute(image, usage, &detection_plan, &recognition_plan))
    }

    /// Face regions of the recognition track from the last request.
    pub fn faces_for_recognition(&self) -> Option<&[Region]> {
        self.last_recognition.as_ref()?.faces.as_deref()
    }

    /// Rotation applied by eye alignment during the last request.
    pub fn angle_for_recognition(&self) -> Option<f64> {
        self.last_recognition.as_ref()?.angle
    }

    fn execute(
        &mut self,
        image: Image,
        usage: Usage,
        detection_plan: &[PlannedStep<'_>],
        recognition_plan: &[PlannedStep<'_>],
    ) -> Option<Vec<Image>> {
        let mut detection = PipelineState::new(image.clone());
        let mut recognition = PipelineState::new(image);

        let outcome = self.run_tracks(
            usage,
            detection_plan,
            recognition_plan,
            &mut detection,
            &mut recognition,
        );
        self.last_recognition = Some(RecognitionSnapshot::of(&recognition));

        match outcome {
            Ok(()) => Some(match usage {
                Usage::Detection => detection.into_images(),
                Usage::Recognition => recognition.into_images(),
            }),
            Err(StepError::NoFace) => {
                log::debug!("No usable face found");
                None
            }
            Err(e) => {
                log::warn!("Preprocessing aborted: {e}");
                None
            }
        }
    }

    fn run_tracks(
        &mut self,
        usage: Usage,
        detection_plan: &[PlannedStep<'_>],
        recognition_plan: &[PlannedStep<'_>],
        detection: &mut PipelineState,
        recognition: &mut PipelineState,
    ) -> Result<(), StepError> {
        self.run_steps(detection_plan, detection)?;

        let faces = self.detect_faces(detection, usage)?;
        detection.set_faces(faces);
        recognition.merge_detections(detection);

        self.run_steps(recognition_plan, recognition)?;

        if self.settings.eye_detection_enabled {
            self.require_eyes(recognition)?;
        }
        Ok(())
    }

    fn run_steps(
        &mut self,
        plan: &[PlannedStep<'_>],
        state: &mut PipelineState,
    ) -> Result<(), StepError> {
        for planned in plan {
            let start = Instant::now();
            planned.step.apply(state)?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            log::debug!(
                "Applied {} ({:?}) in {elapsed_ms:.1}ms, {} image(s)",
                planned.name,
                planned.kind,
                state.images().len()
            );
            self.logger.timing(&planned.name, elapsed_ms);
        }
        Ok(())
    }

    fn detect_faces(
        &mut self,
        state: &PipelineState,
        usage: Usage,
    ) -> Result<Vec<Region>, StepError> {
        let start = Instant::now();
        let faces = self
            .detector
            .detect_faces(state.images(), usage)
            .map_err(|e| StepError::Failed {
                step: "face detection",
                reason: e.to_string(),
            })?;
        self.logger
            .timing("face detection", start.elapsed().as_secs_f64() * 1000.0);
        self.logger.metric("faces", faces.len() as f64);

        if faces.is_empty() {
            return Err(StepError::NoFace);
        }
        log::debug!("Detected {} face(s) for {usage}", faces.len());
        Ok(faces)
    }

    /// Passes when eye detection finds a complete pair on the first image of
    /// the recognition track as its steps left it. Eyes stored by an earlier
    /// step do not count.
    fn require_eyes(&mut self, state: &mut PipelineState) -> Result<(), StepError> {
        let start = Instant::now();
        let eyes = self
            .detector
            .detect_eyes(&state.images()[0])
            .map_err(|e| StepError::Failed {
                step: "eye detection",
                reason: e.to_string(),
            })?;
        self.logger
            .timing("eye detection", start.elapsed().as_secs_f64() * 1000.0);

        match eyes {
            Some(eyes) => {
                state.set_eyes(eyes);
                Ok(())
            }
            None => Err(StepError::NoFace),
        }
    }
}
