use std::collections::HashMap;
use std::sync::Arc;

use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::preprocess_error::PreprocessError;
use crate::preprocessing::domain::preprocessing_step::PreprocessingStep;
use crate::preprocessing::domain::step_kind::{StepKind, StepNames};
use crate::preprocessing::infrastructure::{
    crop::Crop, difference_of_gaussian::DifferenceOfGaussian, eye_alignment::EyeAlignment,
    gamma_correction::GammaCorrection, grayscale::Grayscale,
    histogram_equalization::HistogramEqualization, local_binary_pattern::LocalBinaryPattern,
    masking::Masking, resize::Resize,
};
use crate::settings::Settings;

/// Maps each [`StepKind`] to the step instance that implements it.
///
/// Filled once at construction and read-only afterwards, so a registry can
/// be shared between orchestrators through `Arc`.
pub struct StepRegistry {
    steps: HashMap<StepKind, Box<dyn PreprocessingStep>>,
}

/// A resolved entry of a step list, ready to run.
pub struct PlannedStep<'a> {
    pub kind: StepKind,
    pub name: String,
    pub step: &'a dyn PreprocessingStep,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    /// Registry with the nine built-in steps, parameterized from `settings`.
    pub fn canonical(settings: &Settings, detector: Arc<dyn FaceDetector>) -> Self {
        let mut registry = Self::new();
        registry.register(StepKind::Grayscale, Box::new(Grayscale));
        registry.register(StepKind::EyeAlignment, Box::new(EyeAlignment::new(detector)));
        registry.register(StepKind::Crop, Box::new(Crop));
        registry.register(
            StepKind::GammaCorrection,
            Box::new(GammaCorrection::new(settings.gamma)),
        );
        registry.register(
            StepKind::DifferenceOfGaussian,
            Box::new(DifferenceOfGaussian::new(settings.sigmas)),
        );
        registry.register(StepKind::Masking, Box::new(Masking));
        registry.register(StepKind::HistogramEqualization, Box::new(HistogramEqualization));
        registry.register(StepKind::Resize, Box::new(Resize::new(settings.face_size)));
        registry.register(StepKind::LocalBinaryPattern, Box::new(LocalBinaryPattern));
        registry
    }

    /// Binds `step` to `kind`. A later registration replaces an earlier one.
    pub fn register(&mut self, kind: StepKind, step: Box<dyn PreprocessingStep>) {
        if self.steps.insert(kind, step).is_some() {
            log::warn!("Replaced registered step for {kind:?}");
        }
    }

    /// Resolves every display name in `list`, in order.
    ///
    /// Fails on the first name that is unknown or whose step is not
    /// registered; nothing has run at that point.
    pub fn plan(
        &self,
        names: &StepNames,
        list: &[&str],
    ) -> Result<Vec<PlannedStep<'_>>, PreprocessError> {
        list.iter()
            .map(|&name| {
                names
                    .resolve(name)
                    .and_then(|kind| self.planned(kind, name.to_string()))
                    .ok_or_else(|| PreprocessError::UnknownStep(name.to_string()))
            })
            .collect()
    }

    /// Resolves steps the caller names by kind rather than display name.
    pub fn plan_kinds(
        &self,
        names: &StepNames,
        kinds: &[StepKind],
    ) -> Result<Vec<PlannedStep<'_>>, PreprocessError> {
        kinds
            .iter()
            .map(|&kind| {
                let name = names.name(kind);
                self.planned(kind, name.to_string())
                    .ok_or_else(|| PreprocessError::UnknownStep(name.to_string()))
            })
            .collect()
    }

    fn planned(&self, kind: StepKind, name: String) -> Option<PlannedStep<'_>> {
        self.steps.get(&kind).map(|step| PlannedStep {
            kind,
            name,
            step: step.as_ref(),
        })
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::eye_pair::EyePair;
    use crate::preprocessing::domain::pipeline_state::PipelineState;
    use crate::preprocessing::domain::preprocessing_step::StepError;
    use crate::shared::image::Image;
    use crate::shared::region::Region;
    use crate::shared::usage::Usage;
    use rstest::rstest;

    struct NoDetector;

    impl FaceDetector for NoDetector {
        fn detect_faces(
            &self,
            _images: &[Image],
            _usage: Usage,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(vec![])
        }

        fn detect_eyes(
            &self,
            _image: &Image,
        ) -> Result<Option<EyePair>, Box<dyn std::error::Error>> {
            Ok(None)
        }
    }

    struct Fill(u8);

    impl PreprocessingStep for Fill {
        fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
            let value = self.0;
            state.map_images(|img| Image::filled(img.width(), img.height(), img.channels(), value));
            Ok(())
        }
    }

    fn canonical() -> StepRegistry {
        StepRegistry::canonical(&Settings::default(), Arc::new(NoDetector))
    }

    #[test]
    fn test_canonical_registers_every_kind() {
        let registry = canonical();
        let plan = registry.plan_kinds(&StepNames::english(), StepKind::ALL).unwrap();
        let kinds: Vec<_> = plan.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, StepKind::ALL.to_vec());
    }

    #[test]
    fn test_plan_keeps_list_order() {
        let registry = canonical();
        let plan = registry
            .plan(&StepNames::english(), &["Resize", "Grayscale", "Resize"])
            .unwrap();
        let kinds: Vec<_> = plan.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![StepKind::Resize, StepKind::Grayscale, StepKind::Resize]
        );
        assert_eq!(plan[1].name, "Grayscale");
    }

    #[rstest]
    #[case(&["Sharpen"], "Sharpen")]
    #[case(&["Grayscale", "Blur", "Resize"], "Blur")]
    #[case(&["grayscale"], "grayscale")]
    fn test_plan_unknown_name(#[case] list: &[&str], #[case] bad: &str) {
        let registry = canonical();
        let result = registry.plan(&StepNames::english(), list);
        assert_eq!(
            result.err(),
            Some(PreprocessError::UnknownStep(bad.to_string()))
        );
    }

    #[test]
    fn test_plan_known_name_without_registration_fails() {
        let mut registry = StepRegistry::new();
        registry.register(StepKind::Grayscale, Box::new(Grayscale));
        let result = registry.plan(&StepNames::english(), &["Grayscale", "Masking"]);
        assert_eq!(
            result.err(),
            Some(PreprocessError::UnknownStep("Masking".to_string()))
        );
    }

    #[test]
    fn test_plan_uses_localized_names() {
        let names = StepNames::from_json(r#"{"masking": "Maskierung"}"#).unwrap();
        let registry = canonical();
        assert!(registry.plan(&names, &["Maskierung"]).is_ok());
        assert!(registry.plan(&names, &["Masking"]).is_err());
    }

    #[test]
    fn test_plan_kinds_reports_display_name() {
        let registry = StepRegistry::new();
        let result = registry.plan_kinds(&StepNames::english(), &[StepKind::Crop]);
        assert_eq!(
            result.err(),
            Some(PreprocessError::UnknownStep("Crop".to_string()))
        );
    }

    #[test]
    fn test_register_replaces_existing_step() {
        let mut registry = StepRegistry::new();
        registry.register(StepKind::Masking, Box::new(Fill(1)));
        registry.register(StepKind::Masking, Box::new(Fill(9)));

        let plan = registry.plan(&StepNames::english(), &["Masking"]).unwrap();
        let mut state = PipelineState::new(Image::filled(2, 2, 1, 0));
        plan[0].step.apply(&mut state).unwrap();
        assert!(state.images()[0].data().iter().all(|&v| v == 9));
    }

    #[test]
    fn test_empty_plan_is_ok() {
        let registry = canonical();
        assert!(registry.plan(&StepNames::english(), &[]).unwrap().is_empty());
    }
}
