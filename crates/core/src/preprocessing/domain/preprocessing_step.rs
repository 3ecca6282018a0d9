use thiserror::Error;

use super::pipeline_state::PipelineState;

/// Why a step could not produce a usable state.
///
/// Both variants are recoverable at the orchestrator boundary: the request
/// yields no result instead of failing.
#[derive(Error, Debug)]
pub enum StepError {
    /// The step needs a face or eyes that are not present.
    #[error("no face detected")]
    NoFace,
    /// The step itself failed on its input.
    #[error("{step} failed: {reason}")]
    Failed { step: &'static str, reason: String },
}

/// Domain interface for one image transformation in a preprocessing chain.
///
/// Implementations transform the state in place and keep no per-call state,
/// so one instance can serve every request (and every thread).
pub trait PreprocessingStep: Send + Sync {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError>;
}
