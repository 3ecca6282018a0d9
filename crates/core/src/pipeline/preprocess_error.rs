use thiserror::Error;

/// Fatal outcome of a preprocessing request.
///
/// "No face in this image" is not an error; it is reported as an empty
/// (`None`) result. Only a mismatch between the configured step names and
/// the registered steps aborts a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("unknown preprocessing step '{0}'")]
    UnknownStep(String),
}
