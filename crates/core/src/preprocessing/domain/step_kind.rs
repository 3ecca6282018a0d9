use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of preprocessing steps the orchestrator knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Grayscale,
    EyeAlignment,
    Crop,
    GammaCorrection,
    DifferenceOfGaussian,
    Masking,
    HistogramEqualization,
    Resize,
    LocalBinaryPattern,
}

impl StepKind {
    pub const ALL: &[StepKind] = &[
        StepKind::Grayscale,
        StepKind::EyeAlignment,
        StepKind::Crop,
        StepKind::GammaCorrection,
        StepKind::DifferenceOfGaussian,
        StepKind::Masking,
        StepKind::HistogramEqualization,
        StepKind::Resize,
        StepKind::LocalBinaryPattern,
    ];

    /// Built-in English display name.
    pub fn default_name(&self) -> &'static str {
        match self {
            StepKind::Grayscale => "Grayscale",
            StepKind::EyeAlignment => "Eye Alignment",
            StepKind::Crop => "Crop",
            StepKind::GammaCorrection => "Gamma Correction",
            StepKind::DifferenceOfGaussian => "Difference of Gaussian",
            StepKind::Masking => "Masking",
            StepKind::HistogramEqualization => "Histogram Equalization",
            StepKind::Resize => "Resize",
            StepKind::LocalBinaryPattern => "Local Binary Pattern",
        }
    }
}

#[derive(Error, Debug)]
pub enum StepNamesError {
    #[error("failed to read step names from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid step names resource: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Translates display names (as stored in settings) to [`StepKind`]s.
///
/// Starts from the English names; a resource may rename any subset of the
/// steps. Display names are unique: binding a name a second time moves it to
/// the new step.
#[derive(Clone, Debug)]
pub struct StepNames {
    by_name: HashMap<String, StepKind>,
    by_kind: HashMap<StepKind, String>,
}

impl StepNames {
    pub fn english() -> Self {
        let mut names = Self {
            by_name: HashMap::new(),
            by_kind: HashMap::new(),
        };
        for kind in StepKind::ALL {
            names.bind(*kind, kind.default_name());
        }
        names
    }

    /// English names with `overrides` applied on top.
    pub fn with_overrides(overrides: &HashMap<StepKind, String>) -> Self {
        let mut names = Self::english();
        // Apply in canonical order so duplicate handling is deterministic.
        for kind in StepKind::ALL {
            if let Some(name) = overrides.get(kind) {
                names.bind(*kind, name);
            }
        }
        names
    }

    /// Parses a JSON object mapping step identifiers to display names, e.g.
    /// `{"grayscale": "Graustufen"}`.
    pub fn from_json(json: &str) -> Result<Self, StepNamesError> {
        let overrides: HashMap<StepKind, String> = serde_json::from_str(json)?;
        Ok(Self::with_overrides(&overrides))
    }

    pub fn load(path: &Path) -> Result<Self, StepNamesError> {
        let json = fs::read_to_string(path).map_err(|e| StepNamesError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&json)
    }

    pub fn resolve(&self, name: &str) -> Option<StepKind> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, kind: StepKind) -> &str {
        self.by_kind
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_name())
    }

    fn bind(&mut self, kind: StepKind, name: &str) {
        if let Some(old) = self.by_kind.insert(kind, name.to_string()) {
            if self.by_name.get(&old) == Some(&kind) {
                self.by_name.remove(&old);
            }
        }
        if let Some(previous) = self.by_name.insert(name.to_string(), kind) {
            if previous != kind {
                log::warn!("Step name '{name}' rebound from {previous:?} to {kind:?}");
            }
        }
    }
}

impl Default for StepNames {
    fn default() -> Self {
        Self::english()
    }
}
