use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::preprocessing::domain::step_kind::{StepKind, StepNames, StepNamesError};
use crate::shared::constants::{
    APP_DIR_NAME, DEFAULT_FACE_SIZE, DEFAULT_GAMMA, DEFAULT_SIGMAS, MAX_SIGMA,
};
use crate::shared::usage::Usage;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sigmas {0:?}: each must be between 0 and {max}", max = MAX_SIGMA)]
    Sigmas([f64; 2]),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Enabled step names for one usage, grouped by category.
///
/// Category order is fixed; within a category the configured order is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepLists {
    pub standard_preprocessing: Vec<String>,
    pub brightness: Vec<String>,
    pub contours: Vec<String>,
    pub contrast: Vec<String>,
    pub standard_postprocessing: Vec<String>,
}

impl StepLists {
    /// All step names in execution order: standard preprocessing,
    /// brightness, contours, contrast, standard postprocessing.
    pub fn assembled(&self) -> Vec<&str> {
        [
            &self.standard_preprocessing,
            &self.brightness,
            &self.contours,
            &self.contrast,
            &self.standard_postprocessing,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect()
    }

    pub fn detection_defaults() -> Self {
        Self {
            standard_preprocessing: names(&[StepKind::Grayscale]),
            ..Self::default()
        }
    }

    pub fn recognition_defaults() -> Self {
        Self {
            standard_preprocessing: names(&[
                StepKind::Grayscale,
                StepKind::Crop,
                StepKind::EyeAlignment,
            ]),
            brightness: names(&[StepKind::GammaCorrection]),
            contours: Vec::new(),
            contrast: names(&[StepKind::HistogramEqualization]),
            standard_postprocessing: names(&[StepKind::Resize]),
        }
    }
}

fn names(kinds: &[StepKind]) -> Vec<String> {
    kinds.iter().map(|k| k.default_name().to_string()).collect()
}

/// Preprocessing configuration snapshot.
///
/// Missing fields in a settings file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detection: StepLists,
    pub recognition: StepLists,
    pub eye_detection_enabled: bool,
    pub gamma: f64,
    /// Inner and outer blur widths for difference-of-Gaussian.
    pub sigmas: [f64; 2],
    /// Edge length of images after the resize step.
    pub face_size: u32,
    /// Minimum detector confidence (0.0-1.0).
    pub confidence: f64,
    /// Optional JSON resource with localized step names.
    pub step_names: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detection: StepLists::detection_defaults(),
            recognition: StepLists::recognition_defaults(),
            eye_detection_enabled: false,
            gamma: DEFAULT_GAMMA,
            sigmas: DEFAULT_SIGMAS,
            face_size: DEFAULT_FACE_SIZE,
            confidence: 0.5,
            step_names: None,
        }
    }
}

impl Settings {
    pub fn steps(&self, usage: Usage) -> &StepLists {
        match usage {
            Usage::Detection => &self.detection,
            Usage::Recognition => &self.recognition,
        }
    }

    /// English step names with the configured resource applied on top.
    pub fn load_step_names(&self) -> Result<StepNames, StepNamesError> {
        match &self.step_names {
            Some(path) => StepNames::load(path),
            None => Ok(StepNames::english()),
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads the user settings file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the steps cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.sigmas.iter().all(|s| (0.0..=MAX_SIGMA).contains(s)) {
            return Err(SettingsError::Sigmas(self.sigmas));
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
