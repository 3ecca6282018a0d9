use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{APP_DIR_NAME, YOLO_MODEL_NAME, YOLO_MODEL_URL};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("failed to create model cache {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("download of {name} failed: {source}")]
    Download {
        name: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to store {name} at {path}: {source}")]
    Store {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A model file and where to fetch it from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSource {
    pub name: &'static str,
    pub url: &'static str,
}

impl ModelSource {
    /// YOLO face model with eye keypoints, as read by `OnnxYoloDetector`.
    pub const FACE_DETECTOR: ModelSource = ModelSource {
        name: YOLO_MODEL_NAME,
        url: YOLO_MODEL_URL,
    };
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 when the server sends no Content-Length.
pub type ProgressFn<'a> = &'a dyn Fn(u64, u64);

/// Finds model files in a cache directory, downloading the missing ones.
pub struct ModelResolver {
    cache_dir: PathBuf,
}

impl ModelResolver {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Resolver over the per-user model cache.
    ///
    /// - macOS: `~/Library/Application Support/FacePrep/models/`
    /// - Linux: `$XDG_CACHE_HOME/FacePrep/models/` or `~/.cache/FacePrep/models/`
    /// - Windows: `%LOCALAPPDATA%/FacePrep/models/`
    pub fn user() -> Result<Self, ModelResolveError> {
        let base = if cfg!(target_os = "macos") {
            dirs::data_dir()
        } else {
            dirs::cache_dir()
        };
        base.map(|d| Self::new(d.join(APP_DIR_NAME).join("models")))
            .ok_or(ModelResolveError::NoCacheDir)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of `source` in the cache, downloading it first when absent.
    ///
    /// The download lands in a `.part` file that is renamed on success and
    /// removed on failure, so the cache never holds a truncated model.
    pub fn resolve(
        &self,
        source: &ModelSource,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<PathBuf, ModelResolveError> {
        let path = self.cache_dir.join(source.name);
        if path.is_file() {
            log::debug!("Using cached model {}", path.display());
            return Ok(path);
        }

        fs::create_dir_all(&self.cache_dir).map_err(|e| ModelResolveError::CacheDir {
            path: self.cache_dir.clone(),
            source: e,
        })?;
        log::info!("Downloading {} to {}", source.name, path.display());

        let partial = path.with_extension("part");
        let result = fetch(source, &partial, progress).and_then(|()| {
            fs::rename(&partial, &path).map_err(|e| ModelResolveError::Store {
                name: source.name,
                path: path.clone(),
                source: e,
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&partial);
        }
        result.map(|()| path)
    }
}

fn fetch(
    source: &ModelSource,
    dest: &Path,
    progress: Option<ProgressFn<'_>>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(source.url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            name: source.name,
            source: e,
        })?;

    let store_err = |e: io::Error| ModelResolveError::Store {
        name: source.name,
        path: dest.to_path_buf(),
        source: e,
    };
    let file = fs::File::create(dest).map_err(store_err)?;
    let mut out = ProgressWriter {
        inner: io::BufWriter::new(file),
        written: 0,
        total: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut out).map_err(store_err)?;
    out.flush().map_err(store_err)
}

/// Reports the running byte count after every write.
struct ProgressWriter<'a, W> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<ProgressFn<'a>>,
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = self.progress {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const UNREACHABLE: ModelSource = ModelSource {
        name: "m.onnx",
        url: "http://invalid.nonexistent.example.com/m.onnx",
    };

    #[test]
    fn test_cached_model_is_used_without_download() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("m.onnx"), b"cached").unwrap();

        let resolver = ModelResolver::new(tmp.path());
        let path = resolver.resolve(&UNREACHABLE, None).unwrap();
        assert_eq!(path, tmp.path().join("m.onnx"));
    }

    #[test]
    fn test_failed_download_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("models");
        let resolver = ModelResolver::new(&cache);

        let result = resolver.resolve(&UNREACHABLE, None);
        assert!(matches!(result, Err(ModelResolveError::Download { name: "m.onnx", .. })));
        assert!(!cache.join("m.onnx").exists());
        assert!(!cache.join("m.part").exists());
    }

    #[test]
    fn test_directory_named_like_model_is_not_a_hit() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("m.onnx")).unwrap();
        let result = ModelResolver::new(tmp.path()).resolve(&UNREACHABLE, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_cache_dir_is_app_specific() {
        if let Ok(resolver) = ModelResolver::user() {
            let dir = resolver.cache_dir().to_string_lossy().into_owned();
            assert!(dir.contains(APP_DIR_NAME));
            assert!(dir.ends_with("models"));
        }
    }

    #[test]
    fn test_progress_writer_reports_running_total() {
        let seen = RefCell::new(Vec::new());
        let record = |done: u64, total: u64| seen.borrow_mut().push((done, total));
        let cb: ProgressFn<'_> = &record;
        let mut out = ProgressWriter {
            inner: Vec::new(),
            written: 0,
            total: 10,
            progress: Some(cb),
        };
        out.write_all(b"abcd").unwrap();
        out.write_all(b"efghij").unwrap();

        assert_eq!(out.inner, b"abcdefghij");
        assert_eq!(*seen.borrow(), vec![(4, 10), (10, 10)]);
    }

    #[test]
    fn test_face_detector_source_points_at_onnx_model() {
        assert!(ModelSource::FACE_DETECTOR.name.ends_with(".onnx"));
        assert!(ModelSource::FACE_DETECTOR.url.ends_with(ModelSource::FACE_DETECTOR.name));
    }
}
