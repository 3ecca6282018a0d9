use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for preprocessing events.
///
/// Decouples the orchestrator from output mechanisms (stdout, log crate,
/// tests) so callers can watch step timings without touching the pipeline.
pub trait PipelineLogger: Send {
    /// Report image-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named step took for one request.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces found).
    fn metric(&mut self, name: &str, value: f64);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

/// CLI-oriented logger that aggregates per-step timings and metrics and
/// reports a summary when the run completes.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    total_images: usize,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_images: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let images = self.total_images;
        let mut lines = Vec::new();

        lines.push(format!(
            "Preprocessing summary ({images} images, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            lines.push(format!(
                "  {stage:24}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({} runs)",
                durations.len()
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if images > 0 && elapsed_ms > 0.0 {
            let rate = images as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.1} images/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_images = total;
        if total > 0 {
            log::info!("Processing image {current}/{total}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("Crop", 5.0);
        logger.metric("faces", 3.0);
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("Grayscale", 2.0);
        logger.timing("Grayscale", 4.0);
        logger.timing("Resize", 1.0);

        assert_eq!(logger.timings_for("Grayscale").unwrap(), &[2.0, 4.0]);
        assert_eq!(logger.timings_for("Resize").unwrap(), &[1.0]);
        assert!(logger.timings_for("Masking").is_none());
    }

    #[test]
    fn test_summary_includes_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new();
        logger.progress(2, 2);
        logger.timing("face detection", 20.0);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Preprocessing summary (2 images"));
        assert!(summary.contains("face detection"));
        assert!(summary.contains("faces: avg 1.5"));
        assert!(summary.contains("images/s"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new().summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_total() {
        let mut logger = StdoutPipelineLogger::new();
        for i in 1..=5 {
            logger.progress(i, 5);
        }
        assert_eq!(logger.total_images, 5);
    }
}
