/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_index_start(&self) {}
    fn on_index_complete(&self, _files_indexed: usize, _duration_secs: f64) {}
    fn on_analysis_start(&self, _artifacts: usize) {}
    fn on_artifact_progress(&self, _artifacts_done: usize, _artifacts: usize, _current: &str) {}
    fn on_analysis_complete(&self, _reports: usize, _duration_secs: f64) {}
    fn on_render_start(&self, _reports: usize) {}
    fn on_render_progress(&self, _rendered: usize, _reports: usize) {}
    fn on_render_complete(&self, _written: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
