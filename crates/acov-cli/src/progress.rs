use acov_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Index phase: spinner
/// - Analysis phase: progress bar over build artifacts
/// - Render phase: progress bar over reports
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn counting_bar(total: usize, label: &str) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(&format!(
                "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} {{msg}}",
                label
            ))
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_index_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message("Indexing project directories...");
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_index_complete(&self, files_indexed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Index complete: {} files in {:.2}s",
            files_indexed, duration_secs
        );
    }

    fn on_analysis_start(&self, artifacts: usize) {
        self.set_bar(Self::counting_bar(artifacts, "Analyzing"));
    }

    fn on_artifact_progress(&self, artifacts_done: usize, _artifacts: usize, current: &str) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(artifacts_done as u64);
            pb.set_message(current.to_string());
        }
    }

    fn on_analysis_complete(&self, reports: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Analysis complete: {} file reports in {:.2}s",
            reports, duration_secs
        );
    }

    fn on_render_start(&self, reports: usize) {
        self.set_bar(Self::counting_bar(reports, "Rendering"));
    }

    fn on_render_progress(&self, rendered: usize, _reports: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(rendered as u64);
        }
    }

    fn on_render_complete(&self, written: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Render complete: {} pages in {:.2}s",
            written, duration_secs
        );
    }
}
