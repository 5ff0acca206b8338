pub mod html;

use crate::error::Error;
use crate::paths;
use crate::progress::ProgressReporter;
use crate::report::{NewLines, ReportSet};
use html::IndexEntry;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const INDEX_PAGE: &str = "index.html";

#[derive(Debug)]
pub struct RenderSummary {
    pub pages_written: usize,
    pub pages_failed: usize,
    pub duration: Duration,
}

/// Write one page per report plus an index page into `output_dir`.
///
/// A report whose source cannot be read is skipped; only failing to create
/// the output directory or the index page is an error.
pub fn write_reports(
    reports: &ReportSet,
    output_dir: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<RenderSummary, Error> {
    info!("Writing {} reports to {}", reports.len(), output_dir.display());
    let start = Instant::now();
    fs::create_dir_all(output_dir)?;
    reporter.on_render_start(reports.len());

    let mut entries = Vec::new();
    let mut pages_failed = 0;
    for (done, report) in reports.iter().enumerate() {
        reporter.on_render_progress(done, reports.len());

        let lines = match report.source_lines() {
            Ok(lines) => lines,
            Err(err) => {
                error!("Cannot render {}: {}", report.new_path().display(), err);
                pages_failed += 1;
                continue;
            }
        };

        let page_name = paths::report_file_name(report.new_path());
        let page_path = output_dir.join(&page_name);
        if let Err(err) = fs::write(&page_path, html::render_report(report, &lines)) {
            error!("Cannot write {}: {}", page_path.display(), err);
            pages_failed += 1;
            continue;
        }
        debug!("Wrote {}", page_path.display());

        entries.push(IndexEntry {
            source: paths::path_key(report.new_path()),
            page: page_name,
            instrumented: report.instrumented_lines(),
            covered: report.covered_lines(),
            new_lines: match report.new_lines() {
                NewLines::WholeFile => None,
                NewLines::Changed(lines) => Some(lines.len()),
            },
        });
    }

    fs::write(output_dir.join(INDEX_PAGE), html::render_index(&entries))?;

    let summary = RenderSummary {
        pages_written: entries.len(),
        pages_failed,
        duration: start.elapsed(),
    };
    reporter.on_render_complete(summary.pages_written, summary.duration.as_secs_f64());
    Ok(summary)
}
