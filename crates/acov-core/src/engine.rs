use crate::change::{ChangeClassifier, DiffClassifier};
use crate::config::{AppConfig, DiffFailurePolicy};
use crate::error::Error;
use crate::gcov::{self, CoverageTool, CreatedDataFile, Gcov};
use crate::index::{graph_companion, FileCategory, ProjectIndex};
use crate::paths::{self, path_key};
use crate::progress::ProgressReporter;
use crate::report::{FileReport, ReportSet};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Counts of everything the run skipped or could not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunDiagnostics {
    pub artifacts_analyzed: usize,
    pub artifacts_without_graph: usize,
    pub tool_failures: usize,
    pub unmatched_tool_lines: usize,
    pub missing_data_files: usize,
    pub malformed_records: usize,
    pub samples: usize,
    pub external_sources_skipped: usize,
    pub malformed_diff_hunks: usize,
    pub diff_fallbacks: usize,
    pub dropped_reports: usize,
}

/// Run-scoped state, owned by the caller and threaded through every step.
#[derive(Debug)]
pub struct RunContext {
    pub projects: ProjectIndex,
    pub reports: ReportSet,
    pub diagnostics: RunDiagnostics,
    dropped: HashSet<String>,
}

impl RunContext {
    pub fn new(projects: ProjectIndex) -> Self {
        Self {
            projects,
            reports: ReportSet::new(),
            diagnostics: RunDiagnostics::default(),
            dropped: HashSet::new(),
        }
    }
}

#[derive(Debug)]
pub struct CoverageRun {
    pub reports: ReportSet,
    pub diagnostics: RunDiagnostics,
    pub files_indexed: usize,
    pub index_duration: Duration,
    pub analysis_duration: Duration,
}

pub struct CoverageEngine {
    config: AppConfig,
    tool: Box<dyn CoverageTool>,
    classifier: Box<dyn ChangeClassifier>,
}

impl CoverageEngine {
    pub fn new(config: AppConfig) -> Self {
        let timeout = config.tools.timeout();
        let tool = Box::new(Gcov::new(config.tools.gcov.clone(), timeout));
        let classifier = Box::new(DiffClassifier::new(config.tools.diff.clone(), timeout));
        Self {
            config,
            tool,
            classifier,
        }
    }

    pub fn with_coverage_tool(mut self, tool: impl CoverageTool + 'static) -> Self {
        self.tool = Box::new(tool);
        self
    }

    pub fn with_classifier(mut self, classifier: impl ChangeClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register every configured project. Nested and differently spelled
    /// registrations are all kept; analysis walks only the outermost ones.
    pub fn index(&self) -> Result<ProjectIndex, Error> {
        if self.config.projects.is_empty() {
            return Err(Error::NoProjects);
        }

        let mut index = ProjectIndex::with_ignore_patterns(&self.config.ignore_patterns);
        for project in &self.config.projects {
            index.register(&project.new_dir, project.old_dir.as_deref());
        }
        Ok(index)
    }

    /// Full pipeline:
    /// 1. Index every project tree
    /// 2. Create one report per indexed source/header file
    /// 3. Run the coverage tool over every source artifact and fold samples in
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<CoverageRun, Error> {
        info!("Indexing project directories...");
        reporter.on_index_start();
        let index_start = Instant::now();
        let projects = self.index()?;
        let files_indexed = projects.file_count();
        let index_duration = index_start.elapsed();
        reporter.on_index_complete(files_indexed, index_duration.as_secs_f64());
        debug!(
            "Indexed {} files in {} projects in {:.2}s",
            files_indexed,
            projects.len(),
            index_duration.as_secs_f64()
        );

        let mut ctx = RunContext::new(projects);

        info!("Analyzing coverage...");
        let analysis_start = Instant::now();
        self.create_reports(&mut ctx);
        self.analyze(&mut ctx, reporter);
        let analysis_duration = analysis_start.elapsed();
        reporter.on_analysis_complete(ctx.reports.len(), analysis_duration.as_secs_f64());
        debug!("Run diagnostics: {:?}", ctx.diagnostics);

        Ok(CoverageRun {
            reports: ctx.reports,
            diagnostics: ctx.diagnostics,
            files_indexed,
            index_duration,
            analysis_duration,
        })
    }

    /// Create an empty report for every indexed source and header file.
    pub fn create_reports(&self, ctx: &mut RunContext) {
        let mut discovered: Vec<(PathBuf, Option<PathBuf>)> = Vec::new();
        for project in ctx.projects.outermost() {
            for category in FileCategory::ALL.into_iter().filter(|c| c.is_reportable()) {
                for file in project.tree(category).files() {
                    let old_path = ctx.projects.old_counterpart(file).filter(|p| p.is_file());
                    discovered.push((file.clone(), old_path));
                }
            }
        }

        for (new_path, old_path) in discovered {
            self.add_report(ctx, &new_path, old_path);
        }
        info!("Created {} file reports", ctx.reports.len());
    }

    /// Run the coverage tool over every source artifact of every project.
    pub fn analyze(&self, ctx: &mut RunContext, reporter: &dyn ProgressReporter) {
        let artifacts: Vec<PathBuf> = ctx
            .projects
            .outermost()
            .flat_map(|project| project.tree(FileCategory::Source).files().iter().cloned())
            .collect();

        reporter.on_analysis_start(artifacts.len());
        for (done, artifact) in artifacts.iter().enumerate() {
            reporter.on_artifact_progress(done, artifacts.len(), &path_key(artifact));
            self.analyze_artifact(ctx, artifact);
        }
        reporter.on_artifact_progress(artifacts.len(), artifacts.len(), "");
    }

    fn analyze_artifact(&self, ctx: &mut RunContext, artifact: &Path) {
        let graph = graph_companion(artifact);
        let has_graph = ctx
            .projects
            .project_for(artifact)
            .is_some_and(|project| project.tree(FileCategory::CoverageGraph).contains(&graph));
        if !has_graph {
            debug!("No coverage graph for {}, skipping", artifact.display());
            ctx.diagnostics.artifacts_without_graph += 1;
            return;
        }

        let Some(artifact_dir) = artifact.parent() else {
            return;
        };

        debug!("Running coverage tool on {}", artifact.display());
        let stdout = match self.tool.analyze(artifact, artifact_dir) {
            Ok(stdout) => stdout,
            Err(err) => {
                warn!("Coverage tool failed on {}: {}", artifact.display(), err);
                ctx.diagnostics.tool_failures += 1;
                return;
            }
        };
        ctx.diagnostics.artifacts_analyzed += 1;

        let announcements = gcov::parse_tool_output(&stdout);
        ctx.diagnostics.unmatched_tool_lines += announcements.unmatched_lines;

        let component = path_key(artifact);
        for created in &announcements.created {
            self.fold_data_file(ctx, artifact_dir, created, &component);
        }
    }

    fn fold_data_file(
        &self,
        ctx: &mut RunContext,
        artifact_dir: &Path,
        created: &CreatedDataFile,
        component: &str,
    ) {
        let source = paths::resolve_against(artifact_dir, &created.source);
        let data_file = artifact_dir.join(&created.data_file);
        debug!(
            "{} describes {}",
            data_file.display(),
            source.display()
        );

        if !self.ensure_report(ctx, &source) {
            return;
        }

        let content = match fs::read(&data_file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                warn!("Cannot read data file {}: {}", data_file.display(), err);
                ctx.diagnostics.missing_data_files += 1;
                return;
            }
        };

        let parsed = gcov::parse_data_file(&content);
        ctx.diagnostics.malformed_records += parsed.malformed_records;
        ctx.diagnostics.samples += parsed.samples.len();

        if let Some(report) = ctx.reports.get_mut(&source) {
            for sample in &parsed.samples {
                report.accumulate(sample.line, sample.count, component);
            }
        }
    }

    /// Make sure a report exists for `source`, creating it on first sight.
    /// Returns false when the source is outside every registered tree (and
    /// external sources are off) or its report was dropped.
    fn ensure_report(&self, ctx: &mut RunContext, source: &Path) -> bool {
        if ctx.reports.contains(source) {
            return true;
        }
        if ctx.dropped.contains(&path_key(source)) {
            return false;
        }

        let known =
            ctx.projects.project_for(source).is_some() || ctx.projects.any_tree_contains(source);
        if !known && !self.config.include_external_sources {
            debug!("Skipping source outside registered trees: {}", source.display());
            ctx.diagnostics.external_sources_skipped += 1;
            return false;
        }

        let old_path = ctx.projects.old_counterpart(source).filter(|p| p.is_file());
        self.add_report(ctx, source, old_path)
    }

    fn add_report(&self, ctx: &mut RunContext, new_path: &Path, old_path: Option<PathBuf>) -> bool {
        let report = match old_path {
            None => FileReport::new(new_path),
            Some(old_path) => {
                match self.classifier.classify(&old_path, new_path) {
                    Ok(diff) => {
                        ctx.diagnostics.malformed_diff_hunks += diff.malformed_hunks;
                        FileReport::with_old_file(new_path, old_path, diff.new_lines)
                    }
                    Err(err) => match self.config.diff_failure_policy {
                        DiffFailurePolicy::TreatAsNew => {
                            warn!(
                                "Cannot diff {} against {}, treating it as new: {}",
                                new_path.display(),
                                old_path.display(),
                                err
                            );
                            ctx.diagnostics.diff_fallbacks += 1;
                            FileReport::new(new_path)
                        }
                        DiffFailurePolicy::Fail => {
                            error!("Dropping report for {}: {}", new_path.display(), err);
                            ctx.diagnostics.dropped_reports += 1;
                            ctx.dropped.insert(path_key(new_path));
                            return false;
                        }
                    },
                }
            }
        };
        ctx.reports.insert(report);
        true
    }
}
