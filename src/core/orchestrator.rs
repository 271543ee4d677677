//! Orchestration of a single metrics run.
//!
//! [`TaskOrchestrator::execute`] drives one run as a blocking sequence:
//! validate the configuration, merge the extension directories into the
//! search state, scan the class directory, resolve the scanned names, open
//! the report, pick the handler for the configured format and let the engine
//! stream its results into it. Each step must succeed before the next one
//! starts, and any failure ends the run with exactly one [`TaskError`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::config::{OutputFormat, RunConfiguration};
use crate::core::environment::{EngineContext, ExtensionSearchState};
use crate::core::errors::{Result, TaskError};
use crate::core::paths::PathResolver;
use crate::core::scanner::{DirectoryScanner, FileSetScanner};
use crate::engine::{ClassFileEngine, EngineSummary, MetricsEngine};
use crate::io::output::{MetricsHandler, OutputFormatterSelector};

/// Counters for a run that produced a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Files returned by the scanner
    pub files_scanned: usize,
    /// Classes written to the report
    pub classes_reported: usize,
    /// Scanned files the engine could not use
    pub files_skipped: usize,
    /// Report location
    pub output_file: PathBuf,
    /// Report format
    pub format: OutputFormat,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The class directory held nothing to analyze; the report was not touched
    NoFiles,
    /// The report was written completely
    Completed(RunSummary),
}

/// Drives the scanner and engine for one configuration at a time.
pub struct TaskOrchestrator {
    scanner: Box<dyn FileSetScanner>,
    engine: Box<dyn MetricsEngine>,
    search_state: Arc<ExtensionSearchState>,
}

impl Default for TaskOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskOrchestrator {
    /// Orchestrator using the bundled scanner and engine and the
    /// process-wide extension search state.
    pub fn new() -> Self {
        Self {
            scanner: Box::new(DirectoryScanner::new()),
            engine: Box::new(ClassFileEngine::new()),
            search_state: ExtensionSearchState::global(),
        }
    }

    /// Replace the file-set scanner.
    pub fn with_scanner(mut self, scanner: impl FileSetScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Replace the metrics engine.
    pub fn with_engine(mut self, engine: impl MetricsEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Use a dedicated extension search state instead of the process-wide one.
    pub fn with_search_state(mut self, state: Arc<ExtensionSearchState>) -> Self {
        self.search_state = state;
        self
    }

    /// Execute one run.
    ///
    /// Configuration errors are reported before anything is changed. An empty
    /// file set is a successful no-op. Once the report has been opened, any
    /// failure leaves its contents undefined.
    pub fn execute(&self, config: &RunConfiguration) -> Result<RunOutcome> {
        config.validate()?;
        let class_dir = config
            .class_dir
            .as_deref()
            .ok_or_else(|| TaskError::config_field("class directory must be set", "class_dir"))?;
        let output_file = config
            .output_file
            .as_deref()
            .ok_or_else(|| TaskError::config_field("output file must be set", "output_file"))?;

        let context = self.configure_environment(&config.ext_dirs);

        let names = self.scanner.included_files(class_dir)?;
        if names.is_empty() {
            info!("No class files in specified directory {}", class_dir.display());
            return Ok(RunOutcome::NoFiles);
        }

        let paths = PathResolver::resolve(class_dir, &names);
        info!(
            "Running metrics on {} files from {} into {} ({})",
            paths.len(),
            class_dir.display(),
            output_file.display(),
            config.format
        );

        let summary = self.write_report(output_file, config.format, &paths, &context)?;

        Ok(RunOutcome::Completed(RunSummary {
            files_scanned: paths.len(),
            classes_reported: summary.classes_reported,
            files_skipped: summary.files_skipped,
            output_file: output_file.to_path_buf(),
            format: config.format,
        }))
    }

    fn configure_environment(&self, ext_dirs: &[PathBuf]) -> EngineContext {
        let snapshot = self.search_state.apply(ext_dirs);
        debug!(
            "Extension search path for this run: {}",
            snapshot
                .as_deref()
                .map_or_else(|| "<none>".into(), |value| value.to_string_lossy())
        );
        EngineContext::from_search_path(snapshot.as_deref())
    }

    /// The sink lives only inside this call and is released on every return.
    fn write_report(
        &self,
        output_file: &Path,
        format: OutputFormat,
        paths: &[PathBuf],
        context: &EngineContext,
    ) -> Result<EngineSummary> {
        let file = File::create(output_file).map_err(|err| {
            let message = format!("cannot open {}: {err}", output_file.display());
            TaskError::io(message, err)
        })?;

        let mut handler = OutputFormatterSelector::select(format, BufWriter::new(file));
        handler.begin().map_err(|err| write_error(output_file, err))?;
        let summary = self.engine.run_metrics(paths, context, &mut handler)?;
        handler.end().map_err(|err| write_error(output_file, err))?;

        handler
            .into_inner()
            .flush()
            .map_err(|err| write_error(output_file, err))?;

        Ok(summary)
    }
}

fn write_error(output_file: &Path, err: io::Error) -> TaskError {
    let message = format!("cannot write {}: {err}", output_file.display());
    TaskError::io(message, err)
}
