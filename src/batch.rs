//! Batch driver: runs every scan of a root directory through
//! resolve → build → project, isolating per-scan failures.

use crate::{
    builder::StackBuilder,
    config::BatchConfig,
    engine::{EngineSession, ImagingEngine},
    enums::{Convention, ImageClassification, ProjectionOutcome},
    error::{BatchError, ScanError},
    initiator, instrument,
    projection::{self, output_name},
    run_log::RunLog,
    scan::{self, ScanRef},
};

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub scan: String,
    pub classification: ImageClassification,
    pub outcome: ProjectionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub scan: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub convention: Option<Convention>,
    pub succeeded: Vec<ScanReport>,
    pub failed: Vec<ScanFailure>,
    /// Set when the stop flag ended the run before every scan was visited.
    pub stopped_early: bool,
    pub duration: Duration,
}

impl BatchSummary {
    pub fn scans_processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn count(&self, outcome: ProjectionOutcome) -> usize {
        self.succeeded.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} scan(s) processed: {} projected, {} passed through, {} skipped, {} failed, {:.2}s total",
            self.scans_processed(),
            self.count(ProjectionOutcome::Projected),
            self.count(ProjectionOutcome::PassedThrough),
            self.count(ProjectionOutcome::Skipped),
            self.failed.len(),
            self.duration.as_secs_f64()
        )
    }
}

pub struct BatchDriver<E: ImagingEngine> {
    root: PathBuf,
    config: BatchConfig,
    engine: E,
    stop: Arc<AtomicBool>,
}

impl<E: ImagingEngine> BatchDriver<E> {
    pub fn new(root: impl Into<PathBuf>, config: BatchConfig, engine: E) -> Self {
        Self {
            root: root.into(),
            config,
            engine,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a flag that, once set, stops the batch before the next scan starts.
    /// The scan in progress always runs to completion.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Process every scan under the root.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned: the run log cannot be created, the
    /// root cannot be listed, or the output directory cannot be created.
    /// Scan failures are written to the run log and reported in the summary.
    pub fn run(&mut self) -> Result<BatchSummary, BatchError> {
        let started = Instant::now();
        let log_path = self.config.log_path_for(&self.root);
        let log = RunLog::create(&log_path).map_err(|source| match fs::metadata(&self.root) {
            Err(missing) => BatchError::Filesystem {
                path: self.root.clone(),
                source: missing,
            },
            Ok(_) => BatchError::RunLog {
                path: log_path.clone(),
                source,
            },
        })?;

        let convention = instrument::detect(&self.root)?;
        let output_dir = self.config.output_dir_for(&self.root);
        fs::create_dir_all(&output_dir).map_err(|source| BatchError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let scans = scan::enumerate_excluding(&self.root, convention, &[output_dir.clone()])?;
        info!("The returned scan list is {} item(s) long", scans.len());

        let mut summary = BatchSummary {
            convention: Some(convention),
            ..BatchSummary::default()
        };

        for scan in &scans {
            if self.stop.load(Ordering::SeqCst) {
                warn!("Stop requested, leaving remaining scans unprocessed");
                summary.stopped_early = true;
                break;
            }

            let name = output_name(&scan.id);
            info!("Processing {}", name);

            // The session is already dropped here, so the record follows cleanup.
            match self.process_scan(scan, convention, &output_dir) {
                Ok(report) => {
                    Self::record(&log, log.scan_succeeded(&name, report.outcome));
                    summary.succeeded.push(report);
                }
                Err(err) => {
                    warn!("Error with {}, continuing on: {}", name, err);
                    Self::record(&log, log.scan_failed(&name, &err));
                    summary.failed.push(ScanFailure {
                        scan: name,
                        error: err.to_string(),
                    });
                }
            }
        }

        Self::record(&log, log.finish());
        summary.duration = started.elapsed();
        info!("{}", summary.summary());
        Ok(summary)
    }

    /// One scan from resolution to saved output. The engine session is
    /// dropped on every return path, which closes all stacks the scan opened.
    fn process_scan(
        &mut self,
        scan: &ScanRef,
        convention: Convention,
        output_dir: &Path,
    ) -> Result<ScanReport, ScanError> {
        let mut session = EngineSession::new(&mut self.engine);

        let (initiator, classification) = initiator::resolve(&self.root, scan, convention)?;
        let stack = StackBuilder::build(&mut *session, &initiator, classification)?;
        let outcome = projection::apply(
            &mut *session,
            stack,
            classification,
            self.config.project_time_series,
            output_dir,
        )?;

        Ok(ScanReport {
            scan: initiator.basename,
            classification,
            outcome,
        })
    }

    fn record(log: &RunLog, result: std::io::Result<()>) {
        if let Err(e) = result {
            error!("Cannot append to run log {}: {}", log.path().display(), e);
        }
    }
}
