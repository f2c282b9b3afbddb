use crate::commands::uninstall::uninstall;
use crate::core::{
    config::{Platform, PlatformTable},
    download::DownloadTask,
    extract::unzip,
    http::{HttpClient, ReqwestClient},
    layout::normalize_install_dir,
    progress::ProgressDisplay,
    tasks::{run_all, Task, TaskReporter, TaskResult},
};
use crate::error::{OraclientError, Result};
use crate::utils::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How errors from one stage affect the following stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Keep going: extract whatever was downloaded, then finalize and clean up.
    #[default]
    Lenient,
    /// Stop as soon as a stage reports an error.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Uninstalling,
    ConfigResolved,
    Downloading,
    Extracting,
    Finalizing,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub root: PathBuf,
    /// Where the archives are downloaded before extraction.
    pub work_dir: PathBuf,
    pub platform: Platform,
    pub table: PlatformTable,
    pub policy: FailurePolicy,
}

impl InstallOptions {
    pub fn new<P: Into<PathBuf>>(root: P, platform: Platform) -> Self {
        Self {
            root: root.into(),
            work_dir: PathBuf::from("."),
            platform,
            table: PlatformTable::default(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_work_dir<P: Into<PathBuf>>(mut self, work_dir: P) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_table(mut self, table: PlatformTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Everything a run produced: the messages shown, where it stopped, and
/// every error collected along the way.
#[derive(Debug)]
pub struct InstallOutcome {
    pub root: PathBuf,
    pub messages: Vec<String>,
    pub stage: Stage,
    /// Stage that was active when the run moved to `Failed`.
    pub failed_at: Option<Stage>,
    pub errors: Vec<OraclientError>,
    pub install_dir: Option<PathBuf>,
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn first_error(&self) -> Option<&OraclientError> {
        self.errors.first()
    }

    /// Process exit status for this run. A refused uninstall only reports its
    /// error; any failure after the previous install was removed is fatal.
    pub fn exit_code(&self) -> u8 {
        match (self.stage, self.failed_at) {
            (Stage::Done, _) => 0,
            (Stage::Failed, Some(Stage::Uninstalling)) => 0,
            _ => 1,
        }
    }

    /// The install directory, or all collected errors.
    pub fn into_result(self) -> Result<PathBuf> {
        match (OraclientError::aggregate(self.errors), self.install_dir) {
            (Some(error), _) => Err(error),
            (None, Some(dir)) => Ok(dir),
            (None, None) => Err(OraclientError::InstantClientNotFound { root: self.root }),
        }
    }
}

struct Archive {
    download: DownloadTask,
    done_message: &'static str,
}

impl Archive {
    fn file_name(&self) -> PathBuf {
        self.download
            .target_filename
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default()
    }
}

/// Bookkeeping for a single run.
struct Run<'a> {
    progress: &'a ProgressDisplay,
    outcome: InstallOutcome,
}

impl<'a> Run<'a> {
    fn new(root: &Path, progress: &'a ProgressDisplay) -> Self {
        Self {
            progress,
            outcome: InstallOutcome {
                root: root.to_path_buf(),
                messages: Vec::new(),
                stage: Stage::Idle,
                failed_at: None,
                errors: Vec::new(),
                install_dir: None,
            },
        }
    }

    fn enter(&mut self, stage: Stage) {
        info!(from = ?self.outcome.stage, to = ?stage, "stage transition");
        if stage == Stage::Failed {
            self.outcome.failed_at = Some(self.outcome.stage);
        }
        self.outcome.stage = stage;
    }

    fn emit<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        self.progress.println(&message);
        self.outcome.messages.push(message);
    }

    fn record(&mut self, error: OraclientError) {
        warn!(stage = ?self.outcome.stage, "{error}");
        self.outcome.errors.push(error);
    }

    fn record_results<T>(&mut self, results: Vec<TaskResult<T>>) {
        for TaskResult { name, result } in results {
            if let Err(error) = result {
                debug!(task = %name, "task failed");
                self.record(error);
            }
        }
    }

    fn has_errors(&self) -> bool {
        !self.outcome.errors.is_empty()
    }

    fn fail(mut self, error: OraclientError) -> InstallOutcome {
        self.record(error);
        self.enter(Stage::Failed);
        self.outcome
    }

    fn finish(mut self) -> InstallOutcome {
        if self.has_errors() {
            self.enter(Stage::Failed);
        } else {
            self.enter(Stage::Done);
            let done = format!("Driver installed: {}", self.outcome.root.display());
            self.emit(done);
        }
        self.outcome
    }
}

/// Removes any previous install, then downloads, extracts and normalizes
/// the basic and SDK archives under the configured root.
pub struct Installer<C> {
    client: C,
    options: InstallOptions,
    progress: ProgressDisplay,
}

impl<C: HttpClient> Installer<C> {
    pub fn new(client: C, options: InstallOptions) -> Self {
        Self {
            client,
            options,
            progress: ProgressDisplay::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressDisplay) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&self) -> InstallOutcome {
        let options = &self.options;
        let root = options.root.as_path();
        let mut run = Run::new(root, &self.progress);

        run.enter(Stage::Uninstalling);
        if let Err(e) = uninstall(root) {
            return run.fail(e);
        }
        run.emit("clean previous install");

        run.enter(Stage::ConfigResolved);
        let config = match options.table.resolve(options.platform) {
            Ok(config) => config,
            Err(e) => return run.fail(e),
        };

        let archives = match self.archives(&config.basic_archive_url, &config.sdk_archive_url) {
            Ok(archives) => archives,
            Err(e) => return run.fail(e),
        };

        run.enter(Stage::Downloading);
        let results = run_all(self.download_tasks(&archives), |message| run.emit(message));
        // Only archives fetched by this run are extracted and cleaned up;
        // a file left in the work dir by an earlier run is not trusted.
        let downloaded: Vec<&Archive> = archives
            .iter()
            .zip(&results)
            .filter(|(_, task)| task.result.is_ok())
            .map(|(archive, _)| archive)
            .collect();
        run.record_results(results);
        if options.policy == FailurePolicy::Strict && run.has_errors() {
            run.enter(Stage::Failed);
            return run.outcome;
        }

        run.enter(Stage::Extracting);
        run.emit("Installing ...");
        let results = run_all(self.extract_tasks(&downloaded), |message| run.emit(message));
        run.record_results(results);
        if options.policy == FailurePolicy::Strict && run.has_errors() {
            run.enter(Stage::Failed);
            return run.outcome;
        }

        run.enter(Stage::Finalizing);
        match normalize_install_dir(root) {
            Ok(dir) => run.outcome.install_dir = Some(dir),
            Err(e) => run.record(e),
        }
        for archive in &downloaded {
            if let Err(e) = fs::remove_file_if_exists(&archive.download.target_filename) {
                run.record(e);
            }
        }

        run.finish()
    }

    fn archives(&self, basic_url: &str, sdk_url: &str) -> Result<[Archive; 2]> {
        let work_dir = &self.options.work_dir;
        Ok([
            Archive {
                download: DownloadTask::from_url(work_dir, basic_url, "Download basic:")?,
                done_message: "Basic downloaded",
            },
            Archive {
                download: DownloadTask::from_url(work_dir, sdk_url, "Download sdk:")?,
                done_message: "SDK downloaded",
            },
        ])
    }

    fn download_tasks<'a>(&'a self, archives: &'a [Archive]) -> Vec<Task<'a, ()>> {
        archives
            .iter()
            .map(|archive| {
                let task = &archive.download;
                Task::new(
                    task.progress_label.clone(),
                    move |reporter: &TaskReporter| {
                        let mut counter = self.progress.counter(&task.progress_label);
                        task.run(&self.client, &mut counter)?;
                        reporter.report(archive.done_message);
                        Ok(())
                    },
                )
            })
            .collect()
    }

    fn extract_tasks<'a>(&'a self, archives: &[&'a Archive]) -> Vec<Task<'a, usize>> {
        let root = self.options.root.as_path();
        archives
            .iter()
            .map(|&archive| {
                let source = archive.download.target_filename.as_path();
                let hint = root.join(archive.file_name());
                Task::new(
                    format!("extract {}", archive.file_name().display()),
                    move |_: &TaskReporter| {
                        let written = unzip(source, &hint)?;
                        debug!(archive = %source.display(), entries = written.len(), "extracted");
                        Ok(written.len())
                    },
                )
            })
            .collect()
    }
}

/// Installs into `root` for the host platform with the built-in archive
/// table, streaming over HTTP.
pub fn install(root: &Path) -> Result<PathBuf> {
    let options = InstallOptions::new(root, Platform::current()?);
    Installer::new(ReqwestClient::new()?, options)
        .run()
        .into_result()
}
