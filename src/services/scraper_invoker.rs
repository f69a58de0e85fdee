use std::{process::Stdio, sync::Mutex};

use tokio::{process::Command, sync::oneshot};

use crate::{
    configuration::ScraperSettings,
    domain::{notification::Notifications, scrape_request::ScrapeRequest},
};

use super::parameter_writer::{
    patch_run_script, write_params_file, write_query_list, ParameterWriteError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Succeeded,
    /// Non-zero exit. `code` is `None` when the child was killed by a signal.
    Failed { code: Option<i32> },
    TimedOut,
    Cancelled,
}

impl ScrapeOutcome {
    pub fn notify(&self, notifications: &mut Notifications) {
        match self {
            ScrapeOutcome::Succeeded => notifications.success("Scraping complete!"),
            ScrapeOutcome::Failed { .. } => notifications.error("Scraper failed. Check logs."),
            ScrapeOutcome::TimedOut => {
                notifications.error("Scraper timed out and was stopped. Check logs.")
            }
            ScrapeOutcome::Cancelled => notifications.warning("Scraper run was cancelled."),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("a scraper run is already in progress")]
    AlreadyRunning,
    #[error("could not write scraper parameters: {0}")]
    Parameters(#[from] ParameterWriteError),
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error while waiting for the scraper: {0}")]
    Wait(#[source] std::io::Error),
}

enum RunSlot {
    Idle,
    /// The sender is taken by the first cancel.
    Running(Option<oneshot::Sender<()>>),
}

/// Runs the external scraper, one run at a time.
pub struct ScraperInvoker {
    settings: ScraperSettings,
    slot: Mutex<RunSlot>,
}

struct RunningGuard<'a>(&'a Mutex<RunSlot>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = RunSlot::Idle;
    }
}

impl ScraperInvoker {
    pub fn new(settings: ScraperSettings) -> Self {
        ScraperInvoker {
            settings,
            slot: Mutex::new(RunSlot::Idle),
        }
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock_slot(), RunSlot::Running(_))
    }

    /// Stops the in-flight run, if any. Returns whether there was one.
    ///
    /// Only the run holding the slot at this moment can be reached; a
    /// later run gets a fresh channel.
    pub fn cancel(&self) -> bool {
        match &mut *self.lock_slot() {
            RunSlot::Idle => false,
            RunSlot::Running(sender) => {
                if let Some(sender) = sender.take() {
                    // The run may have just finished; nothing to stop then.
                    let _ = sender.send(());
                }
                true
            }
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, RunSlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claims the slot for a new run, handing back its cancel receiver.
    fn begin_run(&self) -> Result<oneshot::Receiver<()>, ScraperError> {
        let mut slot = self.lock_slot();
        if let RunSlot::Running(_) = *slot {
            return Err(ScraperError::AlreadyRunning);
        }

        let (sender, receiver) = oneshot::channel();
        *slot = RunSlot::Running(Some(sender));
        Ok(receiver)
    }

    /// Injects the request's parameters, then runs the scraper and waits for it.
    pub async fn run(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome, ScraperError> {
        let mut cancelled = self.begin_run()?;
        let _guard = RunningGuard(&self.slot);

        let language = request.language.code();
        write_query_list(&self.settings.query_list_path, &request.region).await?;
        patch_run_script(&self.settings.script_path, &request.region, language).await?;
        write_params_file(&self.settings.params_file_path, request).await?;

        let command = format!(
            "{} {}",
            self.settings.interpreter,
            self.settings.script_path.display()
        );
        log::info!(
            "Starting scraper `{}` for region {:?}, language {}",
            command,
            request.region,
            language
        );

        let child = Command::new(&self.settings.interpreter)
            .arg(&self.settings.script_path)
            .env("SCRAPER_REGION", &request.region)
            .env("SCRAPER_LANGUAGE", language)
            .env("SCRAPER_PARAMS_FILE", &self.settings.params_file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScraperError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(ScraperError::Wait)?,
            _ = tokio::time::sleep(self.settings.timeout()) => {
                log::error!(
                    "Scraper `{}` exceeded {:?}, killing it",
                    command,
                    self.settings.timeout()
                );
                return Ok(ScrapeOutcome::TimedOut);
            }
            Ok(()) = &mut cancelled => {
                log::warn!("Scraper `{}` cancelled, killing it", command);
                return Ok(ScrapeOutcome::Cancelled);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::info!("Scraper stdout:\n{}", stdout.trim_end());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::warn!("Scraper stderr:\n{}", stderr.trim_end());
        }

        if output.status.success() {
            log::info!("Scraper `{}` finished successfully", command);
            Ok(ScrapeOutcome::Succeeded)
        } else {
            log::error!("Scraper `{}` failed with {}", command, output.status);
            Ok(ScrapeOutcome::Failed {
                code: output.status.code(),
            })
        }
    }
}
