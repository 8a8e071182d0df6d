//! ffsubsync-backed synchronizer.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::metrics;

use super::{SyncOutcome, SyncSkipReason, SyncedSubtitle, Synchronizer};

const STDERR_TAIL: usize = 500;

/// Runs `ffsubsync <reference> -i <subtitle> -o <output>`.
///
/// The output is written next to the input as `<stem>.synced.<ext>`. Success
/// requires a zero exit status and a non-empty output file; anything else
/// falls back to the original subtitle.
#[derive(Debug, Clone)]
pub struct FfsubsyncSynchronizer {
    config: SyncConfig,
}

impl FfsubsyncSynchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    fn output_path(subtitle: &Path) -> PathBuf {
        let stem = subtitle
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "subtitle".to_string());
        let ext = subtitle
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "srt".to_string());
        subtitle.with_file_name(format!("{}.synced.{}", stem, ext))
    }

    async fn run(&self, subtitle: &Path, reference: &Path) -> Result<SyncedSubtitle, SyncSkipReason> {
        if !self.config.enabled {
            return Err(SyncSkipReason::Disabled);
        }
        if !tokio::fs::try_exists(reference).await.unwrap_or(false) {
            return Err(SyncSkipReason::ReferenceMissing {
                path: reference.to_path_buf(),
            });
        }

        let output = Self::output_path(subtitle);
        // dropping the guard removes whatever a failed run left behind
        let guard = SyncedSubtitle::new(&output);

        debug!(
            tool = %self.config.ffsubsync_path,
            subtitle = %subtitle.display(),
            reference = %reference.display(),
            "Running ffsubsync"
        );

        let mut child = Command::new(&self.config.ffsubsync_path)
            .arg(reference)
            .arg("-i")
            .arg(subtitle)
            .arg("-o")
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SyncSkipReason::ToolNotFound {
                        path: self.config.ffsubsync_path.clone(),
                    }
                } else {
                    SyncSkipReason::Io(e.to_string())
                }
            })?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let status = match timeout(self.config.timeout(), child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(SyncSkipReason::Io(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                return Err(SyncSkipReason::TimedOut {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(SyncSkipReason::Failed {
                code: status.code(),
                stderr: tail(&stderr, STDERR_TAIL),
            });
        }

        match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.len() > 0 => Ok(guard),
            _ => Err(SyncSkipReason::NoOutput),
        }
    }
}

#[async_trait]
impl Synchronizer for FfsubsyncSynchronizer {
    fn name(&self) -> &str {
        "ffsubsync"
    }

    async fn sync(&self, subtitle: &Path, reference: &Path) -> SyncOutcome {
        match self.run(subtitle, reference).await {
            Ok(synced) => {
                info!(subtitle = %subtitle.display(), "Subtitle synchronized");
                metrics::SYNC_OUTCOMES.with_label_values(&["synced"]).inc();
                SyncOutcome::Synced(synced)
            }
            Err(reason) => {
                if reason == SyncSkipReason::Disabled {
                    debug!("Synchronization disabled, keeping original timing");
                } else {
                    warn!(
                        subtitle = %subtitle.display(),
                        reason = %reason,
                        "Synchronization failed, keeping original timing"
                    );
                }
                metrics::SYNC_OUTCOMES
                    .with_label_values(&[reason.label()])
                    .inc();
                SyncOutcome::unsynced(subtitle, reason)
            }
        }
    }
}

fn tail(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    let count = trimmed.chars().count();
    trimmed.chars().skip(count.saturating_sub(max_chars)).collect()
}
