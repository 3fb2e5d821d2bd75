//! `gradcafe pull`: crawl until caught up, clean new rows, log the run.

use super::output::{self, Styled};
use super::{build_crawler, build_ingestor, CrawlArgs};
use anyhow::{bail, Context, Result};
use gradcafe_harvest::audit::{RunEvent, RunLog};
use gradcafe_harvest::{pull, HarvestConfig, PullSummary, StopReason};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

/// Busy flag for the duration of one pull. Removed on drop.
pub struct PullLock {
    path: PathBuf,
}

impl PullLock {
    /// Take the lock, clearing it first if the process that wrote it is gone.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    writeln!(file, "{}", std::process::id())?;
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if let Some(pid) = holder_pid(path).filter(|pid| process_alive(*pid)) {
                        bail!(
                            "a pull is already running (PID {pid}, lock {})",
                            path.display()
                        );
                    }
                    warn!("removing stale lock {}", path.display());
                    std::fs::remove_file(path).ok();
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to create lock {}", path.display()))
                }
            }
        }
        bail!("could not take lock {}", path.display())
    }
}

impl Drop for PullLock {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}

fn holder_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    let output = std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output();
    matches!(output, Ok(o) if o.status.success())
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

pub async fn run(config: &HarvestConfig, args: &CrawlArgs) -> Result<()> {
    let _lock = PullLock::acquire(&config.lock_path())?;

    let options = args.options(config);
    let started = Instant::now();
    let mut event = RunEvent::now("pull");
    event.base_url = Some(options.base_url.clone());

    let result = async {
        let crawler = build_crawler(config)?;
        let mut ingestor = build_ingestor(config, false)?;
        pull(&crawler, &options, &mut ingestor)
            .await
            .context("pull failed")
    }
    .await;

    event.duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(summary) => {
            event.pages_fetched = summary.pages_fetched;
            event.scraped = summary.scraped;
            event.inserted = summary.inserted;
            event.invalid_scores = summary.cleaned_gre_aw;
            event.campus_fixes = summary.cleaned_uc;
            event.stop_reason = serde_json::to_value(summary.stop_reason)
                .ok()
                .and_then(|v| v.as_str().map(String::from));
        }
        Err(e) => event.status = format!("{e:#}"),
    }
    if let Err(e) = RunLog::open(&config.run_log_path()).and_then(|mut log| log.log(&event)) {
        warn!("could not write run log: {e}");
    }

    let summary = result?;
    report(&summary, event.duration_ms)?;
    Ok(())
}

fn report(summary: &PullSummary, duration_ms: u64) -> Result<()> {
    if output::is_json() {
        output::print_json(&serde_json::to_value(summary)?);
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    let s = Styled::new();
    if summary.stop_reason == StopReason::PolicyDenied {
        output::print_check(s.warn_sym(), "Robots:", &s.yellow(&summary.message));
        return Ok(());
    }
    output::print_check(
        s.ok_sym(),
        "Pages:",
        &format!(
            "{} fetched, {} skipped {}",
            summary.pages_fetched,
            summary.pages_skipped,
            s.dim(&format!("({})", output::format_duration_ms(duration_ms)))
        ),
    );
    output::print_check(
        s.ok_sym(),
        "Rows:",
        &format!("{} checked, {} new", summary.scraped, s.green(&summary.inserted.to_string())),
    );
    eprintln!();
    eprintln!("  {}", s.bold(&summary.message));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home").join("pull.lock");

        let lock = PullLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(PullLock::acquire(&path).is_err());

        drop(lock);
        assert!(!path.exists());
        assert!(PullLock::acquire(&path).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pull.lock");
        std::fs::write(&path, "999999999\n").unwrap();

        let _lock = PullLock::acquire(&path).unwrap();
        assert_eq!(holder_pid(&path), Some(std::process::id()));
    }

    #[test]
    fn test_garbage_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pull.lock");
        std::fs::write(&path, "not a pid").unwrap();
        assert!(PullLock::acquire(&path).is_ok());
    }
}
