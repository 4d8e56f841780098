use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::infra::interrupt::Interrupt;

#[cfg(windows)]
const YTDLP_CANDIDATES: &[&str] = &["yt-dlp.exe", "yt-dlp"];
#[cfg(not(windows))]
const YTDLP_CANDIDATES: &[&str] = &["yt-dlp"];

#[cfg(windows)]
const FFMPEG_CANDIDATES: &[&str] = &["ffmpeg.exe", "ffmpeg"];
#[cfg(not(windows))]
const FFMPEG_CANDIDATES: &[&str] = &["ffmpeg"];

/// Inputs of one yt-dlp batch run.
#[derive(Debug)]
pub struct DownloadJob<'a> {
    pub cookies_file: &'a Path,
    pub urls_file: &'a Path,
    pub archive_file: &'a Path,
    pub output_dir: &'a Path,
    pub sub_langs: &'a str,
    pub output_template: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed,
    /// yt-dlp exited unsuccessfully; `None` when it was killed by a signal.
    Failed(Option<i32>),
    Cancelled,
    /// yt-dlp was never started.
    NotStarted(String),
}

/// Looks each name up on `PATH`, then in `cwd`.
pub fn resolve_binary(candidates: &[&str], cwd: &Path) -> Option<PathBuf> {
    for name in candidates {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
        let local = cwd.join(name);
        if local.is_file() {
            return Some(local);
        }
    }
    None
}

pub fn download_args(job: &DownloadJob<'_>, ffmpeg: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--cookies".into(),
        job.cookies_file.into(),
        "-a".into(),
        job.urls_file.into(),
        "--write-subs".into(),
        "--write-auto-subs".into(),
        "--sub-langs".into(),
        job.sub_langs.into(),
        "--embed-subs".into(),
        "--embed-thumbnail".into(),
        "--add-metadata".into(),
        "--embed-metadata".into(),
        "--write-info-json".into(),
        "--write-description".into(),
        "--write-thumbnail".into(),
        "--convert-thumbnails".into(),
        "jpg".into(),
        "--download-archive".into(),
        job.archive_file.into(),
        "-o".into(),
        job.output_dir.join(job.output_template).into(),
    ];

    if let Some(ffmpeg) = ffmpeg {
        args.push("--ffmpeg-location".into());
        args.push(ffmpeg.into());
    }
    args
}

/// Runs yt-dlp once over the URL file. Failures are reported through the
/// returned outcome, never raised.
pub fn run_download(job: &DownloadJob<'_>, interrupt: &Interrupt) -> DownloadOutcome {
    if !job.cookies_file.exists() {
        return DownloadOutcome::NotStarted(format!(
            "'{}' is missing. Cannot proceed with download.",
            job.cookies_file.display()
        ));
    }

    let cwd = env::current_dir().unwrap_or_default();
    let Some(ytdlp) = resolve_binary(YTDLP_CANDIDATES, &cwd) else {
        return DownloadOutcome::NotStarted(
            "yt-dlp binary not found in PATH or current directory".to_string(),
        );
    };
    let ffmpeg = resolve_binary(FFMPEG_CANDIDATES, &cwd);
    match &ffmpeg {
        Some(path) => tracing::debug!("using ffmpeg at {}", path.display()),
        None => tracing::warn!("ffmpeg not found, yt-dlp will look for it on its own"),
    }

    run_ytdlp(&ytdlp, ffmpeg.as_deref(), job, interrupt)
}

/// Only a Ctrl-C that arrives while `ytdlp` runs counts as a cancellation.
fn run_ytdlp(
    ytdlp: &Path,
    ffmpeg: Option<&Path>,
    job: &DownloadJob<'_>,
    interrupt: &Interrupt,
) -> DownloadOutcome {
    interrupt.reset();

    println!("\n{}", "=".repeat(50));
    println!("STARTING YT-DLP DOWNLOAD");
    println!("{}\n", "=".repeat(50));

    let args = download_args(job, ffmpeg);
    tracing::debug!("running {} {:?}", ytdlp.display(), args);

    let status = match Command::new(ytdlp).args(&args).status() {
        Ok(status) => status,
        Err(e) => {
            return DownloadOutcome::NotStarted(format!(
                "Failed to run {}: {e}",
                ytdlp.display()
            ))
        }
    };

    if interrupt.is_triggered() {
        DownloadOutcome::Cancelled
    } else if status.success() {
        DownloadOutcome::Completed
    } else {
        DownloadOutcome::Failed(status.code())
    }
}
