mod cli;
mod config;
mod domain;
mod infra;
mod logging;
mod media;
mod workflows;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::process::ExitCode;

use cli::Cli;
use config::Config;
use domain::models::StopReason;
use infra::catalog::Catalog;
use infra::http::HttpPageSource;
use infra::interrupt::Interrupt;
use media::ytdlp::{self, DownloadJob, DownloadOutcome};
use workflows::prerequisites::{check_prerequisites, prepare_output_dir};
use workflows::scrape::scrape_catalog;
use workflows::walker::CatalogWalker;

const EXIT_FATAL: u8 = 1;
const EXIT_NO_URLS: u8 = 2;
const EXIT_DOWNLOAD_FAILED: u8 = 3;
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let cookies_file = cli.cookies.unwrap_or_else(|| config.cookies_file.clone());
    let archive_file = cli.archive.unwrap_or_else(|| config.archive_file.clone());

    // Nothing touches the network until the cookie file is known to exist.
    check_prerequisites(&cookies_file, &archive_file)?;

    let cwd = env::current_dir().context("Failed to read current directory")?;
    let output_dir = prepare_output_dir(&cli.output_dir, &cwd)?;
    println!("Saving results to {}", output_dir.display());

    let interrupt = Interrupt::install()?;
    let catalog = Catalog::new(&config.base_url)?;
    let source = HttpPageSource::new(&config, interrupt.clone())?;
    let mut walker = CatalogWalker::new(source, &catalog);

    let summary = scrape_catalog(&mut walker, &config.urls_file)?;
    // Ctrl-C during the last polite delay is not seen by any fetch.
    if interrupt.is_triggered() || summary.stopped == Some(StopReason::Interrupted) {
        println!("\nScraping interrupted! Proceeding to download with whatever we found...");
        interrupt.reset();
    } else if let Some(StopReason::RetriesExhausted(reason)) = &summary.stopped {
        tracing::error!("{reason}");
        println!("\nScraping stopped early. Proceeding to download with whatever we found...");
    }

    println!(
        "\nScraping Finished. Found {} links across {} series.",
        summary.urls_written, summary.series
    );
    if summary.urls_written == 0 {
        println!("No URLs found. Exiting.");
        return Ok(ExitCode::from(EXIT_NO_URLS));
    }

    let job = DownloadJob {
        cookies_file: &cookies_file,
        urls_file: &config.urls_file,
        archive_file: &archive_file,
        output_dir: &output_dir,
        sub_langs: &config.sub_langs,
        output_template: &config.output_template,
    };

    let code = match ytdlp::run_download(&job, &interrupt) {
        DownloadOutcome::Completed => {
            println!("\nDownload batch complete.");
            ExitCode::SUCCESS
        }
        DownloadOutcome::Failed(code) => {
            match code {
                Some(code) => eprintln!("yt-dlp encountered an error (Code: {code})."),
                None => eprintln!("yt-dlp was terminated by a signal."),
            }
            ExitCode::from(EXIT_DOWNLOAD_FAILED)
        }
        DownloadOutcome::Cancelled => {
            println!("\nDownload cancelled by user.");
            ExitCode::from(EXIT_CANCELLED)
        }
        DownloadOutcome::NotStarted(reason) => {
            eprintln!("\nERROR: {reason}");
            ExitCode::from(EXIT_DOWNLOAD_FAILED)
        }
    };
    Ok(code)
}
