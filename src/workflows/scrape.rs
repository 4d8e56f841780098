use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::models::{ScrapeSummary, StopReason};
use crate::infra::http::{FetchError, PageSource};
use crate::workflows::walker::CatalogWalker;

/// Truncates `urls_file`, then walks the catalog appending every episode URL
/// as soon as its season page is scraped. An interrupt or a dead endpoint
/// ends the walk early without discarding what was already written.
pub fn scrape_catalog<S: PageSource>(
    walker: &mut CatalogWalker<'_, S>,
    urls_file: &Path,
) -> Result<ScrapeSummary> {
    let file = File::create(urls_file)
        .with_context(|| format!("Failed to create URL file {}", urls_file.display()))?;
    let mut writer = BufWriter::new(file);
    let mut summary = ScrapeSummary::default();

    println!("--- Finding all Series ---");
    let series_list = match walker.all_series() {
        Ok(series_list) => series_list,
        Err(e) => {
            summary.stopped = Some(stop_reason(e));
            return Ok(summary);
        }
    };
    summary.series = series_list.len();
    println!("Total Series Found: {}\n", series_list.len());

    println!("--- Scraping Episodes & Writing to File ---");
    for series in &series_list {
        println!("--- Scraping: {} ---", series.title);

        let mut written = 0;
        let result = walker.walk_show(series, |_, links| {
            for url in links {
                writeln!(writer, "{url}")?;
            }
            writer.flush()?;
            written += links.len();
            Ok(())
        });
        summary.urls_written += written;

        if let Err(e) = result {
            match e.downcast::<FetchError>() {
                Ok(fetch_error) => {
                    summary.stopped = Some(stop_reason(fetch_error));
                    break;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "Failed to write URLs to {}",
                        urls_file.display()
                    )))
                }
            }
        }
        tracing::debug!("{}: {written} episode URL(s)", series.title);
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write URLs to {}", urls_file.display()))?;
    Ok(summary)
}

fn stop_reason(e: FetchError) -> StopReason {
    match e {
        FetchError::Interrupted => StopReason::Interrupted,
        e @ FetchError::RetriesExhausted { .. } => StopReason::RetriesExhausted(e.to_string()),
    }
}
