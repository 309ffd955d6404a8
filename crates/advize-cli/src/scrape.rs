//! Scrape command handlers for the CLI.
//!
//! Records are printed to stdout as pretty JSON; logs go to stderr.

use advize_core::ScrapeMode;
use advize_scraper::{
    extract_handle, normalize_post_url, InstagramScraper, ResultsType, ScrapedRecord,
};

fn build_scraper() -> anyhow::Result<InstagramScraper> {
    let config = advize_core::load_app_config()?;
    Ok(InstagramScraper::from_config(&config)?)
}

async fn scrape_and_print(mode: ScrapeMode, target: &str) -> anyhow::Result<()> {
    let scraper = build_scraper()?;
    match scraper.scrape(mode, target).await {
        Ok(record) => {
            print_record(&record)?;
            Ok(())
        }
        Err(failure) => anyhow::bail!("{mode} scrape failed: {}", failure.message),
    }
}

fn print_record(record: &ScrapedRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

/// Scrape one profile.
///
/// # Errors
///
/// Returns an error if the input has no extractable handle, config is
/// missing, or the scrape fails.
pub(crate) async fn run_profile(input: &str) -> anyhow::Result<()> {
    let handle = extract_handle(input)
        .ok_or_else(|| anyhow::anyhow!("could not extract an Instagram username from '{input}'"))?;
    scrape_and_print(ScrapeMode::Profile, &handle).await
}

/// Scrape one post.
///
/// # Errors
///
/// Returns an error if the URL is not a post URL, config is missing, or the
/// scrape fails.
pub(crate) async fn run_post(url: &str) -> anyhow::Result<()> {
    let post_url = normalize_post_url(url)
        .ok_or_else(|| anyhow::anyhow!("not a valid Instagram post URL: '{url}'"))?;
    scrape_and_print(ScrapeMode::Post, &post_url).await
}

/// Dump raw dataset items so upstream shape changes can be inspected.
///
/// # Errors
///
/// Returns an error if config is missing or the actor run fails.
pub(crate) async fn run_raw(url: &str, results_type: ResultsType) -> anyhow::Result<()> {
    let scraper = build_scraper()?;
    let items = scraper.fetch_raw(url, results_type).await?;
    tracing::info!(count = items.len(), "fetched raw dataset items");
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

/// Print the canonical handle for `input`. Does not call the network.
///
/// # Errors
///
/// Returns an error if no handle can be extracted.
pub(crate) fn run_handle(input: &str) -> anyhow::Result<()> {
    let handle = extract_handle(input)
        .ok_or_else(|| anyhow::anyhow!("could not extract an Instagram username from '{input}'"))?;
    println!("{handle}");
    Ok(())
}
