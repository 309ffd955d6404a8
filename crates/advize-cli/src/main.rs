mod scrape;

use advize_scraper::ResultsType;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "advize-cli")]
#[command(about = "Advize Instagram scrape command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a profile and print the normalized record as JSON
    Profile {
        /// Profile URL, bare handle or @handle
        input: String,
    },
    /// Scrape a post and print the normalized record as JSON
    Post {
        /// Post, reel or IGTV URL
        url: String,
    },
    /// Run the actor for a URL and dump the raw dataset items
    Raw {
        /// Instagram URL passed to the actor as-is
        url: String,

        /// Actor results type
        #[arg(long, default_value = "details")]
        results_type: ResultsType,
    },
    /// Print the canonical handle extracted from a URL or handle
    Handle {
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Profile { input }) => scrape::run_profile(&input).await?,
        Some(Commands::Post { url }) => scrape::run_post(&url).await?,
        Some(Commands::Raw { url, results_type }) => scrape::run_raw(&url, results_type).await?,
        Some(Commands::Handle { input }) => scrape::run_handle(&input)?,
        None => println!("advize-cli: pass --help for available commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
