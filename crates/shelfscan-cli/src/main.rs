mod logging;
mod urls;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use shelfscan_output::OutputWriter;
use shelfscan_scraper::{ChromiumLauncher, ScrapeRunner};

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Scrape product pages and simulated checkouts into JSON, CSV and XLSX")]
struct Cli {
    /// Product URLs to scrape; takes precedence over --file
    #[arg(long, num_args = 1..)]
    urls: Vec<String>,

    /// File with one URL per line; invalid lines are skipped
    #[arg(long)]
    file: Option<PathBuf>,

    /// Settings file; built-in defaults apply when it does not exist
    #[arg(long, default_value = "config/settings.yaml")]
    config: PathBuf,

    /// Selector file; a missing file leaves every configured field empty
    #[arg(long, default_value = "config/selectors.yaml")]
    selectors: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = shelfscan_core::load_settings_or_default(&cli.config)?;
    shelfscan_core::apply_process_env(&mut settings)?;
    let _log_guard = logging::init_logging(&settings.logging)?;

    let selectors = shelfscan_core::load_selectors_or_empty(&cli.selectors)?;

    let urls = urls::resolve_urls(&cli.urls, cli.file.as_deref());
    if urls.is_empty() {
        println!("No valid URLs provided. Use --urls or --file arguments.");
        return Ok(());
    }
    tracing::info!(count = urls.len(), "starting scrape run");

    let launcher = Arc::new(ChromiumLauncher::from_settings(&settings.scraper));
    let runner = ScrapeRunner::from_settings(&settings, selectors, launcher);
    let results = runner.scrape_urls(&urls).await;

    let report = OutputWriter::from_settings(&settings.output).write_all(&results);

    let successful = results.iter().filter(|r| r.success).count();
    println!(
        "Scraping completed. Successful: {successful}/{}",
        results.len()
    );
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
    for (path, error) in &report.failed {
        println!("  failed {}: {error}", path.display());
    }

    Ok(())
}
