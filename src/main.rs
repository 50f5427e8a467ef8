mod browser;
mod config;
mod crawler;
mod models;
mod page;
mod paginator;
mod parser;
mod writer;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use browser::BrowserSession;
use config::{BrowserSettings, CrawlConfig};
use writer::ResultsFile;

#[derive(Parser)]
#[command(
    name = "lift_results",
    about = "Scrape weightlifting competition results into a generated TypeScript module"
)]
struct Cli {
    /// Highest event ID; the crawl walks down from here
    #[arg(long, default_value_t = config::START_ID)]
    start: u32,
    /// Lowest event ID (inclusive)
    #[arg(long, default_value_t = config::END_ID)]
    end: u32,
    /// Generated file, fully rewritten after each event
    #[arg(short, long, default_value = config::OUTPUT_PATH)]
    output: PathBuf,
    /// Results site origin
    #[arg(long, default_value = config::BASE_URL)]
    base_url: String,
    /// Pause between events, in milliseconds
    #[arg(long, default_value_t = config::EVENT_DELAY.as_millis() as u64)]
    delay_ms: u64,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let cfg = CrawlConfig {
        base_url: cli.base_url,
        start_id: cli.start,
        end_id: cli.end,
        output: cli.output,
        event_delay: Duration::from_millis(cli.delay_ms),
        ..Default::default()
    };
    cfg.validate()?;
    let settings = BrowserSettings {
        headless: !cli.headed,
        ..Default::default()
    };

    info!(
        "Scraping events {} down to {} into {}",
        cfg.start_id,
        cfg.end_id,
        cfg.output.display()
    );

    let pb = ProgressBar::new(cfg.event_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg} (eta {eta})")?
            .progress_chars("=> "),
    );

    let mut output = ResultsFile::new(&cfg.output);
    let session = BrowserSession::launch(&settings).await?;
    let crawled = crawler::crawl(session.page(), &cfg, &mut output, &pb).await;
    let closed = session.close().await;
    pb.finish_and_clear();

    let (events, stats) = crawled?;
    closed?;

    println!(
        "Visited {} events: {} collected, {} empty, {} without results, {} failed.",
        stats.visited, stats.collected, stats.empty, stats.missing, stats.failed
    );
    if events.is_empty() {
        println!("No results collected; {} left untouched.", output.path().display());
    } else {
        println!("Saved {} results to {}.", stats.rows, output.path().display());
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
