use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apify_client::ApifyClient;
use trendscout_common::{write_report, Config};
use trendscout_scout::forum::RedditSource;
use trendscout_scout::language::{GoogleTranslator, LanguageNormalizer};
use trendscout_scout::pipeline::{EnrichmentConfig, EnrichmentPipeline};
use trendscout_scout::run::{TimeWindow, TrendRun};
use trendscout_scout::scheduling::{CredentialSelector, QuotaLedger};
use trendscout_scout::youtube_bridge::TranscriptResolver;
use youtube_client::YouTubeClient;

#[derive(Parser)]
#[command(name = "trendscout", about = "Find topics trending on both Reddit and YouTube")]
struct Cli {
    /// Seed topics, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    topics: Vec<String>,

    /// How far back videos may be published
    #[arg(long, value_enum, default_value = "last-month")]
    window: TimeWindow,

    /// Report path (overrides TRENDSCOUT_OUTPUT)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trendscout=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("TrendScout starting...");

    let mut config = Config::from_env()?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    config.log_redacted();

    let ledger = Arc::new(QuotaLedger::from_config(&config));
    let selector = Arc::new(CredentialSelector::new(ledger.clone()));

    let youtube = Arc::new(
        YouTubeClient::new(config.http_timeout).context("Failed to build YouTube client")?,
    );
    let translator = Arc::new(
        GoogleTranslator::new(config.http_timeout).context("Failed to build translator")?,
    );
    let bodies = Arc::new(
        TranscriptResolver::new(youtube.clone())
            .with_normalizer(Arc::new(LanguageNormalizer::english(translator))),
    );
    let pipeline = Arc::new(EnrichmentPipeline::new(
        youtube,
        bodies,
        selector,
        EnrichmentConfig::with_workers(config.workers),
    ));

    let forum = Arc::new(RedditSource::new(ApifyClient::new(
        config.apify_api_token.clone(),
    )));

    let topics: Vec<String> = cli
        .topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let reports = TrendRun::new(forum, pipeline)
        .run(&topics, cli.window, chrono::Utc::now())
        .await;

    write_report(&config.output_path, &reports)
        .await
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;

    ledger.log_status();
    info!(reports = reports.len(), "TrendScout finished");
    Ok(())
}
