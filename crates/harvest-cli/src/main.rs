mod export;
mod prompt;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "browser")]
use harvest_client::BrowserFeed;
use harvest_client::{
    GitHubConfig, GitHubUploader, HttpFeed, LocalUploader, ShredditExtractor, SnapshotFeed,
};
use harvest_core::encode::encode_json;
use harvest_core::params::FixedParams;
use harvest_core::retry::{RetryPolicy, RetryingUploader};
use harvest_core::traits::NullUploader;
use harvest_core::util::source_context;
use harvest_core::{Collector, FeedSource, RawParams, Uploader};

use crate::prompt::PromptParams;

const DEFAULT_FEED_URL: &str = "https://www.reddit.com/r/mentalhealth/new/";

#[derive(Parser)]
#[command(
    name = "harvest",
    version,
    about = "Collect posts from an infinite-scroll feed in timed batches"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll a feed and upload harvested posts in batches
    Collect(CollectArgs),

    /// Merge batch JSON files into one deduplicated data set
    Combine {
        /// Directory searched recursively for batch JSON files
        #[arg(short, long, default_value = "data/raw")]
        input: PathBuf,

        /// Directory that receives combined_posts.csv and combined_posts.json
        #[arg(short, long, default_value = "data/combined")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct CollectArgs {
    /// Feed URL (e.g. a subreddit's "new" listing)
    #[arg(short, long, env = "HARVEST_FEED_URL", default_value = DEFAULT_FEED_URL)]
    url: String,

    /// Replay saved HTML snapshots from this directory instead of fetching
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Drive a headless Chrome instead of plain HTTP requests
    #[cfg(feature = "browser")]
    #[arg(long, default_value_t = false)]
    browser: bool,

    /// Source context used in file names (defaults to the URL's subreddit)
    #[arg(long)]
    context: Option<String>,

    /// Ask for the collection parameters on the terminal
    #[arg(short, long, default_value_t = false)]
    interactive: bool,

    /// Total collection time in minutes [default: 5]
    #[arg(long)]
    total_minutes: Option<f64>,

    /// Stop once this many distinct posts were collected [default: 1000]
    #[arg(long)]
    target_posts: Option<f64>,

    /// Flush a batch after this many minutes [default: 1]
    #[arg(long)]
    batch_minutes: Option<f64>,

    /// Flush a batch once it holds this many posts [default: 100]
    #[arg(long)]
    batch_size: Option<f64>,

    /// Pixels scrolled per cycle [default: 2000]
    #[arg(long)]
    scroll_px: Option<f64>,

    /// Record each post's flair
    #[arg(long, default_value_t = false)]
    flair: bool,

    /// Accept posts whose score/comment widgets are not inside a shadow root
    #[arg(long, default_value_t = false)]
    light_dom: bool,

    /// Where batch files go
    #[arg(long, env = "HARVEST_SINK", value_enum, default_value_t = Sink::Github)]
    sink: Sink,

    /// Root directory for the local sink
    #[arg(long, env = "HARVEST_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Attempts per batch file before the run aborts
    #[arg(long, default_value_t = 1)]
    upload_retries: u32,

    /// Wait after each scroll before capturing the page, in milliseconds
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Also write the whole run as CSV and JSON to this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print the whole run as JSON to stdout
    #[arg(long, default_value_t = false)]
    print: bool,
}

impl CollectArgs {
    fn raw_params(&self) -> RawParams {
        RawParams {
            total_minutes: self.total_minutes,
            target_posts: self.target_posts,
            batch_minutes: self.batch_minutes,
            batch_size: self.batch_size,
            scroll_px: self.scroll_px,
        }
    }

    fn context(&self) -> String {
        self.context
            .clone()
            .unwrap_or_else(|| source_context(&self.url))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sink {
    /// GitHub contents API (needs GITHUB_TOKEN and repo settings)
    Github,
    /// Files below --out-dir
    Local,
    /// Discard batches
    #[value(name = "none")]
    Discard,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("harvest=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect(args) => cmd_collect(&args).await,
        Commands::Combine { input, output } => cmd_combine(&input, &output),
    }
}

/// Pick the feed source, then the sink, then run.
async fn cmd_collect(args: &CollectArgs) -> Result<()> {
    let context = args.context();

    #[cfg(feature = "browser")]
    if args.browser {
        tracing::info!(url = %args.url, "Launching headless browser");
        let feed = BrowserFeed::open(&args.url)
            .await
            .context("Failed to open the feed in a browser")?;
        return with_sink(feed, &context, args).await;
    }

    if let Some(dir) = &args.snapshots {
        let feed = SnapshotFeed::open(dir)
            .with_context(|| format!("Failed to load snapshots from {}", dir.display()))?;
        return with_sink(feed, &context, args).await;
    }

    let feed = HttpFeed::new(args.url.clone()).context("Failed to create HTTP client")?;
    with_sink(feed, &context, args).await
}

async fn with_sink<F: FeedSource>(feed: F, context: &str, args: &CollectArgs) -> Result<()> {
    let policy = RetryPolicy::new(args.upload_retries);

    match args.sink {
        Sink::Github => {
            let config = GitHubConfig::from_env().context("GitHub sink is not configured")?;
            tracing::info!(
                owner = %config.owner,
                repo = %config.repo,
                branch = %config.branch,
                "Uploading batches to GitHub"
            );
            let uploader =
                GitHubUploader::new(&config).context("Failed to create GitHub client")?;
            run_collection(feed, RetryingUploader::new(uploader, policy), context, args).await
        }
        Sink::Local => {
            tracing::info!(root = %args.out_dir.display(), "Writing batches locally");
            let uploader = LocalUploader::new(args.out_dir.clone());
            run_collection(feed, RetryingUploader::new(uploader, policy), context, args).await
        }
        Sink::Discard => {
            tracing::warn!("Batches will not be stored anywhere");
            run_collection(feed, NullUploader, context, args).await
        }
    }
}

async fn run_collection<F, U>(feed: F, uploader: U, context: &str, args: &CollectArgs) -> Result<()>
where
    F: FeedSource,
    U: Uploader,
{
    let mut extractor = ShredditExtractor::new().with_flair(args.flair);
    if args.light_dom {
        extractor = extractor.allow_light_dom();
    }

    let mut collector = Collector::new(feed, extractor, uploader, context)
        .with_settle_interval(Duration::from_millis(args.settle_ms));

    let acquired = if args.interactive {
        let mut prompts = PromptParams::new(std::io::stdin().lock(), std::io::stdout());
        collector.configure(&mut prompts)
    } else {
        let params = args
            .raw_params()
            .build()
            .context("Invalid collection parameters")?;
        collector.configure(&mut FixedParams(params))
    };

    let Some(params) = acquired.context("Failed to read collection parameters")? else {
        tracing::info!("Nothing collected");
        return Ok(());
    };

    let summary = match collector.run(params).await {
        Ok(summary) => summary,
        Err(e) => {
            let unflushed = collector.pending().len();
            return Err(anyhow::Error::new(e).context(format!(
                "Collection for '{context}' aborted ({unflushed} posts were not uploaded)"
            )));
        }
    };

    let line = format!(
        "Collected {} posts from '{}' in {} batches ({}, {:.1}s)",
        summary.records.len(),
        context,
        summary.batches,
        summary.reason,
        summary.elapsed.as_secs_f64()
    );
    // Keep stdout clean for the JSON when printing.
    if args.print {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }

    if let Some(dir) = &args.export_dir {
        for path in export::export_run(dir, context, &summary.records)? {
            tracing::info!(path = %path.display(), "Exported run");
        }
    }

    if args.print {
        println!("{}", encode_json(&summary.records)?);
    }

    Ok(())
}

fn cmd_combine(input: &Path, output: &Path) -> Result<()> {
    let report = export::combine(input, output)?;

    println!(
        "Combined {} posts from {} files into {}",
        report.records,
        report.files_read,
        output.display()
    );
    if report.files_skipped > 0 {
        println!("Skipped {} unreadable files", report.files_skipped);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    fn collect_args(extra: &[&str]) -> CollectArgs {
        let mut argv = vec!["harvest", "collect"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Collect(args) => args,
            Commands::Combine { .. } => panic!("expected collect"),
        }
    }

    #[test]
    fn collect_flags_feed_the_params() {
        let args = collect_args(&[
            "--sink",
            "none",
            "--target-posts",
            "5",
            "--batch-minutes",
            "0.5",
        ]);
        assert_eq!(args.sink, Sink::Discard);

        let params = args.raw_params().build().unwrap();
        assert_eq!(params.target_posts, 5);
        assert_eq!(params.batch_time, Duration::from_secs(30));
        assert_eq!(params.batch_size, 100);
    }

    #[test]
    fn bad_flag_values_are_rejected_before_collection() {
        let args = collect_args(&["--batch-size", "2.5"]);
        assert!(args.raw_params().build().is_err());

        let args = collect_args(&["--total-minutes=-1"]);
        assert!(args.raw_params().build().is_err());
    }

    #[test]
    fn context_comes_from_url_unless_given() {
        let args = collect_args(&["--url", "https://www.reddit.com/r/anxiety/new/"]);
        assert_eq!(args.context(), "anxiety");

        let args = collect_args(&["--context", "offline"]);
        assert_eq!(args.context(), "offline");
    }

    #[test]
    fn combine_has_defaults() {
        let cli = Cli::try_parse_from(["harvest", "combine"]).unwrap();
        match cli.command {
            Commands::Combine { input, output } => {
                assert_eq!(input, PathBuf::from("data/raw"));
                assert_eq!(output, PathBuf::from("data/combined"));
            }
            Commands::Collect(_) => panic!("expected combine"),
        }
    }
}
