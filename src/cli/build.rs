use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use partycards::{
    BuildContext, CachedFetcher, DEFAULT_CACHE_TTL_HOURS, DeckFetcher, DeckInput, DeckOptions,
    DeckOutcome, DeckResolver, HttpFetcher, SheetSettings, discover_inputs, run_batch,
};

use crate::cli::common::{AssetArgs, GridArgs};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory scanned for `<id>.csv` decks and `<id>-icon.png` overrides.
    #[arg(long, env = "CARDS_INPUT", default_value = "input")]
    pub input: PathBuf,
    /// Root directory receiving one sub-directory per deck.
    #[arg(long, env = "CARDS_OUTPUT", default_value = "output")]
    pub output: PathBuf,
    #[command(flatten)]
    pub assets: AssetArgs,
    /// JSON options table keyed by deck id.
    #[arg(long, env = "CARDS_OPTIONS")]
    pub options: Option<PathBuf>,
    /// Remote deck code to fetch and build (repeatable).
    #[arg(long = "remote", value_name = "CODE")]
    pub remote: Vec<String>,
    /// Base URL of the deck API; decks are fetched from `<url>/<code>`.
    #[arg(long, env = "CARDS_API_URL")]
    pub api_url: Option<String>,
    /// Directory for cached remote payloads.
    #[arg(long, env = "CARDS_CACHE_DIR", default_value = ".deck-cache")]
    pub cache_dir: PathBuf,
    /// Hours a cached payload stays fresh.
    #[arg(long, env = "CARDS_CACHE_TTL_HOURS", default_value_t = DEFAULT_CACHE_TTL_HOURS)]
    pub cache_ttl_hours: i64,
    /// Render worker threads (0 = available parallelism).
    #[arg(short, long, env = "CARDS_JOBS", default_value_t = 0)]
    pub jobs: usize,
    #[command(flatten)]
    pub grid: GridArgs,
}

pub fn handle(args: BuildArgs) -> Result<()> {
    let options = match &args.options {
        Some(path) => DeckOptions::load(path)?,
        None => DeckOptions::default(),
    };

    let mut inputs = if args.input.is_dir() {
        discover_inputs(&args.input)?
    } else if args.remote.is_empty() {
        bail!("input directory {} does not exist", args.input.display());
    } else {
        Vec::new()
    };
    inputs.extend(args.remote.iter().cloned().map(DeckInput::Remote));
    if inputs.is_empty() {
        println!("No decks found in {}", args.input.display());
        return Ok(());
    }

    let fetcher = match &args.api_url {
        Some(url) => Some(CachedFetcher::new(
            HttpFetcher::new(url.as_str())?,
            &args.cache_dir,
            chrono::Duration::hours(args.cache_ttl_hours),
        )),
        None if !args.remote.is_empty() => {
            bail!("--remote requires --api-url (or CARDS_API_URL)")
        }
        None => None,
    };

    let resolver = DeckResolver {
        options: &options,
        fetcher: fetcher.as_ref().map(|f| f as &dyn DeckFetcher),
        icon_dir: args.input.is_dir().then(|| args.input.clone()),
    };
    let ctx = BuildContext::new(
        args.assets.composer()?,
        &args.output,
        SheetSettings::new(args.grid.columns, args.grid.rows, args.assets.sheet_blank()),
        args.jobs,
    )
    .context("failed to prepare build")?;

    let report = run_batch(&inputs, &resolver, &ctx)?;
    for (id, outcome) in &report.completed {
        match outcome {
            DeckOutcome::Built { dir, cards, sheets } => println!(
                "built   {id}: {cards} cards, {sheets} sheets -> {}",
                dir.display()
            ),
            DeckOutcome::Skipped { dir } => {
                println!("skipped {id}: {} already exists", dir.display())
            }
        }
    }
    for (id, err) in &report.failed {
        println!("failed  {id}: {err:#}");
    }
    println!(
        "{} built, {} skipped, {} failed",
        report.built(),
        report.skipped(),
        report.failed.len()
    );

    if report.has_failures() {
        bail!("{} deck(s) failed to build", report.failed.len());
    }
    Ok(())
}
