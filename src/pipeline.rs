//! Per-deck build driver and batch runner.
//!
//! A deck is built into a hidden staging directory and only renamed to its
//! final `<output>/<id>` name once every card (and sheet, when enabled) is on
//! disk. An existing final directory means the deck is skipped untouched.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use rayon::prelude::*;
use tracing::{error, info};

use crate::deck::{CardFileName, CardRecord, DeckMetadata, DeckOptions};
use crate::error::{RenderError, SourceError};
use crate::render::{CardComposer, load_image};
use crate::sheet::{SheetSpec, pack_directory};
use crate::source::{DeckFetcher, normalize_payload, read_csv};

/// Where a deck's records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckInput {
    Csv(PathBuf),
    Remote(String),
}

impl DeckInput {
    /// Source identifier: the CSV file stem or the remote deck code.
    pub fn id(&self) -> String {
        match self {
            DeckInput::Csv(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            DeckInput::Remote(id) => id.clone(),
        }
    }
}

/// A fully resolved deck, ready to render.
#[derive(Debug, Clone)]
pub struct DeckJob {
    pub id: String,
    pub metadata: DeckMetadata,
    pub records: Vec<CardRecord>,
    /// Icon override stamped on every card of the deck.
    pub icon: Option<PathBuf>,
}

/// Turns [`DeckInput`]s into [`DeckJob`]s.
pub struct DeckResolver<'a> {
    pub options: &'a DeckOptions,
    pub fetcher: Option<&'a dyn DeckFetcher>,
    /// Directory searched for `<id>-icon.png` overrides.
    pub icon_dir: Option<PathBuf>,
}

impl DeckResolver<'_> {
    pub fn resolve(&self, input: &DeckInput) -> Result<DeckJob> {
        let id = input.id();
        let (records, fallback_name) = match input {
            DeckInput::Csv(path) => (read_csv(path)?, None),
            DeckInput::Remote(code) => {
                let fetcher = self
                    .fetcher
                    .ok_or_else(|| anyhow!("no deck API configured for remote deck '{code}'"))?;
                let payload = fetcher.fetch(code)?;
                (normalize_payload(code, &payload)?, payload.name)
            }
        };
        if records.is_empty() {
            return Err(SourceError::EmptyDeck(id).into());
        }
        let metadata = self.options.resolve(&id, fallback_name.as_deref());
        let icon = self
            .icon_dir
            .as_ref()
            .map(|dir| dir.join(format!("{id}-icon.png")))
            .filter(|path| path.is_file());
        Ok(DeckJob {
            id,
            metadata,
            records,
            icon,
        })
    }
}

/// Sheet grid and the lazily loaded blank template.
pub struct SheetSettings {
    pub columns: u32,
    pub rows: u32,
    blank_path: PathBuf,
    blank: OnceLock<Arc<RgbaImage>>,
}

impl SheetSettings {
    pub fn new(columns: u32, rows: u32, blank_path: impl Into<PathBuf>) -> Self {
        Self {
            columns,
            rows,
            blank_path: blank_path.into(),
            blank: OnceLock::new(),
        }
    }

    /// Load the blank template on first use; decks without sheets never need it.
    pub fn blank(&self) -> Result<Arc<RgbaImage>, RenderError> {
        if let Some(blank) = self.blank.get() {
            return Ok(Arc::clone(blank));
        }
        let loaded = Arc::new(load_image(&self.blank_path)?);
        Ok(Arc::clone(self.blank.get_or_init(|| loaded)))
    }

    pub fn spec(&self, (cell_width, cell_height): (u32, u32)) -> SheetSpec {
        SheetSpec::new(self.columns, self.rows, cell_width, cell_height)
    }
}

/// Shared state for building decks.
pub struct BuildContext {
    pub composer: CardComposer,
    pub output_root: PathBuf,
    pub sheets: SheetSettings,
    pool: rayon::ThreadPool,
}

impl BuildContext {
    /// `jobs` bounds the render worker pool; 0 uses the available parallelism.
    pub fn new(
        composer: CardComposer,
        output_root: impl Into<PathBuf>,
        sheets: SheetSettings,
        jobs: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("render-{i}"))
            .build()
            .context("failed to start render worker pool")?;
        Ok(Self {
            composer,
            output_root: output_root.into(),
            sheets,
            pool,
        })
    }

    pub fn deck_dir(&self, id: &str) -> PathBuf {
        self.output_root.join(id)
    }

    fn staging_dir(&self, id: &str) -> PathBuf {
        self.output_root.join(format!(".{id}.partial"))
    }
}

/// What happened to one deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckOutcome {
    /// The output directory already existed; nothing was written.
    Skipped { dir: PathBuf },
    Built {
        dir: PathBuf,
        cards: usize,
        sheets: usize,
    },
}

/// Check idempotency, resolve the source, then build.
///
/// The existence check comes first so skipped remote decks are never fetched.
pub fn build_deck(
    input: &DeckInput,
    resolver: &DeckResolver<'_>,
    ctx: &BuildContext,
) -> Result<DeckOutcome> {
    let id = input.id();
    check_deck_id(&id)?;
    let dir = ctx.deck_dir(&id);
    if dir.exists() {
        info!(deck = %id, dir = %dir.display(), "output already exists; skipping");
        return Ok(DeckOutcome::Skipped { dir });
    }
    let job = resolver
        .resolve(input)
        .with_context(|| format!("failed to load deck '{id}'"))?;
    build_job(&job, ctx)
}

/// Render every card of `job`, pack sheets if enabled, then publish the directory.
pub fn build_job(job: &DeckJob, ctx: &BuildContext) -> Result<DeckOutcome> {
    check_deck_id(&job.id)?;
    let dir = ctx.deck_dir(&job.id);
    if dir.exists() {
        info!(deck = %job.id, dir = %dir.display(), "output already exists; skipping");
        return Ok(DeckOutcome::Skipped { dir });
    }

    let staging = ctx.staging_dir(&job.id);
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("failed to clear stale {}", staging.display()))?;
    }
    fs::create_dir_all(&staging)
        .with_context(|| format!("failed to create {}", staging.display()))?;

    match render_into(job, ctx, &staging) {
        Ok((cards, sheets)) => {
            fs::rename(&staging, &dir).with_context(|| {
                format!("failed to publish {} as {}", staging.display(), dir.display())
            })?;
            info!(deck = %job.id, cards, sheets, dir = %dir.display(), "deck built");
            Ok(DeckOutcome::Built { dir, cards, sheets })
        }
        Err(err) => {
            let _ = fs::remove_dir_all(&staging);
            Err(err.context(format!("failed to build deck '{}'", job.id)))
        }
    }
}

/// Ids name a directory directly under the output root: one plain path
/// component that does not start with `.` (reserved for staging).
fn check_deck_id(id: &str) -> Result<(), SourceError> {
    let mut components = Path::new(id).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || id.starts_with('.') || id.contains(['/', '\\']) {
        return Err(SourceError::InvalidId(id.to_string()));
    }
    Ok(())
}

fn render_into(job: &DeckJob, ctx: &BuildContext, staging: &Path) -> Result<(usize, usize)> {
    let icon = job.icon.as_deref().map(load_image).transpose()?;

    let rendered = ctx.pool.install(|| {
        job.records
            .par_iter()
            .enumerate()
            .map(|(index, record)| {
                let path = staging.join(CardFileName::new(record.kind, index).to_string());
                ctx.composer
                    .compose_to(record, &job.metadata, icon.as_ref(), &path)
            })
            .collect::<Result<Vec<_>, RenderError>>()
    })?;

    let sheets = if job.metadata.enable_sheet {
        let blank = ctx.sheets.blank()?;
        let spec = ctx.sheets.spec(ctx.composer.card_size());
        pack_directory(staging, spec, &blank)?.total()
    } else {
        0
    };
    Ok((rendered.len(), sheets))
}

/// Outcome of a batch; one failed deck never stops the others.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<(String, DeckOutcome)>,
    pub failed: Vec<(String, anyhow::Error)>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn built(&self) -> usize {
        self.completed
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DeckOutcome::Built { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.completed.len() - self.built()
    }
}

pub fn run_batch(
    inputs: &[DeckInput],
    resolver: &DeckResolver<'_>,
    ctx: &BuildContext,
) -> Result<BatchReport> {
    fs::create_dir_all(&ctx.output_root)
        .with_context(|| format!("failed to create {}", ctx.output_root.display()))?;
    let mut report = BatchReport::default();
    for input in inputs {
        let id = input.id();
        match build_deck(input, resolver, ctx) {
            Ok(outcome) => report.completed.push((id, outcome)),
            Err(err) => {
                error!(deck = %id, error = %format!("{err:#}"), "deck failed");
                report.failed.push((id, err));
            }
        }
    }
    Ok(report)
}

/// CSV decks in `dir`, sorted by file name.
pub fn discover_inputs(dir: &Path) -> Result<Vec<DeckInput>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            inputs.push(DeckInput::Csv(path));
        }
    }
    inputs.sort_by(|a, b| a.id().cmp(&b.id()));
    Ok(inputs)
}
