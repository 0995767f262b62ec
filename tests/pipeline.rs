use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgba, RgbaImage};
use partycards::{
    AssetSet, BlockFace, BuildContext, CallPart, CardComposer, CardLayout, DeckFetcher, DeckInput,
    DeckOptionEntry, DeckOptions, DeckOutcome, DeckPayload, DeckResolver, ResponseText,
    SHEET_BLANK, SheetSettings, SheetSpec, SourceError, discover_inputs, run_batch,
    scaffold_assets,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CARD_WIDTH: u32 = 240;
const CARD_HEIGHT: u32 = 336;

struct Fixture {
    _root: TempDir,
    input: PathBuf,
    output: PathBuf,
    assets: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("input");
        let output = root.path().join("output");
        let assets = root.path().join("assets");
        fs::create_dir_all(&input).unwrap();
        scaffold_assets(
            &assets,
            CARD_WIDTH,
            CARD_HEIGHT,
            &layout(),
            &SheetSpec::new(2, 2, CARD_WIDTH, CARD_HEIGHT),
        )
        .unwrap();
        Self {
            _root: root,
            input,
            output,
            assets,
        }
    }

    fn write_csv(&self, id: &str, contents: &str) {
        fs::write(self.input.join(format!("{id}.csv")), contents).unwrap();
    }

    fn context(&self, blank: PathBuf) -> BuildContext {
        let assets = AssetSet::load(&self.assets).unwrap();
        let composer = CardComposer::new(Arc::new(assets), Arc::new(BlockFace), layout());
        BuildContext::new(composer, &self.output, SheetSettings::new(2, 2, blank), 2).unwrap()
    }

    fn default_context(&self) -> BuildContext {
        self.context(self.assets.join(SHEET_BLANK))
    }
}

fn layout() -> CardLayout {
    CardLayout {
        text_margin_x: 20,
        text_top: 20,
        text_height: 150,
        text_size: 24,
        icon_origin: (20, 190),
        subtitle_origin: (20, 4),
        subtitle_height: 14,
        subtitle_size: 12,
        badge_margin: 10,
        ..CardLayout::default()
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

const BASE_DECK: &str = "type,text,pick\n\
    black,Why did _______ cross the road?,1\n\
    black,_______ plus _______ equals _______.,2\n\
    black,What is in the box?,\n\
    white,A chicken,\n\
    white,Forty ducks,\n";

#[test]
fn builds_cards_and_sheets_for_a_csv_deck() {
    let fx = Fixture::new();
    fx.write_csv("base", BASE_DECK);
    let mut options = DeckOptions::default();
    options.insert(
        "base",
        DeckOptionEntry {
            name: Some("Base Game".to_string()),
            subtitle: true,
            sheet: true,
        },
    );
    let resolver = DeckResolver {
        options: &options,
        fetcher: None,
        icon_dir: Some(fx.input.clone()),
    };
    let ctx = fx.default_context();

    let inputs = discover_inputs(&fx.input).unwrap();
    let report = run_batch(&inputs, &resolver, &ctx).unwrap();

    assert!(!report.has_failures());
    let dir = fx.output.join("base");
    assert_eq!(
        report.completed,
        vec![(
            "base".to_string(),
            DeckOutcome::Built {
                dir: dir.clone(),
                cards: 5,
                sheets: 2,
            }
        )]
    );
    assert_eq!(
        file_names(&dir),
        vec![
            "primary-card_0.png",
            "primary-card_1.png",
            "primary-card_2.png",
            "primary-sheet_1.png",
            "secondary-card_3.png",
            "secondary-card_4.png",
            "secondary-sheet_1.png",
        ]
    );
    let card = image::open(dir.join("primary-card_0.png")).unwrap();
    assert_eq!((card.width(), card.height()), (CARD_WIDTH, CARD_HEIGHT));
    let sheet = image::open(dir.join("secondary-sheet_1.png")).unwrap();
    assert_eq!((sheet.width(), sheet.height()), (2 * CARD_WIDTH, 2 * CARD_HEIGHT));
    assert_eq!(file_names(&fx.output), vec!["base"]);
}

#[test]
fn existing_output_is_skipped_without_rewriting() {
    let fx = Fixture::new();
    fx.write_csv("base", BASE_DECK);
    let options = DeckOptions::default();
    let resolver = DeckResolver {
        options: &options,
        fetcher: None,
        icon_dir: None,
    };
    let ctx = fx.default_context();
    let inputs = discover_inputs(&fx.input).unwrap();

    run_batch(&inputs, &resolver, &ctx).unwrap();
    let removed = fx.output.join("base").join("primary-card_0.png");
    fs::remove_file(&removed).unwrap();

    let report = run_batch(&inputs, &resolver, &ctx).unwrap();
    assert_eq!(report.built(), 0);
    assert_eq!(report.skipped(), 1);
    assert!(!removed.exists());
}

#[test]
fn decks_without_sheets_never_load_the_blank() {
    let fx = Fixture::new();
    fx.write_csv("base", BASE_DECK);
    let options = DeckOptions::default();
    let resolver = DeckResolver {
        options: &options,
        fetcher: None,
        icon_dir: None,
    };
    let ctx = fx.context(fx.assets.join("missing-blank.png"));

    let report = run_batch(&discover_inputs(&fx.input).unwrap(), &resolver, &ctx).unwrap();
    assert!(!report.has_failures());
    let names = file_names(&fx.output.join("base"));
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|name| name.contains("-card_")));
}

#[test]
fn one_failing_deck_does_not_stop_the_batch() {
    let fx = Fixture::new();
    fx.write_csv("alpha", "type,text\nwhite,Fine\npurple,Nope\n");
    fx.write_csv("beta", BASE_DECK);
    fx.write_csv(
        "gamma",
        &format!("type,text\nwhite,{}\n", "x".repeat(200)),
    );
    let options = DeckOptions::default();
    let resolver = DeckResolver {
        options: &options,
        fetcher: None,
        icon_dir: None,
    };
    let ctx = fx.default_context();

    let report = run_batch(&discover_inputs(&fx.input).unwrap(), &resolver, &ctx).unwrap();

    assert!(report.has_failures());
    assert_eq!(report.built(), 1);
    let failed: Vec<&str> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(failed, vec!["alpha", "gamma"]);
    let overflow = format!("{:#}", report.failed[1].1);
    assert!(overflow.contains("gamma"), "{overflow}");
    // Failed decks leave neither a final nor a staging directory behind.
    assert_eq!(file_names(&fx.output), vec!["beta"]);
}

#[test]
fn icon_override_is_stamped_on_every_card() {
    let fx = Fixture::new();
    fx.write_csv("base", "type,text\nblack,Hello?\nwhite,Hi\n");
    let magenta = Rgba([255, 0, 255, 255]);
    RgbaImage::from_pixel(120, 120, magenta)
        .save(fx.input.join("base-icon.png"))
        .unwrap();
    let options = DeckOptions::default();
    let resolver = DeckResolver {
        options: &options,
        fetcher: None,
        icon_dir: Some(fx.input.clone()),
    };
    let ctx = fx.default_context();

    run_batch(&discover_inputs(&fx.input).unwrap(), &resolver, &ctx).unwrap();

    for name in ["primary-card_0.png", "secondary-card_1.png"] {
        let card = image::open(fx.output.join("base").join(name))
            .unwrap()
            .to_rgba8();
        assert_eq!(*card.get_pixel(80, 250), magenta, "{name}");
    }
}

struct FakeApi {
    calls: AtomicUsize,
}

impl DeckFetcher for FakeApi {
    fn fetch(&self, id: &str) -> Result<DeckPayload, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if id != "ROAD1" {
            return Err(SourceError::Fetch {
                id: id.to_string(),
                reason: "404 Not Found".to_string(),
            });
        }
        Ok(DeckPayload {
            name: Some("Road Trip".to_string()),
            calls: vec![vec![
                CallPart::Text("Are we".to_string()),
                CallPart::Blank(Default::default()),
                CallPart::Text("yet?".to_string()),
            ]],
            responses: vec![ResponseText::Text("A chicken".to_string())],
        })
    }
}

#[test]
fn remote_decks_are_fetched_once_and_named_from_the_payload() {
    let fx = Fixture::new();
    let api = FakeApi {
        calls: AtomicUsize::new(0),
    };
    let mut options = DeckOptions::default();
    options.insert(
        "ROAD1",
        DeckOptionEntry {
            name: None,
            subtitle: true,
            sheet: false,
        },
    );
    let resolver = DeckResolver {
        options: &options,
        fetcher: Some(&api as &dyn DeckFetcher),
        icon_dir: None,
    };
    let ctx = fx.default_context();
    let inputs = vec![
        DeckInput::Remote("ROAD1".to_string()),
        DeckInput::Remote("GONE9".to_string()),
    ];

    let first = run_batch(&inputs, &resolver, &ctx).unwrap();
    assert_eq!(first.built(), 1);
    assert_eq!(first.failed.len(), 1);
    assert_eq!(
        file_names(&fx.output.join("ROAD1")),
        vec!["primary-card_0.png", "secondary-card_1.png"]
    );

    let second = run_batch(&inputs[..1], &resolver, &ctx).unwrap();
    assert_eq!(second.skipped(), 1);
    assert_eq!(api.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn remote_input_without_a_fetcher_fails_cleanly() {
    let fx = Fixture::new();
    let options = DeckOptions::default();
    let resolver = DeckResolver {
        options: &options,
        fetcher: None,
        icon_dir: None,
    };
    let ctx = fx.default_context();
    let report = run_batch(&[DeckInput::Remote("ROAD1".to_string())], &resolver, &ctx).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(file_names(&fx.output).is_empty());
}

struct AnyDeckApi {
    calls: AtomicUsize,
}

impl DeckFetcher for AnyDeckApi {
    fn fetch(&self, id: &str) -> Result<DeckPayload, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DeckPayload {
            name: Some(id.to_string()),
            calls: Vec::new(),
            responses: vec![ResponseText::Text("A chicken".to_string())],
        })
    }
}

#[test]
fn deck_ids_that_are_not_plain_directory_names_are_rejected() {
    let fx = Fixture::new();
    let api = AnyDeckApi {
        calls: AtomicUsize::new(0),
    };
    let options = DeckOptions::default();
    let resolver = DeckResolver {
        options: &options,
        fetcher: Some(&api as &dyn DeckFetcher),
        icon_dir: None,
    };
    let ctx = fx.default_context();
    let ids = [
        "../escaped",
        "",
        ".",
        "..",
        ".ROAD1.partial",
        "a/b",
        "a\\b",
        "ROAD1",
    ];
    let inputs: Vec<DeckInput> = ids
        .into_iter()
        .map(|id| DeckInput::Remote(id.to_string()))
        .collect();

    let report = run_batch(&inputs, &resolver, &ctx).unwrap();

    assert_eq!(report.built(), 1);
    assert_eq!(report.failed.len(), 7);
    for (id, err) in &report.failed {
        let message = format!("{err:#}");
        assert!(message.contains("output directory name"), "{id}: {message}");
    }
    // rejected before any fetch or filesystem write
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    assert_eq!(file_names(&fx.output), vec!["ROAD1"]);
    assert!(!fx.output.parent().unwrap().join("escaped").exists());
}
