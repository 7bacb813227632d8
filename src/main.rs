use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xerpi::api::{ApiImage, ImageId, ImageRecord, ImageSearchResponse};
use xerpi::fs_utils::FixtureIndex;
use xerpi::gallery::{item::PresentationItem, selection::BackOutcome, Gallery};
use xerpi::service::{BackPayload, FixtureService, Navigator};
use xerpi::settings::{
    GalleryConfig, Settings, DEFAULT_BASE_URI, DEFAULT_PAGE_SIZE, DEFAULT_REMAINING_ITEMS_THRESHOLD,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Browse recorded image-board search results through the gallery feed"
)]
struct Args {
    /// Directory that contains page-<N>.json and detail-<ID>.json files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Number of images requested per page
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Request the next page when this many unseen images remain
    #[arg(short, long, default_value_t = DEFAULT_REMAINING_ITEMS_THRESHOLD)]
    threshold: usize,

    /// How many images to step through
    #[arg(short = 'n', long, default_value_t = 20)]
    steps: usize,

    /// Open the gallery on this image id
    #[arg(short, long)]
    jump: Option<u64>,

    /// Upper bound of the random delay added to every response, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    latency_ms: u64,

    /// Recurse into subdirectories to find fixtures (disabled by default)
    #[arg(short, long, default_value_t = false)]
    recursive: bool,

    /// JSON settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print one line per image regardless of the settings file
    #[arg(short, long, default_value_t = false)]
    compact: bool,

    /// Site root used for browser links
    #[arg(long, default_value = DEFAULT_BASE_URI)]
    base_uri: String,
}

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn back(&self, payload: Option<BackPayload>) {
        match payload {
            Some(BackPayload::Image(record)) => println!("<- back with image {}", record.id()),
            Some(BackPayload::Tag(tag)) => println!("<- back with tag {}", tag.name),
            None => println!("<- back"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if args.compact {
        settings.compact_mode = true;
    }

    let service = FixtureService::open(&args.directory, args.recursive)?
        .with_latency(Duration::from_millis(args.latency_ms));
    if service.index().pages.is_empty() {
        return Err(anyhow!(
            "No page fixtures found in {}. Expected files named page-<N>.json",
            args.directory.display()
        ));
    }
    let target = args
        .jump
        .map(|id| find_record(service.index(), ImageId(id)))
        .transpose()?;

    let config = GalleryConfig {
        page_size: args.page_size,
        remaining_items_threshold: args.threshold,
        base_uri: args.base_uri.clone(),
    };
    let mut gallery = Gallery::new(Arc::new(service), Arc::new(PrintNavigator), config, settings);

    gallery.request_page(1, args.page_size)?;
    gallery.navigated_to(target);
    gallery.settle().await;

    for _ in 0..args.steps {
        if let Some(item) = gallery.current_item() {
            print_item(&gallery, item);
        }
        if !gallery.next() {
            // The next page may only have been requested by reaching the end.
            gallery.settle().await;
            if !gallery.next() {
                break;
            }
        }
        gallery.settle().await;
    }

    if let Some(url) = gallery.browser_url() {
        println!("Open in browser: {url}");
    }
    if let Some(err) = gallery.last_page_error() {
        eprintln!("Last page fetch failed: {err}");
    }
    println!(
        "{} images in feed ({} fetched, {} reported by search)",
        gallery.len(),
        gallery.source().len(),
        gallery
            .total_images()
            .map_or_else(|| "?".to_string(), |t| t.to_string())
    );

    while gallery.back() == BackOutcome::Handled {}
    Ok(())
}

fn print_item(gallery: &Gallery, item: &PresentationItem) {
    let image = item.record().image();
    let settings = gallery.settings();
    let score = if settings.show_score_icons {
        format!("▲{} ▼{} ★{}", image.upvotes, image.downvotes, image.faves)
    } else {
        format!("score {}", image.score)
    };
    let position = format!(
        "[{}/{}]",
        gallery.current_number().unwrap_or(0),
        gallery.len()
    );

    if settings.compact_mode {
        println!("{position} #{} {score}", item.id());
        return;
    }

    println!("{position} #{} {}x{} {} {score}", item.id(), image.width, image.height, image.mime_type);
    if item.is_initialized() {
        let tags: Vec<String> = item.tags().iter().map(|t| t.tag_string()).collect();
        println!("    tags: {}", tags.join(", "));
        if let Some(detail) = item.detail() {
            println!("    comments: {}", detail.comments.total);
        }
    } else {
        println!("    tags: (not loaded)");
    }
}

/// Looks the image up in the recorded pages so the jump carries the full
/// record. Falls back to a bare record for ids no page contains.
fn find_record(index: &FixtureIndex, id: ImageId) -> Result<ImageRecord> {
    for (page, path) in &index.pages {
        let raw = fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
        let response: ImageSearchResponse = serde_json::from_slice(&raw)
            .with_context(|| format!("Unable to parse {}", path.display()))?;
        if let Some(position) = response.images.iter().position(|image| image.id == id) {
            let image = response.images[position].clone();
            return Ok(ImageRecord::new(image, *page, position as u32));
        }
    }
    Ok(ImageRecord::new(
        ApiImage {
            id,
            ..Default::default()
        },
        0,
        0,
    ))
}
