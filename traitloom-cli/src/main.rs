use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "traitloom", version)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the number of unique combinations a manifest can produce.
    Combos(CombosArgs),
    /// Sample a batch and write one item as a PNG.
    Preview(PreviewArgs),
    /// Write the collection overview (first variant of each layer) as a PNG.
    Overview(OverviewArgs),
    /// Sample a batch and write the full zip archive.
    Generate(GenerateArgs),
}

#[derive(Parser, Debug)]
struct CombosArgs {
    /// Input collection manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input collection manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the manifest batch size.
    #[arg(long)]
    count: Option<usize>,

    /// Override the manifest seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the item name prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// Override the output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Override the output height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    sample: SampleArgs,

    /// Item number to export (1-based).
    #[arg(long, default_value_t = 1)]
    item: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct OverviewArgs {
    /// Input collection manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Show only this layer (0-based) instead of all layers.
    #[arg(long)]
    layer: Option<usize>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    sample: SampleArgs,

    /// Directory the archive is written into.
    #[arg(long)]
    out_dir: PathBuf,

    /// Authorize the archive download.
    #[arg(long, default_value_t = false)]
    unlocked: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.cmd {
        Command::Combos(args) => cmd_combos(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Overview(args) => cmd_overview(args),
        Command::Generate(args) => cmd_generate(args),
    }
}

fn open_studio(args: &SampleArgs) -> anyhow::Result<traitloom::Studio> {
    let mut studio = traitloom::Studio::open(&args.in_path)
        .with_context(|| format!("load manifest '{}'", args.in_path.display()))?;
    if let Some(count) = args.count {
        studio.set_batch_size(count);
    }
    if args.seed.is_some() {
        studio.set_seed(args.seed);
    }
    if let Some(prefix) = &args.prefix {
        studio.set_item_prefix(prefix);
    }
    if args.width.is_some() || args.height.is_some() {
        let canvas = studio.meta().canvas;
        studio.set_canvas(
            args.width.unwrap_or(canvas.width),
            args.height.unwrap_or(canvas.height),
        )?;
    }
    Ok(studio)
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_combos(args: CombosArgs) -> anyhow::Result<()> {
    let studio = traitloom::Studio::open(&args.in_path)?;
    let meta = studio.meta();
    println!("{}", studio.total_combinations());
    eprintln!(
        "'{}': {} layers, batch size {}",
        meta.name,
        studio.collection().layers().len(),
        meta.batch_size
    );
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut studio = open_studio(&args.sample)?;
    studio.generate_previews(&traitloom::CancelToken::new())?;

    let id = traitloom::ItemId(args.item.saturating_sub(1));
    let (file_name, bytes) = studio.export_item_png(id)?;
    tracing::debug!(file = %file_name, "item exported");
    write_output(&args.out, &bytes)
}

fn cmd_overview(args: OverviewArgs) -> anyhow::Result<()> {
    let mut studio = traitloom::Studio::open(&args.in_path)?;
    let raster = match args.layer {
        Some(layer) => {
            studio.select_layer(layer)?;
            studio.render_overview(false)
        }
        None => studio.render_overview(true),
    };
    write_output(&args.out, &traitloom::encode_png(&raster)?)
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut studio = open_studio(&args.sample)?;
    let cancel = traitloom::CancelToken::new();
    let batch = studio.generate_previews(&cancel)?;
    tracing::info!(
        items = batch.len(),
        fallback = batch.stats.fallback_items,
        "previews generated"
    );

    let mut gate = if args.unlocked {
        traitloom::StaticGate::unlocked()
    } else {
        traitloom::StaticGate::locked()
    };
    let mut saver = traitloom::DirSaver::new(&args.out_dir);
    let mut stderr = std::io::stderr();
    let output = studio
        .download_archive(
            &mut gate,
            &mut saver,
            |p| {
                let _ = write!(stderr, "\r{:?} {:>3}%", p.phase, p.rounded());
            },
            &cancel,
        )
        .map_err(|err| match err {
            traitloom::TraitloomError::Locked => {
                anyhow::anyhow!("{err}; pass --unlocked to authorize the download")
            }
            other => other.into(),
        })?;
    eprintln!();
    eprintln!(
        "wrote {} ({} images, {} skipped)",
        saver.dir().join(&output.file_name).display(),
        output.stats.images_written,
        output.stats.images_skipped
    );
    Ok(())
}
