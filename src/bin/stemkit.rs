use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stemkit", version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create `_mobile` variants of every .m4a stem in a folder (requires `afconvert`).
    Mobile(MobileArgs),
    /// Extract the dominant color of each track's artwork.
    Colors(ColorsArgs),
    /// Generate stem color palettes and write them as JSON.
    Palettes(PalettesArgs),
}

#[derive(Parser, Debug)]
struct MobileArgs {
    /// Folder containing the .m4a stems.
    folder: PathBuf,

    /// Explicit stems.json; otherwise the folder, the working directory and the install dir are searched.
    config: Option<PathBuf>,

    /// Encoder program to invoke.
    #[arg(long, default_value = stemkit::transcode::DEFAULT_ENCODER)]
    encoder: String,
}

#[derive(Parser, Debug)]
struct ColorsArgs {
    /// Release directory holding one folder per track.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Track catalog JSON (defaults to the built-in release catalog).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Number of most frequent colors considered.
    #[arg(long, default_value_t = stemkit::artwork::DEFAULT_TOP_N)]
    top_n: usize,

    /// Artwork is resized to this many pixels per side before counting.
    #[arg(long, default_value_t = stemkit::artwork::DEFAULT_SAMPLE_SIZE)]
    sample_size: u32,
}

#[derive(Parser, Debug)]
struct PalettesArgs {
    /// Track catalog JSON (defaults to the built-in release catalog).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output JSON path.
    #[arg(long, default_value = "stem_palettes.json")]
    out: PathBuf,

    /// Palette scheme.
    #[arg(long, value_enum, default_value_t = SchemeChoice::Rich)]
    scheme: SchemeChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeChoice {
    Analogous,
    Complementary,
    Triadic,
    Tetradic,
    SplitComplementary,
    Monochromatic,
    Rich,
}

impl From<SchemeChoice> for stemkit::PaletteScheme {
    fn from(choice: SchemeChoice) -> Self {
        match choice {
            SchemeChoice::Analogous => Self::Analogous,
            SchemeChoice::Complementary => Self::Complementary,
            SchemeChoice::Triadic => Self::Triadic,
            SchemeChoice::Tetradic => Self::Tetradic,
            SchemeChoice::SplitComplementary => Self::SplitComplementary,
            SchemeChoice::Monochromatic => Self::Monochromatic,
            SchemeChoice::Rich => Self::Rich,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; --help/--version exit 0.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    let result = match cli.cmd {
        Command::Mobile(args) => cmd_mobile(args),
        Command::Colors(args) => cmd_colors(args),
        Command::Palettes(args) => cmd_palettes(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<stemkit::TrackCatalog> {
    match path {
        Some(p) => stemkit::TrackCatalog::from_path(p)
            .with_context(|| format!("load track catalog '{}'", p.display())),
        None => Ok(stemkit::TrackCatalog::builtin()),
    }
}

fn cmd_mobile(args: MobileArgs) -> anyhow::Result<()> {
    let mut opts = stemkit::TranscodeOptions::new(&args.folder).with_encoder(args.encoder);
    if let Some(config) = args.config {
        opts = opts.with_config_path(config);
    }

    let summary = stemkit::run_transcode(&opts, stemkit::transcode::SystemRunner)?;
    if summary.found == 0 {
        println!("No M4A files found in {}", args.folder.display());
        return Ok(());
    }

    println!("{summary}");
    Ok(())
}

fn cmd_colors(args: ColorsArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(args.catalog.as_ref())?;
    let opts = stemkit::DominantColorOpts {
        top_n: args.top_n,
        sample_size: args.sample_size,
        ..stemkit::DominantColorOpts::default()
    };

    let results = stemkit::extract_track_colors(&args.root, &catalog, &opts)?;

    let rule = "=".repeat(60);
    println!("{}", stemkit::artwork::render_summary(&results));
    println!("{rule}\nJavaScript Object:\n{rule}");
    print!("{}", stemkit::artwork::render_js_snippet(&results));
    Ok(())
}

fn cmd_palettes(args: PalettesArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(args.catalog.as_ref())?;
    let set = stemkit::PaletteSet::generate(&catalog, args.scheme.into())?;

    let rule = "=".repeat(80);
    println!("{rule}\nSTEM COLOR PALETTES\n{rule}");
    print!("{}", set.render_listing());

    set.write_json(&args.out)?;
    println!("\n{rule}\nPalettes saved to {}\n{rule}", args.out.display());
    Ok(())
}
