use clap::{Parser, Subcommand};
use pressroom::{combine, config, optimize, output, pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that render the page.
#[derive(clap::Args, Clone)]
struct TemplateArgs {
    /// HTML page to render into (must contain content-left and content-right);
    /// defaults to the built-in page shell
    #[arg(long)]
    template: Option<PathBuf>,
}

fn version_string() -> &'static str {
    let on_tag = env!("PRESSROOM_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("PRESSROOM_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "pressroom")]
#[command(about = "Spreadsheet-driven press section generator")]
#[command(long_about = "\
Spreadsheet-driven press section generator

One spreadsheet row per press item. Rows are sorted by position and rendered
as tiles in two columns; on phones the columns merge into one.

Sheet columns:

  Position     number; rows without one are skipped
  Typ          bild | zitat | video
  Spalte       links | rechts
  Medium       publication name (quote attribution)
  Titel DE/EN  caption
  Datum        free text
  Bild-URL     main image; Bild-URL 2 … 10 for galleries and spreads
  Link         article or video link
  Zitat DE/EN  quote text

Project structure:

  ./
  ├── config.toml           # Sheet id, cache, spread exceptions
  └── images/
      ├── src/              # Self-hosted sources (optimize input)
      ├── crops.json        # Optional cover crops
      ├── full/             # optimize output
      └── cover/            # optimize output

Run 'pressroom gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project directory (config.toml, images/)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (rows.json, row cache, downloads)
    #[arg(long, default_value = ".pressroom-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the spreadsheet (or the cache) into rows.json
    Fetch,
    /// Render rows.json into the page
    Generate(TemplateArgs),
    /// Run the full pipeline: fetch → generate
    Build(TemplateArgs),
    /// Drop the cached rows, then build
    Reload(TemplateArgs),
    /// Fetch and lay out without writing the page
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Join two page images into one spread in images/src
    CombineSpread {
        /// Left page: URL or local file
        left: String,
        /// Right page: URL or local file
        right: String,
        /// Output name, without extension
        name: String,
    },
    /// Create full images and covers for everything in images/src
    Optimize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.source)?;
    let pipeline_for = |template: Option<PathBuf>| pipeline::Pipeline {
        source_dir: cli.source.clone(),
        output_dir: cli.output.clone(),
        temp_dir: cli.temp_dir.clone(),
        template,
        config: site_config.clone(),
    };

    match cli.command {
        Command::Fetch => {
            let rows = pipeline_for(None).fetch()?;
            output::print_fetch_output(&rows);
        }
        Command::Generate(args) => {
            let outcome = pipeline_for(args.template).generate()?;
            output::print_generate_output(&outcome);
        }
        Command::Build(args) => {
            println!("==> Fetching rows");
            let outcome = pipeline_for(args.template).build()?;
            output::print_build_output(&outcome);
        }
        Command::Reload(args) => {
            println!("==> Reloading rows");
            let outcome = pipeline_for(args.template).reload()?;
            output::print_build_output(&outcome);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let columns = pipeline_for(None).check()?;
            output::print_layout_output(&columns, &site_config.gallery.rules());
            println!("==> Sheet is valid");
        }
        Command::CombineSpread { left, right, name } => {
            let summary = combine::combine(&left, &right, &name, &cli.source, &cli.temp_dir)?;
            output::print_combine_output(&summary);
        }
        Command::Optimize => {
            init_thread_pool(&site_config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_optimize_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = optimize::optimize(&cli.source, &site_config.images, Some(tx));
            printer.join().ok();
            output::print_optimize_summary(&result?, &cli.source.join(optimize::MANIFEST_FILE));
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
