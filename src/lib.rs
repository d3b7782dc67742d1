//! Thingkit: editor core for a game client's thing catalogue and sprite atlas.
//!
//! The client describes every object it can draw (items, outfits, effects
//! and distance effects) in a catalogue container, and stores their 32×32
//! sprites in a separate run-length encoded atlas. Thingkit reads both,
//! edits them through a [`Session`](session::Session), and writes them back
//! byte-identically wherever nothing changed.
//!
//! # Modules
//!
//! - [`model`]: Things, frame groups, flags and ID ranges
//! - [`codec`]: Container, sprite and interchange binary formats
//! - [`session`]: Editing, ID-space management and atlas compaction
//! - [`validation`]: Catalogue validation and error reporting
//! - [`inspect`]: Catalogue statistics
//! - [`error`]: Error types for thingkit operations

pub mod codec;
pub mod error;
pub mod inspect;
pub mod model;
pub mod session;
pub mod validation;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use codec::{LoadOptions, DEFAULT_CLIENT_VERSION};
pub use error::ThingkitError;
use model::{ClientVersion, ThingCategory, ThingId};
use session::Session;

/// The thingkit CLI application.
#[derive(Parser)]
#[command(name = "thingkit")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Client version of containers without a self-describing header.
    #[arg(
        long,
        global = true,
        env = "THINGKIT_CLIENT_VERSION",
        default_value_t = DEFAULT_CLIENT_VERSION
    )]
    client_version: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show category ranges and sprite usage.
    Inspect(InspectArgs),
    /// Validate a catalogue against its sprites.
    Validate(ValidateArgs),
    /// Remove unused sprites and renumber the rest.
    Compact(CompactArgs),
    /// Write one thing and its sprites to an interchange file.
    Export(ExportArgs),
    /// Add the thing in an interchange file to a catalogue.
    Import(ImportArgs),
}

/// The catalogue and sprite container to open.
#[derive(clap::Args)]
struct InputArgs {
    /// Catalogue container.
    catalogue: PathBuf,

    /// Sprite container.
    sprites: PathBuf,
}

/// Where to write edited containers.
#[derive(clap::Args)]
struct OutputArgs {
    /// Output path for the catalogue.
    #[arg(long)]
    catalogue_out: PathBuf,

    /// Output path for the sprite container.
    #[arg(long)]
    sprites_out: PathBuf,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the compact subcommand.
#[derive(clap::Args)]
struct CompactArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    out: OutputArgs,
}

/// Thing category as given on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Item,
    Outfit,
    Effect,
    Distance,
}

impl From<CategoryArg> for ThingCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Item => ThingCategory::Item,
            CategoryArg::Outfit => ThingCategory::Outfit,
            CategoryArg::Effect => ThingCategory::Effect,
            CategoryArg::Distance => ThingCategory::Distance,
        }
    }
}

/// Arguments for the export subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Thing ID. With --category, the ID within that category.
    id: u32,

    /// Interpret the ID as a per-category display ID.
    #[arg(long, value_enum)]
    category: Option<CategoryArg>,

    /// Client version to record in the file (defaults to the catalogue's).
    #[arg(long)]
    target_version: Option<u16>,

    /// Interchange file to write.
    #[arg(short, long)]
    out: PathBuf,
}

/// Arguments for the import subcommand.
#[derive(clap::Args)]
struct ImportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Interchange file to import.
    thing: PathBuf,

    #[command(flatten)]
    out: OutputArgs,
}

/// Run the thingkit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ThingkitError> {
    let cli = Cli::parse();
    let options = LoadOptions::new(cli.client_version);

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args, &options),
        Some(Commands::Validate(args)) => run_validate(args, &options),
        Some(Commands::Compact(args)) => run_compact(args, &options),
        Some(Commands::Export(args)) => run_export(args, &options),
        Some(Commands::Import(args)) => run_import(args, &options),
        None => {
            println!("thingkit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Editor core for thing catalogues and sprite atlases.");
            println!();
            println!("Run 'thingkit --help' for usage information.");
            Ok(())
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ThingkitError> {
    fs::read(path).map_err(|source| ThingkitError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn open_session(input: &InputArgs, options: &LoadOptions) -> Result<Session, ThingkitError> {
    let catalogue = read_file(&input.catalogue)?;
    let sprites = read_file(&input.sprites)?;
    Session::load(&catalogue, &sprites, options)
}

fn save_session(session: &Session, out: &OutputArgs) -> Result<(), ThingkitError> {
    let saved = session.save()?;
    fs::write(&out.catalogue_out, saved.catalogue)?;
    fs::write(&out.sprites_out, saved.sprites)?;
    Ok(())
}

fn check_output_format(output: &str) -> Result<(), ThingkitError> {
    match output {
        "text" | "json" => Ok(()),
        other => Err(ThingkitError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), ThingkitError> {
    let json = serde_json::to_string_pretty(value).map_err(ThingkitError::JsonWrite)?;
    println!("{json}");
    Ok(())
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs, options: &LoadOptions) -> Result<(), ThingkitError> {
    check_output_format(&args.output)?;
    let session = open_session(&args.input, options)?;
    let report = inspect::inspect(
        session.objects(),
        session.sprites(),
        &inspect::InspectOptions::default(),
    );

    if args.output == "json" {
        print_json(&report)
    } else {
        print!("{}", report);
        Ok(())
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs, options: &LoadOptions) -> Result<(), ThingkitError> {
    check_output_format(&args.output)?;
    let session = open_session(&args.input, options)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_catalog(session.objects(), session.sprites(), &opts);

    if args.output == "json" {
        print_json(&serde_json::json!({
            "error_count": report.error_count(),
            "warning_count": report.warning_count(),
            "issues": report.issues,
        }))?;
    } else {
        print!("{}", report);
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(ThingkitError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the compact subcommand.
fn run_compact(args: CompactArgs, options: &LoadOptions) -> Result<(), ThingkitError> {
    let mut session = open_session(&args.input, options)?;
    let report = session.compact_atlas();
    save_session(&session, &args.out)?;
    println!("{}", report);
    Ok(())
}

/// Execute the export subcommand.
fn run_export(args: ExportArgs, options: &LoadOptions) -> Result<(), ThingkitError> {
    let session = open_session(&args.input, options)?;
    let id = match args.category {
        Some(category) => {
            let category = ThingCategory::from(category);
            session
                .objects()
                .counts
                .internal_id(category, args.id)
                .ok_or(ThingkitError::UnknownThing(ThingId(args.id)))?
        }
        None => ThingId(args.id),
    };
    let version = match args.target_version {
        Some(raw) => ClientVersion::new(raw)?,
        None => session.version(),
    };

    let bytes = session.export_thing(id, version)?;
    fs::write(&args.out, bytes)?;
    println!("Exported thing {} to {}", id, args.out.display());
    Ok(())
}

/// Execute the import subcommand.
fn run_import(args: ImportArgs, options: &LoadOptions) -> Result<(), ThingkitError> {
    let mut session = open_session(&args.input, options)?;
    let bytes = read_file(&args.thing)?;
    let id = session.import_thing(&bytes)?;
    save_session(&session, &args.out)?;

    let thing = session.thing(id).ok_or(ThingkitError::UnknownThing(id))?;
    println!(
        "Imported {} {} (display ID {})",
        thing.category,
        id,
        session.display_id(id).unwrap_or(id.0)
    );
    Ok(())
}
