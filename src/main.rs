//! bhl-ead - EAD finding-aid exporter

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bhl_ead::restrictions::parse_categories;
use bhl_ead::{
    EadExporter, Error, ExportFormat, ExportOptions, ExportProfile, LabelTable, ResourceStore,
    ResourceTree, export_metadata,
};

#[derive(Parser)]
#[command(name = "bhl-ead")]
#[command(version, about = "Export archival resources as EAD finding aids", long_about = None)]
#[command(after_help = "EXAMPLES:
    bhl-ead export resource.json -o smith_ead.xml    Export one resource
    bhl-ead export store.json --id 42                Export resource 42 to stdout
    bhl-ead metadata resource.json --format pdf      Show download filename")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log filter when RUST_LOG is unset (e.g. warn, bhl_ead=debug)
    #[arg(long, global = true, env = "BHL_EAD_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Write the EAD document for a resource
    Export(ExportArgs),

    /// Print the suggested filename and MIME type
    Metadata {
        /// Resource snapshot (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Resource id when the input holds several resources
        #[arg(long)]
        id: Option<u64>,

        /// Output format: xml or pdf
        #[arg(long, default_value = "xml")]
        format: ExportFormat,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Resource snapshot (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Resource id when the input holds several resources
    #[arg(long)]
    id: Option<u64>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Include unpublished records and notes
    #[arg(long, env = "BHL_EAD_INCLUDE_UNPUBLISHED")]
    include_unpublished: bool,

    /// Write <dao> elements for digital objects
    #[arg(long, env = "BHL_EAD_INCLUDE_DAOS")]
    include_daos: bool,

    /// Use numbered component tags (<c01>, <c02>, ...)
    #[arg(long, env = "BHL_EAD_NUMBERED_CS")]
    numbered_cs: bool,

    /// University restriction categories in the collection (PR,SR,CR,ER)
    #[arg(long, value_delimiter = ',', env = "BHL_EAD_RESTRICTION_TYPES")]
    restriction_types: Vec<String>,

    /// Formatting profile: bhl or standard
    #[arg(long, default_value = "bhl", env = "BHL_EAD_PROFILE")]
    profile: ExportProfile,

    /// Extra enumeration labels (flat JSON object)
    #[arg(long, env = "BHL_EAD_LABELS")]
    labels: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cli.log_level))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Command::Export(args) => export(args),
        Command::Metadata { input, id, format } => show_metadata(&input, id, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn export(args: ExportArgs) -> Result<(), Error> {
    let store = ResourceStore::from_path(&args.input)?;
    let tree = select(&store, args.id)?;

    let options = ExportOptions::default()
        .with_unpublished(args.include_unpublished)
        .with_daos(args.include_daos)
        .with_numbered_c_tags(args.numbered_cs)
        .with_restriction_types(parse_categories(
            args.restriction_types.iter().map(String::as_str),
        ));

    let mut labels = LabelTable::english();
    if let Some(path) = &args.labels {
        labels = labels.merged(LabelTable::from_path(path)?);
    }

    let exporter = EadExporter::with_profile(args.profile)
        .with_options(options)
        .with_labels(labels);

    let summary = match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            exporter.export_to_writer(tree, &mut out)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let summary = exporter.export_to_writer(tree, &mut out)?;
            writeln!(out)?;
            summary
        }
    };

    tracing::info!(
        rendered = summary.rendered,
        hidden = summary.hidden,
        "export complete"
    );
    if summary.has_errors() {
        tracing::warn!(
            count = summary.degraded(),
            "document contains embedded export errors"
        );
    }
    Ok(())
}

fn show_metadata(input: &Path, id: Option<u64>, format: ExportFormat) -> Result<(), Error> {
    let store = ResourceStore::from_path(input)?;
    let tree = select(&store, id)?;
    let meta = export_metadata(&tree.resource, format);
    println!("Filename: {}", meta.filename);
    println!("MIME type: {}", meta.mimetype);
    println!("Content-Disposition: {}", meta.content_disposition());
    Ok(())
}

/// The requested tree, or the only tree in the store.
fn select(store: &ResourceStore, id: Option<u64>) -> Result<&ResourceTree, Error> {
    if let Some(id) = id {
        return store.get(id);
    }
    let mut ids = store.ids();
    match (ids.next(), ids.next()) {
        (Some(only), None) => store.get(only),
        (None, _) => Err(Error::InvalidRecord("input contains no resources".into())),
        (Some(_), Some(_)) => Err(Error::InvalidRecord(
            "input contains several resources; pass --id".into(),
        )),
    }
}
