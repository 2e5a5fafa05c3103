use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use jargon::commands::{self, DataPaths};
use jargon::output::ColorMode;
use jargon::query::Selection;
use jargon::utils::AppConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use termcolor::StandardStream;
use tracing::Level;

#[derive(Parser)]
#[command(name = "jargon", version)]
#[command(about = "Show Jargon File entries, at random or by term")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    lookup: LookupArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an entry matching a term, or a random one
    Random(LookupArgs),
    /// Convert the DocBook XML to JSON
    #[command(alias = "xml-to-json")]
    Build(DataArgs),
}

#[derive(Args, Debug, Default)]
struct DataArgs {
    /// DocBook XML source [default: data/jargon.xml]
    #[arg(short = 'x', long)]
    xml: Option<PathBuf>,

    /// JSON glossary file [default: data/jargon.json]
    #[arg(short = 'j', long)]
    json: Option<PathBuf>,

    /// Log pipeline details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl DataArgs {
    /// Flags first, then the config file
    fn resolve(&self, config: &AppConfig) -> DataPaths {
        DataPaths {
            xml: self.xml.clone().unwrap_or_else(|| config.xml_path.clone()),
            json: self.json.clone().unwrap_or_else(|| config.json_path.clone()),
        }
    }
}

#[derive(Args, Debug, Default)]
struct LookupArgs {
    /// Term or id to show (defaults to a random entry)
    query: Vec<String>,

    /// Show every matching entry instead of the best one
    #[arg(short, long)]
    all: bool,

    /// Rebuild the JSON from XML before looking up
    #[arg(short, long)]
    rebuild: bool,

    /// When to use colors [default: from config, else auto]
    #[arg(long, value_enum)]
    color: Option<ColorMode>,

    #[command(flatten)]
    data: DataArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Some(Commands::Random(args)) => args.data.verbose,
        Some(Commands::Build(args)) => args.verbose,
        None => cli.lookup.data.verbose,
    };
    init_tracing(verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jargon: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;

    match cli.command {
        Some(Commands::Build(args)) => {
            let paths = args.resolve(&config);
            println!("Reading XML: {}", paths.xml.display());
            let count = commands::build(&paths)?;
            println!("Parsed {} entries. Wrote JSON: {}", count, paths.json.display());
        }
        Some(Commands::Random(args)) => lookup(args, &config)?,
        None => lookup(cli.lookup, &config)?,
    }

    Ok(())
}

fn lookup(args: LookupArgs, config: &AppConfig) -> Result<()> {
    let paths = args.data.resolve(config);
    let selection = Selection::from_terms(&args.query, args.all);
    let color = args.color.unwrap_or(config.color);

    let mut stdout = StandardStream::stdout(color.choice());
    commands::lookup(&paths, &selection, args.rebuild, &mut stdout)?;
    Ok(())
}
