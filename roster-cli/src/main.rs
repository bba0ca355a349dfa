use std::{fmt::Display, path::PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use roster_lib::{Repository, repository::config::CoreConfig};
use sysexits::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod countries;
mod list;
mod record;

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Store records in this directory instead of the configured one
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log more (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Add a new record
    Add(record::Fields),
    /// Edit an existing record. The image is dropped unless supplied again
    Edit {
        id: u64,
        #[command(flatten)]
        fields: record::Fields,
    },
    /// Delete a record
    Delete { id: u64 },
    /// List records, one page at a time
    List(list::Args),
    /// Print the country reference list
    Countries,
}

fn main() -> ExitCode {
    // Human friendly panicking in release mode
    human_panic::setup_panic!();

    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut cfg = match CoreConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => return fail(e, ExitCode::Config),
    };

    if let Some(dir) = &cli.data_dir {
        cfg.set_data_dir(dir);
    }

    let default_country = cfg.countries().default().clone();
    let countries_url = cfg.countries().url().clone();

    let repo = match Repository::with_config(cfg) {
        Ok(repo) => repo,
        Err(e) => return fail(e, ExitCode::IoErr),
    };

    match &cli.command {
        Command::Add(fields) => record::add(&repo, &default_country, fields),
        Command::Edit { id, fields } => record::edit(&repo, &default_country, *id, fields),
        Command::Delete { id } => record::delete(&repo, *id),
        Command::List(args) => list::handle(&repo, args),
        Command::Countries => countries::handle(&countries_url),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{} logging was already initialised", "warning:".yellow().bold());
    }
}

/// Report `err` on stderr and hand back the exit code to finish with.
pub(crate) fn fail(err: impl Display, code: ExitCode) -> ExitCode {
    eprintln!("{} {err}", "error:".red().bold());
    code
}
