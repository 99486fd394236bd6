//! CLI entry point for the `qarc` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use quiz_archive::cli::{commands, resolve_config};
use quiz_archive::ArchiveError;

#[derive(Parser)]
#[command(name = "qarc", about = "Pack, inspect and unpack quiz archives")]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Config file (defaults to ./qarc.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries, frames and resources of an archive
    Info {
        /// Path to the archive
        file: PathBuf,
    },
    /// Pack entry directories into an archive
    Pack {
        /// Archive to write
        out: PathBuf,
        /// Entry directories (frames.xml, optional meta.json, resources/)
        #[arg(required = true)]
        entries: Vec<PathBuf>,
        /// Gzip-wrap the archive
        #[arg(long)]
        gzip: bool,
    },
    /// Unpack every entry of an archive into a directory
    Extract {
        /// Path to the archive
        file: PathBuf,
        /// Destination directory
        dest: PathBuf,
        /// Write into entry directories that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Compact a JSON edit log
    Optimize {
        /// JSON array of edit operations
        edits: PathBuf,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(3);
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Info { file } => commands::cmd_info(&file, json),
        Commands::Pack { out, entries, gzip } => {
            commands::cmd_pack(&out, &entries, gzip || config.gzip, json)
        }
        Commands::Extract {
            file,
            dest,
            overwrite,
        } => commands::cmd_extract(&file, &dest, overwrite || config.overwrite),
        Commands::Optimize { edits, pretty } => commands::cmd_optimize(&edits, pretty),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            ArchiveError::Io(_) => 1,
            ArchiveError::InvalidArchiveSchema(_)
            | ArchiveError::TruncatedArchive(_)
            | ArchiveError::Corrupt { .. }
            | ArchiveError::InvalidUtf8(_)
            | ArchiveError::InvalidTimestamp { .. } => {
                eprintln!("This file is not a valid archive.");
                2
            }
            ArchiveError::InvalidInput { .. } => 3,
            _ => 5,
        };
        process::exit(code);
    }
}
