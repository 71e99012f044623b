//! statement-cli - a developer-facing demonstrator for the statement
//! parsing engine.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{parse, validate};

#[derive(Parser)]
#[command(name = "statement", version, about = "Declarative bank statement parsing engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement file against a bank profile and print the rows
    Parse {
        /// Path to the YAML bank profile file
        #[arg(long)]
        profile: PathBuf,
        /// Statement file to parse
        input: PathBuf,
        /// Parser key (case-insensitive) naming the bank profile to use
        #[arg(long)]
        parser_key: String,
        /// MIME hint to aid format detection when the filename is ambiguous
        #[arg(long)]
        content_type: Option<String>,
        /// Opaque account-number override, forwarded unchanged
        #[arg(long)]
        account_no: Option<String>,
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Load and compile a bank profile file, reporting any errors
    Validate {
        /// Path to the YAML bank profile file
        profile: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            profile,
            input,
            parser_key,
            content_type,
            account_no,
            json,
        } => parse::run(
            profile,
            input,
            &parser_key,
            content_type.as_deref(),
            account_no.as_deref(),
            json,
        ),
        Commands::Validate { profile } => validate::run(profile),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("error: {e}"));
            ExitCode::FAILURE
        }
    }
}
