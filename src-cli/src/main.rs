//! `insightrfq`: ask questions about RFP and tender documents.
//!
//! - `insightrfq index <FILES...>` adds documents to the local corpus index
//! - `insightrfq documents` lists the focus choices
//! - `insightrfq ask "<QUESTION>" [--focus NAME] [--upload FILE] [--json]`
//! - `insightrfq health` checks the configured model provider

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use insightrfq_lib::{render_answer, App, AskRequest};
use rfq_core::config::Settings;
use rfq_core::error::AppError;

#[derive(Parser)]
#[command(name = "insightrfq")]
#[command(about = "Question answering over RFP and tender documents")]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON instead of Markdown
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add documents (PDF, DOCX, text) to the local corpus index
    Index {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the documents a question can be focused on
    Documents,

    /// Ask a question
    Ask {
        question: String,

        /// Document to focus on; defaults to the uploaded file, else all documents
        #[arg(short, long, env = "RFQ_FOCUS")]
        focus: Option<String>,

        /// Index this file for the question only, without adding it to the corpus
        #[arg(short, long)]
        upload: Option<PathBuf>,
    },

    /// Check that the model provider is reachable
    Health,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };
    rfq_core::logging::init(&settings.log_filter);

    match run(cli, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, settings: Settings) -> Result<(), AppError> {
    let app = App::from_settings(settings)?;
    match cli.command {
        Commands::Index { files } => {
            let indexed = app.index_files(&files)?;
            if cli.json {
                print_json(&indexed)?;
            } else {
                for f in &indexed {
                    println!(
                        "{}: {} chunks ({} embedded, {} reused, {} removed)",
                        f.document_name, f.chunks, f.embedded, f.reused, f.removed
                    );
                }
            }
        }
        Commands::Documents => {
            let options = app.documents()?;
            if cli.json {
                print_json(&options)?;
            } else {
                for o in &options {
                    println!("{o}");
                }
            }
        }
        Commands::Ask {
            question,
            focus,
            upload,
        } => {
            let resp = app.ask(&AskRequest {
                question,
                focus,
                upload,
            })?;
            if cli.json {
                print_json(&resp)?;
            } else {
                print!("{}", render_answer(&resp));
            }
        }
        Commands::Health => {
            let status = app.health()?;
            if cli.json {
                print_json(&status)?;
            } else {
                println!("{}", status.message);
            }
            if !status.ok {
                return Err(AppError::new("AI_PROVIDER_UNAVAILABLE", status.message));
            }
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new("OUTPUT_ENCODE_FAILED", "Failed to encode JSON output")
            .with_details(e.to_string())
    })?;
    println!("{s}");
    Ok(())
}

fn report(e: &AppError) {
    eprintln!("error: {e}");
    if let Some(d) = e.details.as_deref() {
        eprintln!("  {d}");
    }
    if e.retryable {
        eprintln!("  (retryable)");
    }
}
