use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kbrag::app::App;
use kbrag::config::Config;
use kbrag::ingest::UploadedFile;
use kbrag::mcp::server::McpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kbrag", version, about = "Ingest documents and answer questions over them")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest one or more files (.pdf, .docx, .txt)
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Answer a question from the ingested documents
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List archived source documents
    List,
    /// Serve the MCP tools over stdio
    Serve,
}

fn main() -> Result<()> {
    // stdout carries the MCP transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let app = App::from_config(config)?;

    match cli.command {
        Command::Ingest { files } => {
            let uploads = files
                .iter()
                .map(|p| {
                    UploadedFile::from_path(p)
                        .with_context(|| format!("failed to read {}", p.display()))
                })
                .collect::<Result<Vec<_>>>()?;

            let report = app.ingest(&uploads).context("ingestion failed")?;
            println!(
                "Ingested {} file(s): {} document(s), {} chunk(s)",
                report.files, report.documents, report.chunks
            );
        }
        Command::Ask { question } => {
            let answer = app
                .ask(&question.join(" "))
                .context("failed to generate an answer")?;
            println!("{answer}");
        }
        Command::List => {
            let docs = app.documents().context("failed to list documents")?;
            for d in &docs {
                println!("{:<40} {:>6} {:>12}  {}", d.name, d.file_type, d.size_human, d.filename);
            }
            println!("{} document(s)", docs.len());
        }
        Command::Serve => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(McpServer::new(app).start())?;
            info!("Server stopped");
        }
    }

    Ok(())
}
