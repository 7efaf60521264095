use std::path::PathBuf;

mod ai;
mod app;
mod config;
mod db;
mod error;
mod feed;
mod models;
mod render;

use ai::Summarizer;
use app::App;
use config::{Config, LlmSettings};
use error::{AppError, Result};

const USAGE: &str = "usage: digest [--config PATH] <collect|summarize [--dry-run]|rss|email|run>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Collect,
    Summarize { dry_run: bool },
    Rss,
    Email,
    Run,
}

struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config_path = None;
    let mut command = None;
    let mut dry_run = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| AppError::config("--config needs a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "--dry-run" => dry_run = true,
            "collect" => command = Some(Command::Collect),
            "summarize" => command = Some(Command::Summarize { dry_run: false }),
            "rss" => command = Some(Command::Rss),
            "email" => command = Some(Command::Email),
            "run" => command = Some(Command::Run),
            other => return Err(AppError::config(format!("unknown argument {:?}\n{}", other, USAGE))),
        }
    }

    let command = match command {
        Some(Command::Summarize { .. }) => Command::Summarize { dry_run },
        Some(c) => c,
        None => return Err(AppError::config(USAGE)),
    };

    Ok(Args {
        config_path,
        command,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info and above unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;

    let config = Config::load(args.config_path.as_deref())?;

    // Missing credentials are fatal here, before any work starts
    let summarizer = Summarizer::from_settings(LlmSettings::from_env()?)?;
    let app = App::new(config, summarizer).await?;

    match args.command {
        Command::Collect => {
            let report = app.collect().await?;
            println!(
                "Collected {} relevant items ({} new) from {} sources, {} failed",
                report.relevant, report.inserted, report.sources_ok, report.sources_failed
            );
        }
        Command::Summarize { dry_run } => summarize(&app, dry_run).await?,
        Command::Rss => {
            let path = app.write_rss().await?;
            println!("Wrote {}", path.display());
        }
        Command::Email => {
            let path = app.write_email().await?;
            println!("Wrote {}", path.display());
        }
        Command::Run => {
            app.collect().await?;
            summarize(&app, false).await?;
            // Outputs are independent of each other and of what is stored
            for result in app.write_outputs().await? {
                match result {
                    Ok(path) => println!("Wrote {}", path.display()),
                    Err(e) => tracing::error!(error = %e, "Failed to write output"),
                }
            }
        }
    }

    Ok(())
}

async fn summarize(app: &App, dry_run: bool) -> Result<()> {
    let report = app.summarize_pending(dry_run).await?;
    if report.pending == 0 {
        println!("No items to summarize.");
    } else {
        println!(
            "Summarized {} of {} items ({} remote, {} extractive, {} empty, {} not stored)",
            report.remote + report.extractive,
            report.pending,
            report.remote,
            report.extractive,
            report.skipped,
            report.failed
        );
    }
    Ok(())
}
