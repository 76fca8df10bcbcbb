//! llmstxt main entry point
//!
//! This is the command-line interface for turning web pages into Markdown.

use clap::{Parser, Subcommand};
use futures::StreamExt;
use llmstxt::config::{load_config_with_hash, Config};
use llmstxt::ratelimit::FALLBACK_IDENTIFIER;
use llmstxt::{LlmsError, LlmsService, PageState};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// llmstxt: web pages to clean Markdown for language models
///
/// Formats a single page through the generation service, lists the
/// same-site links of a page, or concatenates selected pages into one
/// `llms-full` document.
#[derive(Parser, Debug)]
#[command(name = "llmstxt")]
#[command(version)]
#[command(about = "Turn web pages into Markdown for LLMs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Identifier charged against the rate limit
    #[arg(long, value_name = "IP", global = true)]
    client_ip: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Format one page as Markdown
    Single {
        url: String,

        /// Print text as the formatter produces it
        #[arg(long)]
        stream: bool,

        /// Write the document to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List same-site links found on a page
    Links {
        url: String,

        /// Print the links as JSON
        #[arg(long)]
        json: bool,
    },

    /// Concatenate several pages into one llms-full document
    Full {
        /// Pages to include, in order
        urls: Vec<String>,

        /// Discover links on this page; selects all of them when no URLs are given
        #[arg(long, value_name = "URL")]
        seed: Option<String>,
    },

    /// Show the requests left in the current rate-limit window
    Remaining,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return report(&e);
        }
    };

    let service = match LlmsService::from_config(config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            return report(&e);
        }
    };

    let identifier = cli
        .client_ip
        .clone()
        .unwrap_or_else(|| FALLBACK_IDENTIFIER.to_string());

    let result = match cli.command {
        Command::Single {
            url,
            stream,
            output,
        } => handle_single(&service, &url, &identifier, stream, output).await,
        Command::Links { url, json } => handle_links(&service, &url, &identifier, json).await,
        Command::Full { urls, seed } => handle_full(&service, urls, seed, &identifier).await,
        Command::Remaining => handle_remaining(&service, &identifier).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            report(&e)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("llmstxt=info,warn"),
            1 => EnvFilter::new("llmstxt=debug,info"),
            2 => EnvFilter::new("llmstxt=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(cli: &Cli) -> Result<Config, LlmsError> {
    let Some(path) = &cli.config else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Prints the `{message, code}` pair to stderr and picks the exit code
fn report(error: &LlmsError) -> ExitCode {
    let response = error.to_response();
    match serde_json::to_string(&response) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}: {}", response.code, response.message),
    }
    ExitCode::FAILURE
}

/// Cancels `token` on Ctrl-C
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            token.cancel();
        }
    });
}

async fn handle_single(
    service: &LlmsService,
    url: &str,
    identifier: &str,
    stream: bool,
    output: Option<PathBuf>,
) -> Result<(), LlmsError> {
    if !stream {
        let document = service.generate_single(url, identifier).await?;
        return write_output(output, &document).await;
    }

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let mut deltas = service
        .generate_single_stream(url, identifier, cancel)
        .await?;

    let mut document = String::new();
    while let Some(delta) = deltas.next().await {
        let delta = delta?;
        if output.is_none() {
            print!("{}", delta);
            // Partial output is still useful if stdout goes away
            let _ = std::io::stdout().flush();
        }
        document.push_str(&delta);
    }

    match output {
        Some(_) => write_output(output, &document).await,
        None => {
            println!();
            Ok(())
        }
    }
}

async fn write_output(output: Option<PathBuf>, document: &str) -> Result<(), LlmsError> {
    match output {
        Some(path) => {
            tokio::fs::write(&path, document)
                .await
                .map_err(|e| LlmsError::Export(e.into()))?;
            tracing::info!("Wrote {} bytes to {}", document.len(), path.display());
        }
        None => println!("{}", document),
    }
    Ok(())
}

async fn handle_links(
    service: &LlmsService,
    url: &str,
    identifier: &str,
    json: bool,
) -> Result<(), LlmsError> {
    let links = service.discover_links(url, identifier).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&links)
            .map_err(|e| LlmsError::Validation(e.to_string()))?;
        println!("{}", rendered);
    } else {
        for link in &links {
            println!("{}\t{}", link.url, link.title);
        }
    }

    Ok(())
}

async fn handle_full(
    service: &LlmsService,
    mut urls: Vec<String>,
    seed: Option<String>,
    identifier: &str,
) -> Result<(), LlmsError> {
    if let Some(seed) = seed {
        let links = service.discover_links(&seed, identifier).await?;
        if urls.is_empty() {
            tracing::info!("Selecting all {} discovered links", links.len());
            urls = links.into_iter().map(|link| link.url).collect();
        } else {
            for link in &links {
                tracing::debug!("Discovered {}", link.url);
            }
        }
    }

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<llmstxt::ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            eprintln!(
                "[{}/{}] {} {}",
                event.current, event.total, event.state, event.url
            );
        }
    });

    let result = service
        .generate_full(&urls, identifier, Some(tx), &cancel)
        .await;

    // The sender is dropped with the run, so the printer drains and exits
    let _ = printer.await;
    let result = result?;

    println!("=== llms-full ===");
    println!("File: {}", result.file_name);
    println!("Download: {}", result.download_url);
    println!(
        "Pages: {}/{} succeeded ({} processed) in {:.2}s",
        result.succeeded,
        result.total,
        result.processed,
        result.elapsed_ms as f64 / 1000.0
    );
    if result.cancelled {
        println!("Run was cancelled; remaining pages were skipped");
    }

    for outcome in &result.outcomes {
        if outcome.state != PageState::Appended {
            println!(
                "  {} {}{}",
                outcome.state,
                outcome.url,
                outcome
                    .error
                    .as_deref()
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

async fn handle_remaining(service: &LlmsService, identifier: &str) -> Result<(), LlmsError> {
    let remaining = service.remaining(identifier).await?;
    println!(
        "{} requests remaining for {} (quota {} per {}h)",
        remaining,
        identifier,
        service.config().rate_limit.quota,
        service.config().rate_limit.window_hours
    );
    Ok(())
}
