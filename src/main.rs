//! CLI entry point for the romgrab tool.

use std::sync::atomic::Ordering;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use romgrab_core::{
    Config, Event, EventReceiver, Session, TaskState, extract_links, resolve_menu,
};
use tracing::{debug, info, warn};
use url::Url;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args);

    let (session, events) = Session::new(config)?;
    let start_url = args
        .url
        .clone()
        .unwrap_or_else(|| session.config().full_url());

    if args.menu {
        return show_menu(&session, &start_url).await;
    }

    let mut navigator = session.navigator();
    navigator.open(&start_url).await?;

    let Some(snapshot) = navigator.current_snapshot() else {
        bail!("failed to load listing {start_url}");
    };

    let filter = session.filter();
    let directories = snapshot.directories().count();
    let keeps: Vec<_> = snapshot
        .files()
        .filter(|entry| filter.keep(&entry.display_name))
        .cloned()
        .collect();
    info!(
        url = %start_url,
        entries = snapshot.entries.len(),
        directories,
        kept = keeps.len(),
        "listing loaded"
    );

    if keeps.is_empty() {
        println!("No files match the configured filters.");
        return Ok(());
    }

    if args.list_only {
        for entry in &keeps {
            println!("{}", entry.display_name);
        }
        println!("{} file(s) match.", keeps.len());
        return Ok(());
    }

    let download_dir = session.config().download_directory.clone();
    tokio::fs::create_dir_all(&download_dir)
        .await
        .with_context(|| format!("cannot create download directory {}", download_dir.display()))?;

    let tasks = session.make_tasks(keeps);
    let names: Vec<String> = tasks
        .iter()
        .map(|t| t.entry.display_name.clone())
        .collect();

    let orchestrator = session.orchestrator();
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested, stopping at the next task boundary");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let renderer = tokio::spawn(render_events(events, names, args.quiet));
    let report = orchestrator.run(tasks).await;

    // Dropping the remaining event senders ends the renderer loop.
    drop(navigator);
    drop(session);
    let _ = renderer.await;

    for task in &report.tasks {
        if let TaskState::Failed { reason } = &task.state {
            eprintln!("FAILED {}: {reason}", task.entry.display_name);
        }
    }
    println!(
        "Done: {} downloaded, {} skipped, {} failed, {} cancelled.",
        report.summary.succeeded,
        report.summary.skipped,
        report.summary.failed,
        report.summary.cancelled
    );

    if report.summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Folds CLI overrides into the loaded config snapshot.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(dir) = &args.output {
        config.download_directory = dir.clone();
    }
    if !args.include.is_empty() {
        config.include_patterns = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.exclude_patterns = args.exclude.clone();
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(delay) = args.retry_delay {
        config.retry_delay_seconds = delay;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_seconds = timeout;
    }
}

/// Prints the menu links of a page (anchors carrying the `menu` class).
async fn show_menu(session: &Session, url: &str) -> Result<()> {
    let page = session.fetch_page(url).await?;
    let parsed = Url::parse(url).with_context(|| format!("invalid URL {url}"))?;
    let menu = resolve_menu(&extract_links(&page.text_lossy()), &parsed);

    if menu.is_empty() {
        println!("No menu links on {url}.");
        return Ok(());
    }
    for entry in &menu.entries {
        println!("{}  ->  {}", entry.display_name, entry.absolute_url);
    }
    Ok(())
}

/// Renders core events: one progress bar per in-flight download plus
/// outcome lines. Runs until every event sender is dropped.
async fn render_events(mut events: EventReceiver, names: Vec<String>, quiet: bool) {
    let mut bar: Option<(usize, ProgressBar)> = None;

    while let Some(event) = events.recv().await {
        match event {
            Event::DownloadProgress { task_id, bytes, total } => {
                if quiet {
                    continue;
                }
                let stale = bar.as_ref().is_none_or(|(id, _)| *id != task_id);
                if stale {
                    if let Some((_, old)) = bar.take() {
                        old.finish_and_clear();
                    }
                    let name = names.get(task_id).cloned().unwrap_or_default();
                    let new_bar = match total {
                        Some(len) => {
                            let b = ProgressBar::new(len);
                            b.set_style(
                                ProgressStyle::with_template(
                                    "{msg:30!} {bar:30} {bytes}/{total_bytes}",
                                )
                                .unwrap_or_else(|_| ProgressStyle::default_bar()),
                            );
                            b
                        }
                        None => {
                            let b = ProgressBar::new_spinner();
                            b.set_style(
                                ProgressStyle::with_template("{msg:30!} {spinner} {bytes}")
                                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                            );
                            b
                        }
                    };
                    new_bar.set_message(name);
                    bar = Some((task_id, new_bar));
                }
                if let Some((_, b)) = &bar {
                    b.set_position(bytes);
                }
            }
            Event::DownloadOutcome { task_id, state } => {
                if bar.as_ref().is_some_and(|(id, _)| *id == task_id)
                    && let Some((_, b)) = bar.take()
                {
                    b.finish_and_clear();
                }
                if quiet {
                    continue;
                }
                let name = names.get(task_id).map_or("?", String::as_str);
                match state {
                    TaskState::Succeeded => println!("downloaded {name}"),
                    TaskState::Skipped(_) => println!("already downloaded {name}"),
                    TaskState::Cancelled => println!("cancelled {name}"),
                    TaskState::Failed { reason } => println!("failed {name}: {reason}"),
                    _ => {}
                }
            }
            Event::NavigationError { url, reason } => {
                eprintln!("navigation error at {url}: {reason}");
            }
            Event::ListingUpdated(_) | Event::BatchComplete(_) => {}
        }
    }
}
