// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use obra_partes::config::{Backend, Command, CommandLineInput, ServerConfig, WatchConfig};
use obra_partes::{
    AppState, CachedRepository, MockWorkOrders, NotionHttpClient, NotionSchema, NotionWorkOrders,
    StatusWatcher, WorkOrderClient, WorkOrderRepository,
};
use std::fs;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("obra_partes.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}";

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build(&log_file_path)
        .with_context(|| format!("Cannot open log file {}", log_file_path.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn cached<R: WorkOrderRepository + 'static>(
    inner: R,
    config: &ServerConfig,
) -> Arc<dyn WorkOrderRepository> {
    if config.cache_ttl.is_zero() {
        log::info!("Cache disabled");
    } else {
        log::info!(
            "Cache enabled (TTL: {}s, {} entries)",
            config.cache_ttl.as_secs(),
            config.cache_capacity
        );
    }
    Arc::new(CachedRepository::new(
        inner,
        config.cache_ttl,
        config.cache_capacity,
    ))
}

/// Picks the store for the configured backend.
fn build_repository(config: &ServerConfig) -> anyhow::Result<Arc<dyn WorkOrderRepository>> {
    match &config.backend {
        Backend::Mock => {
            log::warn!("No Notion token configured: serving sample data");
            Ok(cached(
                MockWorkOrders::new(config.signing_base.clone()),
                config,
            ))
        }
        Backend::Notion {
            api_key,
            api_url,
            databases,
            timeout,
        } => {
            log::info!("Using Notion at {} with token {}", api_url, api_key);
            let client = NotionHttpClient::new(api_key, api_url, *timeout)?;
            let schema = NotionSchema::with_databases(databases.clone());
            Ok(cached(
                NotionWorkOrders::new(client, schema, config.signing_base.clone()),
                config,
            ))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let repo = build_repository(&config)?;
    let state = AppState::new(repo)
        .with_rate_limit(config.rate_limit_per_minute)
        .with_cors(config.cors.clone())
        .with_events_interval(config.events_interval);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Cannot bind {}", address))?;

    obra_partes::serve(listener, state, shutdown_signal())
        .await
        .context("Server failed")
}

async fn run_watch(config: WatchConfig) -> anyhow::Result<()> {
    let client = WorkOrderClient::new(&config.server)?;
    let parte_id = config.parte_id.clone();
    let (mut changes, handle) = StatusWatcher::new(Arc::new(client), config.parte_id)
        .stop_when_final(config.stop_when_final)
        .spawn(16);

    log::info!("Watching parte {} on {}", parte_id, config.server);
    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Some(change) => {
                    let edited = change.current.last_edited.as_deref().unwrap_or("-");
                    match &change.previous {
                        Some(previous) => println!(
                            "{}: {} -> {} (ultima edicion {})",
                            change.parte_id, previous.status, change.current.status, edited
                        ),
                        None => println!(
                            "{}: {} (ultima edicion {})",
                            change.parte_id, change.current.status, edited
                        ),
                    }
                }
                None => break,
            },
            _ = shutdown_signal() => break,
        }
    }

    drop(changes);
    handle.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    match cli.command {
        Command::Serve(args) => run_server(ServerConfig::resolve(args)?).await,
        Command::Watch(args) => run_watch(WatchConfig::resolve(args)?).await,
    }
}
