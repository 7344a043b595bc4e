// src/main.rs
use anyhow::Context;
use cid2records::{
    AppError, CommandLineInput, DocumentCache, DocumentSource, GatewayClient, GraphReader,
    HeartbeatEvent, InMemorySink, LocalDocumentStore, PipelineConfig, SchedulerOptions,
    SourceSelection, SubmissionEvent, SubmissionProcessor, UpsertSink,
};
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
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("cid2records.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // stdout carries the JSON output when no file is given
    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Builds the document source and the scheduler options it allows.
fn open_source(
    config: &PipelineConfig,
) -> Result<(Arc<dyn DocumentSource>, SchedulerOptions), AppError> {
    let options = SchedulerOptions::new(&config.indexer);
    match &config.source {
        SourceSelection::Gateways(gateways) => {
            let client = GatewayClient::new(gateways.clone())?;
            log::info!(
                "Fetching from {} configured gateways",
                gateways.endpoints().count()
            );
            let source: Arc<dyn DocumentSource> = Arc::new(DocumentCache::new(client));
            Ok((source, options.with_gateways(gateways)))
        }
        SourceSelection::Fixtures(dir) => {
            let store = LocalDocumentStore::from_dir(dir)?;
            let source: Arc<dyn DocumentSource> = Arc::new(DocumentCache::new(store));
            Ok((source, options))
        }
    }
}

/// Processes the event described by the command line and returns the
/// records it produced.
async fn execute(config: &PipelineConfig) -> Result<serde_json::Value, AppError> {
    let (source, options) = open_source(config)?;
    let sink = Arc::new(InMemorySink::new());
    let processor = SubmissionProcessor::with_options(
        GraphReader::new(source),
        Arc::clone(&sink) as Arc<dyn UpsertSink>,
        config.indexer.clone(),
        options,
    );

    if config.heartbeat {
        let event = HeartbeatEvent {
            chain_id: config.chain_id,
            block_number: 0,
            log_index: 0,
            timestamp: config.timestamp,
            submitter: config.submitter.clone(),
            property_hash: config.property_hash.clone(),
            data_group_hash: String::new(),
            data_hash: config.data_hash.clone(),
        };
        match processor.process_heartbeat(&event).await? {
            Some(id) => log::info!("Heartbeat refreshed {}", id),
            None => log::info!("Heartbeat found nothing to refresh"),
        }
    } else {
        let event = SubmissionEvent {
            chain_id: config.chain_id,
            block_number: 0,
            log_index: 0,
            timestamp: config.timestamp,
            submitter: config.submitter.clone(),
            property_hash: config.property_hash.clone(),
            data_group_hash: String::new(),
            data_hash: config.data_hash.clone(),
        };
        let processed = processor.process_submission(&event).await?;
        match &processed.canonical_id {
            Some(id) => log::info!(
                "Resolved {} to parcel {} ({} records written)",
                processed.data_cid,
                id,
                sink.len()
            ),
            None => log::info!(
                "Resolved {} without a parcel identifier ({} records written)",
                processed.data_cid,
                sink.len()
            ),
        }
    }

    Ok(sink.to_json())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).map_err(|e| anyhow::anyhow!("logging setup failed: {}", e))?;

    let config = PipelineConfig::resolve(cli).context("invalid configuration")?;

    let records = execute(&config).await?;
    let rendered = serde_json::to_string_pretty(&records)?;
    match &config.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("Records written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
