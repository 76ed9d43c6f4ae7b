use dotenv::dotenv;
use log::{error, info, warn};
use std::env;
use tokio::sync::broadcast::error::RecvError;

use solana_swap_feed::{
    FeedUpdate,
    HeliusMetadataResolver,
    MetadataConfig,
    MonitorConfig,
    MonitorError,
    RpcLedgerClient,
    SolanaConfig,
    TokenLeg,
    TransactionMonitor,
    TransactionRecord,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    // Load configuration
    let config = load_configuration()?;
    let program_id = program_id()?;

    let ledger = RpcLedgerClient::new(&config.solana_config);
    let resolver = HeliusMetadataResolver::new(config.metadata_config.clone())?;
    let monitor = TransactionMonitor::new(ledger, resolver, config.monitor_config.clone());

    let mut updates = monitor.subscribe();

    info!(
        "Starting swap feed for {} via {}",
        program_id, config.solana_config.rpc_url
    );
    monitor.start(&program_id)?;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => print_update(&update),
                Err(RecvError::Lagged(skipped)) => warn!("Feed output lagged, skipped {} batches", skipped),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    monitor.stop();
    info!("Shutting down with {} transactions in feed", monitor.transactions().len());

    Ok(())
}

fn load_configuration() -> Result<AppConfig, MonitorError> {
    Ok(AppConfig {
        solana_config: SolanaConfig::load_from_env()?,
        metadata_config: MetadataConfig::load_from_env()?,
        monitor_config: MonitorConfig::load_from_env()?,
    })
}

// First CLI argument wins over PROGRAM_ID.
fn program_id() -> Result<String, MonitorError> {
    env::args()
        .nth(1)
        .or_else(|| env::var("PROGRAM_ID").ok())
        .ok_or_else(|| {
            MonitorError::Config("pass a program id as argument or set PROGRAM_ID".to_string())
        })
}

fn describe_leg(label: &str, leg: &Option<TokenLeg>) -> Option<String> {
    leg.as_ref()
        .map(|leg| format!("{} {} {} ({})", label, leg.amount, leg.symbol, leg.mint))
}

fn print_update(update: &FeedUpdate) {
    for record in &update.records {
        print_record(record);
    }
}

fn print_record(record: &TransactionRecord) {
    let legs: Vec<String> = [
        describe_leg("Paid:", &record.input_leg),
        describe_leg("Received:", &record.output_leg),
    ]
    .into_iter()
    .flatten()
    .collect();

    let program = match record.protocol {
        Some(protocol) => format!("{} ({})", protocol, record.program_name),
        None => record.program_name.clone(),
    };

    info!(
        "[{}] {:?} | {} | Program: {} | {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.status,
        legs.join(" | "),
        program,
        record.signature
    );
}

// Configuration struct to hold different component configurations
struct AppConfig {
    solana_config: SolanaConfig,
    metadata_config: MetadataConfig,
    monitor_config: MonitorConfig,
}
