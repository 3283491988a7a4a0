use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use prediction_agent::eth::{events, submit};
use prediction_agent::personas::{self, Persona};
use prediction_agent::types::{self, Outcome, PredictionIntent, ResolutionIntent};
use prediction_agent::{AgentConfig, PredictionClient, audit, drift};

#[derive(Parser)]
#[command(
    name = "prediction-agent",
    about = "Submit, resolve, and observe predictions on the PredictionValidation contract"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a prediction
    Submit {
        /// Confidence in the prediction, 1-100
        #[arg(short, long)]
        confidence: u64,
        /// Variables text to fingerprint, e.g. "wallet:0xabc123|amount:2ETH|mixer:Tornado"
        #[arg(short, long)]
        variables: String,
        /// Blocks from the current head until the prediction expires
        #[arg(short, long, default_value_t = 50)]
        expiry_offset: u64,
        #[arg(short, long)]
        description: String,
    },
    /// Resolve a prediction (outcome: 1=Success, 2=Failure, 3=Undetermined)
    Resolve {
        /// Prediction id assigned by the contract
        #[arg(short, long)]
        id: u64,
        #[arg(short, long)]
        outcome: u8,
    },
    /// Run a CID persona agent
    Agent {
        #[arg(short, long, value_enum)]
        persona: Persona,
    },
    /// Watch contract events and append them to the audit log
    Watch {
        /// First block to scan; defaults to the block after the current head
        #[arg(long)]
        from_block: Option<u64>,
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
        #[arg(long, default_value = "audit_log.json")]
        log_path: PathBuf,
    },
    /// Analyze the audit log for confidence drift
    Analyze {
        #[arg(long, default_value = "audit_log.json")]
        log_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Load env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            confidence,
            variables,
            expiry_offset,
            description,
        } => {
            let client = connect().await?;
            let expiry_block = client.block_number().await? + expiry_offset;

            let intent = PredictionIntent {
                confidence,
                variables_hash: types::hash_variables(&variables),
                expiry_block,
                description,
            };

            let tx_hash = submit::submit_prediction(&client, &intent).await?;
            println!("Prediction submitted. Tx hash: {tx_hash:?}");
        }
        Commands::Resolve { id, outcome } => {
            let intent = ResolutionIntent {
                prediction_id: id,
                outcome: Outcome::from_code(outcome)?,
            };

            let client = connect().await?;
            let tx_hash = submit::resolve_prediction(&client, &intent).await?;
            println!("Prediction resolved. Tx hash: {tx_hash:?}");
        }
        Commands::Agent { persona } => {
            let client = connect().await?;
            personas::run_persona(&client, persona).await?;
        }
        Commands::Watch {
            from_block,
            interval_secs,
            log_path,
        } => {
            let client = connect().await?;
            events::watch(
                &client,
                from_block,
                Duration::from_secs(interval_secs),
                &log_path,
            )
            .await?;
        }
        Commands::Analyze { log_path } => {
            let records = audit::load(&log_path)?;
            println!("{}", drift::analyze(&records));
        }
    }

    Ok(())
}

async fn connect() -> Result<PredictionClient> {
    let config = AgentConfig::from_env()?;
    Ok(PredictionClient::connect(&config).await?)
}
