use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use cosmos_portfolio::config::Config;
use cosmos_portfolio::models::{AggregatedValidator, ProposalStatus, RequestState};
use cosmos_portfolio::services::lcd_client::{ChainQuery, LcdClient};
use cosmos_portfolio::services::portfolio::PortfolioQuery;
use cosmos_portfolio::services::proposal::{self, CreateProposal};
use cosmos_portfolio::services::session::WalletSession;
use cosmos_portfolio::services::validators::ValidatorsQuery;
use cosmos_portfolio::utils::table::{
    filter_validators, offset_to_page, page_to_offset, paginate, ColumnOrder, SortDirection,
    ValidatorFilter,
};
use dotenv::dotenv;
use log::{info, warn};
use num_bigint::BigInt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Balances and stakes of an address (defaults to the connected wallet)
    Portfolio {
        address: Option<String>,
        #[arg(long, default_value = "name")]
        order: String,
        #[arg(long, default_value = "asc")]
        direction: SortDirection,
    },
    /// One page of the validator table
    Validators {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value = "all")]
        tab: ValidatorFilter,
        #[arg(long)]
        order: Option<String>,
        #[arg(long, default_value = "asc")]
        direction: SortDirection,
    },
    /// Governance proposals with their tally, newest first
    Proposals {
        /// deposit, voting, passed, rejected, failed or invalid
        #[arg(long)]
        status: Option<ProposalStatus>,
    },
    /// Minimum governance deposit in the staking denom
    MinDeposit,
    /// Validates a text proposal and prints the unsigned message
    ProposalMsg {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        deposit: BigInt,
    },
    /// Broadcasts a signed tx read as base64 from a file
    Broadcast {
        #[arg(long)]
        tx_file: PathBuf,
    },
}

#[derive(Serialize)]
struct ValidatorPage<'a> {
    page: usize,
    page_count: usize,
    total: usize,
    validators: &'a [AggregatedValidator],
}

fn into_loaded<T>(state: RequestState<T>) -> Result<T, Box<dyn std::error::Error>> {
    match state {
        RequestState::Loaded(data) => Ok(data),
        RequestState::Error(e) => Err(e.to_string().into()),
        _ => Err("request did not complete".into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);

    info!("Connecting to LCD {}", config.primary_lcd);
    let chain: Arc<dyn ChainQuery> = Arc::new(LcdClient::connect(
        &config.primary_lcd,
        &config.secondary_lcd,
        config.profile_lcd.as_deref(),
    ));

    let session = Arc::new(WalletSession::new(&config.coin_denom));
    if let Some(address) = &config.wallet_address {
        if let Err(e) = session.connect(chain.as_ref(), address).await {
            warn!("Continuing without a wallet: {}", e);
        }
    }

    match cli.command {
        Commands::Portfolio {
            address,
            order,
            direction,
        } => {
            let query = PortfolioQuery::new(chain, session, config);
            query.fetch(address.as_deref()).await;
            query.set_stakes_order(ColumnOrder::new(&order, direction));
            let model = into_loaded(query.state())?;
            print_json(&model)?;
        }
        Commands::Validators {
            page,
            tab,
            order,
            direction,
        } => {
            let query = ValidatorsQuery::new(chain, session, config.clone());
            query.fetch().await;
            if let Some(order) = order {
                query.set_order(ColumnOrder::new(&order, direction));
            }
            let model = into_loaded(query.state())?;

            let filtered = filter_validators(&model.aggregated_validators, tab);
            let offset = page_to_offset(page, config.page_size);
            let page_count = if filtered.is_empty() {
                1
            } else {
                offset_to_page(filtered.len() - 1, config.page_size)
            };
            print_json(&ValidatorPage {
                page: offset_to_page(offset, config.page_size),
                page_count,
                total: filtered.len(),
                validators: paginate(&filtered, offset, config.page_size),
            })?;
        }
        Commands::Proposals { status } => {
            let proposals = proposal::list_proposals(chain.as_ref(), status).await?;
            print_json(&proposals)?;
        }
        Commands::MinDeposit => {
            let deposit = proposal::min_deposit(chain.as_ref(), &config.coin_denom).await?;
            print_json(&deposit)?;
        }
        Commands::ProposalMsg {
            title,
            description,
            deposit,
        } => {
            let form = CreateProposal {
                title,
                description,
                deposit,
                memo: None,
            };
            let msg = proposal::prepare_proposal(chain.as_ref(), &session, &form).await?;
            print_json(&msg)?;
        }
        Commands::Broadcast { tx_file } => {
            let encoded = tokio::fs::read_to_string(&tx_file).await?;
            let tx_bytes = STANDARD.decode(encoded.trim())?;
            let result = proposal::broadcast_signed(chain.as_ref(), &tx_bytes).await?;
            if session.connected_address().await.is_some() {
                session.refresh_account(chain.as_ref()).await?;
            }
            print_json(&result)?;
        }
    }

    Ok(())
}
