use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{Coin, Portfolio, PortfolioModel, Profile, RequestState, StakedValidatorInfo};
use crate::services::lcd_client::ChainQuery;
use crate::services::metrics::{calculate_expected_return, calculate_voting_power};
use crate::services::query::Query;
use crate::services::session::WalletSession;
use crate::utils::address::{has_prefix, translate_address};
use crate::utils::table::{sort_stakes, ColumnOrder, SortDirection};
use futures::future::try_join_all;
use futures::try_join;
use log::{info, warn};
use num_bigint::BigInt;
use num_traits::Zero;
use std::sync::Arc;
use tokio::sync::watch;

/// True when `address` is a well-formed account address that exists on chain.
/// Lookup failures count as invalid.
pub async fn is_valid_address(chain: &dyn ChainQuery, address: &str, prefix: &str) -> bool {
    if !has_prefix(address, prefix) {
        return false;
    }
    match chain.account_exists(address).await {
        Ok(exists) => exists,
        Err(e) => {
            warn!("Account lookup for {} failed: {}", address, e);
            false
        }
    }
}

async fn staked_balance(chain: &dyn ChainQuery, address: &str, denom: &str) -> Result<Coin> {
    let delegations = chain.delegations(address).await?;
    Ok(Coin::sum_of(denom, delegations.iter().map(|d| &d.balance)))
}

async fn unstaking_balance(chain: &dyn ChainQuery, address: &str, denom: &str) -> Result<Coin> {
    let unbondings = chain.unbonding_delegations(address).await?;
    let amount = unbondings
        .iter()
        .flat_map(|u| u.entries.iter())
        .fold(BigInt::zero(), |acc, e| acc + &e.balance);
    Ok(Coin::new(denom, amount))
}

async fn total_commission(
    chain: &dyn ChainQuery,
    address: &str,
    denom: &str,
    operator_prefix: &str,
) -> Result<Coin> {
    let operator_address = translate_address(address, operator_prefix)?;
    let commission = chain.validator_commission(&operator_address).await?;
    Ok(Coin::sum_of(denom, &commission))
}

async fn total_rewards(chain: &dyn ChainQuery, address: &str, denom: &str) -> Result<Coin> {
    let rewards = chain.delegation_total_rewards(address).await?;
    Ok(Coin::sum_of(denom, &rewards))
}

async fn load_profile(chain: &dyn ChainQuery, address: &str) -> Result<Option<Profile>> {
    match chain.profile(address).await {
        Ok(profile) => Ok(profile),
        Err(e) => {
            warn!("Profile lookup for {} failed: {}", address, e);
            Ok(None)
        }
    }
}

pub async fn fetch_address_portfolio(
    chain: &dyn ChainQuery,
    config: &Config,
    address: &str,
) -> Result<Portfolio> {
    let denom = config.coin_denom.as_str();
    let prefixes = config.prefixes();

    let (available, staked, unstaking, commission, reward, profile) = try_join!(
        chain.balance(address, denom),
        staked_balance(chain, address, denom),
        unstaking_balance(chain, address, denom),
        total_commission(chain, address, denom, &prefixes.validator_operator),
        total_rewards(chain, address, denom),
        load_profile(chain, address),
    )?;

    Ok(Portfolio::new(
        address.to_string(),
        available,
        staked,
        unstaking,
        commission,
        reward,
    )
    .with_profile(profile))
}

pub async fn fetch_stakes(
    chain: &dyn ChainQuery,
    config: &Config,
    address: &str,
) -> Result<Vec<StakedValidatorInfo>> {
    let denom = config.coin_denom.as_str();
    let delegations = chain.delegations(address).await?;
    if delegations.is_empty() {
        return Ok(Vec::new());
    }

    let validator_addresses: Vec<String> = delegations
        .iter()
        .map(|d| d.delegation.validator_address.clone())
        .collect();

    let (annual_provisions, pool, rewards, validators) = try_join!(
        chain.annual_provisions(),
        chain.staking_pool(),
        try_join_all(
            validator_addresses
                .iter()
                .map(|v| chain.delegation_rewards(address, v))
        ),
        try_join_all(validator_addresses.iter().map(|v| chain.validator(v))),
    )?;

    let stakes = delegations
        .into_iter()
        .zip(rewards)
        .zip(validators)
        .map(|((delegation, reward), validator)| StakedValidatorInfo {
            expected_return: calculate_expected_return(
                annual_provisions,
                &pool.bonded_tokens,
                validator.commission_rate(),
            ),
            voting_power: calculate_voting_power(&validator.tokens, &pool.bonded_tokens),
            reward: Coin::sum_of(denom, &reward),
            balance: delegation.balance,
            delegation: delegation.delegation,
            validator,
        })
        .collect();

    Ok(stakes)
}

/// Portfolio of `address`, or of the connected wallet when `address` is
/// None or empty.
pub async fn fetch_portfolio(
    chain: &dyn ChainQuery,
    session: &WalletSession,
    config: &Config,
    address: Option<&str>,
) -> Result<PortfolioModel> {
    let address = match address.filter(|a| !a.is_empty()) {
        Some(address) => {
            if !is_valid_address(chain, address, &config.prefixes().account).await {
                return Err(DashboardError::InvalidAddress);
            }
            address.to_string()
        }
        None => session
            .connected_address()
            .await
            .ok_or(DashboardError::WalletNotConnected)?,
    };

    info!("Fetching portfolio of {}", address);
    let (portfolio, stakes) = try_join!(
        fetch_address_portfolio(chain, config, &address),
        fetch_stakes(chain, config, &address),
    )?;
    info!(
        "Portfolio of {} loaded with {} stakes",
        address,
        stakes.len()
    );

    Ok(PortfolioModel { portfolio, stakes })
}

/// Portfolio screen state: the request lifecycle plus the stakes table order.
pub struct PortfolioQuery {
    chain: Arc<dyn ChainQuery>,
    session: Arc<WalletSession>,
    config: Arc<Config>,
    query: Query<PortfolioModel>,
    stakes_order: watch::Sender<ColumnOrder>,
}

impl PortfolioQuery {
    pub fn new(chain: Arc<dyn ChainQuery>, session: Arc<WalletSession>, config: Arc<Config>) -> Self {
        let (stakes_order, _) = watch::channel(ColumnOrder::new("name", SortDirection::Asc));
        Self {
            chain,
            session,
            config,
            query: Query::new(),
            stakes_order,
        }
    }

    pub fn state(&self) -> RequestState<PortfolioModel> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<PortfolioModel>> {
        self.query.subscribe()
    }

    pub fn stakes_order(&self) -> ColumnOrder {
        self.stakes_order.borrow().clone()
    }

    pub async fn fetch(&self, address: Option<&str>) -> RequestState<PortfolioModel> {
        self.query
            .run(async {
                let mut model =
                    fetch_portfolio(self.chain.as_ref(), &self.session, &self.config, address)
                        .await?;
                model.stakes = sort_stakes(&model.stakes, &self.stakes_order());
                Ok(model)
            })
            .await
    }

    pub fn set_stakes_order(&self, order: ColumnOrder) {
        self.query
            .update_loaded(|model| model.stakes = sort_stakes(&model.stakes, &order));
        self.stakes_order.send_replace(order);
    }
}
