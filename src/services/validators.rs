use crate::config::{Bech32Prefixes, Config};
use crate::error::Result;
use crate::models::{
    AggregatedValidator, ChainValidator, Coin, DelegationResponse, Proposal, RequestState,
    StakingPool, Validator, ValidatorScreenModel, YourStake,
};
use crate::services::lcd_client::ChainQuery;
use crate::services::metrics::{
    calculate_expected_return, calculate_uptime, calculate_voting_power, relative_proposals,
};
use crate::services::query::Query;
use crate::services::session::WalletSession;
use crate::utils::address::{pubkey_to_bech32, translate_address};
use crate::utils::table::{sort_validators, ColumnOrder};
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::try_join;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;

/// Chain-wide inputs shared by every per-validator aggregation.
struct ChainSnapshot<'a> {
    current_height: u64,
    proposals: &'a [Proposal],
    annual_provisions: f64,
    pool: &'a StakingPool,
    wallet_address: Option<&'a str>,
    denom: &'a str,
}

/// A validator with the addresses needed to look it up elsewhere.
struct ScoredCandidate<'a> {
    validator: &'a ChainValidator,
    consensus_address: String,
    self_delegation_address: String,
}

fn score_candidate<'a>(
    validator: &'a ChainValidator,
    prefixes: &Bech32Prefixes,
) -> Option<ScoredCandidate<'a>> {
    let Some(pubkey) = validator.consensus_pubkey.as_ref() else {
        warn!("Skipping validator {}: no consensus key", validator.operator_address);
        return None;
    };
    let consensus_address = match pubkey_to_bech32(pubkey, &prefixes.consensus) {
        Ok(address) => address,
        Err(e) => {
            warn!("Skipping validator {}: {}", validator.operator_address, e);
            return None;
        }
    };
    let self_delegation_address =
        match translate_address(&validator.operator_address, &prefixes.account) {
            Ok(address) => address,
            Err(e) => {
                warn!("Skipping validator {}: {}", validator.operator_address, e);
                return None;
            }
        };
    Some(ScoredCandidate {
        validator,
        consensus_address,
        self_delegation_address,
    })
}

async fn wallet_delegation(
    chain: &dyn ChainQuery,
    wallet_address: Option<&str>,
    operator_address: &str,
) -> Result<Option<DelegationResponse>> {
    match wallet_address {
        Some(wallet) => chain.delegation(wallet, operator_address).await,
        None => Ok(None),
    }
}

async fn aggregate_validator(
    chain: &dyn ChainQuery,
    candidate: ScoredCandidate<'_>,
    snapshot: &ChainSnapshot<'_>,
) -> Result<AggregatedValidator> {
    let validator = candidate.validator;
    let operator = validator.operator_address.as_str();

    let (participated, delegation, signing_info) = try_join!(
        chain.voted_proposal_ids(&candidate.self_delegation_address),
        wallet_delegation(chain, snapshot.wallet_address, operator),
        chain.signing_info(&candidate.consensus_address),
    )?;

    let start_time = if signing_info.start_height != 0 {
        Some(chain.block(signing_info.start_height).await?.time)
    } else {
        None
    };
    let relative_total = relative_proposals(snapshot.proposals, start_time).len();

    // distribution has no rewards entry for a validator the wallet never delegated to
    let stake = match delegation {
        Some(delegation) => {
            let reward = chain
                .delegation_rewards(&delegation.delegation.delegator_address, operator)
                .await?;
            Some(YourStake {
                balance: delegation.balance,
                shares: delegation.delegation.shares,
                reward: Coin::sum_of(snapshot.denom, &reward),
            })
        }
        None => None,
    };

    Ok(AggregatedValidator {
        validator: Validator {
            operator_address: validator.operator_address.clone(),
            jailed: validator.jailed,
            status: validator.status,
            description: validator.description.clone(),
            voting_power: calculate_voting_power(&validator.tokens, &snapshot.pool.bonded_tokens),
            uptime: calculate_uptime(
                signing_info.start_height,
                signing_info.missed_blocks_counter,
                snapshot.current_height,
            ),
            expected_return: calculate_expected_return(
                snapshot.annual_provisions,
                &snapshot.pool.bonded_tokens,
                validator.commission_rate(),
            ),
            participated_proposal_count: participated.len(),
            relative_total_proposal_count: relative_total,
        },
        stake,
    })
}

/// Every scoreable validator with its derived metrics and the connected
/// wallet's stake, jailed validators last.
pub async fn fetch_validators(
    chain: &dyn ChainQuery,
    session: &WalletSession,
    config: &Config,
) -> Result<ValidatorScreenModel> {
    let wallet_address = session.connected_address().await;

    let (latest_block, validators, proposals, annual_provisions, pool) = try_join!(
        chain.latest_block(),
        chain.validators(),
        chain.proposals(),
        chain.annual_provisions(),
        chain.staking_pool(),
    )?;

    let prefixes = config.prefixes();
    let candidates: Vec<ScoredCandidate> = validators
        .iter()
        .filter_map(|v| score_candidate(v, &prefixes))
        .collect();
    info!(
        "Aggregating {} of {} validators at height {}",
        candidates.len(),
        validators.len(),
        latest_block.height
    );

    let snapshot = ChainSnapshot {
        current_height: latest_block.height,
        proposals: &proposals,
        annual_provisions,
        pool: &pool,
        wallet_address: wallet_address.as_deref(),
        denom: &config.coin_denom,
    };

    let snapshot = &snapshot;
    let aggregated: Vec<AggregatedValidator> = stream::iter(candidates)
        .map(|candidate| aggregate_validator(chain, candidate, snapshot))
        .buffered(config.parallel_limit.max(1))
        .try_collect()
        .await?;

    Ok(ValidatorScreenModel {
        aggregated_validators: sort_validators(&aggregated, &ColumnOrder::default()),
    })
}

/// Validator screen state: the request lifecycle plus the table order.
pub struct ValidatorsQuery {
    chain: Arc<dyn ChainQuery>,
    session: Arc<WalletSession>,
    config: Arc<Config>,
    query: Query<ValidatorScreenModel>,
    order: watch::Sender<ColumnOrder>,
}

impl ValidatorsQuery {
    pub fn new(chain: Arc<dyn ChainQuery>, session: Arc<WalletSession>, config: Arc<Config>) -> Self {
        let (order, _) = watch::channel(ColumnOrder::default());
        Self {
            chain,
            session,
            config,
            query: Query::new(),
            order,
        }
    }

    pub fn state(&self) -> RequestState<ValidatorScreenModel> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<ValidatorScreenModel>> {
        self.query.subscribe()
    }

    pub fn order(&self) -> ColumnOrder {
        self.order.borrow().clone()
    }

    /// Loads the list and applies the current table order.
    pub async fn fetch(&self) -> RequestState<ValidatorScreenModel> {
        self.query
            .run(async {
                let mut model =
                    fetch_validators(self.chain.as_ref(), &self.session, &self.config).await?;
                model.aggregated_validators =
                    sort_validators(&model.aggregated_validators, &self.order());
                Ok(model)
            })
            .await
    }

    /// Re-sorts the loaded list. Ignored until the list has loaded.
    pub fn set_order(&self, order: ColumnOrder) {
        let applied = self.query.update_loaded(|model| {
            model.aggregated_validators = sort_validators(&model.aggregated_validators, &order);
        });
        if applied {
            self.order.send_replace(order);
        }
    }
}
