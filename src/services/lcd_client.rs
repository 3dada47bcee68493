use crate::error::{DashboardError, Result};
use crate::models::{
    BlockHeader, BroadcastResult, ChainValidator, Coin, DelegationResponse, Profile, Proposal,
    SigningInfo, StakingPool, UnbondingDelegation,
};
use crate::utils::address::translate_address;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

const PAGE_LIMIT: usize = 200;
const MSG_VOTE_TYPE: &str = "/cosmos.gov.v1beta1.MsgVote";
const PROFILE_PREFIX: &str = "desmos";

/// Read and broadcast access to a Cosmos-SDK chain.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    async fn account_exists(&self, address: &str) -> Result<bool>;
    async fn balance(&self, address: &str, denom: &str) -> Result<Coin>;
    async fn delegations(&self, delegator: &str) -> Result<Vec<DelegationResponse>>;
    async fn unbonding_delegations(&self, delegator: &str) -> Result<Vec<UnbondingDelegation>>;
    /// `None` when `delegator` has no delegation with `validator`.
    async fn delegation(
        &self,
        delegator: &str,
        validator: &str,
    ) -> Result<Option<DelegationResponse>>;
    async fn validator(&self, operator_address: &str) -> Result<ChainValidator>;
    async fn validators(&self) -> Result<Vec<ChainValidator>>;
    async fn staking_pool(&self) -> Result<StakingPool>;
    async fn annual_provisions(&self) -> Result<f64>;
    async fn validator_commission(&self, operator_address: &str) -> Result<Vec<Coin>>;
    async fn delegation_total_rewards(&self, delegator: &str) -> Result<Vec<Coin>>;
    /// Pending rewards of one delegation; empty when there is none.
    async fn delegation_rewards(&self, delegator: &str, validator: &str) -> Result<Vec<Coin>>;
    async fn signing_info(&self, consensus_address: &str) -> Result<SigningInfo>;
    async fn proposals(&self) -> Result<Vec<Proposal>>;
    /// Ids of the proposals `voter` has cast a vote on.
    async fn voted_proposal_ids(&self, voter: &str) -> Result<Vec<u64>>;
    async fn min_deposit(&self) -> Result<Vec<Coin>>;
    async fn latest_block(&self) -> Result<BlockHeader>;
    async fn block(&self, height: u64) -> Result<BlockHeader>;
    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult>;
    async fn profile(&self, address: &str) -> Result<Option<Profile>>;
}

pub fn is_not_found(err: &DashboardError) -> bool {
    matches!(err, DashboardError::Status { status: 404, .. })
}

/// gRPC code for NotFound, as echoed in gateway error bodies.
const GRPC_NOT_FOUND: i64 = 5;

#[derive(Deserialize)]
struct GatewayError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// The gateway answers some lookups of absent entries with a 500 and an SDK
/// error body ("delegation does not exist"). Those are misses, not outages.
fn reports_missing(body: &str) -> bool {
    match serde_json::from_str::<GatewayError>(body) {
        Ok(e) => {
            let message = e.message.to_lowercase();
            e.code == GRPC_NOT_FOUND
                || message.contains("does not exist")
                || message.contains("not found")
        }
        Err(_) => false,
    }
}

#[derive(Deserialize)]
struct PageResponse {
    #[serde(default)]
    next_key: Option<String>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Coin,
}

#[derive(Deserialize)]
struct DelegationsResponse {
    delegation_responses: Vec<DelegationResponse>,
    #[serde(default)]
    pagination: Option<PageResponse>,
}

#[derive(Deserialize)]
struct SingleDelegationResponse {
    delegation_response: DelegationResponse,
}

#[derive(Deserialize)]
struct UnbondingResponse {
    unbonding_responses: Vec<UnbondingDelegation>,
    #[serde(default)]
    pagination: Option<PageResponse>,
}

#[derive(Deserialize)]
struct ValidatorResponse {
    validator: ChainValidator,
}

#[derive(Deserialize)]
struct ValidatorsResponse {
    validators: Vec<ChainValidator>,
    #[serde(default)]
    pagination: Option<PageResponse>,
}

#[derive(Deserialize)]
struct PoolResponse {
    pool: StakingPool,
}

#[derive(Deserialize)]
struct AnnualProvisionsResponse {
    annual_provisions: String,
}

#[derive(Deserialize)]
struct CommissionInner {
    #[serde(default)]
    commission: Vec<Coin>,
}

#[derive(Deserialize)]
struct CommissionResponse {
    commission: CommissionInner,
}

#[derive(Deserialize)]
struct TotalRewardsResponse {
    #[serde(default)]
    total: Vec<Coin>,
}

#[derive(Deserialize)]
struct RewardsResponse {
    #[serde(default)]
    rewards: Vec<Coin>,
}

#[derive(Deserialize)]
struct SigningInfoResponse {
    val_signing_info: SigningInfo,
}

#[derive(Deserialize)]
struct ProposalsResponse {
    proposals: Vec<Proposal>,
    #[serde(default)]
    pagination: Option<PageResponse>,
}

#[derive(Deserialize)]
struct TxSearchResponse {
    #[serde(default)]
    txs: Vec<Value>,
}

#[derive(Deserialize)]
struct DepositParams {
    #[serde(default)]
    min_deposit: Vec<Coin>,
}

#[derive(Deserialize)]
struct DepositParamsResponse {
    deposit_params: DepositParams,
}

#[derive(Deserialize)]
struct Block {
    header: BlockHeader,
}

#[derive(Deserialize)]
struct BlockResponse {
    block: Block,
}

#[derive(Deserialize)]
struct TxResponse {
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[derive(Deserialize, Default)]
struct ProfilePictures {
    #[serde(default)]
    profile: String,
}

#[derive(Deserialize)]
struct ProfileBody {
    dtag: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    pictures: ProfilePictures,
}

#[derive(Deserialize)]
struct ProfileResponse {
    profile: ProfileBody,
}

/// LCD (REST) client with a secondary endpoint used when the primary fails.
pub struct LcdClient {
    http: reqwest::Client,
    primary: String,
    secondary: String,
    profile: Option<String>,
}

impl LcdClient {
    pub fn connect(primary: &str, secondary: &str, profile: Option<&str>) -> Self {
        info!("Connecting to LCD endpoints {} / {}", primary, secondary);
        Self {
            http: reqwest::Client::new(),
            primary: primary.trim_end_matches('/').to_string(),
            secondary: secondary.trim_end_matches('/').to_string(),
            profile: profile.map(|p| p.trim_end_matches('/').to_string()),
        }
    }

    async fn get_from<T: DeserializeOwned>(
        &self,
        base: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", base, path);
        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let status = if reports_missing(&body) {
                debug!("{} reported a missing entry: {}", url, body);
                StatusCode::NOT_FOUND
            } else {
                status
            };
            return Err(DashboardError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        info!("Querying LCD: {}", path);
        match self.get_from(&self.primary, path, params).await {
            Ok(response) => {
                info!("LCD query successful on primary: {}", path);
                Ok(response)
            }
            // a 404 is an answer, not an outage
            Err(e) if is_not_found(&e) => Err(e),
            Err(e) => {
                warn!("Primary LCD failed ({}), trying secondary", e);
                match self.get_from(&self.secondary, path, params).await {
                    Ok(response) => {
                        info!("LCD query successful on secondary: {}", path);
                        Ok(response)
                    }
                    Err(e) => {
                        error!("Both LCDs failed for {}: {}", path, e);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Follows `pagination.next_key` until the list is exhausted.
    async fn get_all_pages<R, T, F>(&self, path: &str, split: F) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        F: Fn(R) -> (Vec<T>, Option<PageResponse>),
    {
        let mut all_items = Vec::new();
        let mut next_key: Option<String> = None;

        loop {
            let mut params = vec![("pagination.limit", PAGE_LIMIT.to_string())];
            if let Some(key) = &next_key {
                params.push(("pagination.key", key.clone()));
            }
            let response: R = self.get_json(path, &params).await?;
            let (items, page) = split(response);
            all_items.extend(items);

            match page.and_then(|p| p.next_key).filter(|k| !k.is_empty()) {
                Some(key) => next_key = Some(key),
                None => break,
            }
        }

        info!("Fetched {} items from {}", all_items.len(), path);
        Ok(all_items)
    }
}

#[async_trait]
impl ChainQuery for LcdClient {
    async fn account_exists(&self, address: &str) -> Result<bool> {
        let path = format!("/cosmos/auth/v1beta1/accounts/{}", address);
        match self.get_json::<Value>(&path, &[]).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn balance(&self, address: &str, denom: &str) -> Result<Coin> {
        let path = format!("/cosmos/bank/v1beta1/balances/{}/by_denom", address);
        let response: BalanceResponse = self
            .get_json(&path, &[("denom", denom.to_string())])
            .await?;
        Ok(response.balance)
    }

    async fn delegations(&self, delegator: &str) -> Result<Vec<DelegationResponse>> {
        let path = format!("/cosmos/staking/v1beta1/delegations/{}", delegator);
        self.get_all_pages(&path, |r: DelegationsResponse| {
            (r.delegation_responses, r.pagination)
        })
        .await
    }

    async fn unbonding_delegations(&self, delegator: &str) -> Result<Vec<UnbondingDelegation>> {
        let path = format!(
            "/cosmos/staking/v1beta1/delegators/{}/unbonding_delegations",
            delegator
        );
        self.get_all_pages(&path, |r: UnbondingResponse| {
            (r.unbonding_responses, r.pagination)
        })
        .await
    }

    async fn delegation(
        &self,
        delegator: &str,
        validator: &str,
    ) -> Result<Option<DelegationResponse>> {
        let path = format!(
            "/cosmos/staking/v1beta1/validators/{}/delegations/{}",
            validator, delegator
        );
        match self.get_json::<SingleDelegationResponse>(&path, &[]).await {
            Ok(response) => Ok(Some(response.delegation_response)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn validator(&self, operator_address: &str) -> Result<ChainValidator> {
        let path = format!("/cosmos/staking/v1beta1/validators/{}", operator_address);
        let response: ValidatorResponse = self.get_json(&path, &[]).await?;
        Ok(response.validator)
    }

    async fn validators(&self) -> Result<Vec<ChainValidator>> {
        self.get_all_pages("/cosmos/staking/v1beta1/validators", |r: ValidatorsResponse| {
            (r.validators, r.pagination)
        })
        .await
    }

    async fn staking_pool(&self) -> Result<StakingPool> {
        let response: PoolResponse = self.get_json("/cosmos/staking/v1beta1/pool", &[]).await?;
        Ok(response.pool)
    }

    async fn annual_provisions(&self) -> Result<f64> {
        let response: AnnualProvisionsResponse = self
            .get_json("/cosmos/mint/v1beta1/annual_provisions", &[])
            .await?;
        response
            .annual_provisions
            .parse()
            .map_err(|_| DashboardError::InvalidAmount(response.annual_provisions))
    }

    async fn validator_commission(&self, operator_address: &str) -> Result<Vec<Coin>> {
        let path = format!(
            "/cosmos/distribution/v1beta1/validators/{}/commission",
            operator_address
        );
        match self.get_json::<CommissionResponse>(&path, &[]).await {
            Ok(response) => Ok(response.commission.commission),
            // plain accounts have no commission record
            Err(e) if is_not_found(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn delegation_total_rewards(&self, delegator: &str) -> Result<Vec<Coin>> {
        let path = format!("/cosmos/distribution/v1beta1/delegators/{}/rewards", delegator);
        let response: TotalRewardsResponse = self.get_json(&path, &[]).await?;
        Ok(response.total)
    }

    async fn delegation_rewards(&self, delegator: &str, validator: &str) -> Result<Vec<Coin>> {
        let path = format!(
            "/cosmos/distribution/v1beta1/delegators/{}/rewards/{}",
            delegator, validator
        );
        match self.get_json::<RewardsResponse>(&path, &[]).await {
            Ok(response) => Ok(response.rewards),
            Err(e) if is_not_found(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn signing_info(&self, consensus_address: &str) -> Result<SigningInfo> {
        let path = format!("/cosmos/slashing/v1beta1/signing_infos/{}", consensus_address);
        let response: SigningInfoResponse = self.get_json(&path, &[]).await?;
        Ok(response.val_signing_info)
    }

    async fn proposals(&self) -> Result<Vec<Proposal>> {
        self.get_all_pages("/cosmos/gov/v1beta1/proposals", |r: ProposalsResponse| {
            (r.proposals, r.pagination)
        })
        .await
    }

    async fn voted_proposal_ids(&self, voter: &str) -> Result<Vec<u64>> {
        let mut proposal_ids = BTreeSet::new();
        let mut offset = 0;

        loop {
            let params = [
                ("events", format!("message.action='{}'", MSG_VOTE_TYPE)),
                ("events", format!("message.sender='{}'", voter)),
                ("pagination.offset", offset.to_string()),
                ("pagination.limit", PAGE_LIMIT.to_string()),
            ];
            let response: TxSearchResponse = self.get_json("/cosmos/tx/v1beta1/txs", &params).await?;
            let fetched = response.txs.len();
            proposal_ids.extend(
                response
                    .txs
                    .iter()
                    .flat_map(|tx| votes_in_tx(tx, voter)),
            );

            if fetched < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(proposal_ids.into_iter().collect())
    }

    async fn min_deposit(&self) -> Result<Vec<Coin>> {
        let response: DepositParamsResponse = self
            .get_json("/cosmos/gov/v1beta1/params/deposit", &[])
            .await?;
        Ok(response.deposit_params.min_deposit)
    }

    async fn latest_block(&self) -> Result<BlockHeader> {
        let response: BlockResponse = self
            .get_json("/cosmos/base/tendermint/v1beta1/blocks/latest", &[])
            .await?;
        Ok(response.block.header)
    }

    async fn block(&self, height: u64) -> Result<BlockHeader> {
        let path = format!("/cosmos/base/tendermint/v1beta1/blocks/{}", height);
        let response: BlockResponse = self.get_json(&path, &[]).await?;
        Ok(response.block.header)
    }

    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult> {
        let body = serde_json::json!({
            "tx_bytes": STANDARD.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.primary);
        info!("Broadcasting tx ({} bytes)", tx_bytes.len());
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let response: BroadcastResponse = response.json().await?;
        Ok(BroadcastResult {
            tx_hash: response.tx_response.txhash,
            code: response.tx_response.code,
            raw_log: response.tx_response.raw_log,
        })
    }

    async fn profile(&self, address: &str) -> Result<Option<Profile>> {
        let base = match &self.profile {
            Some(base) => base,
            None => return Ok(None),
        };
        let profile_address = translate_address(address, PROFILE_PREFIX)?;
        let url = format!("{}/desmos/profiles/v3/profiles/{}", base, profile_address);
        match self.get_from::<ProfileResponse>(&url, "", &[]).await {
            Ok(response) => Ok(Some(Profile {
                dtag: response.profile.dtag,
                nickname: response.profile.nickname,
                picture: Some(response.profile.pictures.profile).filter(|p| !p.is_empty()),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn votes_in_tx(tx: &Value, voter: &str) -> Vec<u64> {
    tx.pointer("/body/messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter(|m| m["@type"] == MSG_VOTE_TYPE && m["voter"] == voter)
                .filter_map(|m| m["proposal_id"].as_str().and_then(|id| id.parse().ok()))
                .collect()
        })
        .unwrap_or_default()
}
