//! In-memory chain used by the aggregation tests.

use crate::error::{DashboardError, Result};
use crate::models::{
    BlockHeader, BondStatus, BroadcastResult, ChainValidator, Coin, Commission, CommissionRates,
    Delegation, DelegationResponse, Description, Profile, Proposal, ProposalContent,
    ProposalStatus, PubKey, SigningInfo, StakingPool, TallyResult, UnbondingDelegation,
    UnbondingEntry,
};
use crate::services::lcd_client::ChainQuery;
use crate::utils::address::{encode_test_address, pubkey_to_bech32};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const DENOM: &str = "uatom";

#[derive(Default)]
struct State {
    accounts: HashSet<String>,
    balances: HashMap<String, BigInt>,
    delegations: HashMap<String, Vec<DelegationResponse>>,
    unbondings: HashMap<String, Vec<UnbondingDelegation>>,
    validators: Vec<ChainValidator>,
    consensus_by_operator: HashMap<String, String>,
    signing_infos: HashMap<String, SigningInfo>,
    bonded_override: Option<BigInt>,
    annual_provisions: f64,
    commissions: HashMap<String, BigInt>,
    rewards: HashMap<(String, String), BigInt>,
    proposals: Vec<Proposal>,
    votes: HashMap<String, Vec<u64>>,
    blocks: HashMap<u64, DateTime<Utc>>,
    height: u64,
    min_deposit: Vec<Coin>,
    broadcasts: Vec<Vec<u8>>,
    broadcast_code: u32,
    profiles: HashMap<String, Profile>,
    failing: HashSet<&'static str>,
}

pub struct FakeChain {
    state: Mutex<State>,
}

impl FakeChain {
    pub fn new() -> Self {
        let state = State {
            annual_provisions: 1_000.0,
            height: 1_000,
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn fail(&self, method: &'static str) {
        self.state.lock().unwrap().failing.insert(method);
    }

    fn check(&self, method: &'static str) -> Result<()> {
        if self.state.lock().unwrap().failing.contains(method) {
            return Err(DashboardError::Status {
                url: format!("fake://{}", method),
                status: 500,
            });
        }
        Ok(())
    }

    fn not_found(what: &str) -> DashboardError {
        DashboardError::Status {
            url: format!("fake://{}", what),
            status: 404,
        }
    }

    pub fn add_account(&self, seed: u8, balance: u64) -> String {
        let address = encode_test_address("cosmos", seed);
        let mut state = self.state.lock().unwrap();
        state.accounts.insert(address.clone());
        state.balances.insert(address.clone(), BigInt::from(balance));
        address
    }

    pub fn set_balance(&self, address: &str, balance: u64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(address.to_string(), BigInt::from(balance));
    }

    /// Adds a bonded (or jailed) validator signing since genesis and
    /// returns its operator address.
    pub fn add_validator(&self, seed: u8, moniker: &str, tokens: u64, commission: &str, jailed: bool) -> String {
        let operator = encode_test_address("cosmosvaloper", seed);
        let pubkey = PubKey {
            type_url: "/cosmos.crypto.ed25519.PubKey".to_string(),
            key: STANDARD.encode([seed; 32]),
        };
        let consensus = pubkey_to_bech32(&pubkey, "cosmosvalcons").unwrap();
        let validator = ChainValidator {
            operator_address: operator.clone(),
            consensus_pubkey: Some(pubkey),
            jailed,
            status: if jailed {
                BondStatus::Unbonding
            } else {
                BondStatus::Bonded
            },
            tokens: BigInt::from(tokens),
            description: Description {
                moniker: moniker.to_string(),
                ..Default::default()
            },
            commission: Commission {
                commission_rates: CommissionRates {
                    rate: commission.to_string(),
                    max_rate: "1.0".to_string(),
                    max_change_rate: "0.1".to_string(),
                },
            },
        };

        let mut state = self.state.lock().unwrap();
        state.signing_infos.insert(
            consensus.clone(),
            SigningInfo {
                address: consensus.clone(),
                start_height: 0,
                index_offset: 0,
                jailed_until: None,
                tombstoned: false,
                missed_blocks_counter: 0,
            },
        );
        state.consensus_by_operator.insert(operator.clone(), consensus);
        state.validators.push(validator);
        operator
    }

    pub fn remove_consensus_key(&self, operator: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(v) = state
            .validators
            .iter_mut()
            .find(|v| v.operator_address == operator)
        {
            v.consensus_pubkey = None;
        }
    }

    pub fn set_signing(&self, operator: &str, start_height: u64, missed_blocks: u64) {
        let mut state = self.state.lock().unwrap();
        let consensus = state.consensus_by_operator[operator].clone();
        if let Some(info) = state.signing_infos.get_mut(&consensus) {
            info.start_height = start_height;
            info.missed_blocks_counter = missed_blocks;
        }
    }

    pub fn add_block(&self, height: u64, unix_secs: i64) {
        self.state
            .lock()
            .unwrap()
            .blocks
            .insert(height, Utc.timestamp_opt(unix_secs, 0).unwrap());
    }

    pub fn set_height(&self, height: u64) {
        self.state.lock().unwrap().height = height;
    }

    pub fn set_bonded(&self, bonded: u64) {
        self.state.lock().unwrap().bonded_override = Some(BigInt::from(bonded));
    }

    pub fn set_annual_provisions(&self, provisions: f64) {
        self.state.lock().unwrap().annual_provisions = provisions;
    }

    pub fn delegate(&self, delegator: &str, operator: &str, amount: u64, reward: u64) {
        let mut state = self.state.lock().unwrap();
        state
            .delegations
            .entry(delegator.to_string())
            .or_default()
            .push(DelegationResponse {
                delegation: Delegation {
                    delegator_address: delegator.to_string(),
                    validator_address: operator.to_string(),
                    shares: format!("{}.000000000000000000", amount),
                },
                balance: Coin::new(DENOM, amount),
            });
        state.rewards.insert(
            (delegator.to_string(), operator.to_string()),
            BigInt::from(reward),
        );
    }

    pub fn add_unbonding(&self, delegator: &str, operator: &str, amounts: &[u64]) {
        self.state
            .lock()
            .unwrap()
            .unbondings
            .entry(delegator.to_string())
            .or_default()
            .push(UnbondingDelegation {
                delegator_address: delegator.to_string(),
                validator_address: operator.to_string(),
                entries: amounts
                    .iter()
                    .map(|a| UnbondingEntry {
                        balance: BigInt::from(*a),
                    })
                    .collect(),
            });
    }

    pub fn set_commission(&self, operator: &str, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .commissions
            .insert(operator.to_string(), BigInt::from(amount));
    }

    pub fn add_proposal(&self, id: u64, voting_end_unix: Option<i64>) {
        self.state.lock().unwrap().proposals.push(Proposal {
            proposal_id: id,
            status: ProposalStatus::Passed,
            content: None,
            final_tally_result: None,
            voting_end_time: voting_end_unix.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
        });
    }

    /// Gives proposal `id` a title, a status and a final tally of
    /// yes / no / no-with-veto / abstain.
    pub fn set_outcome(&self, id: u64, title: &str, status: ProposalStatus, tally: [u64; 4]) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.proposals.iter_mut().find(|p| p.proposal_id == id) {
            p.status = status;
            p.content = Some(ProposalContent {
                type_url: "/cosmos.gov.v1beta1.TextProposal".to_string(),
                title: title.to_string(),
                description: String::new(),
            });
            p.final_tally_result = Some(TallyResult {
                yes: BigInt::from(tally[0]),
                no: BigInt::from(tally[1]),
                no_with_veto: BigInt::from(tally[2]),
                abstain: BigInt::from(tally[3]),
            });
        }
    }

    pub fn add_vote(&self, voter: &str, proposal_id: u64) {
        self.state
            .lock()
            .unwrap()
            .votes
            .entry(voter.to_string())
            .or_default()
            .push(proposal_id);
    }

    pub fn set_min_deposit(&self, amount: u64) {
        self.state.lock().unwrap().min_deposit = vec![Coin::new(DENOM, amount)];
    }

    pub fn set_broadcast_code(&self, code: u32) {
        self.state.lock().unwrap().broadcast_code = code;
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    pub fn set_profile(&self, address: &str, profile: Profile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(address.to_string(), profile);
    }
}

#[async_trait]
impl ChainQuery for FakeChain {
    async fn account_exists(&self, address: &str) -> Result<bool> {
        self.check("account_exists")?;
        Ok(self.state.lock().unwrap().accounts.contains(address))
    }

    async fn balance(&self, address: &str, denom: &str) -> Result<Coin> {
        self.check("balance")?;
        let state = self.state.lock().unwrap();
        let amount = state.balances.get(address).cloned().unwrap_or_else(BigInt::zero);
        Ok(Coin::new(denom, amount))
    }

    async fn delegations(&self, delegator: &str) -> Result<Vec<DelegationResponse>> {
        self.check("delegations")?;
        let state = self.state.lock().unwrap();
        Ok(state.delegations.get(delegator).cloned().unwrap_or_default())
    }

    async fn unbonding_delegations(&self, delegator: &str) -> Result<Vec<UnbondingDelegation>> {
        self.check("unbonding_delegations")?;
        let state = self.state.lock().unwrap();
        Ok(state.unbondings.get(delegator).cloned().unwrap_or_default())
    }

    async fn delegation(
        &self,
        delegator: &str,
        validator: &str,
    ) -> Result<Option<DelegationResponse>> {
        self.check("delegation")?;
        let state = self.state.lock().unwrap();
        Ok(state.delegations.get(delegator).and_then(|ds| {
            ds.iter()
                .find(|d| d.delegation.validator_address == validator)
                .cloned()
        }))
    }

    async fn validator(&self, operator_address: &str) -> Result<ChainValidator> {
        self.check("validator")?;
        let state = self.state.lock().unwrap();
        state
            .validators
            .iter()
            .find(|v| v.operator_address == operator_address)
            .cloned()
            .ok_or_else(|| Self::not_found(operator_address))
    }

    async fn validators(&self) -> Result<Vec<ChainValidator>> {
        self.check("validators")?;
        Ok(self.state.lock().unwrap().validators.clone())
    }

    async fn staking_pool(&self) -> Result<StakingPool> {
        self.check("staking_pool")?;
        let state = self.state.lock().unwrap();
        let bonded_tokens = state.bonded_override.clone().unwrap_or_else(|| {
            state
                .validators
                .iter()
                .fold(BigInt::zero(), |acc, v| acc + &v.tokens)
        });
        Ok(StakingPool {
            not_bonded_tokens: BigInt::zero(),
            bonded_tokens,
        })
    }

    async fn annual_provisions(&self) -> Result<f64> {
        self.check("annual_provisions")?;
        Ok(self.state.lock().unwrap().annual_provisions)
    }

    async fn validator_commission(&self, operator_address: &str) -> Result<Vec<Coin>> {
        self.check("validator_commission")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .commissions
            .get(operator_address)
            .map(|a| vec![Coin::new(DENOM, a.clone())])
            .unwrap_or_default())
    }

    async fn delegation_total_rewards(&self, delegator: &str) -> Result<Vec<Coin>> {
        self.check("delegation_total_rewards")?;
        let state = self.state.lock().unwrap();
        let total = state
            .rewards
            .iter()
            .filter(|((d, _), _)| d == delegator)
            .fold(BigInt::zero(), |acc, (_, r)| acc + r);
        Ok(vec![Coin::new(DENOM, total)])
    }

    async fn delegation_rewards(&self, delegator: &str, validator: &str) -> Result<Vec<Coin>> {
        self.check("delegation_rewards")?;
        let state = self.state.lock().unwrap();
        // like distribution on a live chain, asking without a delegation fails
        state
            .rewards
            .get(&(delegator.to_string(), validator.to_string()))
            .map(|r| vec![Coin::new(DENOM, r.clone())])
            .ok_or_else(|| DashboardError::Status {
                url: format!("fake://delegation_rewards/{}/{}", delegator, validator),
                status: 500,
            })
    }

    async fn signing_info(&self, consensus_address: &str) -> Result<SigningInfo> {
        self.check("signing_info")?;
        let state = self.state.lock().unwrap();
        state
            .signing_infos
            .get(consensus_address)
            .cloned()
            .ok_or_else(|| Self::not_found(consensus_address))
    }

    async fn proposals(&self) -> Result<Vec<Proposal>> {
        self.check("proposals")?;
        Ok(self.state.lock().unwrap().proposals.clone())
    }

    async fn voted_proposal_ids(&self, voter: &str) -> Result<Vec<u64>> {
        self.check("voted_proposal_ids")?;
        let state = self.state.lock().unwrap();
        Ok(state.votes.get(voter).cloned().unwrap_or_default())
    }

    async fn min_deposit(&self) -> Result<Vec<Coin>> {
        self.check("min_deposit")?;
        Ok(self.state.lock().unwrap().min_deposit.clone())
    }

    async fn latest_block(&self) -> Result<BlockHeader> {
        self.check("latest_block")?;
        let height = self.state.lock().unwrap().height;
        Ok(BlockHeader {
            height,
            time: Utc.timestamp_opt(height as i64 * 6, 0).unwrap(),
        })
    }

    async fn block(&self, height: u64) -> Result<BlockHeader> {
        self.check("block")?;
        let state = self.state.lock().unwrap();
        state
            .blocks
            .get(&height)
            .map(|time| BlockHeader {
                height,
                time: *time,
            })
            .ok_or_else(|| Self::not_found("block"))
    }

    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult> {
        self.check("broadcast_tx")?;
        let mut state = self.state.lock().unwrap();
        state.broadcasts.push(tx_bytes.to_vec());
        Ok(BroadcastResult {
            tx_hash: format!("{:064X}", state.broadcasts.len()),
            code: state.broadcast_code,
            raw_log: if state.broadcast_code == 0 {
                String::new()
            } else {
                "insufficient fees".to_string()
            },
        })
    }

    async fn profile(&self, address: &str) -> Result<Option<Profile>> {
        self.check("profile")?;
        Ok(self.state.lock().unwrap().profiles.get(address).cloned())
    }
}
