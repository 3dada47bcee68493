use super::serde_helpers::{amount, u64_string};
use super::Coin;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondStatus {
    #[serde(rename = "BOND_STATUS_BONDED")]
    Bonded,
    #[serde(rename = "BOND_STATUS_UNBONDING")]
    Unbonding,
    #[serde(rename = "BOND_STATUS_UNBONDED")]
    Unbonded,
    #[serde(rename = "BOND_STATUS_UNSPECIFIED", other)]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKey {
    #[serde(rename = "@type")]
    pub type_url: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub moniker: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub security_contact: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub rate: String,
    #[serde(default)]
    pub max_rate: String,
    #[serde(default)]
    pub max_change_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub commission_rates: CommissionRates,
}

/// A validator as returned by the staking module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainValidator {
    pub operator_address: String,
    #[serde(default)]
    pub consensus_pubkey: Option<PubKey>,
    #[serde(default)]
    pub jailed: bool,
    pub status: BondStatus,
    #[serde(with = "amount")]
    pub tokens: BigInt,
    #[serde(default)]
    pub description: Description,
    pub commission: Commission,
}

impl ChainValidator {
    pub fn commission_rate(&self) -> f64 {
        self.commission
            .commission_rates
            .rate
            .parse()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationResponse {
    pub delegation: Delegation,
    pub balance: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    #[serde(with = "amount")]
    pub balance: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator_address: String,
    pub validator_address: String,
    #[serde(default)]
    pub entries: Vec<UnbondingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPool {
    #[serde(with = "amount")]
    pub not_bonded_tokens: BigInt,
    #[serde(with = "amount")]
    pub bonded_tokens: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInfo {
    pub address: String,
    #[serde(with = "u64_string", default)]
    pub start_height: u64,
    #[serde(with = "u64_string", default)]
    pub index_offset: u64,
    #[serde(default)]
    pub jailed_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tombstoned: bool,
    #[serde(with = "u64_string", default)]
    pub missed_blocks_counter: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[serde(rename = "PROPOSAL_STATUS_DEPOSIT_PERIOD")]
    DepositPeriod,
    #[serde(rename = "PROPOSAL_STATUS_VOTING_PERIOD")]
    VotingPeriod,
    #[serde(rename = "PROPOSAL_STATUS_PASSED")]
    Passed,
    #[serde(rename = "PROPOSAL_STATUS_REJECTED")]
    Rejected,
    #[serde(rename = "PROPOSAL_STATUS_FAILED")]
    Failed,
    #[serde(rename = "PROPOSAL_STATUS_UNSPECIFIED", other)]
    Invalid,
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(ProposalStatus::DepositPeriod),
            "voting" => Ok(ProposalStatus::VotingPeriod),
            "passed" => Ok(ProposalStatus::Passed),
            "rejected" => Ok(ProposalStatus::Rejected),
            "failed" => Ok(ProposalStatus::Failed),
            "invalid" => Ok(ProposalStatus::Invalid),
            other => Err(format!("unknown proposal status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteOption {
    Yes,
    No,
    NoWithVeto,
    Abstain,
}

/// Voting power behind each option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    #[serde(with = "amount", default)]
    pub yes: BigInt,
    #[serde(with = "amount", default)]
    pub abstain: BigInt,
    #[serde(with = "amount", default)]
    pub no: BigInt,
    #[serde(with = "amount", default)]
    pub no_with_veto: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(with = "u64_string")]
    pub proposal_id: u64,
    pub status: ProposalStatus,
    #[serde(default)]
    pub content: Option<ProposalContent>,
    #[serde(default)]
    pub final_tally_result: Option<TallyResult>,
    #[serde(default)]
    pub voting_end_time: Option<DateTime<Utc>>,
}

impl Proposal {
    /// The tally, when the proposal reached a vote. Proposals still in or
    /// dropped during the deposit period, and failed or invalid ones, have
    /// none worth showing.
    pub fn tally(&self) -> Option<&TallyResult> {
        match self.status {
            ProposalStatus::DepositPeriod | ProposalStatus::Failed | ProposalStatus::Invalid => None,
            _ => self.final_tally_result.as_ref(),
        }
    }

    pub fn title(&self) -> &str {
        self.content.as_ref().map_or("", |c| c.title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalContent {
    #[serde(rename = "@type", default)]
    pub type_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(with = "u64_string")]
    pub height: u64,
    pub time: DateTime<Utc>,
}

/// Optional social profile attached to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub dtag: String,
    pub nickname: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastResult {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
}
