use super::{BondStatus, Coin, Description};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validator {
    pub operator_address: String,
    pub jailed: bool,
    pub status: BondStatus,
    pub description: Description,
    pub voting_power: f64,
    pub uptime: f64,
    pub expected_return: f64,
    pub participated_proposal_count: usize,
    pub relative_total_proposal_count: usize,
}

impl Validator {
    /// Participated ÷ relative total; 0 when the validator has not been
    /// active during any proposal.
    pub fn participation_ratio(&self) -> f64 {
        if self.relative_total_proposal_count == 0 {
            return 0.0;
        }
        self.participated_proposal_count as f64 / self.relative_total_proposal_count as f64
    }

    pub fn is_active(&self) -> bool {
        !self.jailed && self.status == BondStatus::Bonded
    }
}

/// The viewing wallet's position with a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YourStake {
    pub balance: Coin,
    pub shares: String,
    pub reward: Coin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedValidator {
    pub validator: Validator,
    pub stake: Option<YourStake>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorScreenModel {
    pub aggregated_validators: Vec<AggregatedValidator>,
}
