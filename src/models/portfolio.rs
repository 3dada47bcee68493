use super::{ChainValidator, Coin, Delegation, Profile};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub address: String,
    pub balance: Coin,
    pub available_balance: Coin,
    pub staked_balance: Coin,
    pub unstaking_balance: Coin,
    pub commission: Coin,
    pub reward: Coin,
    pub profile: Option<Profile>,
}

impl Portfolio {
    /// Builds a snapshot whose total balance is always
    /// available + staked + unstaking, in the available balance's denom.
    pub fn new(
        address: String,
        available_balance: Coin,
        staked_balance: Coin,
        unstaking_balance: Coin,
        commission: Coin,
        reward: Coin,
    ) -> Self {
        let balance = Coin::new(
            &available_balance.denom,
            &available_balance.amount + &staked_balance.amount + &unstaking_balance.amount,
        );
        Self {
            address,
            balance,
            available_balance,
            staked_balance,
            unstaking_balance,
            commission,
            reward,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
        self.profile = profile;
        self
    }
}

/// One delegation of the viewed address, merged with its reward and the
/// delegated-to validator's derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakedValidatorInfo {
    pub delegation: Delegation,
    pub balance: Coin,
    pub reward: Coin,
    pub validator: ChainValidator,
    pub expected_return: f64,
    pub voting_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioModel {
    pub portfolio: Portfolio,
    pub stakes: Vec<StakedValidatorInfo>,
}
