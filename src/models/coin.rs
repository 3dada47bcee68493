use super::serde_helpers::amount;
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount")]
    pub amount: BigInt,
}

impl Coin {
    pub fn new(denom: &str, amount: impl Into<BigInt>) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.into(),
        }
    }

    pub fn zero(denom: &str) -> Self {
        Self::new(denom, BigInt::zero())
    }

    /// Sums the amounts of `coins` matching `denom`; other denoms are ignored.
    pub fn sum_of<'a>(denom: &str, coins: impl IntoIterator<Item = &'a Coin>) -> Self {
        let amount = coins
            .into_iter()
            .filter(|c| c.denom == denom)
            .fold(BigInt::zero(), |acc, c| acc + &c.amount);
        Self::new(denom, amount)
    }
}
