use crate::models::{AggregatedValidator, Coin, StakedValidatorInfo};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnOrder {
    pub id: String,
    pub direction: SortDirection,
}

impl ColumnOrder {
    pub fn new(id: &str, direction: SortDirection) -> Self {
        Self {
            id: id.to_string(),
            direction,
        }
    }
}

/// Case-insensitive code point order. No collation: accented initials
/// sort after plain ASCII ones.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn stake_amount(coin: Option<&Coin>) -> BigInt {
    coin.map(|c| c.amount.clone()).unwrap_or_else(BigInt::zero)
}

/// Returns `stakes` ordered by `order`. Unknown column ids keep the input order.
pub fn sort_stakes(stakes: &[StakedValidatorInfo], order: &ColumnOrder) -> Vec<StakedValidatorInfo> {
    let mut sorted = stakes.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = match order.id.as_str() {
            "name" => compare_names(
                &a.validator.description.moniker,
                &b.validator.description.moniker,
            ),
            "staked" => a.balance.amount.cmp(&b.balance.amount),
            "rewards" => a.reward.amount.cmp(&b.reward.amount),
            "expectedReturns" => a.expected_return.total_cmp(&b.expected_return),
            "votingPower" => a.voting_power.total_cmp(&b.voting_power),
            _ => Ordering::Equal,
        };
        order.direction.apply(ordering)
    });
    sorted
}

/// Returns `validators` ordered by `order`. Unknown column ids (including
/// the empty default) order jailed validators last.
pub fn sort_validators(
    validators: &[AggregatedValidator],
    order: &ColumnOrder,
) -> Vec<AggregatedValidator> {
    let mut sorted = validators.to_vec();
    sorted.sort_by(|a, b| {
        let (va, vb) = (&a.validator, &b.validator);
        let ordering = match order.id.as_str() {
            "name" => compare_names(&va.description.moniker, &vb.description.moniker),
            "votingPower" => va.voting_power.total_cmp(&vb.voting_power),
            "staked" => stake_amount(a.stake.as_ref().map(|s| &s.balance))
                .cmp(&stake_amount(b.stake.as_ref().map(|s| &s.balance))),
            "rewards" => stake_amount(a.stake.as_ref().map(|s| &s.reward))
                .cmp(&stake_amount(b.stake.as_ref().map(|s| &s.reward))),
            "expectedReturns" => va.expected_return.total_cmp(&vb.expected_return),
            "participations" => va
                .participation_ratio()
                .total_cmp(&vb.participation_ratio()),
            "uptime" => va.uptime.total_cmp(&vb.uptime),
            _ => va.jailed.cmp(&vb.jailed),
        };
        order.direction.apply(ordering)
    });
    sorted
}

/// `items[offset .. min(offset + page_size, len)]`; empty past the end.
pub fn paginate<T>(items: &[T], offset: usize, page_size: usize) -> &[T] {
    let start = offset.min(items.len());
    let end = offset.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Offset of a 1-based page number. Page 0 is treated as the first page;
/// pages too far out land past any list and paginate to nothing.
pub fn page_to_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1).saturating_mul(page_size)
}

pub fn offset_to_page(offset: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    offset / page_size + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidatorFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl FromStr for ValidatorFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ValidatorFilter::All),
            "active" => Ok(ValidatorFilter::Active),
            "inactive" => Ok(ValidatorFilter::Inactive),
            other => Err(format!("unknown validator filter: {}", other)),
        }
    }
}

pub fn filter_validators(
    validators: &[AggregatedValidator],
    filter: ValidatorFilter,
) -> Vec<AggregatedValidator> {
    validators
        .iter()
        .filter(|v| match filter {
            ValidatorFilter::All => true,
            ValidatorFilter::Active => v.validator.is_active(),
            ValidatorFilter::Inactive => v.validator.jailed,
        })
        .cloned()
        .collect()
}
