use crate::models::{Proposal, TallyResult, VoteOption};
use chrono::{DateTime, Utc};
use log::debug;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

fn ratio(numerator: &BigInt, denominator: &BigInt) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    let n = numerator.to_f64().unwrap_or(0.0);
    let d = denominator.to_f64().unwrap_or(f64::INFINITY);
    n / d
}

/// Share of the bonded pool held by a validator.
pub fn calculate_voting_power(tokens: &BigInt, bonded_tokens: &BigInt) -> f64 {
    ratio(tokens, bonded_tokens)
}

/// Projected annual yield for a delegator: the yearly inflation spread over
/// the bonded pool, less the validator's commission.
pub fn calculate_expected_return(
    annual_provisions: f64,
    bonded_tokens: &BigInt,
    commission_rate: f64,
) -> f64 {
    let bonded = bonded_tokens.to_f64().unwrap_or(0.0);
    if bonded <= 0.0 {
        return 0.0;
    }
    let expected_return = annual_provisions / bonded * (1.0 - commission_rate);
    debug!(
        "Expected return - provisions: {}, bonded: {}, commission: {}, result: {}",
        annual_provisions, bonded, commission_rate, expected_return
    );
    expected_return
}

/// Fraction of blocks signed since `start_height`. A validator with no
/// blocks behind it yet counts as fully up.
pub fn calculate_uptime(start_height: u64, missed_blocks: u64, current_height: u64) -> f64 {
    let expected_blocks = current_height.saturating_sub(start_height);
    if expected_blocks == 0 {
        return 1.0;
    }
    let signed = expected_blocks.saturating_sub(missed_blocks);
    (signed as f64 / expected_blocks as f64).clamp(0.0, 1.0)
}

/// Proposals a validator is judged against. With no start time (signing
/// since genesis) that is every proposal; otherwise only those whose voting
/// ended strictly after the validator started signing.
pub fn relative_proposals(
    proposals: &[Proposal],
    start_time: Option<DateTime<Utc>>,
) -> Vec<&Proposal> {
    match start_time {
        None => proposals.iter().collect(),
        Some(start) => proposals
            .iter()
            .filter(|p| p.voting_end_time.map_or(false, |end| end > start))
            .collect(),
    }
}

/// The option with the most voting power. Ties go to the earlier of yes,
/// no, no-with-veto, abstain; a tally where all four are equal (including
/// an empty one) has no outstanding option.
pub fn outstanding_option(tally: &TallyResult) -> Option<VoteOption> {
    let options = [
        (VoteOption::Yes, &tally.yes),
        (VoteOption::No, &tally.no),
        (VoteOption::NoWithVeto, &tally.no_with_veto),
        (VoteOption::Abstain, &tally.abstain),
    ];
    if options.iter().all(|(_, votes)| *votes == &tally.yes) {
        return None;
    }

    let mut outstanding = None;
    let mut most = BigInt::zero();
    for (option, votes) in options {
        if *votes > most {
            outstanding = Some(option);
            most = votes.clone();
        }
    }
    outstanding
}
