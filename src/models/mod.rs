mod chain;
mod coin;
mod portfolio;
mod request_state;
pub mod serde_helpers;
mod validator;

pub use chain::{
    BlockHeader, BondStatus, BroadcastResult, ChainValidator, Commission, CommissionRates,
    Delegation, DelegationResponse, Description, Profile, Proposal, ProposalContent,
    ProposalStatus, PubKey, SigningInfo, StakingPool, TallyResult, UnbondingDelegation,
    UnbondingEntry, VoteOption,
};
pub use coin::Coin;
pub use portfolio::{Portfolio, PortfolioModel, StakedValidatorInfo};
pub use request_state::RequestState;
pub use validator::{AggregatedValidator, Validator, ValidatorScreenModel, YourStake};
