use crate::error::{DashboardError, Result};
use crate::models::{BroadcastResult, Coin, Proposal, ProposalStatus, TallyResult, VoteOption};
use crate::services::lcd_client::ChainQuery;
use crate::services::metrics::outstanding_option;
use crate::services::session::WalletSession;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::Serialize;

pub const TEXT_PROPOSAL_TYPE: &str = "/cosmos.gov.v1beta1.TextProposal";
pub const MSG_SUBMIT_PROPOSAL_TYPE: &str = "/cosmos.gov.v1beta1.MsgSubmitProposal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProposal {
    pub title: String,
    pub description: String,
    pub deposit: BigInt,
    pub memo: Option<String>,
}

impl CreateProposal {
    /// Checks the form against the proposer's spendable balance.
    pub fn validate(&self, available: &Coin) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DashboardError::InvalidProposal("title is empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(DashboardError::InvalidProposal(
                "description is empty".to_string(),
            ));
        }
        if self.deposit <= BigInt::zero() {
            return Err(DashboardError::InvalidProposal(
                "deposit must be positive".to_string(),
            ));
        }
        if self.deposit > available.amount {
            return Err(DashboardError::InsufficientBalance {
                needed: self.deposit.to_string(),
                available: available.amount.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextProposal {
    #[serde(rename = "@type")]
    pub type_url: &'static str,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MsgSubmitProposal {
    #[serde(rename = "@type")]
    pub type_url: &'static str,
    pub content: TextProposal,
    pub initial_deposit: Vec<Coin>,
    pub proposer: String,
}

impl MsgSubmitProposal {
    pub fn text(proposer: &str, form: &CreateProposal, denom: &str) -> Self {
        Self {
            type_url: MSG_SUBMIT_PROPOSAL_TYPE,
            content: TextProposal {
                type_url: TEXT_PROPOSAL_TYPE,
                title: form.title.clone(),
                description: form.description.clone(),
            },
            initial_deposit: vec![Coin::new(denom, form.deposit.clone())],
            proposer: proposer.to_string(),
        }
    }
}

/// Turns an unsigned message into broadcastable tx bytes. Key custody lives
/// with the implementor.
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn sign(&self, msg: &MsgSubmitProposal, memo: Option<&str>) -> Result<Vec<u8>>;
}

/// One row of the proposal list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalView {
    pub proposal_id: u64,
    pub status: ProposalStatus,
    pub title: String,
    pub voting_end_time: Option<DateTime<Utc>>,
    pub tally: Option<TallyResult>,
    pub outstanding_option: Option<VoteOption>,
}

impl From<&Proposal> for ProposalView {
    fn from(proposal: &Proposal) -> Self {
        let tally = proposal.tally().cloned();
        Self {
            proposal_id: proposal.proposal_id,
            status: proposal.status,
            title: proposal.title().to_string(),
            voting_end_time: proposal.voting_end_time,
            outstanding_option: tally.as_ref().and_then(outstanding_option),
            tally,
        }
    }
}

/// Proposals with `status`, or all of them, newest first.
pub fn filter_proposals(
    proposals: &[Proposal],
    status: Option<ProposalStatus>,
) -> Vec<ProposalView> {
    let mut views: Vec<ProposalView> = proposals
        .iter()
        .filter(|p| status.map_or(true, |s| p.status == s))
        .map(ProposalView::from)
        .collect();
    views.sort_by(|a, b| b.proposal_id.cmp(&a.proposal_id));
    views
}

pub async fn list_proposals(
    chain: &dyn ChainQuery,
    status: Option<ProposalStatus>,
) -> Result<Vec<ProposalView>> {
    let proposals = chain.proposals().await?;
    let views = filter_proposals(&proposals, status);
    debug!("{} of {} proposals listed", views.len(), proposals.len());
    Ok(views)
}

pub async fn min_deposit(chain: &dyn ChainQuery, denom: &str) -> Result<Coin> {
    let deposits = chain.min_deposit().await?;
    Ok(Coin::sum_of(denom, &deposits))
}

/// Validates `form` for the connected wallet and builds the unsigned message.
pub async fn prepare_proposal(
    chain: &dyn ChainQuery,
    session: &WalletSession,
    form: &CreateProposal,
) -> Result<MsgSubmitProposal> {
    let account = session
        .connected_account()
        .await
        .ok_or(DashboardError::WalletNotConnected)?;
    form.validate(&account.balance)?;

    let minimum = min_deposit(chain, &account.balance.denom).await?;
    if form.deposit < minimum.amount {
        warn!(
            "Deposit {} is below the minimum {}; proposal will wait in the deposit period",
            form.deposit, minimum.amount
        );
    }
    Ok(MsgSubmitProposal::text(
        &account.address,
        form,
        &account.balance.denom,
    ))
}

pub async fn broadcast_signed(chain: &dyn ChainQuery, tx_bytes: &[u8]) -> Result<BroadcastResult> {
    let result = chain.broadcast_tx(tx_bytes).await?;
    if result.code != 0 {
        return Err(DashboardError::Broadcast {
            code: result.code,
            log: result.raw_log,
        });
    }
    info!("Broadcast accepted: {}", result.tx_hash);
    Ok(result)
}

/// Signs and broadcasts a text proposal from the connected wallet, then
/// refreshes its balance. Returns the tx hash.
pub async fn submit_proposal(
    chain: &dyn ChainQuery,
    session: &WalletSession,
    signer: &dyn TxSigner,
    form: &CreateProposal,
) -> Result<String> {
    let msg = prepare_proposal(chain, session, form).await?;
    let tx_bytes = signer.sign(&msg, form.memo.as_deref()).await?;
    let result = broadcast_signed(chain, &tx_bytes).await?;

    if let Err(e) = session.refresh_account(chain).await {
        warn!("Could not refresh account after broadcast: {}", e);
    }
    Ok(result.tx_hash)
}
