use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Invalid address")]
    InvalidAddress,

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("bech32 error: {0}")]
    Bech32(#[from] bech32::Error),

    #[error("invalid public key: {0}")]
    InvalidPubKey(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: String, available: String },

    #[error("broadcast failed with code {code}: {log}")]
    Broadcast { code: u32, log: String },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("Unknown error")]
    Unknown,
}

pub type Result<T> = std::result::Result<T, DashboardError>;
