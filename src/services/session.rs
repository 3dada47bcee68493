use crate::error::{DashboardError, Result};
use crate::models::Coin;
use crate::services::lcd_client::ChainQuery;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub address: String,
    pub balance: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected(Account),
}

/// The viewing wallet. Created once and shared by reference with every
/// query that needs to know who is looking.
pub struct WalletSession {
    denom: String,
    status: RwLock<ConnectionStatus>,
}

impl WalletSession {
    pub fn new(denom: &str) -> Self {
        Self {
            denom: denom.to_string(),
            status: RwLock::new(ConnectionStatus::Idle),
        }
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }

    pub async fn connected_account(&self) -> Option<Account> {
        match &*self.status.read().await {
            ConnectionStatus::Connected(account) => Some(account.clone()),
            _ => None,
        }
    }

    pub async fn connected_address(&self) -> Option<String> {
        self.connected_account().await.map(|a| a.address)
    }

    pub async fn connect(&self, chain: &dyn ChainQuery, address: &str) -> Result<Account> {
        *self.status.write().await = ConnectionStatus::Connecting;
        info!("Connecting wallet {}", address);

        match chain.balance(address, &self.denom).await {
            Ok(balance) => {
                let account = Account {
                    address: address.to_string(),
                    balance,
                };
                *self.status.write().await = ConnectionStatus::Connected(account.clone());
                Ok(account)
            }
            Err(e) => {
                warn!("Wallet connection failed: {}", e);
                *self.status.write().await = ConnectionStatus::Idle;
                Err(e)
            }
        }
    }

    pub async fn disconnect(&self) {
        *self.status.write().await = ConnectionStatus::Idle;
        info!("Wallet disconnected");
    }

    /// Re-reads the connected account's balance.
    pub async fn refresh_account(&self, chain: &dyn ChainQuery) -> Result<Account> {
        let address = self
            .connected_address()
            .await
            .ok_or(DashboardError::WalletNotConnected)?;
        let balance = chain.balance(&address, &self.denom).await?;

        let mut status = self.status.write().await;
        // the wallet may have been swapped while the balance was in flight
        match &mut *status {
            ConnectionStatus::Connected(account) if account.address == address => {
                account.balance = balance;
                Ok(account.clone())
            }
            _ => Err(DashboardError::WalletNotConnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake_chain::FakeChain;

    #[tokio::test]
    async fn connect_then_refresh() {
        let chain = FakeChain::new();
        let address = chain.add_account(1, 1_000);
        let session = WalletSession::new("uatom");

        assert_eq!(session.status().await, ConnectionStatus::Idle);
        let account = session.connect(&chain, &address).await.unwrap();
        assert_eq!(account.balance, Coin::new("uatom", 1_000));

        chain.set_balance(&address, 400);
        let refreshed = session.refresh_account(&chain).await.unwrap();
        assert_eq!(refreshed.balance, Coin::new("uatom", 400));
        assert_eq!(session.connected_address().await, Some(address));

        session.disconnect().await;
        assert!(session.connected_account().await.is_none());
    }

    #[tokio::test]
    async fn refresh_requires_connection() {
        let chain = FakeChain::new();
        let session = WalletSession::new("uatom");
        let err = session.refresh_account(&chain).await.unwrap_err();
        assert!(matches!(err, DashboardError::WalletNotConnected));
    }

    #[tokio::test]
    async fn failed_connect_returns_to_idle() {
        let chain = FakeChain::new();
        chain.fail("balance");
        let session = WalletSession::new("uatom");
        assert!(session.connect(&chain, "cosmos1nobody").await.is_err());
        assert_eq!(session.status().await, ConnectionStatus::Idle);
    }
}
