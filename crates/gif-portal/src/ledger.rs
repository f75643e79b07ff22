use async_trait::async_trait;

use crate::error::PortError;

/// State of one on-chain account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Program that owns the account.
    pub owner: [u8; 32],
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// Remote access to the ledger. Every method is one round trip; none retry.
#[async_trait(?Send)]
pub trait LedgerClient {
    /// `None` when no account exists at `address`.
    async fn get_account(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, PortError>;

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], PortError>;

    /// Submit a fully signed wire-format transaction. Returns its signature.
    async fn send_transaction(&self, wire_tx: &[u8]) -> Result<String, PortError>;
}
