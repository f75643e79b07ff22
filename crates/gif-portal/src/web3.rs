//! Public port. Callers depend on this instead of the Solana port so the
//! ledger technology can change behind it.

use crate::error::PortError;
use crate::ledger::LedgerClient;
use crate::solana::SolanaPort;
use crate::wallet::WalletCapability;

pub use crate::types::{Account, GifItem};

pub struct Web3<W, L> {
    port: SolanaPort<W, L>,
}

impl<W: WalletCapability, L: LedgerClient> Web3<W, L> {
    pub fn new(port: SolanaPort<W, L>) -> Self {
        Self { port }
    }

    pub async fn get_base_account_data(&self) -> Result<Account, PortError> {
        self.port.get_base_account_data().await
    }

    pub async fn startup(&self) {
        self.port.startup().await
    }

    pub async fn get_address_if_is_trusted(&self) -> String {
        self.port.get_address_if_is_trusted().await
    }

    pub async fn get_wallet_address(&self, trusted_only: bool) -> String {
        self.port.get_wallet_address(trusted_only).await
    }

    pub async fn add_gif_to_blockchain(&self, link: &str) {
        self.port.add_gif_to_blockchain(link).await
    }

    /// The underlying port, for its `try_*` operations.
    pub fn port(&self) -> &SolanaPort<W, L> {
        &self.port
    }
}

impl<W, L> From<SolanaPort<W, L>> for Web3<W, L> {
    fn from(port: SolanaPort<W, L>) -> Self {
        Self { port }
    }
}
