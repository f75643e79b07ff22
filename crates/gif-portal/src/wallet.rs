//! The wallet capability the port is given at construction.
//!
//! In a browser this wraps the injected wallet object; [`LocalWallet`]
//! backs it with a key pair for headless use.

use std::cell::Cell;
use std::fmt;

use async_trait::async_trait;
use chain_sol::Keypair;
use serde::{Deserialize, Serialize};

use crate::error::PortError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Never prompt; fail unless the user trusted this site before.
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    pub fn trusted_only() -> Self {
        Self {
            only_if_trusted: true,
        }
    }
}

/// The public identity a wallet reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    address: String,
}

impl Identity {
    /// Wrap the wallet's string form of its public key.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn from_pubkey(pubkey: &[u8; 32]) -> Self {
        Self::new(chain_sol::bytes_to_address(pubkey))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Raw key bytes, needed to place the wallet in a transaction.
    pub fn pubkey(&self) -> Result<[u8; 32], PortError> {
        chain_sol::address_to_bytes(&self.address)
            .map_err(|e| PortError::Signing(format!("wallet identity: {e}")))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// A user-controlled signing identity.
#[async_trait(?Send)]
pub trait WalletCapability {
    /// Compatibility gate (the `isPhantom` flag of browser wallets).
    fn is_compatible(&self) -> bool;

    /// Identity of the current connection, if any.
    fn identity(&self) -> Option<Identity>;

    async fn connect(&self, options: ConnectOptions) -> Result<Identity, PortError>;

    /// Add the wallet's signature to a wire-format transaction and return it.
    async fn sign_transaction(&self, wire_tx: Vec<u8>) -> Result<Vec<u8>, PortError>;
}

/// A wallet backed by a local key pair. It never prompts, so every connect
/// succeeds.
pub struct LocalWallet {
    keypair: Keypair,
    connected: Cell<bool>,
}

impl LocalWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: Cell::new(false),
        }
    }
}

#[async_trait(?Send)]
impl WalletCapability for LocalWallet {
    fn is_compatible(&self) -> bool {
        true
    }

    fn identity(&self) -> Option<Identity> {
        self.connected
            .get()
            .then(|| Identity::from_pubkey(&self.keypair.pubkey()))
    }

    async fn connect(&self, _options: ConnectOptions) -> Result<Identity, PortError> {
        self.connected.set(true);
        Ok(Identity::from_pubkey(&self.keypair.pubkey()))
    }

    async fn sign_transaction(&self, wire_tx: Vec<u8>) -> Result<Vec<u8>, PortError> {
        if !self.connected.get() {
            return Err(PortError::WalletNotConnected);
        }
        Ok(self.keypair.sign_raw_transaction(&wire_tx)?)
    }
}
