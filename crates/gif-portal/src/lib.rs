//! Client-side port for the GIF portal Solana program.
//!
//! [`solana::SolanaPort`] is the only boundary between an application and
//! the wallet / ledger ecosystem. [`web3::Web3`] is the narrow public
//! surface callers should depend on.

pub mod config;
pub mod error;
pub mod ledger;
pub mod program;
pub mod rpc;
pub mod solana;
pub mod types;
pub mod wallet;
pub mod web3;

pub use config::{Cluster, Commitment, ConfirmOptions, PortConfig};
pub use error::PortError;
pub use ledger::{AccountInfo, LedgerClient};
pub use rpc::RpcLedgerClient;
pub use solana::SolanaPort;
pub use types::{Account, GifItem};
pub use wallet::{ConnectOptions, Identity, LocalWallet, WalletCapability};
pub use web3::Web3;
