use chain_sol::SolError;
use thiserror::Error;

/// Everything that can go wrong at the port boundary.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("wallet not found: install a Phantom-compatible wallet")]
    WalletNotFound,

    #[error("wallet is not Phantom-compatible")]
    WalletIncompatible,

    #[error("wallet is not connected")]
    WalletNotConnected,

    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("account invalid: {0}")]
    InvalidAccount(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction build failed: {0}")]
    Transaction(String),

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<SolError> for PortError {
    fn from(e: SolError) -> Self {
        match e {
            SolError::InvalidPrivateKey(_) | SolError::InvalidCredentials(_) => {
                PortError::Credentials(e.to_string())
            }
            SolError::SigningError(_) | SolError::InvalidPublicKey(_) => {
                PortError::Signing(e.to_string())
            }
            SolError::InvalidAddress(_)
            | SolError::TransactionBuildError(_)
            | SolError::SerializationError(_) => PortError::Transaction(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for PortError {
    fn from(e: reqwest::Error) -> Self {
        PortError::Rpc(e.to_string())
    }
}
