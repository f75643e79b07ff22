//! Port configuration: which cluster to talk to, which program to call and
//! how submissions are confirmed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PortError;
use crate::program::DEFAULT_PROGRAM_ID;

/// A Solana cluster, or any other JSON-RPC endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Custom(String),
}

impl Cluster {
    /// Public RPC endpoint for the cluster.
    pub fn rpc_url(&self) -> &str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Custom(url) => url.as_str(),
        }
    }
}

impl FromStr for Cluster {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            other => {
                let url = url::Url::parse(other)
                    .map_err(|e| PortError::Config(format!("unknown cluster {other:?}: {e}")))?;
                match url.scheme() {
                    "http" | "https" => Ok(Cluster::Custom(other.to_string())),
                    scheme => Err(PortError::Config(format!(
                        "unsupported RPC scheme {scheme:?}"
                    ))),
                }
            }
        }
    }
}

/// Commitment level for reads and for the preflight check of submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmOptions {
    pub preflight_commitment: Commitment,
}

/// Everything the port needs besides its credentials and collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortConfig {
    pub network: Cluster,
    /// Base58 id of the GIF program.
    pub program_id: String,
    pub options: ConfirmOptions,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            network: Cluster::Devnet,
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            options: ConfirmOptions::default(),
        }
    }
}

impl PortConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PortError> {
        serde_json::from_str(json).map_err(|e| PortError::Config(e.to_string()))
    }

    /// Decoded program id.
    pub fn program_id_bytes(&self) -> Result<[u8; 32], PortError> {
        chain_sol::address_to_bytes(&self.program_id)
            .map_err(|e| PortError::Config(format!("program id: {e}")))
    }
}
