//! Ed25519 key pairs and the JSON credential file that stores them.
//!
//! The credential file has the shape
//!
//! ```text
//! { "_keypair": { "publicKey": <bytes>, "secretKey": <bytes> } }
//! ```
//!
//! where `<bytes>` is either a JSON array of numbers or an object keyed by
//! decimal indices (`{"0": 12, "1": 200, ...}`), which is how a JavaScript
//! `Uint8Array` serializes. `secretKey` holds 64 bytes: the 32-byte seed
//! followed by the 32-byte public key.

use std::path::Path;

use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::address::bytes_to_address;
use crate::error::SolError;
use crate::transaction::sign_raw_transaction;

/// An Ed25519 signing identity. The secret half is zeroed on drop.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Build a key pair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Build a key pair from the 64-byte `seed || public_key` form.
    ///
    /// Fails if the length is wrong or the public half does not belong to
    /// the seed.
    pub fn from_secret_key_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        let full: Zeroizing<[u8; 64]> = Zeroizing::new(bytes.try_into().map_err(|_| {
            SolError::InvalidPrivateKey(format!("expected 64 bytes, got {}", bytes.len()))
        })?);

        let signing_key = SigningKey::from_keypair_bytes(&full)
            .map_err(|e| SolError::InvalidPrivateKey(format!("public key mismatch: {e}")))?;

        Ok(Self { signing_key })
    }

    /// Parse a credential file's contents.
    pub fn from_json_str(json: &str) -> Result<Self, SolError> {
        let file: CredentialFile = serde_json::from_str(json)
            .map_err(|e| SolError::InvalidCredentials(e.to_string()))?;

        let secret = Zeroizing::new(file.keypair.secret_key.into_bytes()?);
        let keypair = Self::from_secret_key_bytes(&secret)?;

        if let Some(public_key) = file.keypair.public_key {
            if public_key.into_bytes()? != keypair.pubkey() {
                return Err(SolError::InvalidCredentials(
                    "publicKey does not match secretKey".into(),
                ));
            }
        }

        Ok(keypair)
    }

    /// Read and parse a credential file from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SolError> {
        let path = path.as_ref();
        let json = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            SolError::InvalidCredentials(format!("cannot read {}: {e}", path.display()))
        })?);
        Self::from_json_str(&json)
    }

    /// Serialize into the credential file format (byte arrays as JSON lists).
    pub fn to_json_string(&self) -> Result<String, SolError> {
        let secret = Zeroizing::new(self.signing_key.to_keypair_bytes());
        let file = CredentialFile {
            keypair: StoredKeypair {
                public_key: Some(ByteArray::List(self.pubkey().to_vec())),
                secret_key: ByteArray::List(secret.to_vec()),
            },
        };
        serde_json::to_string(&file).map_err(|e| SolError::SerializationError(e.to_string()))
    }

    /// Raw 32-byte public key.
    pub fn pubkey(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58 address of the public key.
    pub fn address(&self) -> String {
        bytes_to_address(&self.pubkey())
    }

    /// Sign an arbitrary message.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Fill this key's signature slot in a wire-format transaction.
    pub fn sign_raw_transaction(&self, raw_tx: &[u8]) -> Result<Vec<u8>, SolError> {
        sign_raw_transaction(&self.signing_key, raw_tx)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Credential file format
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct CredentialFile {
    #[serde(rename = "_keypair")]
    keypair: StoredKeypair,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredKeypair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key: Option<ByteArray>,
    secret_key: ByteArray,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ByteArray {
    List(Vec<u8>),
    Indexed(std::collections::HashMap<String, u8>),
}

impl ByteArray {
    /// Flatten into bytes. Indexed maps must cover `0..len` exactly.
    fn into_bytes(self) -> Result<Vec<u8>, SolError> {
        match self {
            ByteArray::List(bytes) => Ok(bytes),
            ByteArray::Indexed(map) => {
                let mut slots: Vec<Option<u8>> = vec![None; map.len()];
                for (key, byte) in map {
                    let index: usize = key.parse().map_err(|_| {
                        SolError::InvalidCredentials(format!("non-numeric byte index {key:?}"))
                    })?;
                    let slot = slots.get_mut(index).ok_or_else(|| {
                        SolError::InvalidCredentials(format!("byte index {index} out of range"))
                    })?;
                    *slot = Some(byte);
                }
                slots
                    .into_iter()
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| SolError::InvalidCredentials("gap in byte indices".into()))
            }
        }
    }
}
