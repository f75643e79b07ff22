//! Manual Solana transaction wire format and partial signing.
//!
//! The wire format is a compact binary layout:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! Transactions that need several signers (a wallet plus a local key pair)
//! travel as wire bytes with zeroed signature slots; each party fills its own
//! slot with [`sign_raw_transaction`].

use ed25519_dalek::{Signer, SigningKey};

use crate::error::SolError;

/// The Solana System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

const SIGNATURE_LEN: usize = 64;
const EMPTY_SIGNATURE: [u8; SIGNATURE_LEN] = [0u8; SIGNATURE_LEN];

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value from a byte slice.
///
/// Returns `(value, bytes_consumed)` or an error if the data is truncated.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError("unexpected end of data while decoding compact-u16".into())
        })?;
        consumed += 1;

        value |= ((byte & 0x7f) as u32) << shift;
        shift += 7;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    if value > u16::MAX as u32 {
        return Err(SolError::SerializationError(
            "compact-u16 value overflow".into(),
        ));
    }

    Ok((value as u16, consumed))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in a Solana instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A Solana instruction (before it is compiled into a transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    /// All account keys referenced by this transaction, in canonical order:
    ///   1. writable signers
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<[u8; 32]>,

    /// Number of required signatures (first N accounts are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,

    pub recent_blockhash: [u8; 32],

    /// Compiled instructions (account references replaced with indices).
    pub compiled_instructions: Vec<CompiledInstruction>,
}

impl SolTransaction {
    /// Keys whose signatures the transaction requires, in slot order.
    pub fn signer_keys(&self) -> &[[u8; 32]] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the transaction's `account_keys` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// A parsed wire-format transaction.
#[derive(Debug, Clone)]
pub struct WireTransaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: SolTransaction,
    /// The exact message bytes the signatures cover.
    pub message_bytes: Vec<u8>,
}

impl WireTransaction {
    /// Signer keys whose signature slot is still empty.
    pub fn missing_signers(&self) -> Vec<[u8; 32]> {
        self.message
            .signer_keys()
            .iter()
            .zip(&self.signatures)
            .filter(|(_, sig)| **sig == EMPTY_SIGNATURE)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Check every filled slot against its signer key.
    pub fn verify_signatures(&self) -> Result<(), SolError> {
        for (key, sig) in self.message.signer_keys().iter().zip(&self.signatures) {
            if *sig == EMPTY_SIGNATURE {
                continue;
            }
            let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(key)
                .map_err(|e| SolError::InvalidPublicKey(e.to_string()))?;
            let signature = ed25519_dalek::Signature::from_bytes(sig);
            verifying_key
                .verify_strict(&self.message_bytes, &signature)
                .map_err(|e| SolError::SigningError(format!("bad signature: {e}")))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transaction building
// ---------------------------------------------------------------------------

/// Build a transaction message from a set of instructions with a single fee
/// payer.
///
/// The fee payer is always the first signer and is placed at index 0 in the
/// account keys.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    if instructions.is_empty() {
        return Err(SolError::TransactionBuildError(
            "transaction needs at least one instruction".into(),
        ));
    }

    struct AccountEntry {
        pubkey: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    // Fee payer is always signer + writable.
    upsert(*fee_payer, true, true);

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        // Program IDs are non-signer, read-only accounts.
        upsert(ix.program_id, false, false);
    }

    // Stable sort keeps insertion order within a category, so the fee payer
    // stays first among writable signers.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if entries.len() > u8::MAX as usize {
        return Err(SolError::TransactionBuildError(format!(
            "too many accounts: {}",
            entries.len()
        )));
    }

    let num_signers = entries.iter().filter(|e| e.is_signer).count() as u8;
    let num_readonly_signed = entries
        .iter()
        .filter(|e| e.is_signer && !e.is_writable)
        .count() as u8;
    let num_readonly_unsigned = entries
        .iter()
        .filter(|e| !e.is_signer && !e.is_writable)
        .count() as u8;

    let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();
    let index_of = |key: &[u8; 32], what: &str| {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError(format!("{what} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id, "program_id")?;
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey, "account"))
            .collect::<Result<Vec<u8>, SolError>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures: num_signers,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions: compiled,
    })
}

/// Serialize the transaction message (the bytes that get signed).
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);

    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend_from_slice(&encode_compact_u16(len_u16(tx.account_keys.len())?));
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend_from_slice(&encode_compact_u16(len_u16(tx.compiled_instructions.len())?));
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);

        buf.extend_from_slice(&encode_compact_u16(len_u16(ix.account_indices.len())?));
        buf.extend_from_slice(&ix.account_indices);

        buf.extend_from_slice(&encode_compact_u16(len_u16(ix.data.len())?));
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

/// Encode a transaction with one zeroed signature slot per required signer.
///
/// The result is what a wallet's `signTransaction` expects to receive.
pub fn encode_unsigned_transaction(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let message_bytes = serialize_message(tx)?;
    let num_sigs = tx.num_required_signatures as usize;

    let mut wire = Vec::with_capacity(3 + num_sigs * SIGNATURE_LEN + message_bytes.len());
    wire.extend_from_slice(&encode_compact_u16(num_sigs as u16));
    for _ in 0..num_sigs {
        wire.extend_from_slice(&EMPTY_SIGNATURE);
    }
    wire.extend_from_slice(&message_bytes);

    Ok(wire)
}

// ---------------------------------------------------------------------------
// Parsing and partial signing
// ---------------------------------------------------------------------------

/// Parse a serialized message back into its structure.
pub fn decode_message(bytes: &[u8]) -> Result<SolTransaction, SolError> {
    let mut reader = Reader { data: bytes, pos: 0 };

    let header = reader.take(3)?;
    let (num_required_signatures, num_readonly_signed, num_readonly_unsigned) =
        (header[0], header[1], header[2]);

    let num_accounts = reader.compact_u16()?;
    let mut account_keys = Vec::with_capacity(num_accounts as usize);
    for _ in 0..num_accounts {
        account_keys.push(reader.array32()?);
    }

    let recent_blockhash = reader.array32()?;

    let num_instructions = reader.compact_u16()?;
    let mut compiled_instructions = Vec::with_capacity(num_instructions as usize);
    for _ in 0..num_instructions {
        let program_id_index = reader.take(1)?[0];
        let n = reader.compact_u16()? as usize;
        let account_indices = reader.take(n)?.to_vec();
        let n = reader.compact_u16()? as usize;
        let data = reader.take(n)?.to_vec();
        compiled_instructions.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data,
        });
    }

    if reader.pos != bytes.len() {
        return Err(SolError::SerializationError(format!(
            "{} trailing bytes after message",
            bytes.len() - reader.pos
        )));
    }

    if num_required_signatures as usize > account_keys.len() {
        return Err(SolError::SerializationError(
            "more required signatures than account keys".into(),
        ));
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash,
        compiled_instructions,
    })
}

/// Parse a wire-format transaction into signatures and message.
pub fn parse_wire_transaction(raw_tx: &[u8]) -> Result<WireTransaction, SolError> {
    let (num_sigs, compact_len) = decode_compact_u16(raw_tx)?;

    if num_sigs == 0 {
        return Err(SolError::TransactionBuildError(
            "transaction has zero signatures".into(),
        ));
    }

    let sigs_end = compact_len + (num_sigs as usize) * SIGNATURE_LEN;
    if sigs_end > raw_tx.len() {
        return Err(SolError::SerializationError(
            "transaction too short: signature slots exceed length".into(),
        ));
    }

    let signatures = raw_tx[compact_len..sigs_end]
        .chunks_exact(SIGNATURE_LEN)
        .map(|chunk| {
            let mut sig = [0u8; SIGNATURE_LEN];
            sig.copy_from_slice(chunk);
            sig
        })
        .collect::<Vec<_>>();

    let message_bytes = raw_tx[sigs_end..].to_vec();
    let message = decode_message(&message_bytes)?;

    if message.num_required_signatures as usize != signatures.len() {
        return Err(SolError::SerializationError(format!(
            "{} signature slots for {} required signers",
            signatures.len(),
            message.num_required_signatures
        )));
    }

    Ok(WireTransaction {
        signatures,
        message,
        message_bytes,
    })
}

/// Sign a wire-format transaction with the given key, writing the signature
/// into the slot that belongs to the key's public key.
///
/// Other slots are left untouched, so multi-signer transactions can pass
/// through several parties in any order. If the key is not among the
/// transaction's signers, an error is returned.
pub fn sign_raw_transaction(signing_key: &SigningKey, raw_tx: &[u8]) -> Result<Vec<u8>, SolError> {
    let our_pubkey = signing_key.verifying_key().to_bytes();
    let parsed = parse_wire_transaction(raw_tx)?;

    let signer_idx = parsed
        .message
        .signer_keys()
        .iter()
        .position(|k| *k == our_pubkey)
        .ok_or_else(|| {
            SolError::SigningError("wallet pubkey not found in transaction signers".into())
        })?;

    let signature = signing_key.sign(&parsed.message_bytes);

    let (_, compact_len) = decode_compact_u16(raw_tx)?;
    let sig_offset = compact_len + signer_idx * SIGNATURE_LEN;
    let mut signed_tx = raw_tx.to_vec();
    signed_tx[sig_offset..sig_offset + SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());

    Ok(signed_tx)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn len_u16(len: usize) -> Result<u16, SolError> {
    u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("length {len} exceeds compact-u16")))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| {
            SolError::SerializationError("transaction message too short".into())
        })?;
        let data = self.data;
        let slice = &data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn compact_u16(&mut self) -> Result<u16, SolError> {
        let (value, used) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    fn array32(&mut self) -> Result<[u8; 32], SolError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32)?);
        Ok(out)
    }
}
