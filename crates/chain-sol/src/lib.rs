//! Solana wire support for the GIF portal client.
//!
//! Address encoding, Ed25519 key pairs and their JSON credential file, and the
//! compact transaction wire format with partial signing. Built on
//! `ed25519-dalek` and `bs58` rather than `solana-sdk`.

pub mod address;
pub mod error;
pub mod keypair;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, validate_address};
pub use error::SolError;
pub use keypair::Keypair;
pub use transaction::{
    compile_transaction, decode_compact_u16, decode_message, encode_compact_u16,
    encode_unsigned_transaction, parse_wire_transaction, serialize_message, sign_raw_transaction,
    CompiledInstruction, SolAccountMeta, SolInstruction, SolTransaction, WireTransaction,
    SYSTEM_PROGRAM_ID,
};
