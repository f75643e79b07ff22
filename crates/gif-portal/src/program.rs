//! Client-side interface of the GIF program.
//!
//! The program is an Anchor program, so instruction data is an 8-byte
//! discriminator (`sha256("global:<name>")[..8]`) followed by the
//! Borsh-encoded arguments, and account data starts with
//! `sha256("account:<Type>")[..8]`.
//!
//! ```text
//! BaseAccount:
//!   discriminator   [u8; 8]
//!   total_gifs      u64
//!   gif_list        u32 len, then per item:
//!     gif_link      u32 len + UTF-8
//!     user_address  [u8; 32]
//! ```

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sol::{SolAccountMeta, SolInstruction, SYSTEM_PROGRAM_ID};
use sha2::{Digest, Sha256};

use crate::error::PortError;
use crate::types::{Account, GifItem};

/// Id of the deployed GIF program on devnet.
pub const DEFAULT_PROGRAM_ID: &str = "8oJLsdGcukkSvFor38wbJvkU3UUgGhsuadHSGJHW4PtZ";

const START_STUFF_OFF: &str = "start_stuff_off";
const ADD_GIF: &str = "add_gif";
const BASE_ACCOUNT: &str = "BaseAccount";

pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    sighash("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

#[derive(BorshSerialize, BorshDeserialize)]
struct ItemStruct {
    gif_link: String,
    user_address: [u8; 32],
}

#[derive(BorshSerialize, BorshDeserialize)]
struct BaseAccountData {
    total_gifs: u64,
    gif_list: Vec<ItemStruct>,
}

#[derive(BorshSerialize)]
struct AddGifArgs<'a> {
    gif_link: &'a str,
}

/// `startStuffOff`: create the base account, paid for by `user`.
///
/// Both the base account and the user sign.
pub fn start_stuff_off(
    program_id: &[u8; 32],
    base_account: &[u8; 32],
    user: &[u8; 32],
) -> SolInstruction {
    SolInstruction {
        program_id: *program_id,
        accounts: vec![
            SolAccountMeta::writable(*base_account, true),
            SolAccountMeta::writable(*user, true),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: instruction_discriminator(START_STUFF_OFF).to_vec(),
    }
}

/// `addGif(gif_link)`: append one item, attributed to `user`.
pub fn add_gif(
    program_id: &[u8; 32],
    base_account: &[u8; 32],
    user: &[u8; 32],
    gif_link: &str,
) -> Result<SolInstruction, PortError> {
    let mut data = instruction_discriminator(ADD_GIF).to_vec();
    AddGifArgs { gif_link }
        .serialize(&mut data)
        .map_err(|e| PortError::Transaction(format!("encode addGif args: {e}")))?;

    Ok(SolInstruction {
        program_id: *program_id,
        accounts: vec![
            SolAccountMeta::writable(*base_account, false),
            SolAccountMeta::writable(*user, true),
        ],
        data,
    })
}

/// Decode the `gif_link` argument of an `addGif` instruction.
pub fn decode_add_gif(data: &[u8]) -> Option<String> {
    let rest = data.strip_prefix(&instruction_discriminator(ADD_GIF)[..])?;
    String::try_from_slice(rest).ok()
}

/// Decode base account data into an [`Account`].
///
/// Anything that is not a `BaseAccount` with both fields present is an
/// [`PortError::InvalidAccount`]. Bytes past the decoded struct are the
/// unused tail of the account's allocation and are ignored.
pub fn decode_base_account(data: &[u8]) -> Result<Account, PortError> {
    let (discriminator, mut rest) = data
        .split_first_chunk::<8>()
        .ok_or_else(|| PortError::InvalidAccount("data shorter than discriminator".into()))?;

    if *discriminator != account_discriminator(BASE_ACCOUNT) {
        return Err(PortError::InvalidAccount(
            "discriminator is not BaseAccount".into(),
        ));
    }

    let raw = BaseAccountData::deserialize(&mut rest)
        .map_err(|e| PortError::InvalidAccount(format!("missing gifList/totalGifs: {e}")))?;

    Ok(Account {
        total_gifs: raw.total_gifs,
        gif_list: raw
            .gif_list
            .into_iter()
            .map(|item| GifItem {
                gif_link: item.gif_link,
                user_address: chain_sol::bytes_to_address(&item.user_address),
            })
            .collect(),
    })
}

/// Encode an [`Account`] the way the program stores it.
///
/// Item addresses must be valid Base58 keys.
pub fn encode_base_account(account: &Account) -> Result<Vec<u8>, PortError> {
    let gif_list = account
        .gif_list
        .iter()
        .map(|item| -> Result<ItemStruct, PortError> {
            Ok(ItemStruct {
                gif_link: item.gif_link.clone(),
                user_address: chain_sol::address_to_bytes(&item.user_address)?,
            })
        })
        .collect::<Result<Vec<_>, PortError>>()?;

    let mut data = account_discriminator(BASE_ACCOUNT).to_vec();
    BaseAccountData {
        total_gifs: account.total_gifs,
        gif_list,
    }
    .serialize(&mut data)
    .map_err(|e| PortError::Transaction(format!("encode BaseAccount: {e}")))?;
    Ok(data)
}
