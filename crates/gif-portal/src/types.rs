use serde::{Deserialize, Serialize};

/// One submitted GIF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GifItem {
    pub gif_link: String,
    /// Base58 address of the submitting wallet.
    pub user_address: String,
}

/// Snapshot of the program's base account.
///
/// The program is expected to keep `total_gifs == gif_list.len()`; nothing
/// here enforces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Submission order.
    pub gif_list: Vec<GifItem>,
    pub total_gifs: u64,
}

impl Account {
    pub fn is_consistent(&self) -> bool {
        self.total_gifs == self.gif_list.len() as u64
    }
}
