//! The Solana port: the sole boundary between the application and the
//! wallet / ledger ecosystem.
//!
//! Every operation has a `try_*` form returning `Result`. The plain forms
//! keep the portal's contract: failures are logged and turned into an empty
//! address or a no-op. The one exception is [`SolanaPort::get_base_account_data`],
//! whose error tells "no account yet" apart from "have account".

use std::path::Path;

use chain_sol::{compile_transaction, encode_unsigned_transaction, parse_wire_transaction};
use chain_sol::{Keypair, SolInstruction};

use crate::config::PortConfig;
use crate::error::PortError;
use crate::ledger::LedgerClient;
use crate::program;
use crate::types::Account;
use crate::wallet::{ConnectOptions, WalletCapability};

pub struct SolanaPort<W, L> {
    config: PortConfig,
    program_id: [u8; 32],
    base_account: Keypair,
    wallet: Option<W>,
    ledger: L,
}

impl<W: WalletCapability, L: LedgerClient> SolanaPort<W, L> {
    /// Build a port. `wallet` is `None` when no wallet is installed.
    ///
    /// `base_account` is the key pair whose public key addresses the GIF
    /// record; it is held for the lifetime of the port.
    pub fn new(
        config: PortConfig,
        base_account: Keypair,
        wallet: Option<W>,
        ledger: L,
    ) -> Result<Self, PortError> {
        let program_id = config.program_id_bytes()?;
        Ok(Self {
            config,
            program_id,
            base_account,
            wallet,
            ledger,
        })
    }

    /// Build a port whose base account is read from a credential file.
    pub fn from_credentials_file(
        config: PortConfig,
        credentials: impl AsRef<Path>,
        wallet: Option<W>,
        ledger: L,
    ) -> Result<Self, PortError> {
        let base_account = Keypair::from_json_file(credentials)?;
        log::debug!("loaded base account {}", base_account.address());
        Self::new(config, base_account, wallet, ledger)
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    pub fn base_account_address(&self) -> String {
        self.base_account.address()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn wallet(&self) -> Result<&W, PortError> {
        let wallet = self.wallet.as_ref().ok_or(PortError::WalletNotFound)?;
        if !wallet.is_compatible() {
            return Err(PortError::WalletIncompatible);
        }
        Ok(wallet)
    }

    // -- connection ------------------------------------------------------------

    pub async fn try_get_wallet_address(&self, options: ConnectOptions) -> Result<String, PortError> {
        let wallet = self.wallet()?;
        log::debug!("wallet found, connecting (only_if_trusted={})", options.only_if_trusted);
        let identity = wallet.connect(options).await?;
        log::info!("connected with public key {identity}");
        Ok(identity.address().to_string())
    }

    /// Connect and return the wallet's address, or `""` on any failure.
    ///
    /// With `trusted_only` the wallet is never asked to prompt the user.
    pub async fn get_wallet_address(&self, trusted_only: bool) -> String {
        let options = ConnectOptions {
            only_if_trusted: trusted_only,
        };
        match self.try_get_wallet_address(options).await {
            Ok(address) => address,
            Err(e) => {
                log::error!("wallet connection failed: {e}");
                String::new()
            }
        }
    }

    pub async fn get_address_if_is_trusted(&self) -> String {
        self.get_wallet_address(true).await
    }

    // -- read path -------------------------------------------------------------

    /// Fetch and shape-check the base account.
    ///
    /// Fails with [`PortError::InvalidAccount`] when the account does not
    /// exist yet, is owned by another program, or is not a `BaseAccount`.
    pub async fn get_base_account_data(&self) -> Result<Account, PortError> {
        let address = self.base_account.pubkey();
        let info = self.ledger.get_account(&address).await?.ok_or_else(|| {
            PortError::InvalidAccount(format!(
                "no account at {}",
                chain_sol::bytes_to_address(&address)
            ))
        })?;

        if info.owner != self.program_id {
            return Err(PortError::InvalidAccount(format!(
                "owned by {}, not the GIF program",
                chain_sol::bytes_to_address(&info.owner)
            )));
        }

        let account = program::decode_base_account(&info.data)?;
        if !account.is_consistent() {
            log::warn!(
                "base account reports {} gifs but lists {}",
                account.total_gifs,
                account.gif_list.len()
            );
        }
        log::debug!("got the account: {} gifs", account.gif_list.len());
        Ok(account)
    }

    // -- write path ------------------------------------------------------------

    /// Submit `startStuffOff`. Returns the transaction signature.
    ///
    /// Nothing here prevents a second initialization; the program rejects it.
    pub async fn try_startup(&self) -> Result<String, PortError> {
        let wallet = self.wallet()?;
        let user = connected_pubkey(wallet)?;
        let base = self.base_account.pubkey();

        let instruction = program::start_stuff_off(&self.program_id, &base, &user);
        let signature = self
            .submit(wallet, &user, instruction, Some(&self.base_account))
            .await?;
        log::info!(
            "created a new BaseAccount at {}",
            self.base_account.address()
        );
        Ok(signature)
    }

    pub async fn startup(&self) {
        if let Err(e) = self.try_startup().await {
            log::error!("error creating base account: {e}");
        }
    }

    /// Submit `addGif(link)`. Returns the transaction signature.
    ///
    /// `link` is checked locally first; a malformed URL never reaches the
    /// wallet or the ledger.
    pub async fn try_add_gif_to_blockchain(&self, link: &str) -> Result<String, PortError> {
        let url = url::Url::parse(link).map_err(|e| PortError::InvalidUrl(format!("{link:?}: {e}")))?;
        log::debug!("gif link: {url}");

        let wallet = self.wallet()?;
        let user = connected_pubkey(wallet)?;
        let base = self.base_account.pubkey();

        let instruction = program::add_gif(&self.program_id, &base, &user, link)?;
        self.submit(wallet, &user, instruction, None).await
    }

    pub async fn add_gif_to_blockchain(&self, link: &str) {
        if let Err(e) = self.try_add_gif_to_blockchain(link).await {
            log::warn!("empty input or not a valid URL, or the submission failed: {e}");
        }
    }

    /// Compile, collect signatures and send one instruction, with the
    /// wallet paying fees.
    async fn submit(
        &self,
        wallet: &W,
        fee_payer: &[u8; 32],
        instruction: SolInstruction,
        local_signer: Option<&Keypair>,
    ) -> Result<String, PortError> {
        let blockhash = self.ledger.get_latest_blockhash().await?;
        let tx = compile_transaction(&[instruction], fee_payer, &blockhash)?;

        let mut wire = encode_unsigned_transaction(&tx)?;
        if let Some(signer) = local_signer {
            wire = signer.sign_raw_transaction(&wire)?;
        }
        let wire = wallet.sign_transaction(wire).await?;

        let signed = parse_wire_transaction(&wire)?;
        if signed.message != tx {
            return Err(PortError::Signing(
                "wallet returned a different transaction".into(),
            ));
        }
        let missing = signed.missing_signers();
        if !missing.is_empty() {
            let missing: Vec<String> = missing.iter().map(chain_sol::bytes_to_address).collect();
            return Err(PortError::Signing(format!(
                "missing signatures from {}",
                missing.join(", ")
            )));
        }
        signed.verify_signatures()?;

        let signature = self.ledger.send_transaction(&wire).await?;
        log::debug!("submitted transaction {signature}");
        Ok(signature)
    }
}

fn connected_pubkey<W: WalletCapability>(wallet: &W) -> Result<[u8; 32], PortError> {
    wallet
        .identity()
        .ok_or(PortError::WalletNotConnected)?
        .pubkey()
}
