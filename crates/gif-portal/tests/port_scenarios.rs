//! End-to-end scenarios through the public port, with the wallet and the
//! ledger replaced by recording stubs.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use chain_sol::{parse_wire_transaction, Keypair};
use gif_portal::program::{self, account_discriminator, decode_add_gif, encode_base_account};
use gif_portal::*;

// ─── Stubs ─────────────────────────────────────────────────────────

struct StubWallet {
    address: String,
    keypair: Option<Keypair>,
    /// The user approved this site before, so silent connects succeed.
    trusted: bool,
    user_rejects: bool,
    connected: Cell<bool>,
    sign_calls: Cell<usize>,
}

impl StubWallet {
    fn with_address(address: &str) -> Self {
        Self {
            address: address.into(),
            keypair: None,
            trusted: true,
            user_rejects: false,
            connected: Cell::new(false),
            sign_calls: Cell::new(0),
        }
    }

    fn with_keypair(keypair: Keypair) -> Self {
        Self {
            address: keypair.address(),
            keypair: Some(keypair),
            ..Self::with_address("")
        }
    }
}

#[async_trait(?Send)]
impl WalletCapability for StubWallet {
    fn is_compatible(&self) -> bool {
        true
    }

    fn identity(&self) -> Option<Identity> {
        self.connected.get().then(|| Identity::new(self.address.clone()))
    }

    async fn connect(&self, options: ConnectOptions) -> Result<Identity, PortError> {
        if options.only_if_trusted && !self.trusted {
            return Err(PortError::ConnectionRejected("not trusted".into()));
        }
        if !options.only_if_trusted && self.user_rejects {
            return Err(PortError::ConnectionRejected("User rejected the request.".into()));
        }
        self.connected.set(true);
        Ok(Identity::new(self.address.clone()))
    }

    async fn sign_transaction(&self, wire_tx: Vec<u8>) -> Result<Vec<u8>, PortError> {
        self.sign_calls.set(self.sign_calls.get() + 1);
        let keypair = self
            .keypair
            .as_ref()
            .ok_or_else(|| PortError::Signing("stub has no key".into()))?;
        Ok(keypair.sign_raw_transaction(&wire_tx)?)
    }
}

/// Fails the test if it is ever asked to show a prompt.
struct NoPromptWallet;

#[async_trait(?Send)]
impl WalletCapability for NoPromptWallet {
    fn is_compatible(&self) -> bool {
        true
    }

    fn identity(&self) -> Option<Identity> {
        None
    }

    async fn connect(&self, options: ConnectOptions) -> Result<Identity, PortError> {
        assert!(options.only_if_trusted, "wallet was asked to prompt the user");
        Ok(Identity::new("Abc123"))
    }

    async fn sign_transaction(&self, _wire_tx: Vec<u8>) -> Result<Vec<u8>, PortError> {
        panic!("wallet was asked to sign");
    }
}

#[derive(Default)]
struct StubLedger {
    account: Option<AccountInfo>,
    fail_send: bool,
    calls: Cell<usize>,
    sent: RefCell<Vec<Vec<u8>>>,
}

impl StubLedger {
    fn holding(data: Vec<u8>) -> Self {
        Self {
            account: Some(AccountInfo {
                owner: program_id(),
                lamports: 1_000_000,
                data,
            }),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl LedgerClient for StubLedger {
    async fn get_account(&self, _address: &[u8; 32]) -> Result<Option<AccountInfo>, PortError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.account.clone())
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], PortError> {
        self.calls.set(self.calls.get() + 1);
        // A fresh blockhash per call, like a live cluster.
        Ok([self.calls.get() as u8; 32])
    }

    async fn send_transaction(&self, wire_tx: &[u8]) -> Result<String, PortError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_send {
            return Err(PortError::Rpc("Blockhash not found".into()));
        }
        self.sent.borrow_mut().push(wire_tx.to_vec());
        Ok(format!("sig{}", self.sent.borrow().len()))
    }
}

// ─── Helpers ───────────────────────────────────────────────────────

fn program_id() -> [u8; 32] {
    PortConfig::default().program_id_bytes().unwrap()
}

fn base_keypair() -> Keypair {
    Keypair::from_seed(&[0x5a; 32])
}

fn web3<W: WalletCapability>(wallet: Option<W>, ledger: StubLedger) -> Web3<W, StubLedger> {
    SolanaPort::new(PortConfig::default(), base_keypair(), wallet, ledger)
        .unwrap()
        .into()
}

async fn connected_web3(ledger: StubLedger) -> Web3<StubWallet, StubLedger> {
    let web3 = web3(Some(StubWallet::with_keypair(Keypair::from_seed(&[0x11; 32]))), ledger);
    assert!(!web3.get_wallet_address(false).await.is_empty());
    web3
}

fn ledger_calls<W: WalletCapability>(web3: &Web3<W, StubLedger>) -> usize {
    web3.port().ledger().calls.get()
}

// ─── Connection ────────────────────────────────────────────────────

#[tokio::test]
async fn wallet_identity_is_returned_verbatim() {
    let web3 = web3(Some(StubWallet::with_address("Abc123")), StubLedger::default());
    assert_eq!(web3.get_wallet_address(false).await, "Abc123");
}

#[tokio::test]
async fn trusted_only_never_prompts() {
    let web3 = web3(Some(NoPromptWallet), StubLedger::default());
    assert_eq!(web3.get_wallet_address(true).await, "Abc123");
    assert_eq!(web3.get_address_if_is_trusted().await, "Abc123");
}

#[tokio::test]
async fn silent_connect_without_prior_trust_is_empty() {
    let wallet = StubWallet {
        trusted: false,
        ..StubWallet::with_address("Abc123")
    };
    let web3 = web3(Some(wallet), StubLedger::default());
    assert_eq!(web3.get_address_if_is_trusted().await, "");
    // An interactive connect still works.
    assert_eq!(web3.get_wallet_address(false).await, "Abc123");
}

#[tokio::test]
async fn declined_connection_is_empty() {
    let wallet = StubWallet {
        user_rejects: true,
        ..StubWallet::with_address("Abc123")
    };
    let web3 = web3(Some(wallet), StubLedger::default());
    assert_eq!(web3.get_wallet_address(false).await, "");
    assert!(matches!(
        web3.port().try_get_wallet_address(ConnectOptions::default()).await,
        Err(PortError::ConnectionRejected(_))
    ));
}

#[tokio::test]
async fn no_wallet_installed_is_empty() {
    let web3 = web3(None::<StubWallet>, StubLedger::default());
    assert_eq!(web3.get_wallet_address(false).await, "");
    assert_eq!(web3.get_address_if_is_trusted().await, "");
}

// ─── Read path ─────────────────────────────────────────────────────

#[tokio::test]
async fn empty_account_is_returned_unchanged() {
    let empty = Account {
        gif_list: vec![],
        total_gifs: 0,
    };
    let web3 = web3(
        None::<StubWallet>,
        StubLedger::holding(encode_base_account(&empty).unwrap()),
    );
    assert_eq!(web3.get_base_account_data().await.unwrap(), empty);
}

#[tokio::test]
async fn gif_list_keeps_submission_order() {
    let submitter = Keypair::from_seed(&[0x22; 32]).address();
    let account = Account {
        gif_list: vec![
            GifItem {
                gif_link: "https://media.giphy.com/media/first.gif".into(),
                user_address: submitter.clone(),
            },
            GifItem {
                gif_link: "https://media.giphy.com/media/second.gif".into(),
                user_address: submitter,
            },
        ],
        total_gifs: 2,
    };
    let mut data = encode_base_account(&account).unwrap();
    data.resize(9000, 0);

    let web3 = web3(None::<StubWallet>, StubLedger::holding(data));
    assert_eq!(web3.get_base_account_data().await.unwrap(), account);
}

#[tokio::test]
async fn foreign_account_is_a_shape_mismatch() {
    let mut data = account_discriminator("Foo").to_vec();
    data.extend_from_slice(&1u64.to_le_bytes());

    let web3 = web3(None::<StubWallet>, StubLedger::holding(data));
    assert!(matches!(
        web3.get_base_account_data().await,
        Err(PortError::InvalidAccount(_))
    ));
}

#[tokio::test]
async fn missing_account_is_a_shape_mismatch() {
    let web3 = web3(None::<StubWallet>, StubLedger::default());
    assert!(matches!(
        web3.get_base_account_data().await,
        Err(PortError::InvalidAccount(_))
    ));
}

#[tokio::test]
async fn account_with_only_total_gifs_is_a_shape_mismatch() {
    let mut data = account_discriminator("BaseAccount").to_vec();
    data.extend_from_slice(&0u64.to_le_bytes());

    let web3 = web3(None::<StubWallet>, StubLedger::holding(data));
    assert!(matches!(
        web3.get_base_account_data().await,
        Err(PortError::InvalidAccount(_))
    ));
}

// ─── Write path ────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_links_make_no_calls() {
    let web3 = connected_web3(StubLedger::default()).await;

    for link in ["", "not a url", "giphy.com/x.gif", "://missing-scheme", "http://"] {
        web3.add_gif_to_blockchain(link).await;
        assert!(matches!(
            web3.port().try_add_gif_to_blockchain(link).await,
            Err(PortError::InvalidUrl(_))
        ));
    }

    assert_eq!(ledger_calls(&web3), 0);
}

#[tokio::test]
async fn well_formed_link_is_submitted_verbatim() {
    let web3 = connected_web3(StubLedger::default()).await;
    let links = [
        "https://media.giphy.com/media/abc/giphy.gif?cid=1&rid=2",
        "https://i.imgur.com/XyZ.gif",
        "mailto:someone@example.com",
    ];

    for link in links {
        web3.add_gif_to_blockchain(link).await;
    }

    let sent = web3.port().ledger().sent.borrow();
    assert_eq!(sent.len(), links.len());
    for (wire, link) in sent.iter().zip(links) {
        let tx = parse_wire_transaction(wire).unwrap();
        assert!(tx.missing_signers().is_empty());
        assert_eq!(tx.message.compiled_instructions.len(), 1);
        let ix = &tx.message.compiled_instructions[0];
        assert_eq!(tx.message.account_keys[ix.program_id_index as usize], program_id());
        assert_eq!(decode_add_gif(&ix.data).as_deref(), Some(link));
    }
}

#[tokio::test]
async fn startup_twice_issues_two_initializations() {
    let web3 = connected_web3(StubLedger::default()).await;

    web3.startup().await;
    web3.startup().await;

    let sent = web3.port().ledger().sent.borrow();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0], sent[1]);

    let start = program::instruction_discriminator("start_stuff_off");
    for wire in sent.iter() {
        let tx = parse_wire_transaction(wire).unwrap();
        assert_eq!(tx.message.compiled_instructions[0].data, start);
        assert_eq!(tx.message.signer_keys()[1], base_keypair().pubkey());
        tx.verify_signatures().unwrap();
    }
}

#[tokio::test]
async fn remote_failure_is_swallowed_by_write_path() {
    let ledger = StubLedger {
        fail_send: true,
        ..StubLedger::default()
    };
    let web3 = connected_web3(ledger).await;

    web3.add_gif_to_blockchain("https://i.imgur.com/XyZ.gif").await;
    web3.startup().await;

    assert!(matches!(
        web3.port().try_add_gif_to_blockchain("https://i.imgur.com/XyZ.gif").await,
        Err(PortError::Rpc(_))
    ));
    assert!(web3.port().ledger().sent.borrow().is_empty());
}

#[tokio::test]
async fn writes_without_wallet_do_nothing() {
    let web3 = web3(None::<StubWallet>, StubLedger::default());

    web3.startup().await;
    web3.add_gif_to_blockchain("https://i.imgur.com/XyZ.gif").await;

    assert_eq!(ledger_calls(&web3), 0);
}

#[tokio::test]
async fn local_wallet_drives_full_cycle() {
    let account = Account::default();
    let web3 = web3(
        Some(LocalWallet::new(Keypair::from_seed(&[0x33; 32]))),
        StubLedger::holding(encode_base_account(&account).unwrap()),
    );

    let address = web3.get_wallet_address(false).await;
    assert_eq!(address, Keypair::from_seed(&[0x33; 32]).address());

    web3.startup().await;
    web3.add_gif_to_blockchain("https://i.imgur.com/XyZ.gif").await;
    assert_eq!(web3.port().ledger().sent.borrow().len(), 2);

    // The stub ledger does not run the program, so the snapshot is unchanged.
    assert_eq!(web3.get_base_account_data().await.unwrap(), account);
}
