//! # Ledger Client
//!
//! The seam between the service and whatever ledger it talks to.
//!
//! [`LedgerClient`] is the narrow async interface everything above this
//! module is written against: fetch suggested params, submit a signed
//! transaction, poll for confirmation, read account and asset state. The
//! in-process [`MemoryLedger`] implements it for local development and
//! tests; a networked implementation slots in behind the same trait
//! without touching the service layer.
//!
//! ## Confirmation
//!
//! Submission is asynchronous on a real ledger: a transaction lands in the
//! pool and confirms a round or two later. [`wait_for_confirmation`]
//! encapsulates the poll loop with a bounded number of attempts, so
//! callers either get a confirmed round or a
//! [`LedgerError::ConfirmationTimeout`].

pub mod memory;

pub use memory::MemoryLedger;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::account::Address;
use crate::config::{CONFIRMATION_POLL_INTERVAL, MAX_CONFIRMATION_POLLS};
use crate::error::LedgerError;
use crate::txn::SignedTransaction;

// ---------------------------------------------------------------------------
// State snapshots
// ---------------------------------------------------------------------------

/// A value in contract state. TEAL state is untyped key-value with two
/// value kinds, mirrored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateValue {
    Bytes(Vec<u8>),
    Uint(u64),
}

impl StateValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StateValue::Bytes(b) => Some(b),
            StateValue::Uint(_) => None,
        }
    }
}

/// Contract state: an ordered key-value map.
pub type TealKeyValue = BTreeMap<String, StateValue>;

/// Parameters a client suggests for the next transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParams {
    pub first_valid: u64,
    pub min_fee: u64,
}

/// Status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInfo {
    /// Round the transaction confirmed in; `None` while still pending.
    pub confirmed_round: Option<u64>,
    /// For asset-config transactions, the id of the minted asset.
    pub asset_index: Option<u64>,
}

/// One asset position held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub asset_id: u64,
    pub amount: u64,
    pub frozen: bool,
}

/// An asset the account minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAsset {
    pub asset_id: u64,
    pub asset_name: String,
    pub unit_name: String,
    pub total: u64,
    pub decimals: u32,
    pub url: String,
    pub metadata_hash: Option<[u8; 32]>,
}

/// Local state an account holds for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLocalState {
    pub app_id: u64,
    pub key_value: TealKeyValue,
}

/// An application the account created, with its global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedApp {
    pub app_id: u64,
    pub global_state: TealKeyValue,
}

/// Full account snapshot as returned by [`LedgerClient::account_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    /// Balance in microunits of the native token.
    pub balance: u64,
    pub assets: Vec<AssetHolding>,
    pub created_assets: Vec<CreatedAsset>,
    pub apps_local_state: Vec<AppLocalState>,
    pub created_apps: Vec<CreatedApp>,
}

impl AccountInfo {
    /// A fresh snapshot with no holdings or state.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            assets: Vec::new(),
            created_assets: Vec::new(),
            apps_local_state: Vec::new(),
            created_apps: Vec::new(),
        }
    }

    /// The account's local state for `app_id`, if opted in.
    pub fn local_state(&self, app_id: u64) -> Option<&TealKeyValue> {
        self.apps_local_state
            .iter()
            .find(|s| s.app_id == app_id)
            .map(|s| &s.key_value)
    }

    /// The account's holding of `asset_id`, if opted in.
    pub fn holding(&self, asset_id: u64) -> Option<&AssetHolding> {
        self.assets.iter().find(|h| h.asset_id == asset_id)
    }
}

/// A historical note attached to an asset's transaction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetNote {
    pub txid: String,
    pub round: u64,
    pub note: Vec<u8>,
}

// ---------------------------------------------------------------------------
// LedgerClient
// ---------------------------------------------------------------------------

/// Async interface to a ledger.
#[async_trait]
pub trait LedgerClient {
    /// Suggested parameters for the next transaction.
    async fn suggested_params(&self) -> Result<TxParams, LedgerError>;

    /// Submits a signed transaction and returns its txid.
    async fn submit(&self, signed: SignedTransaction) -> Result<String, LedgerError>;

    /// Status of a submitted transaction.
    async fn pending_info(&self, txid: &str) -> Result<PendingInfo, LedgerError>;

    /// Full snapshot of one account.
    async fn account_info(&self, address: &Address) -> Result<AccountInfo, LedgerError>;

    /// The latest round the ledger has sealed.
    async fn last_round(&self) -> Result<u64, LedgerError>;

    /// Historical notes attached to transactions touching `asset_id`,
    /// oldest first. Clients without an indexer return an empty list.
    async fn asset_notes(&self, _asset_id: u64) -> Result<Vec<AssetNote>, LedgerError> {
        Ok(Vec::new())
    }
}

/// Polls until `txid` confirms, up to [`MAX_CONFIRMATION_POLLS`] attempts.
pub async fn wait_for_confirmation<C: LedgerClient + ?Sized>(
    client: &C,
    txid: &str,
) -> Result<PendingInfo, LedgerError> {
    for _ in 0..MAX_CONFIRMATION_POLLS {
        let info = client.pending_info(txid).await?;
        if info.confirmed_round.is_some() {
            return Ok(info);
        }
        tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
    }
    Err(LedgerError::ConfirmationTimeout {
        txid: txid.to_string(),
        polls: MAX_CONFIRMATION_POLLS,
    })
}
