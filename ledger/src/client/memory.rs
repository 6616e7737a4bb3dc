//! In-process ledger for local development and tests.
//!
//! [`MemoryLedger`] executes transactions synchronously inside `submit`,
//! sealing one round per submission, so `pending_info` reports a confirmed
//! round immediately after a successful submit. State lives behind a single
//! `parking_lot::RwLock`; every operation takes the lock once and mutates
//! the whole world atomically, which keeps the execution rules readable at
//! the cost of write throughput nobody needs in a dev ledger.
//!
//! Rejection messages deliberately mirror the phrasing of a real node
//! ("has not opted in", "rejected by ApprovalProgram") because the error
//! classifier upstream keys on those substrings.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::account::Address;
use crate::config::REGISTRAR_STATE_KEY;
use crate::error::LedgerError;
use crate::txn::{AssetConfigParams, SignedTransaction, TransactionPayload};

use super::{
    AccountInfo, AppLocalState, AssetHolding, AssetNote, CreatedApp, CreatedAsset,
    LedgerClient, PendingInfo, StateValue, TealKeyValue, TxParams,
};

const MIN_FEE: u64 = 1_000;

/// First asset id handed out, keeping dev ids visually distinct from the
/// low integers used for app ids in fixtures.
const FIRST_ASSET_ID: u64 = 1_000;

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct AccountState {
    balance: u64,
    /// asset id → (amount, frozen)
    holdings: BTreeMap<u64, (u64, bool)>,
    /// app id → local key-value state
    app_local: BTreeMap<u64, TealKeyValue>,
}

#[derive(Debug, Clone)]
struct AssetRecord {
    creator: Address,
    params: AssetConfigParams,
}

#[derive(Debug, Clone)]
struct AppRecord {
    creator: Address,
    global_state: TealKeyValue,
}

#[derive(Debug, Default)]
struct World {
    round: u64,
    accounts: BTreeMap<Address, AccountState>,
    assets: BTreeMap<u64, AssetRecord>,
    apps: BTreeMap<u64, AppRecord>,
    next_asset_id: u64,
    /// txid → outcome of a confirmed transaction
    confirmed: BTreeMap<String, PendingInfo>,
    /// asset id → notes recorded against it, oldest first
    notes: BTreeMap<u64, Vec<AssetNote>>,
}

impl World {
    fn account_mut(&mut self, address: &Address) -> &mut AccountState {
        self.accounts.entry(address.clone()).or_default()
    }
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// An in-memory [`LedgerClient`].
pub struct MemoryLedger {
    world: RwLock<World>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            world: RwLock::new(World {
                next_asset_id: FIRST_ASSET_ID,
                ..World::default()
            }),
        }
    }

    /// Seeds `address` with a balance, creating the account if needed.
    pub fn fund(&self, address: &Address, amount: u64) {
        self.world.write().account_mut(address).balance += amount;
    }

    /// Registers a profile application created by `creator` whose global
    /// state names `registrar`. Returns `Err` when the registrar address
    /// does not decode to a public key.
    pub fn with_profile_app(
        &self,
        app_id: u64,
        creator: &Address,
        registrar: &Address,
    ) -> Result<(), LedgerError> {
        let registrar_bytes = registrar
            .to_bytes()
            .map_err(|e| LedgerError::Encoding(e.to_string()))?;
        let mut global_state = BTreeMap::new();
        global_state.insert(
            REGISTRAR_STATE_KEY.to_string(),
            StateValue::Bytes(registrar_bytes),
        );

        let mut world = self.world.write();
        world.accounts.entry(creator.clone()).or_default();
        world.apps.insert(
            app_id,
            AppRecord {
                creator: creator.clone(),
                global_state,
            },
        );
        Ok(())
    }

    fn execute(&self, signed: SignedTransaction) -> Result<String, LedgerError> {
        if !signed.verify() {
            return Err(LedgerError::Rejected("invalid signature".into()));
        }
        if signed.signer != signed.txn.sender {
            return Err(LedgerError::Rejected(format!(
                "signer {} does not match sender {}",
                signed.signer.as_str(),
                signed.txn.sender.as_str()
            )));
        }
        if signed.txn.fee < MIN_FEE {
            return Err(LedgerError::Rejected(format!(
                "fee {} below minimum {}",
                signed.txn.fee, MIN_FEE
            )));
        }

        let txid = signed.txid();
        let mut world = self.world.write();
        if world.confirmed.contains_key(&txid) {
            return Err(LedgerError::Rejected(format!(
                "transaction {txid} already in ledger"
            )));
        }

        let sender = signed.txn.sender.clone();
        let note = signed.txn.note.clone();
        let mut asset_index = None;

        match &signed.txn.payload {
            TransactionPayload::AssetConfig(params) => {
                let id = world.next_asset_id;
                world.next_asset_id += 1;
                world.assets.insert(
                    id,
                    AssetRecord {
                        creator: sender.clone(),
                        params: params.clone(),
                    },
                );
                // The creator holds the full supply from round one.
                world
                    .account_mut(&sender)
                    .holdings
                    .insert(id, (params.total, params.default_frozen));
                asset_index = Some(id);
                record_note(&mut world, id, &txid, &note);
            }

            TransactionPayload::AssetTransfer {
                asset_id,
                amount,
                receiver,
                revocation_target,
            } => {
                let record = world
                    .assets
                    .get(asset_id)
                    .cloned()
                    .ok_or_else(|| LedgerError::Rejected(format!("asset {asset_id} does not exist")))?;

                let source = match revocation_target {
                    Some(target) => {
                        // Clawback path: only the asset's clawback address
                        // may move units out of someone else's holding.
                        if record.params.clawback.as_ref() != Some(&sender) {
                            return Err(LedgerError::Rejected(format!(
                                "sender {} is not the clawback address of asset {asset_id}",
                                sender.as_str()
                            )));
                        }
                        target.clone()
                    }
                    None => sender.clone(),
                };

                let source_state = world.account_mut(&source);
                let (held, frozen) = *source_state.holdings.get(asset_id).ok_or_else(|| {
                    LedgerError::Rejected(format!(
                        "account {} has not opted in to asset {asset_id}",
                        source.as_str()
                    ))
                })?;
                if frozen && revocation_target.is_none() {
                    return Err(LedgerError::Rejected(format!(
                        "asset {asset_id} is frozen for {}",
                        source.as_str()
                    )));
                }
                if held < *amount {
                    return Err(LedgerError::Rejected(format!(
                        "underflow on asset {asset_id}: holding {held}, transfer {amount}"
                    )));
                }

                if !world
                    .accounts
                    .get(receiver)
                    .map(|a| a.holdings.contains_key(asset_id))
                    .unwrap_or(false)
                {
                    return Err(LedgerError::Rejected(format!(
                        "receiver {} has not opted in to asset {asset_id}",
                        receiver.as_str()
                    )));
                }

                world.account_mut(&source).holdings.get_mut(asset_id).unwrap().0 -= amount;
                world
                    .account_mut(receiver)
                    .holdings
                    .get_mut(asset_id)
                    .unwrap()
                    .0 += amount;
                record_note(&mut world, *asset_id, &txid, &note);
            }

            TransactionPayload::AssetOptIn { asset_id } => {
                if !world.assets.contains_key(asset_id) {
                    return Err(LedgerError::Rejected(format!(
                        "asset {asset_id} does not exist"
                    )));
                }
                let account = world.account_mut(&sender);
                if account.holdings.contains_key(asset_id) {
                    return Err(LedgerError::Rejected(format!(
                        "account {} has already opted in to asset {asset_id}",
                        sender.as_str()
                    )));
                }
                account.holdings.insert(*asset_id, (0, false));
            }

            TransactionPayload::AppCall {
                app_id,
                args,
                accounts,
            } => {
                let app = world
                    .apps
                    .get(app_id)
                    .cloned()
                    .ok_or_else(|| LedgerError::Rejected(format!("application {app_id} does not exist")))?;
                approve_profile_call(&mut world, &app, *app_id, &sender, args, accounts)?;
            }

            TransactionPayload::AppOptIn { app_id } => {
                if !world.apps.contains_key(app_id) {
                    return Err(LedgerError::Rejected(format!(
                        "application {app_id} does not exist"
                    )));
                }
                let account = world.account_mut(&sender);
                if account.app_local.contains_key(app_id) {
                    return Err(LedgerError::Rejected(format!(
                        "account {} has already opted in to app {app_id}",
                        sender.as_str()
                    )));
                }
                account.app_local.insert(*app_id, BTreeMap::new());
            }

            TransactionPayload::AppCloseOut { app_id } => {
                let account = world.account_mut(&sender);
                if account.app_local.remove(app_id).is_none() {
                    return Err(LedgerError::Rejected(format!(
                        "account {} has not opted in to app {app_id}",
                        sender.as_str()
                    )));
                }
            }

            TransactionPayload::Payment { amount, receiver } => {
                let balance = world.account_mut(&sender).balance;
                if balance < *amount {
                    return Err(LedgerError::Rejected(format!(
                        "overspend: balance {balance}, payment {amount}"
                    )));
                }
                world.account_mut(&sender).balance -= amount;
                world.account_mut(receiver).balance += amount;
            }
        }

        world.round += 1;
        let confirmed_round = world.round;
        world.confirmed.insert(
            txid.clone(),
            PendingInfo {
                confirmed_round: Some(confirmed_round),
                asset_index,
            },
        );
        debug!(txid = %txid, round = confirmed_round, "transaction confirmed");
        Ok(txid)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Approval logic of the profile contract: only the registrar named in
/// global state may write, the target must be opted in, and the only
/// recognized method is `new_profile(record_bytes)` with the target as the
/// first foreign account.
fn approve_profile_call(
    world: &mut World,
    app: &AppRecord,
    app_id: u64,
    sender: &Address,
    args: &[Vec<u8>],
    accounts: &[Address],
) -> Result<(), LedgerError> {
    let registrar = app
        .global_state
        .get(REGISTRAR_STATE_KEY)
        .and_then(StateValue::as_bytes)
        .and_then(Address::from_bytes);
    if registrar.as_ref() != Some(sender) {
        return Err(LedgerError::Rejected(format!(
            "transaction rejected by ApprovalProgram: sender {} is not the registrar",
            sender.as_str()
        )));
    }

    let (method, record) = match args {
        [method, record] => (method.as_slice(), record.clone()),
        _ => {
            return Err(LedgerError::Rejected(
                "transaction rejected by ApprovalProgram: expected two arguments".into(),
            ))
        }
    };
    if method != crate::config::NEW_PROFILE_ARG {
        return Err(LedgerError::Rejected(format!(
            "transaction rejected by ApprovalProgram: unknown method {:?}",
            String::from_utf8_lossy(method)
        )));
    }

    let target = accounts.first().ok_or_else(|| {
        LedgerError::Rejected(
            "transaction rejected by ApprovalProgram: missing target account".into(),
        )
    })?;

    let account = world.account_mut(target);
    let local = account.app_local.get_mut(&app_id).ok_or_else(|| {
        LedgerError::Rejected(format!(
            "account {} has not opted in to app {app_id}",
            target.as_str()
        ))
    })?;
    local.insert(
        crate::config::CREDIT_STATE_KEY.to_string(),
        StateValue::Bytes(record),
    );
    Ok(())
}

fn record_note(world: &mut World, asset_id: u64, txid: &str, note: &Option<Vec<u8>>) {
    if let Some(bytes) = note {
        let round = world.round + 1;
        world.notes.entry(asset_id).or_default().push(AssetNote {
            txid: txid.to_string(),
            round,
            note: bytes.clone(),
        });
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn suggested_params(&self) -> Result<TxParams, LedgerError> {
        let world = self.world.read();
        Ok(TxParams {
            first_valid: world.round + 1,
            min_fee: MIN_FEE,
        })
    }

    async fn submit(&self, signed: SignedTransaction) -> Result<String, LedgerError> {
        self.execute(signed)
    }

    async fn pending_info(&self, txid: &str) -> Result<PendingInfo, LedgerError> {
        self.world
            .read()
            .confirmed
            .get(txid)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownTransaction(txid.to_string()))
    }

    async fn account_info(&self, address: &Address) -> Result<AccountInfo, LedgerError> {
        let world = self.world.read();
        let state = world.accounts.get(address).cloned().unwrap_or_default();

        let mut info = AccountInfo::empty(address.clone());
        info.balance = state.balance;
        info.assets = state
            .holdings
            .iter()
            .map(|(&asset_id, &(amount, frozen))| AssetHolding {
                asset_id,
                amount,
                frozen,
            })
            .collect();
        info.created_assets = world
            .assets
            .iter()
            .filter(|(_, record)| &record.creator == address)
            .map(|(&asset_id, record)| CreatedAsset {
                asset_id,
                asset_name: record.params.asset_name.clone(),
                unit_name: record.params.unit_name.clone(),
                total: record.params.total,
                decimals: record.params.decimals,
                url: record.params.url.clone(),
                metadata_hash: record.params.metadata_hash,
            })
            .collect();
        info.apps_local_state = state
            .app_local
            .iter()
            .map(|(&app_id, kv)| AppLocalState {
                app_id,
                key_value: kv.clone(),
            })
            .collect();
        info.created_apps = world
            .apps
            .iter()
            .filter(|(_, record)| &record.creator == address)
            .map(|(&app_id, record)| CreatedApp {
                app_id,
                global_state: record.global_state.clone(),
            })
            .collect();
        Ok(info)
    }

    async fn last_round(&self) -> Result<u64, LedgerError> {
        Ok(self.world.read().round)
    }

    async fn asset_notes(&self, asset_id: u64) -> Result<Vec<AssetNote>, LedgerError> {
        Ok(self
            .world
            .read()
            .notes
            .get(&asset_id)
            .cloned()
            .unwrap_or_default())
    }
}
