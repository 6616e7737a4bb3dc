//! # Loan Log Service
//!
//! The high-level operations the HTTP layer exposes: minting loan-log
//! assets, appending and reading log entries, and writing borrower credit
//! profiles through the registrar-gated contract.
//!
//! [`LoanLogService`] owns the master account (registrar and asset
//! authority) and a [`LedgerClient`]. Construct it with
//! [`LoanLogService::connect`], which asserts at startup that the master
//! really is the registrar recorded in the profile contract — a service
//! holding the wrong key must refuse to run rather than fail on its first
//! write.
//!
//! All operations are single transactions: there is no cross-operation
//! state in the service itself, so concurrent calls interleave safely and
//! ordering between log appends is whatever order the ledger sealed them
//! in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::account::{Address, UnlockedAccount};
use crate::asset::{metadata_hash, NewLogAssetInput};
use crate::client::{
    wait_for_confirmation, AssetNote, CreatedApp, CreatedAsset, LedgerClient, PendingInfo,
};
use crate::config::{
    Network, ASSET_NAME_SUFFIX, ASSET_UNIT_NAME, FUNDING_MULTIPLIER, MIN_PARTICIPATION_AMOUNT,
    NEW_PROFILE_ARG, NOTE_PREFIX, STABLE_TOKEN_DECIMALS, STABLE_TOKEN_ID,
};
use crate::error::{classify_rejection, LedgerError, ServiceError};
use crate::profile::{check_registrar, CreditProfile, LoanState, OptInStatus};
use crate::txn::{
    encode_unsigned, AssetConfigParams, Transaction, TransactionPayload,
};

// ---------------------------------------------------------------------------
// Configuration and request/response types
// ---------------------------------------------------------------------------

/// Static configuration of one service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// The registrar / asset-authority account. Holds the only key the
    /// service signs with.
    pub master: UnlockedAccount,
    /// Id of the profile contract.
    pub profile_app_id: u64,
    pub network: Network,
    /// Id of the stable token used for disbursement transfers.
    pub stable_token_id: u64,
}

impl ServiceConfig {
    pub fn new(master: UnlockedAccount, profile_app_id: u64, network: Network) -> Self {
        Self {
            master,
            profile_app_id,
            network,
            stable_token_id: STABLE_TOKEN_ID,
        }
    }
}

/// A borrower credit write: target account plus the new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub user_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_loan: Option<String>,
    pub loan_state: LoanState,
}

impl ProfileUpdate {
    fn record(&self) -> CreditProfile {
        CreditProfile {
            active_loan: self.active_loan.clone(),
            loan_state: self.loan_state,
        }
    }
}

/// Outcome of minting a log asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedLogAsset {
    pub asset_id: u64,
    pub txid: String,
}

/// One decoded entry of a loan log, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub txid: String,
    pub round: u64,
    pub payload: Value,
}

// ---------------------------------------------------------------------------
// LoanLogService
// ---------------------------------------------------------------------------

/// The loan-log backend: asset lifecycle, note appends, profile writes.
#[derive(Clone)]
pub struct LoanLogService {
    client: Arc<dyn LedgerClient + Send + Sync>,
    config: ServiceConfig,
}

impl std::fmt::Debug for LoanLogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanLogService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LoanLogService {
    /// Builds a service without the registrar assertion. Use
    /// [`LoanLogService::connect`] everywhere except tests that need a
    /// deliberately misconfigured instance.
    pub fn new(client: Arc<dyn LedgerClient + Send + Sync>, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    /// Builds a service and asserts the master account is the registrar
    /// of the profile contract. Fails with
    /// [`ServiceError::RegistrarMismatch`] otherwise — including when the
    /// contract is missing from the master's created applications.
    pub async fn connect(
        client: Arc<dyn LedgerClient + Send + Sync>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        let service = Self::new(client, config);
        service.assert_registrar().await?;
        info!(
            app_id = service.config.profile_app_id,
            network = %service.config.network,
            "registrar check passed"
        );
        Ok(service)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn master_address(&self) -> Address {
        self.config.master.address()
    }

    /// The latest sealed round, for liveness probes.
    pub async fn ledger_round(&self) -> Result<u64, ServiceError> {
        Ok(self.client.last_round().await?)
    }

    async fn assert_registrar(&self) -> Result<(), ServiceError> {
        let master = self.master_address();
        let app_id = self.config.profile_app_id;
        let info = self.client.account_info(&master).await?;
        let app = info
            .created_apps
            .iter()
            .find(|a: &&CreatedApp| a.app_id == app_id);
        let ok = match app {
            Some(app) => check_registrar(&app.global_state, &master),
            None => false,
        };
        if ok {
            Ok(())
        } else {
            Err(ServiceError::RegistrarMismatch {
                address: master,
                app_id,
            })
        }
    }

    /// Builds an unsigned transaction from `master` with current params.
    async fn build(
        &self,
        note: Option<Vec<u8>>,
        payload: TransactionPayload,
    ) -> Result<Transaction, LedgerError> {
        let sp = self.client.suggested_params().await?;
        Ok(Transaction {
            sender: self.master_address(),
            first_valid: sp.first_valid,
            fee: sp.min_fee,
            note,
            payload,
        })
    }

    /// Signs with the master key, submits, and waits for confirmation.
    async fn sign_submit_wait(
        &self,
        txn: Transaction,
    ) -> Result<(String, PendingInfo), LedgerError> {
        let signed = txn.sign(&self.config.master);
        let txid = self.client.submit(signed).await?;
        let pending = wait_for_confirmation(self.client.as_ref(), &txid).await?;
        Ok((txid, pending))
    }

    // -----------------------------------------------------------------------
    // Log assets
    // -----------------------------------------------------------------------

    /// Mints a loan-log asset: supply 1, zero decimals, frozen by default,
    /// all authorities held by the master, named `<base>@arc3` with the
    /// loan terms committed in the metadata hash.
    pub async fn create_log_asset(
        &self,
        input: &NewLogAssetInput,
    ) -> Result<MintedLogAsset, ServiceError> {
        let name = format!("{}{}", input.asset_name, ASSET_NAME_SUFFIX);
        let hash = metadata_hash(&name, &input.loan_params);
        let master = self.master_address();

        let txn = self
            .build(
                None,
                TransactionPayload::AssetConfig(AssetConfigParams {
                    total: 1,
                    decimals: 0,
                    default_frozen: true,
                    asset_name: name.clone(),
                    unit_name: ASSET_UNIT_NAME.to_string(),
                    url: String::new(),
                    metadata_hash: Some(hash),
                    manager: Some(master.clone()),
                    reserve: Some(master.clone()),
                    freeze: Some(master.clone()),
                    clawback: Some(master),
                }),
            )
            .await?;
        let (txid, pending) = self.sign_submit_wait(txn).await?;
        let asset_id = pending.asset_index.ok_or_else(|| {
            LedgerError::Remote(format!("confirmed {txid} carries no asset index"))
        })?;
        info!(asset_id, name = %name, "log asset minted");
        Ok(MintedLogAsset { asset_id, txid })
    }

    /// All log assets the master has minted.
    pub async fn created_assets(&self) -> Result<Vec<CreatedAsset>, ServiceError> {
        let info = self.client.account_info(&self.master_address()).await?;
        Ok(info.created_assets)
    }

    /// One log asset by id, or [`ServiceError::UnknownAsset`] when the
    /// master never minted it. Gates every append so typoed ids fail
    /// before anything hits the ledger.
    pub async fn created_asset(&self, asset_id: u64) -> Result<CreatedAsset, ServiceError> {
        self.created_assets()
            .await?
            .into_iter()
            .find(|a| a.asset_id == asset_id)
            .ok_or(ServiceError::UnknownAsset(asset_id))
    }

    /// Appends one entry to a loan log.
    ///
    /// The entry rides in the note field of a zero-amount clawback of the
    /// log token from the master back to the master: units never move, but
    /// the transaction — and with it the note — lands in the asset's
    /// permanent history.
    pub async fn append_log(&self, asset_id: u64, payload: &Value) -> Result<String, ServiceError> {
        self.created_asset(asset_id).await?;
        let master = self.master_address();
        let note = crate::note::encode(NOTE_PREFIX, payload);

        let txn = self
            .build(
                Some(note),
                TransactionPayload::AssetTransfer {
                    asset_id,
                    amount: 0,
                    receiver: master.clone(),
                    revocation_target: Some(master),
                },
            )
            .await?;
        let (txid, _) = self.sign_submit_wait(txn).await?;
        info!(asset_id, txid = %txid, "log entry appended");
        Ok(txid)
    }

    /// Reads a loan log back, oldest first. Notes that do not decode under
    /// the expected prefix are skipped, not fatal — foreign transactions
    /// may touch the asset and their notes are not ours to interpret.
    pub async fn asset_log(&self, asset_id: u64) -> Result<Vec<LogEntry>, ServiceError> {
        self.created_asset(asset_id).await?;
        let notes = self.client.asset_notes(asset_id).await?;
        let mut entries = Vec::with_capacity(notes.len());
        for AssetNote { txid, round, note } in notes {
            match crate::note::decode(&note, NOTE_PREFIX) {
                Ok(payload) => entries.push(LogEntry {
                    txid,
                    round,
                    payload,
                }),
                Err(err) => debug!(%txid, %err, "skipping undecodable note"),
            }
        }
        Ok(entries)
    }

    // -----------------------------------------------------------------------
    // Credit profiles
    // -----------------------------------------------------------------------

    /// Writes a borrower's credit record, creating or overwriting it.
    ///
    /// The write is an application call signed by the registrar with the
    /// borrower as the foreign account. Contract rejections are translated:
    /// a missing opt-in becomes [`ServiceError::NotOptedIn`], an approval
    /// rejection becomes [`ServiceError::Unauthorized`].
    pub async fn write_profile(&self, update: &ProfileUpdate) -> Result<String, ServiceError> {
        let app_id = self.config.profile_app_id;
        let record = update.record().to_state_bytes();

        let txn = self
            .build(
                None,
                TransactionPayload::AppCall {
                    app_id,
                    args: vec![NEW_PROFILE_ARG.to_vec(), record],
                    accounts: vec![update.user_address.clone()],
                },
            )
            .await
            .map_err(ServiceError::Ledger)?;

        let signed = txn.sign(&self.config.master);
        let txid = self
            .client
            .submit(signed)
            .await
            .map_err(|e| classify_rejection(e, &update.user_address, app_id))?;
        wait_for_confirmation(self.client.as_ref(), &txid).await?;
        info!(
            address = update.user_address.as_str(),
            state = %update.loan_state,
            "credit profile written"
        );
        Ok(txid)
    }

    /// Reads a borrower's credit record.
    ///
    /// Returns `Ok(None)` for an account that opted in but has no record
    /// yet; an account with no contract-local storage at all is a
    /// [`ServiceError::NotOptedIn`].
    pub async fn read_profile(
        &self,
        address: &Address,
    ) -> Result<Option<CreditProfile>, ServiceError> {
        let app_id = self.config.profile_app_id;
        let info = self.client.account_info(address).await?;
        let local = info.local_state(app_id).ok_or(ServiceError::NotOptedIn {
            address: address.clone(),
            app_id,
        })?;
        match local.get(crate::config::CREDIT_STATE_KEY) {
            None => Ok(None),
            Some(value) => {
                let bytes = value.as_bytes().ok_or_else(|| {
                    ServiceError::Ledger(LedgerError::Remote(
                        "credit key holds a uint, expected bytes".into(),
                    ))
                })?;
                Ok(Some(CreditProfile::from_state_bytes(bytes)?))
            }
        }
    }

    /// Where `address` stands in the profile lifecycle.
    pub async fn opt_in_status(&self, address: &Address) -> Result<OptInStatus, ServiceError> {
        let info = self.client.account_info(address).await?;
        Ok(OptInStatus::of(&info, self.config.profile_app_id))
    }

    /// Whether `address` holds (is opted in to) `asset_id`.
    pub async fn has_opted_in_to_asset(
        &self,
        address: &Address,
        asset_id: u64,
    ) -> Result<bool, ServiceError> {
        let info = self.client.account_info(address).await?;
        Ok(info.holding(asset_id).is_some())
    }

    // -----------------------------------------------------------------------
    // Unsigned blobs for wallet-side signing
    // -----------------------------------------------------------------------

    /// Unsigned asset opt-in for `address`, hex-encoded for a wallet.
    pub async fn asset_opt_in_blob(
        &self,
        address: &Address,
        asset_id: u64,
    ) -> Result<String, ServiceError> {
        let sp = self.client.suggested_params().await?;
        Ok(encode_unsigned(&Transaction {
            sender: address.clone(),
            first_valid: sp.first_valid,
            fee: sp.min_fee,
            note: None,
            payload: TransactionPayload::AssetOptIn { asset_id },
        }))
    }

    /// Unsigned profile-contract opt-in for `address`.
    pub async fn profile_opt_in_blob(&self, address: &Address) -> Result<String, ServiceError> {
        let sp = self.client.suggested_params().await?;
        Ok(encode_unsigned(&Transaction {
            sender: address.clone(),
            first_valid: sp.first_valid,
            fee: sp.min_fee,
            note: None,
            payload: TransactionPayload::AppOptIn {
                app_id: self.config.profile_app_id,
            },
        }))
    }

    /// Unsigned stable-token transfer of `amount` whole tokens from
    /// `sender` to `receiver`.
    pub async fn stable_transfer_blob(
        &self,
        sender: &Address,
        receiver: &Address,
        amount: u64,
    ) -> Result<String, ServiceError> {
        let base_units = amount
            .checked_mul(10u64.pow(STABLE_TOKEN_DECIMALS))
            .ok_or_else(|| {
                ServiceError::Ledger(LedgerError::Encoding(format!(
                    "amount {amount} overflows base units"
                )))
            })?;
        let sp = self.client.suggested_params().await?;
        Ok(encode_unsigned(&Transaction {
            sender: sender.clone(),
            first_valid: sp.first_valid,
            fee: sp.min_fee,
            note: None,
            payload: TransactionPayload::AssetTransfer {
                asset_id: self.config.stable_token_id,
                amount: base_units,
                receiver: receiver.clone(),
                revocation_target: None,
            },
        }))
    }

    // -----------------------------------------------------------------------
    // Admin operations
    // -----------------------------------------------------------------------

    /// Sends `address` enough of the native token to participate:
    /// the minimum participation amount times a headroom multiplier.
    pub async fn fund_account(&self, address: &Address) -> Result<String, ServiceError> {
        let txn = self
            .build(
                None,
                TransactionPayload::Payment {
                    amount: MIN_PARTICIPATION_AMOUNT * FUNDING_MULTIPLIER,
                    receiver: address.clone(),
                },
            )
            .await?;
        let (txid, _) = self.sign_submit_wait(txn).await?;
        info!(address = address.as_str(), txid = %txid, "account funded");
        Ok(txid)
    }

    /// Claws `amount` base units of `asset_id` out of `from` and delivers
    /// them to `receiver`, under the master's clawback authority.
    pub async fn clawback_transfer(
        &self,
        asset_id: u64,
        from: &Address,
        receiver: &Address,
        amount: u64,
    ) -> Result<String, ServiceError> {
        let txn = self
            .build(
                None,
                TransactionPayload::AssetTransfer {
                    asset_id,
                    amount,
                    receiver: receiver.clone(),
                    revocation_target: Some(from.clone()),
                },
            )
            .await?;
        let (txid, _) = self.sign_submit_wait(txn).await?;
        info!(asset_id, txid = %txid, "clawback transfer confirmed");
        Ok(txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{CollectionFrequency, NewLoanParams};
    use crate::client::MemoryLedger;
    use crate::txn::decode_unsigned;
    use serde_json::json;

    const APP_ID: u64 = 7;

    fn loan_input(name: &str) -> NewLogAssetInput {
        NewLogAssetInput {
            asset_name: name.to_string(),
            loan_params: NewLoanParams {
                loan_id: "ll42".into(),
                borrower_info: "borrower-42".into(),
                principal: 5_000_000,
                apr_bps: 1_300,
                tenor_in_days: 90,
                start_date: 1_767_225_600,
                collection_frequency: CollectionFrequency::Weekly,
                data: "[\"inv-1\",\"inv-2\"]".into(),
            },
        }
    }

    async fn connected_service() -> (Arc<MemoryLedger>, LoanLogService) {
        let ledger = Arc::new(MemoryLedger::new());
        let master = UnlockedAccount::generate();
        ledger.fund(&master.address(), 1_000_000_000);
        ledger
            .with_profile_app(APP_ID, &master.address(), &master.address())
            .unwrap();
        let config = ServiceConfig::new(master, APP_ID, Network::Local);
        let service = LoanLogService::connect(ledger.clone(), config)
            .await
            .unwrap();
        (ledger, service)
    }

    #[tokio::test]
    async fn connect_rejects_non_registrar_master() {
        let ledger = Arc::new(MemoryLedger::new());
        let master = UnlockedAccount::generate();
        let actual_registrar = UnlockedAccount::generate();
        ledger
            .with_profile_app(APP_ID, &master.address(), &actual_registrar.address())
            .unwrap();

        let config = ServiceConfig::new(master, APP_ID, Network::Local);
        let err = LoanLogService::connect(ledger, config).await.unwrap_err();
        assert!(matches!(err, ServiceError::RegistrarMismatch { .. }));
    }

    #[tokio::test]
    async fn connect_rejects_missing_contract() {
        let ledger = Arc::new(MemoryLedger::new());
        let master = UnlockedAccount::generate();
        let config = ServiceConfig::new(master, APP_ID, Network::Local);
        let err = LoanLogService::connect(ledger, config).await.unwrap_err();
        assert!(matches!(err, ServiceError::RegistrarMismatch { .. }));
    }

    #[tokio::test]
    async fn mint_append_read_roundtrip() {
        let (_, service) = connected_service().await;

        let minted = service.create_log_asset(&loan_input("loan-42")).await.unwrap();
        let asset = service.created_asset(minted.asset_id).await.unwrap();
        assert_eq!(asset.asset_name, "loan-42@arc3");
        assert_eq!(asset.total, 1);
        assert_eq!(asset.decimals, 0);
        assert!(asset.metadata_hash.is_some());

        let entry = json!({"event": "disbursement", "amount": 5_000_000});
        let txid = service.append_log(minted.asset_id, &entry).await.unwrap();

        let log = service.asset_log(minted.asset_id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].txid, txid);
        assert_eq!(log[0].payload, entry);
    }

    #[tokio::test]
    async fn identical_appends_get_distinct_txids() {
        let (_, service) = connected_service().await;
        let minted = service.create_log_asset(&loan_input("loan-42")).await.unwrap();

        let entry = json!({"event": "repayment", "amount": 100});
        let first = service.append_log(minted.asset_id, &entry).await.unwrap();
        let second = service.append_log(minted.asset_id, &entry).await.unwrap();
        assert_ne!(first, second);

        let log = service.asset_log(minted.asset_id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].round < log[1].round);
    }

    #[tokio::test]
    async fn append_to_unknown_asset_fails_fast() {
        let (_, service) = connected_service().await;
        let err = service
            .append_log(999_999, &json!({"event": "noop"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownAsset(999_999)));
    }

    #[tokio::test]
    async fn profile_write_requires_opt_in() {
        let (ledger, service) = connected_service().await;
        let borrower = UnlockedAccount::generate();
        ledger.fund(&borrower.address(), 10_000_000);

        let update = ProfileUpdate {
            user_address: borrower.address(),
            active_loan: Some("1042".into()),
            loan_state: LoanState::Live,
        };
        let err = service.write_profile(&update).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotOptedIn { .. }));
        assert_eq!(
            service.opt_in_status(&borrower.address()).await.unwrap(),
            OptInStatus::NotOptedIn
        );

        // Wallet-side opt-in: decode the blob, sign, submit.
        let blob = service.profile_opt_in_blob(&borrower.address()).await.unwrap();
        let signed = decode_unsigned(&blob).unwrap().sign(&borrower);
        ledger.submit(signed).await.unwrap();
        assert_eq!(
            service.opt_in_status(&borrower.address()).await.unwrap(),
            OptInStatus::OptedIn
        );
        assert!(service.read_profile(&borrower.address()).await.unwrap().is_none());

        service.write_profile(&update).await.unwrap();
        let profile = service
            .read_profile(&borrower.address())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.active_loan.as_deref(), Some("1042"));
        assert_eq!(profile.loan_state, LoanState::Live);
        assert_eq!(
            service.opt_in_status(&borrower.address()).await.unwrap(),
            OptInStatus::ProfileSet
        );
    }

    #[tokio::test]
    async fn profile_write_overwrites_existing_record() {
        let (ledger, service) = connected_service().await;
        let borrower = UnlockedAccount::generate();
        ledger.fund(&borrower.address(), 10_000_000);

        let blob = service.profile_opt_in_blob(&borrower.address()).await.unwrap();
        ledger
            .submit(decode_unsigned(&blob).unwrap().sign(&borrower))
            .await
            .unwrap();

        service
            .write_profile(&ProfileUpdate {
                user_address: borrower.address(),
                active_loan: Some("1042".into()),
                loan_state: LoanState::Live,
            })
            .await
            .unwrap();
        service
            .write_profile(&ProfileUpdate {
                user_address: borrower.address(),
                active_loan: None,
                loan_state: LoanState::Repaid,
            })
            .await
            .unwrap();

        let profile = service
            .read_profile(&borrower.address())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.active_loan, None);
        assert_eq!(profile.loan_state, LoanState::Repaid);
    }

    #[tokio::test]
    async fn non_registrar_service_cannot_write_profiles() {
        let (ledger, service) = connected_service().await;
        let borrower = UnlockedAccount::generate();
        let blob = service.profile_opt_in_blob(&borrower.address()).await.unwrap();
        ledger
            .submit(decode_unsigned(&blob).unwrap().sign(&borrower))
            .await
            .unwrap();

        // A second service over the same ledger with a different key,
        // built without the registrar assertion.
        let rogue = ServiceConfig::new(UnlockedAccount::generate(), APP_ID, Network::Local);
        let rogue_service = LoanLogService::new(ledger, rogue);

        let err = rogue_service
            .write_profile(&ProfileUpdate {
                user_address: borrower.address(),
                active_loan: Some("evil".into()),
                loan_state: LoanState::Defaulted,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn asset_opt_in_blob_is_usable() {
        let (ledger, service) = connected_service().await;
        let minted = service.create_log_asset(&loan_input("loan-7")).await.unwrap();
        let holder = UnlockedAccount::generate();

        assert!(!service
            .has_opted_in_to_asset(&holder.address(), minted.asset_id)
            .await
            .unwrap());

        let blob = service
            .asset_opt_in_blob(&holder.address(), minted.asset_id)
            .await
            .unwrap();
        ledger
            .submit(decode_unsigned(&blob).unwrap().sign(&holder))
            .await
            .unwrap();

        assert!(service
            .has_opted_in_to_asset(&holder.address(), minted.asset_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn stable_transfer_blob_scales_to_base_units() {
        let (_, service) = connected_service().await;
        let sender = UnlockedAccount::generate();
        let receiver = UnlockedAccount::generate();

        let blob = service
            .stable_transfer_blob(&sender.address(), &receiver.address(), 25)
            .await
            .unwrap();
        let txn = decode_unsigned(&blob).unwrap();
        match txn.payload {
            TransactionPayload::AssetTransfer {
                asset_id, amount, ..
            } => {
                assert_eq!(asset_id, STABLE_TOKEN_ID);
                assert_eq!(amount, 25_000_000);
            }
            other => panic!("unexpected payload {other:?}"),
        }

        let err = service
            .stable_transfer_blob(&sender.address(), &receiver.address(), u64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Ledger(LedgerError::Encoding(_))));
    }

    #[tokio::test]
    async fn fund_account_sends_participation_headroom() {
        let (ledger, service) = connected_service().await;
        let recipient = UnlockedAccount::generate();

        service.fund_account(&recipient.address()).await.unwrap();
        let info = ledger.account_info(&recipient.address()).await.unwrap();
        assert_eq!(info.balance, MIN_PARTICIPATION_AMOUNT * FUNDING_MULTIPLIER);
    }

    #[tokio::test]
    async fn clawback_transfer_moves_units() {
        let (ledger, service) = connected_service().await;
        let holder = UnlockedAccount::generate();

        let minted = service.create_log_asset(&loan_input("loan-9")).await.unwrap();
        let blob = service
            .asset_opt_in_blob(&holder.address(), minted.asset_id)
            .await
            .unwrap();
        ledger
            .submit(decode_unsigned(&blob).unwrap().sign(&holder))
            .await
            .unwrap();

        // Master holds the single unit; claw it from master to the holder.
        service
            .clawback_transfer(
                minted.asset_id,
                &service.master_address(),
                &holder.address(),
                1,
            )
            .await
            .unwrap();

        let info = ledger.account_info(&holder.address()).await.unwrap();
        assert_eq!(info.holding(minted.asset_id).unwrap().amount, 1);
    }
}
