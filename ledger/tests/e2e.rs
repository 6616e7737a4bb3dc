//! End-to-end integration tests for the loan-log backend.
//!
//! These tests exercise the full lifecycle against the in-memory ledger:
//! service startup with the registrar assertion, log asset minting, note
//! appends and read-back, wallet-side opt-ins through unsigned blobs, and
//! the complete profile state machine including the opt-out that destroys
//! the record.
//!
//! Each test stands alone with its own ledger instance. No shared state,
//! no test ordering dependencies, no flaky failures.

use std::sync::Arc;

use serde_json::json;

use arbor_ledger::asset::{CollectionFrequency, NewLoanParams, NewLogAssetInput};
use arbor_ledger::client::MemoryLedger;
use arbor_ledger::config::Network;
use arbor_ledger::txn::{decode_unsigned, Transaction, TransactionPayload};
use arbor_ledger::{
    LedgerClient, LoanLogService, LoanState, OptInStatus, ProfileUpdate, ServiceConfig,
    ServiceError, UnlockedAccount,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const PROFILE_APP_ID: u64 = 11;

/// Spins up a funded master, a profile contract it controls, and a
/// connected service over a fresh in-memory ledger.
async fn setup() -> (Arc<MemoryLedger>, LoanLogService) {
    let ledger = Arc::new(MemoryLedger::new());
    let master = UnlockedAccount::generate();
    ledger.fund(&master.address(), 10_000_000_000);
    ledger
        .with_profile_app(PROFILE_APP_ID, &master.address(), &master.address())
        .expect("registrar address decodes");

    let config = ServiceConfig::new(master, PROFILE_APP_ID, Network::Local);
    let service = LoanLogService::connect(ledger.clone(), config)
        .await
        .expect("registrar check passes");
    (ledger, service)
}

fn loan_input(name: &str) -> NewLogAssetInput {
    NewLogAssetInput {
        asset_name: name.to_string(),
        loan_params: NewLoanParams {
            loan_id: "ll7".into(),
            borrower_info: "borrower-7".into(),
            principal: 2_500_000,
            apr_bps: 1_450,
            tenor_in_days: 120,
            start_date: 1_769_904_000,
            collection_frequency: CollectionFrequency::Monthly,
            data: "[\"inv-9\"]".into(),
        },
    }
}

/// Signs and submits a wallet-side opt-in blob as `account`.
async fn submit_blob(ledger: &MemoryLedger, blob: &str, account: &UnlockedAccount) {
    let signed = decode_unsigned(blob).expect("blob decodes").sign(account);
    ledger.submit(signed).await.expect("opt-in confirms");
}

// ---------------------------------------------------------------------------
// Loan log lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_loan_log_lifecycle() {
    let (_, service) = setup().await;

    // Mint, and see the asset in the registry.
    let minted = service
        .create_log_asset(&loan_input("loan-7"))
        .await
        .unwrap();
    let assets = service.created_assets().await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].asset_id, minted.asset_id);

    // Append three events; read them back in order.
    let events = [
        json!({"event": "disbursement", "amount": 2_500_000}),
        json!({"event": "repayment", "amount": 220_000}),
        json!({"event": "repayment", "amount": 220_000}),
    ];
    let mut txids = Vec::new();
    for event in &events {
        txids.push(service.append_log(minted.asset_id, event).await.unwrap());
    }

    let log = service.asset_log(minted.asset_id).await.unwrap();
    assert_eq!(log.len(), 3);
    for (entry, (event, txid)) in log.iter().zip(events.iter().zip(&txids)) {
        assert_eq!(&entry.payload, event);
        assert_eq!(&entry.txid, txid);
    }

    // The two identical repayments are still distinct transactions.
    assert_ne!(txids[1], txids[2]);
}

#[tokio::test]
async fn logs_are_isolated_per_asset() {
    let (_, service) = setup().await;
    let a = service.create_log_asset(&loan_input("loan-a")).await.unwrap();
    let b = service.create_log_asset(&loan_input("loan-b")).await.unwrap();

    service
        .append_log(a.asset_id, &json!({"event": "disbursement"}))
        .await
        .unwrap();

    assert_eq!(service.asset_log(a.asset_id).await.unwrap().len(), 1);
    assert!(service.asset_log(b.asset_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_asset_is_gated_before_the_ledger() {
    let (ledger, service) = setup().await;
    let before = ledger.last_round().await.unwrap();

    let err = service
        .append_log(424_242, &json!({"event": "noop"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownAsset(424_242)));

    // Nothing was submitted.
    assert_eq!(ledger.last_round().await.unwrap(), before);
}

// ---------------------------------------------------------------------------
// Profile state machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_lifecycle_including_opt_out() {
    let (ledger, service) = setup().await;
    let borrower = UnlockedAccount::generate();
    service.fund_account(&borrower.address()).await.unwrap();

    // Opt in through the wallet blob.
    let blob = service
        .profile_opt_in_blob(&borrower.address())
        .await
        .unwrap();
    submit_blob(&ledger, &blob, &borrower).await;

    // Write, then read back exactly what was written.
    let update = ProfileUpdate {
        user_address: borrower.address(),
        active_loan: Some("loan-7".into()),
        loan_state: LoanState::Live,
    };
    service.write_profile(&update).await.unwrap();

    let profile = service
        .read_profile(&borrower.address())
        .await
        .unwrap()
        .expect("record present");
    assert_eq!(profile.active_loan.as_deref(), Some("loan-7"));
    assert_eq!(profile.loan_state, LoanState::Live);
    assert_eq!(
        service.opt_in_status(&borrower.address()).await.unwrap(),
        OptInStatus::ProfileSet
    );

    // Opt-out destroys the record entirely.
    let sp = ledger.suggested_params().await.unwrap();
    let close = Transaction {
        sender: borrower.address(),
        first_valid: sp.first_valid,
        fee: sp.min_fee,
        note: None,
        payload: TransactionPayload::AppCloseOut {
            app_id: PROFILE_APP_ID,
        },
    }
    .sign(&borrower);
    ledger.submit(close).await.unwrap();

    assert_eq!(
        service.opt_in_status(&borrower.address()).await.unwrap(),
        OptInStatus::NotOptedIn
    );
    let err = service.read_profile(&borrower.address()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotOptedIn { .. }));

    // The cycle restarts: opt in again, storage is clean.
    let blob = service
        .profile_opt_in_blob(&borrower.address())
        .await
        .unwrap();
    submit_blob(&ledger, &blob, &borrower).await;
    assert!(service
        .read_profile(&borrower.address())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn misconfigured_service_refuses_to_start() {
    let ledger = Arc::new(MemoryLedger::new());
    let master = UnlockedAccount::generate();
    let registrar = UnlockedAccount::generate();
    ledger
        .with_profile_app(PROFILE_APP_ID, &master.address(), &registrar.address())
        .unwrap();

    let config = ServiceConfig::new(master, PROFILE_APP_ID, Network::Local);
    let err = LoanLogService::connect(ledger, config).await.unwrap_err();
    assert!(matches!(err, ServiceError::RegistrarMismatch { .. }));
}

// ---------------------------------------------------------------------------
// Funding and disbursement plumbing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn funded_borrower_can_receive_a_clawed_log_token() {
    let (ledger, service) = setup().await;
    let borrower = UnlockedAccount::generate();

    service.fund_account(&borrower.address()).await.unwrap();
    let minted = service.create_log_asset(&loan_input("loan-7")).await.unwrap();

    let blob = service
        .asset_opt_in_blob(&borrower.address(), minted.asset_id)
        .await
        .unwrap();
    submit_blob(&ledger, &blob, &borrower).await;

    service
        .clawback_transfer(
            minted.asset_id,
            &service.master_address(),
            &borrower.address(),
            1,
        )
        .await
        .unwrap();

    assert!(service
        .has_opted_in_to_asset(&borrower.address(), minted.asset_id)
        .await
        .unwrap());
    let info = ledger.account_info(&borrower.address()).await.unwrap();
    assert_eq!(info.holding(minted.asset_id).unwrap().amount, 1);
}
