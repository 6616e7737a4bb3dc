//! Error types for the loan-log service.
//!
//! The taxonomy splits along the module boundaries: [`NoteError`] for the
//! note codec, [`LedgerError`] for anything the remote ledger reports, and
//! [`ServiceError`] for the operation layer that callers actually see.
//!
//! Ledger rejections arrive as free-form strings from the node, so
//! [`classify_rejection`] maps the known contract failure modes onto typed
//! errors by substring. That matching is a deliberately fragile integration
//! point: it covers exactly the messages the profile contract and node are
//! known to emit, and anything unrecognized passes through as
//! [`ServiceError::Ledger`] with the original text intact.

use thiserror::Error;

use crate::account::Address;

/// Errors produced by the note codec.
#[derive(Debug, Error)]
pub enum NoteError {
    /// The note is not valid UTF-8 or does not contain the expected prefix.
    #[error("malformed note: {0}")]
    MalformedNote(String),

    /// The text after the prefix is not valid JSON.
    #[error("invalid note payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

/// Errors reported by a [`LedgerClient`](crate::client::LedgerClient)
/// implementation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The node rejected the transaction during validation or execution.
    /// The message is the node's own wording, preserved verbatim so the
    /// boundary classifier (and the operator reading logs) can see it.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The queried transaction id is unknown to the node.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),

    /// The transaction was submitted but did not confirm within the
    /// polling window. It may still confirm later — the caller must not
    /// resubmit the same transaction.
    #[error("transaction {txid} not confirmed after {polls} polls")]
    ConfirmationTimeout {
        /// Id of the transaction we gave up waiting on.
        txid: String,
        /// Number of pending-info polls performed.
        polls: u32,
    },

    /// Serialization of a transaction or blob failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Transport-level or otherwise uninterpreted node error.
    #[error("ledger error: {0}")]
    Remote(String),
}

/// Errors surfaced by [`LoanLogService`](crate::service::LoanLogService)
/// operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced asset was not created by this service's master
    /// account.
    #[error("asset {0} not known to this service")]
    UnknownAsset(u64),

    /// Note codec failure.
    #[error(transparent)]
    Note(#[from] NoteError),

    /// A profile write targeted an account that has not opted in to the
    /// profile contract.
    #[error("account {address} has not opted in to application {app_id}")]
    NotOptedIn {
        /// The borrower account that was targeted.
        address: Address,
        /// The profile contract id.
        app_id: u64,
    },

    /// The profile contract rejected the write because the signing account
    /// is not the registrar.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The configured master account is not the registrar recorded in the
    /// profile contract's global state. Raised once, at service
    /// construction — the service refuses to start in this shape.
    #[error("account {address} is not the registrar of application {app_id}")]
    RegistrarMismatch {
        /// The master account that failed the check.
        address: Address,
        /// The profile contract id.
        app_id: u64,
    },

    /// Any ledger failure that does not map to a known contract
    /// precondition.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Maps a ledger rejection onto the profile-write error taxonomy.
///
/// Only two contract preconditions are distinguishable today, both by the
/// node's message text: the borrower not having opted in, and the approval
/// program rejecting a non-registrar signer. Everything else stays a
/// [`ServiceError::Ledger`].
pub fn classify_rejection(err: LedgerError, address: &Address, app_id: u64) -> ServiceError {
    match &err {
        LedgerError::Rejected(msg) if msg.contains("has not opted in") => {
            ServiceError::NotOptedIn {
                address: address.clone(),
                app_id,
            }
        }
        LedgerError::Rejected(msg)
            if msg.contains("rejected by ApprovalProgram") || msg.contains("unauthorized") =>
        {
            ServiceError::Unauthorized(msg.clone())
        }
        _ => ServiceError::Ledger(err),
    }
}
