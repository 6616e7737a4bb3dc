//! # Credit Profiles
//!
//! The borrower credit record stored in the profile contract's per-account
//! local state, and the registrar check that gates every write to it.
//!
//! ## State machine
//!
//! ```text
//!    ┌────────────┐  opt-in   ┌──────────┐  registrar   ┌─────────────┐
//!    │ NotOptedIn │──────────►│ OptedIn  │─────────────►│ ProfileSet  │
//!    └────────────┘           └──────────┘   write      └──────┬──────┘
//!          ▲                       ▲                           │
//!          │      close-out        │        (overwrite) ◄──────┘
//!          └───────────────────────┴───────────────────────────┘
//! ```
//!
//! Opt-in allocates the contract-local storage; a registrar-signed write
//! places (or overwrites) the `credit` record; close-out deallocates the
//! storage and destroys the record. The cycle repeats indefinitely — there
//! is no terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::account::Address;
use crate::client::{AccountInfo, StateValue, TealKeyValue};
use crate::config::{CREDIT_STATE_KEY, REGISTRAR_STATE_KEY};
use crate::error::NoteError;

// ---------------------------------------------------------------------------
// LoanState
// ---------------------------------------------------------------------------

/// Repayment state of the borrower's active loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanState {
    /// Loan is outstanding and being serviced.
    Live,
    /// Loan has been fully repaid.
    Repaid,
    /// Borrower missed their obligations; the loan is in collection.
    Defaulted,
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Repaid => write!(f, "repaid"),
            Self::Defaulted => write!(f, "defaulted"),
        }
    }
}

// ---------------------------------------------------------------------------
// CreditProfile
// ---------------------------------------------------------------------------

/// The borrower's credit record, JSON-serialized under the contract-local
/// `credit` key. One record per (account, contract) pair, overwritten on
/// update, destroyed on opt-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditProfile {
    /// Identifier of the active loan's log asset, absent when no loan is
    /// outstanding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_loan: Option<String>,
    pub loan_state: LoanState,
}

impl CreditProfile {
    /// Serializes the record to the bytes stored in contract-local state.
    pub fn to_state_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("credit profile serializes")
    }

    /// Decodes a record from contract-local state bytes.
    pub fn from_state_bytes(bytes: &[u8]) -> Result<Self, NoteError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| NoteError::MalformedNote("credit record is not UTF-8".into()))?;
        serde_json::from_str(text).map_err(NoteError::InvalidPayload)
    }
}

// ---------------------------------------------------------------------------
// OptInStatus
// ---------------------------------------------------------------------------

/// Where an account stands in the profile lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptInStatus {
    /// No contract-local storage allocated; writes must fail.
    NotOptedIn,
    /// Storage allocated, no credit record yet.
    OptedIn,
    /// Storage allocated and a credit record is present.
    ProfileSet,
}

impl OptInStatus {
    /// Derives the status from an account-info snapshot.
    pub fn of(info: &AccountInfo, app_id: u64) -> Self {
        match info.local_state(app_id) {
            None => OptInStatus::NotOptedIn,
            Some(kv) if kv.contains_key(CREDIT_STATE_KEY) => OptInStatus::ProfileSet,
            Some(_) => OptInStatus::OptedIn,
        }
    }

    /// Whether the contract will accept a profile write for this account.
    pub fn accepts_writes(&self) -> bool {
        !matches!(self, OptInStatus::NotOptedIn)
    }
}

// ---------------------------------------------------------------------------
// Registrar check
// ---------------------------------------------------------------------------

/// Checks whether the contract's global state names `candidate` as the
/// registrar.
///
/// The registrar is stored as the raw 32 bytes of its public key. An absent
/// key, a non-bytes value, or bytes that do not decode to a valid address
/// all yield `false` — this function never errors for "not found". Callers
/// performing the startup assertion treat `false` as a configuration error
/// and refuse to start.
pub fn check_registrar(global_state: &TealKeyValue, candidate: &Address) -> bool {
    match global_state.get(REGISTRAR_STATE_KEY) {
        Some(StateValue::Bytes(raw)) => match Address::from_bytes(raw) {
            Some(registrar) => &registrar == candidate,
            None => false,
        },
        Some(StateValue::Uint(_)) | None => false,
    }
}
