//! # Service Configuration & Constants
//!
//! Every magic number and well-known key of the loan-log convention lives
//! here. The note prefix and the contract state keys are a *wire convention*
//! shared with the profile contract and with every reader of the log — treat
//! a change to any of them as a breaking protocol change, not a refactor.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Note-field convention
// ---------------------------------------------------------------------------

/// Application prefix for note-field payloads.
///
/// Every log entry written by this service starts with this tag, followed
/// immediately (no separator) by the JSON serialization of the payload.
/// The trailing `j` is the payload-format tag: JSON. A future CBOR encoding
/// would ship as `arboreum/v1:c` without touching v1 readers.
pub const NOTE_PREFIX: &str = "arboreum/v1:j";

// ---------------------------------------------------------------------------
// Profile contract conventions
// ---------------------------------------------------------------------------

/// Local-state key under which the borrower's credit record is stored.
pub const CREDIT_STATE_KEY: &str = "credit";

/// Global-state key holding the raw 32-byte public key of the registrar —
/// the only account the profile contract allows to write local state.
pub const REGISTRAR_STATE_KEY: &str = "registrar";

/// First application argument of a profile-write call.
pub const NEW_PROFILE_ARG: &[u8] = b"new_profile";

// ---------------------------------------------------------------------------
// Asset conventions
// ---------------------------------------------------------------------------

/// Suffix appended to every log-asset name, marking ARC-3-style metadata.
pub const ASSET_NAME_SUFFIX: &str = "@arc3";

/// Unit name for log assets. They are one-of-one tracking tokens; the unit
/// name carries no information.
pub const ASSET_UNIT_NAME: &str = "unit";

/// Asset id of the stable token used for disbursements and repayments.
pub const STABLE_TOKEN_ID: u64 = 31_566_704;

/// Decimals of the stable token. Human-facing amounts are scaled by
/// `10^STABLE_TOKEN_DECIMALS` before hitting the ledger.
pub const STABLE_TOKEN_DECIMALS: u32 = 6;

// ---------------------------------------------------------------------------
// Funding
// ---------------------------------------------------------------------------

/// Minimum balance (in base units) an account needs per ledger obligation:
/// one to exist, one per asset opt-in, one per application opt-in.
pub const MIN_PARTICIPATION_AMOUNT: u64 = 1_000_000;

/// A fresh borrower needs three obligations covered: base existence, the
/// stable-token opt-in, and the profile-contract opt-in.
pub const FUNDING_MULTIPLIER: u64 = 3;

// ---------------------------------------------------------------------------
// Confirmation polling
// ---------------------------------------------------------------------------

/// Delay between successive pending-info polls while waiting for a
/// submitted transaction to confirm.
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Give up waiting for confirmation after this many polls. There is no
/// cancelling a submitted transaction — past this point we report failure
/// and leave the outcome to the ledger.
pub const MAX_CONFIRMATION_POLLS: u32 = 20;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The ledger network a service instance is pointed at.
///
/// Only `Local` has an in-process ledger implementation; the public
/// networks require an external node binding behind the
/// [`LedgerClient`](crate::client::LedgerClient) trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// In-process ledger, reset on restart. The development default.
    Local,
    /// A sandboxed node under the operator's control.
    Sandbox,
    /// The public test network.
    Testnet,
    /// The real deal. Mistakes here cost real money.
    Mainnet,
}

impl Network {
    /// Parses a network name. Case-insensitive; unrecognized values are an
    /// error rather than a silent default — pointing a service at the wrong
    /// network is exactly the mistake this should catch.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Some(Network::Local),
            "sandbox" => Some(Network::Sandbox),
            "testnet" => Some(Network::Testnet),
            "mainnet" => Some(Network::Mainnet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Local => write!(f, "local"),
            Network::Sandbox => write!(f, "sandbox"),
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_prefix_is_versioned_json() {
        assert!(NOTE_PREFIX.starts_with("arboreum/"));
        assert!(NOTE_PREFIX.ends_with(":j"));
    }

    #[test]
    fn network_parse_roundtrip() {
        for net in [
            Network::Local,
            Network::Sandbox,
            Network::Testnet,
            Network::Mainnet,
        ] {
            assert_eq!(Network::parse(&net.to_string()), Some(net));
        }
    }

    #[test]
    fn network_parse_is_case_insensitive() {
        assert_eq!(Network::parse("MAINNET"), Some(Network::Mainnet));
        assert_eq!(Network::parse("Local"), Some(Network::Local));
    }

    #[test]
    fn network_parse_rejects_unknown() {
        assert_eq!(Network::parse("betanet"), None);
        assert_eq!(Network::parse(""), None);
    }

    #[test]
    fn funding_constants_sanity() {
        assert!(MIN_PARTICIPATION_AMOUNT > 0);
        assert_eq!(FUNDING_MULTIPLIER, 3);
    }

    #[test]
    fn confirmation_window_is_bounded() {
        // The total wait must stay well under a typical HTTP client timeout.
        let total = CONFIRMATION_POLL_INTERVAL * MAX_CONFIRMATION_POLLS;
        assert!(total <= Duration::from_secs(30));
    }
}
