//! # Accounts & Addresses
//!
//! Ed25519 keypairs and their derived ledger addresses.
//!
//! An [`Address`] is the hex encoding of a 32-byte Ed25519 public key —
//! opaque to everything in this crate except signature verification and the
//! registrar check, which needs to decode the raw bytes the contract stores
//! in global state. An [`UnlockedAccount`] is an address plus the signing
//! key that controls it.
//!
//! Key bytes are never logged. If you add logging to this module, you will
//! be asked to leave.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from key and address handling.
///
/// Deliberately vague about *why* decoding failed — error messages must not
/// leak key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key: wrong length or not valid hex")]
    InvalidSecretKey,

    #[error("invalid address: not a 32-byte hex-encoded public key")]
    InvalidAddress,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A ledger address: the hex encoding of a 32-byte Ed25519 public key.
///
/// Always lowercase, always 64 hex characters when constructed through this
/// type. Addresses received from the outside world should come in through
/// [`Address::parse`] so the invariant holds everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Derives an address from raw public key bytes.
    ///
    /// Returns `None` unless given exactly 32 bytes that form a valid
    /// Ed25519 point. This is the decoding step the registrar check relies
    /// on: contract global state stores the registrar as raw bytes, and a
    /// value that does not decode is treated as "no registrar".
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 32] = bytes.try_into().ok()?;
        VerifyingKey::from_bytes(&arr).ok()?;
        Some(Address(hex::encode(arr)))
    }

    /// Parses a textual address, normalizing case.
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidAddress)?;
        Address::from_bytes(&bytes).ok_or(KeyError::InvalidAddress)
    }

    /// The raw public key behind this address.
    pub fn to_public_key(&self) -> Result<VerifyingKey, KeyError> {
        let bytes = hex::decode(&self.0).map_err(|_| KeyError::InvalidAddress)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidAddress)?;
        VerifyingKey::from_bytes(&arr).map_err(|_| KeyError::InvalidAddress)
    }

    /// The raw 32 bytes of the public key, as stored in contract state.
    pub fn to_bytes(&self) -> Result<Vec<u8>, KeyError> {
        hex::decode(&self.0).map_err(|_| KeyError::InvalidAddress)
    }

    /// Verifies an Ed25519 signature made by this address.
    pub fn verify(&self, message: &[u8], signature_bytes: &[u8]) -> bool {
        let Ok(key) = self.to_public_key() else {
            return false;
        };
        let Ok(sig_arr) = <[u8; 64]>::try_from(signature_bytes) else {
            return false;
        };
        key.verify(message, &Signature::from_bytes(&sig_arr)).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UnlockedAccount
// ---------------------------------------------------------------------------

/// An account whose signing key is held in memory.
///
/// This is the service's master/clawback identity and, in tests, the
/// borrower accounts. Intentionally does NOT implement
/// `Serialize`/`Deserialize` — exporting the secret is a deliberate act via
/// [`secret_hex`](Self::secret_hex), not something a stray JSON encoder
/// should be able to do.
pub struct UnlockedAccount {
    signing_key: SigningKey,
}

impl UnlockedAccount {
    /// Generates a fresh account from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstructs an account from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Loads an account from a hex-encoded secret key, the format `keygen`
    /// writes to disk. Don't put raw hex keys in config files in
    /// production; for a local ledger nobody will pretend you won't.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&arr))
    }

    /// The address controlled by this account's key.
    pub fn address(&self) -> Address {
        Address(hex::encode(self.signing_key.verifying_key().to_bytes()))
    }

    /// Signs a message, returning the 64 signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Exports the secret key as hex. Handle with care — this is the whole
    /// identity.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl fmt::Debug for UnlockedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret must never appear in debug output.
        f.debug_struct("UnlockedAccount")
            .field("address", &self.address())
            .finish()
    }
}

impl Clone for UnlockedAccount {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}
