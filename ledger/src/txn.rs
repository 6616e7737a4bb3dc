//! # Transactions
//!
//! Construction, signing, and wire encoding for ledger transactions. Every
//! operation the service performs — minting a log asset, appending a note,
//! calling the profile contract, moving funds — is represented as a
//! [`Transaction`] wrapping one [`TransactionPayload`] variant.
//!
//! ## Lifecycle
//!
//! 1. **Build** — assemble a `Transaction` with the sender, the validity
//!    round from suggested params, an optional note, and the payload.
//! 2. **Sign** — [`Transaction::sign`] produces a [`SignedTransaction`]
//!    carrying an Ed25519 signature over [`Transaction::signable_bytes`].
//! 3. **Submit** — hand the signed transaction to a
//!    [`crate::client::LedgerClient`] and poll for confirmation.
//!
//! Unsigned transactions can also be serialized with [`encode_unsigned`]
//! and shipped to a wallet that holds the keys — that path backs the
//! opt-in and transfer blob endpoints.
//!
//! ## Transaction IDs
//!
//! The txid is `hex(sha256(signable_bytes))`. Because the signable bytes
//! include `first_valid`, two otherwise-identical transactions built one
//! round apart get distinct ids — callers never need a client-side nonce
//! to disambiguate repeated writes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::{Address, UnlockedAccount};
use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Parameters for creating a new asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfigParams {
    /// Total supply in base units. Log assets use `1`.
    pub total: u64,
    pub decimals: u32,
    /// Frozen-by-default holdings; log tokens are never meant to move
    /// except through clawback, so this is `true` for them.
    pub default_frozen: bool,
    pub asset_name: String,
    pub unit_name: String,
    pub url: String,
    /// SHA-256 of the ARC-3 metadata document, binding the asset to its
    /// loan terms.
    pub metadata_hash: Option<[u8; 32]>,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

/// The operation a transaction performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    /// Mint a new asset owned by the sender.
    AssetConfig(AssetConfigParams),
    /// Move `amount` base units of `asset_id` to `receiver`. When
    /// `revocation_target` is set this is a clawback: the units move out
    /// of the target's holding under the clawback authority of the sender.
    AssetTransfer {
        asset_id: u64,
        amount: u64,
        receiver: Address,
        revocation_target: Option<Address>,
    },
    /// Opt the sender in to holding `asset_id`.
    AssetOptIn { asset_id: u64 },
    /// Call an application with arguments and foreign account references.
    AppCall {
        app_id: u64,
        args: Vec<Vec<u8>>,
        accounts: Vec<Address>,
    },
    /// Allocate the sender's local state for `app_id`.
    AppOptIn { app_id: u64 },
    /// Deallocate the sender's local state for `app_id`, destroying any
    /// records kept there.
    AppCloseOut { app_id: u64 },
    /// Plain payment of `amount` microunits of the native token.
    Payment { amount: u64, receiver: Address },
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An unsigned ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    /// First round at which the transaction is valid, taken from suggested
    /// params. Feeds the txid, so repeated identical submissions in later
    /// rounds stay distinguishable.
    pub first_valid: u64,
    pub fee: u64,
    /// Optional note field. The loan log lives here, encoded by
    /// [`crate::note::encode`].
    pub note: Option<Vec<u8>>,
    pub payload: TransactionPayload,
}

impl Transaction {
    /// Canonical bytes for signing and id computation.
    ///
    /// bincode over the full struct: deterministic for a fixed type
    /// definition, and every field participates, so no two differing
    /// transactions share signable bytes.
    pub fn signable_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("transaction serializes")
    }

    /// Hex-encoded SHA-256 of the signable bytes.
    pub fn txid(&self) -> String {
        hex::encode(Sha256::digest(self.signable_bytes()))
    }

    /// Signs with `account`, producing a submittable transaction.
    ///
    /// The caller is responsible for `account` matching `self.sender`;
    /// a mismatch is caught at submission, not here.
    pub fn sign(self, account: &UnlockedAccount) -> SignedTransaction {
        let signature = account.sign(&self.signable_bytes());
        SignedTransaction {
            signer: account.address(),
            signature,
            txn: self,
        }
    }
}

/// A transaction plus the signature that authorizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub signer: Address,
    pub signature: Vec<u8>,
}

impl SignedTransaction {
    pub fn txid(&self) -> String {
        self.txn.txid()
    }

    /// Checks the signature against the signer's public key.
    pub fn verify(&self) -> bool {
        self.signer.verify(&self.txn.signable_bytes(), &self.signature)
    }
}

// ---------------------------------------------------------------------------
// Wire encoding for unsigned transactions
// ---------------------------------------------------------------------------

/// Serializes an unsigned transaction to a hex blob a wallet can sign.
pub fn encode_unsigned(txn: &Transaction) -> String {
    hex::encode(txn.signable_bytes())
}

/// Recovers an unsigned transaction from a hex blob.
pub fn decode_unsigned(blob: &str) -> Result<Transaction, LedgerError> {
    let bytes = hex::decode(blob)
        .map_err(|e| LedgerError::Encoding(format!("blob is not hex: {e}")))?;
    bincode::deserialize(&bytes)
        .map_err(|e| LedgerError::Encoding(format!("blob is not a transaction: {e}")))
}
