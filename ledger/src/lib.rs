// Copyright (c) 2026 Arboreum. MIT License.
// See LICENSE for details.

//! # Arbor Ledger — Core Library
//!
//! The loan-log backend's ledger layer: a thin set of primitives for
//! putting loan events and borrower credit records on chain and reading
//! them back, without pretending the chain is a database.
//!
//! Two ideas carry the whole design. Loan logs are append-only note fields
//! on zero-amount transfers of a one-unit asset — the asset is the log's
//! identity, the transaction history is the log. Credit profiles are
//! records in a contract's per-account local state, writable only by the
//! registrar account the contract names and destroyed when the account
//! opts out.
//!
//! ## Architecture
//!
//! - **account** — Ed25519 keys and addresses. The master key signs everything.
//! - **note** — The prefix-tagged JSON codec for log entries.
//! - **asset** — Loan terms and the ARC-3 metadata hash they commit into.
//! - **profile** — Credit records and the registrar gate.
//! - **txn** — Transaction construction, signing, and wallet blobs.
//! - **client** — The [`client::LedgerClient`] seam plus the in-memory ledger.
//! - **service** — [`service::LoanLogService`], the operations the HTTP layer calls.
//! - **config** — Protocol constants and network names.
//! - **error** — The error taxonomy, including the rejection classifier.
//!
//! ## Design Philosophy
//!
//! 1. The ledger is the source of truth; the service holds no state of its own.
//! 2. A service with the wrong key refuses to start, not to fail on first write.
//! 3. If it signs a transaction, it has tests. Plural.

pub mod account;
pub mod asset;
pub mod client;
pub mod config;
pub mod error;
pub mod note;
pub mod profile;
pub mod service;
pub mod txn;

pub use account::{Address, UnlockedAccount};
pub use client::{LedgerClient, MemoryLedger};
pub use error::{LedgerError, NoteError, ServiceError};
pub use profile::{CreditProfile, LoanState, OptInStatus};
pub use service::{LoanLogService, ProfileUpdate, ServiceConfig};
