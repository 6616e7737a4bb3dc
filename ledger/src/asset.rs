//! # Loan-Log Assets
//!
//! Input types and metadata hashing for the one-of-one tracking tokens this
//! service mints per loan. The token itself never moves value; its
//! transaction history *is* the loan's log, and its asset configuration
//! carries an ARC-3-style metadata hash binding the token to the loan terms
//! it was created for.
//!
//! Amounts are integers in the smallest unit and rates are basis points —
//! no floating point anywhere near money.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Human-readable description embedded in the log-token metadata document.
pub const LOG_TOKEN_DESCRIPTION: &str = "\
This token tracks all transactions related to a given loan. \
Basic terms are committed to in the token metadata hash. \
Repayments for this loan are logged in the note field of the token's \
transactions. The holder of this token is not entitled to any proceeds \
of the associated loan.";

/// How often collections are expected on a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for CollectionFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Terms of a new loan, committed to in the log token's metadata hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoanParams {
    /// Off-ledger loan identifier (e.g. "ll42").
    pub loan_id: String,
    /// Opaque borrower identifier; resolution is the caller's business.
    pub borrower_info: String,
    /// Principal in the smallest unit of the disbursement token.
    pub principal: u64,
    /// Annual rate in basis points (1300 = 13.00%).
    pub apr_bps: u32,
    /// Loan term in days.
    pub tenor_in_days: u32,
    /// Unix timestamp of the loan start.
    pub start_date: i64,
    pub collection_frequency: CollectionFrequency,
    /// Stringified loan-specific data, e.g. a funded-invoice list. Kept
    /// opaque: no fixed per-loan schema exists, so the service commits to
    /// the bytes and nothing else.
    pub data: String,
}

/// Request to mint a new loan-log asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLogAssetInput {
    /// Base asset name; the on-ledger name gets the `@arc3` suffix.
    pub asset_name: String,
    pub loan_params: NewLoanParams,
}

/// Builds the ARC-3-style metadata document for a log token.
///
/// Field order is fixed by the struct definitions, so the serialization —
/// and therefore the hash — is deterministic for equal inputs.
fn metadata_document(name: &str, loan_params: &NewLoanParams) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "description": LOG_TOKEN_DESCRIPTION,
        "decimals": 0,
        "properties": serde_json::to_value(loan_params).expect("loan params serialize"),
    })
}

/// SHA-256 over the metadata document, attached to the asset configuration
/// as its 32-byte metadata hash.
pub fn metadata_hash(name: &str, loan_params: &NewLoanParams) -> [u8; 32] {
    let doc = metadata_document(name, loan_params).to_string();
    let mut hasher = Sha256::new();
    hasher.update(doc.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> NewLoanParams {
        NewLoanParams {
            loan_id: "ll42".into(),
            borrower_info: "borrowerIdentifier".into(),
            principal: 200_000,
            apr_bps: 1_300,
            tenor_in_days: 90,
            start_date: 1_600_942_397,
            collection_frequency: CollectionFrequency::Daily,
            data: r#"{"invoices": []}"#.into(),
        }
    }

    #[test]
    fn metadata_hash_is_deterministic() {
        let params = sample_params();
        assert_eq!(
            metadata_hash("testAsset", &params),
            metadata_hash("testAsset", &params)
        );
    }

    #[test]
    fn metadata_hash_binds_the_name() {
        let params = sample_params();
        assert_ne!(
            metadata_hash("assetA", &params),
            metadata_hash("assetB", &params)
        );
    }

    #[test]
    fn metadata_hash_binds_the_terms() {
        let params = sample_params();
        let mut changed = params.clone();
        changed.principal += 1;
        assert_ne!(
            metadata_hash("testAsset", &params),
            metadata_hash("testAsset", &changed)
        );
    }

    #[test]
    fn metadata_document_contains_description() {
        let doc = metadata_document("testAsset", &sample_params());
        assert_eq!(doc["description"], LOG_TOKEN_DESCRIPTION);
        assert_eq!(doc["decimals"], 0);
    }

    #[test]
    fn loan_params_serde_is_camel_case() {
        let json = serde_json::to_value(sample_params()).unwrap();
        assert!(json.get("loanId").is_some());
        assert!(json.get("collectionFrequency").is_some());
        assert!(json.get("loan_id").is_none());
    }

    #[test]
    fn loan_params_serde_roundtrip() {
        let params = sample_params();
        let json = serde_json::to_string(&params).unwrap();
        let recovered: NewLoanParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, recovered);
    }

    #[test]
    fn collection_frequency_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(CollectionFrequency::Monthly).unwrap(),
            serde_json::json!("monthly")
        );
    }
}
