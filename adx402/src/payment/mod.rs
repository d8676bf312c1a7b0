//! x402 payment protocol types.
//!
//! A paid endpoint answers `402 Payment Required` with a list of accepted
//! payment requirements. The client signs a transfer matching one of them
//! and repeats the request with an `X-PAYMENT` header; the server settles and
//! reports the transaction in `X-PAYMENT-RESPONSE`.

pub mod receipt;
pub mod transaction;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use receipt::{decode_payment_receipt, decode_settlement_id, PaymentReceipt};
pub use transaction::{
    assemble_transaction, ChainState, PaymentTransactionBuilder, RpcChainState, SolanaExactBuilder,
};

pub const X402_VERSION: u8 = 1;

/// Request header carrying the signed payment.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Response header carrying the settlement receipt.
pub const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// The only scheme this client can pay with.
pub const EXACT_SCHEME: &str = "exact";

/// Body of a 402 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredResponse {
    pub x402_version: u8,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One accepted way to pay for a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Amount in the asset's base units, as a decimal string.
    pub max_amount_required: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    pub pay_to: String,
    #[serde(default)]
    pub max_timeout_seconds: u64,
    /// SPL mint address.
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<PaymentExtra>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentExtra {
    /// Facilitator account that pays transaction fees and co-signs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_payer: Option<String>,
}

impl PaymentRequirements {
    pub fn fee_payer(&self) -> Option<&str> {
        self.extra.as_ref().and_then(|e| e.fee_payer.as_deref())
    }
}

impl PaymentRequiredResponse {
    /// First `exact` requirement on `network`.
    pub fn select(&self, network: &str) -> Option<&PaymentRequirements> {
        self.accepts
            .iter()
            .find(|r| r.scheme == EXACT_SCHEME && r.network == network)
    }
}

/// Decoded `X-PAYMENT` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    pub payload: ExactSolanaPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactSolanaPayload {
    /// Base64 wire-format transaction, signed by the payer.
    pub transaction: String,
}

impl PaymentPayload {
    pub fn exact(network: &str, transaction_bytes: &[u8]) -> Self {
        Self {
            x402_version: X402_VERSION,
            scheme: EXACT_SCHEME.into(),
            network: network.into(),
            payload: ExactSolanaPayload {
                transaction: STANDARD.encode(transaction_bytes),
            },
        }
    }

    /// Base64 JSON, as sent in the `X-PAYMENT` header.
    pub fn to_header(&self) -> Result<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    pub fn from_header(header: &str) -> Result<Self> {
        let bytes = STANDARD.decode(header.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: &str = r#"{
        "x402Version": 1,
        "error": "X-PAYMENT header is required",
        "accepts": [
            {
                "scheme": "exact",
                "network": "solana",
                "maxAmountRequired": "1000000",
                "resource": "http://localhost:3000/brand/ad",
                "description": "Ad upload",
                "mimeType": "application/json",
                "payTo": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
                "maxTimeoutSeconds": 60,
                "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
            },
            {
                "scheme": "exact",
                "network": "solana-devnet",
                "maxAmountRequired": "10000",
                "resource": "http://localhost:3000/brand/ad",
                "description": "Ad upload",
                "mimeType": "application/json",
                "payTo": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
                "maxTimeoutSeconds": 60,
                "asset": "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
                "extra": { "feePayer": "2wKupLR9q6wXYppw8Gr2NvWxKBUqm4PPJKkQfoxHDBg4" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_quote_and_select_network() {
        let quote: PaymentRequiredResponse = serde_json::from_str(QUOTE).unwrap();
        assert_eq!(quote.accepts.len(), 2);

        let devnet = quote.select("solana-devnet").unwrap();
        assert_eq!(devnet.max_amount_required, "10000");
        assert_eq!(
            devnet.fee_payer(),
            Some("2wKupLR9q6wXYppw8Gr2NvWxKBUqm4PPJKkQfoxHDBg4")
        );

        let mainnet = quote.select("solana").unwrap();
        assert_eq!(mainnet.fee_payer(), None);

        assert!(quote.select("base-sepolia").is_none());
    }

    #[test]
    fn test_payment_header_shape() {
        let payload = PaymentPayload::exact("solana-devnet", &[1, 2, 3]);
        let header = payload.to_header().unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(&header).unwrap()).unwrap();
        assert_eq!(json["x402Version"], 1);
        assert_eq!(json["scheme"], "exact");
        assert_eq!(json["network"], "solana-devnet");
        assert_eq!(json["payload"]["transaction"], "AQID");

        assert_eq!(PaymentPayload::from_header(&header).unwrap(), payload);
    }
}
