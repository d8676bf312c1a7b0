use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Adx402Error, Result};

/// Settlement confirmation from the `X-PAYMENT-RESPONSE` header.
///
/// Only `transaction` is read; everything else is carried through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PaymentReceipt {
    /// Strictly decode a base64 JSON receipt header.
    pub fn decode(header: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(header.trim())
            .map_err(|e| Adx402Error::MalformedReceipt(format!("base64: {e}")))?;
        let receipt: PaymentReceipt = serde_json::from_slice(&bytes)
            .map_err(|e| Adx402Error::MalformedReceipt(format!("json: {e}")))?;
        if receipt.transaction.is_empty() {
            return Err(Adx402Error::MalformedReceipt(
                "empty transaction id".into(),
            ));
        }
        Ok(receipt)
    }

    /// Network the payment settled on, when the server reported one.
    pub fn network(&self) -> Option<&str> {
        self.extra.get("network").and_then(|v| v.as_str())
    }
}

/// Best-effort decode: a malformed header is logged and treated as absent.
pub fn decode_payment_receipt(header: &str) -> Option<PaymentReceipt> {
    match PaymentReceipt::decode(header) {
        Ok(receipt) => Some(receipt),
        Err(e) => {
            warn!(error = %e, "ignoring malformed payment receipt");
            None
        }
    }
}

/// Transaction id from a receipt header, if one can be read.
pub fn decode_settlement_id(header: &str) -> Option<String> {
    decode_payment_receipt(header).map(|r| r.transaction)
}
