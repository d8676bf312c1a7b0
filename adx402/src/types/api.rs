use serde::{Deserialize, Serialize};

use super::enums::{AspectRatio, Role};

/// Ownership challenge signed by the wallet during verification.
///
/// Field order matters: the wallet signs the JSON serialization of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureChallenge {
    pub message: String,
    pub timestamp: i64,
}

impl SignatureChallenge {
    /// Build the challenge for `wallet` at `timestamp` (unix milliseconds).
    pub fn new(wallet: &str, timestamp: i64) -> Self {
        Self {
            message: format!("Verify ownership of wallet {wallet} for Adx402 protocol"),
            timestamp,
        }
    }
}

/// Body of `POST {x402}/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub wallet: String,
    /// Hex-encoded signature over the serialized challenge.
    pub signature: String,
    pub challenge: SignatureChallenge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub role: Option<Role>,
}

/// Successful reply to `POST /brand/ad`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAdResponse {
    pub message: String,
    pub file_name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPublisherRequest {
    pub wallet_address: String,
    pub domain: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPublisherResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub wallet: String,
    pub slot_id: String,
    pub tags: Vec<String>,
    pub aspect_ratios: Vec<AspectRatio>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    pub success: bool,
}

/// Error body returned by the backend on 4xx/5xx.
///
/// The backend uses either `{ "error": { "code", "message" } }` or a flat
/// `{ "message" }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn code(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.code.as_deref())
    }

    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .or(self.message.as_deref())
    }
}
