use thiserror::Error;

/// Why a signature could not be read back out of a signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// The address is not among the transaction's required signers. The
    /// request itself was malformed.
    NotASigner,
    /// The address is a signer but its slot was still empty after the wallet
    /// returned.
    SlotEmpty,
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotASigner => write!(f, "address is not a signer of the transaction"),
            Self::SlotEmpty => write!(f, "signature slot is empty after signing"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Adx402Error {
    #[error("wallet not connected")]
    NotConnected,

    #[error("wallet not verified")]
    NotVerified,

    #[error("wallet does not support transaction signing")]
    UnsupportedWallet,

    #[error("unrecognized transaction encoding: {0}")]
    UnrecognizedEncoding(String),

    #[error("invalid signature for {address}: {reason}")]
    InvalidSignature { address: String, reason: String },

    #[error("could not extract signature for {address}: {reason}")]
    SignatureExtraction {
        address: String,
        reason: ExtractionFailure,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("signing rejected by wallet: {0}")]
    SigningRejected(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("payment required but no transaction signer is attached")]
    PaymentSigningUnavailable,

    #[error("payment rejected: {0}")]
    PaymentRejected(String),

    #[error("server rejected request ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    ServerRejected {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("publisher already registered: {0}")]
    AlreadyRegistered(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed payment receipt: {0}")]
    MalformedReceipt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("transaction encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("solana error: {0}")]
    Solana(String),

    #[error("submission already in flight")]
    Busy,

    #[error("validation error: {0}")]
    Validation(String),
}

impl Adx402Error {
    /// Text to show the user for this failure: the server-provided message
    /// when there is one, otherwise a generic line for the error class.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConnected => "Please connect your wallet first.".into(),
            Self::NotVerified => "Please verify your wallet first.".into(),
            Self::UnsupportedWallet => "This wallet cannot sign transactions.".into(),
            Self::SigningRejected(_) | Self::Cancelled => "Signature request was declined.".into(),
            Self::PaymentSigningUnavailable => {
                "Payment is required but no wallet signer is available.".into()
            }
            Self::ServerRejected {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            Self::AlreadyRegistered(message) if !message.is_empty() => message.clone(),
            Self::AlreadyRegistered(_) => {
                "You are already registered as a publisher with this wallet address.".into()
            }
            Self::PaymentRejected(reason) if !reason.is_empty() => {
                format!("Payment was not accepted: {reason}")
            }
            Self::PaymentRejected(_) => "Payment was not accepted.".into(),
            Self::Network(_) => {
                "Could not reach the server. Please check your connection.".into()
            }
            Self::Validation(message) => message.clone(),
            _ => "An unexpected error occurred. Please try again.".into(),
        }
    }

    /// Whether the request never reached the server.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, Adx402Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = Adx402Error::ServerRejected {
            status: 400,
            code: Some("BAD_URL".into()),
            message: Some("targetUrl must be https".into()),
        };
        assert_eq!(err.user_message(), "targetUrl must be https");
    }

    #[test]
    fn test_user_message_falls_back_without_server_message() {
        let err = Adx402Error::ServerRejected {
            status: 500,
            code: None,
            message: None,
        };
        assert_eq!(
            err.user_message(),
            "An unexpected error occurred. Please try again."
        );

        let empty = Adx402Error::ServerRejected {
            status: 500,
            code: None,
            message: Some(String::new()),
        };
        assert_eq!(empty.user_message(), err.user_message());
    }

    #[test]
    fn test_already_registered_prefers_server_message() {
        let err = Adx402Error::AlreadyRegistered("Domain news.example is taken".into());
        assert_eq!(err.user_message(), "Domain news.example is taken");
    }

    #[test]
    fn test_already_registered_falls_back_when_empty() {
        let err = Adx402Error::AlreadyRegistered(String::new());
        assert_eq!(
            err.user_message(),
            "You are already registered as a publisher with this wallet address."
        );
    }

    #[test]
    fn test_payment_rejected_surfaces_reason() {
        let err = Adx402Error::PaymentRejected("insufficient_funds".into());
        assert_eq!(err.user_message(), "Payment was not accepted: insufficient_funds");
        assert_eq!(
            Adx402Error::PaymentRejected(String::new()).user_message(),
            "Payment was not accepted."
        );
    }

    #[test]
    fn test_extraction_error_display() {
        let err = Adx402Error::SignatureExtraction {
            address: "abc".into(),
            reason: ExtractionFailure::NotASigner,
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("not a signer"));
    }
}
