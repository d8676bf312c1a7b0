pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod payment;
pub mod rest;
pub mod session;
pub mod submission;
pub mod types;
pub mod utils;
pub mod wallet;

// ---- Top-level re-exports for ergonomic usage ----

// Client + session
pub use client::Adx402;
pub use config::Adx402Config;
pub use error::{Adx402Error, ExtractionFailure, Result};
pub use session::WalletSession;

// REST client
pub use rest::{AdUpload, Adx402HttpClient, PaidResponse, SubmitOptions};

// Wallet seam
pub use wallet::{KeypairWallet, SignableTransaction, WalletAdapter, WalletCapabilities, WalletError};

// Transaction bridge
pub use bridge::{
    SignatureMap, SigningRequest, TransactionEncoding, TransactionSigner, WalletTransactionSigner,
};

// x402 payments
pub use payment::{
    decode_payment_receipt, PaymentPayload, PaymentReceipt, PaymentRequiredResponse,
    PaymentRequirements, PaymentTransactionBuilder, SolanaExactBuilder,
};

// Submission progress
pub use submission::{FailureKind, SubmissionState, SubmissionTracker};

// Backend types
pub use types::{
    AspectRatio, CreateSlotResponse, RegisterPublisherResponse, Role, UploadAdResponse,
};
