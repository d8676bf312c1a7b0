use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bridge::{TransactionSigner, WalletTransactionSigner};
use crate::config::Adx402Config;
use crate::error::{Adx402Error, Result};
use crate::payment::{PaymentTransactionBuilder, RpcChainState, SolanaExactBuilder};
use crate::rest::{AdUpload, Adx402HttpClient, PaidResponse, SubmitOptions};
use crate::session::WalletSession;
use crate::submission::SubmissionState;
use crate::types::*;
use crate::utils::{explorer_tx_url, shorten_address};
use crate::wallet::WalletAdapter;

/// Main Adx402 client: wallet verification and the paid brand/publisher flows.
#[derive(Debug, Clone)]
pub struct Adx402 {
    /// Resolved configuration.
    pub config: Adx402Config,
    /// HTTP client, with payment signing attached when a wallet is.
    pub http_client: Adx402HttpClient,
}

impl Adx402 {
    /// Client without payment signing. Paid endpoints fail with
    /// `PaymentSigningUnavailable` when the server asks for payment.
    pub fn new(config: Adx402Config) -> Self {
        let http_client = Adx402HttpClient::new(&config.api_base_url, &config.network);
        Self {
            config,
            http_client,
        }
    }

    /// Client that pays through `wallet`, building transfers against the
    /// configured Solana RPC node.
    pub fn with_wallet<W>(config: Adx402Config, wallet: Arc<W>) -> Self
    where
        W: WalletAdapter + 'static,
    {
        let signer = Arc::new(WalletTransactionSigner::new(wallet));
        let builder = Arc::new(SolanaExactBuilder::new(
            RpcChainState::new(&config.solana_rpc_url),
            config.compute_unit_limit,
            config.compute_unit_price,
        ));
        info!(
            network = %config.network,
            rpc = %config.solana_rpc_url,
            "payment signing enabled"
        );
        Self::with_signer(config, signer, builder)
    }

    /// Client with an explicit signer and transaction builder.
    pub fn with_signer(
        config: Adx402Config,
        signer: Arc<dyn TransactionSigner>,
        builder: Arc<dyn PaymentTransactionBuilder>,
    ) -> Self {
        let http_client = Adx402HttpClient::new(&config.api_base_url, &config.network)
            .with_payment(signer, builder);
        Self {
            config,
            http_client,
        }
    }

    // --- Verification ---

    /// Prove ownership of the connected wallet to the backend.
    ///
    /// On success the session is verified with the returned role. On any
    /// failure it is left unverified and the error is returned.
    pub async fn verify_wallet(
        &self,
        session: &mut WalletSession,
        wallet: &dyn WalletAdapter,
    ) -> Result<Option<Role>> {
        let address = wallet.address().ok_or(Adx402Error::NotConnected)?;
        session.connect(&address);

        match self.request_verification(&address.to_string(), wallet).await {
            Ok(role) => {
                info!(
                    wallet = %shorten_address(&address.to_string()),
                    role = ?role,
                    "wallet verified"
                );
                session.mark_verified(role);
                Ok(role)
            }
            Err(e) => {
                warn!(error = %e, "wallet verification failed");
                session.mark_unverified();
                Err(e)
            }
        }
    }

    async fn request_verification(
        &self,
        address: &str,
        wallet: &dyn WalletAdapter,
    ) -> Result<Option<Role>> {
        if !wallet.capabilities().sign_message {
            return Err(Adx402Error::UnsupportedWallet);
        }

        let challenge = SignatureChallenge::new(address, chrono::Utc::now().timestamp_millis());
        let payload = serde_json::to_string(&challenge)?;
        let signature = wallet.sign_message(payload.as_bytes()).await?;

        let req = VerifyRequest {
            wallet: address.to_string(),
            signature: hex::encode(signature.as_ref()),
            challenge,
        };
        let resp = self
            .http_client
            .verify(&self.config.x402_endpoint(), &req)
            .await?;
        Ok(resp.role)
    }

    // --- Brand ---

    /// Upload an ad creative for the session's wallet.
    pub async fn upload_ad(
        &self,
        session: &WalletSession,
        ad: &AdUpload,
        opts: &SubmitOptions,
    ) -> Result<PaidResponse<UploadAdResponse>> {
        let wallet = session.require_wallet()?;
        info!(
            file = %ad.file_name,
            size = ad.data.len(),
            tags = ad.tags.len(),
            "uploading ad"
        );
        tracked(opts, self.http_client.upload_ad(wallet, ad, opts)).await
    }

    // --- Publisher ---

    /// Register `domain` as a publisher site owned by the session's wallet.
    pub async fn register_publisher(
        &self,
        session: &WalletSession,
        domain: &str,
        tags: Vec<String>,
        opts: &SubmitOptions,
    ) -> Result<PaidResponse<RegisterPublisherResponse>> {
        let wallet = session.require_wallet()?;
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(Adx402Error::Validation("domain is required".into()));
        }
        let req = RegisterPublisherRequest {
            wallet_address: wallet.to_string(),
            domain: domain.to_string(),
            tags,
        };
        info!(domain = %req.domain, "registering publisher");
        tracked(opts, self.http_client.register_publisher(&req, opts)).await
    }

    /// Create an ad slot on the session wallet's publisher site.
    pub async fn create_slot(
        &self,
        session: &WalletSession,
        slot_id: &str,
        tags: Vec<String>,
        aspect_ratios: Vec<AspectRatio>,
        opts: &SubmitOptions,
    ) -> Result<PaidResponse<CreateSlotResponse>> {
        let wallet = session.require_wallet()?;
        let slot_id = slot_id.trim();
        if slot_id.is_empty() {
            return Err(Adx402Error::Validation("slot id is required".into()));
        }
        let req = CreateSlotRequest {
            wallet: wallet.to_string(),
            slot_id: slot_id.to_string(),
            tags,
            aspect_ratios,
        };
        info!(slot = %req.slot_id, "creating slot");
        tracked(opts, self.http_client.create_slot(&req, opts)).await
    }

    /// Explorer link for a settlement transaction on the configured network.
    pub fn settlement_url(&self, tx_id: &str) -> String {
        explorer_tx_url(&self.config.explorer_url, tx_id, self.config.cluster())
    }
}

/// Run a paid request through the caller's tracker, if any.
async fn tracked<T, F>(opts: &SubmitOptions, fut: F) -> Result<PaidResponse<T>>
where
    F: Future<Output = Result<PaidResponse<T>>>,
{
    match &opts.progress {
        Some(tracker) => {
            tracker
                .run(SubmissionState::Submitting, fut, |resp| {
                    resp.settlement_id().map(String::from)
                })
                .await
        }
        None => fut.await,
    }
}
