pub mod endpoints;

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::TransactionSigner;
use crate::error::{Adx402Error, Result};
use crate::payment::{
    assemble_transaction, decode_payment_receipt, PaymentPayload, PaymentReceipt,
    PaymentRequiredResponse, PaymentTransactionBuilder, PAYMENT_HEADER, PAYMENT_RESPONSE_HEADER,
};
use crate::submission::{SubmissionState, SubmissionTracker};
use crate::types::ApiErrorBody;
use crate::utils::parse_address;

pub use endpoints::AdUpload;

/// Error code the backend uses for a duplicate publisher registration.
pub const PUBLISHER_ALREADY_EXISTS: &str = "PUBLISHER_ALREADY_EXISTS";

/// Per-call options for paid requests.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Checked before each wallet prompt.
    pub abort: Option<CancellationToken>,
    /// Receives `Signing`/`Submitting` phase changes.
    pub progress: Option<SubmissionTracker>,
}

impl SubmitOptions {
    fn phase(&self, phase: SubmissionState) {
        if let Some(tracker) = &self.progress {
            tracker.set_phase(phase);
        }
    }
}

/// Successful reply to a request that may have required payment.
#[derive(Debug, Clone)]
pub struct PaidResponse<T> {
    pub body: T,
    /// Decoded `X-PAYMENT-RESPONSE`, if present and readable.
    pub receipt: Option<PaymentReceipt>,
    /// Whether a payment was attached.
    pub paid: bool,
}

impl<T> PaidResponse<T> {
    pub fn settlement_id(&self) -> Option<&str> {
        self.receipt.as_ref().map(|r| r.transaction.as_str())
    }
}

struct PaymentSigner {
    signer: Arc<dyn TransactionSigner>,
    builder: Arc<dyn PaymentTransactionBuilder>,
}

/// HTTP client for the Adx402 backend with x402 payment handling.
#[derive(Clone)]
pub struct Adx402HttpClient {
    client: Client,
    base_url: String,
    network: String,
    payment: Option<Arc<PaymentSigner>>,
}

impl std::fmt::Debug for Adx402HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adx402HttpClient")
            .field("base_url", &self.base_url)
            .field("network", &self.network)
            .field("can_pay", &self.payment.is_some())
            .finish()
    }
}

impl Adx402HttpClient {
    pub fn new(base_url: &str, network: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            network: network.to_string(),
            payment: None,
        }
    }

    /// Attach the signer and transaction builder used to answer 402s.
    pub fn with_payment(
        mut self,
        signer: Arc<dyn TransactionSigner>,
        builder: Arc<dyn PaymentTransactionBuilder>,
    ) -> Self {
        self.payment = Some(Arc::new(PaymentSigner { signer, builder }));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn can_pay(&self) -> bool {
        self.payment.is_some()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// POST a JSON body to an absolute URL, without payment handling.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self.client.post(url).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request, answering a `402 Payment Required` at most once.
    ///
    /// `build` must produce the same logical request each time it is called;
    /// it runs again for the paid retry.
    pub async fn send_paid<T, F>(&self, build: F, opts: &SubmitOptions) -> Result<PaidResponse<T>>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<RequestBuilder>,
    {
        let resp = build()?.send().await?;

        let (resp, paid) = if resp.status() == StatusCode::PAYMENT_REQUIRED {
            let header = self.authorize_payment(resp, opts).await?;
            opts.phase(SubmissionState::Submitting);
            let retry = build()?.header(PAYMENT_HEADER, header).send().await?;
            if retry.status() == StatusCode::PAYMENT_REQUIRED {
                let reason = payment_error(retry).await;
                warn!(reason = %reason, "payment not accepted on retry");
                return Err(Adx402Error::PaymentRejected(reason));
            }
            (retry, true)
        } else {
            (resp, false)
        };

        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }

        let receipt = resp
            .headers()
            .get(PAYMENT_RESPONSE_HEADER)
            .and_then(|v| match v.to_str() {
                Ok(s) => decode_payment_receipt(s),
                Err(e) => {
                    warn!(error = %e, "ignoring non-ascii payment receipt header");
                    None
                }
            });
        if let Some(r) = &receipt {
            info!(transaction = %r.transaction, "payment settled");
        }

        let bytes = resp.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        Ok(PaidResponse {
            body,
            receipt,
            paid,
        })
    }

    /// Turn a 402 quote into an `X-PAYMENT` header value.
    async fn authorize_payment(&self, resp: Response, opts: &SubmitOptions) -> Result<String> {
        let payment = self
            .payment
            .as_ref()
            .ok_or(Adx402Error::PaymentSigningUnavailable)?;

        let bytes = resp.bytes().await?;
        let quote: PaymentRequiredResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Adx402Error::PaymentRejected(format!("malformed payment quote: {e}")))?;
        let requirements = quote.select(&self.network).ok_or_else(|| {
            Adx402Error::PaymentRejected(format!(
                "no exact payment option for network {}",
                self.network
            ))
        })?;

        info!(
            amount = %requirements.max_amount_required,
            asset = %requirements.asset,
            pay_to = %requirements.pay_to,
            resource = %requirements.resource,
            "payment required"
        );
        opts.phase(SubmissionState::Signing);

        let payer = parse_address(&payment.signer.address()?)?;
        let request = payment.builder.build(requirements, &payer).await?;
        let signed = payment
            .signer
            .sign_transactions(std::slice::from_ref(&request), opts.abort.as_ref())
            .await?;
        let signature = signed
            .first()
            .ok_or_else(|| Adx402Error::Wallet("signer returned no signatures".into()))?;

        let wire = assemble_transaction(&request, signature)?;
        debug!(bytes = wire.len(), "payment transaction assembled");
        PaymentPayload::exact(&requirements.network, &wire).to_header()
    }
}

/// Map a non-2xx response to an error, keeping the server's code and message.
async fn rejection(resp: Response) -> Adx402Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed.message().map(String::from);

    if parsed.code() == Some(PUBLISHER_ALREADY_EXISTS) {
        return Adx402Error::AlreadyRegistered(message.unwrap_or_default());
    }

    Adx402Error::ServerRejected {
        status,
        code: parsed.code().map(String::from),
        message,
    }
}

/// Reason given in a 402 body, if any.
async fn payment_error(resp: Response) -> String {
    let body = resp.text().await.unwrap_or_default();
    serde_json::from_str::<PaymentRequiredResponse>(&body)
        .ok()
        .and_then(|q| q.error)
        .unwrap_or_else(|| "payment required after payment was attached".into())
}
