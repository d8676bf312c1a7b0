//! Transaction format bridge.
//!
//! Turns chain-agnostic [`SigningRequest`]s into the concrete transactions a
//! [`WalletAdapter`] signs, and turns the signed result back into one
//! [`SignatureMap`] per request.

pub mod encoding;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::signature::Signature;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Adx402Error, Result};
use crate::wallet::{SignableTransaction, WalletAdapter};

pub use encoding::{decode_transaction, extract_signature, TransactionEncoding};

/// An unsigned transaction message plus signatures other parties already made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    message_bytes: Vec<u8>,
    signatures: BTreeMap<String, Vec<u8>>,
}

impl SigningRequest {
    pub fn new(message_bytes: Vec<u8>) -> Self {
        Self {
            message_bytes,
            signatures: BTreeMap::new(),
        }
    }

    pub fn with_signatures(message_bytes: Vec<u8>, signatures: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            message_bytes,
            signatures,
        }
    }

    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    /// Pre-existing signatures keyed by base58 address.
    pub fn signatures(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.signatures
    }

    pub fn encoding(&self) -> Result<TransactionEncoding> {
        TransactionEncoding::of_message(&self.message_bytes)
    }
}

/// Signature produced by the active wallet for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMap {
    address: String,
    signature: Signature,
}

impl SignatureMap {
    pub fn new(address: String, signature: Signature) -> Self {
        Self { address, signature }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Lookup by address; `None` for anyone but the active wallet.
    pub fn get(&self, address: &str) -> Option<&Signature> {
        (self.address == address).then_some(&self.signature)
    }

    /// Map form, as exchanged with payment libraries.
    pub fn to_map(&self) -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([(self.address.clone(), self.signature.as_ref().to_vec())])
    }
}

/// The one capability the payment client needs from a signer.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Base58 address whose signature this signer produces.
    fn address(&self) -> Result<String>;

    async fn sign_transactions(
        &self,
        requests: &[SigningRequest],
        abort: Option<&CancellationToken>,
    ) -> Result<Vec<SignatureMap>>;
}

/// [`TransactionSigner`] backed by a connected wallet.
pub struct WalletTransactionSigner<W: ?Sized> {
    wallet: Arc<W>,
}

impl<W: WalletAdapter + ?Sized> WalletTransactionSigner<W> {
    pub fn new(wallet: Arc<W>) -> Self {
        Self { wallet }
    }

    pub fn wallet(&self) -> &Arc<W> {
        &self.wallet
    }
}

fn ensure_not_aborted(abort: Option<&CancellationToken>) -> Result<()> {
    match abort {
        Some(token) if token.is_cancelled() => Err(Adx402Error::Cancelled),
        _ => Ok(()),
    }
}

#[async_trait]
impl<W: WalletAdapter + ?Sized> TransactionSigner for WalletTransactionSigner<W> {
    fn address(&self) -> Result<String> {
        self.wallet
            .address()
            .map(|k| k.to_string())
            .ok_or(Adx402Error::NotConnected)
    }

    async fn sign_transactions(
        &self,
        requests: &[SigningRequest],
        abort: Option<&CancellationToken>,
    ) -> Result<Vec<SignatureMap>> {
        let address = TransactionSigner::address(self)?;
        let capabilities = self.wallet.capabilities();
        if !capabilities.can_sign_transactions() {
            return Err(Adx402Error::UnsupportedWallet);
        }

        ensure_not_aborted(abort)?;

        let converted = requests
            .iter()
            .map(|r| decode_transaction(r.message_bytes(), r.signatures()))
            .collect::<Result<Vec<SignableTransaction>>>()?;

        let signed = if capabilities.sign_all_transactions {
            debug!(count = converted.len(), "requesting batch signature");
            let signed = self.wallet.sign_all_transactions(converted).await?;
            if signed.len() != requests.len() {
                return Err(Adx402Error::Wallet(format!(
                    "wallet returned {} transactions for {} requests",
                    signed.len(),
                    requests.len()
                )));
            }
            signed
        } else {
            let mut signed = Vec::with_capacity(converted.len());
            for (i, tx) in converted.into_iter().enumerate() {
                ensure_not_aborted(abort)?;
                debug!(index = i, "requesting single signature");
                signed.push(self.wallet.sign_transaction(tx).await?);
            }
            signed
        };

        signed
            .iter()
            .map(|tx| {
                extract_signature(tx, &address).map(|sig| SignatureMap::new(address.clone(), sig))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{WalletCapabilities, WalletError};
    use solana_sdk::pubkey::Pubkey;

    struct Disconnected;

    #[async_trait]
    impl WalletAdapter for Disconnected {
        fn address(&self) -> Option<Pubkey> {
            None
        }

        fn capabilities(&self) -> WalletCapabilities {
            WalletCapabilities {
                sign_transaction: true,
                ..Default::default()
            }
        }
    }

    struct MessageOnly(Pubkey);

    #[async_trait]
    impl WalletAdapter for MessageOnly {
        fn address(&self) -> Option<Pubkey> {
            Some(self.0)
        }

        fn capabilities(&self) -> WalletCapabilities {
            WalletCapabilities {
                sign_message: true,
                ..Default::default()
            }
        }

        async fn sign_message(&self, _message: &[u8]) -> std::result::Result<Signature, WalletError> {
            Ok(Signature::default())
        }
    }

    #[test]
    fn test_signing_request_accessors() {
        let mut sigs = BTreeMap::new();
        sigs.insert("addr".to_string(), vec![1u8; 64]);
        let req = SigningRequest::with_signatures(vec![0x80, 1, 2], sigs.clone());
        assert_eq!(req.message_bytes(), &[0x80, 1, 2]);
        assert_eq!(req.signatures(), &sigs);
        assert_eq!(req.encoding().unwrap(), TransactionEncoding::Versioned);
    }

    #[test]
    fn test_signature_map_single_entry() {
        let map = SignatureMap::new("A".into(), Signature::from([4u8; 64]));
        assert_eq!(map.to_map().len(), 1);
        assert!(map.get("A").is_some());
        assert!(map.get("B").is_none());
        assert_eq!(map.to_map().get("A").unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_not_connected() {
        let signer = WalletTransactionSigner::new(Arc::new(Disconnected));
        let err = signer
            .sign_transactions(&[SigningRequest::new(vec![1])], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Adx402Error::NotConnected));
    }

    #[tokio::test]
    async fn test_unsupported_wallet() {
        let signer = WalletTransactionSigner::new(Arc::new(MessageOnly(Pubkey::new_unique())));
        let err = signer
            .sign_transactions(&[SigningRequest::new(vec![1])], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Adx402Error::UnsupportedWallet));
    }
}
