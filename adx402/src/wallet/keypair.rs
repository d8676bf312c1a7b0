use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

use super::{SignableTransaction, WalletAdapter, WalletCapabilities, WalletError};
use crate::error::Result;

/// Wallet backed by a local ed25519 keypair.
///
/// Signs any transaction that lists its key as a required signer and leaves
/// other slots untouched.
pub struct KeypairWallet {
    keypair: Keypair,
    batch: bool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            batch: true,
        }
    }

    /// Create a wallet from a bs58 private key (32-byte secret or 64-byte keypair).
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        Ok(Self::new(crate::utils::keypair_from_private_key(private_key)?))
    }

    /// Enable or disable `signAllTransactions`, forcing sequential signing when off.
    pub fn with_batch_signing(mut self, enabled: bool) -> Self {
        self.batch = enabled;
        self
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_in_place(&self, mut tx: SignableTransaction) -> SignableTransaction {
        let me = self.keypair.pubkey();
        if let Some(index) = tx.signer_keys().iter().position(|k| *k == me) {
            let signature = self.keypair.sign_message(&tx.message_data());
            if let Some(slot) = tx.signatures_mut().get_mut(index) {
                *slot = signature;
            }
        }
        tx
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn address(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    fn capabilities(&self) -> WalletCapabilities {
        WalletCapabilities {
            sign_transaction: true,
            sign_all_transactions: self.batch,
            sign_message: true,
        }
    }

    async fn sign_transaction(
        &self,
        tx: SignableTransaction,
    ) -> std::result::Result<SignableTransaction, WalletError> {
        Ok(self.sign_in_place(tx))
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<SignableTransaction>,
    ) -> std::result::Result<Vec<SignableTransaction>, WalletError> {
        if !self.batch {
            return Err(WalletError::Unsupported("signAllTransactions"));
        }
        Ok(txs.into_iter().map(|tx| self.sign_in_place(tx)).collect())
    }

    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Signature, WalletError> {
        Ok(self.keypair.sign_message(message))
    }
}
