//! Wallet capability surface.
//!
//! A connected wallet (browser extension, hardware device, local keypair)
//! is reached only through [`WalletAdapter`]. The core never implements key
//! management itself.

pub mod keypair;

use async_trait::async_trait;
use solana_sdk::message::{Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use thiserror::Error;

use crate::error::Adx402Error;

pub use keypair::KeypairWallet;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The user declined the prompt.
    #[error("user rejected the request: {0}")]
    Rejected(String),

    #[error("wallet does not support {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Other(String),
}

impl From<WalletError> for Adx402Error {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::Rejected(msg) => Adx402Error::SigningRejected(msg),
            WalletError::Unsupported(_) => Adx402Error::UnsupportedWallet,
            WalletError::Other(msg) => Adx402Error::Wallet(msg),
        }
    }
}

/// Which signing methods a wallet exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletCapabilities {
    pub sign_transaction: bool,
    pub sign_all_transactions: bool,
    pub sign_message: bool,
}

impl WalletCapabilities {
    pub fn can_sign_transactions(&self) -> bool {
        self.sign_transaction || self.sign_all_transactions
    }
}

/// Concrete transaction handed to a wallet.
///
/// The single discriminant is the message encoding; every consumer matches
/// on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl SignableTransaction {
    /// Keys expected to sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        match self {
            SignableTransaction::Legacy(tx) => {
                let required = tx.message.header.num_required_signatures as usize;
                &tx.message.account_keys[..required.min(tx.message.account_keys.len())]
            }
            SignableTransaction::Versioned(tx) => {
                let keys = tx.message.static_account_keys();
                let required = tx.message.header().num_required_signatures as usize;
                &keys[..required.min(keys.len())]
            }
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        match self {
            SignableTransaction::Legacy(tx) => &tx.signatures,
            SignableTransaction::Versioned(tx) => &tx.signatures,
        }
    }

    pub fn signatures_mut(&mut self) -> &mut Vec<Signature> {
        match self {
            SignableTransaction::Legacy(tx) => &mut tx.signatures,
            SignableTransaction::Versioned(tx) => &mut tx.signatures,
        }
    }

    /// Serialized message: the bytes every signer signs.
    pub fn message_data(&self) -> Vec<u8> {
        match self {
            SignableTransaction::Legacy(tx) => tx.message_data(),
            SignableTransaction::Versioned(tx) => tx.message.serialize(),
        }
    }

    /// Wrap a decoded versioned message, with one empty slot per required signer.
    pub fn unsigned_versioned(message: VersionedMessage) -> Self {
        let required = message.header().num_required_signatures as usize;
        SignableTransaction::Versioned(VersionedTransaction {
            signatures: vec![Signature::default(); required],
            message,
        })
    }

    /// Wrap a decoded legacy message, with one empty slot per required signer.
    pub fn unsigned_legacy(message: Message) -> Self {
        SignableTransaction::Legacy(Transaction::new_unsigned(message))
    }
}

/// Signing capabilities of a connected wallet.
///
/// Methods a wallet does not expose keep the default body, which fails with
/// [`WalletError::Unsupported`]; [`WalletAdapter::capabilities`] must agree.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Active address, or `None` while disconnected.
    fn address(&self) -> Option<Pubkey>;

    fn capabilities(&self) -> WalletCapabilities;

    async fn sign_transaction(
        &self,
        _tx: SignableTransaction,
    ) -> Result<SignableTransaction, WalletError> {
        Err(WalletError::Unsupported("signTransaction"))
    }

    async fn sign_all_transactions(
        &self,
        _txs: Vec<SignableTransaction>,
    ) -> Result<Vec<SignableTransaction>, WalletError> {
        Err(WalletError::Unsupported("signAllTransactions"))
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<Signature, WalletError> {
        Err(WalletError::Unsupported("signMessage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};
    use solana_sdk::message::v0;

    fn memo_ix(signers: &[Pubkey]) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: signers
                .iter()
                .map(|k| AccountMeta::new_readonly(*k, true))
                .collect(),
            data: b"adx402".to_vec(),
        }
    }

    #[test]
    fn test_signer_keys_legacy() {
        let payer = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let message = Message::new(&[memo_ix(&[other])], Some(&payer));
        let tx = SignableTransaction::unsigned_legacy(message);

        assert_eq!(tx.signer_keys(), &[payer, other]);
        assert_eq!(tx.signatures().len(), 2);
        assert!(tx.signatures().iter().all(|s| *s == Signature::default()));
    }

    #[test]
    fn test_signer_keys_versioned_excludes_readonly_accounts() {
        let payer = Pubkey::new_unique();
        let ix = memo_ix(&[]);
        let program = ix.program_id;
        let message = v0::Message::try_compile(&payer, &[ix], &[], Hash::new_unique()).unwrap();
        let tx = SignableTransaction::unsigned_versioned(VersionedMessage::V0(message));

        assert_eq!(tx.signer_keys(), &[payer]);
        assert!(!tx.signer_keys().contains(&program));
        assert_eq!(tx.signatures().len(), 1);
    }

    #[test]
    fn test_capabilities() {
        assert!(!WalletCapabilities::default().can_sign_transactions());
        let batch_only = WalletCapabilities {
            sign_all_transactions: true,
            ..Default::default()
        };
        assert!(batch_only.can_sign_transactions());
    }

    #[test]
    fn test_wallet_error_mapping() {
        assert!(matches!(
            Adx402Error::from(WalletError::Rejected("no".into())),
            Adx402Error::SigningRejected(_)
        ));
        assert!(matches!(
            Adx402Error::from(WalletError::Unsupported("signMessage")),
            Adx402Error::UnsupportedWallet
        ));
    }
}
