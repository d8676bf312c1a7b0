//! Message encoding detection and conversion between raw signing requests
//! and concrete Solana transaction types.

use std::collections::BTreeMap;

use solana_sdk::message::{Message, VersionedMessage};
use solana_sdk::signature::Signature;

use crate::error::{Adx402Error, ExtractionFailure, Result};
use crate::wallet::SignableTransaction;

/// High bit of the first message byte marks a versioned message.
pub const VERSION_PREFIX_MASK: u8 = 0x80;

/// Signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEncoding {
    Legacy,
    Versioned,
}

impl TransactionEncoding {
    /// Classify a message by its first byte.
    pub fn classify(first_byte: u8) -> Self {
        if first_byte & VERSION_PREFIX_MASK != 0 {
            TransactionEncoding::Versioned
        } else {
            TransactionEncoding::Legacy
        }
    }

    /// Classify a full message, failing on empty input.
    pub fn of_message(message: &[u8]) -> Result<Self> {
        message
            .first()
            .map(|b| Self::classify(*b))
            .ok_or_else(|| Adx402Error::UnrecognizedEncoding("empty message".into()))
    }
}

/// Decode raw message bytes into the matching transaction variant and merge
/// any pre-supplied signatures into their signer slots.
pub fn decode_transaction(
    message_bytes: &[u8],
    provided: &BTreeMap<String, Vec<u8>>,
) -> Result<SignableTransaction> {
    let mut tx = match TransactionEncoding::of_message(message_bytes)? {
        TransactionEncoding::Versioned => {
            let version = message_bytes[0] & !VERSION_PREFIX_MASK;
            if version != 0 {
                return Err(Adx402Error::UnrecognizedEncoding(format!(
                    "unsupported message version {version}"
                )));
            }
            let message: VersionedMessage = bincode::deserialize(message_bytes)
                .map_err(|e| Adx402Error::UnrecognizedEncoding(format!("versioned message: {e}")))?;
            SignableTransaction::unsigned_versioned(message)
        }
        TransactionEncoding::Legacy => {
            let message: Message = bincode::deserialize(message_bytes)
                .map_err(|e| Adx402Error::UnrecognizedEncoding(format!("legacy message: {e}")))?;
            SignableTransaction::unsigned_legacy(message)
        }
    };

    if provided.is_empty() {
        return Ok(tx);
    }

    let keys: Vec<String> = tx.signer_keys().iter().map(|k| k.to_string()).collect();
    for (slot, key) in tx.signatures_mut().iter_mut().zip(keys) {
        if let Some(bytes) = provided.get(&key) {
            *slot = signature_from_bytes(&key, bytes)?;
        }
    }

    Ok(tx)
}

/// Read the signature for `address` out of a signed transaction.
pub fn extract_signature(tx: &SignableTransaction, address: &str) -> Result<Signature> {
    let index = tx
        .signer_keys()
        .iter()
        .position(|k| k.to_string() == address)
        .ok_or_else(|| Adx402Error::SignatureExtraction {
            address: address.to_string(),
            reason: ExtractionFailure::NotASigner,
        })?;

    match tx.signatures().get(index) {
        Some(sig) if *sig != Signature::default() => Ok(*sig),
        _ => Err(Adx402Error::SignatureExtraction {
            address: address.to_string(),
            reason: ExtractionFailure::SlotEmpty,
        }),
    }
}

pub(crate) fn signature_from_bytes(address: &str, bytes: &[u8]) -> Result<Signature> {
    let raw: [u8; SIGNATURE_LEN] =
        bytes
            .try_into()
            .map_err(|_| Adx402Error::InvalidSignature {
                address: address.to_string(),
                reason: format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
            })?;
    Ok(Signature::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};
    use solana_sdk::message::v0;
    use solana_sdk::pubkey::Pubkey;

    fn ix(signers: &[Pubkey]) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: signers
                .iter()
                .map(|k| AccountMeta::new(*k, true))
                .collect(),
            data: vec![7; 4],
        }
    }

    fn legacy_bytes(payer: &Pubkey, cosigner: &Pubkey) -> Vec<u8> {
        Message::new_with_blockhash(&[ix(&[*cosigner])], Some(payer), &Hash::new_unique())
            .serialize()
    }

    fn versioned_bytes(payer: &Pubkey, cosigner: &Pubkey) -> Vec<u8> {
        let msg = v0::Message::try_compile(payer, &[ix(&[*cosigner])], &[], Hash::new_unique())
            .unwrap();
        VersionedMessage::V0(msg).serialize()
    }

    #[test]
    fn test_classify_is_high_bit_only() {
        for b in 0u8..=0x7f {
            assert_eq!(TransactionEncoding::classify(b), TransactionEncoding::Legacy);
        }
        for b in 0x80u8..=0xff {
            assert_eq!(TransactionEncoding::classify(b), TransactionEncoding::Versioned);
        }
    }

    #[test]
    fn test_classify_serialized_messages() {
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        assert_eq!(
            TransactionEncoding::of_message(&legacy_bytes(&a, &b)).unwrap(),
            TransactionEncoding::Legacy
        );
        assert_eq!(
            TransactionEncoding::of_message(&versioned_bytes(&a, &b)).unwrap(),
            TransactionEncoding::Versioned
        );
    }

    #[test]
    fn test_empty_message_is_unrecognized() {
        let err = decode_transaction(&[], &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Adx402Error::UnrecognizedEncoding(_)));
    }

    #[test]
    fn test_unsupported_version_fails_closed() {
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let mut bytes = versioned_bytes(&a, &b);
        bytes[0] = 0x81;
        let err = decode_transaction(&bytes, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Adx402Error::UnrecognizedEncoding(_)));
    }

    #[test]
    fn test_truncated_message_is_unrecognized() {
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let bytes = legacy_bytes(&a, &b);
        let err = decode_transaction(&bytes[..10], &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Adx402Error::UnrecognizedEncoding(_)));
    }

    #[test]
    fn test_decode_materializes_matching_variant() {
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let legacy = decode_transaction(&legacy_bytes(&a, &b), &BTreeMap::new()).unwrap();
        assert!(matches!(legacy, SignableTransaction::Legacy(_)));
        assert_eq!(legacy.signer_keys(), &[a, b]);

        let versioned = decode_transaction(&versioned_bytes(&a, &b), &BTreeMap::new()).unwrap();
        assert!(matches!(versioned, SignableTransaction::Versioned(_)));
        assert_eq!(versioned.signer_keys(), &[a, b]);
    }

    #[test]
    fn test_provided_signatures_fill_matching_slots() {
        let (payer, cosigner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let mut provided = BTreeMap::new();
        provided.insert(payer.to_string(), vec![9u8; 64]);
        // Not a signer; ignored.
        provided.insert(Pubkey::new_unique().to_string(), vec![3u8; 64]);

        for bytes in [legacy_bytes(&payer, &cosigner), versioned_bytes(&payer, &cosigner)] {
            let tx = decode_transaction(&bytes, &provided).unwrap();
            assert_eq!(tx.signatures()[0], Signature::from([9u8; 64]));
            assert_eq!(tx.signatures()[1], Signature::default());
        }
    }

    #[test]
    fn test_provided_signature_wrong_length() {
        let (payer, cosigner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let mut provided = BTreeMap::new();
        provided.insert(cosigner.to_string(), vec![1u8; 10]);
        let err = decode_transaction(&versioned_bytes(&payer, &cosigner), &provided).unwrap_err();
        assert!(matches!(err, Adx402Error::InvalidSignature { .. }));
    }

    #[test]
    fn test_extract_distinguishes_missing_signer_and_empty_slot() {
        let (payer, cosigner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let tx = decode_transaction(&versioned_bytes(&payer, &cosigner), &BTreeMap::new()).unwrap();

        let stranger = Pubkey::new_unique().to_string();
        match extract_signature(&tx, &stranger).unwrap_err() {
            Adx402Error::SignatureExtraction { reason, .. } => {
                assert_eq!(reason, ExtractionFailure::NotASigner)
            }
            other => panic!("unexpected error: {other}"),
        }

        match extract_signature(&tx, &cosigner.to_string()).unwrap_err() {
            Adx402Error::SignatureExtraction { reason, .. } => {
                assert_eq!(reason, ExtractionFailure::SlotEmpty)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_reads_slot_by_position() {
        let (payer, cosigner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let mut provided = BTreeMap::new();
        provided.insert(cosigner.to_string(), vec![5u8; 64]);
        let tx = decode_transaction(&legacy_bytes(&payer, &cosigner), &provided).unwrap();
        assert_eq!(
            extract_signature(&tx, &cosigner.to_string()).unwrap(),
            Signature::from([5u8; 64])
        );
    }
}
