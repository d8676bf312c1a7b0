use std::str::FromStr;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::hash::Hash;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use tracing::debug;

use super::PaymentRequirements;
use crate::bridge::{decode_transaction, SignatureMap, SigningRequest};
use crate::error::{Adx402Error, Result};
use crate::wallet::SignableTransaction;

/// Chain reads needed to build a payment transaction.
#[async_trait]
pub trait ChainState: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8>;
}

/// [`ChainState`] over a Solana JSON-RPC node.
pub struct RpcChainState {
    client: RpcClient,
}

impl RpcChainState {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            client: RpcClient::new(rpc_url.to_string()),
        }
    }
}

#[async_trait]
impl ChainState for RpcChainState {
    async fn latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| Adx402Error::Solana(format!("get blockhash: {e}")))
    }

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8> {
        self.client
            .get_token_supply(mint)
            .await
            .map(|supply| supply.decimals)
            .map_err(|e| Adx402Error::Solana(format!("get token supply for {mint}: {e}")))
    }
}

/// Produces the unsigned transfer a payment requirement asks for.
#[async_trait]
pub trait PaymentTransactionBuilder: Send + Sync {
    async fn build(&self, requirements: &PaymentRequirements, payer: &Pubkey)
        -> Result<SigningRequest>;
}

/// Builds `exact`-scheme SPL token transfers as v0 messages.
///
/// Layout: compute unit limit, compute unit price, `TransferChecked` from the
/// payer's associated token account to the recipient's. The facilitator named
/// in `extra.feePayer` pays fees and signs server-side; without one the payer
/// pays its own fees.
pub struct SolanaExactBuilder<C> {
    chain: C,
    compute_unit_limit: u32,
    compute_unit_price: u64,
}

impl<C: ChainState> SolanaExactBuilder<C> {
    pub fn new(chain: C, compute_unit_limit: u32, compute_unit_price: u64) -> Self {
        Self {
            chain,
            compute_unit_limit,
            compute_unit_price,
        }
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| Adx402Error::PaymentRejected(format!("invalid {field} {value:?}: {e}")))
}

#[async_trait]
impl<C: ChainState> PaymentTransactionBuilder for SolanaExactBuilder<C> {
    async fn build(
        &self,
        requirements: &PaymentRequirements,
        payer: &Pubkey,
    ) -> Result<SigningRequest> {
        let mint = parse_pubkey("asset", &requirements.asset)?;
        let pay_to = parse_pubkey("payTo", &requirements.pay_to)?;
        let fee_payer = match requirements.fee_payer() {
            Some(fp) => parse_pubkey("feePayer", fp)?,
            None => *payer,
        };
        let amount: u64 = requirements.max_amount_required.parse().map_err(|e| {
            Adx402Error::PaymentRejected(format!(
                "invalid amount {:?}: {e}",
                requirements.max_amount_required
            ))
        })?;

        let decimals = self.chain.mint_decimals(&mint).await?;
        let blockhash = self.chain.latest_blockhash().await?;

        let source = get_associated_token_address(payer, &mint);
        let destination = get_associated_token_address(&pay_to, &mint);

        let transfer = spl_token::instruction::transfer_checked(
            &spl_token::id(),
            &source,
            &mint,
            &destination,
            payer,
            &[],
            amount,
            decimals,
        )
        .map_err(|e| Adx402Error::Solana(format!("build transfer ix: {e}")))?;

        let instructions = [
            ComputeBudgetInstruction::set_compute_unit_limit(self.compute_unit_limit),
            ComputeBudgetInstruction::set_compute_unit_price(self.compute_unit_price),
            transfer,
        ];

        let message = v0::Message::try_compile(&fee_payer, &instructions, &[], blockhash)
            .map_err(|e| Adx402Error::Solana(format!("compile message: {e}")))?;

        debug!(%mint, %pay_to, %fee_payer, amount, decimals, "built payment transaction");

        Ok(SigningRequest::new(VersionedMessage::V0(message).serialize()))
    }
}

/// Combine a request with the wallet's signature into a wire-format
/// transaction. Slots nobody has signed yet stay empty.
pub fn assemble_transaction(request: &SigningRequest, signed: &SignatureMap) -> Result<Vec<u8>> {
    let mut signatures = request.signatures().clone();
    signatures.extend(signed.to_map());

    let tx = decode_transaction(request.message_bytes(), &signatures)?;
    let bytes = match &tx {
        SignableTransaction::Legacy(tx) => bincode::serialize(tx)?,
        SignableTransaction::Versioned(tx) => bincode::serialize(tx)?,
    };
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentExtra;
    use solana_sdk::signature::{Keypair, Signature, Signer};
    use solana_sdk::transaction::VersionedTransaction;

    struct FixedChain(Hash);

    #[async_trait]
    impl ChainState for FixedChain {
        async fn latest_blockhash(&self) -> Result<Hash> {
            Ok(self.0)
        }

        async fn mint_decimals(&self, _mint: &Pubkey) -> Result<u8> {
            Ok(6)
        }
    }

    fn requirements(fee_payer: Option<Pubkey>) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: "solana-devnet".into(),
            max_amount_required: "250000".into(),
            resource: "http://localhost:3000/brand/ad".into(),
            description: String::new(),
            mime_type: String::new(),
            pay_to: Pubkey::new_unique().to_string(),
            max_timeout_seconds: 60,
            asset: Pubkey::new_unique().to_string(),
            extra: fee_payer.map(|fp| PaymentExtra {
                fee_payer: Some(fp.to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_build_uses_fee_payer_as_first_signer() {
        let blockhash = Hash::new_unique();
        let builder = SolanaExactBuilder::new(FixedChain(blockhash), 200_000, 1);
        let payer = Pubkey::new_unique();
        let fee_payer = Pubkey::new_unique();

        let request = builder
            .build(&requirements(Some(fee_payer)), &payer)
            .await
            .unwrap();
        let tx = decode_transaction(request.message_bytes(), request.signatures()).unwrap();

        assert!(matches!(tx, SignableTransaction::Versioned(_)));
        assert_eq!(tx.signer_keys(), &[fee_payer, payer]);
        if let SignableTransaction::Versioned(v) = &tx {
            assert_eq!(*v.message.recent_blockhash(), blockhash);
            assert_eq!(v.message.instructions().len(), 3);
        }
    }

    #[tokio::test]
    async fn test_build_without_fee_payer_has_single_signer() {
        let builder = SolanaExactBuilder::new(FixedChain(Hash::new_unique()), 200_000, 1);
        let payer = Pubkey::new_unique();
        let request = builder.build(&requirements(None), &payer).await.unwrap();
        let tx = decode_transaction(request.message_bytes(), request.signatures()).unwrap();
        assert_eq!(tx.signer_keys(), &[payer]);
    }

    #[tokio::test]
    async fn test_build_rejects_bad_amount() {
        let builder = SolanaExactBuilder::new(FixedChain(Hash::new_unique()), 200_000, 1);
        let mut req = requirements(None);
        req.max_amount_required = "1.5".into();
        let err = builder.build(&req, &Pubkey::new_unique()).await.unwrap_err();
        assert!(matches!(err, Adx402Error::PaymentRejected(_)));
    }

    #[tokio::test]
    async fn test_assemble_places_signature_in_payer_slot() {
        let builder = SolanaExactBuilder::new(FixedChain(Hash::new_unique()), 200_000, 1);
        let payer = Keypair::new();
        let fee_payer = Pubkey::new_unique();
        let request = builder
            .build(&requirements(Some(fee_payer)), &payer.pubkey())
            .await
            .unwrap();

        let sig = payer.sign_message(request.message_bytes());
        let signed = SignatureMap::new(payer.pubkey().to_string(), sig);
        let wire = assemble_transaction(&request, &signed).unwrap();

        let tx: VersionedTransaction = bincode::deserialize(&wire).unwrap();
        assert_eq!(tx.signatures.len(), 2);
        assert_eq!(tx.signatures[0], Signature::default());
        assert_eq!(tx.signatures[1], sig);
        assert!(tx.signatures[1].verify(payer.pubkey().as_ref(), &tx.message.serialize()));
    }
}
