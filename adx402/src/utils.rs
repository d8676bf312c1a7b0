use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::keypair::keypair_from_seed;
use solana_sdk::signer::Signer;

use crate::error::{Adx402Error, Result};

/// Split a comma-separated form field into trimmed, non-empty items.
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a private key from a bs58 string (32-byte secret or 64-byte keypair).
pub fn keypair_from_private_key(key: &str) -> Result<Keypair> {
    let bytes = bs58::decode(key.trim())
        .into_vec()
        .map_err(|e| Adx402Error::Validation(format!("bs58 decode error: {e}")))?;

    if bytes.len() != 32 && bytes.len() != 64 {
        return Err(Adx402Error::Validation(format!(
            "unexpected key length: {}",
            bytes.len()
        )));
    }

    let keypair = keypair_from_seed(&bytes[..32])
        .map_err(|e| Adx402Error::Validation(format!("invalid secret key: {e}")))?;

    // A 64-byte keypair carries its public half; it must match the secret.
    if bytes.len() == 64 && keypair.pubkey().to_bytes()[..] != bytes[32..] {
        return Err(Adx402Error::Validation(
            "public key does not match secret key".into(),
        ));
    }

    Ok(keypair)
}

/// Parse a base58 wallet address.
pub fn parse_address(address: &str) -> Result<Pubkey> {
    address
        .parse()
        .map_err(|e| Adx402Error::Validation(format!("invalid address {address:?}: {e}")))
}

/// `ABCD…WXYZ` form of an address for display.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Explorer link for a settlement transaction.
pub fn explorer_tx_url(explorer_url: &str, tx_id: &str, cluster: Option<&str>) -> String {
    let base = explorer_url.trim_end_matches('/');
    match cluster {
        Some(cluster) => format!("{base}/tx/{tx_id}?cluster={cluster}"),
        None => format!("{base}/tx/{tx_id}"),
    }
}

/// Check that an ad's target link is an absolute http(s) URL.
pub fn validate_target_url(target: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(target.trim())
        .map_err(|e| Adx402Error::Validation(format!("invalid target URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Adx402Error::Validation(format!(
            "target URL must be http or https, got {other}"
        ))),
    }
}

/// Content type for an ad creative, by file extension.
pub fn image_content_type(file_name: &str) -> Result<&'static str> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "svg" => Ok("image/svg+xml"),
        _ => Err(Adx402Error::Validation(format!(
            "unsupported image type: {file_name}"
        ))),
    }
}
