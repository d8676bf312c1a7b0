use crate::error::{Adx402Error, Result};

/// Default backend when `ADX_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Configuration for the Adx402 client.
#[derive(Debug, Clone)]
pub struct Adx402Config {
    /// Base URL for the Adx402 backend (e.g. `http://localhost:3000`).
    pub api_base_url: String,
    /// Wallet verification endpoint; defaults to `{api_base_url}/x402` if not set.
    pub x402_endpoint: Option<String>,
    /// x402 network name the client pays on (`solana` or `solana-devnet`).
    pub network: String,
    /// Solana RPC URL, used to build payment transactions.
    pub solana_rpc_url: String,
    /// Block explorer base URL for settlement links.
    pub explorer_url: String,
    /// Compute unit limit attached to payment transactions.
    pub compute_unit_limit: u32,
    /// Priority fee in micro-lamports per compute unit.
    pub compute_unit_price: u64,
}

impl Default for Adx402Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            x402_endpoint: None,
            network: "solana-devnet".into(),
            solana_rpc_url: "https://api.devnet.solana.com".into(),
            explorer_url: "https://explorer.solana.com".into(),
            compute_unit_limit: 200_000,
            compute_unit_price: 1,
        }
    }
}

impl Adx402Config {
    /// Build a config from `ADX_*` environment variables, falling back to
    /// [`Default`] for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Adx402Config::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("ADX_API_BASE_URL") {
            config.api_base_url = v;
        }
        if let Some(v) = lookup("ADX_X402_ENDPOINT") {
            config.x402_endpoint = Some(v);
        }
        if let Some(v) = lookup("ADX_NETWORK") {
            config.network = v;
        }
        if let Some(v) = lookup("ADX_SOLANA_RPC_URL") {
            config.solana_rpc_url = v;
        }
        if let Some(v) = lookup("ADX_EXPLORER_URL") {
            config.explorer_url = v;
        }
        if let Some(v) = lookup("ADX_COMPUTE_UNIT_LIMIT") {
            config.compute_unit_limit = v
                .parse()
                .map_err(|e| Adx402Error::Validation(format!("ADX_COMPUTE_UNIT_LIMIT: {e}")))?;
        }
        if let Some(v) = lookup("ADX_COMPUTE_UNIT_PRICE") {
            config.compute_unit_price = v
                .parse()
                .map_err(|e| Adx402Error::Validation(format!("ADX_COMPUTE_UNIT_PRICE: {e}")))?;
        }

        url::Url::parse(&config.api_base_url)
            .map_err(|e| Adx402Error::Validation(format!("invalid api base url: {e}")))?;

        Ok(config)
    }

    /// The verification endpoint, without a trailing slash.
    pub fn x402_endpoint(&self) -> String {
        match &self.x402_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("{}/x402", self.api_base_url.trim_end_matches('/')),
        }
    }

    /// Explorer cluster query value, if the network is not mainnet.
    pub fn cluster(&self) -> Option<&str> {
        match self.network.as_str() {
            "solana" | "solana-mainnet" => None,
            other => Some(other.strip_prefix("solana-").unwrap_or(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Adx402Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.x402_endpoint(), "http://localhost:3000/x402");
        assert_eq!(config.cluster(), Some("devnet"));
    }

    #[test]
    fn test_overrides_from_env() {
        let config = Adx402Config::from_lookup(lookup_from(&[
            ("ADX_API_BASE_URL", "https://api.adx402.io/"),
            ("ADX_NETWORK", "solana"),
            ("ADX_COMPUTE_UNIT_PRICE", "5000"),
        ]))
        .unwrap();
        assert_eq!(config.x402_endpoint(), "https://api.adx402.io/x402");
        assert_eq!(config.cluster(), None);
        assert_eq!(config.compute_unit_price, 5000);
    }

    #[test]
    fn test_explicit_x402_endpoint_wins() {
        let config = Adx402Config::from_lookup(lookup_from(&[(
            "ADX_X402_ENDPOINT",
            "http://localhost:8080/api/x402/",
        )]))
        .unwrap();
        assert_eq!(config.x402_endpoint(), "http://localhost:8080/api/x402");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(
            Adx402Config::from_lookup(lookup_from(&[("ADX_API_BASE_URL", "not a url")])).is_err()
        );
        assert!(Adx402Config::from_lookup(lookup_from(&[(
            "ADX_COMPUTE_UNIT_LIMIT",
            "lots"
        )]))
        .is_err());
    }
}
