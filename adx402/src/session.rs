use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::error::{Adx402Error, Result};
use crate::types::Role;
use crate::utils::shorten_address;

/// Connection and verification state of the active wallet.
///
/// Owned by the caller and passed in where needed. Nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    address: Option<String>,
    verified: bool,
    role: Option<Role>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for an already connected wallet.
    pub fn connected(address: &Pubkey) -> Self {
        let mut session = Self::new();
        session.connect(address);
        session
    }

    /// Record a connection. Switching to a different address drops any
    /// earlier verification.
    pub fn connect(&mut self, address: &Pubkey) {
        let address = address.to_string();
        if self.address.as_deref() != Some(address.as_str()) {
            info!(wallet = %shorten_address(&address), "wallet connected");
            self.address = Some(address);
            self.verified = false;
            self.role = None;
        }
    }

    pub fn disconnect(&mut self) {
        if self.address.take().is_some() {
            info!("wallet disconnected");
        }
        self.verified = false;
        self.role = None;
    }

    /// Follow the wallet's current address, connecting or disconnecting as needed.
    pub fn sync(&mut self, address: Option<Pubkey>) {
        match address {
            Some(address) => self.connect(&address),
            None => self.disconnect(),
        }
    }

    pub fn mark_verified(&mut self, role: Option<Role>) {
        self.verified = true;
        self.role = role;
    }

    pub fn mark_unverified(&mut self) {
        self.verified = false;
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Address of the connected wallet, or `NotConnected`.
    pub fn require_wallet(&self) -> Result<&str> {
        self.address().ok_or(Adx402Error::NotConnected)
    }

    /// Address of a connected and verified wallet.
    pub fn require_verification(&self) -> Result<&str> {
        let address = self.require_wallet()?;
        if !self.verified {
            return Err(Adx402Error::NotVerified);
        }
        Ok(address)
    }

    pub fn short_address(&self) -> Option<String> {
        self.address().map(shorten_address)
    }
}
