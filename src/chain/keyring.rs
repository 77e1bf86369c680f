//! Signing identities derived from secret URIs.
//!
//! # Security
//! - Only URIs from configuration are accepted (dev accounts like `//Alice`)
//! - Secret material is never logged or serialized

use std::str::FromStr;

use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;
use subxt_signer::SecretUri;

use crate::chain::types::{ChainError, ChainResult};

/// An sr25519 keypair and the account it controls.
#[derive(Clone)]
pub struct DevIdentity {
    /// The URI the identity was derived from, with any password removed.
    label: String,
    keypair: Keypair,
    account: AccountId32,
}

impl DevIdentity {
    /// Derive an identity from a secret URI such as `//Alice` or
    /// `bottom drive obey lake curtain smoke basket hold race lonely fit walk//Bob`.
    pub fn from_uri(uri: &str) -> ChainResult<Self> {
        let secret = SecretUri::from_str(uri)
            .map_err(|e| ChainError::Keyring(format!("Invalid secret URI: {}", e)))?;
        let keypair = Keypair::from_uri(&secret)
            .map_err(|e| ChainError::Keyring(format!("Key derivation failed: {}", e)))?;
        let account = keypair.public_key().to_account_id();

        let label = uri.split("///").next().unwrap_or_default();
        let label = if label.starts_with("//") {
            label.trim_start_matches('/').to_string()
        } else {
            account.to_string()
        };

        tracing::debug!(account = %account, label = %label, "Identity derived");

        Ok(Self {
            label,
            keypair,
            account,
        })
    }

    /// Human name for console output: the dev name for `//Name` URIs,
    /// otherwise the SS58 address.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn account(&self) -> &AccountId32 {
        &self.account
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for DevIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevIdentity")
            .field("label", &self.label)
            .field("account", &self.account.to_string())
            .finish()
    }
}
