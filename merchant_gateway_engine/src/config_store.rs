//! A [`GatewayStore`] backed by a static gateways file.
//!
//! The file is read once, at start-up, and the resulting table never changes afterwards. Gateway ids are assigned
//! `1..=n` in the order the gateways are declared. The only mutable state, the keychain counters, lives in the
//! [`FileKeychainAllocator`].
//!
//! ```toml
//! [[gateways]]
//! name = "default"
//! pubkey = "xpub6Cb..."
//! confirmations_required = 0
//! order_class = "Order"
//! secret = "secret"
//! check_signature = true
//! callback_url = "https://shop.example.com/payment_callback"
//! ```
use std::{collections::HashMap, path::Path, sync::Arc};

use log::*;
use serde::Deserialize;

use crate::{
    db_types::{Gateway, NewGateway},
    keychain::FileKeychainAllocator,
    traits::{GatewayStore, GatewayStoreError, KeychainAllocator, KeychainError},
};

#[derive(Debug, Deserialize)]
struct GatewaysFile {
    #[serde(default)]
    gateways: Vec<NewGateway>,
}

#[derive(Clone, Debug)]
pub struct ConfigGatewayStore {
    gateways: Arc<Vec<Gateway>>,
    by_name: Arc<HashMap<String, usize>>,
    keychain: FileKeychainAllocator,
}

impl ConfigGatewayStore {
    pub fn new(definitions: Vec<NewGateway>, keychain: FileKeychainAllocator) -> Result<Self, GatewayStoreError> {
        let mut gateways = Vec::with_capacity(definitions.len());
        let mut by_name = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.into_iter().enumerate() {
            if definition.name.trim().is_empty() {
                return Err(GatewayStoreError::ConfigurationError(format!("Gateway #{} has no name", index + 1)));
            }
            if definition.confirmations_required < 0 {
                return Err(GatewayStoreError::ConfigurationError(format!(
                    "Gateway '{}' requires a negative number of confirmations",
                    definition.name
                )));
            }
            keychain.counter_path(&definition.name).map_err(|e| GatewayStoreError::ConfigurationError(e.to_string()))?;
            if by_name.insert(definition.name.clone(), index).is_some() {
                return Err(GatewayStoreError::DuplicateGateway(definition.name));
            }
            #[allow(clippy::cast_possible_wrap)]
            let id = index as i64 + 1;
            gateways.push(Gateway::from_new(id, definition, 0));
        }
        info!("🗂️ {} gateways loaded from configuration", gateways.len());
        Ok(Self { gateways: Arc::new(gateways), by_name: Arc::new(by_name), keychain })
    }

    pub fn from_toml_str(contents: &str, keychain: FileKeychainAllocator) -> Result<Self, GatewayStoreError> {
        let file = toml::from_str::<GatewaysFile>(contents)
            .map_err(|e| GatewayStoreError::ConfigurationError(format!("Could not parse gateways file. {e}")))?;
        Self::new(file.gateways, keychain)
    }

    pub async fn load<P: AsRef<Path>>(path: P, keychain: FileKeychainAllocator) -> Result<Self, GatewayStoreError> {
        let path = path.as_ref();
        debug!("🗂️ Loading gateways from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayStoreError::ConfigurationError(format!("Could not read {}. {e}", path.display()))
        })?;
        Self::from_toml_str(&contents, keychain)
    }

    pub fn keychain(&self) -> &FileKeychainAllocator {
        &self.keychain
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    fn by_id(&self, id: i64) -> Option<&Gateway> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.gateways.get(index)
    }

    /// Fills in the counter from its file, so that callers see the same value the database backend would report.
    async fn with_counter(&self, gateway: &Gateway) -> Result<Gateway, GatewayStoreError> {
        let mut gateway = gateway.clone();
        gateway.last_keychain_id = self.keychain.current_id(&gateway).await?;
        Ok(gateway)
    }
}

impl GatewayStore for ConfigGatewayStore {
    async fn find_by_id(&self, id: i64) -> Result<Gateway, GatewayStoreError> {
        let gateway = self.by_id(id).ok_or(GatewayStoreError::GatewayNotFound(id))?;
        self.with_counter(gateway).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Gateway, GatewayStoreError> {
        let index = self.by_name.get(name).ok_or_else(|| GatewayStoreError::GatewayNameNotFound(name.to_string()))?;
        self.with_counter(&self.gateways[*index]).await
    }

    async fn fetch_gateways(&self) -> Result<Vec<Gateway>, GatewayStoreError> {
        let mut result = Vec::with_capacity(self.gateways.len());
        for gateway in self.gateways.iter() {
            result.push(self.with_counter(gateway).await?);
        }
        Ok(result)
    }
}

impl KeychainAllocator for ConfigGatewayStore {
    async fn current_id(&self, gateway: &Gateway) -> Result<i64, KeychainError> {
        self.keychain.current_id(gateway).await
    }

    async fn next_id(&self, gateway: &Gateway) -> Result<i64, KeychainError> {
        self.keychain.next_id(gateway).await
    }
}
