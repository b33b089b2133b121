//! Lazily created remote clients, one per (kind, subscription)

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::kind::ProfileKind;
use crate::error::Result;
use crate::remote::ProfileClient;

/// Creates a client for a kind within a subscription
pub type ClientFactory<'f> = Box<dyn FnMut(ProfileKind, &str) -> Result<Arc<dyn ProfileClient>> + 'f>;

/// Keyed map of clients, filled on first use and kept for the whole traversal
pub struct ClientCache<'f> {
    clients: HashMap<(ProfileKind, String), Arc<dyn ProfileClient>>,
    factory: ClientFactory<'f>,
}

impl<'f> ClientCache<'f> {
    pub fn new(factory: impl FnMut(ProfileKind, &str) -> Result<Arc<dyn ProfileClient>> + 'f) -> Self {
        Self {
            clients: HashMap::new(),
            factory: Box::new(factory),
        }
    }

    /// Return the cached client or build one through the factory
    pub fn get_or_create(&mut self, kind: ProfileKind, subscription: &str) -> Result<Arc<dyn ProfileClient>> {
        let key = (kind, subscription.to_string());
        if let Some(client) = self.clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        debug!(kind = ?kind, subscription = %subscription, "Creating profile client");
        let client = (self.factory)(kind, subscription)?;
        self.clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
