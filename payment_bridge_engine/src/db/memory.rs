use std::{collections::HashMap, sync::Arc};

use log::*;
use tokio::sync::RwLock;

use crate::traits::{SessionStore, SessionStoreError, TenantSession};

/// An in-process session store. Cloning is cheap, and clones share the same sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, TenantSession>>>,
    max_tenants: Option<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of distinct shops that can be stored. Replacing an existing shop's session is always allowed.
    pub fn with_max_tenants(mut self, max_tenants: usize) -> Self {
        self.max_tenants = Some(max_tenants);
        self
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, shop: &str) -> Result<Option<TenantSession>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(shop).cloned())
    }

    async fn store(&self, session: TenantSession) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        if let Some(max) = self.max_tenants {
            if !sessions.contains_key(&session.shop) && sessions.len() >= max {
                warn!("🗃️ Session store is full. Refusing to add a session for {}", session.shop);
                return Err(SessionStoreError::CapacityExceeded(max, session.shop));
            }
        }
        debug!("🗃️ Storing session for {}", session.shop);
        sessions.insert(session.shop.clone(), session);
        Ok(())
    }
}
