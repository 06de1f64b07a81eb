//! In-memory entity store for voice-net testing.
//!
//! Provides an in-memory implementation of the store operations the voice-net
//! layer uses (nets, presence records) with builder-style seeding, failure
//! injection per path, and write counters for heartbeat assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use net_test_utils::{fixtures, MemoryStore};
//!
//! let store = MemoryStore::new()
//!     .with_net(fixtures::active_net("tac1", Some("abc123")))
//!     .failing_net_queries(true);
//!
//! // list_nets now degrades to the direct scan path
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::error::{CommonError, Result};
use common::types::{ClientId, MemberId, NetId};
use net_controller::governance::VoiceNet;
use net_controller::presence::PresenceRecord;
use net_controller::store::EntityStore;

/// In-memory [`EntityStore`] for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    nets: HashMap<NetId, VoiceNet>,
    presence: HashMap<(MemberId, ClientId), PresenceRecord>,
    fail_net_queries: bool,
    fail_scans: bool,
    fail_presence_writes: bool,
    scan_delay: Option<Duration>,
    query_delay: Option<Duration>,
    presence_writes: u64,
    net_query_count: u64,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a net.
    #[must_use]
    pub fn with_net(self, net: VoiceNet) -> Self {
        self.inner
            .lock()
            .unwrap()
            .nets
            .insert(net.id.clone(), net);
        self
    }

    /// Seed a presence record.
    #[must_use]
    pub fn with_presence(self, record: PresenceRecord) -> Self {
        self.inner.lock().unwrap().presence.insert(
            (record.actor_id.clone(), record.client_id.clone()),
            record,
        );
        self
    }

    /// Make the governance query path fail (`query_nets`).
    #[must_use]
    pub fn failing_net_queries(self, fail: bool) -> Self {
        self.inner.lock().unwrap().fail_net_queries = fail;
        self
    }

    /// Make the raw scan path fail (`scan_nets`).
    #[must_use]
    pub fn failing_scans(self, fail: bool) -> Self {
        self.inner.lock().unwrap().fail_scans = fail;
        self
    }

    /// Make presence writes fail.
    #[must_use]
    pub fn failing_presence_writes(self, fail: bool) -> Self {
        self.inner.lock().unwrap().fail_presence_writes = fail;
        self
    }

    /// Delay every `scan_nets` call, for bounded-wait tests.
    #[must_use]
    pub fn with_scan_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().scan_delay = Some(delay);
        self
    }

    /// Delay every `query_nets` call, for bounded-wait tests.
    #[must_use]
    pub fn with_query_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().query_delay = Some(delay);
        self
    }

    /// Flip the governance query path at runtime.
    pub fn set_fail_net_queries(&self, fail: bool) {
        self.inner.lock().unwrap().fail_net_queries = fail;
    }

    /// Flip presence write failures at runtime.
    pub fn set_fail_presence_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_presence_writes = fail;
    }

    /// Number of presence writes accepted so far.
    #[must_use]
    pub fn presence_write_count(&self) -> u64 {
        self.inner.lock().unwrap().presence_writes
    }

    /// Number of `query_nets` calls observed.
    #[must_use]
    pub fn net_query_count(&self) -> u64 {
        self.inner.lock().unwrap().net_query_count
    }

    /// Fetch a stored net directly, bypassing the trait.
    #[must_use]
    pub fn net(&self, id: &NetId) -> Option<VoiceNet> {
        self.inner.lock().unwrap().nets.get(id).cloned()
    }

    /// All stored nets, unordered.
    #[must_use]
    pub fn all_nets(&self) -> Vec<VoiceNet> {
        self.inner.lock().unwrap().nets.values().cloned().collect()
    }

    /// Fetch a stored presence record directly.
    #[must_use]
    pub fn presence(&self, actor_id: &MemberId, client_id: &ClientId) -> Option<PresenceRecord> {
        self.inner
            .lock()
            .unwrap()
            .presence
            .get(&(actor_id.clone(), client_id.clone()))
            .cloned()
    }

    fn filtered_sorted_nets(&self, scope_id: Option<&str>) -> Vec<VoiceNet> {
        let inner = self.inner.lock().unwrap();
        let mut nets: Vec<VoiceNet> = inner
            .nets
            .values()
            .filter(|net| match scope_id {
                Some(scope) => net.linked_scope_id.as_deref() == Some(scope),
                None => true,
            })
            .cloned()
            .collect();
        nets.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.code.cmp(&b.code))
        });
        nets
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn fetch_net(&self, id: &NetId) -> Result<Option<VoiceNet>> {
        Ok(self.inner.lock().unwrap().nets.get(id).cloned())
    }

    async fn query_nets(&self, scope_id: Option<&str>) -> Result<Vec<VoiceNet>> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            inner.net_query_count += 1;
            if inner.fail_net_queries {
                return Err(CommonError::Store(
                    "injected query failure".to_string(),
                ));
            }
            inner.query_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.filtered_sorted_nets(scope_id))
    }

    async fn scan_nets(&self, scope_id: Option<&str>) -> Result<Vec<VoiceNet>> {
        let (fail, delay) = {
            let inner = self.inner.lock().unwrap();
            (inner.fail_scans, inner.scan_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(CommonError::Store("injected scan failure".to_string()));
        }
        Ok(self.filtered_sorted_nets(scope_id))
    }

    async fn insert_net(&self, net: VoiceNet) -> Result<VoiceNet> {
        let mut inner = self.inner.lock().unwrap();
        inner.nets.insert(net.id.clone(), net.clone());
        Ok(net)
    }

    async fn update_net(&self, net: VoiceNet) -> Result<VoiceNet> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.nets.contains_key(&net.id) {
            return Err(CommonError::NotFound(format!("net {}", net.id)));
        }
        inner.nets.insert(net.id.clone(), net.clone());
        Ok(net)
    }

    async fn write_presence(&self, record: PresenceRecord) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_presence_writes {
            return Err(CommonError::Store(
                "injected presence write failure".to_string(),
            ));
        }
        inner.presence_writes += 1;
        inner
            .presence
            .insert((record.actor_id.clone(), record.client_id.clone()), record);
        Ok(())
    }

    async fn delete_presence(&self, actor_id: &MemberId, client_id: &ClientId) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .presence
            .remove(&(actor_id.clone(), client_id.clone()));
        Ok(())
    }

    async fn list_presence(&self) -> Result<Vec<PresenceRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .presence
            .values()
            .cloned()
            .collect())
    }
}
