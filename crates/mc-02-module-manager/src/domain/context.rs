//! # Hook Context
//!
//! Everything a hook is handed: the unmodified block header, the branch it
//! writes into and the event sink. Keepers reach a partition only by
//! presenting a [`StoreKey`] to [`Context::kv_store`].

use chrono::{DateTime, Utc};
use mc_01_store::{
    CacheMultiStore, ChangeSet, KvStore, MultiStoreRead, Partition, StoreError, StoreKey,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{BlockHeader, Codec, CodecError, Event};

/// Ordered event sink. Events keep the order in which hooks emitted them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain every event recorded so far.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Execution context for one phase (or one transaction).
pub struct Context<'a> {
    header: &'a BlockHeader,
    store: CacheMultiStore<'a>,
    events: EventManager,
}

impl<'a> Context<'a> {
    pub fn new(header: &'a BlockHeader, store: CacheMultiStore<'a>) -> Self {
        Self {
            header,
            store,
            events: EventManager::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        self.header
    }

    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    pub fn block_time(&self) -> DateTime<Utc> {
        self.header.time
    }

    /// Access the partition `key` was mounted as.
    pub fn kv_store(&mut self, key: &StoreKey) -> Result<Partition<'_, 'a>, StoreError> {
        self.store.partition(key)
    }

    /// Decode the value stored under `k`.
    pub fn load<T, E>(&mut self, key: &StoreKey, codec: Codec, k: &[u8]) -> Result<Option<T>, E>
    where
        T: DeserializeOwned,
        E: From<StoreError> + From<CodecError>,
    {
        match self.kv_store(key)?.get(k)? {
            Some(bytes) => Ok(Some(codec.unmarshal(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode every value under `prefix`, in key order.
    pub fn load_prefix<T, E>(
        &mut self,
        key: &StoreKey,
        codec: Codec,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, T)>, E>
    where
        T: DeserializeOwned,
        E: From<StoreError> + From<CodecError>,
    {
        let raw = self.kv_store(key)?.iter_prefix(prefix)?;
        let mut decoded = Vec::with_capacity(raw.len());
        for (k, bytes) in raw {
            decoded.push((k, codec.unmarshal(&bytes)?));
        }
        Ok(decoded)
    }

    /// Encode and store `value` under `k`.
    pub fn save<T, E>(&mut self, key: &StoreKey, codec: Codec, k: &[u8], value: &T) -> Result<(), E>
    where
        T: Serialize,
        E: From<StoreError> + From<CodecError>,
    {
        let bytes = codec.marshal(value)?;
        self.kv_store(key)?.set(k, &bytes)?;
        Ok(())
    }

    pub fn remove(&mut self, key: &StoreKey, k: &[u8]) -> Result<(), StoreError> {
        self.kv_store(key)?.delete(k)
    }

    pub fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take()
    }

    /// Nested context over this one. Its writes and events reach this
    /// context only through [`Context::absorb`].
    pub fn branch(&self) -> Context<'_> {
        Context {
            header: self.header,
            store: CacheMultiStore::new(&self.store),
            events: EventManager::new(),
        }
    }

    /// Fold a finished branch back in.
    pub fn absorb(&mut self, changes: ChangeSet, events: Vec<Event>) {
        self.store.absorb(changes);
        self.events.extend(events);
    }

    /// Read-only view of the branch, e.g. for a nested store.
    pub fn store(&self) -> &dyn MultiStoreRead {
        &self.store
    }

    /// Whether any write has been recorded.
    pub fn is_clean(&self) -> bool {
        self.store.is_empty()
    }

    /// Consume the context, returning its writes and events.
    pub fn into_parts(self) -> (ChangeSet, Vec<Event>) {
        (self.store.into_changes(), self.events.events)
    }
}
