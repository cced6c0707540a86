use std::collections::HashMap;

use message_store::{
    backend::AuthoritativeBackend,
    cache::{BatchInfoCache, memory::InMemoryCache},
    facade::{BatchManager, Operational, Query},
    model::{DeliveryStatus, EventEnvelope, EventType, MessageEnvelope},
    object_store::memory::InMemoryObjectStore,
};
use serde_json::json;

pub type Backend = AuthoritativeBackend<InMemoryObjectStore>;
pub type Cache = BatchInfoCache<InMemoryCache>;

pub struct Harness {
    pub backend: Backend,
    pub cache: Cache,
    pub batch_manager: BatchManager<InMemoryObjectStore, InMemoryCache>,
    pub operational: Operational<InMemoryObjectStore, InMemoryCache>,
    pub query: Query<InMemoryObjectStore, InMemoryCache>,
}

pub fn harness() -> Harness {
    harness_with_recency_limit(message_store::cache::batch_info::DEFAULT_RECENCY_LIMIT)
}

pub fn harness_with_recency_limit(recency_limit: usize) -> Harness {
    let store = InMemoryObjectStore::new();
    let cache_store = InMemoryCache::new();
    let backend = AuthoritativeBackend::new(store);
    let cache = BatchInfoCache::with_recency_limit(cache_store, recency_limit);
    Harness {
        backend: backend.clone(),
        cache: cache.clone(),
        batch_manager: BatchManager::new(backend.clone(), cache.clone()),
        operational: Operational::new(backend.clone(), cache.clone()),
        query: Query::new(backend, cache),
    }
}

pub fn inbound(message_id: &str, timestamp: &str, from_addr: &str) -> MessageEnvelope {
    MessageEnvelope {
        message_id: message_id.to_owned(),
        timestamp: timestamp.to_owned(),
        from_addr: Some(from_addr.to_owned()),
        to_addr: None,
        body: json!({}),
    }
}

pub fn outbound(message_id: &str, timestamp: &str, to_addr: &str) -> MessageEnvelope {
    MessageEnvelope {
        message_id: message_id.to_owned(),
        timestamp: timestamp.to_owned(),
        from_addr: None,
        to_addr: Some(to_addr.to_owned()),
        body: json!({}),
    }
}

pub fn ack(event_id: &str, user_message_id: &str, timestamp: &str) -> EventEnvelope {
    EventEnvelope {
        event_id: event_id.to_owned(),
        user_message_id: user_message_id.to_owned(),
        timestamp: timestamp.to_owned(),
        event_type: EventType::Ack,
        delivery_status: None,
        body: json!({}),
    }
}

pub fn delivery_report(event_id: &str, user_message_id: &str, timestamp: &str, status: DeliveryStatus) -> EventEnvelope {
    EventEnvelope {
        event_id: event_id.to_owned(),
        user_message_id: user_message_id.to_owned(),
        timestamp: timestamp.to_owned(),
        event_type: EventType::DeliveryReport,
        delivery_status: Some(status),
        body: json!({}),
    }
}

pub fn no_metadata() -> HashMap<String, String> {
    HashMap::new()
}
