//! Sled-backed Persistent Event Log
//!
//! Durable `EventSink` implementation. The in-process log stays the source
//! of truth; persistence failures here are logged and the trade stands.

use std::sync::atomic::{AtomicU64, Ordering};

use lib_types::CurveId;

use crate::events::{EventSink, TradeEvent};

const TREE_EVENTS: &str = "curve_events";
const TREE_CURVE_INDEX: &str = "curve_events_curve_idx";
const TREE_KIND_INDEX: &str = "curve_events_kind_idx";
const KEY_COUNTER: &str = "meta:counter";

/// Sled-backed persistent event log
#[derive(Debug)]
pub struct SledEventLog {
    _db: sled::Db,
    events: sled::Tree,
    curve_index: sled::Tree,
    kind_index: sled::Tree,
    counter: AtomicU64,
}

impl SledEventLog {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, sled::Error> {
        let events = db.open_tree(TREE_EVENTS)?;
        let curve_index = db.open_tree(TREE_CURVE_INDEX)?;
        let kind_index = db.open_tree(TREE_KIND_INDEX)?;

        let counter = events
            .get(KEY_COUNTER)?
            .map(|v| {
                let bytes: [u8; 8] = v.as_ref().try_into().unwrap_or([0u8; 8]);
                u64::from_be_bytes(bytes)
            })
            .unwrap_or(0);

        Ok(Self {
            _db: db,
            events,
            curve_index,
            kind_index,
            counter: AtomicU64::new(counter),
        })
    }

    /// Stored events, excluding the counter row
    pub fn event_count(&self) -> usize {
        self.events.len().saturating_sub(1)
    }

    /// All events for a curve, oldest first
    pub fn events_for(&self, curve_id: &CurveId) -> Vec<TradeEvent> {
        let prefix = format!("{}/", hex::encode(curve_id.as_bytes()));
        let mut events = Vec::new();

        for result in self.curve_index.scan_prefix(prefix.as_bytes()) {
            match result {
                Ok((_, event_key)) => {
                    if let Ok(Some(data)) = self.events.get(&event_key) {
                        match bincode::deserialize::<TradeEvent>(&data) {
                            Ok(event) => events.push(event),
                            Err(e) => tracing::error!("undecodable stored event: {}", e),
                        }
                    }
                }
                Err(e) => tracing::error!("error reading curve index: {}", e),
            }
        }

        events.sort_by_key(|e| e.seq);
        events
    }

    /// All events of one kind for a curve, oldest first
    pub fn events_by_kind(&self, curve_id: &CurveId, kind: &str) -> Vec<TradeEvent> {
        let mut events = Vec::new();

        for result in self.kind_index.scan_prefix(format!("{}/", kind).as_bytes()) {
            match result {
                Ok((_, event_key)) => {
                    if let Ok(Some(data)) = self.events.get(&event_key) {
                        if let Ok(event) = bincode::deserialize::<TradeEvent>(&data) {
                            if event.curve_id() == curve_id {
                                events.push(event);
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("error reading kind index: {}", e),
            }
        }

        events.sort_by_key(|e| e.seq);
        events
    }

    fn next_key(&self, event: &TradeEvent) -> String {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst);
        format!(
            "{}/{:020}",
            hex::encode(&event.curve_id.as_bytes()[..8]),
            counter
        )
    }

    fn save_counter(&self) -> Result<(), sled::Error> {
        let counter = self.counter.load(Ordering::SeqCst);
        self.events.insert(KEY_COUNTER, &counter.to_be_bytes())?;
        Ok(())
    }
}

impl EventSink for SledEventLog {
    fn record(&self, event: &TradeEvent) {
        let event_key = self.next_key(event);

        let serialized = match bincode::serialize(event) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("failed to serialize event: {}", e);
                return;
            }
        };

        if let Err(e) = self.events.insert(event_key.as_bytes(), serialized) {
            tracing::error!("failed to store event: {}", e);
            return;
        }

        let curve_key = format!(
            "{}/{}",
            hex::encode(event.curve_id.as_bytes()),
            &event_key
        );
        if let Err(e) = self
            .curve_index
            .insert(curve_key.as_bytes(), event_key.as_bytes())
        {
            tracing::error!("failed to update curve index: {}", e);
        }

        let kind_key = format!("{}/{}", event.kind_name(), &event_key);
        if let Err(e) = self
            .kind_index
            .insert(kind_key.as_bytes(), event_key.as_bytes())
        {
            tracing::error!("failed to update kind index: {}", e);
        }

        if let Err(e) = self.save_counter() {
            tracing::error!("failed to persist event counter: {}", e);
        }
    }

    fn flush(&self) {
        for tree in [&self.events, &self.curve_index, &self.kind_index] {
            if let Err(e) = tree.flush() {
                tracing::error!("failed to flush event log: {}", e);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
