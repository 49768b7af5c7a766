//! In-memory device adapter.
//!
//! Holds entity states in a map and applies service calls to it the way
//! the platform would.  The most recent calls are kept in a bounded log
//! so a long-running controller does not grow without limit.  Used by the
//! state-file adapter and by host-side simulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use heapless::HistoryBuffer;

use crate::app::ports::{DeviceError, DevicePort, ServiceCall};

/// Number of service calls retained by [`MemoryDevice`].
pub const CALL_LOG_CAPACITY: usize = 64;

/// One entity: its state string plus free-form attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Entity map keyed by entity id.
pub type EntityMap = BTreeMap<String, EntityState>;

#[derive(Debug, Default)]
pub struct MemoryDevice {
    entities: EntityMap,
    calls: HistoryBuffer<ServiceCall, CALL_LOG_CAPACITY>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(entities: EntityMap) -> Self {
        Self {
            entities,
            calls: HistoryBuffer::new(),
        }
    }

    pub fn entities(&self) -> &EntityMap {
        &self.entities
    }

    /// Replace the whole entity map, returning the previous one.
    pub fn replace(&mut self, entities: EntityMap) -> EntityMap {
        std::mem::replace(&mut self.entities, entities)
    }

    pub fn entity(&self, id: &str) -> Option<&EntityState> {
        self.entities.get(id)
    }

    /// Set a state directly, keeping attributes.
    pub fn put(&mut self, id: &str, state: impl Into<String>) {
        self.entities.entry(id.to_owned()).or_default().state = state.into();
    }

    /// The last [`CALL_LOG_CAPACITY`] service calls, oldest first.
    pub fn calls(&self) -> impl Iterator<Item = &ServiceCall> {
        self.calls.oldest_ordered()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl DevicePort for MemoryDevice {
    fn state(&self, entity: &str) -> Option<String> {
        self.entities.get(entity).map(|e| e.state.clone())
    }

    fn call_service(&mut self, call: &ServiceCall) -> Result<(), DeviceError> {
        self.calls.write(call.clone());
        let entry = self.entities.entry(call.entity().to_owned()).or_default();
        match call {
            ServiceCall::SetValue { value, .. } => entry.state = value.to_string(),
            ServiceCall::SetPresetMode { preset, .. } => {
                entry
                    .attributes
                    .insert("preset_mode".to_owned(), Value::from(preset.as_str()));
            }
            ServiceCall::SetTemperature { temperature, .. } => {
                entry
                    .attributes
                    .insert("temperature".to_owned(), Value::from(*temperature));
            }
            ServiceCall::TurnOff { .. } => entry.state = "off".to_owned(),
        }
        Ok(())
    }

    fn set_state(&mut self, entity: &str, state: &str) -> Result<(), DeviceError> {
        self.put(entity, state);
        Ok(())
    }
}
