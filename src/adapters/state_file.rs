//! JSON state-file device adapter.
//!
//! Host-side stand-in for the home-automation platform.  The file holds
//! an [`EntityMap`] as JSON:
//!
//! ```json
//! { "sensor.corridor_terror": { "state": "0.4" },
//!   "input_boolean.make_warm": { "state": "off" } }
//! ```
//!
//! [`reload`](StateFileDevice::reload) re-reads the file and reports every
//! entity whose state changed since the last read; service calls update
//! the in-memory copy and [`flush`](StateFileDevice::flush) writes it back.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::app::commands::AppCommand;
use crate::app::ports::{DeviceError, DevicePort, ServiceCall};

use super::memory::{EntityMap, MemoryDevice};

pub struct StateFileDevice {
    path: PathBuf,
    inner: MemoryDevice,
    dirty: bool,
}

impl StateFileDevice {
    /// Open `path`.  A missing file starts empty and is created on the
    /// first flush.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        let path = path.as_ref().to_path_buf();
        let entities = read_entities(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            inner: MemoryDevice::with_entities(entities),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn device(&self) -> &MemoryDevice {
        &self.inner
    }

    /// Re-read the file.  Returns a `StateChanged` command per entity
    /// whose state differs from the in-memory copy.
    pub fn reload(&mut self) -> Result<Vec<AppCommand>, DeviceError> {
        let Some(fresh) = read_entities(&self.path)? else {
            return Ok(Vec::new());
        };
        let changes = diff(self.inner.entities(), &fresh);
        if !changes.is_empty() {
            debug!("{} entity change(s) in {}", changes.len(), self.path.display());
        }
        self.inner.replace(fresh);
        Ok(changes)
    }

    /// Write pending changes back to the file.
    pub fn flush(&mut self) -> Result<(), DeviceError> {
        if !self.dirty {
            return Ok(());
        }
        let text = serde_json::to_string_pretty(self.inner.entities())
            .map_err(|e| DeviceError::IoError(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| DeviceError::IoError(e.to_string()))?;
        self.dirty = false;
        Ok(())
    }
}

fn read_entities(path: &Path) -> Result<Option<EntityMap>, DeviceError> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| DeviceError::IoError(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DeviceError::IoError(e.to_string())),
    }
}

fn diff(old: &EntityMap, new: &EntityMap) -> Vec<AppCommand> {
    let mut changes = Vec::new();
    for (id, entity) in new {
        let before = old.get(id).map(|e| e.state.as_str());
        if before != Some(entity.state.as_str()) {
            changes.push(AppCommand::StateChanged {
                entity: id.clone(),
                old: before.map(str::to_owned),
                new: Some(entity.state.clone()),
            });
        }
    }
    for (id, entity) in old {
        if !new.contains_key(id) {
            changes.push(AppCommand::StateChanged {
                entity: id.clone(),
                old: Some(entity.state.clone()),
                new: None,
            });
        }
    }
    changes
}

impl DevicePort for StateFileDevice {
    fn state(&self, entity: &str) -> Option<String> {
        self.inner.state(entity)
    }

    fn call_service(&mut self, call: &ServiceCall) -> Result<(), DeviceError> {
        self.dirty = true;
        self.inner.call_service(call)
    }

    fn set_state(&mut self, entity: &str, state: &str) -> Result<(), DeviceError> {
        self.dirty = true;
        self.inner.set_state(entity, state)
    }
}
