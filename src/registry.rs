use crate::error::{KeylightError, Result};
use crate::types::{DeviceAddress, DeviceRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable registry of known Key Light devices
///
/// The registry owns the authoritative mapping from device address to
/// [`DeviceRecord`], backed by a JSON store on disk. Every mutation writes
/// the store before the in-memory map is updated, so a failed write never
/// leaves the two diverged. Mutations are serialized by a single lock that
/// spans the read-modify-write and the store write.
///
/// # Example
///
/// ```no_run
/// use keylight_control::LightRegistry;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = LightRegistry::load("lights.json")?;
///     registry.add("192.168.1.40", "Desk Light", false)?;
///     for record in registry.list() {
///         println!("{} ({})", record.display_name, record.address);
///     }
///     Ok(())
/// }
/// ```
pub struct LightRegistry {
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    path: PathBuf,
    devices: BTreeMap<DeviceAddress, DeviceRecord>,
}

/// Stored shape of one registry entry, keyed by address in the store file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDevice {
    display_name: String,
    keep_awake_enabled: bool,
}

impl LightRegistry {
    /// Load the registry from the store at `path`
    ///
    /// An absent store is initialized empty on disk; a store that cannot be
    /// parsed at all degrades to an empty registry with a warning. A single
    /// malformed record is logged and skipped without discarding the rest.
    /// Only failure to read an existing store, or to initialize an empty
    /// one, is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let devices = match fs::read_to_string(&path) {
            Ok(contents) => parse_store(&path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No registry store at {}, starting empty", path.display());
                write_store(&path, &BTreeMap::new())?;
                BTreeMap::new()
            }
            Err(e) => return Err(KeylightError::persistence("read the registry store", e)),
        };

        tracing::info!(
            "Loaded {} device(s) from {}",
            devices.len(),
            path.display()
        );

        Ok(Self {
            inner: Mutex::new(RegistryInner { path, devices }),
        })
    }

    /// Add or replace the record for `address`
    ///
    /// Upsert semantics: re-adding an existing address replaces its record,
    /// which is how renames and keep-awake flag changes are expressed. The
    /// store is written before the in-memory map changes; on write failure
    /// the prior state stays in effect and the error is returned.
    pub fn add(&self, address: &str, display_name: &str, keep_awake: bool) -> Result<()> {
        if address.trim().is_empty() {
            return Err(KeylightError::Validation(
                "device address must not be empty".to_string(),
            ));
        }

        let mut inner = self.inner.lock().unwrap();

        let mut updated = inner.devices.clone();
        updated.insert(
            address.to_string(),
            DeviceRecord {
                address: address.to_string(),
                display_name: display_name.to_string(),
                keep_awake,
            },
        );

        write_store(&inner.path, &updated)?;
        inner.devices = updated;
        Ok(())
    }

    /// Remove the record for `address`, if present
    ///
    /// Removing an unknown address is a no-op. Any live keep-awake task for
    /// the address is stopped by the scheduler's next reconciliation; see
    /// [`crate::KeepAwakeScheduler::remove`] for the combined operation.
    pub fn remove(&self, address: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.devices.contains_key(address) {
            return Ok(());
        }

        let mut updated = inner.devices.clone();
        updated.remove(address);

        write_store(&inner.path, &updated)?;
        inner.devices = updated;
        Ok(())
    }

    /// Look up the record for `address`
    pub fn get(&self, address: &str) -> Option<DeviceRecord> {
        let inner = self.inner.lock().unwrap();
        inner.devices.get(address).cloned()
    }

    /// Get a snapshot of all records, ordered by address
    pub fn list(&self) -> Vec<DeviceRecord> {
        let inner = self.inner.lock().unwrap();
        inner.devices.values().cloned().collect()
    }

    /// Get the number of known devices
    pub fn count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.devices.len()
    }
}

fn parse_store(path: &Path, contents: &str) -> BTreeMap<DeviceAddress, DeviceRecord> {
    if contents.trim().is_empty() {
        return BTreeMap::new();
    }

    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(contents) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                "Registry store {} is unreadable ({}), starting empty",
                path.display(),
                e
            );
            return BTreeMap::new();
        }
    };

    let mut devices = BTreeMap::new();
    for (address, value) in raw {
        if address.trim().is_empty() {
            tracing::warn!("Skipping registry entry with empty address");
            continue;
        }
        match serde_json::from_value::<StoredDevice>(value) {
            Ok(stored) => {
                devices.insert(
                    address.clone(),
                    DeviceRecord {
                        address,
                        display_name: stored.display_name,
                        keep_awake: stored.keep_awake_enabled,
                    },
                );
            }
            Err(e) => {
                tracing::warn!("Skipping malformed registry entry for {}: {}", address, e);
            }
        }
    }
    devices
}

fn write_store(path: &Path, devices: &BTreeMap<DeviceAddress, DeviceRecord>) -> Result<()> {
    let stored: BTreeMap<&DeviceAddress, StoredDevice> = devices
        .iter()
        .map(|(address, record)| {
            (
                address,
                StoredDevice {
                    display_name: record.display_name.clone(),
                    keep_awake_enabled: record.keep_awake,
                },
            )
        })
        .collect();

    let contents = serde_json::to_string_pretty(&stored)
        .map_err(|e| KeylightError::persistence("encode the registry store", std::io::Error::other(e)))?;

    fs::write(path, contents)
        .map_err(|e| KeylightError::persistence("write the registry store", e))
}
