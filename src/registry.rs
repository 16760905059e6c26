//! Device records, the device registry, and calibration storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::DeviceClass;
use crate::errors::Error;
use crate::types::Calibration;

type Result<T> = std::result::Result<T, Error>;

/// Identity and capability snapshot of one classified device.
///
/// `id` and `class` are fixed at construction. Rediscovery refreshes the
/// address and calibration only.
///
/// # Example
///
/// ```
/// use esphome_lights_rs::{Calibration, DeviceClass, DeviceRecord};
///
/// let mut record = DeviceRecord::new(
///     "a4cf12b3c4d5e6f7",
///     "192.168.1.40",
///     DeviceClass::Rgbw,
///     "",
///     Calibration::default(),
/// );
/// assert_eq!(record.name(), "ESPHome id c4d5e6f7");
///
/// record.refresh("192.168.1.41", Calibration::new(5, 10));
/// assert_eq!(record.address(), "192.168.1.41");
/// assert_eq!(record.class(), DeviceClass::Rgbw);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeviceRecord {
    id: String,
    address: String,
    class: DeviceClass,
    name: String,
    calibration: Calibration,
}

impl DeviceRecord {
    const NAME_SUFFIX_LEN: usize = 8;

    /// Create a record; an empty `name` falls back to one derived from `id`.
    pub fn new(
        id: &str,
        address: &str,
        class: DeviceClass,
        name: &str,
        calibration: Calibration,
    ) -> Self {
        let name = if name.is_empty() {
            Self::default_name(id)
        } else {
            name.to_string()
        };
        DeviceRecord {
            id: id.to_string(),
            address: address.to_string(),
            class,
            name,
            calibration,
        }
    }

    fn default_name(id: &str) -> String {
        let start = id
            .char_indices()
            .rev()
            .nth(Self::NAME_SUFFIX_LEN - 1)
            .map_or(0, |(i, _)| i);
        format!("{} id {}", DeviceClass::MANUFACTURER, &id[start..])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Rename the device; an empty name restores the derived default.
    pub fn set_name(&mut self, name: &str) {
        self.name = if name.is_empty() {
            Self::default_name(&self.id)
        } else {
            name.to_string()
        };
    }

    /// Update the fields a discovery pass may change.
    pub fn refresh(&mut self, address: &str, calibration: Calibration) {
        self.address = address.to_string();
        self.calibration = calibration;
    }
}

/// Storage for device records, keyed by device id.
pub trait DeviceRegistry {
    fn get(&self, id: &str) -> Option<&DeviceRecord>;

    /// Insert or replace the record stored under `record.id()`.
    fn insert(&mut self, record: DeviceRecord);

    fn records(&self) -> Vec<&DeviceRecord>;
}

/// Per-device brightness calibration, keyed by device id.
pub trait CalibrationStore {
    /// Calibration for `id`; zero offsets when nothing is stored.
    fn calibration(&self, id: &str) -> Calibration;

    fn set_calibration(&mut self, id: &str, calibration: Calibration);
}

impl CalibrationStore for HashMap<String, Calibration> {
    fn calibration(&self, id: &str) -> Calibration {
        self.get(id).copied().unwrap_or_default()
    }

    fn set_calibration(&mut self, id: &str, calibration: Calibration) {
        self.insert(id.to_string(), calibration);
    }
}

/// An in-memory registry that can be persisted as JSON.
///
/// Calibration is stored on the records themselves, so the registry is
/// also the calibration store.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MemoryRegistry {
    devices: HashMap<String, DeviceRecord>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::JsonLoad)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::JsonLoad)
    }

    /// Look up a device by id, failing if it is unknown.
    pub fn require(&self, id: &str) -> Result<&DeviceRecord> {
        self.devices
            .get(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<()> {
        let record = self
            .devices
            .get_mut(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))?;
        record.set_name(name);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<DeviceRecord> {
        self.devices
            .remove(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn get(&self, id: &str) -> Option<&DeviceRecord> {
        self.devices.get(id)
    }

    fn insert(&mut self, record: DeviceRecord) {
        self.devices.insert(record.id.clone(), record);
    }

    fn records(&self) -> Vec<&DeviceRecord> {
        let mut records: Vec<_> = self.devices.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

impl CalibrationStore for MemoryRegistry {
    fn calibration(&self, id: &str) -> Calibration {
        self.devices
            .get(id)
            .map(DeviceRecord::calibration)
            .unwrap_or_default()
    }

    /// Unknown ids are ignored; calibration only exists for registered devices.
    fn set_calibration(&mut self, id: &str, calibration: Calibration) {
        if let Some(record) = self.devices.get_mut(id) {
            record.calibration = calibration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, class: DeviceClass) -> DeviceRecord {
        DeviceRecord::new(id, "10.0.0.9", class, "Desk", Calibration::new(3, 7))
    }

    #[test]
    fn test_default_name_uses_id_suffix() {
        let r = DeviceRecord::new(
            "aabbccddeeff",
            "10.0.0.9",
            DeviceClass::Toggle,
            "",
            Calibration::default(),
        );
        assert_eq!(r.name(), "ESPHome id ccddeeff");

        let short = DeviceRecord::new("abc", "10.0.0.9", DeviceClass::Toggle, "", Calibration::default());
        assert_eq!(short.name(), "ESPHome id abc");
    }

    #[test]
    fn test_set_name() {
        let mut r = record("aabbccddeeff", DeviceClass::Dimmable);
        r.set_name("Hallway");
        assert_eq!(r.name(), "Hallway");
        r.set_name("");
        assert_eq!(r.name(), "ESPHome id ccddeeff");
    }

    #[test]
    fn test_calibration_store_defaults_to_zero() {
        let registry = MemoryRegistry::new();
        assert_eq!(registry.calibration("missing"), Calibration::default());

        let mut map: HashMap<String, Calibration> = HashMap::new();
        assert_eq!(map.calibration("x"), Calibration::default());
        map.set_calibration("x", Calibration::new(1, 2));
        assert_eq!(map.calibration("x"), Calibration::new(1, 2));
    }

    #[test]
    fn test_registry_calibration_lives_on_record() {
        let mut registry = MemoryRegistry::new();
        registry.insert(record("aa", DeviceClass::Rgb));
        assert_eq!(registry.calibration("aa"), Calibration::new(3, 7));

        registry.set_calibration("aa", Calibration::new(9, 9));
        assert_eq!(registry.get("aa").unwrap().calibration(), Calibration::new(9, 9));

        registry.set_calibration("bb", Calibration::new(1, 1));
        assert!(registry.get("bb").is_none());
    }

    #[test]
    fn test_registry_round_trips_through_json() {
        let mut registry = MemoryRegistry::new();
        registry.insert(record("aa", DeviceClass::Rgbw));
        registry.insert(record("bb", DeviceClass::ColorTemp));

        let restored = MemoryRegistry::from_json(&registry.to_json().unwrap()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get("bb").unwrap().class(), DeviceClass::ColorTemp);
    }

    #[test]
    fn test_missing_device() {
        let mut registry = MemoryRegistry::new();
        assert_eq!(
            registry.require("nope").unwrap_err(),
            Error::DeviceNotFound("nope".into())
        );
        assert!(registry.rename("nope", "x").is_err());
        assert!(registry.remove("nope").is_err());
    }

    #[test]
    fn test_records_are_sorted() {
        let mut registry = MemoryRegistry::new();
        registry.insert(record("cc", DeviceClass::Toggle));
        registry.insert(record("aa", DeviceClass::Toggle));
        let ids: Vec<_> = registry.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["aa", "cc"]);
    }
}
