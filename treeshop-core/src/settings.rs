//! Flat key-value persistence for the rate table and business profile.
//!
//! Every value is stored as a string under a fixed key. Keys that are absent
//! or fail to parse fall back to the built-in default for that field.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Error as SerdeError;

use crate::model::{BusinessProfile, PackageTier, RateTable};

const TRANSPORT_RATE_KEY: &str = "transportRate";
const DEBRIS_RATE_KEY: &str = "debrisRate";
const MARKUP_KEY: &str = "markupMultiplier";
const DEPOSIT_KEY: &str = "depositPercentage";
const BUSINESS_NAME_KEY: &str = "businessName";
const BASE_ADDRESS_KEY: &str = "baseLocationAddress";
const BUSINESS_PHONE_KEY: &str = "businessPhone";
const BUSINESS_EMAIL_KEY: &str = "businessEmail";

#[derive(Debug, thiserror::Error)]
/// Errors raised while reading or writing persisted settings.
pub enum SettingsError {
    /// Reading or writing the backing file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The backing file is not a flat JSON object of strings.
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

/// Flat string key-value store holding persisted settings.
pub trait SettingsStore: Send {
    /// Current value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stage `value` under `key`; visible to `get` immediately.
    fn set(&mut self, key: &str, value: String);

    /// Make staged values durable.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when the backing storage cannot be written.
    fn flush(&mut self) -> Result<(), SettingsError>;
}

/// Store kept entirely in memory. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    entries: HashMap<String, String>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn flush(&mut self) -> Result<(), SettingsError> {
        Ok(())
    }
}

/// Store backed by a pretty-printed JSON object on disk.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileSettingsStore {
    /// Open the store at `path`. A missing file starts an empty store.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file yet, using defaults");
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn flush(&mut self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "settings written");
        Ok(())
    }
}

fn rate_key(tier: PackageTier) -> String {
    format!("{}Rate", tier.key())
}

fn debris_yield_key(tier: PackageTier) -> String {
    format!("{}DebrisYield", tier.key())
}

fn read_number(store: &dyn SettingsStore, key: &str, default: f64) -> f64 {
    let Some(raw) = store.get(key) else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(key, raw = %raw, default, "unreadable setting, using default");
            default
        }
    }
}

/// Read the rate table, field by field, falling back to defaults.
#[must_use]
pub fn load_rate_table(store: &dyn SettingsStore) -> RateTable {
    let defaults = RateTable::default();

    let package_rates = PackageTier::ALL
        .into_iter()
        .map(|tier| {
            let rate = read_number(store, &rate_key(tier), defaults.base_rate(tier));
            (tier, rate)
        })
        .collect();
    let debris_yields = PackageTier::MAX
        .into_iter()
        .map(|tier| {
            let yards = read_number(store, &debris_yield_key(tier), defaults.debris_yield(tier));
            (tier, yards)
        })
        .collect();

    RateTable {
        package_rates,
        debris_yields,
        transport_rate_per_hour: read_number(
            store,
            TRANSPORT_RATE_KEY,
            defaults.transport_rate_per_hour,
        ),
        debris_rate_per_yard: read_number(store, DEBRIS_RATE_KEY, defaults.debris_rate_per_yard),
        final_markup_multiplier: read_number(store, MARKUP_KEY, defaults.final_markup_multiplier),
        deposit_fraction: read_number(store, DEPOSIT_KEY, defaults.deposit_fraction),
    }
}

/// Write every rate table field and flush.
///
/// # Errors
///
/// Returns a [`SettingsError`] when the store cannot be flushed.
pub fn save_rate_table(
    store: &mut dyn SettingsStore,
    rates: &RateTable,
) -> Result<(), SettingsError> {
    for tier in PackageTier::ALL {
        store.set(&rate_key(tier), rates.base_rate(tier).to_string());
    }
    for tier in PackageTier::MAX {
        store.set(&debris_yield_key(tier), rates.debris_yield(tier).to_string());
    }
    store.set(TRANSPORT_RATE_KEY, rates.transport_rate_per_hour.to_string());
    store.set(DEBRIS_RATE_KEY, rates.debris_rate_per_yard.to_string());
    store.set(MARKUP_KEY, rates.final_markup_multiplier.to_string());
    store.set(DEPOSIT_KEY, rates.deposit_fraction.to_string());
    store.flush()
}

/// Read the business profile, falling back to defaults per field.
#[must_use]
pub fn load_profile(store: &dyn SettingsStore) -> BusinessProfile {
    let defaults = BusinessProfile::default();
    BusinessProfile {
        name: store.get(BUSINESS_NAME_KEY).unwrap_or(defaults.name),
        base_address: store.get(BASE_ADDRESS_KEY).unwrap_or(defaults.base_address),
        phone: store.get(BUSINESS_PHONE_KEY).unwrap_or(defaults.phone),
        email: store.get(BUSINESS_EMAIL_KEY).unwrap_or(defaults.email),
    }
}

/// Write the business profile and flush.
///
/// # Errors
///
/// Returns a [`SettingsError`] when the store cannot be flushed.
pub fn save_profile(
    store: &mut dyn SettingsStore,
    profile: &BusinessProfile,
) -> Result<(), SettingsError> {
    store.set(BUSINESS_NAME_KEY, profile.name.clone());
    store.set(BASE_ADDRESS_KEY, profile.base_address.clone());
    store.set(BUSINESS_PHONE_KEY, profile.phone.clone());
    store.set(BUSINESS_EMAIL_KEY, profile.email.clone());
    store.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_yields_defaults() {
        let store = MemorySettingsStore::new();
        assert_eq!(load_rate_table(&store), RateTable::default());
        assert_eq!(load_profile(&store), BusinessProfile::default());
    }

    #[test]
    fn saved_rates_load_back() {
        let mut store = MemorySettingsStore::new();
        let mut rates = RateTable::default();
        rates.package_rates.insert(PackageTier::Large, 3600.0);
        rates.debris_yields.insert(PackageTier::MaxMedium, 820.0);
        rates.deposit_fraction = 0.3;

        save_rate_table(&mut store, &rates).expect("memory flush");

        assert_eq!(store.get("largeRate").as_deref(), Some("3600"));
        assert_eq!(store.get("depositPercentage").as_deref(), Some("0.3"));
        assert_eq!(load_rate_table(&store), rates);
    }

    #[test]
    fn unparseable_value_falls_back_per_key() {
        let mut store = MemorySettingsStore::new();
        store.set("smallRate", String::from("lots"));
        store.set("mediumRate", String::from(" 2600 "));
        store.set("transportRate", String::from("NaN"));

        let rates = load_rate_table(&store);
        let defaults = RateTable::default();
        assert!((rates.base_rate(PackageTier::Small) - 2125.0).abs() < f64::EPSILON);
        assert!((rates.base_rate(PackageTier::Medium) - 2600.0).abs() < f64::EPSILON);
        assert!(
            (rates.transport_rate_per_hour - defaults.transport_rate_per_hour).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn profile_fields_load_individually() {
        let mut store = MemorySettingsStore::new();
        store.set("baseLocationAddress", String::from("12 Mill Rd, Portland"));

        let profile = load_profile(&store);
        assert_eq!(profile.name, "TreeShop");
        assert_eq!(profile.base_address, "12 Mill Rd, Portland");
        assert!(profile.phone.is_empty());
    }

    #[test]
    fn json_file_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonFileSettingsStore::open(&path).expect("missing file is fine");
        let profile = BusinessProfile {
            name: String::from("Oak & Ash Clearing"),
            base_address: String::from("4 Depot St, Salem"),
            phone: String::from("555-0100"),
            email: String::from("office@example.com"),
        };
        save_profile(&mut store, &profile).expect("write settings");

        let reopened = JsonFileSettingsStore::open(&path).expect("read settings");
        assert_eq!(load_profile(&reopened), profile);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").expect("write fixture");

        let result = JsonFileSettingsStore::open(&path);
        assert!(matches!(result, Err(SettingsError::Serde(_))));
    }
}
