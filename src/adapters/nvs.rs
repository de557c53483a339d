//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`], [`ConfigPort`], and [`CredentialStore`] for
//! the FloraNode system.
//!
//! - Config validation: fields are range-checked before persistence.
//! - Namespace isolation: the system config lives in `floranode`, the
//!   credential set in `cfg`.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit(); the
//!   in-memory simulation achieves the same trivially.
//! - The credential set is written only by the connectivity service, and
//!   only after the corresponding association was validated as reachable.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort, CredentialStore, StoragePort};
use crate::config::SystemConfig;
use crate::conn::credentials::{
    CredentialBundle, CRED_NAMESPACE, KEY_ACCESS_TOKEN, KEY_NETWORK_ID, KEY_SECRET,
    KEY_TIMEOUT_OVERRIDE,
};
use crate::error::StorageError;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "floranode";
const CONFIG_KEY: &str = "syscfg";

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsStore {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
    #[cfg(not(target_os = "espidf"))]
    fail_writes: core::cell::Cell<bool>,
}

impl NvsStore {
    /// Create a new NvsStore and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
            #[cfg(not(target_os = "espidf"))]
            fail_writes: core::cell::Cell::new(false),
        })
    }

    /// Simulation hook: make every subsequent write fail with `IoError`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    fn read_string<const N: usize>(&self, key: &str) -> Option<heapless::String<N>> {
        let mut buf = [0u8; 128];
        let len = self.read(CRED_NAMESPACE, key, &mut buf).ok()?;
        let s = core::str::from_utf8(&buf[..len]).ok()?;
        if s.is_empty() && key != KEY_SECRET {
            return None;
        }
        let mut out = heapless::String::new();
        out.push_str(s).ok()?;
        Some(out)
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(100..=60_000).contains(&cfg.sample_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "sample_interval_ms must be 100–60000",
        ));
    }
    if cfg.short_window_ms < cfg.sample_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "short_window_ms must cover at least one sample interval",
        ));
    }
    if !(60..=604_800).contains(&cfg.long_window_secs) {
        return Err(ConfigError::ValidationFailed(
            "long_window_secs must be 60–604800",
        ));
    }
    if !(1..=3600).contains(&cfg.connect_timeout_ticks) {
        return Err(ConfigError::ValidationFailed(
            "connect_timeout_ticks must be 1–3600",
        ));
    }
    if !(10..=3600).contains(&cfg.provisioning_window_secs) {
        return Err(ConfigError::ValidationFailed(
            "provisioning_window_secs must be 10–3600",
        ));
    }
    if cfg.pump_flow_ml_per_min == 0 {
        return Err(ConfigError::ValidationFailed(
            "pump_flow_ml_per_min must be positive",
        ));
    }
    if !(1..=600).contains(&cfg.max_watering_secs) {
        return Err(ConfigError::ValidationFailed(
            "max_watering_secs must be 1–600",
        ));
    }
    if cfg.soil_wet_raw >= cfg.soil_dry_raw {
        return Err(ConfigError::ValidationFailed(
            "soil_wet_raw must be below soil_dry_raw",
        ));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ConfigPort
// ───────────────────────────────────────────────────────────────

impl ConfigPort for NvsStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg: SystemConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsStore: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsStore: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
                let key_cstr = b"syscfg\0";
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }

                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsStore: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NvsStore: no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    warn!("NvsStore: NVS read error {}, using defaults", e);
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;

        #[cfg(not(target_os = "espidf"))]
        {
            if self.fail_writes.get() {
                return Err(ConfigError::IoError);
            }
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsStore: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                let key_cstr = b"syscfg\0";
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsStore: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsStore: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// StoragePort
// ───────────────────────────────────────────────────────────────

impl StoragePort for NvsStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut key_buf = [0u8; 16];
                let kb = key.as_bytes();
                let kl = kb.len().min(15);
                key_buf[..kl].copy_from_slice(&kb[..kl]);

                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            if self.fail_writes.get() {
                return Err(StorageError::IoError);
            }
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let mut key_buf = [0u8; 16];
                let kb = key.as_bytes();
                let kl = kb.len().min(15);
                key_buf[..kl].copy_from_slice(&kb[..kl]);

                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let mut key_buf = [0u8; 16];
                let kb = key.as_bytes();
                let kl = kb.len().min(15);
                key_buf[..kl].copy_from_slice(&kb[..kl]);

                let ret = unsafe { nvs_erase_key(handle, key_buf.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut key_buf = [0u8; 16];
                let kb = key.as_bytes();
                let kl = kb.len().min(15);
                key_buf[..kl].copy_from_slice(&kb[..kl]);

                let ret = unsafe {
                    nvs_find_key(handle, key_buf.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// CredentialStore
// ───────────────────────────────────────────────────────────────

impl CredentialStore for NvsStore {
    fn load(&self) -> Option<CredentialBundle> {
        let network_id = self.read_string::<32>(KEY_NETWORK_ID)?;
        let secret = self
            .read_string::<64>(KEY_SECRET)
            .unwrap_or_else(heapless::String::new);
        let access_token = self.read_string::<64>(KEY_ACCESS_TOKEN)?;

        let mut timeout_buf = [0u8; 4];
        let timeout_override = match self.read(CRED_NAMESPACE, KEY_TIMEOUT_OVERRIDE, &mut timeout_buf)
        {
            Ok(4) => Some(u32::from_le_bytes(timeout_buf)),
            _ => None,
        };

        Some(CredentialBundle {
            network_id,
            secret,
            access_token,
            timeout_override,
        })
    }

    fn store(&mut self, bundle: &CredentialBundle) -> Result<(), StorageError> {
        self.write(CRED_NAMESPACE, KEY_NETWORK_ID, bundle.network_id.as_bytes())?;
        self.write(CRED_NAMESPACE, KEY_SECRET, bundle.secret.as_bytes())?;
        self.write(
            CRED_NAMESPACE,
            KEY_ACCESS_TOKEN,
            bundle.access_token.as_bytes(),
        )?;
        match bundle.timeout_override {
            Some(ticks) => self.write(
                CRED_NAMESPACE,
                KEY_TIMEOUT_OVERRIDE,
                &ticks.to_le_bytes(),
            )?,
            None => self.delete(CRED_NAMESPACE, KEY_TIMEOUT_OVERRIDE)?,
        }
        info!("NvsStore: credential set persisted");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.delete(CRED_NAMESPACE, KEY_NETWORK_ID)?;
        self.delete(CRED_NAMESPACE, KEY_SECRET)?;
        self.delete(CRED_NAMESPACE, KEY_ACCESS_TOKEN)?;
        self.delete(CRED_NAMESPACE, KEY_TIMEOUT_OVERRIDE)?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
