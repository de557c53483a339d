//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to              |
//! |------------|------------------|--------------------------|
//! | `ble`      | ProvisioningPort | NimBLE GATT server       |
//! | `log_sink` | EventSink        | Serial log output        |
//! | `nvs`      | ConfigPort       | NVS / in-memory store    |
//! |            | StoragePort      |                          |
//! |            | CredentialStore  |                          |
//! | `time`     | —                | ESP32 system timer       |
//! | `wifi`     | LinkPort         | ESP-IDF WiFi STA         |

pub mod ble;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
