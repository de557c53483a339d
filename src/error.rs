#![allow(dead_code)] // Some variants are reserved for typed port returns

//! Unified error types for the FloraNode firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be cheaply passed through the tick loop without allocation.
//!
//! None of these conditions is fatal to the process: sensor errors are
//! absorbed at the sampling layer, connectivity errors resolve through a
//! state transition, and storage errors are surfaced as events.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// Network association failed or the link dropped.
    Link(LinkError),
    /// A credential submission was rejected at the gateway boundary.
    Provisioning(ProvisioningError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Provisioning(e) => write!(f, "provisioning: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver returned no sample (bus timeout, checksum failure, NaN).
    ReadFailed,
    /// Reading sits at an electrical rail — sensor absent or faulted.
    RailValue,
    /// The signal failed its discovery trial read and is excluded for
    /// this boot cycle.
    AbsentAtDiscovery,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::RailValue => write!(f, "reading at rail value"),
            Self::AbsentAtDiscovery => write!(f, "absent at discovery"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No credentials available to start an association attempt.
    NoCredentials,
    /// The attempt counter reached its limit without association.
    AttemptTimeout,
    /// The radio driver rejected the association request.
    BeginFailed,
    /// An established link was explicitly dropped by the access point.
    Disconnected,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no credentials configured"),
            Self::AttemptTimeout => write!(f, "association attempt timed out"),
            Self::BeginFailed => write!(f, "association request rejected"),
            Self::Disconnected => write!(f, "link dropped"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Provisioning errors
// ---------------------------------------------------------------------------

/// Rejection reasons for a credential submission. The submission is refused
/// at the gateway boundary; the connectivity machine never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningError {
    /// Payload is not valid JSON / not valid UTF-8.
    MalformedPayload,
    /// Required `wifi_ssid` field absent.
    MissingNetworkId,
    /// Required `wifi_password` field absent.
    MissingSecret,
    /// Required `api_key` field absent.
    MissingAccessToken,
    /// SSID fails validation (1–32 printable ASCII bytes).
    InvalidNetworkId,
    /// Password fails validation (8–64 bytes for WPA2, or empty for open).
    InvalidSecret,
    /// Access token fails validation (1–64 printable ASCII bytes).
    InvalidAccessToken,
    /// Timeout override outside the accepted range.
    InvalidTimeoutOverride,
    /// Payload exceeds the gateway's maximum write length.
    PayloadTooLong,
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::MissingNetworkId => write!(f, "missing wifi_ssid"),
            Self::MissingSecret => write!(f, "missing wifi_password"),
            Self::MissingAccessToken => write!(f, "missing api_key"),
            Self::InvalidNetworkId => {
                write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)")
            }
            Self::InvalidSecret => {
                write!(f, "password invalid (8-64 bytes for WPA2, or empty for open)")
            }
            Self::InvalidAccessToken => {
                write!(f, "api key invalid (must be 1-64 printable ASCII bytes)")
            }
            Self::InvalidTimeoutOverride => write!(f, "timeout override out of range"),
            Self::PayloadTooLong => write!(f, "payload exceeds maximum length"),
        }
    }
}

impl From<ProvisioningError> for Error {
    fn from(e: ProvisioningError) -> Self {
        Self::Provisioning(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
