//! wifilink — a Wi-Fi connectivity bridge.
//!
//! Native Wi-Fi operations (scan, connect, query the current SSID, toggle
//! the radio) behind a stable async API with a closed error vocabulary.
//! The OS seam is the [`backend::WifiBackend`] trait; a NetworkManager
//! implementation ships for Linux hosts, and the orchestration core is
//! platform-independent and testable against fakes.

pub mod backend;
pub mod config;
pub mod connect;
pub mod error;
pub mod mapper;
pub mod poll;
pub mod profile;
pub mod types;

pub use backend::{JoinSignal, ProfileId, WifiBackend};
pub use config::Config;
pub use connect::Connector;
pub use error::{ErrorKind, WifiError, WifiResult};
pub use types::{
    CapabilityTier, ConnectionRequest, NetworkIdentity, PlatformCapabilities, PreconditionState,
    ScanResult, SettingKind,
};
