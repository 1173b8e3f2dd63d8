//! The seam between the cross-platform core and the native Wi-Fi subsystem.
//! Production code talks to NetworkManager; tests substitute a fake.

pub mod dbus_proxies;
pub mod nm;

use async_trait::async_trait;

use crate::error::WifiResult;
use crate::profile::{EphemeralSpecifier, LegacyProfile};
use crate::types::{PlatformCapabilities, PreconditionState, ScanResult, SettingKind};

/// Terminal signal from a scoped network request on the modern tier. Each
/// request resolves exactly once; implementations deliver it through a
/// single-shot completion, never by polling a shared flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSignal {
    /// The OS accepted the request and brought the network up.
    Available,
    /// The OS rejected the request, typically because the user cancelled
    /// the consent dialog.
    Unavailable,
    /// The network came up and then immediately went away again.
    Lost,
}

/// Handle for a registered legacy configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileId(pub i32);

/// Native Wi-Fi operations as a platform adapter must provide them. All
/// methods are request-scoped; no implementation may cache association
/// state between calls.
#[async_trait]
pub trait WifiBackend: Send + Sync {
    /// Which connection machinery this platform offers. Read once per
    /// attempt, at dispatch time.
    fn capabilities(&self) -> PlatformCapabilities;

    /// Pure read of the environment gates. No side effects.
    async fn preconditions(&self) -> WifiResult<PreconditionState>;

    /// The raw SSID of the currently-associated network, exactly as the OS
    /// reports it (quotes and sentinel values included). `None` when the OS
    /// has nothing to report at all.
    async fn current_ssid(&self) -> WifiResult<Option<String>>;

    /// Modern tier: submit a scoped, non-persistent join request and wait
    /// for its one-shot resolution.
    async fn request_ephemeral_network(&self, spec: &EphemeralSpecifier)
        -> WifiResult<JoinSignal>;

    /// Legacy tier, step 1: register a persistent configuration entry.
    async fn register_profile(&self, profile: &LegacyProfile) -> WifiResult<ProfileId>;

    /// Legacy tier, step 2: enable the registered entry.
    async fn enable_profile(&self, id: ProfileId) -> WifiResult<()>;

    /// Legacy tier, step 3: ask the supplicant to reconnect.
    async fn reconnect(&self) -> WifiResult<()>;

    /// Remove a registered profile again (join-once cleanup).
    async fn remove_profile(&self, ssid: &str) -> WifiResult<()>;

    async fn scan(&self) -> WifiResult<Vec<ScanResult>>;

    async fn is_radio_enabled(&self) -> WifiResult<bool>;

    async fn set_radio_enabled(&self, enabled: bool) -> WifiResult<()>;

    async fn is_location_service_enabled(&self) -> WifiResult<bool>;

    /// Signal strength of the current association in dBm.
    async fn signal_strength(&self) -> WifiResult<i32>;

    /// Send the user to a host settings screen. Fire and forget.
    async fn open_setting(&self, kind: SettingKind) -> WifiResult<()>;
}
