//! NetworkManager adapter: implements [`WifiBackend`] over the system
//! D-Bus. This is the production backend on Linux hosts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};
use zbus::Connection;

use crate::backend::dbus_proxies::*;
use crate::backend::{JoinSignal, ProfileId, WifiBackend};
use crate::error::{ErrorKind, WifiError, WifiResult};
use crate::mapper::map_native_error;
use crate::profile::{EphemeralSpecifier, KeyManagement, KeyMaterial, LegacyProfile};
use crate::types::{
    CapabilityTier, PlatformCapabilities, PreconditionState, ScanResult, SecurityType, SettingKind,
};

// NMDeviceType
const NM_DEVICE_TYPE_WIFI: u32 = 2;
// NMDeviceState
const NM_DEVICE_STATE_FAILED: u32 = 120;
// NMActiveConnectionState
const NM_ACTIVE_STATE_ACTIVATED: u32 = 2;
const NM_ACTIVE_STATE_DEACTIVATED: u32 = 4;

const PERMISSION_NETWORK_CONTROL: &str = "org.freedesktop.NetworkManager.network-control";

/// NetworkManager gained ephemeral-style activation handling in 1.16;
/// older daemons only get the persistent add/activate path.
const MODERN_TIER_MIN_VERSION: (u32, u32) = (1, 16);

/// How long a scan pass waits for fresh results before reading the AP list.
const SCAN_SETTLE: Duration = Duration::from_millis(1500);

pub struct NetworkManagerBackend {
    connection: Connection,
    capabilities: PlatformCapabilities,
    /// Profiles registered through this backend, indexed by [`ProfileId`].
    registered: Mutex<Vec<OwnedObjectPath>>,
}

impl NetworkManagerBackend {
    /// Connect to the system bus and probe the daemon's capability tier.
    pub async fn new() -> WifiResult<Self> {
        let connection = Connection::system().await?;
        let proxy = NetworkManagerProxy::new(&connection).await?;
        let version = proxy.version().await?;
        let tier = tier_for_version(&version);
        info!("NetworkManager v{version}, capability tier {tier:?}");
        Ok(Self {
            connection,
            capabilities: PlatformCapabilities {
                tier,
                can_toggle_radio: true,
            },
            registered: Mutex::new(Vec::new()),
        })
    }

    /// Find the first wireless device path.
    async fn wifi_device(&self) -> WifiResult<OwnedObjectPath> {
        let nm_proxy = NetworkManagerProxy::new(&self.connection).await?;
        for path in nm_proxy.get_devices().await? {
            let dev_proxy = DeviceProxy::builder(&self.connection)
                .path(path.clone())?
                .build()
                .await?;
            if dev_proxy.device_type().await.unwrap_or(0) == NM_DEVICE_TYPE_WIFI {
                return Ok(path);
            }
        }
        Err(WifiError::new(
            ErrorKind::UnavailableForOsVersion,
            "No wireless device managed by NetworkManager",
        ))
    }

    async fn active_access_point(&self) -> WifiResult<Option<OwnedObjectPath>> {
        let device = self.wifi_device().await?;
        let wireless = WirelessProxy::builder(&self.connection)
            .path(device)?
            .build()
            .await?;
        Ok(wireless.active_access_point().await.ok().and_then(|p| {
            if p.as_str() == "/" {
                None
            } else {
                Some(p)
            }
        }))
    }

    /// Await the one-shot resolution of a freshly activated connection.
    /// The signal stream subscription is dropped (and thus unregistered)
    /// when this returns, whichever way it resolves.
    async fn await_activation(&self, active_path: &OwnedObjectPath) -> WifiResult<JoinSignal> {
        let proxy = ActiveConnectionProxy::builder(&self.connection)
            .path(active_path.clone())?
            .build()
            .await?;

        let mut stream = proxy.receive_state_changed().await?;

        // The activation may already have resolved before the subscription
        // landed; check the current state once to avoid waiting forever.
        match proxy.state().await.unwrap_or(0) {
            NM_ACTIVE_STATE_ACTIVATED => return Ok(JoinSignal::Available),
            NM_ACTIVE_STATE_DEACTIVATED => return Ok(JoinSignal::Unavailable),
            _ => {}
        }

        while let Some(signal) = stream.next().await {
            let args = signal.args()?;
            let (state, reason) = (*args.state(), *args.reason());
            debug!("activation state {state} (reason {reason})");
            match state {
                NM_ACTIVE_STATE_ACTIVATED => return Ok(JoinSignal::Available),
                NM_ACTIVE_STATE_DEACTIVATED => {
                    // A reason the table classifies beyond the catch-all is
                    // worth more to the caller than a bare "unavailable".
                    let kind = map_native_error(reason);
                    if kind != ErrorKind::UnableToConnect {
                        return Err(WifiError::new(
                            kind,
                            format!("Activation failed (native reason {reason})"),
                        ));
                    }
                    return Ok(JoinSignal::Unavailable);
                }
                _ => {}
            }
        }

        // Object vanished mid-activation; NM tore the attempt down.
        Ok(JoinSignal::Unavailable)
    }

    /// Find a saved wireless profile whose SSID matches.
    async fn find_profile_by_ssid(&self, ssid: &str) -> WifiResult<Option<OwnedObjectPath>> {
        let settings_proxy = SettingsProxy::new(&self.connection).await?;
        for conn_path in settings_proxy.list_connections().await? {
            let conn_proxy = ConnectionSettingsProxy::builder(&self.connection)
                .path(conn_path.clone())?
                .build()
                .await?;
            let Ok(settings) = conn_proxy.get_settings().await else {
                continue;
            };
            if let Some(conn) = settings.get("connection") {
                let conn_type = conn.get("type").and_then(ov_to_string);
                if conn_type.as_deref() != Some("802-11-wireless") {
                    continue;
                }
            }
            if let Some(wifi) = settings.get("802-11-wireless") {
                if let Some(bytes) = wifi.get("ssid").and_then(ov_to_bytes) {
                    if String::from_utf8_lossy(&bytes) == ssid {
                        return Ok(Some(conn_path));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn access_point_result(&self, path: &OwnedObjectPath) -> WifiResult<ScanResult> {
        let proxy = AccessPointProxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await?;

        let ssid_bytes = proxy.ssid().await?;
        let ssid = String::from_utf8_lossy(&ssid_bytes).to_string();
        let bssid = proxy.hw_address().await.unwrap_or_default();
        let frequency = proxy.frequency().await.unwrap_or(0);
        let strength = proxy.strength().await.unwrap_or(0);
        let flags = proxy.flags().await.unwrap_or(0);
        let wpa_flags = proxy.wpa_flags().await.unwrap_or(0);
        let rsn_flags = proxy.rsn_flags().await.unwrap_or(0);

        Ok(ScanResult {
            ssid,
            bssid,
            capabilities: SecurityType::from_flags(flags, wpa_flags, rsn_flags)
                .capability_string()
                .to_string(),
            frequency_mhz: frequency,
            signal_level: strength,
            timestamp: Some(chrono::Utc::now()),
        })
    }
}

#[async_trait]
impl WifiBackend for NetworkManagerBackend {
    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    async fn preconditions(&self) -> WifiResult<PreconditionState> {
        let proxy = NetworkManagerProxy::new(&self.connection).await?;
        // NetworkManager's polkit gate plays the role the mobile platforms
        // give to the location permission: without network-control the
        // daemon refuses joins and hides association details.
        let permissions = proxy.get_permissions().await.unwrap_or_default();
        let location_permission = permissions
            .get(PERMISSION_NETWORK_CONTROL)
            .map(|v| v == "yes")
            .unwrap_or(false);
        let location_services = proxy.networking_enabled().await.unwrap_or(false);
        let radio_enabled = proxy.wireless_enabled().await.unwrap_or(false);
        Ok(PreconditionState {
            location_permission,
            location_services,
            radio_enabled,
        })
    }

    async fn current_ssid(&self) -> WifiResult<Option<String>> {
        let Some(ap_path) = self.active_access_point().await? else {
            return Ok(None);
        };
        let proxy = AccessPointProxy::builder(&self.connection)
            .path(ap_path)?
            .build()
            .await?;
        let bytes = proxy.ssid().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&bytes).to_string()))
    }

    async fn request_ephemeral_network(
        &self,
        spec: &EphemeralSpecifier,
    ) -> WifiResult<JoinSignal> {
        let device = self.wifi_device().await?;
        let nm_proxy = NetworkManagerProxy::new(&self.connection).await?;

        let settings = ephemeral_settings(spec);
        let root: OwnedObjectPath = ObjectPath::try_from("/")
            .map_err(zbus::Error::from)?
            .into();
        let (_settings_path, active_path) = nm_proxy
            .add_and_activate_connection(settings, &device.as_ref(), &root.as_ref())
            .await?;
        debug!("ephemeral activation started: {active_path}");

        self.await_activation(&active_path).await
    }

    async fn register_profile(&self, profile: &LegacyProfile) -> WifiResult<ProfileId> {
        let settings_proxy = SettingsProxy::new(&self.connection).await?;
        let path = settings_proxy
            .add_connection(persistent_settings(profile))
            .await?;
        info!("registered profile for '{}': {path}", profile.ssid);

        let mut registered = self
            .registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registered.push(path);
        Ok(ProfileId((registered.len() - 1) as i32))
    }

    async fn enable_profile(&self, id: ProfileId) -> WifiResult<()> {
        let path = {
            let registered = self
                .registered
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            registered.get(id.0 as usize).cloned()
        }
        .ok_or_else(|| WifiError::unable_to_connect("Unknown profile id"))?;

        let device = self.wifi_device().await?;
        let nm_proxy = NetworkManagerProxy::new(&self.connection).await?;
        let root: OwnedObjectPath = ObjectPath::try_from("/")
            .map_err(zbus::Error::from)?
            .into();
        nm_proxy
            .activate_connection(&path.as_ref(), &device.as_ref(), &root.as_ref())
            .await?;
        Ok(())
    }

    async fn reconnect(&self) -> WifiResult<()> {
        // NetworkManager drives the supplicant itself once an activation is
        // queued; the only thing to report here is a device already parked
        // in the failed state.
        let device = self.wifi_device().await?;
        let dev_proxy = DeviceProxy::builder(&self.connection)
            .path(device)?
            .build()
            .await?;
        if dev_proxy.state().await.unwrap_or(0) == NM_DEVICE_STATE_FAILED {
            return Err(WifiError::unable_to_connect(
                "Wireless device is in the failed state",
            ));
        }
        Ok(())
    }

    async fn remove_profile(&self, ssid: &str) -> WifiResult<()> {
        let Some(path) = self.find_profile_by_ssid(ssid).await? else {
            return Ok(());
        };
        let proxy = ConnectionSettingsProxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await?;
        proxy.delete().await?;
        info!("removed profile for '{ssid}': {path}");
        Ok(())
    }

    async fn scan(&self) -> WifiResult<Vec<ScanResult>> {
        let device = self.wifi_device().await?;
        let wireless = WirelessProxy::builder(&self.connection)
            .path(device)?
            .build()
            .await?;

        // RequestScan is rate limited; a refusal just means results are
        // recent enough already.
        if let Err(e) = wireless.request_scan(HashMap::new()).await {
            debug!("scan request refused: {e}");
        } else {
            tokio::time::sleep(SCAN_SETTLE).await;
        }

        let mut results = Vec::new();
        for ap_path in wireless.get_all_access_points().await? {
            match self.access_point_result(&ap_path).await {
                Ok(r) if !r.ssid.is_empty() => results.push(r),
                Ok(_) => {} // hidden network
                Err(e) => debug!("skipping AP {ap_path}: {e}"),
            }
        }

        // Strongest first, one entry per SSID
        results.sort_by(|a, b| b.signal_level.cmp(&a.signal_level));
        let mut seen = std::collections::HashSet::new();
        results.retain(|r| seen.insert(r.ssid.clone()));

        Ok(results)
    }

    async fn is_radio_enabled(&self) -> WifiResult<bool> {
        let proxy = NetworkManagerProxy::new(&self.connection).await?;
        Ok(proxy.wireless_enabled().await?)
    }

    async fn set_radio_enabled(&self, enabled: bool) -> WifiResult<()> {
        let proxy = NetworkManagerProxy::new(&self.connection).await?;
        proxy.set_wireless_enabled(enabled).await.map_err(|e| {
            WifiError::new(
                ErrorKind::CouldNotEnableRadio,
                format!("Could not switch the wireless radio: {e}"),
            )
        })
    }

    async fn is_location_service_enabled(&self) -> WifiResult<bool> {
        let proxy = NetworkManagerProxy::new(&self.connection).await?;
        Ok(proxy.networking_enabled().await?)
    }

    async fn signal_strength(&self) -> WifiResult<i32> {
        let Some(ap_path) = self.active_access_point().await? else {
            return Err(WifiError::new(
                ErrorKind::CouldNotDetectSsid,
                "No active association",
            ));
        };
        let proxy = AccessPointProxy::builder(&self.connection)
            .path(ap_path)?
            .build()
            .await?;
        let pct = proxy.strength().await.unwrap_or(0) as i32;
        // NM reports percent; callers expect dBm-style RSSI
        Ok(pct / 2 - 100)
    }

    async fn open_setting(&self, kind: SettingKind) -> WifiResult<()> {
        let (program, args): (&str, &[&str]) = match kind {
            SettingKind::Wifi => ("nm-connection-editor", &[]),
            SettingKind::Location => ("gnome-control-center", &["location"]),
        };
        // Fire and forget: a missing settings tool is logged, not surfaced.
        if let Err(e) = std::process::Command::new(program).args(args).spawn() {
            warn!("could not open settings screen via {program}: {e}");
        }
        Ok(())
    }
}

fn tier_for_version(version: &str) -> CapabilityTier {
    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    if (major, minor) >= MODERN_TIER_MIN_VERSION {
        CapabilityTier::ModernManaged
    } else {
        CapabilityTier::Legacy
    }
}

// ── Settings dict builders ────────────────────────────────────────────

type SettingsDict = HashMap<String, HashMap<String, OwnedValue>>;

fn base_wireless_settings(ssid: &str, autoconnect: bool) -> SettingsDict {
    let mut connection: SettingsDict = HashMap::new();

    let mut conn_settings: HashMap<String, OwnedValue> = HashMap::new();
    conn_settings.insert("id".into(), Value::from(ssid).try_into().unwrap());
    conn_settings.insert(
        "type".into(),
        Value::from("802-11-wireless").try_into().unwrap(),
    );
    conn_settings.insert(
        "autoconnect".into(),
        Value::from(autoconnect).try_into().unwrap(),
    );
    connection.insert("connection".into(), conn_settings);

    let mut wifi_settings: HashMap<String, OwnedValue> = HashMap::new();
    wifi_settings.insert(
        "ssid".into(),
        Value::from(ssid.as_bytes().to_vec()).try_into().unwrap(),
    );
    wifi_settings.insert(
        "mode".into(),
        Value::from("infrastructure").try_into().unwrap(),
    );
    connection.insert("802-11-wireless".into(), wifi_settings);

    let mut ipv4_settings: HashMap<String, OwnedValue> = HashMap::new();
    ipv4_settings.insert("method".into(), Value::from("auto").try_into().unwrap());
    connection.insert("ipv4".into(), ipv4_settings);

    let mut ipv6_settings: HashMap<String, OwnedValue> = HashMap::new();
    ipv6_settings.insert("method".into(), Value::from("auto").try_into().unwrap());
    connection.insert("ipv6".into(), ipv6_settings);

    connection
}

fn attach_security(connection: &mut SettingsDict, key: &KeyMaterial) {
    let mut sec_settings: HashMap<String, OwnedValue> = HashMap::new();
    match key {
        KeyMaterial::None => return,
        KeyMaterial::Passphrase(secret) | KeyMaterial::RawPsk(secret) => {
            sec_settings.insert("key-mgmt".into(), Value::from("wpa-psk").try_into().unwrap());
            sec_settings.insert("psk".into(), Value::from(secret.as_str()).try_into().unwrap());
        }
        KeyMaterial::Wep(secret) => {
            sec_settings.insert("key-mgmt".into(), Value::from("none").try_into().unwrap());
            sec_settings.insert(
                "wep-key0".into(),
                Value::from(secret.as_str()).try_into().unwrap(),
            );
        }
    }
    connection.insert("802-11-wireless-security".into(), sec_settings);
    if let Some(wifi) = connection.get_mut("802-11-wireless") {
        wifi.insert(
            "security".into(),
            Value::from("802-11-wireless-security").try_into().unwrap(),
        );
    }
}

/// Non-persistent request: no autoconnect, removed by NM once it drops.
fn ephemeral_settings(spec: &EphemeralSpecifier) -> SettingsDict {
    let mut connection = base_wireless_settings(&spec.ssid, false);
    attach_security(&mut connection, &spec.key);
    connection
}

/// Persistent profile registration for the legacy path.
fn persistent_settings(profile: &LegacyProfile) -> SettingsDict {
    let mut connection = base_wireless_settings(&profile.ssid, true);
    attach_security(&mut connection, &profile.key);
    if profile.key_management == KeyManagement::WpaPsk {
        if let Some(sec) = connection.get_mut("802-11-wireless-security") {
            sec.insert(
                "proto".into(),
                Value::from(
                    profile
                        .protocols
                        .iter()
                        .map(|p| p.to_lowercase())
                        .collect::<Vec<_>>(),
                )
                .try_into()
                .unwrap(),
            );
            sec.insert(
                "group".into(),
                Value::from(
                    profile
                        .group_ciphers
                        .iter()
                        .map(|c| c.to_lowercase())
                        .collect::<Vec<_>>(),
                )
                .try_into()
                .unwrap(),
            );
            sec.insert(
                "pairwise".into(),
                Value::from(
                    profile
                        .pairwise_ciphers
                        .iter()
                        .map(|c| c.to_lowercase())
                        .collect::<Vec<_>>(),
                )
                .try_into()
                .unwrap(),
            );
        }
    }
    connection
}

// ── Safe OwnedValue extraction via pattern matching ───────────────────

fn ov_to_string(v: &OwnedValue) -> Option<String> {
    match &**v {
        Value::Str(s) => Some(s.to_string()),
        _ => None,
    }
}

fn ov_to_bytes(v: &OwnedValue) -> Option<Vec<u8>> {
    match &**v {
        Value::Array(arr) => {
            let mut bytes = Vec::new();
            for item in arr.iter() {
                match item {
                    Value::U8(b) => bytes.push(*b),
                    _ => return None,
                }
            }
            Some(bytes)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_below_threshold_is_legacy() {
        assert_eq!(tier_for_version("1.10.6"), CapabilityTier::Legacy);
        assert_eq!(tier_for_version("0.9"), CapabilityTier::Legacy);
        assert_eq!(tier_for_version("garbage"), CapabilityTier::Legacy);
    }

    #[test]
    fn version_at_or_above_threshold_is_modern() {
        assert_eq!(tier_for_version("1.16.0"), CapabilityTier::ModernManaged);
        assert_eq!(tier_for_version("1.44.2"), CapabilityTier::ModernManaged);
        assert_eq!(tier_for_version("2.0"), CapabilityTier::ModernManaged);
    }

    #[test]
    fn ephemeral_settings_omit_security_for_open_networks() {
        let spec = EphemeralSpecifier {
            ssid: "CafeWifi".into(),
            key: KeyMaterial::None,
        };
        let dict = ephemeral_settings(&spec);
        assert!(dict.contains_key("802-11-wireless"));
        assert!(!dict.contains_key("802-11-wireless-security"));
    }

    #[test]
    fn ephemeral_settings_carry_psk() {
        let spec = EphemeralSpecifier {
            ssid: "HomeNet".into(),
            key: KeyMaterial::Passphrase("hunter2".into()),
        };
        let dict = ephemeral_settings(&spec);
        let sec = dict.get("802-11-wireless-security").unwrap();
        assert!(sec.contains_key("psk"));
    }

    #[test]
    fn persistent_settings_carry_cipher_suites() {
        use crate::types::ConnectionRequest;
        let req = ConnectionRequest::new("HomeNet")
            .with_passphrase(secrecy::SecretString::from("hunter2"));
        let profile = LegacyProfile::build(&req);
        let dict = persistent_settings(&profile);
        let sec = dict.get("802-11-wireless-security").unwrap();
        assert!(sec.contains_key("proto"));
        assert!(sec.contains_key("group"));
        assert!(sec.contains_key("pairwise"));
    }
}
