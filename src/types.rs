use std::fmt;

use secrecy::SecretString;

/// Sentinel some OS layers report while disconnected or still associating.
pub const UNKNOWN_SSID_SENTINEL: &str = "<unknown ssid>";

/// Strip exactly one pair of wrapping double quotes from a raw SSID and map
/// the "no active connection" sentinel to `None`. Some vendors wrap the SSID
/// in literal quotes; nothing beyond the outermost pair is touched.
pub fn normalize_ssid(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    if unquoted == UNKNOWN_SSID_SENTINEL {
        return None;
    }
    Some(unquoted.to_string())
}

/// The network a request targets or the one currently associated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NetworkIdentity {
    pub ssid: String,
    pub bssid: Option<String>,
}

impl NetworkIdentity {
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            bssid: None,
        }
    }

    /// "Did we land on the right network" comparison: case-insensitive on
    /// the SSID, BSSID ignored (roaming between APs of one network is fine).
    pub fn matches_ssid(&self, other: &str) -> bool {
        self.ssid.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ssid)
    }
}

/// A single connection attempt. Request-scoped; nothing is retained after
/// the outcome is delivered.
#[derive(Debug)]
pub struct ConnectionRequest {
    pub identity: NetworkIdentity,
    pub passphrase: Option<SecretString>,
    pub is_wep: bool,
    /// Do not leave a persistent profile behind after this call.
    pub join_once: bool,
}

impl ConnectionRequest {
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            identity: NetworkIdentity::new(ssid),
            passphrase: None,
            is_wep: false,
            join_once: false,
        }
    }

    pub fn with_passphrase(mut self, passphrase: SecretString) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    pub fn wep(mut self, is_wep: bool) -> Self {
        self.is_wep = is_wep;
        self
    }

    pub fn join_once(mut self, join_once: bool) -> Self {
        self.join_once = join_once;
        self
    }
}

/// Read-only environment snapshot taken before every attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreconditionState {
    pub location_permission: bool,
    pub location_services: bool,
    pub radio_enabled: bool,
}

/// Which connection machinery the running platform offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    /// Scoped, non-persistent network requests confirmed by an
    /// availability callback.
    ModernManaged,
    /// Persistent configuration entries plus explicit enable/reconnect.
    Legacy,
}

#[derive(Debug, Clone, Copy)]
pub struct PlatformCapabilities {
    pub tier: CapabilityTier,
    /// Recent OS versions forbid programmatic radio enable; the user has to
    /// flip the toggle themselves.
    pub can_toggle_radio: bool,
}

/// One visible network from a scan pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanResult {
    pub ssid: String,
    pub bssid: String,
    /// Security suite description, e.g. "[WPA2-PSK]".
    pub capabilities: String,
    pub frequency_mhz: u32,
    /// Signal strength, 0-100.
    pub signal_level: u8,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Security type of a network, derived from AP flag words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SecurityType {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
    Wpa2Enterprise,
}

impl SecurityType {
    pub fn from_flags(flags: u32, wpa_flags: u32, rsn_flags: u32) -> Self {
        if rsn_flags != 0 {
            if rsn_flags & 0x200 != 0 {
                return Self::Wpa2Enterprise;
            }
            // SAE
            if rsn_flags & 0x400 != 0 {
                return Self::Wpa3;
            }
            return Self::Wpa2;
        }
        if wpa_flags != 0 {
            if wpa_flags & 0x200 != 0 {
                return Self::Wpa2Enterprise;
            }
            return Self::Wpa;
        }
        // Privacy bit without WPA/RSN means WEP
        if flags & 0x1 != 0 {
            return Self::Wep;
        }
        Self::Open
    }

    /// Render in the bracketed style scan consumers expect.
    pub fn capability_string(&self) -> &'static str {
        match self {
            Self::Open => "[ESS]",
            Self::Wep => "[WEP]",
            Self::Wpa => "[WPA-PSK]",
            Self::Wpa2 => "[WPA2-PSK]",
            Self::Wpa3 => "[WPA3-SAE]",
            Self::Wpa2Enterprise => "[WPA2-EAP]",
        }
    }
}

/// Host settings screens the caller can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SettingKind {
    Wifi,
    Location,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exactly_one_quote_pair() {
        assert_eq!(normalize_ssid("\"HomeNet\""), Some("HomeNet".into()));
        assert_eq!(normalize_ssid("\"\"HomeNet\"\""), Some("\"HomeNet\"".into()));
        assert_eq!(normalize_ssid("HomeNet"), Some("HomeNet".into()));
    }

    #[test]
    fn keeps_interior_quotes() {
        assert_eq!(normalize_ssid("Home\"Net"), Some("Home\"Net".into()));
    }

    #[test]
    fn lone_quote_is_not_a_pair() {
        assert_eq!(normalize_ssid("\""), Some("\"".into()));
        assert_eq!(normalize_ssid("\"\""), Some("".into()));
    }

    #[test]
    fn unknown_sentinel_is_no_identity() {
        assert_eq!(normalize_ssid("<unknown ssid>"), None);
        assert_eq!(normalize_ssid("\"<unknown ssid>\""), None);
        assert_eq!(normalize_ssid("   "), None);
    }

    #[test]
    fn ssid_match_is_case_insensitive() {
        let id = NetworkIdentity::new("HomeNet");
        assert!(id.matches_ssid("homenet"));
        assert!(id.matches_ssid("HOMENET"));
        assert!(!id.matches_ssid("homenet2"));
    }

    #[test]
    fn security_from_flags() {
        assert_eq!(SecurityType::from_flags(0, 0, 0), SecurityType::Open);
        assert_eq!(SecurityType::from_flags(0x1, 0, 0), SecurityType::Wep);
        assert_eq!(SecurityType::from_flags(0x1, 0x100, 0), SecurityType::Wpa);
        assert_eq!(SecurityType::from_flags(0x1, 0, 0x100), SecurityType::Wpa2);
        assert_eq!(SecurityType::from_flags(0x1, 0, 0x400), SecurityType::Wpa3);
        assert_eq!(
            SecurityType::from_flags(0x1, 0, 0x200),
            SecurityType::Wpa2Enterprise
        );
    }
}
