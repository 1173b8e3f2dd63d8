//! Builders for the two shapes a join request can take: an ephemeral
//! specifier for the modern tier and a persistent configuration record for
//! the legacy tier.

use secrecy::{ExposeSecret, SecretString};

use crate::types::ConnectionRequest;

/// How the supplied secret should reach the supplicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Open network: no key at all.
    None,
    /// Plain passphrase, to be hashed by the OS.
    Passphrase(String),
    /// 64 hex characters: already a pre-shared key, used verbatim.
    RawPsk(String),
    /// WEP key (legacy networks only).
    Wep(String),
}

impl KeyMaterial {
    fn classify(passphrase: &SecretString, is_wep: bool) -> Self {
        let secret = passphrase.expose_secret();
        if is_wep {
            return Self::Wep(secret.to_string());
        }
        if secret.len() == 64 && secret.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::RawPsk(secret.to_string());
        }
        Self::Passphrase(secret.to_string())
    }

    pub fn from_request(request: &ConnectionRequest) -> Self {
        match &request.passphrase {
            Some(p) if !p.expose_secret().is_empty() => Self::classify(p, request.is_wep),
            _ => Self::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Scoped, non-persistent join request for the modern-managed tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralSpecifier {
    pub ssid: String,
    /// Omitted entirely for open networks.
    pub key: KeyMaterial,
}

impl EphemeralSpecifier {
    pub fn build(request: &ConnectionRequest) -> Self {
        Self {
            ssid: request.identity.ssid.clone(),
            key: KeyMaterial::from_request(request),
        }
    }
}

/// Key management suite for a persistent configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagement {
    /// No encryption.
    None,
    WpaPsk,
    WepShared,
}

/// Persistent configuration record for the legacy tier. The security flag
/// sets mirror what the platform's configuration API expects: WPA and RSN
/// protocols together with TKIP+CCMP ciphers when a passphrase is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProfile {
    pub ssid: String,
    pub key_management: KeyManagement,
    pub key: KeyMaterial,
    /// Allowed protocols, e.g. ["WPA", "RSN"].
    pub protocols: Vec<&'static str>,
    /// Allowed group ciphers.
    pub group_ciphers: Vec<&'static str>,
    /// Allowed pairwise ciphers.
    pub pairwise_ciphers: Vec<&'static str>,
}

impl LegacyProfile {
    pub fn build(request: &ConnectionRequest) -> Self {
        let key = KeyMaterial::from_request(request);
        match &key {
            KeyMaterial::None => Self {
                ssid: request.identity.ssid.clone(),
                key_management: KeyManagement::None,
                key,
                protocols: Vec::new(),
                group_ciphers: Vec::new(),
                pairwise_ciphers: Vec::new(),
            },
            KeyMaterial::Wep(_) => Self {
                ssid: request.identity.ssid.clone(),
                key_management: KeyManagement::WepShared,
                key,
                protocols: Vec::new(),
                group_ciphers: vec!["WEP40", "WEP104"],
                pairwise_ciphers: Vec::new(),
            },
            KeyMaterial::Passphrase(_) | KeyMaterial::RawPsk(_) => Self {
                ssid: request.identity.ssid.clone(),
                key_management: KeyManagement::WpaPsk,
                key,
                protocols: vec!["WPA", "RSN"],
                group_ciphers: vec!["TKIP", "CCMP"],
                pairwise_ciphers: vec!["TKIP", "CCMP"],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ssid: &str, passphrase: Option<&str>) -> ConnectionRequest {
        let mut req = ConnectionRequest::new(ssid);
        if let Some(p) = passphrase {
            req = req.with_passphrase(SecretString::from(p));
        }
        req
    }

    #[test]
    fn sixty_four_hex_chars_is_a_raw_psk() {
        let psk = "a".repeat(64);
        let req = request("HomeNet", Some(&psk));
        assert_eq!(
            KeyMaterial::from_request(&req),
            KeyMaterial::RawPsk(psk.clone())
        );

        let profile = LegacyProfile::build(&req);
        assert_eq!(profile.key, KeyMaterial::RawPsk(psk));
        assert_eq!(profile.key_management, KeyManagement::WpaPsk);
    }

    #[test]
    fn mixed_case_hex_still_counts() {
        let psk: String = "0123456789abcdefABCDEF0123456789abcdefABCDEF0123456789abcdef0123".into();
        assert_eq!(psk.len(), 64);
        let req = request("HomeNet", Some(&psk));
        assert_eq!(KeyMaterial::from_request(&req), KeyMaterial::RawPsk(psk));
    }

    #[test]
    fn non_hex_of_length_64_is_a_passphrase() {
        let phrase = "z".repeat(64);
        let req = request("HomeNet", Some(&phrase));
        assert_eq!(
            KeyMaterial::from_request(&req),
            KeyMaterial::Passphrase(phrase)
        );
    }

    #[test]
    fn short_secret_is_a_passphrase() {
        let req = request("HomeNet", Some("hunter2"));
        assert_eq!(
            KeyMaterial::from_request(&req),
            KeyMaterial::Passphrase("hunter2".into())
        );
    }

    #[test]
    fn empty_passphrase_builds_open_profile() {
        let req = request("CafeWifi", Some(""));
        let profile = LegacyProfile::build(&req);
        assert_eq!(profile.key_management, KeyManagement::None);
        assert!(profile.key.is_none());
        assert!(profile.protocols.is_empty());
        assert!(profile.group_ciphers.is_empty());
        assert!(profile.pairwise_ciphers.is_empty());
    }

    #[test]
    fn missing_passphrase_builds_open_specifier() {
        let req = request("CafeWifi", None);
        let spec = EphemeralSpecifier::build(&req);
        assert!(spec.key.is_none());
    }

    #[test]
    fn passphrase_profile_sets_mutual_wpa_suites() {
        let req = request("HomeNet", Some("hunter2"));
        let profile = LegacyProfile::build(&req);
        assert_eq!(profile.key_management, KeyManagement::WpaPsk);
        assert_eq!(profile.protocols, vec!["WPA", "RSN"]);
        assert_eq!(profile.group_ciphers, vec!["TKIP", "CCMP"]);
        assert_eq!(profile.pairwise_ciphers, vec!["TKIP", "CCMP"]);
    }

    #[test]
    fn wep_flag_overrides_psk_classification() {
        let req = request("OldNet", Some("abcde")).wep(true);
        let profile = LegacyProfile::build(&req);
        assert_eq!(profile.key_management, KeyManagement::WepShared);
        assert_eq!(profile.key, KeyMaterial::Wep("abcde".into()));
    }
}
