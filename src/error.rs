use std::fmt;

use thiserror::Error;

/// Closed, cross-platform error vocabulary. Every failure surfaced by the
/// library carries one of these kinds; raw native status codes never cross
/// the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnavailableForOsVersion,
    Invalid,
    InvalidSsid,
    InvalidSsidPrefix,
    InvalidPassphrase,
    UserDenied,
    UnableToConnect,
    LocationPermissionDenied,
    LocationPermissionRestricted,
    LocationPermissionMissing,
    LocationServicesOff,
    CouldNotEnableRadio,
    CouldNotDetectSsid,
    DidNotFindNetwork,
    TimeoutOccurred,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnavailableForOsVersion => "unavailableForOSVersion",
            Self::Invalid => "invalid",
            Self::InvalidSsid => "invalidSSID",
            Self::InvalidSsidPrefix => "invalidSSIDPrefix",
            Self::InvalidPassphrase => "invalidPassphrase",
            Self::UserDenied => "userDenied",
            Self::UnableToConnect => "unableToConnect",
            Self::LocationPermissionDenied => "locationPermissionDenied",
            Self::LocationPermissionRestricted => "locationPermissionRestricted",
            Self::LocationPermissionMissing => "locationPermissionMissing",
            Self::LocationServicesOff => "locationServicesOff",
            Self::CouldNotEnableRadio => "couldNotEnableWifi",
            Self::CouldNotDetectSsid => "couldNotDetectSSID",
            Self::DidNotFindNetwork => "didNotFindNetwork",
            Self::TimeoutOccurred => "timeoutOccurred",
        };
        f.write_str(s)
    }
}

/// A classified failure with a human-readable detail string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct WifiError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl WifiError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unable_to_connect(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnableToConnect, detail)
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, detail)
    }
}

impl From<zbus::Error> for WifiError {
    fn from(e: zbus::Error) -> Self {
        // Transport failures carry no native status code to map; they fall
        // into the generic catch-all with the D-Bus text as detail.
        Self::invalid(format!("D-Bus error: {e}"))
    }
}

impl From<zbus::fdo::Error> for WifiError {
    fn from(e: zbus::fdo::Error) -> Self {
        Self::invalid(format!("D-Bus fdo error: {e}"))
    }
}

pub type WifiResult<T> = Result<T, WifiError>;
