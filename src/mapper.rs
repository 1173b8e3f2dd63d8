//! Translation of native status/reason codes into the closed [`ErrorKind`]
//! vocabulary. The table is data: supporting another OS revision means
//! adding rows, not touching control flow elsewhere.

use crate::error::ErrorKind;

/// Active-connection failure reasons as NetworkManager reports them
/// (NMActiveConnectionStateReason).
pub mod reason {
    pub const UNKNOWN: u32 = 0;
    pub const NONE: u32 = 1;
    pub const USER_DISCONNECTED: u32 = 2;
    pub const DEVICE_DISCONNECTED: u32 = 3;
    pub const SERVICE_STOPPED: u32 = 4;
    pub const IP_CONFIG_INVALID: u32 = 5;
    pub const CONNECT_TIMEOUT: u32 = 6;
    pub const SERVICE_START_TIMEOUT: u32 = 7;
    pub const SERVICE_START_FAILED: u32 = 8;
    pub const NO_SECRETS: u32 = 9;
    pub const LOGIN_FAILED: u32 = 10;
    pub const CONNECTION_REMOVED: u32 = 11;
    pub const DEPENDENCY_FAILED: u32 = 12;
    pub const DEVICE_REALIZE_FAILED: u32 = 13;
    pub const DEVICE_REMOVED: u32 = 14;
}

const NATIVE_CODE_TABLE: &[(u32, ErrorKind)] = &[
    (reason::USER_DISCONNECTED, ErrorKind::UserDenied),
    (reason::DEVICE_DISCONNECTED, ErrorKind::UnableToConnect),
    (reason::SERVICE_STOPPED, ErrorKind::UnableToConnect),
    (reason::IP_CONFIG_INVALID, ErrorKind::UnableToConnect),
    (reason::CONNECT_TIMEOUT, ErrorKind::TimeoutOccurred),
    (reason::SERVICE_START_TIMEOUT, ErrorKind::TimeoutOccurred),
    (reason::SERVICE_START_FAILED, ErrorKind::UnableToConnect),
    (reason::NO_SECRETS, ErrorKind::InvalidPassphrase),
    (reason::LOGIN_FAILED, ErrorKind::InvalidPassphrase),
    (reason::CONNECTION_REMOVED, ErrorKind::UnableToConnect),
    (reason::DEPENDENCY_FAILED, ErrorKind::UnableToConnect),
    (reason::DEVICE_REALIZE_FAILED, ErrorKind::UnableToConnect),
    (reason::DEVICE_REMOVED, ErrorKind::DidNotFindNetwork),
];

/// Look up a native failure reason. Unrecognized codes (including the
/// "unknown"/"none" placeholders) collapse to the generic catch-all so a raw
/// code never leaks to the caller.
pub fn map_native_error(code: u32) -> ErrorKind {
    NATIVE_CODE_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::UnableToConnect)
}

/// Same lookup for an optional code, for call sites where the OS may not
/// hand one over at all.
pub fn map_optional_native_error(code: Option<u32>) -> ErrorKind {
    code.map(map_native_error).unwrap_or(ErrorKind::UnableToConnect)
}
