//! Connection attempt orchestrator: precondition gate, tier dispatch,
//! confirmation. One attempt per call; retry policy belongs to the caller.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{JoinSignal, WifiBackend};
use crate::config::Config;
use crate::error::{ErrorKind, WifiError, WifiResult};
use crate::poll::poll_until_connected;
use crate::profile::{EphemeralSpecifier, LegacyProfile};
use crate::types::{CapabilityTier, ConnectionRequest, PreconditionState};

pub struct Connector<B: WifiBackend> {
    backend: B,
    config: Config,
}

impl<B: WifiBackend> Connector<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: Config::default(),
        }
    }

    pub fn with_config(backend: B, config: Config) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Issue a single connection attempt and await its terminal outcome.
    /// `Ok(())` is only returned once the live association has been
    /// observed to match the target at least once.
    pub async fn connect(
        &self,
        request: &ConnectionRequest,
        cancel: &CancellationToken,
    ) -> WifiResult<()> {
        self.check_preconditions().await?;

        let caps = self.backend.capabilities();
        debug!("connecting to '{}' via {:?}", request.identity, caps.tier);

        let outcome = match caps.tier {
            CapabilityTier::ModernManaged => self.connect_modern(request, cancel).await,
            CapabilityTier::Legacy => self.connect_legacy(request, cancel).await,
        };

        // The modern tier never persists anything; the legacy profile
        // outlives the call unless the caller asked for join-once.
        if request.join_once && caps.tier == CapabilityTier::Legacy {
            if let Err(e) = self.backend.remove_profile(&request.identity.ssid).await {
                warn!("join-once cleanup for '{}' failed: {e}", request.identity);
            }
        }

        match &outcome {
            Ok(()) => info!("connected to '{}'", request.identity),
            Err(e) => debug!("connect to '{}' failed: {e}", request.identity),
        }
        outcome
    }

    /// Fail fast, with the remediation-specific kind, before any native
    /// mutation is attempted.
    async fn check_preconditions(&self) -> WifiResult<()> {
        let state: PreconditionState = self.backend.preconditions().await?;

        if !state.location_permission {
            return Err(WifiError::new(
                ErrorKind::LocationPermissionMissing,
                "Location permission is not granted",
            ));
        }
        if !state.location_services {
            return Err(WifiError::new(
                ErrorKind::LocationServicesOff,
                "Location service is turned off",
            ));
        }
        if !state.radio_enabled {
            let caps = self.backend.capabilities();
            if !caps.can_toggle_radio {
                return Err(WifiError::new(
                    ErrorKind::CouldNotEnableRadio,
                    "The wireless radio is off and this platform requires the user to enable it",
                ));
            }
            self.backend.set_radio_enabled(true).await.map_err(|e| {
                WifiError::new(
                    ErrorKind::CouldNotEnableRadio,
                    format!("The wireless radio is off and could not be enabled: {}", e.detail),
                )
            })?;
        }
        Ok(())
    }

    async fn connect_modern(
        &self,
        request: &ConnectionRequest,
        cancel: &CancellationToken,
    ) -> WifiResult<()> {
        let spec = EphemeralSpecifier::build(request);
        match self.backend.request_ephemeral_network(&spec).await? {
            JoinSignal::Available => {}
            JoinSignal::Unavailable => {
                return Err(WifiError::new(
                    ErrorKind::UserDenied,
                    "The user cancelled connecting (via the system UI)",
                ));
            }
            JoinSignal::Lost => {
                return Err(WifiError::unable_to_connect(format!(
                    "Connection to {} was lost right after it was granted",
                    request.identity
                )));
            }
        }

        // An availability signal alone is not success; some firmwares
        // report it and drop the association immediately.
        let confirmed = poll_until_connected(
            &self.backend,
            &request.identity,
            self.config.modern_poll_attempts,
            self.config.poll_interval,
            cancel,
        )
        .await;
        if !confirmed {
            return Err(WifiError::unable_to_connect(format!(
                "Network reported available but the connection to {} dropped immediately",
                request.identity
            )));
        }
        Ok(())
    }

    async fn connect_legacy(
        &self,
        request: &ConnectionRequest,
        cancel: &CancellationToken,
    ) -> WifiResult<()> {
        let ssid = &request.identity.ssid;
        let profile = LegacyProfile::build(request);

        let id = self.backend.register_profile(&profile).await.map_err(|e| {
            WifiError::unable_to_connect(format!(
                "Could not add or update network configuration with SSID {ssid}: {}",
                e.detail
            ))
        })?;

        self.backend.enable_profile(id).await.map_err(|e| {
            WifiError::unable_to_connect(format!(
                "Failed to enable network with {ssid}: {}",
                e.detail
            ))
        })?;

        self.backend.reconnect().await.map_err(|e| {
            WifiError::unable_to_connect(format!(
                "Failed to reconnect with {ssid}: {}",
                e.detail
            ))
        })?;

        let confirmed = poll_until_connected(
            &self.backend,
            &request.identity,
            self.config.legacy_poll_attempts,
            self.config.poll_interval,
            cancel,
        )
        .await;
        if !confirmed {
            return Err(WifiError::unable_to_connect(format!(
                "Failed to connect with {ssid}"
            )));
        }
        Ok(())
    }

    /// The currently-associated network name, normalized.
    pub async fn current_ssid(&self) -> WifiResult<Option<String>> {
        let raw = self.backend.current_ssid().await?;
        Ok(raw.as_deref().and_then(crate::types::normalize_ssid))
    }
}
