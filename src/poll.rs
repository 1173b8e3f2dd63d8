//! Confirmation poller: some platforms report success before the
//! association is actually live, so a positive native signal is never
//! enough on its own. This loop samples the associated SSID until it
//! matches the target or the attempt budget runs out.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::backend::WifiBackend;
use crate::types::{normalize_ssid, NetworkIdentity};

/// Sample the currently-associated network once per `interval`, up to
/// `max_attempts` times. Returns true on the first normalized,
/// case-insensitive match with `target`; false once the budget is spent.
///
/// Cancellation degrades to false rather than an error: the caller treats
/// it exactly like a timeout. Sampling errors count as "no identity".
pub async fn poll_until_connected<B: WifiBackend + ?Sized>(
    backend: &B,
    target: &NetworkIdentity,
    max_attempts: u32,
    interval: Duration,
    cancel: &CancellationToken,
) -> bool {
    for attempt in 1..=max_attempts {
        let raw = match backend.current_ssid().await {
            Ok(ssid) => ssid,
            Err(e) => {
                trace!("sample {attempt}: backend error treated as no identity: {e}");
                None
            }
        };

        if let Some(live) = raw.as_deref().and_then(normalize_ssid) {
            if target.matches_ssid(&live) {
                debug!("confirmed '{target}' on sample {attempt}/{max_attempts}");
                return true;
            }
            trace!("sample {attempt}: associated with '{live}', want '{target}'");
        } else {
            trace!("sample {attempt}: no active association");
        }

        if attempt == max_attempts {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("poll for '{target}' interrupted");
                return false;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("'{target}' not confirmed after {max_attempts} samples");
    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::{JoinSignal, ProfileId, WifiBackend};
    use crate::error::{WifiError, WifiResult};
    use crate::profile::{EphemeralSpecifier, LegacyProfile};
    use crate::types::{
        CapabilityTier, PlatformCapabilities, PreconditionState, ScanResult, SettingKind,
    };

    /// Minimal backend whose only purpose is serving scripted SSID samples.
    struct SampleScript {
        samples: Mutex<Vec<WifiResult<Option<String>>>>,
        taken: AtomicU32,
    }

    impl SampleScript {
        fn new(samples: Vec<WifiResult<Option<String>>>) -> Self {
            Self {
                samples: Mutex::new(samples),
                taken: AtomicU32::new(0),
            }
        }

        fn taken(&self) -> u32 {
            self.taken.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WifiBackend for SampleScript {
        fn capabilities(&self) -> PlatformCapabilities {
            PlatformCapabilities {
                tier: CapabilityTier::Legacy,
                can_toggle_radio: true,
            }
        }

        async fn preconditions(&self) -> WifiResult<PreconditionState> {
            Ok(PreconditionState::default())
        }

        async fn current_ssid(&self) -> WifiResult<Option<String>> {
            self.taken.fetch_add(1, Ordering::SeqCst);
            let mut samples = self.samples.lock().unwrap();
            if samples.is_empty() {
                Ok(None)
            } else {
                samples.remove(0)
            }
        }

        async fn request_ephemeral_network(
            &self,
            _spec: &EphemeralSpecifier,
        ) -> WifiResult<JoinSignal> {
            unimplemented!()
        }

        async fn register_profile(&self, _profile: &LegacyProfile) -> WifiResult<ProfileId> {
            unimplemented!()
        }

        async fn enable_profile(&self, _id: ProfileId) -> WifiResult<()> {
            unimplemented!()
        }

        async fn reconnect(&self) -> WifiResult<()> {
            unimplemented!()
        }

        async fn remove_profile(&self, _ssid: &str) -> WifiResult<()> {
            unimplemented!()
        }

        async fn scan(&self) -> WifiResult<Vec<ScanResult>> {
            unimplemented!()
        }

        async fn is_radio_enabled(&self) -> WifiResult<bool> {
            Ok(true)
        }

        async fn set_radio_enabled(&self, _enabled: bool) -> WifiResult<()> {
            Ok(())
        }

        async fn is_location_service_enabled(&self) -> WifiResult<bool> {
            Ok(true)
        }

        async fn signal_strength(&self) -> WifiResult<i32> {
            unimplemented!()
        }

        async fn open_setting(&self, _kind: SettingKind) -> WifiResult<()> {
            Ok(())
        }
    }

    fn target(ssid: &str) -> NetworkIdentity {
        NetworkIdentity::new(ssid)
    }

    const FAST: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn first_matching_sample_wins() {
        let backend = SampleScript::new(vec![Ok(Some("\"HomeNet\"".into()))]);
        let ok = poll_until_connected(
            &backend,
            &target("homenet"),
            3,
            FAST,
            &CancellationToken::new(),
        )
        .await;
        assert!(ok);
        assert_eq!(backend.taken(), 1);
    }

    #[tokio::test]
    async fn stops_after_exactly_max_attempts() {
        let backend = SampleScript::new(vec![
            Ok(None),
            Ok(Some("OtherNet".into())),
            Ok(Some("<unknown ssid>".into())),
            Ok(Some("HomeNet".into())), // never reached
        ]);
        let ok = poll_until_connected(
            &backend,
            &target("HomeNet"),
            3,
            FAST,
            &CancellationToken::new(),
        )
        .await;
        assert!(!ok);
        assert_eq!(backend.taken(), 3);
    }

    #[tokio::test]
    async fn match_on_a_later_sample() {
        let backend = SampleScript::new(vec![
            Ok(None),
            Ok(None),
            Ok(Some("HomeNet".into())),
        ]);
        let ok = poll_until_connected(
            &backend,
            &target("HomeNet"),
            10,
            FAST,
            &CancellationToken::new(),
        )
        .await;
        assert!(ok);
        assert_eq!(backend.taken(), 3);
    }

    #[tokio::test]
    async fn sampling_errors_are_not_faults() {
        let backend = SampleScript::new(vec![
            Err(WifiError::invalid("flaky bus")),
            Ok(Some("HomeNet".into())),
        ]);
        let ok = poll_until_connected(
            &backend,
            &target("HomeNet"),
            3,
            FAST,
            &CancellationToken::new(),
        )
        .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn cancellation_yields_false() {
        let backend = SampleScript::new(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ok = poll_until_connected(
            &backend,
            &target("HomeNet"),
            1000,
            Duration::from_secs(3600),
            &cancel,
        )
        .await;
        assert!(!ok);
        // One sample is taken before the first wait, then the cancelled
        // token short-circuits the rest of the budget.
        assert_eq!(backend.taken(), 1);
    }
}
