//! Ambient configuration: the policy knobs spec.md leaves to the integrator
//! (§9 Open Questions) plus the replay-window-size override the teacher's
//! `option.rs` keeps configurable (SPEC_FULL.md §3).

use crate::profile::ProtectionProfile;

/// Replay-window size in bits. spec.md §3/§4.5 fixes this at 64; the
/// teacher's `srtp_replay_protection`/`srtcp_replay_protection` constructors
/// keep it as a parameter, so this repo does too even though only 64 is
/// currently wired through `webrtc_util::replay_detector`.
pub const DEFAULT_REPLAY_WINDOW_SIZE: u64 = 64;

/// Per-session policy. Constructed once per handshake and shared read-only
/// by the four [`crate::context`] instances a [`crate::session::SessionContext`]
/// bundles.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub profile: ProtectionProfile,
    /// Master Key Identifier negotiated over `use_srtp` (C9), if any.
    pub mki: Option<Vec<u8>>,
    pub replay_window_size: u64,
    /// spec.md §9 Open Question: "the mechanism must exist" regardless of
    /// the policy default. `true` fails the session closed when the DTLS
    /// collaborator reports Extended Master Secret was not negotiated — see
    /// DESIGN.md for why `true` was chosen as this repo's default.
    pub require_extended_master_secret: bool,
    /// RFC 8827 ("disable MKI") policy applied on the server side of
    /// extension negotiation (C9); independent of the `mki` field above,
    /// which is this *session's* own MKI once negotiation has completed.
    pub disable_mki_on_offer: bool,
}

impl SessionConfig {
    pub fn new(profile: ProtectionProfile) -> Self {
        SessionConfig {
            profile,
            mki: None,
            replay_window_size: DEFAULT_REPLAY_WINDOW_SIZE,
            require_extended_master_secret: true,
            disable_mki_on_offer: true,
        }
    }

    pub fn with_mki(mut self, mki: Vec<u8>) -> Self {
        self.mki = Some(mki);
        self
    }

    pub fn with_replay_window_size(mut self, bits: u64) -> Self {
        self.replay_window_size = bits;
        self
    }
}
