use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds the core surfaces. `HandshakeMissingExtendedMasterSecret`
/// aborts the session; `use_srtp` negotiation failures are `dtls-srtp-ext`'s
/// own `Error` (it wraps this one, not the reverse). Unprotect errors are
/// per-packet and never mutate context state.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("extended master secret was not negotiated but is required")]
    HandshakeMissingExtendedMasterSecret,

    #[error("packet is too short: {0} bytes, need at least {1}")]
    UnprotectShortPacket(usize, usize),
    #[error("MKI present but does not match the context")]
    UnprotectBadMki,
    #[error("index {0} already seen")]
    UnprotectReplay(u64),
    #[error("index {0} outside the replay window")]
    UnprotectTooOld(u64),
    #[error("authentication failed")]
    UnprotectAuthFailed,

    #[error("packet index would overflow; the session must be torn down")]
    ProtectIndexExhausted,

    #[error("no such protection profile 0x{0:04x}")]
    NoSuchProfile(u16),
    #[error("master key must be {0} bytes, got {1}")]
    MasterKeyLength(usize, usize),
    #[error("master salt must be {0} bytes, got {1}")]
    MasterSaltLength(usize, usize),
    #[error("exported keying material must be {0} bytes, got {1}")]
    ExportedSecretLength(usize, usize),
    #[error("index_over_kdr division by a non-power-of-two KDR")]
    InvalidKdr,

    #[error("{0}")]
    Util(#[from] webrtc_util::Error),
    #[error("{0}")]
    KeyingMaterial(#[from] webrtc_util::error::KeyingMaterialExporterError),
    #[error("aead: {0}")]
    Aead(#[from] aead::Error),

    #[error("{0}")]
    Other(String),
}
