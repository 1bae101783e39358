use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// `use_srtp` extension negotiation failures (spec.md §7 Handshake.*
/// kinds restricted to the subset C9 itself can raise).
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("use_srtp extension is malformed")]
    InvalidExtension,
    #[error("no mutually supported SRTP protection profile")]
    NoMutualProfile,
    #[error("client and server MKI disagree")]
    MkiMismatch,
    #[error("{0}")]
    Profile(#[from] srtp_core::error::Error),
}
