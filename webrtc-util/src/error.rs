use thiserror::Error;

/// Error produced by keying-material export, performed by whatever DTLS
/// implementation a caller has wired up as the exporter collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyingMaterialExporterError {
    #[error("exporter called with wrong label")]
    WrongLabel,
    #[error("exported keying material was {0} bytes, expected {1}")]
    UnexpectedLength(usize, usize),
    #[error("extended master secret was not negotiated and the policy requires it")]
    MissingExtendedMasterSecret,
}

/// Catch-all error type shared by the smaller `webrtc-util` helpers, mirrored
/// on the teacher's `util::Error`.
#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("{message}")]
pub struct Error {
    message: String,
}

impl Error {
    pub fn new(message: String) -> Self {
        Error { message }
    }
}

impl From<KeyingMaterialExporterError> for Error {
    fn from(e: KeyingMaterialExporterError) -> Self {
        Error::new(e.to_string())
    }
}
