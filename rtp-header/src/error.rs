use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("buffer too short to contain an RTP header")]
    HeaderSizeInsufficient,
    #[error("buffer too short to contain the declared RTP header extension")]
    HeaderSizeInsufficientForExtension,
    #[error("RFC 8285 one-byte extension id must be between 1 and 14")]
    Rfc8285OneByteHeaderIdRange,
    #[error("RFC 8285 one-byte extension payload must be 16 bytes or fewer")]
    Rfc8285OneByteHeaderSize,
    #[error("RFC 8285 two-byte extension id must be at least 1")]
    Rfc8285TwoByteHeaderIdRange,
    #[error("RFC 8285 two-byte extension payload must be 255 bytes or fewer")]
    Rfc8285TwoByteHeaderSize,
    #[error("RFC 3550 extensions only support a single header extension block")]
    Rfc3550HeaderIdRange,
    #[error("header extension payload must be a multiple of 32 bits")]
    HeaderExtensionPayloadNot32BitWords,
}
