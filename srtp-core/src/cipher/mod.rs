//! C1 — cipher primitives. One [`Cipher`] implementation per RFC-registered
//! family; [`build`] dispatches on [`crate::profile::CipherFamily`] to
//! construct the right one for a profile's session keys. The family set is
//! closed and fixed by IANA (spec.md §9), so this is a flat match rather
//! than a trait-object hierarchy growing over time — the trait exists only
//! to give `context.rs` one call shape regardless of family.

mod aes_cm;
mod aes_gcm;
mod double_aead;
mod f8;
mod null;

use crate::error::Result;
use crate::profile::{CipherFamily, ProtectionProfile};

/// Implemented by every SRTP/SRTCP cipher family. `encrypt_rtp`/`decrypt_rtp`
/// operate on the full packet (unencrypted header ‖ payload); the header's
/// `header_len` bytes are passported through unencrypted (and, for AEAD,
/// become the AAD) while everything after is protected. The return value
/// never includes MKI — that's appended by [`crate::context`].
pub trait Cipher: Send {
    /// Bytes appended to an RTP packet's ciphertext: the truncated HMAC tag
    /// for non-AEAD families, the AEAD tag for AEAD families.
    fn rtp_tag_len(&self) -> usize;
    /// As `rtp_tag_len`, for SRTCP (distinct tag length per spec.md §3).
    fn rtcp_tag_len(&self) -> usize;

    fn encrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>>;

    fn decrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>>;

    /// `packet` is the full plaintext RTCP packet (first 8 bytes = V/P/RC/PT
    /// + length + sender SSRC, left unencrypted). Returns
    /// `first 8 bytes ‖ ciphertext ‖ E‖index (4B) ‖ tag`, or, when
    /// `rtcp_index_trails_tag` is true, `first 8 bytes ‖ ciphertext (tag
    /// embedded) ‖ E‖index (4B)` with no further trailer.
    fn encrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>>;

    /// `packet` is the full wire SRTCP packet (as `encrypt_rtcp` produced it,
    /// MKI stripped) including its `E‖index` trailer; `srtcp_index` is the
    /// already-parsed 31-bit index.
    fn decrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>>;

    /// Whether `encrypt_rtcp`/`decrypt_rtcp` place `E‖index` *after* the
    /// `rtcp_tag_len` trailer rather than before it. True for the AEAD
    /// families, whose tag is embedded in the ciphertext itself (RFC 7714
    /// §9.1), so there is no separate trailing auth tag field for the index
    /// to precede. False (the default) for the block-cipher families, whose
    /// HMAC tag is computed over `ciphertext ‖ index` and appended after it.
    fn rtcp_index_trails_tag(&self) -> bool {
        false
    }
}

/// Builds the cipher implied by `profile`'s family, keyed by the session's
/// master key/salt (already the concatenated inner‖outer halves for double
/// profiles — [`double_aead::DoubleAead`] re-splits them) at key-derivation
/// index `r` (spec.md §4.2's `i DIV KDR`; `0` for profiles that never
/// re-derive). The caller rebuilds via `build` whenever `r` changes.
pub fn build(
    profile: &ProtectionProfile,
    master_key: &[u8],
    master_salt: &[u8],
    r: u64,
) -> Result<Box<dyn Cipher>> {
    use CipherFamily::*;
    Ok(match profile.cipher {
        Aes128Cm => Box::new(aes_cm::CmCipher::<aes::Aes128>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        Aes256Cm => Box::new(aes_cm::CmCipher::<aes::Aes256>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        Aria128Cm => Box::new(aes_cm::CmCipher::<aria::Aria128>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        Aria256Cm => Box::new(aes_cm::CmCipher::<aria::Aria256>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        AeadAes128Gcm => Box::new(aes_gcm::AeadGcmCipher::<aes_gcm::Aes128Gcm>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        AeadAes256Gcm => Box::new(aes_gcm::AeadGcmCipher::<aes_gcm::Aes256Gcm>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        AeadAria128Gcm => Box::new(aes_gcm::AeadGcmCipher::<aes_gcm::AriaGcm128>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        AeadAria256Gcm => Box::new(aes_gcm::AeadGcmCipher::<aes_gcm::AriaGcm256>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        DoubleAead128 => Box::new(double_aead::DoubleAead::<aes_gcm::Aes128Gcm>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        DoubleAead256 => Box::new(double_aead::DoubleAead::<aes_gcm::Aes256Gcm>::new(
            *profile,
            master_key,
            master_salt,
            r,
        )?),
        F8Aes128 => Box::new(f8::F8Cipher::new(*profile, master_key, master_salt, r)?),
        Null => Box::new(null::NullCipher::new(*profile, master_key, master_salt, r)?),
    })
}
