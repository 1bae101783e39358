//! AEAD-AES-GCM / AEAD-ARIA-GCM (RFC 7714 / RFC 8269): a single AEAD seal or
//! open call per packet, keyed by a session key derived the same way as the
//! CM families. Generic over the concrete `aead::Aead + aead::KeyInit` type
//! `A` so AES-128/256-GCM and ARIA-128/256-GCM share one implementation;
//! also generic over the key-derivation block cipher `KD`, since RFC 8269
//! derives ARIA session keys with ARIA, not AES (spec.md §4.2).

use ::aead::{Aead, KeyInit, Payload};
use byteorder::{BigEndian, ByteOrder};
use cipher::BlockEncrypt;

use super::Cipher;
use crate::error::{Error, Result};
use crate::iv;
use crate::key_derivation::{self, LABEL_SRTCP_ENCRYPTION, LABEL_SRTP_ENCRYPTION};
use crate::profile::ProtectionProfile;

const RTCP_ENCRYPTION_FLAG: u32 = 1 << 31;

pub(crate) struct AeadGcmCipher<A> {
    profile: ProtectionProfile,
    srtp_cipher: A,
    srtcp_cipher: A,
    srtp_salt: Vec<u8>,
    srtcp_salt: Vec<u8>,
}

impl<A: KeyInit> AeadGcmCipher<A> {
    pub fn new(profile: ProtectionProfile, master_key: &[u8], master_salt: &[u8], r: u64) -> Result<Self>
    where
        A: AeadGcmKeyDerivation,
    {
        A::derive_and_build(profile, master_key, master_salt, r, LABEL_SRTP_ENCRYPTION, LABEL_SRTCP_ENCRYPTION)
    }
}

/// Ties an AEAD cipher type to the block cipher RFC 8269/3711 use to derive
/// *its* session keys (AES for the AES-GCM family, ARIA for the ARIA-GCM
/// family). Implemented once per concrete `A` in [`super::mod`]'s `build`.
pub(crate) trait AeadGcmKeyDerivation: Sized {
    type Kd: KeyInit + BlockEncrypt + 'static;
}

impl AeadGcmKeyDerivation for ::aes_gcm::Aes128Gcm {
    type Kd = aes::Aes128;
}

impl AeadGcmKeyDerivation for ::aes_gcm::Aes256Gcm {
    type Kd = aes::Aes256;
}

impl AeadGcmKeyDerivation for ::aes_gcm::AesGcm<aria::Aria128, ::aead::consts::U12> {
    type Kd = aria::Aria128;
}

impl AeadGcmKeyDerivation for ::aes_gcm::AesGcm<aria::Aria256, ::aead::consts::U12> {
    type Kd = aria::Aria256;
}

impl<A: KeyInit + AeadGcmKeyDerivation> AeadGcmCipher<A> {
    fn derive_and_build(
        profile: ProtectionProfile,
        master_key: &[u8],
        master_salt: &[u8],
        r: u64,
        rtp_label: u8,
        rtcp_label: u8,
    ) -> Result<Self> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();

        let srtp_key =
            key_derivation::derive::<A::Kd>(master_key, master_salt, rtp_label, r, key_len)?;
        let srtcp_key =
            key_derivation::derive::<A::Kd>(master_key, master_salt, rtcp_label, r, key_len)?;
        let srtp_salt = key_derivation::derive::<A::Kd>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTP_SALT,
            r,
            salt_len,
        )?;
        let srtcp_salt = key_derivation::derive::<A::Kd>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTCP_SALT,
            r,
            salt_len,
        )?;

        let srtp_cipher = A::new_from_slice(&srtp_key).map_err(|e| Error::Other(e.to_string()))?;
        let srtcp_cipher =
            A::new_from_slice(&srtcp_key).map_err(|e| Error::Other(e.to_string()))?;

        Ok(AeadGcmCipher {
            profile,
            srtp_cipher,
            srtcp_cipher,
            srtp_salt,
            srtcp_salt,
        })
    }
}

/// Exposed so [`super::double_aead`] can derive an inner/outer pair under
/// distinct labels without going through the single-profile `new`.
pub(crate) fn derive_pair<A: KeyInit + AeadGcmKeyDerivation>(
    profile: ProtectionProfile,
    master_key: &[u8],
    master_salt: &[u8],
    r: u64,
    rtp_label: u8,
    rtcp_label: u8,
) -> Result<AeadGcmCipher<A>> {
    AeadGcmCipher::<A>::derive_and_build(profile, master_key, master_salt, r, rtp_label, rtcp_label)
}

impl<A: Aead + Send + Sync> Cipher for AeadGcmCipher<A> {
    fn rtp_tag_len(&self) -> usize {
        self.profile.auth_tag_len()
    }

    fn rtcp_tag_len(&self) -> usize {
        self.profile.auth_tag_len()
    }

    fn rtcp_index_trails_tag(&self) -> bool {
        true
    }

    fn encrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let nonce = iv::aead_rtp(&self.srtp_salt, ssrc, index);
        let sealed = self
            .srtp_cipher
            .encrypt(
                (&nonce).into(),
                Payload {
                    msg: &packet[header_len..],
                    aad: &packet[..header_len],
                },
            )
            .map_err(|_| Error::UnprotectAuthFailed)?;
        let mut out = Vec::with_capacity(header_len + sealed.len());
        out.extend_from_slice(&packet[..header_len]);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        if packet.len() < header_len + self.rtp_tag_len() {
            return Err(Error::UnprotectShortPacket(
                packet.len(),
                header_len + self.rtp_tag_len(),
            ));
        }
        let nonce = iv::aead_rtp(&self.srtp_salt, ssrc, index);
        let opened = self
            .srtp_cipher
            .decrypt(
                (&nonce).into(),
                Payload {
                    msg: &packet[header_len..],
                    aad: &packet[..header_len],
                },
            )
            .map_err(|_| Error::UnprotectAuthFailed)?;
        let mut out = Vec::with_capacity(header_len + opened.len());
        out.extend_from_slice(&packet[..header_len]);
        out.extend_from_slice(&opened);
        Ok(out)
    }

    fn encrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let flagged_index = srtcp_index | RTCP_ENCRYPTION_FLAG;
        // RFC 7714 §9.1: the nonce XORs the raw 31-bit index; the E-flag is
        // carried only in the AAD, not the nonce.
        let nonce = iv::aead_rtcp(&self.srtcp_salt, ssrc, srtcp_index);
        let mut aad = [0u8; 12];
        aad[..8].copy_from_slice(&packet[..8]);
        BigEndian::write_u32(&mut aad[8..], flagged_index);

        let sealed = self
            .srtcp_cipher
            .encrypt(
                (&nonce).into(),
                Payload {
                    msg: &packet[8..],
                    aad: &aad,
                },
            )
            .map_err(|_| Error::UnprotectAuthFailed)?;

        let mut out = Vec::with_capacity(8 + sealed.len() + 4);
        out.extend_from_slice(&packet[..8]);
        out.extend_from_slice(&sealed);
        out.extend_from_slice(&aad[8..]);
        Ok(out)
    }

    fn decrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        if packet.len() < 8 + 4 + self.rtcp_tag_len() {
            return Err(Error::UnprotectShortPacket(
                packet.len(),
                8 + 4 + self.rtcp_tag_len(),
            ));
        }
        let flagged_index = srtcp_index | RTCP_ENCRYPTION_FLAG;
        let nonce = iv::aead_rtcp(&self.srtcp_salt, ssrc, srtcp_index);
        let mut aad = [0u8; 12];
        aad[..8].copy_from_slice(&packet[..8]);
        BigEndian::write_u32(&mut aad[8..], flagged_index);

        let cipher_end = packet.len() - 4;
        let opened = self
            .srtcp_cipher
            .decrypt(
                (&nonce).into(),
                Payload {
                    msg: &packet[8..cipher_end],
                    aad: &aad,
                },
            )
            .map_err(|_| Error::UnprotectAuthFailed)?;

        let mut out = Vec::with_capacity(8 + opened.len());
        out.extend_from_slice(&packet[..8]);
        out.extend_from_slice(&opened);
        Ok(out)
    }
}

pub type Aes128Gcm = ::aes_gcm::Aes128Gcm;
pub type Aes256Gcm = ::aes_gcm::Aes256Gcm;
pub type AriaGcm128 = ::aes_gcm::AesGcm<aria::Aria128, ::aead::consts::U12>;
pub type AriaGcm256 = ::aes_gcm::AesGcm<aria::Aria256, ::aead::consts::U12>;
