//! NULL cipher (RFC 3711 §4.1 "NULL cipher"): encryption is a no-op, but the
//! HMAC-SHA1 authenticator still runs (spec.md §4.7: "for the null cipher,
//! encryption is a no-op but the MAC still applies").

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use super::Cipher;
use crate::error::{Error, Result};
use crate::key_derivation::{self, LABEL_SRTCP_ENCRYPTION, LABEL_SRTP_ENCRYPTION};
use crate::profile::ProtectionProfile;

type HmacSha1 = Hmac<Sha1>;
type Aes128 = aes::Aes128;

pub(crate) struct NullCipher {
    profile: ProtectionProfile,
    srtp_auth: HmacSha1,
    srtcp_auth: HmacSha1,
}

impl NullCipher {
    pub fn new(profile: ProtectionProfile, master_key: &[u8], master_salt: &[u8], r: u64) -> Result<Self> {
        // NULL still runs the RFC 3711 key schedule for the auth key only —
        // there is no session encryption key or salt to derive.
        let _ = (LABEL_SRTP_ENCRYPTION, LABEL_SRTCP_ENCRYPTION);
        let srtp_auth_key = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTP_AUTHENTICATION_TAG,
            r,
            profile.auth_key_len(),
        )?;
        let srtcp_auth_key = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTCP_AUTHENTICATION_TAG,
            r,
            profile.auth_key_len(),
        )?;

        Ok(NullCipher {
            profile,
            srtp_auth: HmacSha1::new_from_slice(&srtp_auth_key)
                .map_err(|e| Error::Other(e.to_string()))?,
            srtcp_auth: HmacSha1::new_from_slice(&srtcp_auth_key)
                .map_err(|e| Error::Other(e.to_string()))?,
        })
    }

    fn auth_tag(signer: &HmacSha1, buf: &[u8], trailer: &[u8]) -> Vec<u8> {
        let mut signer = signer.clone();
        signer.update(buf);
        signer.update(trailer);
        signer.finalize().into_bytes().to_vec()
    }
}

impl Cipher for NullCipher {
    fn rtp_tag_len(&self) -> usize {
        self.profile.auth_tag_len()
    }

    fn rtcp_tag_len(&self) -> usize {
        self.profile.auth_tag_len()
    }

    fn encrypt_rtp(
        &self,
        packet: &[u8],
        _header_len: usize,
        _ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let mut out = packet.to_vec();
        let roc = (index >> 16) as u32;
        let tag = Self::auth_tag(&self.srtp_auth, &out, &roc.to_be_bytes());
        out.extend_from_slice(&tag[..self.rtp_tag_len()]);
        Ok(out)
    }

    fn decrypt_rtp(
        &self,
        packet: &[u8],
        _header_len: usize,
        _ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let tag_len = self.rtp_tag_len();
        if packet.len() < tag_len {
            return Err(Error::UnprotectShortPacket(packet.len(), tag_len));
        }
        let body_len = packet.len() - tag_len;
        let roc = (index >> 16) as u32;
        let expected = Self::auth_tag(&self.srtp_auth, &packet[..body_len], &roc.to_be_bytes());
        if packet[body_len..].ct_eq(&expected[..tag_len]).unwrap_u8() != 1 {
            return Err(Error::UnprotectAuthFailed);
        }
        Ok(packet[..body_len].to_vec())
    }

    fn encrypt_rtcp(&self, packet: &[u8], _ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let mut out = packet.to_vec();
        // The E-flag records whether this packet was actually encrypted
        // (spec.md §4.8); NULL never encrypts, so it stays clear even though
        // the MAC below still covers the packet.
        let e_and_index = srtcp_index & 0x7FFF_FFFF;
        out.extend_from_slice(&e_and_index.to_be_bytes());
        let tag = Self::auth_tag(&self.srtcp_auth, &out, &[]);
        out.extend_from_slice(&tag[..self.rtcp_tag_len()]);
        Ok(out)
    }

    fn decrypt_rtcp(&self, packet: &[u8], _ssrc: u32, _srtcp_index: u32) -> Result<Vec<u8>> {
        let tag_len = self.rtcp_tag_len();
        if packet.len() < 4 + tag_len {
            return Err(Error::UnprotectShortPacket(packet.len(), 4 + tag_len));
        }
        let body_len = packet.len() - tag_len;
        let expected = Self::auth_tag(&self.srtcp_auth, &packet[..body_len], &[]);
        if packet[body_len..].ct_eq(&expected[..tag_len]).unwrap_u8() != 1 {
            return Err(Error::UnprotectAuthFailed);
        }
        Ok(packet[..body_len - 4].to_vec())
    }
}
