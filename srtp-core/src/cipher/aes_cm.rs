//! AES-CM / ARIA-CM (RFC 3711 §4.1.1, RFC 8269): CTR-mode keystream plus an
//! HMAC-SHA1 tag over `packet ‖ ROC` (RTP) or `packet ‖ E‖index` (RTCP).
//! Generic over the block cipher `C` so the same code serves both the
//! 128/256-bit AES profiles and their ARIA counterparts — RFC 8269 reuses
//! RFC 3711's construction verbatim with ARIA substituted for AES.

use cipher::{BlockEncrypt, KeyInit, KeyIvInit, StreamCipher, StreamCipherSeek};
use generic_array::GenericArray;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use super::Cipher;
use crate::error::{Error, Result};
use crate::iv;
use crate::key_derivation::{self, LABEL_SRTCP_ENCRYPTION, LABEL_SRTP_ENCRYPTION};
use crate::profile::ProtectionProfile;

type HmacSha1 = Hmac<Sha1>;

pub(crate) struct CmCipher<C> {
    profile: ProtectionProfile,
    srtp_key: Vec<u8>,
    srtp_salt: Vec<u8>,
    srtp_auth: HmacSha1,
    srtcp_key: Vec<u8>,
    srtcp_salt: Vec<u8>,
    srtcp_auth: HmacSha1,
    _cipher: std::marker::PhantomData<C>,
}

impl<C: KeyInit + BlockEncrypt + 'static> CmCipher<C> {
    /// `r = index DIV KDR` (`0` when the profile never re-derives). The
    /// caller re-runs `new` whenever `r` changes for the profile's KDR
    /// (spec.md §4.2 "session keys are cached and invalidated").
    pub fn new(profile: ProtectionProfile, master_key: &[u8], master_salt: &[u8], r: u64) -> Result<Self> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();
        let srtp_key = key_derivation::derive::<C>(
            master_key,
            master_salt,
            LABEL_SRTP_ENCRYPTION,
            r,
            key_len,
        )?;
        let srtp_salt = key_derivation::derive::<C>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTP_SALT,
            r,
            salt_len,
        )?;
        let srtp_auth_key = key_derivation::derive::<C>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTP_AUTHENTICATION_TAG,
            r,
            profile.auth_key_len(),
        )?;
        let srtcp_key = key_derivation::derive::<C>(
            master_key,
            master_salt,
            LABEL_SRTCP_ENCRYPTION,
            r,
            key_len,
        )?;
        let srtcp_salt = key_derivation::derive::<C>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTCP_SALT,
            r,
            salt_len,
        )?;
        let srtcp_auth_key = key_derivation::derive::<C>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTCP_AUTHENTICATION_TAG,
            r,
            profile.auth_key_len(),
        )?;

        let srtp_auth =
            HmacSha1::new_from_slice(&srtp_auth_key).map_err(|e| Error::Other(e.to_string()))?;
        let srtcp_auth =
            HmacSha1::new_from_slice(&srtcp_auth_key).map_err(|e| Error::Other(e.to_string()))?;

        Ok(CmCipher {
            profile,
            srtp_key,
            srtp_salt,
            srtp_auth,
            srtcp_key,
            srtcp_salt,
            srtcp_auth,
            _cipher: std::marker::PhantomData,
        })
    }

    fn keystream_apply(key: &[u8], iv16: &[u8; 16], buf: &mut [u8]) {
        type Ctr<C> = ctr::Ctr128BE<C>;
        let key = GenericArray::<u8, _>::from_slice(key);
        let nonce = GenericArray::from_slice(iv16.as_slice());
        let mut stream = Ctr::<C>::new(key, nonce);
        stream.seek(0u64);
        stream.apply_keystream(buf);
    }

    fn auth_tag(signer: &HmacSha1, buf: &[u8], trailer: &[u8]) -> Vec<u8> {
        let mut signer = signer.clone();
        signer.update(buf);
        signer.update(trailer);
        signer.finalize().into_bytes().to_vec()
    }
}

impl<C: KeyInit + BlockEncrypt + 'static> Cipher for CmCipher<C> {
    fn rtp_tag_len(&self) -> usize {
        self.profile.auth_tag_len()
    }

    fn rtcp_tag_len(&self) -> usize {
        self.profile.auth_tag_len()
    }

    fn encrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let mut out = packet.to_vec();
        let iv16 = iv::aes_cm_rtp(&self.srtp_salt, ssrc, index);
        Self::keystream_apply(&self.srtp_key, &iv16, &mut out[header_len..]);

        let roc = (index >> 16) as u32;
        let tag = Self::auth_tag(&self.srtp_auth, &out, &roc.to_be_bytes());
        out.extend_from_slice(&tag[..self.rtp_tag_len()]);
        Ok(out)
    }

    fn decrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let tag_len = self.rtp_tag_len();
        if packet.len() < header_len + tag_len {
            return Err(Error::UnprotectShortPacket(packet.len(), header_len + tag_len));
        }
        let body_len = packet.len() - tag_len;
        let roc = (index >> 16) as u32;
        let expected = Self::auth_tag(&self.srtp_auth, &packet[..body_len], &roc.to_be_bytes());
        if packet[body_len..].ct_eq(&expected[..tag_len]).unwrap_u8() != 1 {
            return Err(Error::UnprotectAuthFailed);
        }

        let mut out = packet[..body_len].to_vec();
        let iv16 = iv::aes_cm_rtp(&self.srtp_salt, ssrc, index);
        Self::keystream_apply(&self.srtp_key, &iv16, &mut out[header_len..]);
        Ok(out)
    }

    fn encrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let mut out = packet.to_vec();
        let iv16 = iv::aes_cm_rtcp(&self.srtcp_salt, ssrc, srtcp_index);
        Self::keystream_apply(&self.srtcp_key, &iv16, &mut out[8..]);

        let e_and_index = srtcp_index | (1 << 31);
        out.extend_from_slice(&e_and_index.to_be_bytes());

        let tag = Self::auth_tag(&self.srtcp_auth, &out, &[]);
        out.extend_from_slice(&tag[..self.rtcp_tag_len()]);
        Ok(out)
    }

    fn decrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let tag_len = self.rtcp_tag_len();
        if packet.len() < 8 + 4 + tag_len {
            return Err(Error::UnprotectShortPacket(packet.len(), 8 + 4 + tag_len));
        }
        let body_len = packet.len() - tag_len;
        let expected = Self::auth_tag(&self.srtcp_auth, &packet[..body_len], &[]);
        if packet[body_len..].ct_eq(&expected[..tag_len]).unwrap_u8() != 1 {
            return Err(Error::UnprotectAuthFailed);
        }

        let cipher_end = body_len - 4;
        let mut out = packet[..cipher_end].to_vec();
        let iv16 = iv::aes_cm_rtcp(&self.srtcp_salt, ssrc, srtcp_index);
        Self::keystream_apply(&self.srtcp_key, &iv16, &mut out[8..]);
        Ok(out)
    }
}
