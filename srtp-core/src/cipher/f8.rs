//! AES-f8 (RFC 3711 §4.1.2). Unlike CM, f8 feeds its own output back into
//! the next block: `S(-1) = 0`, `S(j) = E_{k_e}(IV' XOR j XOR S(j-1))`, where
//! `IV'` is `IV` re-encrypted under a key masked with the salt (spec.md
//! §4.3). There is no RTC-registered f8 profile ID — it predates
//! `use_srtp` — so this cipher is only reachable by constructing a
//! [`crate::profile::ProtectionProfile`] with `cipher: F8Aes128` directly.

use cipher::{BlockEncrypt, KeyInit};
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
type Aes128 = aes::Aes128;

pub(crate) struct F8Cipher {
    profile: ProtectionProfile,
    srtp_key: Vec<u8>,
    srtp_salt: Vec<u8>,
    srtp_auth: HmacSha1,
    srtcp_key: Vec<u8>,
    srtcp_salt: Vec<u8>,
    srtcp_auth: HmacSha1,
}

impl F8Cipher {
    pub fn new(profile: ProtectionProfile, master_key: &[u8], master_salt: &[u8], r: u64) -> Result<Self> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();
        let srtp_key = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            LABEL_SRTP_ENCRYPTION,
            r,
            key_len,
        )?;
        let srtp_salt = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTP_SALT,
            r,
            salt_len,
        )?;
        let srtp_auth_key = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTP_AUTHENTICATION_TAG,
            r,
            profile.auth_key_len(),
        )?;
        let srtcp_key = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            LABEL_SRTCP_ENCRYPTION,
            r,
            key_len,
        )?;
        let srtcp_salt = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTCP_SALT,
            r,
            salt_len,
        )?;
        let srtcp_auth_key = key_derivation::derive::<Aes128>(
            master_key,
            master_salt,
            key_derivation::LABEL_SRTCP_AUTHENTICATION_TAG,
            r,
            profile.auth_key_len(),
        )?;

        Ok(F8Cipher {
            profile,
            srtp_auth: HmacSha1::new_from_slice(&srtp_auth_key)
                .map_err(|e| Error::Other(e.to_string()))?,
            srtcp_auth: HmacSha1::new_from_slice(&srtcp_auth_key)
                .map_err(|e| Error::Other(e.to_string()))?,
            srtp_key,
            srtp_salt,
            srtcp_key,
            srtcp_salt,
        })
    }

    /// `IV' = E_{k_e XOR (k_s ‖ 0x55..55)}(IV)`.
    fn masked_iv(session_key: &[u8], session_salt: &[u8], iv_pre: &[u8; 16]) -> [u8; 16] {
        let mut masked_key = [0u8; 16];
        masked_key.copy_from_slice(&session_key[..16]);
        for (i, b) in masked_key.iter_mut().enumerate() {
            let salt_byte = session_salt.get(i).copied().unwrap_or(0x55);
            *b ^= if i < session_salt.len() {
                salt_byte
            } else {
                0x55
            };
        }
        let cipher = Aes128::new_from_slice(&masked_key).expect("16-byte key");
        let mut block = GenericArray::clone_from_slice(iv_pre.as_slice());
        cipher.encrypt_block(&mut block);
        let mut out = [0u8; 16];
        out.copy_from_slice(&block);
        out
    }

    fn apply_f8(session_key: &[u8], iv_prime: &[u8; 16], buf: &mut [u8]) {
        let cipher = Aes128::new_from_slice(session_key).expect("16-byte key");
        let mut prev = [0u8; 16];
        let mut j: u32 = 0;
        for chunk in buf.chunks_mut(16) {
            let mut block = [0u8; 16];
            block.copy_from_slice(iv_prime);
            for (b, p) in block.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            let j_bytes = j.to_be_bytes();
            for i in 0..4 {
                block[12 + i] ^= j_bytes[i];
            }
            let mut ga = GenericArray::clone_from_slice(&block);
            cipher.encrypt_block(&mut ga);
            prev.copy_from_slice(&ga);
            for (b, k) in chunk.iter_mut().zip(ga.iter()) {
                *b ^= k;
            }
            j += 1;
        }
    }

    fn auth_tag(signer: &HmacSha1, buf: &[u8], trailer: &[u8]) -> Vec<u8> {
        let mut signer = signer.clone();
        signer.update(buf);
        signer.update(trailer);
        signer.finalize().into_bytes().to_vec()
    }
}

impl Cipher for F8Cipher {
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
        _ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let roc = (index >> 16) as u32;
        let mut out = packet.to_vec();
        let iv_pre = iv::f8_rtp_pre(&packet[..header_len.max(12)], roc);
        let iv_prime = Self::masked_iv(&self.srtp_key, &self.srtp_salt, &iv_pre);
        Self::apply_f8(&self.srtp_key, &iv_prime, &mut out[header_len..]);

        let tag = Self::auth_tag(&self.srtp_auth, &out, &roc.to_be_bytes());
        out.extend_from_slice(&tag[..self.rtp_tag_len()]);
        Ok(out)
    }

    fn decrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        _ssrc: u32,
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
        let iv_pre = iv::f8_rtp_pre(&packet[..header_len.max(12)], roc);
        let iv_prime = Self::masked_iv(&self.srtp_key, &self.srtp_salt, &iv_pre);
        Self::apply_f8(&self.srtp_key, &iv_prime, &mut out[header_len..]);
        Ok(out)
    }

    fn encrypt_rtcp(&self, packet: &[u8], _ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let e_and_index = srtcp_index | (1 << 31);
        let mut out = packet.to_vec();
        let iv_pre = iv::f8_rtcp_pre(&packet[..8], e_and_index);
        let iv_prime = Self::masked_iv(&self.srtcp_key, &self.srtcp_salt, &iv_pre);
        Self::apply_f8(&self.srtcp_key, &iv_prime, &mut out[8..]);

        out.extend_from_slice(&e_and_index.to_be_bytes());
        let tag = Self::auth_tag(&self.srtcp_auth, &out, &[]);
        out.extend_from_slice(&tag[..self.rtcp_tag_len()]);
        Ok(out)
    }

    fn decrypt_rtcp(&self, packet: &[u8], _ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let tag_len = self.rtcp_tag_len();
        if packet.len() < 8 + 4 + tag_len {
            return Err(Error::UnprotectShortPacket(packet.len(), 8 + 4 + tag_len));
        }
        let body_len = packet.len() - tag_len;
        let expected = Self::auth_tag(&self.srtcp_auth, &packet[..body_len], &[]);
        if packet[body_len..].ct_eq(&expected[..tag_len]).unwrap_u8() != 1 {
            return Err(Error::UnprotectAuthFailed);
        }

        let e_and_index = srtcp_index | (1 << 31);
        let cipher_end = body_len - 4;
        let mut out = packet[..cipher_end].to_vec();
        let iv_pre = iv::f8_rtcp_pre(&packet[..8], e_and_index);
        let iv_prime = Self::masked_iv(&self.srtcp_key, &self.srtcp_salt, &iv_pre);
        Self::apply_f8(&self.srtcp_key, &iv_prime, &mut out[8..]);
        Ok(out)
    }
}
