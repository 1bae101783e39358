//! RFC 8723 "double" AEAD: an inner seal (end-to-end) nested inside an outer
//! seal (hop-by-hop), each independently keyed. The combined master
//! key/salt the context holds is `inner ‖ outer` (spec.md §4.10); this
//! module re-splits that buffer and runs two ordinary [`super::aes_gcm`]
//! ciphers, one per layer.

use super::aes_gcm::{AeadGcmCipher, AeadGcmKeyDerivation};
use super::Cipher;
use crate::error::Result;
use crate::key_derivation::{
    LABEL_SRTCP_ENCRYPTION, LABEL_SRTCP_SALT, LABEL_SRTP_ENCRYPTION, LABEL_SRTP_SALT,
};
use crate::profile::ProtectionProfile;
use ::aead::KeyInit;

pub(crate) struct DoubleAead<A> {
    inner: AeadGcmCipher<A>,
    outer: AeadGcmCipher<A>,
    inner_tag_len: usize,
    outer_tag_len: usize,
}

impl<A: KeyInit + AeadGcmKeyDerivation> DoubleAead<A> {
    pub fn new(profile: ProtectionProfile, master_key: &[u8], master_salt: &[u8], r: u64) -> Result<Self> {
        let key_half = master_key.len() / 2;
        let salt_half = master_salt.len() / 2;
        let (inner_key, outer_key) = master_key.split_at(key_half);
        let (inner_salt, outer_salt) = master_salt.split_at(salt_half);

        // Each half is itself a single-layer AEAD-GCM profile (half the
        // combined key/salt bits); the registry's combined `key_bits`/
        // `salt_bits` describe the pair, not either layer.
        let layer_profile = ProtectionProfile {
            key_bits: profile.key_bits / 2,
            salt_bits: profile.salt_bits / 2,
            auth_tag_bits: profile.auth_tag_bits / 2,
            ..profile
        };

        let inner = super::aes_gcm::derive_pair::<A>(
            layer_profile,
            inner_key,
            inner_salt,
            r,
            LABEL_SRTP_ENCRYPTION,
            LABEL_SRTCP_ENCRYPTION,
        )?;
        let outer = super::aes_gcm::derive_pair::<A>(
            layer_profile,
            outer_key,
            outer_salt,
            r,
            LABEL_SRTP_ENCRYPTION,
            LABEL_SRTCP_ENCRYPTION,
        )?;

        Ok(DoubleAead {
            inner,
            outer,
            inner_tag_len: layer_profile.auth_tag_len(),
            outer_tag_len: layer_profile.auth_tag_len(),
        })
    }
}

impl<A: ::aead::Aead + Send + Sync> Cipher for DoubleAead<A> {
    fn rtp_tag_len(&self) -> usize {
        self.inner_tag_len + self.outer_tag_len
    }

    fn rtcp_tag_len(&self) -> usize {
        self.inner_tag_len + self.outer_tag_len
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
        let inner_sealed = self.inner.encrypt_rtp(packet, header_len, ssrc, index)?;
        // `inner_sealed` is header‖inner_ct‖inner_tag; the outer layer treats
        // the whole post-header slice (inner_ct‖inner_tag) as its plaintext.
        self.outer.encrypt_rtp(&inner_sealed, header_len, ssrc, index)
    }

    fn decrypt_rtp(
        &self,
        packet: &[u8],
        header_len: usize,
        ssrc: u32,
        index: u64,
    ) -> Result<Vec<u8>> {
        let inner_sealed = self.outer.decrypt_rtp(packet, header_len, ssrc, index)?;
        self.inner.decrypt_rtp(&inner_sealed, header_len, ssrc, index)
    }

    fn encrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let inner_sealed = self.inner.encrypt_rtcp(packet, ssrc, srtcp_index)?;
        self.outer.encrypt_rtcp(&inner_sealed, ssrc, srtcp_index)
    }

    fn decrypt_rtcp(&self, packet: &[u8], ssrc: u32, srtcp_index: u32) -> Result<Vec<u8>> {
        let inner_sealed = self.outer.decrypt_rtcp(packet, ssrc, srtcp_index)?;
        self.inner.decrypt_rtcp(&inner_sealed, ssrc, srtcp_index)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key_derivation::{LABEL_SRTCP_ENCRYPTION, LABEL_SRTP_ENCRYPTION};
    use crate::profile::{self, ProtectionProfile};

    fn rtp_like_packet(header_len: usize, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; header_len];
        out[0] = 0x80;
        out.extend_from_slice(payload);
        out
    }

    // spec.md §8 S5: a 20-byte payload over a 12-byte header expands to
    // 12 + 20 + 16 + 16 = 64 bytes (two independent GCM tags).
    #[test]
    fn s5_round_trip_lengths_match_worked_example() {
        let profile = profile::DOUBLE_AEAD_AES_128_GCM_AEAD_AES_128_GCM;
        let key = vec![0xABu8; 32];
        let salt = vec![0xCDu8; 24];
        let cipher =
            DoubleAead::<super::super::aes_gcm::Aes128Gcm>::new(profile, &key, &salt, 0).unwrap();

        let packet = rtp_like_packet(12, &[0u8; 20]);
        let sealed = cipher.encrypt_rtp(&packet, 12, 0xCAFEBABE, 0x1234).unwrap();
        assert_eq!(sealed.len(), 12 + 20 + 16 + 16);

        let opened = cipher.decrypt_rtp(&sealed, 12, 0xCAFEBABE, 0x1234).unwrap();
        assert_eq!(&opened[12..], &[0u8; 20][..]);
    }

    // spec.md §8 round-trip law: decrypting with only the outer keys must
    // yield the inner ciphertext verbatim.
    #[test]
    fn outer_layer_alone_exposes_inner_ciphertext_verbatim() {
        let profile = profile::DOUBLE_AEAD_AES_128_GCM_AEAD_AES_128_GCM;
        let key = vec![0xABu8; 32];
        let salt = vec![0xCDu8; 24];
        let key_half = key.len() / 2;
        let salt_half = salt.len() / 2;
        let (inner_key, outer_key) = key.split_at(key_half);
        let (inner_salt, outer_salt) = salt.split_at(salt_half);

        let layer_profile = ProtectionProfile {
            key_bits: profile.key_bits / 2,
            salt_bits: profile.salt_bits / 2,
            auth_tag_bits: profile.auth_tag_bits / 2,
            ..profile
        };
        let inner = super::super::aes_gcm::derive_pair::<super::super::aes_gcm::Aes128Gcm>(
            layer_profile,
            inner_key,
            inner_salt,
            0,
            LABEL_SRTP_ENCRYPTION,
            LABEL_SRTCP_ENCRYPTION,
        )
        .unwrap();
        let outer = super::super::aes_gcm::derive_pair::<super::super::aes_gcm::Aes128Gcm>(
            layer_profile,
            outer_key,
            outer_salt,
            0,
            LABEL_SRTP_ENCRYPTION,
            LABEL_SRTCP_ENCRYPTION,
        )
        .unwrap();

        let packet = rtp_like_packet(12, &[0u8; 20]);
        let inner_sealed = inner.encrypt_rtp(&packet, 12, 0xCAFEBABE, 0x1234).unwrap();
        let double =
            DoubleAead::<super::super::aes_gcm::Aes128Gcm>::new(profile, &key, &salt, 0).unwrap();
        let double_sealed = double.encrypt_rtp(&packet, 12, 0xCAFEBABE, 0x1234).unwrap();

        let outer_opened = outer.decrypt_rtp(&double_sealed, 12, 0xCAFEBABE, 0x1234).unwrap();
        assert_eq!(outer_opened, inner_sealed);
    }
}
