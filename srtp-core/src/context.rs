//! C7/C8's leaf: per-direction, per-SSRC protect/unprotect state. [`SrtpContext`]
//! covers RTP's ROC+SEQ reconstruction (spec.md §4.7); [`SrtcpContext`] covers
//! RTCP's explicit 31-bit index plus E-flag (spec.md §4.8). Both share the
//! cipher/replay-window/key-derivation machinery but differ in how the
//! packet index is produced and committed.

use subtle::ConstantTimeEq;

use crate::cipher::{self, Cipher};
use crate::error::{Error, Result};
use crate::key_derivation;
use crate::profile::ProtectionProfile;
use crate::roc::RocTracker;
use webrtc_util::marshal::Unmarshal;
use webrtc_util::replay_detector::{NoOpReplayDetector, ReplayDetector, SlidingWindowDetector};

const MAX_SRTP_INDEX: u64 = (1u64 << 48) - 1;
const MAX_SRTCP_INDEX: u32 = (1u32 << 31) - 1;

/// Per-SSRC RTP protection state (spec.md §3 "SRTP Context").
pub struct SrtpContext {
    profile: ProtectionProfile,
    master_key: Vec<u8>,
    master_salt: Vec<u8>,
    mki: Option<Vec<u8>>,
    roc: RocTracker,
    replay: Box<dyn ReplayDetector>,
    cipher: Box<dyn Cipher>,
    cached_r: u64,
}

impl SrtpContext {
    pub fn new(
        profile: ProtectionProfile,
        master_key: Vec<u8>,
        master_salt: Vec<u8>,
        mki: Option<Vec<u8>>,
        replay_protected: bool,
    ) -> Result<Self> {
        if master_key.len() != profile.key_len() {
            return Err(Error::MasterKeyLength(profile.key_len(), master_key.len()));
        }
        if master_salt.len() != profile.salt_len() {
            return Err(Error::MasterSaltLength(profile.salt_len(), master_salt.len()));
        }
        let cipher = cipher::build(&profile, &master_key, &master_salt, 0)?;
        let replay: Box<dyn ReplayDetector> = if replay_protected {
            Box::new(SlidingWindowDetector::new(MAX_SRTP_INDEX))
        } else {
            Box::new(NoOpReplayDetector::new())
        };
        Ok(SrtpContext {
            profile,
            master_key,
            master_salt,
            mki,
            roc: RocTracker::new(),
            replay,
            cipher,
            cached_r: 0,
        })
    }

    /// Re-derives session keys when `i DIV KDR` has moved past the
    /// generation the cached cipher was built for (spec.md §4.2).
    fn rekey_for_index(&mut self, index: u64) -> Result<()> {
        let r = key_derivation::index_over_kdr(index, self.profile.kdr)?;
        if r != self.cached_r {
            self.cipher = cipher::build(&self.profile, &self.master_key, &self.master_salt, r)?;
            self.cached_r = r;
        }
        Ok(())
    }

    fn append_mki(&self, out: &mut Vec<u8>, tag: &[u8]) {
        if let Some(mki) = &self.mki {
            out.extend_from_slice(mki);
        }
        out.extend_from_slice(tag);
    }

    /// `packet` is a plaintext RTP packet; returns the SRTP wire form.
    pub fn protect_rtp(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        let header = rtp::header::Header::unmarshal(packet)
            .map_err(|e| Error::Other(e.to_string()))?;
        let header_len = header_len(packet, &header)?;

        let estimate = self.roc.estimate(header.sequence_number);
        if estimate.index > MAX_SRTP_INDEX {
            return Err(Error::ProtectIndexExhausted);
        }
        self.rekey_for_index(estimate.index)?;

        // The cipher returns header‖ciphertext‖tag; MKI, if configured, is
        // inserted between ciphertext and tag (spec.md §4.7 step 5/6).
        let sealed = self
            .cipher
            .encrypt_rtp(packet, header_len, header.ssrc, estimate.index)?;
        let tag_len = self.cipher.rtp_tag_len();
        let (ciphertext, tag) = sealed.split_at(sealed.len() - tag_len);

        let mut out = Vec::with_capacity(ciphertext.len() + self.mki_len() + tag_len);
        out.extend_from_slice(ciphertext);
        self.append_mki(&mut out, tag);

        self.roc.accept(header.sequence_number, estimate.v);
        Ok(out)
    }

    /// `packet` is an SRTP wire packet; returns the decrypted RTP packet.
    pub fn unprotect_rtp(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        let header = rtp::header::Header::unmarshal(packet)
            .map_err(|e| Error::Other(e.to_string()))?;
        let header_len = header_len(packet, &header)?;
        let tag_len = self.cipher.rtp_tag_len();
        let mki_len = self.mki_len();
        if packet.len() < header_len + mki_len + tag_len {
            return Err(Error::UnprotectShortPacket(
                packet.len(),
                header_len + mki_len + tag_len,
            ));
        }

        if let Some(expected) = &self.mki {
            let mki_start = packet.len() - tag_len - mki_len;
            let presented = &packet[mki_start..mki_start + mki_len];
            if presented.ct_eq(expected).unwrap_u8() != 1 {
                return Err(Error::UnprotectBadMki);
            }
        }

        let estimate = self.roc.estimate(header.sequence_number);
        if !self.replay.check(estimate.index) {
            return Err(if estimate.index + 64 <= self.roc_window_top() {
                Error::UnprotectTooOld(estimate.index)
            } else {
                Error::UnprotectReplay(estimate.index)
            });
        }

        self.rekey_for_index(estimate.index)?;

        // Strip MKI before handing the packet to the cipher, which expects
        // header‖ciphertext‖tag.
        let without_mki: Vec<u8>;
        let cipher_input: &[u8] = if mki_len == 0 {
            packet
        } else {
            let ciphertext_end = packet.len() - mki_len - tag_len;
            let tag_start = packet.len() - tag_len;
            without_mki = [&packet[..ciphertext_end], &packet[tag_start..]].concat();
            &without_mki
        };

        let plaintext = self
            .cipher
            .decrypt_rtp(cipher_input, header_len, header.ssrc, estimate.index)?;

        self.replay.accept();
        self.roc.accept(header.sequence_number, estimate.v);
        Ok(plaintext)
    }

    fn mki_len(&self) -> usize {
        self.mki.as_ref().map_or(0, |m| m.len())
    }

    fn roc_window_top(&self) -> u64 {
        // Best-effort bound used only to classify Replay vs TooOld for the
        // caller; the replay detector itself is the source of truth for
        // acceptance.
        (self.roc.roc as u64) * (1 << 16) + self.roc.s_l as u64
    }
}

/// Per-SSRC RTCP protection state (spec.md §3 "SRTCP Context", §4.8).
pub struct SrtcpContext {
    profile: ProtectionProfile,
    master_key: Vec<u8>,
    master_salt: Vec<u8>,
    mki: Option<Vec<u8>>,
    next_index: u32,
    last_received: Option<u32>,
    replay: Box<dyn ReplayDetector>,
    cipher: Box<dyn Cipher>,
    cached_r: u64,
}

impl SrtcpContext {
    pub fn new(
        profile: ProtectionProfile,
        master_key: Vec<u8>,
        master_salt: Vec<u8>,
        mki: Option<Vec<u8>>,
        replay_protected: bool,
    ) -> Result<Self> {
        if master_key.len() != profile.key_len() {
            return Err(Error::MasterKeyLength(profile.key_len(), master_key.len()));
        }
        if master_salt.len() != profile.salt_len() {
            return Err(Error::MasterSaltLength(profile.salt_len(), master_salt.len()));
        }
        let cipher = cipher::build(&profile, &master_key, &master_salt, 0)?;
        let replay: Box<dyn ReplayDetector> = if replay_protected {
            Box::new(SlidingWindowDetector::new(MAX_SRTCP_INDEX as u64))
        } else {
            Box::new(NoOpReplayDetector::new())
        };
        Ok(SrtcpContext {
            profile,
            master_key,
            master_salt,
            mki,
            next_index: 0,
            last_received: None,
            replay,
            cipher,
            cached_r: 0,
        })
    }

    fn rekey_for_index(&mut self, index: u32) -> Result<()> {
        let r = key_derivation::index_over_kdr(index as u64, self.profile.kdr)?;
        if r != self.cached_r {
            self.cipher = cipher::build(&self.profile, &self.master_key, &self.master_salt, r)?;
            self.cached_r = r;
        }
        Ok(())
    }

    fn mki_len(&self) -> usize {
        self.mki.as_ref().map_or(0, |m| m.len())
    }

    /// `packet` is a plaintext RTCP packet (first 8 bytes V/P/RC/PT/length/
    /// sender-SSRC). Index is incremented monotonically per sent packet.
    pub fn protect_rtcp(&mut self, packet: &[u8], ssrc: u32) -> Result<Vec<u8>> {
        if packet.len() < 8 {
            return Err(Error::UnprotectShortPacket(packet.len(), 8));
        }
        if self.next_index as u64 > MAX_SRTCP_INDEX as u64 {
            return Err(Error::ProtectIndexExhausted);
        }
        let index = self.next_index;
        self.rekey_for_index(index)?;

        let sealed = self.cipher.encrypt_rtcp(packet, ssrc, index)?;
        let trails = self.cipher.rtcp_index_trails_tag();

        let mut out = Vec::with_capacity(sealed.len() + self.mki_len());
        if trails {
            // AEAD families: `sealed` is ciphertext (tag embedded) ‖ index;
            // there is no separate trailing tag field, so MKI is the last
            // thing on the wire.
            out.extend_from_slice(&sealed);
            if let Some(mki) = &self.mki {
                out.extend_from_slice(mki);
            }
        } else {
            // Block-cipher families: `sealed` is ciphertext ‖ index ‖ tag;
            // MKI sits between the index and the tag (spec.md §6).
            let tag_len = self.cipher.rtcp_tag_len();
            let (body, tag) = sealed.split_at(sealed.len() - tag_len);
            out.extend_from_slice(body);
            if let Some(mki) = &self.mki {
                out.extend_from_slice(mki);
            }
            out.extend_from_slice(tag);
        }

        self.next_index = self.next_index.wrapping_add(1);
        Ok(out)
    }

    /// `packet` is the full wire SRTCP packet, trailer and tag included.
    pub fn unprotect_rtcp(&mut self, packet: &[u8], ssrc: u32) -> Result<Vec<u8>> {
        let trails = self.cipher.rtcp_index_trails_tag();
        let tag_len = self.cipher.rtcp_tag_len();
        let mki_len = self.mki_len();
        let min_len = if trails {
            8 + 4 + mki_len
        } else {
            8 + 4 + mki_len + tag_len
        };
        if packet.len() < min_len {
            return Err(Error::UnprotectShortPacket(packet.len(), min_len));
        }

        if let Some(expected) = &self.mki {
            let mki_start = if trails {
                packet.len() - mki_len
            } else {
                packet.len() - tag_len - mki_len
            };
            let presented = &packet[mki_start..mki_start + mki_len];
            if presented.ct_eq(expected).unwrap_u8() != 1 {
                return Err(Error::UnprotectBadMki);
            }
        }

        let trailer_start = if trails {
            packet.len() - mki_len - 4
        } else {
            packet.len() - tag_len - mki_len - 4
        };
        let e_and_index = u32::from_be_bytes(
            packet[trailer_start..trailer_start + 4]
                .try_into()
                .unwrap(),
        );
        let index = e_and_index & MAX_SRTCP_INDEX;

        if let Some(last) = self.last_received {
            if index <= last {
                return Err(Error::UnprotectReplay(index as u64));
            }
        }
        if !self.replay.check(index as u64) {
            return Err(Error::UnprotectReplay(index as u64));
        }

        self.rekey_for_index(index)?;

        let wire = if trails {
            // Strip the trailing MKI; index stays as the packet's last 4
            // bytes, matching what the AEAD cipher's encrypt_rtcp produced.
            packet[..trailer_start + 4].to_vec()
        } else {
            let body_end = packet.len() - mki_len - tag_len;
            let mut wire = packet[..trailer_start].to_vec();
            wire.extend_from_slice(&packet[trailer_start..body_end]);
            wire.extend_from_slice(&packet[packet.len() - tag_len..]);
            wire
        };

        let plaintext = self.cipher.decrypt_rtcp(&wire, ssrc, index)?;

        self.replay.accept();
        self.last_received = Some(index);
        Ok(plaintext)
    }
}

/// The RTP header's wire length, including CSRCs and extensions, used as
/// the unencrypted-prefix/AAD boundary (spec.md §4.7).
fn header_len(packet: &[u8], header: &rtp::header::Header) -> Result<usize> {
    use webrtc_util::marshal::MarshalSize;
    let len = header.marshal_size();
    if packet.len() < len {
        return Err(Error::UnprotectShortPacket(packet.len(), len));
    }
    Ok(len)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::profile;
    use bytes::Bytes;
    use webrtc_util::marshal::Marshal;

    fn s1_header() -> rtp::header::Header {
        rtp::header::Header {
            version: 2,
            payload_type: 100,
            sequence_number: 0x1234,
            timestamp: 0xDEADBEEF,
            ssrc: 0xCAFEBABE,
            ..Default::default()
        }
    }

    fn rtp_packet(seq: u16, payload: &[u8]) -> Vec<u8> {
        let header = rtp::header::Header {
            sequence_number: seq,
            ..s1_header()
        };
        let mut out = header.marshal().unwrap();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn s1_aes128_cm_round_trip_lengths_and_state() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 14];
        let mut enc = SrtpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();
        let mut dec = SrtpContext::new(profile, key, salt, None, true).unwrap();

        let packet = rtp_packet(0x1234, b"hello");
        let srtp = enc.protect_rtp(&packet).unwrap();
        assert_eq!(srtp.len(), 12 + 5 + 10);

        let plain = dec.unprotect_rtp(&srtp).unwrap();
        assert_eq!(&plain[12..], b"hello");
        assert_eq!(dec.roc.s_l, 0x1234);
        assert_eq!(dec.roc.roc, 0);
    }

    #[test]
    fn s2_aead_round_trip_and_wrong_salt_fails() {
        let profile = profile::AEAD_AES_128_GCM;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 12];
        let mut enc = SrtpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();
        let mut dec = SrtpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();

        let packet = rtp_packet(0x1234, b"hello");
        let srtp = enc.protect_rtp(&packet).unwrap();
        assert_eq!(srtp.len(), 12 + 5 + 16);
        assert_eq!(dec.unprotect_rtp(&srtp).unwrap()[12..], *b"hello");

        let mut bad_salt = salt;
        bad_salt[0] ^= 1;
        let mut bad_dec = SrtpContext::new(profile, key, bad_salt, None, true).unwrap();
        assert_eq!(
            bad_dec.unprotect_rtp(&srtp).unwrap_err(),
            Error::UnprotectAuthFailed
        );
    }

    #[test]
    fn s3_seq_rollover_advances_roc_once() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 14];
        let mut enc = SrtpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();
        let mut dec = SrtpContext::new(profile, key, salt, None, true).unwrap();

        let mut indices = vec![];
        for seq in [0xFFFEu16, 0xFFFF, 0x0000, 0x0001] {
            let packet = rtp_packet(seq, b"x");
            let srtp = enc.protect_rtp(&packet).unwrap();
            dec.unprotect_rtp(&srtp).unwrap();
            indices.push(dec.roc_window_top());
        }
        assert_eq!(enc.roc.roc, 1);
        assert_eq!(indices, vec![0xFFFE, 0xFFFF, 0x10000, 0x10001]);
    }

    #[test]
    fn s4_replay_is_rejected_and_state_unchanged() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 14];
        let mut enc = SrtpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();
        let mut dec = SrtpContext::new(profile, key, salt, None, true).unwrap();

        let packet = rtp_packet(100, b"x");
        let srtp = enc.protect_rtp(&packet).unwrap();
        dec.unprotect_rtp(&srtp).unwrap();
        assert_eq!(dec.roc.s_l, 100);

        let err = dec.unprotect_rtp(&srtp).unwrap_err();
        assert!(matches!(err, Error::UnprotectReplay(_)));
        assert_eq!(dec.roc.s_l, 100);
    }

    // spec.md §8 KDR boundary: the packet at index k*KDR uses a freshly
    // derived generation; the packet at k*KDR - 1 still uses the previous
    // one.
    #[test]
    fn kdr_boundary_rekeys_exactly_at_multiples_of_kdr() {
        let mut profile = profile::AES128_CM_HMAC_SHA1_80;
        profile.kdr = 4;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 14];
        let mut enc = SrtpContext::new(profile, key, salt, None, true).unwrap();

        for seq in 0..4u16 {
            enc.protect_rtp(&rtp_packet(seq, b"x")).unwrap();
            assert_eq!(enc.cached_r, 0, "index {seq} is still generation 0");
        }
        enc.protect_rtp(&rtp_packet(4, b"x")).unwrap();
        assert_eq!(enc.cached_r, 1, "index 4 == 1*KDR rolls to generation 1");
    }

    #[test]
    fn mki_mismatch_is_rejected() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 14];
        let mut enc =
            SrtpContext::new(profile, key.clone(), salt.clone(), Some(vec![1, 2, 3, 4]), true)
                .unwrap();
        let mut dec =
            SrtpContext::new(profile, key, salt, Some(vec![9, 9, 9, 9]), true).unwrap();

        let packet = rtp_packet(1, b"x");
        let srtp = enc.protect_rtp(&packet).unwrap();
        assert_eq!(
            dec.unprotect_rtp(&srtp).unwrap_err(),
            Error::UnprotectBadMki
        );
    }

    #[test]
    fn srtcp_round_trip_and_strict_monotonic_replay() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 14];
        let mut enc = SrtcpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();
        let mut dec = SrtcpContext::new(profile, key, salt, None, true).unwrap();

        let mut rtcp = vec![0x80, 200, 0, 1];
        rtcp.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        rtcp.extend_from_slice(b"report");

        let wire = enc.protect_rtcp(&rtcp, 0xCAFEBABE).unwrap();
        let plain = dec.unprotect_rtcp(&wire, 0xCAFEBABE).unwrap();
        assert_eq!(&plain[8..], b"report");

        let err = dec.unprotect_rtcp(&wire, 0xCAFEBABE).unwrap_err();
        assert!(matches!(err, Error::UnprotectReplay(_)));
        let _ = Bytes::new();
    }

    // AEAD families embed their tag in the ciphertext and put `E‖index`
    // after it rather than before a separate trailing tag (RFC 7714 §9.1) —
    // a distinct wire layout from the HMAC families above.
    #[test]
    fn srtcp_round_trip_aead_aes_128_gcm() {
        let profile = profile::AEAD_AES_128_GCM;
        let key = vec![0x0Bu8; 16];
        let salt = vec![0x0Eu8; 12];
        let mut enc = SrtcpContext::new(profile, key.clone(), salt.clone(), None, true).unwrap();
        let mut dec = SrtcpContext::new(profile, key, salt, None, true).unwrap();

        let mut rtcp = vec![0x80, 200, 0, 1];
        rtcp.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        rtcp.extend_from_slice(b"report");

        let wire = enc.protect_rtcp(&rtcp, 0xCAFEBABE).unwrap();
        assert_eq!(wire.len(), 8 + 6 + 16 + 4);
        let plain = dec.unprotect_rtcp(&wire, 0xCAFEBABE).unwrap();
        assert_eq!(&plain[8..], b"report");

        let err = dec.unprotect_rtcp(&wire, 0xCAFEBABE).unwrap_err();
        assert!(matches!(err, Error::UnprotectReplay(_)));
    }
}
