//! C3 — per-profile IV/nonce construction for RTP and RTCP. Each builder
//! takes the session salt already derived by [`crate::key_derivation`] and
//! the packet's SSRC/index, and produces the bytes a cipher primitive keys
//! its keystream or nonce from (RFC 3711 §4.1.1 for AES-CM, §4.1.2 for f8,
//! RFC 7714 §8.1/§9.1 for AES-GCM).

/// AES-CM IV (RTP): 128-bit IV = `(salt ‖ 0x0000) XOR (0 ‖ SSRC ‖ index ‖ 0x0000)`.
/// `index` is the 48-bit rollover-adjusted sequence index.
pub fn aes_cm_rtp(session_salt: &[u8], ssrc: u32, index: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[4..8].copy_from_slice(&ssrc.to_be_bytes());
    iv[8..14].copy_from_slice(&index.to_be_bytes()[2..]);
    for (i, s) in session_salt.iter().enumerate() {
        iv[i] ^= s;
    }
    iv
}

/// AES-CM IV (RTCP): identical structure with the explicit 31-bit SRTCP
/// index in place of the RTP index.
pub fn aes_cm_rtcp(session_salt: &[u8], ssrc: u32, srtcp_index: u32) -> [u8; 16] {
    aes_cm_rtp(session_salt, ssrc, srtcp_index as u64)
}

/// f8 IV (RTP), pre-`E()` form: byte 0 zero; bytes 1..=11 copied from the RTP
/// header's M+PT+SEQ+TS+SSRC octets; bytes 12..=15 the big-endian ROC. The
/// caller applies the key-mix/encrypt step (RFC 3711 §4.1.2 step (b)).
pub fn f8_rtp_pre(header_bytes: &[u8], roc: u32) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[1..12].copy_from_slice(&header_bytes[1..12]);
    iv[12..16].copy_from_slice(&roc.to_be_bytes());
    iv
}

/// f8 IV (RTCP), pre-`E()` form: first 4 bytes zero; bytes 4..=7 the
/// E-flag+31-bit SRTCP index big-endian; bytes 8..=15 the first 8 octets of
/// the RTCP packet (V+P+RC+PT+length+SSRC).
pub fn f8_rtcp_pre(rtcp_header_bytes: &[u8], e_and_index: u32) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[4..8].copy_from_slice(&e_and_index.to_be_bytes());
    iv[8..16].copy_from_slice(&rtcp_header_bytes[0..8]);
    iv
}

/// AEAD nonce (12 bytes, RFC 7714 §8.1): `salt` XORed with
/// `0x0000 ‖ SSRC (4B) ‖ index (6B)`, all left-aligned/big-endian.
pub fn aead_rtp(session_salt: &[u8], ssrc: u32, index: u64) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[2..6].copy_from_slice(&ssrc.to_be_bytes());
    nonce[6..12].copy_from_slice(&index.to_be_bytes()[2..]);
    for (i, s) in session_salt.iter().enumerate() {
        nonce[i] ^= s;
    }
    nonce
}

/// AEAD nonce (12 bytes, RFC 7714 §9.1): `salt` XORed with
/// `0x0000 ‖ SSRC (4B) ‖ 0x0000 ‖ E‖31-bit-index`.
pub fn aead_rtcp(session_salt: &[u8], ssrc: u32, srtcp_index: u32) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[2..6].copy_from_slice(&ssrc.to_be_bytes());
    nonce[8..12].copy_from_slice(&srtcp_index.to_be_bytes());
    for (i, s) in session_salt.iter().enumerate() {
        nonce[i] ^= s;
    }
    nonce
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn aes_cm_rtp_xors_salt_ssrc_and_index() {
        let salt = [0u8; 14];
        let iv = aes_cm_rtp(&salt, 0xCAFEBABE, 0x1234);
        assert_eq!(&iv[4..8], &0xCAFEBABEu32.to_be_bytes());
        assert_eq!(iv[8..14], [0, 0, 0, 0, 0x12, 0x34]);
        assert_eq!(iv[14], 0);
        assert_eq!(iv[15], 0);
    }

    #[test]
    fn aead_nonce_is_12_bytes_and_zero_prefixed_before_xor() {
        let salt = [0u8; 12];
        let nonce = aead_rtp(&salt, 1, 2);
        assert_eq!(nonce[0], 0);
        assert_eq!(nonce[1], 0);
    }
}
