//! C2 — RFC 3711 §4.3 / Appendix B.3 key derivation. Session keys, salts,
//! and auth keys are all produced by the same construction: XOR a label and
//! the key-derivation index into the master salt, pad to a block, and
//! encrypt the block(s) with the master key under the profile's own block
//! cipher (AES for the AES-CM/AEAD-GCM families, ARIA for the ARIA
//! families — RFC 8269 reuses the RFC 3711 construction verbatim with ARIA
//! substituted for AES).

use cipher::{BlockEncrypt, KeyInit};
use generic_array::GenericArray;

use crate::error::{Error, Result};

pub const LABEL_SRTP_ENCRYPTION: u8 = 0x00;
pub const LABEL_SRTP_AUTHENTICATION_TAG: u8 = 0x01;
pub const LABEL_SRTP_SALT: u8 = 0x02;
pub const LABEL_SRTCP_ENCRYPTION: u8 = 0x03;
pub const LABEL_SRTCP_AUTHENTICATION_TAG: u8 = 0x04;
pub const LABEL_SRTCP_SALT: u8 = 0x05;

/// `index DIV kdr`, or 0 when `kdr == 0` ("never re-derive"). `kdr` must be
/// zero or a power of two per the profile registry invariant.
pub fn index_over_kdr(index: u64, kdr: u64) -> Result<u64> {
    if kdr == 0 {
        return Ok(0);
    }
    if !kdr.is_power_of_two() {
        return Err(Error::InvalidKdr);
    }
    Ok(index / kdr)
}

/// Encrypts one 16-byte block with `C` keyed by `master_key`. Used both to
/// derive a single-block session value and, for the auth key, as the
/// two-block construction below.
fn encrypt_block<C: KeyInit + BlockEncrypt>(master_key: &[u8], block: &mut [u8; 16]) -> Result<()> {
    let cipher = C::new_from_slice(master_key).map_err(|e| Error::Other(e.to_string()))?;
    let mut ga = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut ga);
    block.copy_from_slice(&ga);
    Ok(())
}

/// Builds the XORed-and-padded input block: `master_salt` right-aligned
/// against `label ‖ r` (`r` the 48-bit key-derivation index), then padded
/// with two trailing zero (or counter) octets to reach 16 bytes.
fn input_block(master_salt: &[u8], label: u8, r: u64, counter: u16) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[16 - 2 - master_salt.len()..16 - 2].copy_from_slice(master_salt);

    let label_and_r = [
        label,
        (r >> 40) as u8,
        (r >> 32) as u8,
        (r >> 24) as u8,
        (r >> 16) as u8,
        (r >> 8) as u8,
        r as u8,
    ];
    let salt_start = 16 - 2 - master_salt.len();
    let mut i = label_and_r.len() as isize - 1;
    let mut j = (salt_start + master_salt.len()) as isize - 1;
    while i >= 0 && j >= 0 {
        block[j as usize] ^= label_and_r[i as usize];
        i -= 1;
        j -= 1;
    }

    block[14..16].copy_from_slice(&counter.to_be_bytes());
    block
}

/// Derives a session key, salt, or (via the two-block extension below) auth
/// key, under block cipher `C`. `out_len` is the number of leading bytes of
/// the keystream to keep.
pub fn derive<C: KeyInit + BlockEncrypt>(
    master_key: &[u8],
    master_salt: &[u8],
    label: u8,
    r: u64,
    out_len: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(out_len);
    let mut counter = 0u16;
    while out.len() < out_len {
        let mut block = input_block(master_salt, label, r, counter);
        encrypt_block::<C>(master_key, &mut block)?;
        let take = (out_len - out.len()).min(16);
        out.extend_from_slice(&block[..take]);
        counter += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use aes::Aes128;

    // RFC 3711 Appendix B.3 test vectors.
    const MASTER_KEY: [u8; 16] = [
        0xE1, 0xF9, 0x7A, 0x0D, 0x3E, 0x01, 0x8B, 0xE0, 0xD6, 0x4F, 0xA3, 0x2C, 0x06, 0xDE, 0x41,
        0x39,
    ];
    const MASTER_SALT: [u8; 14] = [
        0x0E, 0xC6, 0x75, 0xAD, 0x49, 0x8A, 0xFE, 0xEB, 0xB6, 0x96, 0x0B, 0x3A, 0xAB, 0xE6,
    ];
    const EXPECTED_SESSION_KEY: [u8; 16] = [
        0xC6, 0x1E, 0x7A, 0x93, 0x74, 0x4F, 0x39, 0xEE, 0x10, 0x73, 0x4A, 0xFE, 0x3F, 0xF7, 0xA0,
        0x87,
    ];
    const EXPECTED_SESSION_SALT: [u8; 14] = [
        0x30, 0xCB, 0xBC, 0x08, 0x86, 0x3D, 0x8C, 0x85, 0xD4, 0x9D, 0xB3, 0x4A, 0x9A, 0xE1,
    ];
    const EXPECTED_SESSION_AUTH_TAG: [u8; 20] = [
        0xCE, 0xBE, 0x32, 0x1F, 0x6F, 0xF7, 0x71, 0x6B, 0x6F, 0xD4, 0xAB, 0x49, 0xAF, 0x25, 0x6A,
        0x15, 0x6D, 0x38, 0xBA, 0xA4,
    ];

    #[test]
    fn session_key_matches_rfc3711_appendix_b3() {
        let key = derive::<Aes128>(&MASTER_KEY, &MASTER_SALT, LABEL_SRTP_ENCRYPTION, 0, 16)
            .unwrap();
        assert_eq!(key, EXPECTED_SESSION_KEY);
    }

    #[test]
    fn session_salt_matches_rfc3711_appendix_b3() {
        let salt = derive::<Aes128>(&MASTER_KEY, &MASTER_SALT, LABEL_SRTP_SALT, 0, 14).unwrap();
        assert_eq!(salt, EXPECTED_SESSION_SALT);
    }

    #[test]
    fn auth_tag_matches_rfc3711_appendix_b3() {
        let auth = derive::<Aes128>(
            &MASTER_KEY,
            &MASTER_SALT,
            LABEL_SRTP_AUTHENTICATION_TAG,
            0,
            20,
        )
        .unwrap();
        assert_eq!(auth, EXPECTED_SESSION_AUTH_TAG);
    }

    #[test]
    fn index_over_kdr_zero_never_advances() {
        assert_eq!(index_over_kdr(12345, 0).unwrap(), 0);
    }

    #[test]
    fn index_over_kdr_divides_by_rate() {
        assert_eq!(index_over_kdr(128, 64).unwrap(), 2);
        assert_eq!(index_over_kdr(127, 64).unwrap(), 1);
    }

    #[test]
    fn rejects_non_power_of_two_kdr() {
        assert!(index_over_kdr(10, 3).is_err());
    }
}
