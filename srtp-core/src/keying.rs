//! C10 — keying derivation. Splits the DTLS `EXTRACTOR-dtls_srtp` exported
//! secret (RFC 5764 §4.2) into the four (client/server × key/salt) values a
//! session needs, per the single or nested-double layout spec.md §4.10
//! specifies.

use crate::error::{Error, Result};
use crate::profile::ProtectionProfile;

/// Either end of a DTLS handshake, used only to pick which half of the
/// exported secret becomes this side's "local" vs "remote" keying (spec.md
/// §3 Session Context invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// The four keying values extracted for a session, plus an optional MKI
/// shared by both directions. Zeroized on drop (spec.md §9 "key erasure").
#[derive(Clone, zeroize::Zeroize)]
#[zeroize(drop)]
pub struct MasterKeying {
    pub client_write_key: Vec<u8>,
    pub server_write_key: Vec<u8>,
    pub client_write_salt: Vec<u8>,
    pub server_write_salt: Vec<u8>,
    #[zeroize(skip)]
    pub mki: Option<Vec<u8>>,
}

impl MasterKeying {
    /// Length the DTLS exporter must be asked for: single profiles need
    /// `2*(key+salt)`, nested double profiles `4*(key+salt)` (spec.md §4.10).
    pub fn exported_secret_len(profile: &ProtectionProfile) -> usize {
        // The registry's key_bits/salt_bits already describe the *combined*
        // inner+outer width for double profiles, so "client+server" (factor
        // 2) is the only multiplier needed here regardless of nesting — see
        // derive_double() for the actual 4-way exported-secret slicing.
        2 * (profile.key_len() + profile.salt_len())
    }

    /// Extracts keying material for `profile` out of `exported_secret`,
    /// which must be exactly [`Self::exported_secret_len`] bytes.
    pub fn derive(profile: &ProtectionProfile, exported_secret: &[u8], mki: Option<Vec<u8>>) -> Result<Self> {
        if profile.is_double_aead() {
            Self::derive_double(profile, exported_secret, mki)
        } else {
            Self::derive_single(profile, exported_secret, mki)
        }
    }

    fn derive_single(
        profile: &ProtectionProfile,
        exported_secret: &[u8],
        mki: Option<Vec<u8>>,
    ) -> Result<Self> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();
        let expected = 2 * (key_len + salt_len);
        if exported_secret.len() != expected {
            return Err(Error::ExportedSecretLength(expected, exported_secret.len()));
        }

        let mut off = 0;
        let client_write_key = exported_secret[off..off + key_len].to_vec();
        off += key_len;
        let server_write_key = exported_secret[off..off + key_len].to_vec();
        off += key_len;
        let client_write_salt = exported_secret[off..off + salt_len].to_vec();
        off += salt_len;
        let server_write_salt = exported_secret[off..off + salt_len].to_vec();

        Ok(MasterKeying {
            client_write_key,
            server_write_key,
            client_write_salt,
            server_write_salt,
            mki,
        })
    }

    /// RFC 8723 nested layout: `inner_client_key ‖ inner_server_key ‖
    /// inner_client_salt ‖ inner_server_salt ‖ outer_client_key ‖
    /// outer_server_key ‖ outer_client_salt ‖ outer_server_salt`. Each
    /// stored `client_write_key` becomes `inner_client_key ‖
    /// outer_client_key` (and symmetrically for the others) — exactly the
    /// concatenation [`crate::cipher::double_aead`] re-splits.
    fn derive_double(
        profile: &ProtectionProfile,
        exported_secret: &[u8],
        mki: Option<Vec<u8>>,
    ) -> Result<Self> {
        let key_half = profile.key_len() / 2;
        let salt_half = profile.salt_len() / 2;
        let expected = 4 * (key_half + salt_half);
        if exported_secret.len() != expected {
            return Err(Error::ExportedSecretLength(expected, exported_secret.len()));
        }

        let mut off = 0;
        let mut take = |len: usize| {
            let s = &exported_secret[off..off + len];
            off += len;
            s.to_vec()
        };

        let inner_client_key = take(key_half);
        let inner_server_key = take(key_half);
        let inner_client_salt = take(salt_half);
        let inner_server_salt = take(salt_half);
        let outer_client_key = take(key_half);
        let outer_server_key = take(key_half);
        let outer_client_salt = take(salt_half);
        let outer_server_salt = take(salt_half);

        Ok(MasterKeying {
            client_write_key: [inner_client_key, outer_client_key].concat(),
            server_write_key: [inner_server_key, outer_server_key].concat(),
            client_write_salt: [inner_client_salt, outer_client_salt].concat(),
            server_write_salt: [inner_server_salt, outer_server_salt].concat(),
            mki,
        })
    }

    /// The (local, remote) master key+salt pairs for `role`: client encodes
    /// with `client_write_*` and decodes with `server_write_*`, server the
    /// reverse (spec.md §3 Session Context invariant).
    pub fn local_remote(&self, role: Role) -> ((&[u8], &[u8]), (&[u8], &[u8])) {
        match role {
            Role::Client => (
                (&self.client_write_key, &self.client_write_salt),
                (&self.server_write_key, &self.server_write_salt),
            ),
            Role::Server => (
                (&self.server_write_key, &self.server_write_salt),
                (&self.client_write_key, &self.client_write_salt),
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::profile;

    #[test]
    fn single_profile_layout_matches_s1_style_lengths() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        let secret = vec![0u8; 2 * (16 + 14)];
        let keying = MasterKeying::derive(&profile, &secret, None).unwrap();
        assert_eq!(keying.client_write_key.len(), 16);
        assert_eq!(keying.client_write_salt.len(), 14);
    }

    #[test]
    fn double_profile_layout_matches_s5() {
        let profile = profile::DOUBLE_AEAD_AES_256_GCM_AEAD_AES_256_GCM;
        // 4 * (32 + 12) = 176 bytes of 0x00..0xAF (S5).
        let secret: Vec<u8> = (0..176u16).map(|i| i as u8).collect();
        let keying = MasterKeying::derive(&profile, &secret, None).unwrap();
        // client_write_key = bytes[0..32] ‖ bytes[88..120], per the
        // inner_client_key‖inner_server_key‖inner_client_salt‖inner_server_salt‖
        // outer_... layout.
        let mut expected_client_key = secret[0..32].to_vec();
        expected_client_key.extend_from_slice(&secret[88..120]);
        assert_eq!(keying.client_write_key, expected_client_key);

        // server_salt = inner_server_salt ‖ outer_server_salt. Inner block is
        // icK(32)‖isK(32)‖icS(12)‖isS(12), so isS sits at [76..88); outer
        // block mirrors that at +88, so osS sits at [164..176).
        let mut expected_server_salt = secret[76..88].to_vec();
        expected_server_salt.extend_from_slice(&secret[164..176]);
        assert_eq!(keying.server_write_salt, expected_server_salt);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let profile = profile::AES128_CM_HMAC_SHA1_80;
        assert!(MasterKeying::derive(&profile, &[0u8; 3], None).is_err());
    }
}
