//! C11 — the protection-profile registry. A static table mapping each
//! IANA-registered `use_srtp` profile code to its cipher family and the
//! key/salt/tag lengths and KDR that code implies.

use crate::error::{Error, Result};

/// The closed set of cipher families this registry can select. Dispatch in
/// cipher construction and protect/unprotect is a match over this enum —
/// the set is fixed by IANA, so a deeper trait hierarchy buys nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherFamily {
    Aes128Cm,
    Aes256Cm,
    AeadAes128Gcm,
    AeadAes256Gcm,
    Aria128Cm,
    Aria256Cm,
    AeadAria128Gcm,
    AeadAria256Gcm,
    DoubleAead128,
    DoubleAead256,
    F8Aes128,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAlgorithm {
    None,
    HmacSha1,
}

/// Immutable record describing one protection profile. `kdr` is a power of
/// two, or zero meaning "never re-derive session keys". AEAD profiles carry
/// `auth = None` since the tag is produced by the AEAD construction itself,
/// not a separate HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionProfile {
    pub profile_id: u16,
    pub cipher: CipherFamily,
    pub key_bits: u32,
    pub salt_bits: u32,
    pub auth: AuthAlgorithm,
    pub auth_tag_bits: u32,
    pub kdr: u64,
}

pub const AES128_CM_HMAC_SHA1_80: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0001,
    cipher: CipherFamily::Aes128Cm,
    key_bits: 128,
    salt_bits: 112,
    auth: AuthAlgorithm::HmacSha1,
    auth_tag_bits: 80,
    kdr: 0,
};

pub const AES128_CM_HMAC_SHA1_32: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0002,
    auth_tag_bits: 32,
    ..AES128_CM_HMAC_SHA1_80
};

pub const NULL_HMAC_SHA1_80: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0005,
    cipher: CipherFamily::Null,
    key_bits: 128,
    salt_bits: 112,
    auth: AuthAlgorithm::HmacSha1,
    auth_tag_bits: 80,
    kdr: 0,
};

pub const NULL_HMAC_SHA1_32: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0006,
    auth_tag_bits: 32,
    ..NULL_HMAC_SHA1_80
};

pub const AEAD_AES_128_GCM: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0007,
    cipher: CipherFamily::AeadAes128Gcm,
    key_bits: 128,
    salt_bits: 96,
    auth: AuthAlgorithm::None,
    auth_tag_bits: 128,
    kdr: 0,
};

pub const AEAD_AES_256_GCM: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0008,
    cipher: CipherFamily::AeadAes256Gcm,
    key_bits: 256,
    salt_bits: 96,
    auth: AuthAlgorithm::None,
    auth_tag_bits: 128,
    kdr: 0,
};

/// RFC 8723 nested profile: each key/salt the context stores is the
/// concatenation of an independently-derived inner half and outer half
/// (see `crate::keying`), so `key_bits`/`salt_bits` here are the *combined*
/// widths a `MasterKeying` entry for this profile actually holds.
pub const DOUBLE_AEAD_AES_128_GCM_AEAD_AES_128_GCM: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0009,
    cipher: CipherFamily::DoubleAead128,
    key_bits: 256,
    salt_bits: 192,
    auth: AuthAlgorithm::None,
    auth_tag_bits: 256,
    kdr: 0,
};

pub const DOUBLE_AEAD_AES_256_GCM_AEAD_AES_256_GCM: ProtectionProfile = ProtectionProfile {
    profile_id: 0x000A,
    cipher: CipherFamily::DoubleAead256,
    key_bits: 512,
    salt_bits: 192,
    auth: AuthAlgorithm::None,
    auth_tag_bits: 256,
    kdr: 0,
};

// RFC 8269 ARIA-CTR profiles. IANA assigns these in the 0x000B..0x000E
// range as four variants crossing {128, 256}-bit keys with {80, 32}-bit
// tags, in the same order as the AES-CM pair above.
pub const ARIA_128_CTR_HMAC_SHA1_80: ProtectionProfile = ProtectionProfile {
    profile_id: 0x000B,
    cipher: CipherFamily::Aria128Cm,
    key_bits: 128,
    salt_bits: 112,
    auth: AuthAlgorithm::HmacSha1,
    auth_tag_bits: 80,
    kdr: 0,
};

pub const ARIA_128_CTR_HMAC_SHA1_32: ProtectionProfile = ProtectionProfile {
    profile_id: 0x000C,
    auth_tag_bits: 32,
    ..ARIA_128_CTR_HMAC_SHA1_80
};

pub const ARIA_256_CTR_HMAC_SHA1_80: ProtectionProfile = ProtectionProfile {
    profile_id: 0x000D,
    cipher: CipherFamily::Aria256Cm,
    key_bits: 256,
    salt_bits: 112,
    auth: AuthAlgorithm::HmacSha1,
    auth_tag_bits: 80,
    kdr: 0,
};

pub const ARIA_256_CTR_HMAC_SHA1_32: ProtectionProfile = ProtectionProfile {
    profile_id: 0x000E,
    auth_tag_bits: 32,
    ..ARIA_256_CTR_HMAC_SHA1_80
};

pub const AEAD_ARIA_128_GCM: ProtectionProfile = ProtectionProfile {
    profile_id: 0x000F,
    cipher: CipherFamily::AeadAria128Gcm,
    key_bits: 128,
    salt_bits: 96,
    auth: AuthAlgorithm::None,
    auth_tag_bits: 128,
    kdr: 0,
};

pub const AEAD_ARIA_256_GCM: ProtectionProfile = ProtectionProfile {
    profile_id: 0x0010,
    cipher: CipherFamily::AeadAria256Gcm,
    key_bits: 256,
    salt_bits: 96,
    auth: AuthAlgorithm::None,
    auth_tag_bits: 128,
    kdr: 0,
};

const ALL: &[ProtectionProfile] = &[
    AES128_CM_HMAC_SHA1_80,
    AES128_CM_HMAC_SHA1_32,
    NULL_HMAC_SHA1_80,
    NULL_HMAC_SHA1_32,
    AEAD_AES_128_GCM,
    AEAD_AES_256_GCM,
    DOUBLE_AEAD_AES_128_GCM_AEAD_AES_128_GCM,
    DOUBLE_AEAD_AES_256_GCM_AEAD_AES_256_GCM,
    ARIA_128_CTR_HMAC_SHA1_80,
    ARIA_128_CTR_HMAC_SHA1_32,
    ARIA_256_CTR_HMAC_SHA1_80,
    ARIA_256_CTR_HMAC_SHA1_32,
    AEAD_ARIA_128_GCM,
    AEAD_ARIA_256_GCM,
];

/// Looks up a profile by its wire ID. The F8 cipher family intentionally has
/// no IANA-registered profile ID of its own (it predates `use_srtp` and is
/// only reachable by constructing a `ProtectionProfile` in-process), so it
/// is absent from this table.
pub fn by_id(profile_id: u16) -> Result<ProtectionProfile> {
    ALL.iter()
        .find(|p| p.profile_id == profile_id)
        .copied()
        .ok_or(Error::NoSuchProfile(profile_id))
}

impl ProtectionProfile {
    pub fn key_len(&self) -> usize {
        (self.key_bits / 8) as usize
    }

    pub fn salt_len(&self) -> usize {
        (self.salt_bits / 8) as usize
    }

    pub fn auth_tag_len(&self) -> usize {
        (self.auth_tag_bits / 8) as usize
    }

    /// HMAC-SHA1 key length is fixed at the SHA-1 output width regardless of
    /// the tag truncation length; AEAD profiles use no separate auth key.
    pub fn auth_key_len(&self) -> usize {
        match self.auth {
            AuthAlgorithm::HmacSha1 => 20,
            AuthAlgorithm::None => 0,
        }
    }

    pub fn is_double_aead(&self) -> bool {
        matches!(
            self.cipher,
            CipherFamily::DoubleAead128 | CipherFamily::DoubleAead256
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invariants_hold_for_every_registered_profile() {
        for p in ALL {
            assert!(p.kdr == 0 || p.kdr.is_power_of_two());
            let is_aead = matches!(
                p.cipher,
                CipherFamily::AeadAes128Gcm
                    | CipherFamily::AeadAes256Gcm
                    | CipherFamily::AeadAria128Gcm
                    | CipherFamily::AeadAria256Gcm
                    | CipherFamily::DoubleAead128
                    | CipherFamily::DoubleAead256
            );
            if is_aead {
                assert_eq!(p.auth, AuthAlgorithm::None);
                assert!(p.auth_tag_bits >= 96);
            }
            if p.cipher == CipherFamily::Null {
                assert_eq!(p.auth, AuthAlgorithm::HmacSha1);
            }
        }
    }

    #[test]
    fn looks_up_known_ids() {
        assert_eq!(by_id(0x0001).unwrap(), AES128_CM_HMAC_SHA1_80);
        assert_eq!(by_id(0x0007).unwrap(), AEAD_AES_128_GCM);
        assert_eq!(by_id(0x000A).unwrap(), DOUBLE_AEAD_AES_256_GCM_AEAD_AES_256_GCM);
        assert!(by_id(0x1234).is_err());
    }
}
