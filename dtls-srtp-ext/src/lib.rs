//! C9 — the `use_srtp` DTLS extension (RFC 5764 §4.1.1). Builds the
//! client offer, and parses either side of the exchange. The wire body is
//! `profile-list-byte-length (2B) ‖ profile IDs (2B each) ‖ MKI length (1B)
//! ‖ MKI bytes` (spec.md §6) — this crate touches only that body, not the
//! enclosing TLS extension framing (type + overall length), which is the
//! DTLS collaborator's concern.

pub mod error;

use byteorder::{BigEndian, ByteOrder};
use error::{Error, Result};
use srtp_core::profile::{self, ProtectionProfile};

/// Builds the client's offer: its ordered list of supported profile IDs,
/// plus an optional MKI (spec.md §4.9 "opaque bytes, length 0-255").
pub fn build_client_extension(offered_profiles: &[u16], mki: Option<&[u8]>) -> Vec<u8> {
    build_body(offered_profiles, mki)
}

/// Builds the server's reply: exactly one chosen profile ID, plus the MKI
/// it is echoing (or withholding under the "disable MKI" policy).
pub fn build_server_extension(chosen_profile: u16, mki: Option<&[u8]>) -> Vec<u8> {
    build_body(&[chosen_profile], mki)
}

fn build_body(profile_ids: &[u16], mki: Option<&[u8]>) -> Vec<u8> {
    let mki = mki.unwrap_or(&[]);
    let mut out = Vec::with_capacity(2 + profile_ids.len() * 2 + 1 + mki.len());
    let mut list_len = [0u8; 2];
    BigEndian::write_u16(&mut list_len, (profile_ids.len() * 2) as u16);
    out.extend_from_slice(&list_len);
    for id in profile_ids {
        let mut b = [0u8; 2];
        BigEndian::write_u16(&mut b, *id);
        out.extend_from_slice(&b);
    }
    out.push(mki.len() as u8);
    out.extend_from_slice(mki);
    out
}

fn parse_body(bytes: &[u8]) -> Result<(Vec<u16>, Option<Vec<u8>>)> {
    if bytes.len() < 2 {
        return Err(Error::InvalidExtension);
    }
    let list_len = BigEndian::read_u16(&bytes[0..2]) as usize;
    if list_len % 2 != 0 || bytes.len() < 2 + list_len + 1 {
        return Err(Error::InvalidExtension);
    }
    let mut profiles = Vec::with_capacity(list_len / 2);
    let mut off = 2;
    for _ in 0..list_len / 2 {
        profiles.push(BigEndian::read_u16(&bytes[off..off + 2]));
        off += 2;
    }
    let mki_len = bytes[off] as usize;
    off += 1;
    if bytes.len() < off + mki_len {
        return Err(Error::InvalidExtension);
    }
    let mki = if mki_len == 0 {
        None
    } else {
        Some(bytes[off..off + mki_len].to_vec())
    };
    Ok((profiles, mki))
}

/// Client-side: validates the ServerHello's `use_srtp` extension against
/// what was offered (spec.md §4.9). Exactly one profile must be present and
/// must be a member of `offered_profiles`; a non-empty server MKI must equal
/// `client_mki`.
pub fn parse_server_extension(
    extension_bytes: &[u8],
    offered_profiles: &[u16],
    client_mki: Option<&[u8]>,
) -> Result<ProtectionProfile> {
    let (profiles, server_mki) = parse_body(extension_bytes)?;
    // spec.md §7/S6: a server reply naming zero or more than one profile is
    // a malformed `use_srtp` extension, not a distinct error kind.
    if profiles.len() != 1 {
        return Err(Error::InvalidExtension);
    }
    let chosen = profiles[0];
    if !offered_profiles.contains(&chosen) {
        return Err(Error::InvalidExtension);
    }
    if let Some(server_mki) = &server_mki {
        if !server_mki.is_empty() && Some(server_mki.as_slice()) != client_mki {
            return Err(Error::MkiMismatch);
        }
    }
    profile::by_id(chosen).map_err(Error::Profile)
}

/// Server-side: intersects the client's offer with `supported_profiles`
/// (ordered by this server's own priority, highest first) and selects the
/// first match. `force_disable_mki` implements RFC 8827's WebRTC policy of
/// always replying with an empty MKI regardless of the client's offer.
pub fn parse_client_extension(
    extension_bytes: &[u8],
    supported_profiles: &[ProtectionProfile],
    force_disable_mki: bool,
) -> Result<(ProtectionProfile, Option<Vec<u8>>)> {
    let (offered, client_mki) = parse_body(extension_bytes)?;
    let chosen = supported_profiles
        .iter()
        .find(|p| offered.contains(&p.profile_id))
        .copied()
        .ok_or(Error::NoMutualProfile)?;

    let server_mki = if force_disable_mki { None } else { client_mki };
    Ok((chosen, server_mki))
}

#[cfg(test)]
mod test {
    use super::*;
    use srtp_core::profile::{AEAD_AES_128_GCM, AEAD_AES_256_GCM, AES128_CM_HMAC_SHA1_80};

    #[test]
    fn round_trips_server_extension() {
        let body = build_server_extension(0x0007, None);
        let chosen = parse_server_extension(&body, &[0x0001, 0x0007, 0x0008], None).unwrap();
        assert_eq!(chosen, AEAD_AES_128_GCM);
    }

    #[test]
    fn rejects_more_than_one_server_profile() {
        let body = build_client_extension(&[0x0001, 0x0007], None);
        assert_eq!(
            parse_server_extension(&body, &[0x0001, 0x0007], None).unwrap_err(),
            Error::InvalidExtension
        );
    }

    #[test]
    fn s6_server_selects_highest_priority_in_intersection() {
        let client_offer = build_client_extension(&[0x0001, 0x0007, 0x0008], None);
        let (chosen, server_mki) = parse_client_extension(
            &client_offer,
            &[AEAD_AES_256_GCM, AES128_CM_HMAC_SHA1_80],
            true,
        )
        .unwrap();
        assert_eq!(chosen, AEAD_AES_256_GCM);
        assert_eq!(server_mki, None);
    }

    #[test]
    fn no_mutual_profile_is_rejected() {
        let client_offer = build_client_extension(&[0x0001], None);
        let err =
            parse_client_extension(&client_offer, &[AEAD_AES_256_GCM], true).unwrap_err();
        assert_eq!(err, Error::NoMutualProfile);
    }

    #[test]
    fn mki_mismatch_is_rejected() {
        let body = build_server_extension(0x0007, Some(&[9, 9]));
        let err =
            parse_server_extension(&body, &[0x0007], Some(&[1, 2])).unwrap_err();
        assert_eq!(err, Error::MkiMismatch);
    }
}
