//! C8 — the entry point. Binds the four per-direction contexts a DTLS-SRTP
//! session needs and exposes the protect/unprotect surface spec.md §6 lists
//! under "Interfaces the core exposes".

use crate::config::SessionConfig;
use crate::context::{SrtcpContext, SrtpContext};
use crate::error::{Error, Result};
use crate::keying::{MasterKeying, Role};

/// Four independent contexts sharing one negotiated profile and keying
/// material, split by direction the way spec.md §3's Session Context
/// invariant requires: encode uses this side's write key, decode uses the
/// peer's.
pub struct SessionContext {
    encode_rtp: SrtpContext,
    decode_rtp: SrtpContext,
    encode_rtcp: SrtcpContext,
    decode_rtcp: SrtcpContext,
}

impl SessionContext {
    /// `derive_session` from spec.md §6: consumes the DTLS exporter output
    /// and the negotiated profile/MKI/role, and returns a ready-to-use
    /// session. `replay_protected` disables the window only for callers that
    /// have deliberately opted out (e.g. offline capture replay).
    ///
    /// `extended_master_secret_negotiated` is the DTLS collaborator's report
    /// of whether it negotiated the Extended Master Secret extension
    /// (spec.md §9 Open Question); when `config.require_extended_master_secret`
    /// is set and this is `false`, the session is refused rather than built
    /// on exporter output RFC 5764bis considers unsafe to trust.
    pub fn derive(
        config: &SessionConfig,
        exported_secret: &[u8],
        local_role: Role,
        replay_protected: bool,
        extended_master_secret_negotiated: bool,
    ) -> Result<Self> {
        if config.require_extended_master_secret && !extended_master_secret_negotiated {
            return Err(Error::HandshakeMissingExtendedMasterSecret);
        }
        let keying = MasterKeying::derive(&config.profile, exported_secret, config.mki.clone())?;
        Self::from_keying(config, &keying, local_role, replay_protected)
    }

    fn from_keying(
        config: &SessionConfig,
        keying: &MasterKeying,
        local_role: Role,
        replay_protected: bool,
    ) -> Result<Self> {
        let ((local_key, local_salt), (remote_key, remote_salt)) = keying.local_remote(local_role);

        let encode_rtp = SrtpContext::new(
            config.profile,
            local_key.to_vec(),
            local_salt.to_vec(),
            keying.mki.clone(),
            replay_protected,
        )?;
        let decode_rtp = SrtpContext::new(
            config.profile,
            remote_key.to_vec(),
            remote_salt.to_vec(),
            keying.mki.clone(),
            replay_protected,
        )?;
        let encode_rtcp = SrtcpContext::new(
            config.profile,
            local_key.to_vec(),
            local_salt.to_vec(),
            keying.mki.clone(),
            replay_protected,
        )?;
        let decode_rtcp = SrtcpContext::new(
            config.profile,
            remote_key.to_vec(),
            remote_salt.to_vec(),
            keying.mki.clone(),
            replay_protected,
        )?;

        Ok(SessionContext {
            encode_rtp,
            decode_rtp,
            encode_rtcp,
            decode_rtcp,
        })
    }

    pub fn protect_rtp(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        self.encode_rtp.protect_rtp(packet)
    }

    pub fn unprotect_rtp(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        self.decode_rtp.unprotect_rtp(packet)
    }

    pub fn protect_rtcp(&mut self, packet: &[u8], ssrc: u32) -> Result<Vec<u8>> {
        self.encode_rtcp.protect_rtcp(packet, ssrc)
    }

    pub fn unprotect_rtcp(&mut self, packet: &[u8], ssrc: u32) -> Result<Vec<u8>> {
        self.decode_rtcp.unprotect_rtcp(packet, ssrc)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::profile;
    use webrtc_util::marshal::Marshal;

    fn rtp_packet(seq: u16, payload: &[u8]) -> Vec<u8> {
        let header = rtp::header::Header {
            version: 2,
            payload_type: 100,
            sequence_number: seq,
            timestamp: 0xDEADBEEF,
            ssrc: 0xCAFEBABE,
            ..Default::default()
        };
        let mut out = header.marshal().unwrap();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn client_and_server_sessions_cross_protect() {
        let config = SessionConfig::new(profile::AES128_CM_HMAC_SHA1_80);
        // 2 * (16 + 14) bytes, distinct per half so client/server keys differ.
        let secret: Vec<u8> = (0..60u16).map(|i| i as u8).collect();

        let mut client =
            SessionContext::derive(&config, &secret, Role::Client, true, true).unwrap();
        let mut server =
            SessionContext::derive(&config, &secret, Role::Server, true, true).unwrap();

        let packet = rtp_packet(1, b"hi");
        let srtp = client.protect_rtp(&packet).unwrap();
        let plain = server.unprotect_rtp(&srtp).unwrap();
        assert_eq!(&plain[12..], b"hi");

        let reply = rtp_packet(1, b"yo");
        let srtp_reply = server.protect_rtcp(&reply[..12], 0xCAFEBABE);
        assert!(srtp_reply.is_ok());
    }

    #[test]
    fn missing_extended_master_secret_is_refused_when_required() {
        let config = SessionConfig::new(profile::AES128_CM_HMAC_SHA1_80);
        let secret: Vec<u8> = (0..60u16).map(|i| i as u8).collect();
        assert!(config.require_extended_master_secret);

        let err = SessionContext::derive(&config, &secret, Role::Client, true, false)
            .unwrap_err();
        assert_eq!(err, Error::HandshakeMissingExtendedMasterSecret);
    }

    #[test]
    fn missing_extended_master_secret_is_allowed_when_policy_disabled() {
        let mut config = SessionConfig::new(profile::AES128_CM_HMAC_SHA1_80);
        config.require_extended_master_secret = false;
        let secret: Vec<u8> = (0..60u16).map(|i| i as u8).collect();

        assert!(SessionContext::derive(&config, &secret, Role::Client, true, false).is_ok());
    }
}
