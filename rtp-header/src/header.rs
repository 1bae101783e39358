use bytes::Bytes;
use webrtc_util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;

pub const HEADER_LENGTH: usize = 4;
pub const VERSION_SHIFT: u8 = 6;
pub const VERSION_MASK: u8 = 0x3;
pub const PADDING_SHIFT: u8 = 5;
pub const PADDING_MASK: u8 = 0x1;
pub const EXTENSION_SHIFT: u8 = 4;
pub const EXTENSION_MASK: u8 = 0x1;
pub const EXTENSION_PROFILE_ONE_BYTE: u16 = 0xBEDE;
pub const EXTENSION_PROFILE_TWO_BYTE: u16 = 0x1000;
pub const EXTENSION_ID_RESERVED: u8 = 0xF;
pub const CC_MASK: u8 = 0xF;
pub const MARKER_SHIFT: u8 = 7;
pub const MARKER_MASK: u8 = 0x1;
pub const PT_MASK: u8 = 0x7F;
pub const SSRC_OFFSET: usize = 8;
pub const SSRC_LENGTH: usize = 4;
pub const CSRC_OFFSET: usize = 12;
pub const CSRC_LENGTH: usize = 4;

/// A single RTP header extension (RFC 8285) or, for the legacy RFC 3550
/// extension, the sole element of `extensions`.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Extension {
    pub id: u8,
    pub payload: Bytes,
}

/// An RTP packet header. `marshal_size`/`unmarshal` determine exactly how
/// many leading bytes of a packet belong to the header — this boundary is
/// what SRTP uses to decide where the encrypted payload starts and how much
/// of the packet is covered by AAD/MAC (spec.md §4.7: "the header length for
/// MAC/AEAD purposes is the full RTP header including CSRCs and
/// extensions").
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Header {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    pub extension_profile: u16,
    pub extensions: Vec<Extension>,
}

impl Header {
    pub fn get_extension_payload_len(&self) -> usize {
        match self.extension_profile {
            EXTENSION_PROFILE_ONE_BYTE => self
                .extensions
                .iter()
                .map(|e| 1 + e.payload.len())
                .sum(),
            EXTENSION_PROFILE_TWO_BYTE => self
                .extensions
                .iter()
                .map(|e| 2 + e.payload.len())
                .sum(),
            _ => self.extensions.iter().map(|e| e.payload.len()).sum(),
        }
    }

    /// Sets (or replaces) a header extension, choosing the one-byte/two-byte
    /// RFC 8285 profile automatically based on payload size.
    pub fn set_extension(&mut self, id: u8, payload: Bytes) -> Result<(), Error> {
        if self.extension {
            match self.extension_profile {
                EXTENSION_PROFILE_ONE_BYTE => {
                    if !(1..=14).contains(&id) {
                        return Err(Error::Rfc8285OneByteHeaderIdRange);
                    }
                    if payload.len() > 16 {
                        return Err(Error::Rfc8285OneByteHeaderSize);
                    }
                }
                EXTENSION_PROFILE_TWO_BYTE => {
                    if id < 1 {
                        return Err(Error::Rfc8285TwoByteHeaderIdRange);
                    }
                    if payload.len() > 255 {
                        return Err(Error::Rfc8285TwoByteHeaderSize);
                    }
                }
                _ => {
                    if id != 0 {
                        return Err(Error::Rfc3550HeaderIdRange);
                    }
                }
            }

            for extension in &mut self.extensions {
                if extension.id == id {
                    extension.payload = payload;
                    return Ok(());
                }
            }
            self.extensions.push(Extension { id, payload });
            return Ok(());
        }

        self.extension = true;
        let len = payload.len();
        self.extension_profile = if len <= 16 {
            EXTENSION_PROFILE_ONE_BYTE
        } else {
            EXTENSION_PROFILE_TWO_BYTE
        };
        self.extensions.push(Extension { id, payload });
        Ok(())
    }
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        let mut head_size = 12 + (self.csrc.len() * CSRC_LENGTH);
        if self.extension {
            let extension_payload_len = self.get_extension_payload_len();
            let extension_payload_size = (extension_payload_len + 3) / 4;
            head_size += 4 + extension_payload_size * 4;
        }
        head_size
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize, webrtc_util::Error> {
        let size = self.marshal_size();
        if buf.len() < size {
            return Err(webrtc_util::Error::new(format!(
                "buffer has {} bytes, header needs {}",
                buf.len(),
                size
            )));
        }

        let mut b0 = (self.version << VERSION_SHIFT) | self.csrc.len() as u8;
        if self.padding {
            b0 |= 1 << PADDING_SHIFT;
        }
        if self.extension {
            b0 |= 1 << EXTENSION_SHIFT;
        }
        buf[0] = b0;

        let mut b1 = self.payload_type;
        if self.marker {
            b1 |= 1 << MARKER_SHIFT;
        }
        buf[1] = b1;

        buf[2..4].copy_from_slice(&self.sequence_number.to_be_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        let mut n = 12;
        for csrc in &self.csrc {
            buf[n..n + 4].copy_from_slice(&csrc.to_be_bytes());
            n += 4;
        }

        if self.extension {
            buf[n..n + 2].copy_from_slice(&self.extension_profile.to_be_bytes());
            n += 2;

            let extension_payload_len = self.get_extension_payload_len();
            if self.extension_profile != EXTENSION_PROFILE_ONE_BYTE
                && self.extension_profile != EXTENSION_PROFILE_TWO_BYTE
                && extension_payload_len % 4 != 0
            {
                return Err(Error::HeaderExtensionPayloadNot32BitWords.into());
            }
            let extension_payload_size = (extension_payload_len as u16 + 3) / 4;
            buf[n..n + 2].copy_from_slice(&extension_payload_size.to_be_bytes());
            n += 2;

            match self.extension_profile {
                EXTENSION_PROFILE_ONE_BYTE => {
                    for extension in &self.extensions {
                        buf[n] = (extension.id << 4) | (extension.payload.len() as u8 - 1);
                        n += 1;
                        buf[n..n + extension.payload.len()].copy_from_slice(&extension.payload);
                        n += extension.payload.len();
                    }
                }
                EXTENSION_PROFILE_TWO_BYTE => {
                    for extension in &self.extensions {
                        buf[n] = extension.id;
                        n += 1;
                        buf[n] = extension.payload.len() as u8;
                        n += 1;
                        buf[n..n + extension.payload.len()].copy_from_slice(&extension.payload);
                        n += extension.payload.len();
                    }
                }
                _ => {
                    if self.extensions.len() != 1 {
                        return Err(Error::Rfc3550HeaderIdRange.into());
                    }
                    if let Some(extension) = self.extensions.first() {
                        let ext_len = extension.payload.len();
                        if ext_len % 4 != 0 {
                            return Err(Error::HeaderExtensionPayloadNot32BitWords.into());
                        }
                        buf[n..n + ext_len].copy_from_slice(&extension.payload);
                        n += ext_len;
                    }
                }
            }

            for b in buf
                .iter_mut()
                .take(n + (extension_payload_size as usize * 4 - extension_payload_len))
                .skip(n)
            {
                *b = 0;
            }
            n += extension_payload_size as usize * 4 - extension_payload_len;
        }

        Ok(n)
    }
}

impl From<Error> for webrtc_util::Error {
    fn from(e: Error) -> Self {
        webrtc_util::Error::new(e.to_string())
    }
}

impl Unmarshal for Header {
    fn unmarshal(raw_packet: &[u8]) -> Result<Self, webrtc_util::Error> {
        /*
         *  0                   1                   2                   3
         *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |V=2|P|X|  CC   |M|     PT      |       sequence number         |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |                           timestamp                           |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |           synchronization source (SSRC) identifier            |
         * +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
         * |            contributing source (CSRC) identifiers             |
         * |                             ....                              |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         */
        if raw_packet.len() < HEADER_LENGTH {
            return Err(Error::HeaderSizeInsufficient.into());
        }

        let b0 = raw_packet[0];
        let version = (b0 >> VERSION_SHIFT) & VERSION_MASK;
        let padding = ((b0 >> PADDING_SHIFT) & PADDING_MASK) > 0;
        let extension = ((b0 >> EXTENSION_SHIFT) & EXTENSION_MASK) > 0;
        let cc = (b0 & CC_MASK) as usize;

        let mut curr_offset = CSRC_OFFSET + (cc * CSRC_LENGTH);
        if raw_packet.len() < curr_offset {
            return Err(Error::HeaderSizeInsufficient.into());
        }

        let b1 = raw_packet[1];
        let marker = ((b1 >> MARKER_SHIFT) & MARKER_MASK) > 0;
        let payload_type = b1 & PT_MASK;

        let sequence_number = u16::from_be_bytes([raw_packet[2], raw_packet[3]]);
        let timestamp = u32::from_be_bytes([
            raw_packet[4],
            raw_packet[5],
            raw_packet[6],
            raw_packet[7],
        ]);
        let ssrc = u32::from_be_bytes([
            raw_packet[8],
            raw_packet[9],
            raw_packet[10],
            raw_packet[11],
        ]);

        let mut csrc = Vec::with_capacity(cc);
        for i in 0..cc {
            let off = CSRC_OFFSET + i * CSRC_LENGTH;
            csrc.push(u32::from_be_bytes([
                raw_packet[off],
                raw_packet[off + 1],
                raw_packet[off + 2],
                raw_packet[off + 3],
            ]));
        }

        let (extension_profile, extensions) = if extension {
            let expected = curr_offset + 4;
            if raw_packet.len() < expected {
                return Err(Error::HeaderSizeInsufficientForExtension.into());
            }
            let extension_profile =
                u16::from_be_bytes([raw_packet[curr_offset], raw_packet[curr_offset + 1]]);
            curr_offset += 2;
            let extension_length = u16::from_be_bytes([
                raw_packet[curr_offset],
                raw_packet[curr_offset + 1],
            ]) as usize
                * 4;
            curr_offset += 2;

            let expected = curr_offset + extension_length;
            if raw_packet.len() < expected {
                return Err(Error::HeaderSizeInsufficientForExtension.into());
            }

            let mut extensions = vec![];
            match extension_profile {
                EXTENSION_PROFILE_ONE_BYTE => {
                    let end = curr_offset + extension_length;
                    while curr_offset < end {
                        let b = raw_packet[curr_offset];
                        if b == 0x00 {
                            curr_offset += 1;
                            continue;
                        }
                        let extid = b >> 4;
                        let len = ((b & 0x0F) + 1) as usize;
                        curr_offset += 1;
                        if extid == EXTENSION_ID_RESERVED {
                            break;
                        }
                        extensions.push(Extension {
                            id: extid,
                            payload: Bytes::copy_from_slice(
                                &raw_packet[curr_offset..curr_offset + len],
                            ),
                        });
                        curr_offset += len;
                    }
                }
                EXTENSION_PROFILE_TWO_BYTE => {
                    let end = curr_offset + extension_length;
                    while curr_offset < end {
                        let b = raw_packet[curr_offset];
                        if b == 0x00 {
                            curr_offset += 1;
                            continue;
                        }
                        let extid = b;
                        curr_offset += 1;
                        let len = raw_packet[curr_offset] as usize;
                        curr_offset += 1;
                        extensions.push(Extension {
                            id: extid,
                            payload: Bytes::copy_from_slice(
                                &raw_packet[curr_offset..curr_offset + len],
                            ),
                        });
                        curr_offset += len;
                    }
                }
                _ => {
                    extensions.push(Extension {
                        id: 0,
                        payload: Bytes::copy_from_slice(
                            &raw_packet[curr_offset..curr_offset + extension_length],
                        ),
                    });
                }
            }

            (extension_profile, extensions)
        } else {
            (0, vec![])
        };

        Ok(Header {
            version,
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension_profile,
            extensions,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_a_minimal_header() {
        let header = Header {
            version: 2,
            payload_type: 96,
            sequence_number: 0x1234,
            timestamp: 0xDEADBEEF,
            ssrc: 0xCAFEBABE,
            marker: true,
            ..Default::default()
        };
        let marshaled = header.marshal().unwrap();
        assert_eq!(marshaled.len(), header.marshal_size());
        let decoded = Header::unmarshal(&marshaled).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn round_trips_csrc_and_one_byte_extension() {
        let mut header = Header {
            version: 2,
            payload_type: 96,
            sequence_number: 7,
            timestamp: 1,
            ssrc: 2,
            csrc: vec![1, 2, 3],
            ..Default::default()
        };
        header
            .set_extension(1, Bytes::from_static(&[0xAA, 0xBB]))
            .unwrap();

        let marshaled = header.marshal().unwrap();
        let decoded = Header::unmarshal(&marshaled).unwrap();
        assert_eq!(header, decoded);
        assert_eq!(decoded.marshal_size(), marshaled.len());
    }

    #[test]
    fn rejects_truncated_buffer() {
        let buf = [0u8; 2];
        assert!(Header::unmarshal(&buf).is_err());
    }
}
