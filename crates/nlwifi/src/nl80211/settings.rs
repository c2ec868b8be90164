//! Single-scan settings as exchanged with the framework service.
//!
//! The wire layout follows the framework's parcel conventions: every scalar
//! is a little-endian 32-bit slot, booleans included; a byte vector is a
//! length followed by the bytes padded to 4; a typed list is a count
//! followed by entries each prefixed with a `1` presence marker.
//!
//! ```text
//! i32 scan_type | i32 enable_6ghz_rnr
//! i32 n | n * (i32 1, i32 frequency)
//! i32 m | m * (i32 1, bytes ssid)
//! bytes vendor_ies
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::types::ScanType;
use crate::netlink::{Error, Result};

/// Length of a null byte vector and count of a null list.
const NULL_LEN: i32 = -1;

/// Prefix of every non-null list entry.
const PRESENT: i32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSettings {
    /// MHz.
    pub frequency: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenNetwork {
    pub ssid: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleScanSettings {
    pub scan_type: ScanType,
    pub enable_6ghz_rnr: bool,
    pub channel_settings: Vec<ChannelSettings>,
    pub hidden_networks: Vec<HiddenNetwork>,
    pub vendor_ies: Vec<u8>,
}

fn pad4(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn put_byte_vector(buf: &mut BytesMut, data: &[u8]) {
    buf.put_i32_le(data.len() as i32);
    buf.put_slice(data);
    buf.put_bytes(0, pad4(data.len()));
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl Reader<'_> {
    fn i32(&mut self, what: &str) -> Result<i32> {
        if self.buf.remaining() < 4 {
            return Err(Error::Parcel(format!("truncated before {}", what)));
        }
        Ok(self.buf.get_i32_le())
    }

    /// A null (-1) or any other negative length reads as an empty vector.
    fn byte_vector(&mut self, what: &str) -> Result<Vec<u8>> {
        let len = self.i32(what)?;
        if len <= NULL_LEN {
            return Ok(Vec::new());
        }
        let len = len as usize;
        if self.buf.remaining() < len {
            return Err(Error::Parcel(format!(
                "{} declares {} bytes, {} left",
                what,
                len,
                self.buf.remaining()
            )));
        }
        let data = self.buf[..len].to_vec();
        self.buf.advance(len);
        let pad = pad4(len).min(self.buf.remaining());
        self.buf.advance(pad);
        Ok(data)
    }

    /// Read a typed list; zero and the null count both give an empty list.
    fn list<T>(
        &mut self,
        what: &str,
        mut entry: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let count = self.i32(what)?;
        let mut out = Vec::new();
        for _ in 0..count.max(0) {
            let marker = self.i32(what)?;
            if marker != PRESENT {
                return Err(Error::Parcel(format!(
                    "unexpected marker {} before {} entry",
                    marker, what
                )));
            }
            out.push(entry(self)?);
        }
        Ok(out)
    }
}

impl SingleScanSettings {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_i32_le(self.scan_type.as_raw());
        buf.put_i32_le(i32::from(self.enable_6ghz_rnr));

        buf.put_i32_le(self.channel_settings.len() as i32);
        for channel in &self.channel_settings {
            buf.put_i32_le(PRESENT);
            buf.put_i32_le(channel.frequency);
        }

        buf.put_i32_le(self.hidden_networks.len() as i32);
        for network in &self.hidden_networks {
            buf.put_i32_le(PRESENT);
            put_byte_vector(&mut buf, &network.ssid);
        }

        put_byte_vector(&mut buf, &self.vendor_ies);
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader { buf: data };

        let scan_type = ScanType::from_raw(r.i32("scan type")?)?;
        let enable_6ghz_rnr = r.i32("6 GHz RNR flag")? != 0;
        let channel_settings = r.list("channel", |r| {
            Ok(ChannelSettings {
                frequency: r.i32("channel frequency")?,
            })
        })?;
        let hidden_networks = r.list("hidden network", |r| {
            Ok(HiddenNetwork {
                ssid: r.byte_vector("hidden network SSID")?,
            })
        })?;
        let vendor_ies = r.byte_vector("vendor IEs")?;

        Ok(Self {
            scan_type,
            enable_6ghz_rnr,
            channel_settings,
            hidden_networks,
            vendor_ies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(n: usize) -> SingleScanSettings {
        SingleScanSettings {
            scan_type: ScanType::HighAccuracy,
            enable_6ghz_rnr: n % 2 == 1,
            channel_settings: (0..n)
                .map(|i| ChannelSettings {
                    frequency: 2412 + 5 * i as i32,
                })
                .collect(),
            hidden_networks: (0..n)
                .map(|i| HiddenNetwork {
                    ssid: format!("net{}", "x".repeat(i)).into_bytes(),
                })
                .collect(),
            vendor_ies: vec![0xdd; n],
        }
    }

    #[test]
    fn decode_inverts_encode() {
        for n in [0, 1, 5] {
            let original = settings(n);
            let decoded = SingleScanSettings::decode(&original.encode()).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn byte_vectors_are_padded() {
        let s = SingleScanSettings {
            vendor_ies: vec![1, 2, 3],
            ..Default::default()
        };
        // type, rnr, 0 channels, 0 networks, len + 4 padded bytes
        assert_eq!(s.encode().len(), 4 * 5 + 4);
    }

    #[test]
    fn null_lists_decode_empty() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(ScanType::LowSpan.as_raw());
        buf.put_i32_le(0);
        buf.put_i32_le(NULL_LEN);
        buf.put_i32_le(NULL_LEN);
        buf.put_i32_le(NULL_LEN);

        let decoded = SingleScanSettings::decode(&buf).unwrap();
        assert_eq!(
            decoded,
            SingleScanSettings {
                scan_type: ScanType::LowSpan,
                ..Default::default()
            }
        );
    }

    #[test]
    fn negative_ssid_length_decodes_empty() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(ScanType::HighAccuracy.as_raw());
        buf.put_i32_le(1);
        buf.put_i32_le(0);
        buf.put_i32_le(1);
        buf.put_i32_le(PRESENT);
        buf.put_i32_le(-3);
        buf.put_i32_le(0);

        let decoded = SingleScanSettings::decode(&buf).unwrap();
        assert_eq!(decoded.hidden_networks, vec![HiddenNetwork { ssid: Vec::new() }]);
        assert!(decoded.enable_6ghz_rnr);
        assert!(decoded.vendor_ies.is_empty());
    }

    #[test]
    fn bad_marker_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(ScanType::LowPower.as_raw());
        buf.put_i32_le(1);
        buf.put_i32_le(1);
        buf.put_i32_le(0); // null entry
        buf.put_i32_le(2412);

        assert!(matches!(
            SingleScanSettings::decode(&buf),
            Err(Error::Parcel(_))
        ));
    }

    #[test]
    fn invalid_scan_type_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(7);
        assert!(matches!(
            SingleScanSettings::decode(&buf),
            Err(Error::InvalidScanType(7))
        ));
    }

    #[test]
    fn truncated_parcel_is_rejected() {
        let encoded = settings(2).encode();
        let cut = &encoded[..encoded.len() - 6];
        assert!(matches!(
            SingleScanSettings::decode(cut),
            Err(Error::Parcel(_))
        ));
    }
}
