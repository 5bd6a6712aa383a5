use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuidParseError {
    #[error("expected 5 hyphen-separated groups, got {0}")]
    GroupCount(usize),
    #[error("group {index} has length {len}, expected {expected}")]
    GroupLength {
        index: usize,
        len: usize,
        expected: usize,
    },
    #[error("group {0} contains a non-hex digit")]
    NonHexDigit(usize),
    #[error("unbalanced braces")]
    UnbalancedBraces,
}

/// 128-bit product or upgrade code. Field layout matches the installer's
/// GUID struct: data1/data2/data3 are stored little-endian in the
/// 16-byte form the registry keys on, data4 is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

impl Guid {
    pub fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Guid {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// 16-byte mixed-endian layout: data1/data2/data3 little-endian,
    /// data4 in natural order.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&self.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
        bytes[8..].copy_from_slice(&self.data4);
        bytes
    }

    /// The squished form used as a key under the installer's Products
    /// hive: each byte nibble-swapped, hex-encoded uppercase, no
    /// delimiters. 32 characters exactly.
    pub fn registry_path_segment(&self) -> String {
        let mut segment = String::with_capacity(32);
        for b in self.to_bytes() {
            let swapped = ((b & 0x0f) << 4) | ((b & 0xf0) >> 4);
            segment.push_str(&format!("{:02X}", swapped));
        }
        segment
    }
}

impl fmt::Display for Guid {
    /// Braced uppercase form, the shape the installer APIs take as input.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl FromStr for Guid {
    type Err = GuidParseError;

    /// Accepts braced or plain hyphenated text, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let inner = match (s.strip_prefix('{'), s.strip_suffix('}')) {
            (Some(_), Some(_)) => &s[1..s.len() - 1],
            (None, None) => s,
            _ => return Err(GuidParseError::UnbalancedBraces),
        };

        let groups: Vec<&str> = inner.split('-').collect();
        if groups.len() != GROUP_LENGTHS.len() {
            return Err(GuidParseError::GroupCount(groups.len()));
        }
        for (index, (group, &expected)) in groups.iter().zip(GROUP_LENGTHS.iter()).enumerate() {
            if group.len() != expected {
                return Err(GuidParseError::GroupLength {
                    index,
                    len: group.len(),
                    expected,
                });
            }
            if !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(GuidParseError::NonHexDigit(index));
            }
        }

        let data1 = u32::from_str_radix(groups[0], 16).map_err(|_| GuidParseError::NonHexDigit(0))?;
        let data2 = u16::from_str_radix(groups[1], 16).map_err(|_| GuidParseError::NonHexDigit(1))?;
        let data3 = u16::from_str_radix(groups[2], 16).map_err(|_| GuidParseError::NonHexDigit(2))?;

        let mut data4 = [0u8; 8];
        let tail: String = format!("{}{}", groups[3], groups[4]);
        for (i, chunk) in data4.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&tail[i * 2..i * 2 + 2], 16)
                .map_err(|_| GuidParseError::NonHexDigit(3))?;
        }

        Ok(Guid {
            data1,
            data2,
            data3,
            data4,
        })
    }
}
