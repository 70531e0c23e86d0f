use std::fmt;
use std::str::FromStr;

use crate::error::ReaderError;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Text encodings a batch can be decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum EncodingKind {
    Utf8,
    /// Little-endian UTF-32.
    Utf32,
    Utf16BE,
    Utf16LE,
    Ascii,
}

impl EncodingKind {
    pub const ALL: [EncodingKind; 5] = [
        EncodingKind::Utf8,
        EncodingKind::Utf32,
        EncodingKind::Utf16BE,
        EncodingKind::Utf16LE,
        EncodingKind::Ascii,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EncodingKind::Utf8 => "utf-8",
            EncodingKind::Utf32 => "utf-32",
            EncodingKind::Utf16BE => "utf-16be",
            EncodingKind::Utf16LE => "utf-16le",
            EncodingKind::Ascii => "ascii",
        }
    }

    /// Decode `bytes` as text. Malformed sequences and trailing partial code
    /// units become U+FFFD; non-ASCII bytes under `Ascii` become `?`.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            EncodingKind::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            EncodingKind::Utf16BE => decode_utf16(bytes, u16::from_be_bytes),
            EncodingKind::Utf16LE => decode_utf16(bytes, u16::from_le_bytes),
            EncodingKind::Utf32 => decode_utf32_le(bytes),
            EncodingKind::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    let has_tail = !chunks.remainder().is_empty();
    let units = chunks
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect::<Vec<u16>>();

    let mut text = String::from_utf16_lossy(&units);
    if has_tail {
        text.push(REPLACEMENT);
    }
    text
}

fn decode_utf32_le(bytes: &[u8]) -> String {
    let chunks = bytes.chunks_exact(4);
    let has_tail = !chunks.remainder().is_empty();

    let mut text: String = chunks
        .map(|chunk| {
            let scalar = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(scalar).unwrap_or(REPLACEMENT)
        })
        .collect();
    if has_tail {
        text.push(REPLACEMENT);
    }
    text
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncodingKind {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "utf8" => Ok(EncodingKind::Utf8),
            "utf32" | "utf32le" => Ok(EncodingKind::Utf32),
            "utf16be" => Ok(EncodingKind::Utf16BE),
            "utf16le" | "utf16" => Ok(EncodingKind::Utf16LE),
            "ascii" | "usascii" => Ok(EncodingKind::Ascii),
            _ => Err(ReaderError::UnsupportedEncoding(s.to_string())),
        }
    }
}
