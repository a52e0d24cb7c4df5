// ---------------------------------------------------------------------------
// file_header – save header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header layout (20 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "AQFR"
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4-compressed payload)
//   [12..16] Uncompressed payload size (u32)
//   [16..20] xxHash32 checksum of the payload (everything after the header)
//
// On export: encode SaveData -> compress -> prepend header (checksum over the
// compressed payload). On import: check magic -> check version -> verify
// checksum -> hand the payload to the codec.

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying an Aquifer save.
pub const MAGIC: [u8; 4] = *b"AQFR";

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 20;

/// Current header format version.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Flag bit: payload is lz4-compressed.
pub const FLAG_COMPRESSED: u32 = 1;

/// Seed for the xxHash32 checksum.
const XXHASH_SEED: u32 = 0;

/// Parsed header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Prepend a header to an encoded payload.
pub fn wrap_with_header(payload: &[u8], flags: u32, uncompressed_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parse and validate the header, returning it along with the payload slice.
///
/// Rejects missing magic, truncated headers, headers from newer builds,
/// unknown flag bits, and payloads whose checksum does not match.
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Err(SaveError::Header(
            "missing AQFR magic bytes (not a save file)".into(),
        ));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::Header(format!(
            "file is {} bytes, need at least {HEADER_SIZE} for the header",
            bytes.len()
        )));
    }

    let u32_at = |offset: usize| {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    };
    let header = FileHeader {
        format_version: u32_at(4),
        flags: u32_at(8),
        uncompressed_size: u32_at(12),
        checksum: u32_at(16),
    };

    if header.format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: header.format_version,
        });
    }
    if header.flags & !FLAG_COMPRESSED != 0 {
        return Err(SaveError::Header(format!(
            "unknown flag bits set: {:#010x}",
            header.flags
        )));
    }

    let payload = &bytes[HEADER_SIZE..];
    let found = xxh32(payload, XXHASH_SEED);
    if found != header.checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: header.checksum,
            found,
        });
    }

    Ok((header, payload))
}
