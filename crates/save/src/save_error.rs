// ---------------------------------------------------------------------------
// SaveError: typed errors for export/import operations
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while encoding, decoding, or restoring a save.
///
/// Imports are atomic: any of these surfacing from `restore` means no engine
/// state was touched.
#[derive(Debug)]
pub enum SaveError {
    /// The byte stream is not a save file (bad magic or truncated header).
    Header(String),
    /// Save was written by a newer build than this one supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Payload checksum does not match the header (data corruption).
    ChecksumMismatch { expected: u32, found: u32 },
    /// Decompression or bitcode decoding failed.
    Decode(String),
    /// Decoded payload is internally inconsistent (missing basin reference,
    /// tile claimed twice, volume over capacity, ..).
    Validation(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Header(msg) => write!(f, "Invalid save header: {msg}"),
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Save is version {found}, but this build only supports up to {expected_max}"
            ),
            SaveError::ChecksumMismatch { expected, found } => write!(
                f,
                "Checksum mismatch: header says {expected:#010x}, payload hashes to {found:#010x}"
            ),
            SaveError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            SaveError::Validation(msg) => write!(f, "Invalid save payload: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_version_numbers() {
        let err = SaveError::VersionMismatch {
            expected_max: 1,
            found: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains('1') && msg.contains('3'), "got: {msg}");
    }

    #[test]
    fn display_formats_checksums_as_hex() {
        let err = SaveError::ChecksumMismatch {
            expected: 0xDEAD_BEEF,
            found: 0,
        };
        assert!(err.to_string().contains("0xdeadbeef"));
    }

    #[test]
    fn validation_carries_the_detail() {
        let err = SaveError::Validation("basin 2#A outlet 1#B does not exist".into());
        assert!(err.to_string().contains("2#A"));
    }
}
