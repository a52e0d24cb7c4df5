//! Binary codec: bitcode encoding, lz4 compression, checksummed header.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::file_header::{unwrap_header, wrap_with_header, FLAG_COMPRESSED};
use crate::save_error::SaveError;
use crate::save_types::{SaveData, SAVE_VERSION};

/// Serialize a snapshot to the on-disk byte format.
pub fn encode(data: &SaveData) -> Vec<u8> {
    let raw = bitcode::encode(data);
    let compressed = compress_prepend_size(&raw);
    wrap_with_header(&compressed, FLAG_COMPRESSED, raw.len() as u32)
}

/// Parse the on-disk byte format back into a snapshot.
///
/// Validates the header (magic, version, checksum) before touching the
/// payload, and cross-checks the decompressed size against the header.
pub fn decode(bytes: &[u8]) -> Result<SaveData, SaveError> {
    let (header, payload) = unwrap_header(bytes)?;

    let raw = if header.compressed() {
        decompress_size_prepended(payload).map_err(|e| SaveError::Decode(e.to_string()))?
    } else {
        payload.to_vec()
    };
    if raw.len() != header.uncompressed_size as usize {
        return Err(SaveError::Decode(format!(
            "header promises {} uncompressed bytes, payload decompressed to {}",
            header.uncompressed_size,
            raw.len()
        )));
    }

    let data: SaveData = bitcode::decode(&raw)?;
    if data.version > SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save_types::{BasinRecord, PumpRecord, ReservoirRecord};
    use simulation::{BasinId, PumpMode};

    fn sample() -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            width: 4,
            height: 2,
            heights: vec![1, 1, 0, 0, 0, 2, 0, 0],
            basins: vec![
                BasinRecord {
                    id: BasinId::new(1, 0),
                    depth: 1,
                    tiles: vec![(0, 0), (1, 0)],
                    volume: 3.5,
                    outlets: vec![],
                },
                BasinRecord {
                    id: BasinId::new(2, 0),
                    depth: 2,
                    tiles: vec![(1, 1)],
                    volume: 0.0,
                    outlets: vec![BasinId::new(1, 0)],
                },
            ],
            reservoirs: vec![ReservoirRecord { id: 1, volume: 2.0 }],
            pumps: vec![PumpRecord {
                x: 0,
                y: 0,
                mode: PumpMode::Inlet,
                reservoir_id: 1,
            }],
        }
    }

    #[test]
    fn encode_decode_round_trips() {
        let data = sample();
        let bytes = encode(&data);
        let decoded = decode(&bytes).expect("round trip");
        assert_eq!(decoded, data);
    }

    #[test]
    fn rejects_newer_schema_version() {
        let mut data = sample();
        data.version = SAVE_VERSION + 5;
        let err = decode(&encode(&data)).unwrap_err();
        assert!(matches!(err, SaveError::VersionMismatch { .. }));
    }

    #[test]
    fn rejects_garbage_payload_behind_valid_header() {
        use crate::file_header::wrap_with_header;
        let bytes = wrap_with_header(b"definitely not lz4", FLAG_COMPRESSED, 10);
        assert!(matches!(decode(&bytes), Err(SaveError::Decode(_))));
    }

    #[test]
    fn rejects_size_mismatch() {
        let data = sample();
        let raw = bitcode::encode(&data);
        let compressed = compress_prepend_size(&raw);
        // Lie about the uncompressed size.
        let bytes = wrap_with_header(&compressed, FLAG_COMPRESSED, raw.len() as u32 + 1);
        assert!(matches!(decode(&bytes), Err(SaveError::Decode(_))));
    }

    #[test]
    fn compression_shrinks_repetitive_maps() {
        let mut data = sample();
        data.width = 64;
        data.height = 64;
        data.heights = vec![0; 64 * 64];
        data.basins.clear();
        data.pumps.clear();
        let bytes = encode(&data);
        assert!(
            bytes.len() < 64 * 64 / 2,
            "an undug map should compress well, got {} bytes",
            bytes.len()
        );
    }
}
