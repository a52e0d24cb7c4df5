//! Decode-path fuzzing: arbitrary bytes must produce errors, never panics.
//! Tests random buffers, truncations, and targeted bit flips of valid saves.

use crate::codec;
use crate::file_header::{unwrap_header, HEADER_SIZE, MAGIC};
use crate::save_types::{SaveData, SAVE_VERSION};

/// Deterministic xorshift64 PRNG so failures reproduce exactly.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

fn valid_save_bytes() -> Vec<u8> {
    codec::encode(&SaveData {
        version: SAVE_VERSION,
        width: 3,
        height: 1,
        heights: vec![1, 0, 1],
        basins: vec![
            crate::save_types::BasinRecord {
                id: simulation::BasinId::new(1, 0),
                depth: 1,
                tiles: vec![(0, 0)],
                volume: 2.0,
                outlets: vec![],
            },
            crate::save_types::BasinRecord {
                id: simulation::BasinId::new(1, 1),
                depth: 1,
                tiles: vec![(2, 0)],
                volume: 0.0,
                outlets: vec![],
            },
        ],
        reservoirs: vec![],
        pumps: vec![],
    })
}

#[test]
fn random_bytes_never_panic() {
    let mut rng = XorShift64::new(0xA17F);
    for size in [0, 1, 4, HEADER_SIZE - 1, HEADER_SIZE, 64, 1024] {
        for _ in 0..50 {
            let mut buf = vec![0u8; size];
            rng.fill(&mut buf);
            let _ = codec::decode(&buf);
            let _ = unwrap_header(&buf);
        }
    }
}

#[test]
fn random_bytes_behind_magic_never_panic() {
    let mut rng = XorShift64::new(0xBEEF);
    for _ in 0..200 {
        let mut buf = vec![0u8; 96];
        rng.fill(&mut buf);
        buf[..4].copy_from_slice(&MAGIC);
        assert!(
            codec::decode(&buf).is_err(),
            "random payload behind magic must not decode"
        );
    }
}

#[test]
fn every_truncation_of_a_valid_save_errors_cleanly() {
    let bytes = valid_save_bytes();
    for len in 0..bytes.len() {
        assert!(
            codec::decode(&bytes[..len]).is_err(),
            "truncation to {len} bytes decoded successfully"
        );
    }
}

#[test]
fn single_bit_flips_are_rejected() {
    let bytes = valid_save_bytes();
    // Flip one bit in every byte position. Payload flips break the checksum;
    // header flips break magic, version, the flag check, the size
    // cross-check, or the checksum comparison itself. Nothing may slip
    // through.
    for pos in 0..bytes.len() {
        let mut corrupted = bytes.clone();
        corrupted[pos] ^= 0x10;
        assert!(
            codec::decode(&corrupted).is_err(),
            "bit flip at byte {pos} was not detected"
        );
    }
}

#[test]
fn decoded_garbage_still_fails_restore_validation() {
    // Hand-build payloads that decode fine but violate simulation structure.
    let mut data = match codec::decode(&valid_save_bytes()) {
        Ok(d) => d,
        Err(e) => panic!("fixture must decode: {e}"),
    };
    data.heights = vec![9; 3]; // depth beyond MAX_DEPTH
    assert!(crate::restore(&data).is_err());
}
