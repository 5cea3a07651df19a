//! Running CRC32 accumulator
//!
//! Same polynomial as zlib/PNG (0xEDB88320 reflected), which is what yEnc
//! `crc32=` / `pcrc32=` keywords carry.

use crc32fast::Hasher;

/// Incremental CRC32 over a byte stream
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Crc32({:08x})", self.value())
    }
}

impl Crc32 {
    /// Create an accumulator in the reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything folded in so far
    pub fn reset(&mut self) {
        self.hasher.reset();
    }

    /// Fold `bytes` into the running value, in order
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Finalized CRC of all bytes seen since the last reset
    pub fn value(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

/// One-shot CRC32 of a buffer
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}
