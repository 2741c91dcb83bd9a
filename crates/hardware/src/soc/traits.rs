//! Device trait for byte-addressed memories.
//!
//! This module defines the `Device` trait implemented by memories attached to a tile. It provides:
//! 1. **Identification:** `name` and `address_range` for diagnostics and bounds checks.
//! 2. **Access:** Byte and doubleword read/write plus word reads at device-relative offsets.
//! 3. **Bulk access:** Slice reads and writes used for host-side setup and inspection.
//!
//! Offsets outside the device are ignored on write and read as zero.

/// Trait for memories attached to a tile.
pub trait Device: Send + Sync {
    /// Returns a short name for this device (e.g., `"SPM"`).
    fn name(&self) -> &str;
    /// Returns (base_address, size_in_bytes) for this device's region.
    fn address_range(&self) -> (u64, u64);
    /// Reads one byte at the given device-relative offset.
    fn read_u8(&self, offset: u64) -> u8;
    /// Writes one byte at the given offset.
    fn write_u8(&mut self, offset: u64, val: u8);

    /// Returns `true` if `len` bytes at `offset` lie inside the device.
    fn contains(&self, offset: u64, len: usize) -> bool {
        let (_, size) = self.address_range();
        offset
            .checked_add(len as u64)
            .is_some_and(|end| end <= size)
    }

    /// Reads four bytes (little-endian) at the given offset.
    fn read_u32(&self, offset: u64) -> u32 {
        let mut buf = [0u8; 4];
        self.read_bytes(offset, &mut buf);
        u32::from_le_bytes(buf)
    }
    /// Reads eight bytes (little-endian) at the given offset.
    fn read_u64(&self, offset: u64) -> u64 {
        let mut buf = [0u8; 8];
        self.read_bytes(offset, &mut buf);
        u64::from_le_bytes(buf)
    }
    /// Writes eight bytes (little-endian) at the given offset.
    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_bytes(offset, &val.to_le_bytes());
    }

    /// Fills `buf` from the given offset (default: byte-by-byte).
    fn read_bytes(&self, offset: u64, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_u8(offset + i as u64);
        }
    }

    /// Writes a contiguous byte slice at the given offset (default: byte-by-byte).
    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(offset + i as u64, *byte);
        }
    }
}
