//! Guest memory.
//!
//! The executor reaches memory through the [`GuestMemory`] trait so a host
//! can plug in its own address space. [`SparseMemory`] is a paged
//! implementation where only mapped pages are accessible; any access that
//! touches an unmapped page faults.

use crate::{EmulationError, EmulationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page size for memory (4KB).
const PAGE_SIZE: u64 = 4096;
const PAGE_MASK: u64 = PAGE_SIZE - 1;

/// Byte-addressed guest memory.
pub trait GuestMemory {
    /// Fills `buf` from `address`, or faults without side effects.
    fn read(&self, address: u64, buf: &mut [u8]) -> EmulationResult<()>;

    /// Writes `data` at `address`, or faults without side effects.
    fn write(&mut self, address: u64, data: &[u8]) -> EmulationResult<()>;

    /// Reads a little-endian value of `size` bytes (at most 8).
    fn read_uint(&self, address: u64, size: usize) -> EmulationResult<u64> {
        let mut buf = [0u8; 8];
        self.read(address, &mut buf[..size])?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes the low `size` bytes of `value`, little-endian.
    fn write_uint(&mut self, address: u64, value: u64, size: usize) -> EmulationResult<()> {
        self.write(address, &value.to_le_bytes()[..size])
    }
}

/// A page of memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MemoryPage {
    bytes: Vec<u8>, // Vec rather than an array for serde
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self {
            bytes: vec![0; PAGE_SIZE as usize],
        }
    }
}

/// Sparse memory model: only explicitly mapped pages are accessible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMemory {
    /// Pages indexed by page number (address >> 12).
    pages: HashMap<u64, MemoryPage>,
}

impl SparseMemory {
    /// Create a new memory with nothing mapped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps zero-filled pages covering `[base, base + size)`.
    pub fn map_region(&mut self, base: u64, size: u64) {
        if size == 0 {
            return;
        }
        let first = base >> 12;
        let last = base.saturating_add(size - 1) >> 12;
        for page in first..=last {
            self.pages.entry(page).or_default();
        }
    }

    /// Maps the pages covering a section and copies its contents in.
    pub fn load_section(&mut self, base_address: u64, data: &[u8]) {
        self.map_region(base_address, data.len() as u64);
        for (i, &byte) in data.iter().enumerate() {
            self.poke(base_address.wrapping_add(i as u64), byte);
        }
    }

    /// Removes the pages covering `[base, base + size)`.
    pub fn unmap_region(&mut self, base: u64, size: u64) {
        if size == 0 {
            return;
        }
        let first = base >> 12;
        let last = base.saturating_add(size - 1) >> 12;
        for page in first..=last {
            self.pages.remove(&page);
        }
    }

    /// Returns true if every byte of `[address, address + len)` is mapped.
    pub fn is_mapped(&self, address: u64, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        let Some(end) = address.checked_add(len as u64 - 1) else {
            return false;
        };
        (address >> 12..=end >> 12).all(|page| self.pages.contains_key(&page))
    }

    /// Get number of mapped pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn peek(&self, address: u64) -> u8 {
        self.pages
            .get(&(address >> 12))
            .map_or(0, |p| p.bytes[(address & PAGE_MASK) as usize])
    }

    fn poke(&mut self, address: u64, byte: u8) {
        if let Some(page) = self.pages.get_mut(&(address >> 12)) {
            page.bytes[(address & PAGE_MASK) as usize] = byte;
        }
    }
}

impl GuestMemory for SparseMemory {
    fn read(&self, address: u64, buf: &mut [u8]) -> EmulationResult<()> {
        if !self.is_mapped(address, buf.len()) {
            return Err(EmulationError::MemoryFault {
                address,
                size: buf.len(),
            });
        }
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.peek(address + i as u64);
        }
        Ok(())
    }

    fn write(&mut self, address: u64, data: &[u8]) -> EmulationResult<()> {
        if !self.is_mapped(address, data.len()) {
            return Err(EmulationError::MemoryFault {
                address,
                size: data.len(),
            });
        }
        for (i, &byte) in data.iter().enumerate() {
            self.poke(address + i as u64, byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_mapped() {
        let mut mem = SparseMemory::new();
        mem.map_region(0x1000, 0x1000);

        mem.write_uint(0x1000, 0xDEADBEEF, 4).unwrap();
        assert_eq!(mem.read_uint(0x1000, 4).unwrap(), 0xDEADBEEF);

        // Check individual bytes (little-endian)
        assert_eq!(mem.read_uint(0x1000, 1).unwrap(), 0xEF);
        assert_eq!(mem.read_uint(0x1003, 1).unwrap(), 0xDE);
    }

    #[test]
    fn test_unmapped_faults() {
        let mut mem = SparseMemory::new();
        let err = mem.read_uint(0x2000, 8).unwrap_err();
        assert!(matches!(err, EmulationError::MemoryFault { address: 0x2000, size: 8 }));
        assert!(mem.write_uint(0x2000, 1, 1).is_err());
    }

    #[test]
    fn test_load_section() {
        let mut mem = SparseMemory::new();
        mem.load_section(0x1ffe, &[0x11, 0x22, 0x33, 0x44]);
        assert_eq!(mem.page_count(), 2);
        assert_eq!(mem.read_uint(0x1ffe, 4).unwrap(), 0x44332211);
    }

    #[test]
    fn test_cross_page_access() {
        let mut mem = SparseMemory::new();
        mem.map_region(0x0, 0x1000);

        // Straddles into an unmapped page: faults without writing.
        assert!(mem.write_uint(0xffe, 0xAABBCCDD, 4).is_err());
        assert_eq!(mem.read_uint(0xffe, 2).unwrap(), 0);

        mem.map_region(0x1000, 1);
        mem.write_uint(0xffe, 0xAABBCCDD, 4).unwrap();
        assert_eq!(mem.read_uint(0xffe, 4).unwrap(), 0xAABBCCDD);

        mem.unmap_region(0x1000, 1);
        assert!(!mem.is_mapped(0xffe, 4));
    }
}
