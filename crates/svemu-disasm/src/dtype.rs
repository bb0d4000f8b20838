//! Memory data-type tables for contiguous and broadcast loads.
//!
//! The 4-bit `dtype` field combines the memory access size, whether the
//! loaded value is sign-extended, and the destination element size.

use svemu_core::ElementSize;

/// Memory access size (log2 bytes) and signedness per `dtype`.
const DTYPE_MOP: [(u8, bool); 16] = [
    (0, false),
    (0, false),
    (0, false),
    (0, false),
    (2, true),
    (1, false),
    (1, false),
    (1, false),
    (1, true),
    (1, true),
    (2, false),
    (2, false),
    (0, true),
    (0, true),
    (0, true),
    (3, false),
];

/// Destination element size (log2 bytes) per `dtype`.
const DTYPE_ESZ: [u8; 16] = [0, 1, 2, 3, 3, 1, 2, 3, 3, 2, 2, 3, 3, 2, 1, 3];

/// log2 of the memory access size for `dtype`.
pub fn dtype_msz(dtype: u8) -> u8 {
    DTYPE_MOP[(dtype & 15) as usize].0
}

/// Whether `dtype` sign-extends the loaded value.
pub fn dtype_signed(dtype: u8) -> bool {
    DTYPE_MOP[(dtype & 15) as usize].1
}

/// Destination element size for `dtype`.
pub fn dtype_esz(dtype: u8) -> ElementSize {
    ElementSize::from_bits(DTYPE_ESZ[(dtype & 15) as usize] as u32)
}

/// The `dtype` that loads `msz`-sized unsigned values into `esz` lanes
/// (the encoding used by structured and replicating loads).
pub fn msz_dtype(msz: u8) -> u8 {
    msz * 5
}

/// Load mnemonic suffix for `dtype`, e.g. `sb` for `ld1sb`.
pub fn dtype_suffix(dtype: u8) -> String {
    let sign = if dtype_signed(dtype) { "s" } else { "" };
    format!("{}{}", sign, msz_suffix(dtype_msz(dtype)))
}

/// Access-size letter for `msz`.
pub fn msz_suffix(msz: u8) -> char {
    match msz & 3 {
        0 => 'b',
        1 => 'h',
        2 => 'w',
        _ => 'd',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_tables() {
        // ld1sw z0.d
        assert_eq!(dtype_msz(4), 2);
        assert!(dtype_signed(4));
        assert_eq!(dtype_esz(4), ElementSize::D);
        // ld1sb z0.h
        assert_eq!(dtype_suffix(14), "sb");
        assert_eq!(dtype_esz(14), ElementSize::H);
        assert_eq!(dtype_suffix(15), "d");
    }

    #[test]
    fn test_msz_dtype_is_unsigned_same_size() {
        for msz in 0..4u8 {
            let dtype = msz_dtype(msz);
            assert_eq!(dtype_msz(dtype), msz);
            assert_eq!(dtype_esz(dtype).log2(), msz as u32);
            assert!(!dtype_signed(dtype));
        }
    }
}
