//! Little-endian primitive codec for PDB structures.
//!
//! Every multi-byte integer in a DBI stream is stored little-endian. This module provides the
//! [`crate::file::io::PdbIO`] trait and a small set of bounds-checked helpers that decode (and, for
//! header round-trips, encode) primitive integers at a given offset of a byte slice.
//!
//! # Key Components
//!
//! - [`crate::file::io::PdbIO`] - Trait mapping a primitive to its fixed-size byte array
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset and advance the offset
//! - [`crate::file::io::write_le_at`] - Write a value at an offset and advance the offset
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dbiscope::file::io::{read_le_at, write_le_at};
//!
//! let mut data = [0u8; 6];
//! let mut offset = 0;
//! write_le_at(&mut data, &mut offset, 0x8664_u16)?;
//! write_le_at(&mut data, &mut offset, -1_i32)?;
//! assert_eq!(data, [0x64, 0x86, 0xFF, 0xFF, 0xFF, 0xFF]);
//!
//! offset = 0;
//! let machine: u16 = read_le_at(&data, &mut offset)?;
//! let stream: i32 = read_le_at(&data, &mut offset)?;
//! assert_eq!((machine, stream), (0x8664, -1));
//! # Ok::<(), dbiscope::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All functions return [`crate::Error::OutOfBounds`] if the buffer does not hold enough bytes
//! for the requested type at the requested offset. The offset is left untouched on failure.

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive types that can be decoded from, and encoded to, little-endian bytes.
///
/// Each implementation names the fixed-size byte array backing the type (e.g. `[u8; 4]` for
/// `u32`). The stream reader and the slice helpers use this to read any integer width through a
/// single generic entry point.
pub trait PdbIO: Sized {
    /// Byte array representation of this type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_pdb_io {
    ($($ty:ty),*) => {
        $(
            impl PdbIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_pdb_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: PdbIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing the offset
/// by the size of `T`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: PdbIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Safely writes a value of type `T` in little-endian byte order at `offset`, advancing the
/// offset by the size of `T`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too small.
pub fn write_le_at<T: PdbIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u8() {
        let result = read_le::<u8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_le_u16() {
        let result = read_le::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_i16_sentinel() {
        let result = read_le::<i16>(&[0xFF, 0xFF]).unwrap();
        assert_eq!(result, -1);
    }

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_i32() {
        let result = read_le::<i32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_u64() {
        let result = read_le::<u64>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0807060504030201);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 2;
        let result = read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(result, 0x0403);
        assert_eq!(offset, 4);

        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(result, 0x0807_0605);
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_le_at_out_of_bounds() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(OutOfBounds)));
        assert_eq!(offset, 6);

        let mut offset = usize::MAX;
        assert!(read_le_at::<u8>(&TEST_BUFFER, &mut offset).is_err());
    }

    #[test]
    fn write_le_values() {
        let mut data = [0u8; 8];
        let mut offset = 0;

        write_le_at(&mut data, &mut offset, 0xFFFF_FFFF_u32).unwrap();
        write_le_at(&mut data, &mut offset, 0x014C_u16).unwrap();
        write_le_at(&mut data, &mut offset, -1_i16).unwrap();

        assert_eq!(data, [0xFF, 0xFF, 0xFF, 0xFF, 0x4C, 0x01, 0xFF, 0xFF]);
        assert_eq!(offset, 8);
    }

    #[test]
    fn write_le_out_of_bounds() {
        let mut data = [0u8; 3];
        let mut offset = 0;
        assert!(write_le_at(&mut data, &mut offset, 1_u32).is_err());
        assert_eq!(data, [0, 0, 0]);
        assert_eq!(offset, 0);
    }

    #[test]
    fn write_then_read() {
        let mut data = [0u8; 4];
        write_le_at(&mut data, &mut 0, 0x1999_0903_u32).unwrap();
        assert_eq!(read_le::<u32>(&data).unwrap(), 0x1999_0903);
    }
}
