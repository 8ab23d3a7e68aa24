// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/binary.rs - Bounds-checked binary readers.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `binary` Module
 *
 * Bounds-checked readers for the fixed-layout binary data found in library
 * streams. Every read that would run past the end of its input fails with
 * [Error::Truncated] instead of panicking.
 *
 * ## Usage Example
 *
 * ```
 * use altiumlib::binary::{self, Endian, PrefixWidth};
 *
 * let data = b"\x03abc\x2a";
 * let (body, rest) = binary::read_prefixed(data, PrefixWidth::U8, Endian::Little).unwrap();
 * assert_eq!(body, b"abc");
 * assert_eq!(binary::read_u8(rest, 0).unwrap(), 42);
 * assert!(binary::read_u16_le(rest, 0).is_err());
 * ```
 */

use crate::error::{Error, Result};

/// Byte order of a multi-byte integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Width of the length field in front of a length-prefixed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixWidth {
    U8,
    U32,
}

impl PrefixWidth {
    fn bytes(self) -> usize {
        match self {
            PrefixWidth::U8 => 1,
            PrefixWidth::U32 => 4,
        }
    }
}

/// Returns `data[offset..offset + len]`, or [Error::Truncated] if the range
/// runs past the end of `data`.
pub fn take(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(Error::Truncated {
            offset,
            needed: len,
            available: data.len().saturating_sub(offset),
        })
}

/// Returns everything after the first `count` bytes of `data`.
pub fn skip(data: &[u8], count: usize) -> Result<&[u8]> {
    data.get(count..).ok_or(Error::Truncated {
        offset: 0,
        needed: count,
        available: data.len(),
    })
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(take(data, offset, 1)?[0])
}

pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = take(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn read_i16_le(data: &[u8], offset: usize) -> Result<i16> {
    let bytes = take(data, offset, 2)?;
    Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn read_u32(data: &[u8], offset: usize, endian: Endian) -> Result<u32> {
    let bytes: [u8; 4] = [
        read_u8(data, offset)?,
        read_u8(data, offset + 1)?,
        read_u8(data, offset + 2)?,
        read_u8(data, offset + 3)?,
    ];
    Ok(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

/// Reads a length-prefixed blob from the start of `data`.
///
/// Returns the blob and everything after it. The length field itself is
/// never part of either slice.
pub fn read_prefixed(data: &[u8], width: PrefixWidth, endian: Endian) -> Result<(&[u8], &[u8])> {
    let len = match width {
        PrefixWidth::U8 => read_u8(data, 0)? as usize,
        PrefixWidth::U32 => read_u32(data, 0, endian)? as usize,
    };

    let start = width.bytes();
    let body = take(data, start, len)?;
    Ok((body, &data[start + len..]))
}

/// Like [read_prefixed], decoding the blob as UTF-8 with lossy replacement.
pub fn read_prefixed_str(
    data: &[u8],
    width: PrefixWidth,
    endian: Endian,
) -> Result<(String, &[u8])> {
    let (body, rest) = read_prefixed(data, width, endian)?;
    Ok((String::from_utf8_lossy(body).into_owned(), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_prefixed_u8() {
        let data = b"\x05SSSSSxxxxx";
        for endian in [Endian::Little, Endian::Big] {
            let (body, rest) = read_prefixed(data, PrefixWidth::U8, endian).unwrap();
            assert_eq!(body, b"SSSSS");
            assert_eq!(rest, b"xxxxx");
        }
    }

    #[test]
    fn test_read_prefixed_u32() {
        let little = b"\x05\x00\x00\x00SSSSSxxxxx";
        let (body, rest) = read_prefixed(little, PrefixWidth::U32, Endian::Little).unwrap();
        assert_eq!(body, b"SSSSS");
        assert_eq!(rest, b"xxxxx");

        let big = b"\x00\x00\x00\x05SSSSSxxxxx";
        let (text, rest) = read_prefixed_str(big, PrefixWidth::U32, Endian::Big).unwrap();
        assert_eq!(text, "SSSSS");
        assert_eq!(rest, b"xxxxx");
    }

    #[test]
    fn test_read_prefixed_empty() {
        let (body, rest) = read_prefixed(b"\x00abc", PrefixWidth::U8, Endian::Little).unwrap();
        assert!(body.is_empty());
        assert_eq!(rest, b"abc");
    }

    #[test]
    fn test_read_prefixed_truncated() {
        assert!(matches!(
            read_prefixed(b"\x09abc", PrefixWidth::U8, Endian::Little),
            Err(Error::Truncated { needed: 9, .. })
        ));
        assert!(read_prefixed(b"", PrefixWidth::U8, Endian::Little).is_err());
        assert!(read_prefixed(b"\x01\x00", PrefixWidth::U32, Endian::Little).is_err());
    }

    #[test]
    fn test_read_ints() {
        let data = [0x32, 0x00, 0xA6, 0xFF];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 50);
        assert_eq!(read_i16_le(&data, 2).unwrap(), -90);
        assert!(read_i16_le(&data, 3).is_err());
    }
}
