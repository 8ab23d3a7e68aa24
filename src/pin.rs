// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/pin.rs - Binary pin sub-record extraction for schematic libraries.
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
 * # `pin` Module
 *
 * Schematic pins have no textual record of their own. Altium writes them as
 * fixed-layout binary chunks directly after a NUL byte inside the value of
 * whatever text field precedes them, so they have to be cut out of the text
 * records before those are normalized.
 *
 * Layout of one pin chunk (integers are little-endian):
 *
 * | Offset | Size | Contents |
 * |--------|------|----------|
 * | 0 | 17 | Reserved |
 * | 17 | 1 + n | Description, length-prefixed |
 * | +0 | 1 | Reserved |
 * | +1 | 1 | Electrical type |
 * | +2 | 1 | Flags: bits 0-1 rotation, bit 3 designator hidden, bit 4 name hidden |
 * | +3 | 2 | Pin length / 10 |
 * | +5 | 2 | X (signed) |
 * | +7 | 2 | Y (signed) |
 * | +9 | 4 | Reserved |
 * | +13 | 1 + n | Name, length-prefixed |
 * | | 1 + n | Designator, length-prefixed |
 * | | 5 | Skipped before the next chunk |
 */

use log::{debug, trace};
use memchr::memchr;

use crate::binary::{self, Endian, PrefixWidth};
use crate::error::{Error, Result};
use crate::record::RecordKind;
use crate::tokenizer::{NormalizedRecord, RawRecord};

const PREAMBLE_LEN: usize = 17;
const RESERVED_AFTER_COORDS: usize = 13;
const TRAILING_SKIP: usize = 5;

/// Chunks shorter than this cannot hold a pin.
pub const MIN_CHUNK_LEN: usize = 11;

/// Trailers of this many bytes or fewer (after the NUL) are junk.
pub const MIN_TRAILER_LEN: usize = 20;

const ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// The electrical type of a schematic pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElectricalType {
    Input = 0,
    Io = 1,
    Output = 2,
    OpenCollector = 3,
    Passive = 4,
    HighZ = 5,
    OpenEmitter = 6,
    Power = 7,
}

impl ElectricalType {
    pub fn from_discriminant(value: i64) -> Option<Self> {
        match value {
            0 => Some(ElectricalType::Input),
            1 => Some(ElectricalType::Io),
            2 => Some(ElectricalType::Output),
            3 => Some(ElectricalType::OpenCollector),
            4 => Some(ElectricalType::Passive),
            5 => Some(ElectricalType::HighZ),
            6 => Some(ElectricalType::OpenEmitter),
            7 => Some(ElectricalType::Power),
            _ => None,
        }
    }
}

/// A schematic pin recovered from a binary chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRecord {
    pub description: Option<String>,
    pub electrical_type: ElectricalType,
    /// Rotation in degrees: 0, 90, 180, or 270.
    pub rotation: u16,
    pub designator_hidden: bool,
    pub name_hidden: bool,
    pub length: u32,
    pub x: i32,
    pub y: i32,
    pub name: String,
    pub designator: String,
}

impl PinRecord {
    /// Builds a pin from a normalized `RECORD=2` record.
    ///
    /// Missing fields take their zero value; an unknown electrical type
    /// falls back to [ElectricalType::Passive].
    pub fn from_normalized(record: &NormalizedRecord) -> Self {
        Self {
            description: record.get_text("Description"),
            electrical_type: record
                .get_int("PinType")
                .and_then(ElectricalType::from_discriminant)
                .unwrap_or(ElectricalType::Passive),
            rotation: record
                .get_int("Rotation")
                .and_then(|r| u16::try_from(r).ok())
                .unwrap_or(0),
            designator_hidden: record.get_bool("Hide_Designator").unwrap_or(false),
            name_hidden: record.get_bool("Hide_Name").unwrap_or(false),
            length: record
                .get_int("PinLength")
                .and_then(|l| u32::try_from(l).ok())
                .unwrap_or(0),
            x: record
                .get_int("Location.X")
                .and_then(|x| i32::try_from(x).ok())
                .unwrap_or(0),
            y: record
                .get_int("Location.Y")
                .and_then(|y| i32::try_from(y).ok())
                .unwrap_or(0),
            name: record.get_text("Name").unwrap_or_default(),
            designator: record.get_text("Designator").unwrap_or_default(),
        }
    }

    pub fn to_normalized(&self) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        record.insert("RECORD", RecordKind::Pin as i64);
        if let Some(description) = &self.description {
            record.insert("Description", description.as_str());
        }
        record.insert("PinType", self.electrical_type as i64);
        record.insert("Rotation", i64::from(self.rotation));
        record.insert("Hide_Designator", self.designator_hidden);
        record.insert("Hide_Name", self.name_hidden);
        record.insert("PinLength", i64::from(self.length));
        record.insert("Location.X", i64::from(self.x));
        record.insert("Location.Y", i64::from(self.y));
        record.insert("Name", self.name.as_str());
        record.insert("Designator", self.designator.as_str());
        record
    }

    /// Converts the pin to text fields so it can travel through the same
    /// normalize-and-dispatch path as every other record.
    pub fn to_raw_record(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        for (key, value) in self.to_normalized().iter() {
            raw.insert(key, value.to_string());
        }
        raw
    }
}

/// Decodes one pin chunk starting at `offset`.
///
/// Returns the pin and the offset of the next chunk, or `None` if the chunk
/// is truncated or malformed.
pub fn try_read_pin(buf: &[u8], offset: usize) -> Option<(PinRecord, usize)> {
    match read_pin(buf, offset) {
        Ok(result) => Some(result),
        Err(err) => {
            debug!("Abandoning pin chunk at offset {}: {}", offset, err);
            None
        }
    }
}

fn read_pin(buf: &[u8], offset: usize) -> Result<(PinRecord, usize)> {
    let chunk = binary::skip(buf, offset)?;
    let s = binary::skip(chunk, PREAMBLE_LEN)?;

    let (description, s) = binary::read_prefixed_str(s, PrefixWidth::U8, Endian::Little)?;

    let type_byte = binary::read_u8(s, 1)?;
    let electrical_type = ElectricalType::from_discriminant(type_byte.into())
        .ok_or_else(|| Error::invalid(type_byte.to_string(), "unknown pin electrical type"))?;

    let flags = binary::read_u8(s, 2)?;
    let length = u32::from(binary::read_u16_le(s, 3)?) * 10;
    let x = binary::read_i16_le(s, 5)?;
    let y = binary::read_i16_le(s, 7)?;

    let s = binary::skip(s, RESERVED_AFTER_COORDS)?;
    let (name, s) = binary::read_prefixed_str(s, PrefixWidth::U8, Endian::Little)?;
    let (designator, s) = binary::read_prefixed_str(s, PrefixWidth::U8, Endian::Little)?;

    let next = buf.len() - s.len() + TRAILING_SKIP.min(s.len());

    let pin = PinRecord {
        description: (!description.is_empty()).then_some(description),
        electrical_type,
        rotation: ROTATIONS[(flags & 0x03) as usize],
        designator_hidden: flags & 0x08 != 0,
        name_hidden: flags & 0x10 != 0,
        length,
        x: x.into(),
        y: y.into(),
        name,
        designator,
    };
    trace!("Decoded pin {:?} at offset {}", pin.designator, offset);

    Ok((pin, next))
}

/// Decodes consecutive pin chunks until fewer than [MIN_CHUNK_LEN] bytes
/// remain or a chunk fails to decode. Pins decoded before a failure are kept.
pub fn extract_pins(buf: &[u8]) -> Vec<PinRecord> {
    let mut pins = Vec::new();
    let mut offset = 0;

    while buf.len() - offset >= MIN_CHUNK_LEN {
        match try_read_pin(buf, offset) {
            Some((pin, next)) => {
                pins.push(pin);
                offset = next;
            }
            None => break,
        }
    }

    pins
}

/// Cuts embedded binary pin data out of text records.
///
/// Every value holding a NUL byte is truncated at the NUL. If more than
/// [MIN_TRAILER_LEN] bytes follow it, the NUL and the bytes after it are
/// decoded as pin chunks, and the resulting pins are inserted directly after
/// the record that hosted them.
pub fn split_pin_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut out = Vec::with_capacity(records.len());

    for mut record in records {
        let mut pins = Vec::new();

        for value in record.values_mut() {
            let Some(nul) = memchr(0, value) else {
                continue;
            };

            // The trailer keeps the NUL as its first byte.
            let trailer = value.split_off(nul);
            if trailer.len() - 1 > MIN_TRAILER_LEN {
                pins.extend(extract_pins(&trailer));
            }
        }

        out.push(record);
        out.extend(pins.iter().map(PinRecord::to_raw_record));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn pin_chunk(description: &str, name: &str, designator: &str) -> Vec<u8> {
        let mut chunk = hex("0027000001020000000001000000000000");
        chunk.push(description.len() as u8);
        chunk.extend_from_slice(description.as_bytes());
        chunk.push(0x01);
        chunk.push(0x07);
        chunk.push(0b10011);
        chunk.extend_from_slice(&50u16.to_le_bytes());
        chunk.extend_from_slice(&110i16.to_le_bytes());
        chunk.extend_from_slice(&(-90i16).to_le_bytes());
        chunk.extend_from_slice(&[0, 0, 0, 0]);
        chunk.push(name.len() as u8);
        chunk.extend_from_slice(name.as_bytes());
        chunk.push(designator.len() as u8);
        chunk.extend_from_slice(designator.as_bytes());
        chunk.extend_from_slice(&hex("00037c267c"));
        chunk
    }

    #[test]
    fn test_try_read_pin() {
        let mut buf = pin_chunk("My Description", "Pin () Name", "PinDes");
        let after = hex("0a0a0a0a0a");
        buf.extend_from_slice(&after);

        let (pin, next) = try_read_pin(&buf, 0).unwrap();

        assert_eq!(
            pin,
            PinRecord {
                description: Some("My Description".to_string()),
                electrical_type: ElectricalType::Power,
                rotation: 270,
                designator_hidden: false,
                name_hidden: true,
                length: 500,
                x: 110,
                y: -90,
                name: "Pin () Name".to_string(),
                designator: "PinDes".to_string(),
            }
        );
        assert_eq!(&buf[next..], after.as_slice());
    }

    #[test]
    fn test_try_read_pin_without_description() {
        let buf = pin_chunk("", "A", "1");
        let (pin, next) = try_read_pin(&buf, 0).unwrap();
        assert_eq!(pin.description, None);
        assert_eq!(pin.name, "A");
        assert_eq!(next, buf.len());
    }

    #[test]
    fn test_try_read_pin_truncated() {
        let buf = pin_chunk("desc", "NAME", "DES");
        // Cut inside the designator string.
        let cut = &buf[..buf.len() - 7];
        assert!(try_read_pin(cut, 0).is_none());
        assert!(try_read_pin(&buf, buf.len() + 3).is_none());
    }

    #[test]
    fn test_try_read_pin_bad_type() {
        let mut buf = pin_chunk("", "A", "1");
        buf[PREAMBLE_LEN + 2] = 0x42;
        assert!(try_read_pin(&buf, 0).is_none());
    }

    #[test]
    fn test_extract_pins_multiple() {
        let mut buf = pin_chunk("", "A", "1");
        buf.extend(pin_chunk("", "B", "2"));
        buf.extend(pin_chunk("", "C", "3"));

        let pins = extract_pins(&buf);
        let designators: Vec<_> = pins.iter().map(|p| p.designator.as_str()).collect();
        assert_eq!(designators, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_extract_pins_keeps_prior_results() {
        let mut buf = pin_chunk("", "A", "1");
        let second = pin_chunk("", "B", "2");
        buf.extend_from_slice(&second[..30]);

        let pins = extract_pins(&buf);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].name, "A");
    }

    #[test]
    fn test_extract_pins_short_buffer() {
        assert!(extract_pins(&[0u8; 10]).is_empty());
        assert!(extract_pins(&[]).is_empty());
    }

    #[test]
    fn test_split_pin_records() {
        let mut host = RawRecord::new();
        host.insert("RECORD", "1");
        let mut value = b"Resistor".to_vec();
        value.extend(pin_chunk("", "A", "1"));
        value.extend(pin_chunk("", "B", "2"));
        host.insert("LibReference", value);

        let mut next = RawRecord::new();
        next.insert("RECORD", "14");

        let out = split_pin_records(vec![host, next]);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].get("LibReference"), Some(&b"Resistor"[..]));
        assert_eq!(out[1].get("RECORD"), Some(&b"2"[..]));
        assert_eq!(out[1].get("Name"), Some(&b"A"[..]));
        assert_eq!(out[2].get("Designator"), Some(&b"2"[..]));
        assert_eq!(out[3].get("RECORD"), Some(&b"14"[..]));

        let pin = PinRecord::from_normalized(&out[1].normalize());
        assert_eq!(pin.rotation, 270);
        assert_eq!(pin.length, 500);
        assert_eq!(pin.y, -90);
        assert!(pin.name_hidden);
    }

    #[test]
    fn test_from_normalized_out_of_range() {
        let mut record = NormalizedRecord::new();
        record.insert("Location.X", 4_294_967_306i64);
        record.insert("Location.Y", -25i64);
        record.insert("PinLength", -1i64);

        let pin = PinRecord::from_normalized(&record);
        assert_eq!((pin.x, pin.y), (0, -25));
        assert_eq!(pin.length, 0);
    }

    #[test]
    fn test_split_pin_records_short_trailer() {
        let mut record = RawRecord::new();
        record.insert("OwnerPartId", b"1\x00\x23\x00\x00\x00\x01".to_vec());

        let out = split_pin_records(vec![record]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("OwnerPartId"), Some(&b"1"[..]));
    }
}
