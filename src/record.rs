// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/record.rs - Schematic record types and their registry.
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
 * # `record` Module
 *
 * Maps the numeric `RECORD` field of a normalized record to a typed
 * [Record]. Kinds with a dedicated decoder are listed in a static table of
 * decode/encode functions; every other known kind decodes to
 * [Record::Other], which keeps its fields, and unknown discriminants fold to
 * [RecordKind::Undefined].
 *
 * ## Usage Example
 *
 * ```
 * use altiumlib::record::{Record, decode_record};
 * use altiumlib::tokenizer::tokenize;
 *
 * let normalized = tokenize(b"|RECORD=4|Text=Hello|Location.X=10").normalize();
 * match decode_record(&normalized) {
 *     Record::Label(label) => assert_eq!(label.text, "Hello"),
 *     other => panic!("unexpected {:?}", other),
 * }
 * ```
 */

use rust_decimal::Decimal;

use crate::pin::PinRecord;
use crate::tokenizer::{NormalizedRecord, Value};

/// Every record discriminant Altium writes into schematic files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum RecordKind {
    Undefined = 0,
    Component = 1,
    Pin = 2,
    IeeeSymbol = 3,
    Label = 4,
    Bezier = 5,
    Polyline = 6,
    Polygon = 7,
    Ellipse = 8,
    Piechart = 9,
    RectangleRound = 10,
    EllipticalArc = 11,
    Arc = 12,
    Line = 13,
    Rectangle = 14,
    SheetSymbol = 15,
    SheetEntry = 16,
    PowerPort = 17,
    Port = 18,
    NoErc = 22,
    NetLabel = 25,
    Bus = 26,
    Wire = 27,
    TextFrame = 28,
    Junction = 29,
    Image = 30,
    Sheet = 31,
    SheetName = 32,
    FileName = 33,
    Designator = 34,
    BusEntry = 37,
    Template = 39,
    Parameter = 41,
    ImplementationList = 44,
}

impl RecordKind {
    /// Maps a discriminant to its kind; unknown values become
    /// [RecordKind::Undefined].
    pub fn from_discriminant(value: i64) -> Self {
        match value {
            1 => RecordKind::Component,
            2 => RecordKind::Pin,
            3 => RecordKind::IeeeSymbol,
            4 => RecordKind::Label,
            5 => RecordKind::Bezier,
            6 => RecordKind::Polyline,
            7 => RecordKind::Polygon,
            8 => RecordKind::Ellipse,
            9 => RecordKind::Piechart,
            10 => RecordKind::RectangleRound,
            11 => RecordKind::EllipticalArc,
            12 => RecordKind::Arc,
            13 => RecordKind::Line,
            14 => RecordKind::Rectangle,
            15 => RecordKind::SheetSymbol,
            16 => RecordKind::SheetEntry,
            17 => RecordKind::PowerPort,
            18 => RecordKind::Port,
            22 => RecordKind::NoErc,
            25 => RecordKind::NetLabel,
            26 => RecordKind::Bus,
            27 => RecordKind::Wire,
            28 => RecordKind::TextFrame,
            29 => RecordKind::Junction,
            30 => RecordKind::Image,
            31 => RecordKind::Sheet,
            32 => RecordKind::SheetName,
            33 => RecordKind::FileName,
            34 => RecordKind::Designator,
            37 => RecordKind::BusEntry,
            39 => RecordKind::Template,
            41 => RecordKind::Parameter,
            44 => RecordKind::ImplementationList,
            _ => RecordKind::Undefined,
        }
    }

    /// Interprets a `RECORD` field value. Missing or non-integer values
    /// become [RecordKind::Undefined].
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_int)
            .map(Self::from_discriminant)
            .unwrap_or(RecordKind::Undefined)
    }
}

/// Attributes shared by most graphical records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Common {
    pub location_x: i64,
    pub location_y: i64,
    pub rotation: i64,
    pub line_width: Option<Decimal>,
    /// `#rrggbb`.
    pub color: String,
    pub owner_part_display_mode: i64,
    pub owner_part_id: Option<i64>,
}

impl Common {
    fn decode(record: &NormalizedRecord) -> Self {
        Self {
            location_x: record.get_int("Location.X").unwrap_or(0),
            location_y: record.get_int("Location.Y").unwrap_or(0),
            rotation: record.get_int("Rotation").unwrap_or(0),
            line_width: record.get_decimal("LineWidth"),
            color: record.get_color("Color"),
            owner_part_display_mode: record.get_int("OwnerPartDisplayMode").unwrap_or(1),
            owner_part_id: record.get_int("OwnerPartId"),
        }
    }

    fn encode(&self, kind: RecordKind, record: &mut NormalizedRecord) {
        record.insert("RECORD", kind as i64);
        record.insert("Location.X", self.location_x);
        record.insert("Location.Y", self.location_y);
        if self.rotation != 0 {
            record.insert("Rotation", self.rotation);
        }
        if let Some(width) = self.line_width {
            record.insert("LineWidth", width);
        }
        record.insert("Color", color_to_int(&self.color));
        record.insert("OwnerPartDisplayMode", self.owner_part_display_mode);
        if let Some(id) = self.owner_part_id {
            record.insert("OwnerPartId", id);
        }
    }
}

/// The component header record that opens every schematic item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub lib_reference: String,
    pub description: Option<String>,
    pub part_count: i64,
    pub display_mode_count: i64,
    pub current_part_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub common: Common,
    pub text: String,
    pub justification: Justification,
    pub font_id: Option<i64>,
}

/// Text anchoring, `Justification` 0 through 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    BottomLeft = 0,
    BottomCenter = 1,
    BottomRight = 2,
    CenterLeft = 3,
    CenterCenter = 4,
    CenterRight = 5,
    TopLeft = 6,
    TopCenter = 7,
    TopRight = 8,
}

impl Justification {
    pub fn from_discriminant(value: i64) -> Self {
        match value {
            1 => Justification::BottomCenter,
            2 => Justification::BottomRight,
            3 => Justification::CenterLeft,
            4 => Justification::CenterCenter,
            5 => Justification::CenterRight,
            6 => Justification::TopLeft,
            7 => Justification::TopCenter,
            8 => Justification::TopRight,
            _ => Justification::BottomLeft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rectangle {
    pub common: Common,
    pub corner_x: i64,
    pub corner_y: i64,
    pub is_solid: bool,
    pub fill_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub common: Common,
    pub corner_x: i64,
    pub corner_y: i64,
}

/// A named parameter, or the designator, attached to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub common: Common,
    pub name: String,
    pub text: String,
    pub hidden: bool,
}

/// A decoded schematic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Undefined(NormalizedRecord),
    Component(Component),
    Pin(PinRecord),
    Label(Label),
    Rectangle(Rectangle),
    Line(Line),
    Parameter(Parameter),
    Designator(Parameter),
    /// A known kind without a dedicated decoder.
    Other {
        kind: RecordKind,
        common: Common,
        fields: NormalizedRecord,
    },
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Undefined(_) => RecordKind::Undefined,
            Record::Component(_) => RecordKind::Component,
            Record::Pin(_) => RecordKind::Pin,
            Record::Label(_) => RecordKind::Label,
            Record::Rectangle(_) => RecordKind::Rectangle,
            Record::Line(_) => RecordKind::Line,
            Record::Parameter(_) => RecordKind::Parameter,
            Record::Designator(_) => RecordKind::Designator,
            Record::Other { kind, .. } => *kind,
        }
    }
}

/// Decode and encode functions for one record kind.
pub struct RecordCodec {
    pub kind: RecordKind,
    pub decode: fn(&NormalizedRecord) -> Record,
    pub encode: fn(&Record) -> Option<NormalizedRecord>,
}

/// Kinds with a dedicated decoder.
pub static CODECS: &[RecordCodec] = &[
    RecordCodec {
        kind: RecordKind::Undefined,
        decode: |r| Record::Undefined(r.clone()),
        encode: |r| match r {
            Record::Undefined(fields) => Some(fields.clone()),
            _ => None,
        },
    },
    RecordCodec {
        kind: RecordKind::Component,
        decode: decode_component,
        encode: encode_component,
    },
    RecordCodec {
        kind: RecordKind::Pin,
        decode: |r| Record::Pin(PinRecord::from_normalized(r)),
        encode: |r| match r {
            Record::Pin(pin) => Some(pin.to_normalized()),
            _ => None,
        },
    },
    RecordCodec {
        kind: RecordKind::Label,
        decode: decode_label,
        encode: encode_label,
    },
    RecordCodec {
        kind: RecordKind::Rectangle,
        decode: decode_rectangle,
        encode: encode_rectangle,
    },
    RecordCodec {
        kind: RecordKind::Line,
        decode: decode_line,
        encode: encode_line,
    },
    RecordCodec {
        kind: RecordKind::Parameter,
        decode: |r| Record::Parameter(decode_parameter(r)),
        encode: |r| match r {
            Record::Parameter(p) => Some(encode_parameter(p, RecordKind::Parameter)),
            _ => None,
        },
    },
    RecordCodec {
        kind: RecordKind::Designator,
        decode: |r| Record::Designator(decode_parameter(r)),
        encode: |r| match r {
            Record::Designator(p) => Some(encode_parameter(p, RecordKind::Designator)),
            _ => None,
        },
    },
];

fn codec_for(kind: RecordKind) -> Option<&'static RecordCodec> {
    CODECS.iter().find(|c| c.kind == kind)
}

/// Dispatches a normalized record to the decoder for its `RECORD` kind.
pub fn decode_record(record: &NormalizedRecord) -> Record {
    let kind = RecordKind::from_value(record.get("RECORD"));
    match codec_for(kind) {
        Some(codec) => (codec.decode)(record),
        None => Record::Other {
            kind,
            common: Common::decode(record),
            fields: record.clone(),
        },
    }
}

/// Converts a typed record back to its field form.
pub fn encode_record(record: &Record) -> NormalizedRecord {
    if let Record::Other { fields, .. } = record {
        return fields.clone();
    }

    codec_for(record.kind())
        .and_then(|codec| (codec.encode)(record))
        .unwrap_or_default()
}

fn decode_component(r: &NormalizedRecord) -> Record {
    Record::Component(Component {
        lib_reference: r.get_text("LibReference").unwrap_or_default(),
        description: r.get_text("ComponentDescription"),
        part_count: r.get_int("PartCount").unwrap_or(1),
        display_mode_count: r.get_int("DisplayModeCount").unwrap_or(1),
        current_part_id: r.get_int("CurrentPartId").unwrap_or(1),
    })
}

fn encode_component(record: &Record) -> Option<NormalizedRecord> {
    let Record::Component(c) = record else {
        return None;
    };

    let mut r = NormalizedRecord::new();
    r.insert("RECORD", RecordKind::Component as i64);
    r.insert("LibReference", c.lib_reference.as_str());
    if let Some(description) = &c.description {
        r.insert("ComponentDescription", description.as_str());
    }
    r.insert("PartCount", c.part_count);
    r.insert("DisplayModeCount", c.display_mode_count);
    r.insert("CurrentPartId", c.current_part_id);
    Some(r)
}

fn decode_label(r: &NormalizedRecord) -> Record {
    Record::Label(Label {
        common: Common::decode(r),
        text: r.get_text("Text").unwrap_or_default(),
        justification: Justification::from_discriminant(r.get_int("Justification").unwrap_or(0)),
        font_id: r.get_int("FontID"),
    })
}

fn encode_label(record: &Record) -> Option<NormalizedRecord> {
    let Record::Label(label) = record else {
        return None;
    };

    let mut r = NormalizedRecord::new();
    label.common.encode(RecordKind::Label, &mut r);
    r.insert("Text", label.text.as_str());
    r.insert("Justification", label.justification as i64);
    if let Some(font) = label.font_id {
        r.insert("FontID", font);
    }
    Some(r)
}

fn decode_rectangle(r: &NormalizedRecord) -> Record {
    Record::Rectangle(Rectangle {
        common: Common::decode(r),
        corner_x: r.get_int("Corner.X").unwrap_or(0),
        corner_y: r.get_int("Corner.Y").unwrap_or(0),
        is_solid: r.get_bool("IsSolid").unwrap_or(true),
        fill_color: r.get_color("AreaColor"),
    })
}

fn encode_rectangle(record: &Record) -> Option<NormalizedRecord> {
    let Record::Rectangle(rect) = record else {
        return None;
    };

    let mut r = NormalizedRecord::new();
    rect.common.encode(RecordKind::Rectangle, &mut r);
    r.insert("Corner.X", rect.corner_x);
    r.insert("Corner.Y", rect.corner_y);
    r.insert("IsSolid", rect.is_solid);
    r.insert("AreaColor", color_to_int(&rect.fill_color));
    Some(r)
}

fn decode_line(r: &NormalizedRecord) -> Record {
    Record::Line(Line {
        common: Common::decode(r),
        corner_x: r.get_int("Corner.X").unwrap_or(0),
        corner_y: r.get_int("Corner.Y").unwrap_or(0),
    })
}

fn encode_line(record: &Record) -> Option<NormalizedRecord> {
    let Record::Line(line) = record else {
        return None;
    };

    let mut r = NormalizedRecord::new();
    line.common.encode(RecordKind::Line, &mut r);
    r.insert("Corner.X", line.corner_x);
    r.insert("Corner.Y", line.corner_y);
    Some(r)
}

fn decode_parameter(r: &NormalizedRecord) -> Parameter {
    Parameter {
        common: Common::decode(r),
        name: r.get_text("Name").unwrap_or_default(),
        text: r.get_text("Text").unwrap_or_default(),
        hidden: r.get_bool("IsHidden").unwrap_or(false),
    }
}

fn encode_parameter(p: &Parameter, kind: RecordKind) -> NormalizedRecord {
    let mut r = NormalizedRecord::new();
    p.common.encode(kind, &mut r);
    r.insert("Name", p.name.as_str());
    r.insert("Text", p.text.as_str());
    if p.hidden {
        r.insert("IsHidden", true);
    }
    r
}

/// Inverse of [crate::units::eval_color]: `#rrggbb` back to the low-byte-red
/// integer layout.
fn color_to_int(color: &str) -> i64 {
    let hex = color.trim_start_matches('#');
    let Ok(rgb) = u32::from_str_radix(hex, 16) else {
        return 0;
    };
    if rgb == 0xFF_FFFF {
        return 0;
    }

    let red = (rgb >> 16) & 0xFF;
    let green = (rgb >> 8) & 0xFF;
    let blue = rgb & 0xFF;
    i64::from(red | (green << 8) | (blue << 16))
}
