// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/matlib/property.rs - Declarative property tables for materials.
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
 * # `property` Module
 *
 * Static property tables and the codecs that convert between `<Property>`
 * text and typed field values.
 *
 * Each [PropertySpec] row ties a property name to a struct field and a
 * [Codec]. Rows may carry a [Validator] that runs before encoding.
 *
 * Decoding is lenient: a value that fails to decode is logged and its field
 * keeps its default. Encoding stops at the first value that fails
 * validation.
 */

use log::warn;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::units::{dehumanize, humanize, parse_decimal, to_celsius, to_mm};

const COLOR_TYPE: &str = "System.Windows.Media.Color, PresentationCore, Version=4.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35";

const RELATIVE: &[(&str, &str)] = &[("Dimension", "Relative")];
const FREQUENCY: &[(&str, &str)] = &[("Dimension", "Frequency")];
const DIMENSIONLESS: &[(&str, &str)] = &[("Dimension", "Dimensionless")];
const TEMPERATURE: &[(&str, &str)] = &[("Dimension", "Temperature")];
const LENGTH: &[(&str, &str)] = &[("Dimension", "Length")];

/// A material attribute a property maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Manufacturer,
    Construction,
    Process,
    Material,
    Color,
    DielectricConstant,
    LossTangent,
    Thickness,
    GlassTransTemp,
    ResinPct,
    Frequency,
    Solid,
}

/// The value of a [Field].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
}

/// How a field value is written to and read from property text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Verbatim text.
    Text,
    /// A bare number.
    Plain,
    /// A percentage with two decimal places, e.g. `40%`.
    Percent,
    /// Hertz with an SI prefix and two decimal places, e.g. `1GHz`.
    Frequency,
    /// Degrees Celsius with two decimal places, e.g. `180C`.
    Temperature,
    /// Millimeters with six decimal places, e.g. `0.1mm`.
    Length,
}

impl Codec {
    pub fn encode(self, value: &FieldValue) -> String {
        let number = match value {
            FieldValue::Text(text) => return text.clone(),
            FieldValue::Number(n) => *n,
        };

        match self {
            Codec::Text | Codec::Plain => number.to_string(),
            Codec::Percent => humanize(number, "%", Some(2), false),
            Codec::Frequency => humanize(number, "Hz", Some(2), true),
            Codec::Temperature => humanize(number, "C", Some(2), false),
            Codec::Length => humanize(number, "mm", Some(6), false),
        }
    }

    pub fn decode(self, text: &str) -> Result<FieldValue> {
        let number = match self {
            Codec::Text => return Ok(FieldValue::Text(text.to_string())),
            Codec::Plain => parse_decimal(text)?,
            Codec::Percent => parse_decimal(text.trim().trim_end_matches('%'))?,
            Codec::Frequency => dehumanize(text, "Hz")?,
            Codec::Temperature => to_celsius(text)?,
            Codec::Length => to_mm(text)?,
        };
        Ok(FieldValue::Number(number))
    }
}

/// A check run on a field value before it is encoded.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    pub check: fn(&FieldValue) -> bool,
    pub message: &'static str,
}

/// One `<Property>` element of a material kind.
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub name: &'static str,
    pub type_tag: &'static str,
    /// Attributes written after `Name` and `Type`.
    pub attrs: &'static [(&'static str, &'static str)],
    pub field: Field,
    pub codec: Codec,
    pub validator: Option<Validator>,
}

/// A `<Property>` element as it appears in the XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    pub name: String,
    /// Every attribute except `Name`, in document order.
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

impl RawProperty {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

const COLOR: Validator = Validator {
    check: is_hex_alpha_color,
    message: "Color needs to be in the format #abababab (hex plus alpha)",
};

const PERCENTAGE: Validator = Validator {
    check: is_percentage,
    message: "Percentages need to be between 0 and 100",
};

fn is_hex_alpha_color(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(text) => text
            .strip_prefix('#')
            .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit())),
        FieldValue::Number(_) => false,
    }
}

fn is_percentage(value: &FieldValue) -> bool {
    match value {
        FieldValue::Number(n) => *n >= Decimal::ZERO && *n <= Decimal::ONE_HUNDRED,
        FieldValue::Text(_) => false,
    }
}

const fn text(name: &'static str, field: Field) -> PropertySpec {
    PropertySpec {
        name,
        type_tag: "String",
        attrs: &[],
        field,
        codec: Codec::Text,
        validator: None,
    }
}

const fn dim(
    name: &'static str,
    attrs: &'static [(&'static str, &'static str)],
    field: Field,
    codec: Codec,
) -> PropertySpec {
    PropertySpec {
        name,
        type_tag: "DimValue",
        attrs,
        field,
        codec,
        validator: None,
    }
}

const fn percent(name: &'static str, field: Field) -> PropertySpec {
    PropertySpec {
        validator: Some(PERCENTAGE),
        ..dim(name, RELATIVE, field, Codec::Percent)
    }
}

const COLOR_PROPERTY: PropertySpec = PropertySpec {
    name: "Color",
    type_tag: COLOR_TYPE,
    attrs: &[],
    field: Field::Color,
    codec: Codec::Text,
    validator: Some(COLOR),
};

/// Properties of cores and prepregs.
pub static DIELECTRIC_PROPERTIES: &[PropertySpec] = &[
    text("Constructions", Field::Construction),
    percent("Resin", Field::ResinPct),
    dim("Frequency", FREQUENCY, Field::Frequency, Codec::Frequency),
    dim("DielectricConstant", DIMENSIONLESS, Field::DielectricConstant, Codec::Plain),
    dim("LossTangent", DIMENSIONLESS, Field::LossTangent, Codec::Plain),
    dim("GlassTransTemp", TEMPERATURE, Field::GlassTransTemp, Codec::Temperature),
    text("Manufacturer", Field::Manufacturer),
    text("Name", Field::Name),
    dim("Thickness", LENGTH, Field::Thickness, Codec::Length),
];

/// Properties of every surface finish.
pub static FINISH_PROPERTIES: &[PropertySpec] = &[
    dim("Thickness", LENGTH, Field::Thickness, Codec::Length),
    text("Process", Field::Process),
    text("Material", Field::Material),
    COLOR_PROPERTY,
];

pub static SOLDER_MASK_PROPERTIES: &[PropertySpec] = &[
    percent("Solid", Field::Solid),
    COLOR_PROPERTY,
    dim("Frequency", FREQUENCY, Field::Frequency, Codec::Frequency),
    dim("DielectricConstant", DIMENSIONLESS, Field::DielectricConstant, Codec::Plain),
    dim("LossTangent", DIMENSIONLESS, Field::LossTangent, Codec::Plain),
    text("Manufacturer", Field::Manufacturer),
    text("Name", Field::Name),
    dim("Thickness", LENGTH, Field::Thickness, Codec::Length),
];

pub static COPPER_FOIL_PROPERTIES: &[PropertySpec] = &[
    text("Name", Field::Name),
    text("Manufacturer", Field::Manufacturer),
    text("Process", Field::Process),
    dim("Thickness", LENGTH, Field::Thickness, Codec::Length),
    COLOR_PROPERTY,
];

/// A material kind whose fields are described by a static property table.
pub(crate) trait PropertySet: Default {
    const SPECS: &'static [PropertySpec];

    fn get(&self, field: Field) -> FieldValue;

    /// Stores `value`. Values of the wrong shape for `field` are ignored.
    fn set(&mut self, field: Field, value: FieldValue);

    /// Validates and encodes every property in table order.
    fn encode(&self) -> Result<Vec<RawProperty>> {
        Self::SPECS
            .iter()
            .map(|spec| {
                let value = self.get(spec.field);
                if let Some(validator) = spec.validator
                    && !(validator.check)(&value)
                {
                    return Err(Error::PropertyValidation {
                        property: spec.name,
                        message: validator.message,
                    });
                }

                let mut attrs = vec![("Type".to_string(), spec.type_tag.to_string())];
                attrs.extend(spec.attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())));

                Ok(RawProperty {
                    name: spec.name.to_string(),
                    attrs,
                    text: spec.codec.encode(&value),
                })
            })
            .collect()
    }

    /// Builds a value from parsed properties. Unknown names are ignored and
    /// fields without a property keep their defaults.
    fn decode(properties: &[RawProperty]) -> Self {
        let mut out = Self::default();

        for property in properties {
            let Some(spec) = Self::SPECS.iter().find(|s| s.name == property.name) else {
                continue;
            };

            match spec.codec.decode(&property.text) {
                Ok(value) => out.set(spec.field, value),
                Err(err) => warn!("Ignoring property {}: {}", spec.name, err),
            }
        }

        out
    }
}
