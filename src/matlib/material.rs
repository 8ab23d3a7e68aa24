// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/matlib/material.rs - Material kinds of a materials library.
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
 * # `material` Module
 *
 * Typed material records. Each struct implements `PropertySet`, so its
 * fields are read and written through one of the property tables.
 */

use rust_decimal::Decimal;
use uuid::Uuid;

use super::MaterialType;
use super::property::{
    COPPER_FOIL_PROPERTIES, DIELECTRIC_PROPERTIES, FINISH_PROPERTIES, Field, FieldValue,
    PropertySet, PropertySpec, RawProperty, SOLDER_MASK_PROPERTIES,
};
use crate::error::Result;

const WHITE: &str = "#ffffffff";

/// A core or prepreg layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dielectric {
    pub name: String,
    pub dielectric_constant: Decimal,
    /// Millimeters.
    pub thickness: Decimal,
    /// Glass transition temperature in degrees Celsius.
    pub glass_trans_temp: Decimal,
    pub manufacturer: String,
    /// Glass weave style, e.g. `2113` or `1-2113`.
    pub construction: String,
    /// Resin content, 0 to 100.
    pub resin_pct: Decimal,
    /// Hertz.
    pub frequency: Decimal,
    pub loss_tangent: Decimal,
}

/// A surface finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finish {
    pub process: String,
    pub material: String,
    pub thickness: Decimal,
    /// `#aarrggbb`.
    pub color: String,
}

impl Default for Finish {
    fn default() -> Self {
        Self {
            process: String::new(),
            material: String::new(),
            thickness: Decimal::ZERO,
            color: WHITE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolderMask {
    pub name: String,
    pub dielectric_constant: Decimal,
    pub thickness: Decimal,
    pub manufacturer: String,
    pub frequency: Decimal,
    pub loss_tangent: Decimal,
    /// Solids content, 0 to 100.
    pub solid: Decimal,
    pub color: String,
}

impl Default for SolderMask {
    fn default() -> Self {
        Self {
            name: String::new(),
            dielectric_constant: Decimal::ZERO,
            thickness: Decimal::ZERO,
            manufacturer: String::new(),
            frequency: Decimal::ZERO,
            loss_tangent: Decimal::ZERO,
            solid: Decimal::ZERO,
            color: WHITE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopperFoil {
    pub name: String,
    pub manufacturer: String,
    /// Foil process, e.g. `ED` or `RA`.
    pub process: String,
    pub thickness: Decimal,
    pub color: String,
}

impl Default for CopperFoil {
    fn default() -> Self {
        Self {
            name: String::new(),
            manufacturer: String::new(),
            process: String::new(),
            thickness: Decimal::ZERO,
            color: WHITE.to_string(),
        }
    }
}

fn store_text(slot: &mut String, value: FieldValue) {
    if let FieldValue::Text(text) = value {
        *slot = text;
    }
}

fn store_number(slot: &mut Decimal, value: FieldValue) {
    if let FieldValue::Number(n) = value {
        *slot = n;
    }
}

impl PropertySet for Dielectric {
    const SPECS: &'static [PropertySpec] = DIELECTRIC_PROPERTIES;

    fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::Manufacturer => FieldValue::Text(self.manufacturer.clone()),
            Field::Construction => FieldValue::Text(self.construction.clone()),
            Field::DielectricConstant => FieldValue::Number(self.dielectric_constant),
            Field::LossTangent => FieldValue::Number(self.loss_tangent),
            Field::Thickness => FieldValue::Number(self.thickness),
            Field::GlassTransTemp => FieldValue::Number(self.glass_trans_temp),
            Field::ResinPct => FieldValue::Number(self.resin_pct),
            Field::Frequency => FieldValue::Number(self.frequency),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::Name => store_text(&mut self.name, value),
            Field::Manufacturer => store_text(&mut self.manufacturer, value),
            Field::Construction => store_text(&mut self.construction, value),
            Field::DielectricConstant => store_number(&mut self.dielectric_constant, value),
            Field::LossTangent => store_number(&mut self.loss_tangent, value),
            Field::Thickness => store_number(&mut self.thickness, value),
            Field::GlassTransTemp => store_number(&mut self.glass_trans_temp, value),
            Field::ResinPct => store_number(&mut self.resin_pct, value),
            Field::Frequency => store_number(&mut self.frequency, value),
            _ => {}
        }
    }
}

impl PropertySet for Finish {
    const SPECS: &'static [PropertySpec] = FINISH_PROPERTIES;

    fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Process => FieldValue::Text(self.process.clone()),
            Field::Material => FieldValue::Text(self.material.clone()),
            Field::Color => FieldValue::Text(self.color.clone()),
            Field::Thickness => FieldValue::Number(self.thickness),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::Process => store_text(&mut self.process, value),
            Field::Material => store_text(&mut self.material, value),
            Field::Color => store_text(&mut self.color, value),
            Field::Thickness => store_number(&mut self.thickness, value),
            _ => {}
        }
    }
}

impl PropertySet for SolderMask {
    const SPECS: &'static [PropertySpec] = SOLDER_MASK_PROPERTIES;

    fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::Manufacturer => FieldValue::Text(self.manufacturer.clone()),
            Field::Color => FieldValue::Text(self.color.clone()),
            Field::DielectricConstant => FieldValue::Number(self.dielectric_constant),
            Field::LossTangent => FieldValue::Number(self.loss_tangent),
            Field::Thickness => FieldValue::Number(self.thickness),
            Field::Frequency => FieldValue::Number(self.frequency),
            Field::Solid => FieldValue::Number(self.solid),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::Name => store_text(&mut self.name, value),
            Field::Manufacturer => store_text(&mut self.manufacturer, value),
            Field::Color => store_text(&mut self.color, value),
            Field::DielectricConstant => store_number(&mut self.dielectric_constant, value),
            Field::LossTangent => store_number(&mut self.loss_tangent, value),
            Field::Thickness => store_number(&mut self.thickness, value),
            Field::Frequency => store_number(&mut self.frequency, value),
            Field::Solid => store_number(&mut self.solid, value),
            _ => {}
        }
    }
}

impl PropertySet for CopperFoil {
    const SPECS: &'static [PropertySpec] = COPPER_FOIL_PROPERTIES;

    fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::Manufacturer => FieldValue::Text(self.manufacturer.clone()),
            Field::Process => FieldValue::Text(self.process.clone()),
            Field::Color => FieldValue::Text(self.color.clone()),
            Field::Thickness => FieldValue::Number(self.thickness),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::Name => store_text(&mut self.name, value),
            Field::Manufacturer => store_text(&mut self.manufacturer, value),
            Field::Process => store_text(&mut self.process, value),
            Field::Color => store_text(&mut self.color, value),
            Field::Thickness => store_number(&mut self.thickness, value),
            _ => {}
        }
    }
}

/// The kind-specific contents of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Material {
    Core(Dielectric),
    Prepreg(Dielectric),
    SolderMask(SolderMask),
    CopperFoil(CopperFoil),
    FinishEnig(Finish),
    FinishHasl(Finish),
    FinishImmersionAu(Finish),
    FinishImmersionSn(Finish),
    FinishOsp(Finish),
    /// A type this crate does not decode. Its properties are kept as read.
    Unrecognized {
        type_id: Uuid,
        properties: Vec<RawProperty>,
    },
}

impl Material {
    /// Decodes the properties of an entity with the given type id.
    pub fn from_properties(type_id: Uuid, properties: Vec<RawProperty>) -> Self {
        match MaterialType::from_type_id(type_id) {
            Some(MaterialType::Core) => Material::Core(Dielectric::decode(&properties)),
            Some(MaterialType::Prepreg) => Material::Prepreg(Dielectric::decode(&properties)),
            Some(MaterialType::SolderMask) => {
                Material::SolderMask(SolderMask::decode(&properties))
            }
            Some(MaterialType::CopperFoil) => {
                Material::CopperFoil(CopperFoil::decode(&properties))
            }
            Some(MaterialType::FinishEnig) => Material::FinishEnig(Finish::decode(&properties)),
            Some(MaterialType::FinishHasl) => Material::FinishHasl(Finish::decode(&properties)),
            Some(MaterialType::FinishImmersionAu) => {
                Material::FinishImmersionAu(Finish::decode(&properties))
            }
            Some(MaterialType::FinishImmersionSn) => {
                Material::FinishImmersionSn(Finish::decode(&properties))
            }
            Some(MaterialType::FinishOsp) => Material::FinishOsp(Finish::decode(&properties)),
            Some(MaterialType::FlexCoverlay) | None => Material::Unrecognized {
                type_id,
                properties,
            },
        }
    }

    /// Validates and encodes the properties in table order.
    pub fn properties(&self) -> Result<Vec<RawProperty>> {
        match self {
            Material::Core(d) | Material::Prepreg(d) => d.encode(),
            Material::SolderMask(m) => m.encode(),
            Material::CopperFoil(c) => c.encode(),
            Material::FinishEnig(f)
            | Material::FinishHasl(f)
            | Material::FinishImmersionAu(f)
            | Material::FinishImmersionSn(f)
            | Material::FinishOsp(f) => f.encode(),
            Material::Unrecognized { properties, .. } => Ok(properties.clone()),
        }
    }

    pub fn material_type(&self) -> Option<MaterialType> {
        match self {
            Material::Core(_) => Some(MaterialType::Core),
            Material::Prepreg(_) => Some(MaterialType::Prepreg),
            Material::SolderMask(_) => Some(MaterialType::SolderMask),
            Material::CopperFoil(_) => Some(MaterialType::CopperFoil),
            Material::FinishEnig(_) => Some(MaterialType::FinishEnig),
            Material::FinishHasl(_) => Some(MaterialType::FinishHasl),
            Material::FinishImmersionAu(_) => Some(MaterialType::FinishImmersionAu),
            Material::FinishImmersionSn(_) => Some(MaterialType::FinishImmersionSn),
            Material::FinishOsp(_) => Some(MaterialType::FinishOsp),
            Material::Unrecognized { type_id, .. } => MaterialType::from_type_id(*type_id),
        }
    }

    pub fn type_id(&self) -> Uuid {
        match self {
            Material::Unrecognized { type_id, .. } => *type_id,
            other => other
                .material_type()
                .map(MaterialType::type_id)
                .unwrap_or_default(),
        }
    }
}
