// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/matlib/mod.rs - Altium materials library support.
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
 * # `matlib` Module
 *
 * Reads and writes the XML materials libraries that describe PCB stack-up
 * materials (cores, prepregs, solder masks, copper foils, and surface
 * finishes).
 *
 * A library is a list of [Entity] values. Each entity carries a fixed type
 * UUID that selects its [Material] variant, and every variant has a static
 * table of [PropertySpec] rows that drive both decoding and encoding of its
 * `<Property>` elements. Physical quantities are written in the
 * human-readable form Altium expects (`1GHz`, `0.1mm`, `40%`).
 *
 * ## Usage Example
 *
 * ```
 * use rust_decimal::Decimal;
 *
 * use altiumlib::matlib::{Dielectric, Entity, Material, MaterialType, MaterialsLibrary};
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let mut library = MaterialsLibrary::new();
 *     library.push(Entity::new(Material::Core(Dielectric {
 *         name: "FR-4".to_string(),
 *         dielectric_constant: Decimal::new(42, 1),
 *         thickness: Decimal::new(2, 1),
 *         ..Dielectric::default()
 *     })));
 *
 *     let xml = library.dumps()?;
 *     let reloaded = MaterialsLibrary::loads(&xml)?;
 *     assert_eq!(reloaded.entities_of(MaterialType::Core).count(), 1);
 *
 *     Ok(())
 * }
 * ```
 */

use uuid::Uuid;

mod entity;
mod library;
mod material;
mod property;

pub use entity::Entity;
pub use library::{DEFAULT_NAMESPACE, DEFAULT_VERSION, MaterialsLibrary};
pub use material::{CopperFoil, Dielectric, Finish, Material, SolderMask};
pub use property::{
    COPPER_FOIL_PROPERTIES, Codec, DIELECTRIC_PROPERTIES, FINISH_PROPERTIES, Field, FieldValue,
    PropertySpec, RawProperty, SOLDER_MASK_PROPERTIES, Validator,
};

/// The kinds of material Altium distinguishes, each with a fixed type UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialType {
    SolderMask,
    FlexCoverlay,
    CopperFoil,
    FinishOsp,
    FinishImmersionSn,
    FinishImmersionAu,
    FinishHasl,
    FinishEnig,
    Core,
    Prepreg,
}

const TYPE_IDS: [(MaterialType, Uuid); 10] = [
    (
        MaterialType::SolderMask,
        Uuid::from_u128(0x968469a9_c799_46e2_bc61_c05b2553ab48),
    ),
    (
        MaterialType::FlexCoverlay,
        Uuid::from_u128(0xcd632416_6fe1_4ea1_bb89_01d4b2eae217),
    ),
    (
        MaterialType::CopperFoil,
        Uuid::from_u128(0x4be0915d_5b0d_4c59_8fae_d57f8650d474),
    ),
    (
        MaterialType::FinishOsp,
        Uuid::from_u128(0xd782f951_a176_457d_bef0_463bd4d45ad7),
    ),
    (
        MaterialType::FinishImmersionSn,
        Uuid::from_u128(0x4dcb0c85_3a3d_4462_9e84_a89dc57f4b84),
    ),
    (
        MaterialType::FinishImmersionAu,
        Uuid::from_u128(0x0800b1d6_17ee_40e9_adba_334c59a1066e),
    ),
    (
        MaterialType::FinishHasl,
        Uuid::from_u128(0xe8b99bb8_b51f_4a6e_a0fc_7439b27f8c76),
    ),
    (
        MaterialType::FinishEnig,
        Uuid::from_u128(0xb6b5d288_d4b3_4b60_857f_b949da02a37a),
    ),
    (
        MaterialType::Core,
        Uuid::from_u128(0x27d70fdc_4c4e_4774_bfac_7efbb48cde47),
    ),
    (
        MaterialType::Prepreg,
        Uuid::from_u128(0xe04a4e7f_10f0_42df_add7_587710efd89e),
    ),
];

impl MaterialType {
    pub fn type_id(self) -> Uuid {
        TYPE_IDS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, id)| *id)
            .unwrap_or_default()
    }

    /// Looks up the kind for a type UUID. Unknown ids return `None`.
    pub fn from_type_id(id: Uuid) -> Option<Self> {
        TYPE_IDS
            .iter()
            .find(|(_, known)| *known == id)
            .map(|(kind, _)| *kind)
    }
}
