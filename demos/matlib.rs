// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  matlib.rs - Materials library demo for Altium XML materials libraries.
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

use clap::Parser;

use altiumlib::matlib::{Material, MaterialsLibrary};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The materials library to read.
    file: String,

    /// Write the library back out to this file after reading it.
    #[arg(short, long)]
    output: Option<String>,
}

fn describe(material: &Material) -> String {
    match material {
        Material::Core(d) | Material::Prepreg(d) => format!(
            "{} ({}, {} mm, Dk {})",
            d.name, d.manufacturer, d.thickness, d.dielectric_constant
        ),
        Material::SolderMask(m) => format!("{} ({} mm, {})", m.name, m.thickness, m.color),
        Material::CopperFoil(c) => format!("{} ({} mm, {})", c.name, c.thickness, c.process),
        Material::FinishEnig(f)
        | Material::FinishHasl(f)
        | Material::FinishImmersionAu(f)
        | Material::FinishImmersionSn(f)
        | Material::FinishOsp(f) => format!("{} {} ({} mm)", f.process, f.material, f.thickness),
        Material::Unrecognized { properties, .. } => {
            format!("{} unrecognized properties", properties.len())
        }
    }
}

fn main() {
    let args = Args::parse();

    let library = match MaterialsLibrary::load(&args.file) {
        Ok(library) => library,
        Err(error) => {
            eprintln!("Error reading library {:?}: {:?}", &args.file, error);
            return;
        }
    };

    println!("Library {} (version {})", library.library_id, library.version);
    for entity in &library.entities {
        let kind = match entity.material_type() {
            Some(kind) => format!("{:?}", kind),
            None => entity.type_id().to_string(),
        };
        println!("{} {}: {}", entity.entity_id, kind, describe(entity.material()));
    }

    if let Some(output) = &args.output {
        if let Err(error) = library.dump(output) {
            eprintln!("Error writing library {:?}: {}", output, error);
        }
    }
}
