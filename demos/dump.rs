// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  dump.rs - Library dump demo for Altium SchLib and PcbLib files.
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

use std::fs::{self, create_dir_all};
use std::io;
use std::path::PathBuf;

use clap::Parser;

use altiumlib::Library;
use altiumlib::record::Record;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the extracted library streams.
    dir: String,

    /// Print the item index as CSV instead of a listing.
    #[arg(long)]
    csv: bool,

    /// Decode and print every record of every schematic item.
    #[arg(long)]
    records: bool,

    /// Write embedded 3D models of a PCB library into this directory.
    #[arg(long)]
    models: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut library = match altiumlib::open(&args.dir) {
        Ok(library) => library,
        Err(error) => {
            eprintln!("Error opening library {:?}: {:?}", &args.dir, error);
            return;
        }
    };

    if args.csv {
        if let Err(error) = library.write_index_csv(io::stdout().lock()) {
            eprintln!("Error writing index: {}", error);
        }
        return;
    }

    match &mut library {
        Library::Sch(sch) => {
            for index in 0..sch.items().len() {
                let descriptor = sch.items()[index].descriptor().clone();
                println!(
                    "{} ({} parts): {}",
                    descriptor.libref, descriptor.part_count, descriptor.description
                );

                if !args.records {
                    continue;
                }
                match sch.item_records(index) {
                    Ok(records) => {
                        for record in records {
                            match record {
                                Record::Pin(pin) => println!(
                                    "  Pin {} {:?} at ({}, {})",
                                    pin.designator, pin.name, pin.x, pin.y
                                ),
                                other => println!("  {:?}", other.kind()),
                            }
                        }
                    }
                    Err(error) => eprintln!("  Error decoding records: {}", error),
                }
            }
        }
        Library::Pcb(pcb) => {
            for footprint in pcb.items() {
                match footprint.height {
                    Some(height) => println!(
                        "{} ({} mm): {}",
                        footprint.pattern, height, footprint.description
                    ),
                    None => println!("{}: {}", footprint.pattern, footprint.description),
                }
            }

            let Some(output_dir) = &args.models else {
                return;
            };
            let models = match pcb.models() {
                Ok(models) => models,
                Err(error) => {
                    eprintln!("Error reading models: {}", error);
                    return;
                }
            };
            if let Err(e) = create_dir_all(output_dir) {
                eprintln!("Failed to create output directory: {}", e);
                return;
            }
            for (index, model) in models.iter().enumerate().filter(|(_, m)| m.embedded) {
                let name = if model.name.is_empty() {
                    format!("model{}.step", index)
                } else {
                    model.name.clone()
                };
                let path = output_dir.join(name);
                if let Err(e) = fs::write(&path, &model.data) {
                    eprintln!("Failed to write file {}: {}", path.display(), e);
                }
            }
        }
    }
}
