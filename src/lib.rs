// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - Decoder library for Altium schematic, PCB, and materials libraries.
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
 * # `altiumlib` Crate
 *
 * A library for decoding Altium schematic (SchLib) and PCB (PcbLib)
 * libraries, and for reading and writing Altium materials libraries.
 *
 * SchLib and PcbLib files are compound-file containers. This crate does not
 * parse the container itself. Instead it reads named streams through the
 * [stream::StreamSource] trait, so a library can be served from an
 * extracted directory tree ([stream::DirectoryStreams]), from memory
 * ([stream::MemoryStreams]), or from any container reader that implements
 * the trait.
 *
 * Decoding a schematic item goes through these stages:
 *
 * 1. [index]: Resolves the item list from `FileHeader` and `SectionKeys`.
 * 2. [tokenizer]: Splits each item's `Data` stream into key/value records.
 * 3. [pin]: Recovers the binary pin descriptors hidden in field values.
 * 4. [record]: Turns normalized records into typed [record::Record] values.
 *
 * The [matlib] module is independent of the above and handles the XML
 * materials library format.
 *
 * ## Usage Example
 *
 * ```no_run
 * use altiumlib::Library;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Open a library that was extracted to a directory
 *     let mut library = altiumlib::open("Connectors.SchLib.d")?;
 *
 *     match &mut library {
 *         Library::Sch(sch) => {
 *             for index in 0..sch.items().len() {
 *                 let libref = sch.items()[index].descriptor().libref.clone();
 *                 let records = sch.item_records(index)?;
 *                 println!("{}: {} records", libref, records.len());
 *             }
 *         }
 *         Library::Pcb(pcb) => {
 *             for footprint in pcb.items() {
 *                 println!("{}: {:?} mm", footprint.pattern, footprint.height);
 *             }
 *         }
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

use std::io;
use std::path::Path;

use log::debug;

pub mod binary;
pub mod error;
pub mod index;
pub mod matlib;
pub mod pcblib;
pub mod pin;
pub mod record;
pub mod schlib;
pub mod stream;
pub mod tokenizer;
pub mod units;

pub use error::{Error, Result};

use index::ItemDescriptor;
use pcblib::{PCBLIB_SIGNATURE, PcbLibrary};
use schlib::{SCHLIB_SIGNATURE, SchLibrary};
use stream::{DirectoryStreams, OpenOptions, StreamSource};

/// A schematic or PCB library, as detected from its `FileHeader` signature.
#[derive(Debug)]
pub enum Library<S = DirectoryStreams> {
    Sch(SchLibrary<S>),
    Pcb(PcbLibrary<S>),
}

/// Opens the extracted library at `path`, whichever kind it is.
pub fn open(path: impl AsRef<Path>) -> Result<Library> {
    open_source(DirectoryStreams::new(path)?, OpenOptions::default())
}

/// Detects the library kind of `source` and opens it with `options`.
pub fn open_source<S: StreamSource>(source: S, options: OpenOptions) -> Result<Library<S>> {
    if stream::has_signature(&source, SCHLIB_SIGNATURE)? {
        debug!("Detected a schematic library");
        return Ok(Library::Sch(SchLibrary::from_source(source, options)?));
    }
    if stream::has_signature(&source, PCBLIB_SIGNATURE)? {
        debug!("Detected a PCB library");
        return Ok(Library::Pcb(PcbLibrary::from_source(source, options)?));
    }

    Err(Error::Format(
        "FileHeader carries neither a schematic nor a PCB library signature".to_string(),
    ))
}

impl<S: StreamSource> Library<S> {
    /// Number of items (components or footprints) in the library.
    pub fn len(&self) -> usize {
        match self {
            Library::Sch(sch) => sch.items().len(),
            Library::Pcb(pcb) => pcb.items().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors of every item in library order.
    ///
    /// Footprints are listed by pattern, with their storage as the section
    /// key and a part count of zero.
    pub fn items(&self) -> Vec<ItemDescriptor> {
        match self {
            Library::Sch(sch) => sch
                .items()
                .iter()
                .map(|item| item.descriptor().clone())
                .collect(),
            Library::Pcb(pcb) => pcb
                .items()
                .iter()
                .map(|fp| ItemDescriptor {
                    libref: fp.pattern.clone(),
                    description: fp.description.clone(),
                    part_count: 0,
                    section_key: fp.storage.clone(),
                })
                .collect(),
        }
    }

    pub fn write_index_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        match self {
            Library::Sch(sch) => sch.write_index_csv(writer),
            Library::Pcb(pcb) => pcb.write_index_csv(writer),
        }
    }
}
