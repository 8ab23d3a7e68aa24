// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/schlib.rs - Schematic library (SchLib) reader.
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
 * # `schlib` Module
 *
 * Opens a schematic library, lists its items, and decodes the records of
 * each item on demand.
 *
 * ## Usage Example
 *
 * ```no_run
 * use altiumlib::record::Record;
 * use altiumlib::schlib::SchLibrary;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Open a library extracted to a directory
 *     let mut library = SchLibrary::open("Resistors.SchLib.d")?;
 *
 *     for index in 0..library.items().len() {
 *         let name = library.items()[index].descriptor().libref.clone();
 *         let pins = library
 *             .item_records(index)?
 *             .iter()
 *             .filter(|r| matches!(r, Record::Pin(_)))
 *             .count();
 *         println!("{}: {} pins", name, pins);
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

use std::io;
use std::path::Path;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::index::{ItemDescriptor, resolve_items};
use crate::pin::split_pin_records;
use crate::record::{Record, decode_record};
use crate::stream::{self, DirectoryStreams, OpenOptions, StreamSource};
use crate::tokenizer::{RawRecord, split_records, tokenize};

/// Signature at the start of a SchLib `FileHeader` stream.
pub const SCHLIB_SIGNATURE: &str =
    "HEADER=Protel for Windows - Schematic Library Editor Binary File Version 5.0";

/// Whether an item's records have been decoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded(Vec<Record>),
}

impl LoadState {
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            LoadState::NotLoaded => None,
            LoadState::Loaded(records) => Some(records),
        }
    }
}

/// One component in a schematic library.
#[derive(Debug, Clone)]
pub struct SchItem {
    descriptor: ItemDescriptor,
    state: LoadState,
}

impl SchItem {
    pub fn descriptor(&self) -> &ItemDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }
}

/// A schematic library read through a [StreamSource].
#[derive(Debug)]
pub struct SchLibrary<S> {
    source: S,
    options: OpenOptions,
    header: RawRecord,
    items: Vec<SchItem>,
}

impl SchLibrary<DirectoryStreams> {
    /// Opens a library that has been extracted to the directory at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(DirectoryStreams::new(path)?, OpenOptions::default())
    }
}

impl<S: StreamSource> SchLibrary<S> {
    /// Verifies the file signature and reads the item index.
    ///
    /// Unless `options` is lazy, every item's records are decoded as well.
    pub fn from_source(source: S, options: OpenOptions) -> Result<Self> {
        if !stream::has_signature(&source, SCHLIB_SIGNATURE)? {
            return Err(Error::Format(
                "FileHeader does not carry the schematic library signature".to_string(),
            ));
        }

        let header = tokenize(&stream::read_optional(&source, "FileHeader", &options)?);
        let section_keys = tokenize(&stream::read_optional(&source, "SectionKeys", &options)?);

        let items: Vec<SchItem> = resolve_items(&header, &section_keys)
            .into_iter()
            .map(|descriptor| SchItem {
                descriptor,
                state: LoadState::NotLoaded,
            })
            .collect();
        debug!("Schematic library lists {} items", items.len());

        let mut library = Self {
            source,
            options,
            header,
            items,
        };

        if !options.is_lazy() {
            library.load_all()?;
        }

        Ok(library)
    }

    /// The tokenized `FileHeader` stream.
    pub fn header(&self) -> &RawRecord {
        &self.header
    }

    pub fn items(&self) -> &[SchItem] {
        &self.items
    }

    /// Returns the index of the item named `libref`.
    pub fn position(&self, libref: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.descriptor.libref == libref)
    }

    /// Returns the records of item `index`, decoding them on first use.
    pub fn item_records(&mut self, index: usize) -> Result<&[Record]> {
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::invalid(index.to_string(), "no library item at this index"))?;

        if let LoadState::NotLoaded = item.state {
            let records = load_records(&self.source, &self.options, &item.descriptor.section_key)?;
            item.state = LoadState::Loaded(records);
        }

        Ok(item.state.records().unwrap_or_default())
    }

    /// Decodes the records of every item not yet loaded.
    pub fn load_all(&mut self) -> Result<()> {
        for index in 0..self.items.len() {
            self.item_records(index)?;
        }
        Ok(())
    }

    /// Writes one CSV row per item: libref, description, part count, and
    /// section key.
    pub fn write_index_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["libref", "description", "partcount", "sectionkey"])?;

        for item in &self.items {
            let d = &item.descriptor;
            csv.write_record([
                d.libref.as_str(),
                d.description.as_str(),
                d.part_count.to_string().as_str(),
                d.section_key.as_str(),
            ])?;
        }

        csv.flush()?;
        Ok(())
    }
}

fn load_records<S: StreamSource>(
    source: &S,
    options: &OpenOptions,
    section_key: &str,
) -> Result<Vec<Record>> {
    let data = stream::read_optional(source, &format!("{}/Data", section_key), options)?;

    let raw: Vec<RawRecord> = split_records(&data).into_iter().map(tokenize).collect();
    let records: Vec<Record> = split_pin_records(raw)
        .iter()
        .map(|r| decode_record(&r.normalize()))
        .collect();

    trace!("Decoded {} records from {}", records.len(), section_key);
    Ok(records)
}
