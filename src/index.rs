// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/index.rs - Schematic library item index resolution.
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
 * # `index` Module
 *
 * Resolves the list of items in a schematic library. `FileHeader` names
 * each item (`LibRef{i}`, `CompDescr{i}`, `PartCount{i}`) and
 * `SectionKeys` maps the ones whose storage name differs from their libref.
 */

use std::collections::HashMap;

use log::{debug, warn};

use crate::tokenizer::RawRecord;

/// One library item as listed in the `FileHeader` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    pub libref: String,
    pub description: String,
    /// Number of parts minus one. The header stores the count 1-based.
    pub part_count: u32,
    /// Name of the storage holding the item's `Data` stream.
    pub section_key: String,
}

/// Builds the ordered item list from the tokenized `FileHeader` and
/// `SectionKeys` streams.
///
/// Long or duplicate names are truncated in storage names, so `SectionKeys`
/// maps `LibRef{i}` to `SectionKey{i}`. Items without an entry there are
/// stored under their own libref.
pub fn resolve_items(header: &RawRecord, section_keys: &RawRecord) -> Vec<ItemDescriptor> {
    let count = parse_count(header, "CompCount").unwrap_or_else(|| {
        debug!("FileHeader has no usable CompCount, assuming no items");
        0
    });

    let keys = section_key_map(section_keys);

    (0..count)
        .map(|i| {
            let libref = header.get_str(&format!("LibRef{}", i)).unwrap_or_default();
            let description = header
                .get_str(&format!("CompDescr{}", i))
                .unwrap_or_default();

            let part_count = match parse_count(header, &format!("PartCount{}", i)) {
                Some(n) => n.saturating_sub(1),
                None => {
                    warn!("Item {} ({}) has no usable PartCount", i, libref);
                    0
                }
            };

            let section_key = keys.get(&libref).cloned().unwrap_or_else(|| libref.clone());

            ItemDescriptor {
                libref,
                description,
                part_count,
                section_key,
            }
        })
        .collect()
}

fn section_key_map(section_keys: &RawRecord) -> HashMap<String, String> {
    let count = parse_count(section_keys, "KeyCount").unwrap_or(0);

    (0..count)
        .filter_map(|i| {
            let libref = section_keys.get_str(&format!("LibRef{}", i))?;
            let key = section_keys.get_str(&format!("SectionKey{}", i))?;
            Some((libref, key))
        })
        .collect()
}

fn parse_count(record: &RawRecord, key: &str) -> Option<u32> {
    record.get_str(key)?.trim().parse().ok()
}
