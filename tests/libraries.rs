// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  tests/libraries.rs - End-to-end tests for library decoding.
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

use std::fs;
use std::io::Write;
use std::str::FromStr;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use rust_decimal::Decimal;

use altiumlib::matlib::{
    CopperFoil, Dielectric, Entity, Material, MaterialType, MaterialsLibrary, SolderMask,
};
use altiumlib::pcblib::{PCBLIB_SIGNATURE, PcbLibrary};
use altiumlib::pin::ElectricalType;
use altiumlib::record::{Record, RecordKind};
use altiumlib::schlib::{SCHLIB_SIGNATURE, SchLibrary};
use altiumlib::stream::{MemoryStreams, OpenOptions};
use altiumlib::{Error, Library};

/// One binary pin chunk as it appears after a NUL inside a field value.
fn pin_chunk(name: &str, designator: &str) -> Vec<u8> {
    let mut chunk = vec![
        0x00, 0x27, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ];
    chunk.push(0); // no description
    chunk.push(0x01);
    chunk.push(ElectricalType::Passive as u8);
    chunk.push(0x01); // 90 degrees, everything visible
    chunk.extend_from_slice(&30u16.to_le_bytes());
    chunk.extend_from_slice(&(-20i16).to_le_bytes());
    chunk.extend_from_slice(&40i16.to_le_bytes());
    chunk.extend_from_slice(&[0; 4]);
    chunk.push(name.len() as u8);
    chunk.extend_from_slice(name.as_bytes());
    chunk.push(designator.len() as u8);
    chunk.extend_from_slice(designator.as_bytes());
    chunk.extend_from_slice(b"\x00\x03|&|");
    chunk
}

fn schlib_streams() -> MemoryStreams {
    let mut streams = MemoryStreams::new();
    streams.insert(
        "FileHeader",
        format!(
            "\x7a\x00\x00\x00|{}|Weight=3|CompCount=2|LibRef0=RES|CompDescr0=Resistor|PartCount0=2|LibRef1=LED|CompDescr1=Light|PartCount1=2",
            SCHLIB_SIGNATURE
        ),
    );
    streams.insert("SectionKeys", "|KeyCount=1|LibRef0=RES|SectionKey0=RES_A");

    let mut data = b"\x40\x00\x00\x00|RECORD=1|LibReference=RES|ComponentDescription=Fixed|&|Thin|PartCount=2"
        .to_vec();
    data.extend(pin_chunk("A", "1"));
    data.extend_from_slice(b"|RECORD=41|Name=Value|Text=10k|OwnerPartId=1");
    data.extend_from_slice(b"|RECORD=34|Name=Designator|Text=R?|Color=255");
    data.extend_from_slice(b"|RECORD=99|Mystery=1");
    streams.insert("RES_A/Data", data);

    let mut data = b"|RECORD=1|LibReference=LED|OwnerPartId=1".to_vec();
    data.extend(pin_chunk("K", "2"));
    streams.insert("LED/Data", data);

    streams
}

#[test]
fn schematic_library_decodes_items_and_pins() {
    let mut library = SchLibrary::from_source(schlib_streams(), OpenOptions::new()).unwrap();

    let names: Vec<_> = library
        .items()
        .iter()
        .map(|item| item.descriptor().libref.as_str())
        .collect();
    assert_eq!(names, vec!["RES", "LED"]);
    assert_eq!(library.items()[0].descriptor().part_count, 1);

    let records = library.item_records(0).unwrap().to_vec();
    let kinds: Vec<_> = records.iter().map(Record::kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordKind::Component,
            RecordKind::Pin,
            RecordKind::Parameter,
            RecordKind::Designator,
            RecordKind::Undefined,
        ]
    );

    match &records[0] {
        Record::Component(c) => {
            assert_eq!(c.lib_reference, "RES");
            assert_eq!(c.description.as_deref(), Some("Fixed|Thin"));
            assert_eq!(c.part_count, 2);
        }
        other => panic!("unexpected {:?}", other),
    }

    match &records[1] {
        Record::Pin(pin) => {
            assert_eq!(pin.name, "A");
            assert_eq!(pin.designator, "1");
            assert_eq!(pin.electrical_type, ElectricalType::Passive);
            assert_eq!(pin.rotation, 90);
            assert_eq!(pin.length, 300);
            assert_eq!((pin.x, pin.y), (-20, 40));
            assert!(!pin.name_hidden);
        }
        other => panic!("unexpected {:?}", other),
    }

    match &records[3] {
        Record::Designator(p) => {
            assert_eq!(p.text, "R?");
            assert_eq!(p.common.color, "#ff0000");
        }
        other => panic!("unexpected {:?}", other),
    }

    // The second item has no section key entry and falls back to its libref.
    let pins = library
        .item_records(1)
        .unwrap()
        .iter()
        .filter(|r| matches!(r, Record::Pin(_)))
        .count();
    assert_eq!(pins, 1);
}

#[test]
fn schematic_library_decodes_every_pin_of_a_component() {
    let mut streams = MemoryStreams::new();
    streams.insert(
        "FileHeader",
        format!("\x00\x00\x00\x00|{}|CompCount=1|LibRef0=U1", SCHLIB_SIGNATURE),
    );
    let mut data = b"|RECORD=1|LibReference=U1".to_vec();
    data.extend(pin_chunk("A", "1"));
    data.extend(pin_chunk("B", "2"));
    data.extend(pin_chunk("C", "3"));
    data.extend_from_slice(b"|RECORD=41|Name=Value|Text=x|&|y");
    streams.insert("U1/Data", data);

    let mut library = SchLibrary::from_source(streams, OpenOptions::new()).unwrap();
    let records = library.item_records(0).unwrap();

    let pins: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            Record::Pin(pin) => Some(format!("{}/{}", pin.name, pin.designator)),
            _ => None,
        })
        .collect();
    assert_eq!(pins, vec!["A/1", "B/2", "C/3"]);
    assert_eq!(records.last().map(Record::kind), Some(RecordKind::Parameter));
}

#[test]
fn schematic_library_eager_and_capped() {
    let options = OpenOptions::new().lazy(false).max_stream_bytes(16);
    let library = SchLibrary::from_source(schlib_streams(), options).unwrap();

    // FileHeader is cut off before CompCount, so no items are listed.
    assert!(library.items().is_empty());

    let options = OpenOptions::new().lazy(false);
    let library = SchLibrary::from_source(schlib_streams(), options).unwrap();
    assert!(library.items().iter().all(|item| item.is_loaded()));
}

#[test]
fn pcb_library_lists_footprints_and_models() {
    let mut streams = MemoryStreams::new();
    streams.insert("FileHeader", format!("\x1b\x00\x00\x00{}", PCBLIB_SIGNATURE));
    streams.insert("FileVersionInfo/Data", b"ignored".to_vec());
    streams.insert(
        "SOIC8/Parameters",
        b"\x00\x00\x00\x00|PATTERN=SOIC-8|DESCRIPTION=Small outline|HEIGHT=68.9mil".to_vec(),
    );
    streams.insert(
        "QFN/Parameters",
        b"\x00\x00\x00\x00|PATTERN=QFN-16|HEIGHT=0.9mm".to_vec(),
    );

    let record = b"|ID={1234}|NAME=soic8.step|EMBED=TRUE\x00";
    let mut index = (record.len() as u32).to_le_bytes().to_vec();
    index.extend_from_slice(record);
    streams.insert("Library/Models/Data", index);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"ISO-10303-21;").unwrap();
    streams.insert("Library/Models/0", encoder.finish().unwrap());

    let library = PcbLibrary::from_source(streams, OpenOptions::new()).unwrap();
    let patterns: Vec<_> = library.items().iter().map(|f| f.pattern.as_str()).collect();
    assert_eq!(patterns, vec!["QFN-16", "SOIC-8"]);
    assert_eq!(library.items()[0].height, Some(Decimal::from_str("0.9").unwrap()));
    assert_eq!(library.items()[1].height, Some(Decimal::from_str("1.75").unwrap()));

    let models = library.models().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "soic8.step");
    assert_eq!(models[0].data, b"ISO-10303-21;");
}

#[test]
fn open_detects_extracted_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(
        root.join("FileHeader"),
        format!("\x30\x00\x00\x00|{}|CompCount=1|LibRef0=DIODE", SCHLIB_SIGNATURE),
    )
    .unwrap();
    fs::create_dir(root.join("DIODE")).unwrap();
    let mut data = b"|RECORD=1|LibReference=DIODE|PartCount=2".to_vec();
    data.extend(pin_chunk("A", "1"));
    fs::write(root.join("DIODE").join("Data"), data).unwrap();

    let mut library = altiumlib::open(root).unwrap();
    assert_eq!(library.len(), 1);
    let items = library.items();
    assert_eq!(items[0].libref, "DIODE");
    assert_eq!(items[0].section_key, "DIODE");

    let mut csv = Vec::new();
    library.write_index_csv(&mut csv).unwrap();
    assert_eq!(
        String::from_utf8(csv).unwrap(),
        "libref,description,partcount,sectionkey\nDIODE,,0,DIODE\n"
    );

    let Library::Sch(sch) = &mut library else {
        panic!("expected a schematic library");
    };
    assert_eq!(sch.item_records(0).unwrap().len(), 2);
}

#[test]
fn open_rejects_plain_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(altiumlib::open(dir.path()), Err(Error::Format(_))));
    assert!(altiumlib::open(dir.path().join("missing")).is_err());
}

#[test]
fn materials_library_round_trips_through_a_file() {
    let mut library = MaterialsLibrary::new();
    library.push(Entity::new(Material::Prepreg(Dielectric {
        name: "2116".to_string(),
        dielectric_constant: Decimal::from_str("4.25").unwrap(),
        thickness: Decimal::from_str("0.1143").unwrap(),
        glass_trans_temp: Decimal::from(170),
        frequency: Decimal::from(1_000_000_000u64),
        resin_pct: Decimal::from_str("54.5").unwrap(),
        ..Dielectric::default()
    })));
    library.push(Entity::new(Material::SolderMask(SolderMask {
        name: "Green LPI".to_string(),
        color: "#ff008000".to_string(),
        ..SolderMask::default()
    })));
    library.push(Entity::new(Material::CopperFoil(CopperFoil {
        name: "1oz".to_string(),
        thickness: Decimal::from_str("0.035").unwrap(),
        ..CopperFoil::default()
    })));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Materials.xml");
    library.dump(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(r#"<Property Name="Resin" Type="DimValue" Dimension="Relative">54.5%</Property>"#));
    assert!(text.contains(r#"Dimension="Frequency">1GHz</Property>"#));

    let reloaded = MaterialsLibrary::load(&path).unwrap();
    assert_eq!(reloaded, library);
    assert_eq!(reloaded.entities_of(MaterialType::Prepreg).count(), 1);
    assert_eq!(reloaded.entities_of(MaterialType::CopperFoil).count(), 1);

    let mut edited = reloaded.clone();
    edited.entities[1].solder_mask_mut().unwrap().color = "green".to_string();
    assert!(matches!(
        edited.dumps(),
        Err(Error::PropertyValidation { property: "Color", .. })
    ));
}
