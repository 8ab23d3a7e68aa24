// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/matlib/entity.rs - Materials library entities and their XML form.
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
 * # `entity` Module
 *
 * One `<Entity>` element of a materials library: its ids, revision date,
 * and the [Material] decoded from its properties.
 */

use std::io::Write;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Timelike, Utc};
use log::{debug, warn};
use quick_xml::events::{BytesEnd, BytesRef, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use uuid::Uuid;

use super::MaterialType;
use super::material::{CopperFoil, Dielectric, Finish, Material, SolderMask};
use super::property::RawProperty;
use crate::error::{Error, Result};

/// One material in a materials library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub entity_id: Uuid,
    pub revision_id: Uuid,
    pub revision_date: DateTime<Utc>,
    /// XML namespace the entity was read from or will be written in.
    pub namespace: String,
    material: Material,
}

impl Entity {
    /// Creates an entity with fresh ids, dated now.
    pub fn new(material: Material) -> Self {
        Self {
            entity_id: Uuid::new_v4(),
            revision_id: Uuid::new_v4(),
            revision_date: Utc::now().trunc_subsecs(6),
            namespace: String::new(),
            material,
        }
    }

    /// The material cannot be swapped for another kind after construction,
    /// so only the kind-specific accessors below hand out mutable access.
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn type_id(&self) -> Uuid {
        self.material.type_id()
    }

    pub fn material_type(&self) -> Option<MaterialType> {
        self.material.material_type()
    }

    pub fn dielectric_mut(&mut self) -> Option<&mut Dielectric> {
        match &mut self.material {
            Material::Core(d) | Material::Prepreg(d) => Some(d),
            _ => None,
        }
    }

    pub fn finish_mut(&mut self) -> Option<&mut Finish> {
        match &mut self.material {
            Material::FinishEnig(f)
            | Material::FinishHasl(f)
            | Material::FinishImmersionAu(f)
            | Material::FinishImmersionSn(f)
            | Material::FinishOsp(f) => Some(f),
            _ => None,
        }
    }

    pub fn solder_mask_mut(&mut self) -> Option<&mut SolderMask> {
        match &mut self.material {
            Material::SolderMask(m) => Some(m),
            _ => None,
        }
    }

    pub fn copper_foil_mut(&mut self) -> Option<&mut CopperFoil> {
        match &mut self.material {
            Material::CopperFoil(c) => Some(c),
            _ => None,
        }
    }

    /// Parses a standalone `<Entity>` element.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"Entity" => {
                    return Self::read(&mut reader, &e, "", false);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"Entity" => {
                    return Self::read(&mut reader, &e, "", true);
                }
                Event::Eof => return Err(Error::Xml("no Entity element found".to_string())),
                _ => {}
            }
        }
    }

    /// Serializes the entity as a standalone `<Entity>` element.
    ///
    /// Fails with [Error::PropertyValidation] if a property value does not
    /// pass its validator.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write_xml(&mut writer, true)?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Reads the attributes of `start` and, unless it was self-closing,
    /// its `<Property>` children up to the matching end tag.
    pub(crate) fn read(
        reader: &mut Reader<&[u8]>,
        start: &BytesStart,
        namespace: &str,
        empty: bool,
    ) -> Result<Self> {
        let mut namespace = namespace.to_string();
        let mut entity_id = None;
        let mut type_id = None;
        let mut revision_id = None;
        let mut revision_date = None;

        for attr in start.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.as_ref() {
                b"xmlns" => namespace = value,
                b"Id" => entity_id = Some(value),
                b"TypeId" => type_id = Some(value),
                b"RevisionId" => revision_id = Some(value),
                b"RevisionDate" => revision_date = Some(value),
                _ => {}
            }
        }

        let properties = if empty {
            Vec::new()
        } else {
            read_properties(reader)?
        };

        let type_id = type_id
            .and_then(|id| Uuid::parse_str(&id).ok())
            .unwrap_or_default();
        let material = Material::from_properties(type_id, properties);
        if let Material::Unrecognized { .. } = material {
            debug!("Keeping entity of unrecognized type {} as-is", type_id);
        }

        Ok(Self {
            entity_id: parse_uuid(entity_id.as_deref()),
            revision_id: parse_uuid(revision_id.as_deref()),
            revision_date: parse_date(revision_date.as_deref()),
            namespace,
            material,
        })
    }

    /// Writes the entity element into an existing document. `xmlns` is only
    /// written when `with_namespace` is set and the namespace is not empty.
    pub fn write_xml<W: Write>(&self, writer: &mut Writer<W>, with_namespace: bool) -> Result<()> {
        let properties = self.material.properties()?;

        let entity_id = self.entity_id.to_string();
        let type_id = self.type_id().to_string();
        let revision_id = self.revision_id.to_string();
        let revision_date = format_date(&self.revision_date);

        let mut start = BytesStart::new("Entity");
        if with_namespace && !self.namespace.is_empty() {
            start.push_attribute(("xmlns", self.namespace.as_str()));
        }
        start.push_attribute(("Id", entity_id.as_str()));
        start.push_attribute(("TypeId", type_id.as_str()));
        start.push_attribute(("RevisionId", revision_id.as_str()));
        start.push_attribute(("RevisionDate", revision_date.as_str()));

        if properties.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for property in &properties {
            write_property(writer, property)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Entity")))?;
        Ok(())
    }
}

fn read_properties(reader: &mut Reader<&[u8]>) -> Result<Vec<RawProperty>> {
    let mut properties = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"Property" => {
                let (name, attrs) = property_attrs(&e)?;
                let text = read_text(reader)?;
                properties.push(RawProperty { name, attrs, text });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"Property" => {
                let (name, attrs) = property_attrs(&e)?;
                properties.push(RawProperty {
                    name,
                    attrs,
                    text: String::new(),
                });
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(Error::Xml("unterminated Entity element".to_string())),
            _ => {}
        }
    }

    Ok(properties)
}

fn property_attrs(start: &BytesStart) -> Result<(String, Vec<(String, String)>)> {
    let mut name = String::new();
    let mut attrs = Vec::new();

    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        if key == "Name" {
            name = value;
        } else {
            attrs.push((key, value));
        }
    }

    Ok((name, attrs))
}

/// Collects the text of the current element up to its end tag.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::GeneralRef(r) => push_reference(&mut text, &r),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(Error::Xml("unterminated Property element".to_string())),
            _ => {}
        }
    }

    Ok(text)
}

fn push_reference(text: &mut String, reference: &BytesRef) {
    if let Ok(Some(c)) = reference.resolve_char_ref() {
        text.push(c);
        return;
    }

    let name = String::from_utf8_lossy(reference);
    match quick_xml::escape::resolve_predefined_entity(&name) {
        Some(resolved) => text.push_str(resolved),
        None => {
            warn!("Unknown entity reference &{};", name);
            text.push('&');
            text.push_str(&name);
            text.push(';');
        }
    }
}

fn write_property<W: Write>(writer: &mut Writer<W>, property: &RawProperty) -> Result<()> {
    let mut start = BytesStart::new("Property");
    start.push_attribute(("Name", property.name.as_str()));
    for (key, value) in &property.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if property.text.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(&property.text)))?;
        writer.write_event(Event::End(BytesEnd::new("Property")))?;
    }
    Ok(())
}

fn parse_uuid(value: Option<&str>) -> Uuid {
    match value.map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        _ => {
            debug!("Replacing missing or malformed id {:?} with a new one", value);
            Uuid::new_v4()
        }
    }
}

fn parse_date(value: Option<&str>) -> DateTime<Utc> {
    let Some(text) = value else {
        return Utc::now().trunc_subsecs(6);
    };

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return date.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }

    warn!("Unreadable revision date {:?}, using the current time", text);
    Utc::now().trunc_subsecs(6)
}

fn format_date(date: &DateTime<Utc>) -> String {
    let precision = if date.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    date.to_rfc3339_opts(precision, true)
}
