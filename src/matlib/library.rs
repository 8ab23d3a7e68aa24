// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/matlib/library.rs - Materials library documents.
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
 * # `library` Module
 *
 * The `ExtensibleLibrary` document that holds material entities.
 */

use std::fs;
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::PrefixDeclaration;
use quick_xml::{Reader, Writer};
use uuid::Uuid;

use super::MaterialType;
use super::entity::Entity;
use crate::error::{Error, Result};

pub const DEFAULT_VERSION: &str = "1.1.0.0";
pub const DEFAULT_NAMESPACE: &str = "http://altium.com/ns/Data/ExtensibleLibraries";

const ROOT: &str = "ExtensibleLibrary";

/// An `ExtensibleLibrary` document holding material entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialsLibrary {
    pub serializer_version: String,
    pub library_id: Uuid,
    pub version: String,
    /// Namespace of the root element, written back as its default namespace.
    pub namespace: String,
    pub entities: Vec<Entity>,
}

impl Default for MaterialsLibrary {
    fn default() -> Self {
        Self {
            serializer_version: DEFAULT_VERSION.to_string(),
            library_id: Uuid::new_v4(),
            version: DEFAULT_VERSION.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            entities: Vec::new(),
        }
    }
}

impl MaterialsLibrary {
    /// Creates an empty library with a fresh id.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::loads(&fs::read_to_string(path)?)
    }

    /// Parses a library document.
    ///
    /// Only `Entity` elements inside `Entities` are read. Every entity takes
    /// the namespace of the root element unless it declares its own.
    pub fn loads(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut library: Option<Self> = None;
        let mut in_entities = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == ROOT.as_bytes() => {
                    library = Some(Self::from_root(&e)?);
                }
                Event::Start(e) if e.local_name().as_ref() == b"Entities" => in_entities = true,
                Event::End(e) if e.local_name().as_ref() == b"Entities" => in_entities = false,
                Event::Start(e) if in_entities && e.local_name().as_ref() == b"Entity" => {
                    let library = library.as_mut().ok_or_else(missing_root)?;
                    let entity = Entity::read(&mut reader, &e, &library.namespace, false)?;
                    library.entities.push(entity);
                }
                Event::Empty(e) if in_entities && e.local_name().as_ref() == b"Entity" => {
                    let library = library.as_mut().ok_or_else(missing_root)?;
                    let entity = Entity::read(&mut reader, &e, &library.namespace, true)?;
                    library.entities.push(entity);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let library = library.ok_or_else(missing_root)?;
        debug!("Loaded materials library with {} entities", library.entities.len());
        Ok(library)
    }

    fn from_root(root: &BytesStart) -> Result<Self> {
        let mut library = Self {
            namespace: String::new(),
            ..Self::default()
        };

        let prefix = root.name().prefix().map(|p| p.as_ref().to_vec());

        for attr in root.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();

            // The root is the document element, so only its own declarations
            // can bind its prefix.
            if let Some(binding) = attr.key.as_namespace_binding() {
                let bound = match binding {
                    PrefixDeclaration::Default => None,
                    PrefixDeclaration::Named(name) => Some(name),
                };
                if bound == prefix.as_deref() {
                    library.namespace = value;
                }
                continue;
            }

            match attr.key.as_ref() {
                b"SerializerVersion" => library.serializer_version = value,
                b"Version" => library.version = value,
                b"LibraryId" => match Uuid::parse_str(&value) {
                    Ok(id) => library.library_id = id,
                    Err(_) => debug!("Replacing malformed library id {:?}", value),
                },
                _ => {}
            }
        }

        Ok(library)
    }

    /// Serializes the library, XML declaration included.
    ///
    /// Entities inherit the root namespace, so none of them carries its own
    /// `xmlns`. Fails with [Error::PropertyValidation] if any property does
    /// not pass its validator.
    pub fn dumps(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let library_id = self.library_id.to_string();
        let mut root = BytesStart::new(ROOT);
        if !self.namespace.is_empty() {
            root.push_attribute(("xmlns", self.namespace.as_str()));
        }
        root.push_attribute(("SerializerVersion", self.serializer_version.as_str()));
        root.push_attribute(("LibraryId", library_id.as_str()));
        root.push_attribute(("Version", self.version.as_str()));
        writer.write_event(Event::Start(root))?;

        writer.write_event(Event::Empty(BytesStart::new("Types")))?;
        writer.write_event(Event::Empty(BytesStart::new("TypeExtensions")))?;

        if self.entities.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("Entities")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("Entities")))?;
            for entity in &self.entities {
                entity.write_xml(&mut writer, false)?;
            }
            writer.write_event(Event::End(BytesEnd::new("Entities")))?;
        }

        writer.write_event(Event::Empty(BytesStart::new("EntityExtensions")))?;
        writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Appends `entity`, moving it into the library's namespace.
    pub fn push(&mut self, mut entity: Entity) {
        entity.namespace = self.namespace.clone();
        self.entities.push(entity);
    }

    pub fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.dumps()?)?;
        Ok(())
    }

    /// Iterates over the entities of one material kind, in document order.
    pub fn entities_of(&self, kind: MaterialType) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.material_type() == Some(kind))
    }
}

fn missing_root() -> Error {
    Error::Xml(format!("document has no {} root element", ROOT))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::matlib::{Dielectric, Finish, Material};

    const LIBRARY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ExtensibleLibrary xmlns="http://example.com/ns" SerializerVersion="1.1.0.0" LibraryId="9f0c1bd1-2f6a-4bd3-a3a2-3c4a4b3e9a11" Version="2.0.0.0">
  <Types />
  <TypeExtensions />
  <Entities>
    <Entity Id="00000000-0000-0000-0000-000000000001" TypeId="b6b5d288-d4b3-4b60-857f-b949da02a37a" RevisionId="00000000-0000-0000-0000-000000000002" RevisionDate="2023-01-01T00:00:00Z">
      <Property Name="Thickness" Type="DimValue" Dimension="Length">0.005mm</Property>
      <Property Name="Process" Type="String">ENIG</Property>
    </Entity>
    <Entity Id="00000000-0000-0000-0000-000000000003" TypeId="27d70fdc-4c4e-4774-bfac-7efbb48cde47" RevisionId="00000000-0000-0000-0000-000000000004" RevisionDate="2023-01-01T00:00:00Z">
      <Property Name="Name" Type="String">FR-4</Property>
    </Entity>
  </Entities>
  <EntityExtensions />
</ExtensibleLibrary>"#;

    #[test]
    fn test_loads() {
        let library = MaterialsLibrary::loads(LIBRARY_XML).unwrap();

        assert_eq!(library.namespace, "http://example.com/ns");
        assert_eq!(library.version, "2.0.0.0");
        assert_eq!(
            library.library_id.to_string(),
            "9f0c1bd1-2f6a-4bd3-a3a2-3c4a4b3e9a11"
        );
        assert_eq!(library.entities.len(), 2);
        assert!(library.entities.iter().all(|e| e.namespace == library.namespace));

        let finishes: Vec<_> = library.entities_of(MaterialType::FinishEnig).collect();
        assert_eq!(finishes.len(), 1);
        match finishes[0].material() {
            Material::FinishEnig(f) => {
                assert_eq!(f.thickness, Decimal::new(5, 3));
                assert_eq!(f.process, "ENIG");
                assert_eq!(f.color, "#ffffffff");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(library.entities_of(MaterialType::SolderMask).count(), 0);
    }

    #[test]
    fn test_dumps_round_trip() {
        let library = MaterialsLibrary::loads(LIBRARY_XML).unwrap();
        let xml = library.dumps().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<ExtensibleLibrary xmlns=\"http://example.com/ns\""));
        assert!(xml.contains("<EntityExtensions/>"));
        assert_eq!(xml.matches("xmlns=").count(), 1);

        assert_eq!(MaterialsLibrary::loads(&xml).unwrap(), library);
    }

    #[test]
    fn test_empty_library() {
        let library = MaterialsLibrary::new();
        let reloaded = MaterialsLibrary::loads(&library.dumps().unwrap()).unwrap();
        assert_eq!(reloaded, library);
        assert_eq!(reloaded.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_dumps_validates() {
        let mut library = MaterialsLibrary::new();
        library.entities.push(Entity::new(Material::Core(Dielectric {
            resin_pct: Decimal::from(101),
            ..Dielectric::default()
        })));
        assert!(matches!(
            library.dumps(),
            Err(Error::PropertyValidation { property: "Resin", .. })
        ));

        library.entities[0] = Entity::new(Material::FinishHasl(Finish::default()));
        assert!(library.dumps().is_ok());
    }

    #[test]
    fn test_push_threads_namespace() {
        let mut library = MaterialsLibrary::new();
        library.push(Entity::new(Material::Prepreg(Dielectric::default())));
        assert_eq!(library.entities[0].namespace, DEFAULT_NAMESPACE);

        let reloaded = MaterialsLibrary::loads(&library.dumps().unwrap()).unwrap();
        assert_eq!(reloaded, library);
    }

    #[test]
    fn test_loads_prefixed_root() {
        let xml = r#"<a:ExtensibleLibrary xmlns:a="http://example.com/ns" xmlns:b="http://example.com/other" SerializerVersion="1.1.0.0" LibraryId="9f0c1bd1-2f6a-4bd3-a3a2-3c4a4b3e9a11" Version="1.1.0.0">
  <a:Entities>
    <a:Entity Id="00000000-0000-0000-0000-000000000003" TypeId="27d70fdc-4c4e-4774-bfac-7efbb48cde47" RevisionId="00000000-0000-0000-0000-000000000004" RevisionDate="2023-01-01T00:00:00Z">
      <a:Property Name="Name" Type="String">FR-4</a:Property>
    </a:Entity>
  </a:Entities>
</a:ExtensibleLibrary>"#;

        let library = MaterialsLibrary::loads(xml).unwrap();
        assert_eq!(library.namespace, "http://example.com/ns");
        assert_eq!(library.entities.len(), 1);
        assert_eq!(library.entities[0].namespace, "http://example.com/ns");

        let dumped = library.dumps().unwrap();
        assert!(dumped.contains("<ExtensibleLibrary xmlns=\"http://example.com/ns\""));
        assert_eq!(MaterialsLibrary::loads(&dumped).unwrap(), library);
    }

    #[test]
    fn test_missing_root() {
        assert!(matches!(
            MaterialsLibrary::loads("<Other/>"),
            Err(Error::Xml(_))
        ));
    }

    #[test]
    fn test_load_and_dump_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materials.xml");

        let library = MaterialsLibrary::loads(LIBRARY_XML).unwrap();
        library.dump(&path).unwrap();
        assert_eq!(MaterialsLibrary::load(&path).unwrap(), library);
    }
}
