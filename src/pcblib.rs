// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/pcblib.rs - PCB footprint library (PcbLib) reader.
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
 * # `pcblib` Module
 *
 * Lists the footprints of a PCB library and extracts its embedded 3D
 * models.
 *
 * Every footprint lives in its own storage with a `Parameters` stream. The
 * first four bytes of that stream are not part of the key/value text.
 * Embedded models are indexed by `Library/Models/Data`, a sequence of
 * records each prefixed with a 4-byte little-endian length, and model `i` is
 * stored zlib-compressed in `Library/Models/{i}`.
 */

use std::io::{self, Read};
use std::path::Path;

use flate2::read::ZlibDecoder;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::binary::{self, Endian, PrefixWidth};
use crate::error::{Error, Result};
use crate::stream::{self, DirectoryStreams, OpenOptions, StreamSource};
use crate::tokenizer::tokenize;
use crate::units::{eval_bool, to_mm};

/// Signature at the start of a PcbLib `FileHeader` stream.
pub const PCBLIB_SIGNATURE: &str = "PCB 6.0 Binary Library File";

const PARAMETERS_PREFIX_LEN: usize = 4;
const MODELS_INDEX: &str = "Library/Models/Data";

/// One footprint in a PCB library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    /// Storage the footprint was read from.
    pub storage: String,
    pub pattern: String,
    pub description: String,
    /// Component height in millimeters, rounded to two places.
    pub height: Option<Decimal>,
}

/// A 3D model stored in a PCB library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedModel {
    pub id: String,
    pub name: String,
    pub embedded: bool,
    /// Decompressed model body. Empty for models that are only linked.
    pub data: Vec<u8>,
}

/// A PCB library read through a [StreamSource].
#[derive(Debug)]
pub struct PcbLibrary<S> {
    source: S,
    options: OpenOptions,
    items: Vec<Footprint>,
}

impl PcbLibrary<DirectoryStreams> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(DirectoryStreams::new(path)?, OpenOptions::default())
    }
}

impl<S: StreamSource> PcbLibrary<S> {
    pub fn from_source(source: S, options: OpenOptions) -> Result<Self> {
        if !stream::has_signature(&source, PCBLIB_SIGNATURE)? {
            return Err(Error::Format(
                "FileHeader does not carry the PCB library signature".to_string(),
            ));
        }

        let mut items = Vec::new();
        for storage in source.storages()? {
            let lowered = storage.to_lowercase();
            if lowered.contains("fileversioninfo") || lowered.contains("library") {
                continue;
            }

            let path = format!("{}/Parameters", storage);
            let data = stream::read_optional(&source, &path, &options)?;
            items.push(read_footprint(storage, &data));
        }
        debug!("PCB library lists {} footprints", items.len());

        Ok(Self {
            source,
            options,
            items,
        })
    }

    pub fn items(&self) -> &[Footprint] {
        &self.items
    }

    /// Reads the model index and decompresses every embedded model.
    ///
    /// A truncated index entry ends the list; models read before it are
    /// kept. Model bodies are not subject to the stream limit.
    pub fn models(&self) -> Result<Vec<EmbeddedModel>> {
        let index = stream::read_optional(&self.source, MODELS_INDEX, &self.options)?;
        let mut rest = index.as_slice();
        let mut models = Vec::new();

        while !rest.is_empty() {
            let (body, next) = match binary::read_prefixed(rest, PrefixWidth::U32, Endian::Little) {
                Ok(parts) => parts,
                Err(err) => {
                    warn!("Model index entry {} is truncated: {}", models.len(), err);
                    break;
                }
            };
            rest = next;

            let body = body.strip_suffix(b"\0").unwrap_or(body);
            let fields = tokenize(body);
            let embedded = fields.get_str("EMBED").is_some_and(|v| eval_bool(&v));

            let data = if embedded {
                let path = format!("Library/Models/{}", models.len());
                decompress(&stream::read_blob(&self.source, &path)?)?
            } else {
                Vec::new()
            };

            models.push(EmbeddedModel {
                id: fields.get_str("ID").unwrap_or_default(),
                name: fields.get_str("NAME").unwrap_or_default(),
                embedded,
                data,
            });
        }

        Ok(models)
    }

    /// Writes one CSV row per footprint: pattern, description, and height.
    pub fn write_index_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["footprintref", "description", "height"])?;

        for item in &self.items {
            let height = item.height.map(|h| h.to_string()).unwrap_or_default();
            csv.write_record([item.pattern.as_str(), item.description.as_str(), height.as_str()])?;
        }

        csv.flush()?;
        Ok(())
    }
}

fn read_footprint(storage: String, parameters: &[u8]) -> Footprint {
    let text = binary::skip(parameters, PARAMETERS_PREFIX_LEN).unwrap_or_default();
    let fields = tokenize(text);

    let height = fields.get_str("HEIGHT").and_then(|h| match to_mm(&h) {
        Ok(mm) => Some(mm.round_dp(2)),
        Err(err) => {
            debug!("Footprint {} has unreadable height: {}", storage, err);
            None
        }
    });

    Footprint {
        pattern: fields.get_str("PATTERN").unwrap_or_default(),
        description: fields.get_str("DESCRIPTION").unwrap_or_default(),
        height,
        storage,
    }
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut decoder = ZlibDecoder::new(data);
    let mut buffer = Vec::new();
    decoder
        .read_to_end(&mut buffer)
        .map_err(|err| Error::Decompression(err.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::str::FromStr;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;
    use crate::stream::MemoryStreams;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn prefixed(text: &str) -> Vec<u8> {
        let mut out = ((text.len() + 1) as u32).to_le_bytes().to_vec();
        out.extend_from_slice(text.as_bytes());
        out.push(0);
        out
    }

    fn library_streams() -> MemoryStreams {
        let mut streams = MemoryStreams::new();
        streams.insert("FileHeader", format!("\x1b\x00\x00\x00{}", PCBLIB_SIGNATURE));
        streams.insert("FileVersionInfo/Data", b"ignored".to_vec());
        streams.insert("Library/Data", b"ignored".to_vec());
        streams.insert(
            "0603/Parameters",
            b"\x01\x02\x03\x04|PATTERN=0603|DESCRIPTION=Chip resistor|HEIGHT=0.5mm".to_vec(),
        );
        streams.insert(
            "SOT23/Parameters",
            b"\x01\x02\x03\x04|PATTERN=SOT23|HEIGHT=44mil".to_vec(),
        );
        streams
    }

    #[test]
    fn test_footprints() {
        let library = PcbLibrary::from_source(library_streams(), OpenOptions::new()).unwrap();

        assert_eq!(
            library.items(),
            &[
                Footprint {
                    storage: "0603".to_string(),
                    pattern: "0603".to_string(),
                    description: "Chip resistor".to_string(),
                    height: Some(Decimal::from_str("0.5").unwrap()),
                },
                Footprint {
                    storage: "SOT23".to_string(),
                    pattern: "SOT23".to_string(),
                    description: String::new(),
                    height: Some(Decimal::from_str("1.12").unwrap()),
                },
            ]
        );
    }

    #[test]
    fn test_short_parameters() {
        let footprint = read_footprint("X".to_string(), b"\x01\x02");
        assert_eq!(footprint.pattern, "");
        assert_eq!(footprint.height, None);

        let footprint = read_footprint("Y".to_string(), b"\0\0\0\0|PATTERN=Y|HEIGHT=tall");
        assert_eq!(footprint.pattern, "Y");
        assert_eq!(footprint.height, None);
    }

    #[test]
    fn test_models() {
        let mut streams = library_streams();
        let mut index = prefixed("|ID={ABC}|NAME=body.step|EMBED=TRUE");
        index.extend(prefixed("|ID={DEF}|NAME=linked.step|EMBED=FALSE"));
        // Truncated third entry.
        index.extend_from_slice(&[0x40, 0, 0, 0, b'|']);
        streams.insert("Library/Models/Data", index);
        streams.insert("Library/Models/0", compress(b"ISO-10303-21;"));

        let library = PcbLibrary::from_source(streams, OpenOptions::new()).unwrap();
        let models = library.models().unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "{ABC}");
        assert_eq!(models[0].name, "body.step");
        assert!(models[0].embedded);
        assert_eq!(models[0].data, b"ISO-10303-21;");
        assert!(!models[1].embedded);
        assert!(models[1].data.is_empty());
    }

    #[test]
    fn test_models_ignore_stream_limit() {
        // Noise from an LCG so the compressed body stays large.
        let mut state = 0x1234_5678u32;
        let body: Vec<u8> = (0..4096)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect();
        let compressed = compress(&body);

        let mut streams = library_streams();
        streams.insert("Library/Models/Data", prefixed("|ID=1|NAME=big.step|EMBED=TRUE"));
        streams.insert("Library/Models/0", compressed.clone());

        let options = OpenOptions::new().max_stream_bytes(64);
        assert!(compressed.len() > options.stream_limit());

        let library = PcbLibrary::from_source(streams, options).unwrap();
        let models = library.models().unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "big.step");
        assert_eq!(models[0].data, body);
    }

    #[test]
    fn test_models_bad_zlib() {
        let mut streams = library_streams();
        streams.insert("Library/Models/Data", prefixed("|ID=1|EMBED=TRUE"));
        streams.insert("Library/Models/0", b"not zlib".to_vec());

        let library = PcbLibrary::from_source(streams, OpenOptions::new()).unwrap();
        assert!(matches!(library.models(), Err(Error::Decompression(_))));
    }

    #[test]
    fn test_no_models() {
        let library = PcbLibrary::from_source(library_streams(), OpenOptions::new()).unwrap();
        assert!(library.models().unwrap().is_empty());
    }

    #[test]
    fn test_write_index_csv() {
        let library = PcbLibrary::from_source(library_streams(), OpenOptions::new()).unwrap();
        let mut out = Vec::new();
        library.write_index_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "footprintref,description,height\n0603,Chip resistor,0.5\nSOT23,,1.12\n"
        );
    }
}
