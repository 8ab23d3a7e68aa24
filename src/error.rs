// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Error types for the Altium library decoders.
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
 * # `error` Module
 *
 * The [Error] type returned by every fallible operation in the crate, and
 * the matching [Result] alias.
 */

use thiserror::Error;

/// The error type shared by every decoder in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The container does not carry the expected file signature.
    #[error("Invalid library format: {0}")]
    Format(String),

    /// A named stream does not exist in the container.
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// A fixed-width or length-prefixed read ran past the end of its buffer.
    #[error("Truncated binary data: needed {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A materials property failed its validator while encoding.
    #[error("Property {property} failed validation: {message}")]
    PropertyValidation {
        property: &'static str,
        message: &'static str,
    },

    /// A textual value could not be interpreted.
    #[error("Invalid value {value:?}: {reason}")]
    InvalidValue { value: String, reason: &'static str },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl Error {
    pub(crate) fn invalid(value: impl Into<String>, reason: &'static str) -> Self {
        Error::InvalidValue {
            value: value.into(),
            reason,
        }
    }
}

/// A convenience `Result` alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
