// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/units.rs - Unit and value conversions for Altium files.
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
 * # `units` Module
 *
 * Conversions between numbers and the human-annotated strings Altium stores
 * in its files, such as `1GHz`, `0.1mm`, `5mil`, or `180C`.
 *
 * All physical quantities are carried as [Decimal] so that values read from
 * a file can be written back without binary floating point noise.
 *
 * ## Usage Example
 *
 * ```
 * use rust_decimal::Decimal;
 *
 * use altiumlib::units::{dehumanize, humanize};
 *
 * let hz = Decimal::from(1_000_000_000u64);
 * assert_eq!(humanize(hz, "Hz", Some(2), true), "1GHz");
 * assert_eq!(dehumanize("1GHz", "Hz").unwrap(), hz);
 * ```
 */

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

const SI_PREFIXES: [&str; 4] = ["k", "M", "G", "T"];

fn thousand() -> Decimal {
    Decimal::new(1000, 0)
}

fn mm_per_mil() -> Decimal {
    Decimal::new(254, 4)
}

fn mm_per_inch() -> Decimal {
    Decimal::new(254, 1)
}

/// Formats `value` followed by `unit`.
///
/// When `prefix` is set the value is divided by 1000 until it drops below
/// 1000 (or the largest prefix, `T`, is reached) and the matching SI prefix
/// is placed in front of the unit. When `places` is given the value is
/// rounded half-up to that many decimal places. Trailing zeros are always
/// trimmed.
pub fn humanize(value: Decimal, unit: &str, places: Option<u32>, prefix: bool) -> String {
    let mut scaled = value;
    let mut index = 0;

    if prefix {
        while scaled.abs() >= thousand() && index < SI_PREFIXES.len() {
            scaled /= thousand();
            index += 1;
        }
    }

    if let Some(dp) = places {
        scaled = scaled.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    }

    let symbol = match index {
        0 => "",
        i => SI_PREFIXES[i - 1],
    };

    format!("{}{}{}", scaled.normalize(), symbol, unit)
}

/// Parses a string produced by [humanize] back into a plain number.
///
/// A recognized `k`/`M`/`G`/`T` prefix in front of `unit` scales the result;
/// any other suffix leaves it unscaled.
pub fn dehumanize(text: &str, unit: &str) -> Result<Decimal> {
    let (value, suffix) = split_numeric(text)?;
    let suffix = suffix.strip_suffix(unit).unwrap_or(suffix).trim();

    let exponent = match suffix {
        "k" | "K" => 1,
        "M" => 2,
        "G" => 3,
        "T" => 4,
        _ => 0,
    };

    let mut result = value;
    for _ in 0..exponent {
        result *= thousand();
    }
    Ok(result)
}

/// Converts a length with an optional unit suffix to millimeters.
///
/// `mm` is stripped before the `mil` test runs, so the checks happen in the
/// order mm, mil, inch. Unsuffixed values are taken as millimeters.
pub fn to_mm(text: &str) -> Result<Decimal> {
    let lowered = text.trim().to_lowercase();
    let stripped = lowered.replace("mm", "");

    let (value, _) = split_numeric(&stripped)?;

    if stripped.contains("mil") {
        return Ok(value * mm_per_mil());
    }

    if stripped.contains("inch") || stripped.ends_with("in") || stripped.contains('"') {
        return Ok(value * mm_per_inch());
    }

    Ok(value)
}

/// Converts a temperature to degrees Celsius.
///
/// Accepts an optional degree sign and an `F`, `K`, or `C` suffix.
pub fn to_celsius(text: &str) -> Result<Decimal> {
    let cleaned = text.replace('°', "");
    let (value, suffix) = split_numeric(&cleaned)?;

    match suffix.to_uppercase().as_str() {
        "F" => Ok((value - Decimal::from(32)) * Decimal::from(5) / Decimal::from(9)),
        "K" => Ok(value - Decimal::new(27315, 2)),
        _ => Ok(value),
    }
}

/// Altium booleans are written as `T`, `TRUE`, or `1`.
pub fn eval_bool(text: &str) -> bool {
    matches!(text.to_lowercase().as_str(), "1" | "t" | "true")
}

/// Converts an Altium color integer to an `#rrggbb` string.
///
/// Altium stores colors with red in the low byte, the reverse of the usual
/// `0xRRGGBB` layout. A missing or zero color maps to white.
pub fn eval_color(value: Option<i64>) -> String {
    let color = match value {
        None | Some(0) => return "#ffffff".to_string(),
        Some(c) => (c & 0xFF_FFFF) as u32,
    };

    let red = color & 0xFF;
    let green = (color >> 8) & 0xFF;
    let blue = (color >> 16) & 0xFF;

    format!("#{:02x}{:02x}{:02x}", red, green, blue)
}

/// Parses a decimal number, accepting a comma as the decimal separator.
pub(crate) fn parse_decimal(s: &str) -> Result<Decimal> {
    let s = s.trim().replace(',', ".");
    let s = s.strip_prefix('+').unwrap_or(&s);
    Decimal::from_str(s).map_err(|_| Error::invalid(s, "not a decimal number"))
}

/// Splits `text` into its leading numeric run and the trimmed remainder.
fn split_numeric(text: &str) -> Result<(Decimal, &str)> {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit() || c == '.' || c == ',' || (i == 0 && (c == '-' || c == '+')))
        })
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    let (number, rest) = trimmed.split_at(end);
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::invalid(text, "no numeric value"));
    }

    Ok((parse_decimal(number)?, rest.trim()))
}
