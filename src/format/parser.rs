//! Caps string parser using winnow.
//!
//! Parses GStreamer-like caps descriptions:
//!
//! ```text
//! audio/x-raw-int, rate=(int)44100, channels=(int)2, endianness=(int)1234,
//!     width=(int)16, depth=(int)16, signed=(boolean)true
//! audio/x-raw-float, rate=(int)[ 1, MAX ], width=(int){ 32, 64 }; audio/x-raw-int
//! ```
//!
//! # Syntax
//!
//! - Structures are separated by `;`
//! - Fields are `name=value` after the media type, separated by `,`
//! - A value may carry a type annotation like `(int)`, which is ignored
//! - `[ a, b ]` is a range, `{ a, b }` a list, `< a, b >` a channel layout
//! - `MAX` stands for the largest integer

use super::caps::{AudioCaps, Endianness, FormatKind, FormatSet};
use super::layout::{ChannelLayout, ChannelPosition, LayoutConstraint};
use super::value::{CapsScalar, CapsValue};
use crate::error::{Error, Result};
use std::str::FromStr;
use winnow::Parser;
use winnow::ascii::{alpha1, digit1, multispace0};
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated, separated_pair};
use winnow::error::ContextError;
use winnow::token::take_while;

type WResult<T> = std::result::Result<T, ContextError>;

/// A structure as written, before field values are typed.
#[derive(Debug, Clone, PartialEq)]
struct RawStructure {
    name: String,
    fields: Vec<(String, RawValue)>,
}

/// A field value as written.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Int(i64),
    Bool(bool),
    Ident(String),
    Range(Box<RawValue>, Box<RawValue>),
    List(Vec<RawValue>),
    Array(Vec<String>),
}

/// Parse a caps description into a format set.
///
/// # Example
///
/// ```rust
/// use parallax_audioconvert::format::parse_caps;
///
/// let caps = parse_caps("audio/x-raw-float, rate=(int)48000, width=(int){ 32, 64 }").unwrap();
/// assert_eq!(caps.len(), 1);
/// ```
pub fn parse_caps(input: &str) -> Result<FormatSet> {
    let structures = caps
        .parse(input.trim())
        .map_err(|e| Error::Parse(format!("{e}")))?;
    structures.iter().map(build_structure).collect()
}

/// Parse a caps description holding exactly one structure.
pub fn parse_structure(input: &str) -> Result<AudioCaps> {
    let set = parse_caps(input)?;
    match set.len() {
        1 => set
            .first()
            .cloned()
            .ok_or_else(|| Error::Parse("empty caps".into())),
        n => Err(Error::Parse(format!("expected one structure, found {n}"))),
    }
}

impl FromStr for AudioCaps {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_structure(s)
    }
}

impl FromStr for FormatSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_caps(s)
    }
}

// ============================================================================
// Grammar
// ============================================================================

/// Parse a complete caps string.
fn caps(input: &mut &str) -> WResult<Vec<RawStructure>> {
    let structures = separated(1.., structure, structure_separator).parse_next(input)?;

    // optional trailing separator
    let _ = opt((multispace0, ';')).parse_next(input)?;
    multispace0.parse_next(input)?;
    if !input.is_empty() {
        return Err(ContextError::new());
    }

    Ok(structures)
}

fn structure_separator(input: &mut &str) -> WResult<()> {
    let _ = (multispace0, ';', multispace0).parse_next(input)?;
    Ok(())
}

fn list_separator(input: &mut &str) -> WResult<()> {
    let _ = (multispace0, ',', multispace0).parse_next(input)?;
    Ok(())
}

/// Parse a structure (media type + optional fields).
fn structure(input: &mut &str) -> WResult<RawStructure> {
    let _ = multispace0.parse_next(input)?;
    let name: &str = take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.')
    })
    .parse_next(input)?;

    let fields: Vec<(String, RawValue)> =
        repeat(0.., preceded(list_separator, field)).parse_next(input)?;

    Ok(RawStructure {
        name: name.to_string(),
        fields,
    })
}

/// Parse an identifier (field name, keyword, or channel position).
fn identifier<'a>(input: &mut &'a str) -> WResult<&'a str> {
    (
        alt((alpha1::<_, ContextError>, "_")),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    )
        .take()
        .parse_next(input)
}

/// Parse a field (`name=(type)value`).
fn field(input: &mut &str) -> WResult<(String, RawValue)> {
    let key: &str = identifier.parse_next(input)?;
    let _ = (multispace0, '=', multispace0).parse_next(input)?;
    let _ = opt(type_annotation).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let value = value.parse_next(input)?;
    Ok((key.to_string(), value))
}

fn type_annotation<'a>(input: &mut &'a str) -> WResult<&'a str> {
    delimited(('(', multispace0), identifier, (multispace0, ')')).parse_next(input)
}

fn value(input: &mut &str) -> WResult<RawValue> {
    alt((range, list, array, scalar)).parse_next(input)
}

fn range(input: &mut &str) -> WResult<RawValue> {
    delimited(
        ('[', multispace0),
        separated_pair(scalar, list_separator, scalar),
        (multispace0, ']'),
    )
    .map(|(lo, hi)| RawValue::Range(Box::new(lo), Box::new(hi)))
    .parse_next(input)
}

fn list(input: &mut &str) -> WResult<RawValue> {
    delimited(
        ('{', multispace0),
        separated(1.., value, list_separator),
        (multispace0, '}'),
    )
    .map(RawValue::List)
    .parse_next(input)
}

fn array(input: &mut &str) -> WResult<RawValue> {
    delimited(
        ('<', multispace0),
        separated(1.., identifier.map(str::to_string), list_separator),
        (multispace0, '>'),
    )
    .map(RawValue::Array)
    .parse_next(input)
}

fn scalar(input: &mut &str) -> WResult<RawValue> {
    alt((
        boolean.map(RawValue::Bool),
        integer.map(RawValue::Int),
        identifier.map(|s: &str| RawValue::Ident(s.to_string())),
    ))
    .parse_next(input)
}

/// Parse a boolean.
fn boolean(input: &mut &str) -> WResult<bool> {
    let checkpoint = *input;
    let word: &str = identifier.parse_next(input)?;
    match word {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => {
            *input = checkpoint;
            Err(ContextError::new())
        }
    }
}

/// Parse an integer.
fn integer(input: &mut &str) -> WResult<i64> {
    let negative = opt('-').parse_next(input)?;
    let digits: &str = digit1.parse_next(input)?;
    let value: i64 = digits.parse().map_err(|_| ContextError::new())?;
    Ok(if negative.is_some() { -value } else { value })
}

// ============================================================================
// Typing
// ============================================================================

fn build_structure(raw: &RawStructure) -> Result<AudioCaps> {
    let kind = FormatKind::from_media_type(&raw.name)
        .ok_or_else(|| Error::Parse(format!("unsupported media type '{}'", raw.name)))?;
    let mut caps = AudioCaps::new(kind);

    for (key, value) in &raw.fields {
        match key.as_str() {
            "rate" => caps.rate = typed(key, value, int_scalar)?,
            "channels" => caps.channels = typed(key, value, int_scalar)?,
            "width" => caps.width = typed(key, value, int_scalar)?,
            "depth" => caps.depth = typed(key, value, int_scalar)?,
            "endianness" => caps.endianness = typed(key, value, endianness_scalar)?,
            "signed" => caps.signed = typed(key, value, bool_scalar)?,
            "channel-positions" => caps.channel_positions = Some(layout_constraint(value)?),
            other => tracing::trace!(field = other, "ignoring unknown caps field"),
        }
    }

    Ok(caps)
}

fn typed<T: CapsScalar>(
    key: &str,
    raw: &RawValue,
    scalar: impl Fn(&RawValue) -> Option<T>,
) -> Result<CapsValue<T>> {
    let bad = || Error::Parse(format!("invalid value for {key}: {raw:?}"));
    match raw {
        RawValue::Range(lo, hi) => {
            let (lo, hi) = (scalar(lo).ok_or_else(bad)?, scalar(hi).ok_or_else(bad)?);
            if lo > hi {
                return Err(bad());
            }
            Ok(CapsValue::range(lo, hi))
        }
        RawValue::List(items) => {
            let values = items
                .iter()
                .map(|item| scalar(item).ok_or_else(bad))
                .collect::<Result<Vec<T>>>()?;
            Ok(CapsValue::from_values(values))
        }
        RawValue::Array(_) => Err(bad()),
        single => scalar(single).map(CapsValue::Fixed).ok_or_else(bad),
    }
}

fn int_scalar(raw: &RawValue) -> Option<i32> {
    match raw {
        RawValue::Int(v) => i32::try_from(*v).ok(),
        RawValue::Ident(s) if s == "MAX" => Some(i32::MAX),
        _ => None,
    }
}

fn endianness_scalar(raw: &RawValue) -> Option<Endianness> {
    match raw {
        RawValue::Int(v) => Endianness::from_value(i32::try_from(*v).ok()?),
        RawValue::Ident(s) => match s.as_str() {
            "LITTLE_ENDIAN" => Some(Endianness::Little),
            "BIG_ENDIAN" => Some(Endianness::Big),
            "BYTE_ORDER" => Some(Endianness::NATIVE),
            _ => None,
        },
        _ => None,
    }
}

fn bool_scalar(raw: &RawValue) -> Option<bool> {
    match raw {
        RawValue::Bool(b) => Some(*b),
        _ => None,
    }
}

fn layout_constraint(raw: &RawValue) -> Result<LayoutConstraint> {
    match raw {
        RawValue::Array(names) => {
            let positions = names
                .iter()
                .map(|n| n.parse::<ChannelPosition>().map_err(Error::Parse))
                .collect::<Result<Vec<_>>>()?;
            Ok(LayoutConstraint::Concrete(ChannelLayout::new(positions)))
        }
        RawValue::List(items) => Ok(LayoutConstraint::OneOf(
            items
                .iter()
                .map(layout_constraint)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => Err(Error::Parse(format!(
            "channel-positions must be an array or a list of arrays, got {other:?}"
        ))),
    }
}
