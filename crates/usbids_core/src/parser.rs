//! Line classifier for `usb.ids`
//!
//! Each line is classified on its own, without looking at what came before.
//! Giving nested lines their meaning is the job of [`crate::context`].

use crate::schema::Record;
use winnow::ModalResult;
use winnow::Parser;
use winnow::ascii::digit1;
use winnow::ascii::space0;
use winnow::ascii::space1;
use winnow::combinator::alt;
use winnow::combinator::trace;
use winnow::error::ContextError;
use winnow::error::ErrMode;
use winnow::error::StrContext;
use winnow::token::rest;
use winnow::token::take_while;

/// Syntactic category of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'input> {
    /// `# Version: ...`
    Version(&'input str),
    /// `# Date: ...`
    Date(&'input str),
    /// Any other comment
    Comment,
    /// A tagged line that maps to exactly one entity (`AT`, `HID`, `R`, ...)
    Entity(Record<'input>),
    /// `HUT <page> <name>`
    UsagePage { page_id: u8, name: &'input str },
    /// `C <class> <name>`
    Class { class_id: u8, name: &'input str },
    /// `L <language> <name>`
    Language { language_id: u16, name: &'input str },
    /// An untagged `<hex id> <name>` line at some indentation depth
    Nested(NestedLine<'input>),
}

/// Untagged line: vendor, product, interface, subclass, protocol, usage or
/// dialect depending on context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedLine<'input> {
    pub depth: usize,
    pub id: HexId,
    pub name: &'input str,
}

/// A hexadecimal identifier of 1 to 4 digits
///
/// The digit count is kept since it tells a vendor (`1d6b`) from something
/// that only looks like one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexId {
    pub value: u16,
    pub digits: usize,
}

impl HexId {
    /// Value, if written with exactly four digits
    pub const fn word(self) -> Option<u16> {
        if self.digits == 4 {
            Some(self.value)
        } else {
            None
        }
    }

    /// Value, if written with exactly two digits
    pub const fn byte(self) -> Option<u8> {
        if self.digits == 2 {
            Some(self.value as u8)
        } else {
            None
        }
    }

    /// Value, if written with at least two digits
    pub const fn at_least_byte(self) -> Option<u16> {
        if self.digits >= 2 {
            Some(self.value)
        } else {
            None
        }
    }
}

/// Split a raw line into its tab depth and the remaining text
pub fn split_indent(line: &str) -> (usize, &str) {
    let rest = line.trim_start_matches('\t');
    (line.len() - rest.len(), rest)
}

/// Classify one line (with leading tabs already removed)
///
/// Returns `None` for lines that match no known shape. Those are skipped by
/// the caller, newer registries add tags from time to time.
pub fn classify(depth: usize, text: &str) -> Option<Line<'_>> {
    if depth > 0 {
        return nested(depth).parse(text).ok();
    }
    let alternatives = (
        comment.context(StrContext::Label("comment")),
        entity
            .map(Line::Entity)
            .context(StrContext::Label("entity")),
        header.context(StrContext::Label("header")),
        nested(0).context(StrContext::Label("vendor")),
    );
    alt(alternatives).parse(text).ok()
}

/// Comments, including the two that carry metadata
fn comment<'input>(i: &mut &'input str) -> ModalResult<Line<'input>> {
    let parser = alt((
        meta("Version:").map(Line::Version),
        meta("Date:").map(Line::Date),
        ('#', rest).value(Line::Comment),
    ));
    trace("comment", parser).parse_next(i)
}

fn meta<'input>(
    key: &'static str,
) -> impl Parser<&'input str, &'input str, ErrMode<ContextError>> {
    ('#', space0, key, space0, name).map(|(_, _, _, _, value)| value)
}

/// Context independent single entity lines
fn entity<'input>(i: &mut &'input str) -> ModalResult<Record<'input>> {
    let parser = alt((
        tagged("AT", hex4).map(|(terminal_type, name)| Record::AudioTerminalType {
            terminal_type,
            name,
        }),
        tagged("HID", hex2).map(|(descriptor_type, name)| Record::HidDescriptorType {
            descriptor_type,
            name,
        }),
        tagged("R", hex2)
            .map(|(item_type, name)| Record::HidDescriptorItemType { item_type, name }),
        tagged("BIAS", decimal).map(|(bias_type, name)| Record::PhysicalBiasType {
            bias_type,
            name,
        }),
        tagged("PHY", hex2)
            .map(|(item_type, name)| Record::PhysicalDescriptorItemType { item_type, name }),
        tagged("HCC", hex2)
            .map(|(country_code, name)| Record::HidCountryCode { country_code, name }),
        tagged("VT", hex4).map(|(terminal_type, name)| Record::VideoTerminalType {
            terminal_type,
            name,
        }),
    ));
    trace("entity", parser).parse_next(i)
}

/// Lines that open a section
fn header<'input>(i: &mut &'input str) -> ModalResult<Line<'input>> {
    let parser = alt((
        tagged("HUT", hex2).map(|(page_id, name)| Line::UsagePage { page_id, name }),
        tagged("C", hex2).map(|(class_id, name)| Line::Class { class_id, name }),
        tagged("L", hex4).map(|(language_id, name)| Line::Language { language_id, name }),
    ));
    trace("header", parser).parse_next(i)
}

/// `<tag> <code> <name>`
fn tagged<'input, O>(
    tag: &'static str,
    code: impl Parser<&'input str, O, ErrMode<ContextError>>,
) -> impl Parser<&'input str, (O, &'input str), ErrMode<ContextError>> {
    (tag, space1, code, space1, name).map(|(_, _, code, _, name)| (code, name))
}

fn nested<'input>(
    depth: usize,
) -> impl Parser<&'input str, Line<'input>, ErrMode<ContextError>> {
    let parser = (hex_id, space1, name)
        .map(move |(id, _, name)| Line::Nested(NestedLine { depth, id, name }));
    trace("nested", parser)
}

/// The remainder of the line, trimmed, must not be empty
fn name<'input>(i: &mut &'input str) -> ModalResult<&'input str> {
    let parser = rest.map(str::trim).verify(|s: &str| !s.is_empty());
    trace("name", parser).parse_next(i)
}

fn hex_id(i: &mut &str) -> ModalResult<HexId> {
    trace("hex_id", take_while(1..=4, is_hex))
        .try_map(|s: &str| {
            u16::from_str_radix(s, 16).map(|value| HexId {
                value,
                digits: s.len(),
            })
        })
        .parse_next(i)
}

fn hex2(i: &mut &str) -> ModalResult<u8> {
    trace("hex2", take_while(2, is_hex))
        .try_map(|s| u8::from_str_radix(s, 16))
        .parse_next(i)
}

fn hex4(i: &mut &str) -> ModalResult<u16> {
    trace("hex4", take_while(4, is_hex))
        .try_map(|s| u16::from_str_radix(s, 16))
        .parse_next(i)
}

fn decimal(i: &mut &str) -> ModalResult<u32> {
    trace("decimal", digit1)
        .try_map(str::parse::<u32>)
        .parse_next(i)
}

const fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}
