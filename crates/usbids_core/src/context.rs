//! Tracks which parent an indented line belongs to
//!
//! The registry nests by indentation and never interleaves its trees, so a
//! single cursor per tree is enough. Only one tree can be open at a time,
//! which [`Section`] encodes directly.

use crate::parser::Line;
use crate::parser::NestedLine;
use crate::schema::Record;

/// The currently open tree and the cursor within it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Nothing opened yet
    #[default]
    None,
    /// Vendor, product, interface tree
    Vendor {
        vendor_id: u16,
        product_id: Option<u16>,
    },
    /// Class, subclass, protocol tree
    Class {
        class_id: u8,
        subclass_id: Option<u8>,
    },
    /// HID usage page and its usages
    UsagePage { page_id: u8 },
    /// Language and its dialects
    Language { language_id: u16 },
}

/// Turns classified lines into records, given the lines before them
#[derive(Debug, Default)]
pub struct Tracker {
    section: Section,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently open section
    pub const fn section(&self) -> Section {
        self.section
    }

    /// Advance over one line
    ///
    /// Returns the record the line describes, or `None` if the line has no
    /// meaning in the current context (or carries no entity at all, like
    /// comments).
    pub fn advance<'input>(&mut self, line: Line<'input>) -> Option<Record<'input>> {
        match line {
            Line::Version(_) | Line::Date(_) | Line::Comment => None,
            Line::Entity(record) => Some(record),
            Line::UsagePage { page_id, name } => {
                self.section = Section::UsagePage { page_id };
                Some(Record::HidUsagePage { page_id, name })
            }
            Line::Class { class_id, name } => {
                self.section = Section::Class {
                    class_id,
                    subclass_id: None,
                };
                Some(Record::Class { class_id, name })
            }
            Line::Language { language_id, name } => {
                self.section = Section::Language { language_id };
                Some(Record::Language { language_id, name })
            }
            Line::Nested(nested) => self.nested(nested),
        }
    }

    fn nested<'input>(&mut self, line: NestedLine<'input>) -> Option<Record<'input>> {
        let NestedLine { depth, id, name } = line;
        // A vendor line is valid anywhere and closes whatever was open
        if depth == 0 {
            let vendor_id = id.word()?;
            self.section = Section::Vendor {
                vendor_id,
                product_id: None,
            };
            return Some(Record::Vendor { vendor_id, name });
        }
        match (&mut self.section, depth) {
            (Section::UsagePage { page_id }, 1) => Some(Record::HidUsage {
                page_id: *page_id,
                usage_id: id.value,
                name,
            }),
            (
                Section::Class {
                    class_id,
                    subclass_id,
                },
                1,
            ) => {
                let new_subclass = id.byte()?;
                *subclass_id = Some(new_subclass);
                Some(Record::Subclass {
                    class_id: *class_id,
                    subclass_id: new_subclass,
                    name,
                })
            }
            (
                Section::Class {
                    class_id,
                    subclass_id: Some(subclass_id),
                },
                2,
            ) => Some(Record::Protocol {
                class_id: *class_id,
                subclass_id: *subclass_id,
                protocol_id: id.byte()?,
                name,
            }),
            (
                Section::Vendor {
                    vendor_id,
                    product_id,
                },
                1,
            ) => {
                let new_product = id.word()?;
                *product_id = Some(new_product);
                Some(Record::Product {
                    vendor_id: *vendor_id,
                    product_id: new_product,
                    name,
                })
            }
            (
                Section::Vendor {
                    vendor_id,
                    product_id: Some(product_id),
                },
                2,
            ) => Some(Record::Interface {
                vendor_id: *vendor_id,
                product_id: *product_id,
                interface_id: id.at_least_byte()?,
                name,
            }),
            (Section::Language { language_id }, 1) => Some(Record::LanguageDialect {
                language_id: *language_id,
                dialect_id: id.byte()?,
                name,
            }),
            _ => None,
        }
    }
}
