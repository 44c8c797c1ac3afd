//! Relational schema and the closed set of entities written into it

/// Schema of the generated database
///
/// Parents are declared before their children. Every child references its
/// parent with `ON DELETE CASCADE`.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS meta (
  key   TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vendors (
  vid  INTEGER PRIMARY KEY,
  name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
  vid  INTEGER NOT NULL,
  pid  INTEGER NOT NULL,
  name TEXT NOT NULL,
  PRIMARY KEY (vid, pid),
  FOREIGN KEY (vid) REFERENCES vendors(vid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS interfaces (
  vid  INTEGER NOT NULL,
  pid  INTEGER NOT NULL,
  iid  INTEGER NOT NULL,
  name TEXT NOT NULL,
  PRIMARY KEY (vid, pid, iid),
  FOREIGN KEY (vid, pid) REFERENCES products(vid, pid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS usb_classes (
  class_id INTEGER PRIMARY KEY,
  name     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS usb_subclasses (
  class_id    INTEGER NOT NULL,
  subclass_id INTEGER NOT NULL,
  name        TEXT NOT NULL,
  PRIMARY KEY (class_id, subclass_id),
  FOREIGN KEY (class_id) REFERENCES usb_classes(class_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS usb_protocols (
  class_id    INTEGER NOT NULL,
  subclass_id INTEGER NOT NULL,
  protocol_id INTEGER NOT NULL,
  name        TEXT NOT NULL,
  PRIMARY KEY (class_id, subclass_id, protocol_id),
  FOREIGN KEY (class_id, subclass_id) REFERENCES usb_subclasses(class_id, subclass_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS audio_terminal_types (
  terminal_type INTEGER PRIMARY KEY,
  name          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hid_descriptor_types (
  descriptor_type INTEGER PRIMARY KEY,
  name            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hid_descriptor_item_types (
  item_type INTEGER PRIMARY KEY,
  name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS physical_bias_types (
  bias_type INTEGER PRIMARY KEY,
  name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS physical_descriptor_item_types (
  item_type INTEGER PRIMARY KEY,
  name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hid_usage_pages (
  page_id INTEGER PRIMARY KEY,
  name    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hid_usages (
  page_id  INTEGER NOT NULL,
  usage_id INTEGER NOT NULL,
  name     TEXT NOT NULL,
  PRIMARY KEY (page_id, usage_id),
  FOREIGN KEY (page_id) REFERENCES hid_usage_pages(page_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS languages (
  language_id INTEGER PRIMARY KEY,
  name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS language_dialects (
  language_id INTEGER NOT NULL,
  dialect_id  INTEGER NOT NULL,
  name        TEXT NOT NULL,
  PRIMARY KEY (language_id, dialect_id),
  FOREIGN KEY (language_id) REFERENCES languages(language_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS hid_country_codes (
  country_code INTEGER PRIMARY KEY,
  name         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS video_terminal_types (
  terminal_type INTEGER PRIMARY KEY,
  name          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_pid ON products(pid);
CREATE INDEX IF NOT EXISTS idx_products_vid ON products(vid);
CREATE INDEX IF NOT EXISTS idx_interfaces_iid ON interfaces(iid);
CREATE INDEX IF NOT EXISTS idx_hid_usages_usage ON hid_usages(usage_id);
";

/// Value stored under the `source_format` meta key
pub const SOURCE_FORMAT: &str = "usb.ids";

/// Tables that hold registry entities (everything except `meta`)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Vendors,
    Products,
    Interfaces,
    UsbClasses,
    UsbSubclasses,
    UsbProtocols,
    AudioTerminalTypes,
    HidDescriptorTypes,
    HidDescriptorItemTypes,
    PhysicalBiasTypes,
    PhysicalDescriptorItemTypes,
    HidUsagePages,
    HidUsages,
    Languages,
    LanguageDialects,
    HidCountryCodes,
    VideoTerminalTypes,
}

impl Table {
    /// Statement that inserts a row or renames the existing one
    ///
    /// Keys are bound first (in key column order), the name last.
    pub const fn upsert_sql(self) -> &'static str {
        match self {
            Self::Vendors => {
                "INSERT INTO vendors(vid, name) VALUES(?1, ?2) \
                 ON CONFLICT(vid) DO UPDATE SET name=excluded.name"
            }
            Self::Products => {
                "INSERT INTO products(vid, pid, name) VALUES(?1, ?2, ?3) \
                 ON CONFLICT(vid, pid) DO UPDATE SET name=excluded.name"
            }
            Self::Interfaces => {
                "INSERT INTO interfaces(vid, pid, iid, name) VALUES(?1, ?2, ?3, ?4) \
                 ON CONFLICT(vid, pid, iid) DO UPDATE SET name=excluded.name"
            }
            Self::UsbClasses => {
                "INSERT INTO usb_classes(class_id, name) VALUES(?1, ?2) \
                 ON CONFLICT(class_id) DO UPDATE SET name=excluded.name"
            }
            Self::UsbSubclasses => {
                "INSERT INTO usb_subclasses(class_id, subclass_id, name) VALUES(?1, ?2, ?3) \
                 ON CONFLICT(class_id, subclass_id) DO UPDATE SET name=excluded.name"
            }
            Self::UsbProtocols => {
                "INSERT INTO usb_protocols(class_id, subclass_id, protocol_id, name) \
                 VALUES(?1, ?2, ?3, ?4) \
                 ON CONFLICT(class_id, subclass_id, protocol_id) DO UPDATE SET name=excluded.name"
            }
            Self::AudioTerminalTypes => {
                "INSERT INTO audio_terminal_types(terminal_type, name) VALUES(?1, ?2) \
                 ON CONFLICT(terminal_type) DO UPDATE SET name=excluded.name"
            }
            Self::HidDescriptorTypes => {
                "INSERT INTO hid_descriptor_types(descriptor_type, name) VALUES(?1, ?2) \
                 ON CONFLICT(descriptor_type) DO UPDATE SET name=excluded.name"
            }
            Self::HidDescriptorItemTypes => {
                "INSERT INTO hid_descriptor_item_types(item_type, name) VALUES(?1, ?2) \
                 ON CONFLICT(item_type) DO UPDATE SET name=excluded.name"
            }
            Self::PhysicalBiasTypes => {
                "INSERT INTO physical_bias_types(bias_type, name) VALUES(?1, ?2) \
                 ON CONFLICT(bias_type) DO UPDATE SET name=excluded.name"
            }
            Self::PhysicalDescriptorItemTypes => {
                "INSERT INTO physical_descriptor_item_types(item_type, name) VALUES(?1, ?2) \
                 ON CONFLICT(item_type) DO UPDATE SET name=excluded.name"
            }
            Self::HidUsagePages => {
                "INSERT INTO hid_usage_pages(page_id, name) VALUES(?1, ?2) \
                 ON CONFLICT(page_id) DO UPDATE SET name=excluded.name"
            }
            Self::HidUsages => {
                "INSERT INTO hid_usages(page_id, usage_id, name) VALUES(?1, ?2, ?3) \
                 ON CONFLICT(page_id, usage_id) DO UPDATE SET name=excluded.name"
            }
            Self::Languages => {
                "INSERT INTO languages(language_id, name) VALUES(?1, ?2) \
                 ON CONFLICT(language_id) DO UPDATE SET name=excluded.name"
            }
            Self::LanguageDialects => {
                "INSERT INTO language_dialects(language_id, dialect_id, name) VALUES(?1, ?2, ?3) \
                 ON CONFLICT(language_id, dialect_id) DO UPDATE SET name=excluded.name"
            }
            Self::HidCountryCodes => {
                "INSERT INTO hid_country_codes(country_code, name) VALUES(?1, ?2) \
                 ON CONFLICT(country_code) DO UPDATE SET name=excluded.name"
            }
            Self::VideoTerminalTypes => {
                "INSERT INTO video_terminal_types(terminal_type, name) VALUES(?1, ?2) \
                 ON CONFLICT(terminal_type) DO UPDATE SET name=excluded.name"
            }
        }
    }
}

/// One registry entity, ready to be upserted
///
/// Names borrow from the registry text and are already trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'input> {
    Vendor {
        vendor_id: u16,
        name: &'input str,
    },
    Product {
        vendor_id: u16,
        product_id: u16,
        name: &'input str,
    },
    Interface {
        vendor_id: u16,
        product_id: u16,
        interface_id: u16,
        name: &'input str,
    },
    Class {
        class_id: u8,
        name: &'input str,
    },
    Subclass {
        class_id: u8,
        subclass_id: u8,
        name: &'input str,
    },
    Protocol {
        class_id: u8,
        subclass_id: u8,
        protocol_id: u8,
        name: &'input str,
    },
    AudioTerminalType {
        terminal_type: u16,
        name: &'input str,
    },
    HidDescriptorType {
        descriptor_type: u8,
        name: &'input str,
    },
    HidDescriptorItemType {
        item_type: u8,
        name: &'input str,
    },
    PhysicalBiasType {
        bias_type: u32,
        name: &'input str,
    },
    PhysicalDescriptorItemType {
        item_type: u8,
        name: &'input str,
    },
    HidUsagePage {
        page_id: u8,
        name: &'input str,
    },
    HidUsage {
        page_id: u8,
        usage_id: u16,
        name: &'input str,
    },
    Language {
        language_id: u16,
        name: &'input str,
    },
    LanguageDialect {
        language_id: u16,
        dialect_id: u8,
        name: &'input str,
    },
    HidCountryCode {
        country_code: u8,
        name: &'input str,
    },
    VideoTerminalType {
        terminal_type: u16,
        name: &'input str,
    },
}

/// Primary key of a record, outermost parent first
pub type Key = smallvec::SmallVec<[u32; 3]>;

impl<'input> Record<'input> {
    /// Table this record is stored in
    pub const fn table(&self) -> Table {
        match self {
            Self::Vendor { .. } => Table::Vendors,
            Self::Product { .. } => Table::Products,
            Self::Interface { .. } => Table::Interfaces,
            Self::Class { .. } => Table::UsbClasses,
            Self::Subclass { .. } => Table::UsbSubclasses,
            Self::Protocol { .. } => Table::UsbProtocols,
            Self::AudioTerminalType { .. } => Table::AudioTerminalTypes,
            Self::HidDescriptorType { .. } => Table::HidDescriptorTypes,
            Self::HidDescriptorItemType { .. } => Table::HidDescriptorItemTypes,
            Self::PhysicalBiasType { .. } => Table::PhysicalBiasTypes,
            Self::PhysicalDescriptorItemType { .. } => Table::PhysicalDescriptorItemTypes,
            Self::HidUsagePage { .. } => Table::HidUsagePages,
            Self::HidUsage { .. } => Table::HidUsages,
            Self::Language { .. } => Table::Languages,
            Self::LanguageDialect { .. } => Table::LanguageDialects,
            Self::HidCountryCode { .. } => Table::HidCountryCodes,
            Self::VideoTerminalType { .. } => Table::VideoTerminalTypes,
        }
    }

    /// Primary key values, in the column order of [`Table::upsert_sql`]
    pub fn key(&self) -> Key {
        match *self {
            Self::Vendor { vendor_id, .. } => smallvec::smallvec![vendor_id.into()],
            Self::Product {
                vendor_id,
                product_id,
                ..
            } => smallvec::smallvec![vendor_id.into(), product_id.into()],
            Self::Interface {
                vendor_id,
                product_id,
                interface_id,
                ..
            } => smallvec::smallvec![vendor_id.into(), product_id.into(), interface_id.into()],
            Self::Class { class_id, .. } => smallvec::smallvec![class_id.into()],
            Self::Subclass {
                class_id,
                subclass_id,
                ..
            } => smallvec::smallvec![class_id.into(), subclass_id.into()],
            Self::Protocol {
                class_id,
                subclass_id,
                protocol_id,
                ..
            } => smallvec::smallvec![class_id.into(), subclass_id.into(), protocol_id.into()],
            Self::AudioTerminalType { terminal_type, .. }
            | Self::VideoTerminalType { terminal_type, .. } => {
                smallvec::smallvec![terminal_type.into()]
            }
            Self::HidDescriptorType {
                descriptor_type, ..
            } => smallvec::smallvec![descriptor_type.into()],
            Self::HidDescriptorItemType { item_type, .. }
            | Self::PhysicalDescriptorItemType { item_type, .. } => {
                smallvec::smallvec![item_type.into()]
            }
            Self::PhysicalBiasType { bias_type, .. } => smallvec::smallvec![bias_type],
            Self::HidUsagePage { page_id, .. } => smallvec::smallvec![page_id.into()],
            Self::HidUsage {
                page_id, usage_id, ..
            } => smallvec::smallvec![page_id.into(), usage_id.into()],
            Self::Language { language_id, .. } => smallvec::smallvec![language_id.into()],
            Self::LanguageDialect {
                language_id,
                dialect_id,
                ..
            } => smallvec::smallvec![language_id.into(), dialect_id.into()],
            Self::HidCountryCode { country_code, .. } => smallvec::smallvec![country_code.into()],
        }
    }

    /// Human readable name of the entity
    pub const fn name(&self) -> &'input str {
        match *self {
            Self::Vendor { name, .. }
            | Self::Product { name, .. }
            | Self::Interface { name, .. }
            | Self::Class { name, .. }
            | Self::Subclass { name, .. }
            | Self::Protocol { name, .. }
            | Self::AudioTerminalType { name, .. }
            | Self::HidDescriptorType { name, .. }
            | Self::HidDescriptorItemType { name, .. }
            | Self::PhysicalBiasType { name, .. }
            | Self::PhysicalDescriptorItemType { name, .. }
            | Self::HidUsagePage { name, .. }
            | Self::HidUsage { name, .. }
            | Self::Language { name, .. }
            | Self::LanguageDialect { name, .. }
            | Self::HidCountryCode { name, .. }
            | Self::VideoTerminalType { name, .. } => name,
        }
    }
}
