//! Content entries and their serialized form.
//!
//! The data file is a JSON array of `{ "type": ..., "content": ... }` records.
//! `type` is accepted either as a variant name or as its ordinal, since data
//! sheets exported by older tooling wrote the enum as a number.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Which renderer family displays an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Variant {
    Text,
    Image,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Text, Variant::Image];

    fn from_ordinal(n: u64) -> Option<Self> {
        match n {
            0 => Some(Variant::Text),
            1 => Some(Variant::Image),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("text") {
            Some(Variant::Text)
        } else if name.eq_ignore_ascii_case("image") {
            Some(Variant::Image)
        } else {
            None
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Text => f.write_str("Text"),
            Variant::Image => f.write_str("Image"),
        }
    }
}

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VariantVisitor;

        impl Visitor<'_> for VariantVisitor {
            type Value = Variant;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"Text\", \"Image\", 0 or 1")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Variant, E> {
                Variant::from_ordinal(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Variant, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(Variant::from_ordinal)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Variant, E> {
                Variant::from_name(v).ok_or_else(|| E::unknown_variant(v, &["Text", "Image"]))
            }
        }

        deserializer.deserialize_any(VariantVisitor)
    }
}

/// One content record to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub variant: Variant,
    #[serde(default)]
    pub content: String,
}

impl Entry {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            variant: Variant::Text,
            content: content.into(),
        }
    }

    pub fn image(content: impl Into<String>) -> Self {
        Self {
            variant: Variant::Image,
            content: content.into(),
        }
    }

    /// A Text entry is valid when it has something to show.
    /// Image entries are always considered valid; their content is not read.
    pub fn is_valid(&self) -> bool {
        match self.variant {
            Variant::Text => !self.content.is_empty(),
            Variant::Image => true,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.variant, self.content)
    }
}

/// Parse a JSON data sheet into entries.
pub fn parse_entries(json: &str) -> serde_json::Result<Vec<Entry>> {
    serde_json::from_str(json)
}
