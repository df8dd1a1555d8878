//! Static register descriptors.
//!
//! Descriptors are plain data loaded from JSON: which registers exist, their
//! reset values, how their bits are carved into fields, and which
//! consecutive registers form one multi-byte value.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::bitfield::BitRange;
use crate::error::{RegsError, Result};
use crate::multibyte::MAX_GROUP_BYTES;

/// Highest bit of a byte-wide register.
pub const REGISTER_MAX_BIT: u8 = 7;

/// One selectable value of an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: u32,
    pub label: String,
}

/// How a field's bits are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Single on/off bit.
    Boolean,
    /// Bit pattern mapped to a label set.
    Enum { options: Vec<EnumOption> },
    /// Unsigned magnitude.
    Int,
    /// Same as `Int`, displayed in hex.
    Hex,
}

/// A named bit range within one register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterField {
    pub name: String,
    #[serde(flatten)]
    pub bits: BitRange,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl RegisterField {
    /// Label of the option matching `value`, for enumerated fields.
    pub fn label_for(&self, value: u32) -> Option<&str> {
        match &self.kind {
            FieldKind::Enum { options } => options
                .iter()
                .find(|option| option.value == value)
                .map(|option| option.label.as_str()),
            _ => None,
        }
    }
}

/// One addressable byte register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Register {
    #[serde(deserialize_with = "de_byte")]
    pub address: u8,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "de_byte")]
    pub reset_value: u8,
    #[serde(default)]
    pub fields: Vec<RegisterField>,
}

impl Register {
    pub fn field(&self, name: &str) -> Option<&RegisterField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Consecutive registers read as one little-endian integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Least significant byte first.
    #[serde(deserialize_with = "de_byte_list")]
    pub addresses: Vec<u8>,
    /// Fields over the combined value; bit 0 is bit 0 of the first register.
    #[serde(default)]
    pub fields: Vec<RegisterField>,
}

impl RegisterGroup {
    pub fn field(&self, name: &str) -> Option<&RegisterField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Highest bit index of the combined value.
    pub fn max_bit(&self) -> u8 {
        let bits = self.addresses.len().saturating_mul(8).clamp(1, 32);
        (bits - 1) as u8
    }
}

/// A full descriptor document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorSet {
    #[serde(default)]
    pub registers: Vec<Register>,
    #[serde(default)]
    pub groups: Vec<RegisterGroup>,
}

impl DescriptorSet {
    /// Parse and validate a JSON descriptor document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let set: DescriptorSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// Check structural consistency.
    ///
    /// Register fields must fit in one byte and group fields in the group's
    /// combined width. Addresses must be unique, and groups must name known
    /// registers and fit in 32 bits.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for register in &self.registers {
            if !seen.insert(register.address) {
                return Err(RegsError::DuplicateRegister(register.address));
            }
            check_fields(&register.fields, REGISTER_MAX_BIT)?;
        }

        for group in &self.groups {
            if group.addresses.is_empty() {
                return Err(RegsError::InvalidDescriptor(format!(
                    "group {:?} has no registers",
                    group.name
                )));
            }
            if group.addresses.len() > MAX_GROUP_BYTES {
                return Err(RegsError::GroupTooWide {
                    len: group.addresses.len(),
                    max: MAX_GROUP_BYTES,
                });
            }
            if let Some(missing) = group.addresses.iter().find(|addr| !seen.contains(*addr)) {
                return Err(RegsError::InvalidDescriptor(format!(
                    "group {:?} references unknown register 0x{missing:02X}",
                    group.name
                )));
            }
            check_fields(&group.fields, group.max_bit())?;
        }
        Ok(())
    }
}

fn check_fields(fields: &[RegisterField], max: u8) -> Result<()> {
    for field in fields {
        let (start, end) = (field.bits.start(), field.bits.end());
        if start > end || end > max {
            return Err(RegsError::InvalidBitRange { start, end, max });
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ByteRepr {
    Number(u64),
    Text(String),
}

impl ByteRepr {
    fn into_byte<E: serde::de::Error>(self) -> std::result::Result<u8, E> {
        let value = match self {
            ByteRepr::Number(n) => n,
            ByteRepr::Text(text) => parse_number(&text)
                .ok_or_else(|| E::custom(format!("invalid number {text:?}")))?,
        };
        u8::try_from(value).map_err(|_| E::custom(format!("{value} does not fit in a byte")))
    }
}

/// Parse `0x..` hex or plain decimal.
pub fn parse_number(text: &str) -> Option<u64> {
    let text = text.trim();
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn de_byte<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u8, D::Error> {
    ByteRepr::deserialize(deserializer)?.into_byte()
}

fn de_byte_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<u8>, D::Error> {
    Vec::<ByteRepr>::deserialize(deserializer)?
        .into_iter()
        .map(ByteRepr::into_byte)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "registers": [
            {
                "address": "0x80",
                "name": "SD Mode Register 1",
                "reset_value": 16,
                "fields": [
                    {
                        "name": "SD Standard",
                        "bit_start": 5,
                        "bit_end": 7,
                        "type": "enum",
                        "options": [
                            { "value": 0, "label": "NTSC" },
                            { "value": 2, "label": "PAL M" }
                        ]
                    },
                    { "name": "Raw", "bit_start": 0, "bit_end": 1, "type": "hex" }
                ]
            },
            { "address": 129, "name": "Spare", "reset_value": "0x00" }
        ],
        "groups": [
            { "name": "Pair", "addresses": ["0x80", "0x81"] }
        ]
    }"#;

    #[test]
    fn parses_hex_strings_and_numbers() {
        let set = DescriptorSet::from_json_str(SAMPLE).unwrap();
        assert_eq!(set.registers.len(), 2);
        assert_eq!(set.registers[0].address, 0x80);
        assert_eq!(set.registers[0].reset_value, 0x10);
        assert_eq!(set.registers[1].address, 0x81);
        assert_eq!(set.groups[0].addresses, vec![0x80, 0x81]);
    }

    #[test]
    fn field_kinds_and_labels() {
        let set = DescriptorSet::from_json_str(SAMPLE).unwrap();
        let register = &set.registers[0];
        let standard = register.field("SD Standard").unwrap();
        assert_eq!(standard.bits, BitRange::new(5, 7).unwrap());
        assert_eq!(standard.label_for(2), Some("PAL M"));
        assert_eq!(standard.label_for(1), None);

        let raw = register.field("Raw").unwrap();
        assert_eq!(raw.kind, FieldKind::Hex);
        assert_eq!(raw.label_for(0), None);
        assert!(register.field("Missing").is_none());
    }

    #[test]
    fn rejects_duplicate_address() {
        let json = r#"{"registers": [
            {"address": 1, "name": "A", "reset_value": 0},
            {"address": "0x01", "name": "B", "reset_value": 0}
        ]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(json),
            Err(RegsError::DuplicateRegister(0x01))
        ));
    }

    #[test]
    fn rejects_field_past_bit_seven() {
        let json = r#"{"registers": [{"address": 1, "name": "A", "reset_value": 0,
            "fields": [{"name": "F", "bit_start": 4, "bit_end": 8, "type": "int"}]}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(json),
            Err(RegsError::InvalidBitRange { start: 4, end: 8, max: 7 })
        ));
    }

    #[test]
    fn rejects_reversed_field() {
        let json = r#"{"registers": [{"address": 1, "name": "A", "reset_value": 0,
            "fields": [{"name": "F", "bit_start": 3, "bit_end": 1, "type": "boolean"}]}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(json),
            Err(RegsError::InvalidBitRange { .. })
        ));
    }

    #[test]
    fn rejects_bad_groups() {
        let unknown = r#"{"registers": [{"address": 1, "name": "A", "reset_value": 0}],
            "groups": [{"name": "G", "addresses": [1, 2]}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(unknown),
            Err(RegsError::InvalidDescriptor(_))
        ));

        let wide = r#"{"registers": [
            {"address": 1, "name": "A", "reset_value": 0},
            {"address": 2, "name": "B", "reset_value": 0},
            {"address": 3, "name": "C", "reset_value": 0},
            {"address": 4, "name": "D", "reset_value": 0},
            {"address": 5, "name": "E", "reset_value": 0}
        ], "groups": [{"name": "G", "addresses": [1, 2, 3, 4, 5]}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(wide),
            Err(RegsError::GroupTooWide { len: 5, .. })
        ));
    }

    #[test]
    fn group_fields_are_kept() {
        let json = r#"{"registers": [
            {"address": "0x8C", "name": "F0", "reset_value": 0},
            {"address": "0x8D", "name": "F1", "reset_value": 0}
        ], "groups": [{"name": "Freq", "addresses": [140, 141],
            "fields": [{"name": "Frequency Value", "bit_start": 4, "bit_end": 11, "type": "int"}]}]}"#;
        let set = DescriptorSet::from_json_str(json).unwrap();
        let group = &set.groups[0];
        assert_eq!(group.max_bit(), 15);
        let field = group.field("Frequency Value").unwrap();
        assert_eq!(field.bits, BitRange::new(4, 11).unwrap());
        assert_eq!(field.kind, FieldKind::Int);

        let reparsed: DescriptorSet =
            serde_json::from_str(&serde_json::to_string(&set).unwrap()).unwrap();
        assert_eq!(reparsed, set);
    }

    #[test]
    fn rejects_group_field_past_group_width() {
        let json = r#"{"registers": [
            {"address": 1, "name": "A", "reset_value": 0},
            {"address": 2, "name": "B", "reset_value": 0}
        ], "groups": [{"name": "G", "addresses": [1, 2],
            "fields": [{"name": "F", "bit_start": 8, "bit_end": 16, "type": "int"}]}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(json),
            Err(RegsError::InvalidBitRange { start: 8, end: 16, max: 15 })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let register = r#"{"registers": [{"address": 1, "name": "A", "reset_value": 0, "width": 2}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(register),
            Err(RegsError::Parse(_))
        ));

        let group = r#"{"registers": [{"address": 1, "name": "A", "reset_value": 0}],
            "groups": [{"name": "G", "addresses": [1], "byteCount": 1}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(group),
            Err(RegsError::Parse(_))
        ));

        let top = r#"{"registers": [], "version": 2}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(top),
            Err(RegsError::Parse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_address() {
        let json = r#"{"registers": [{"address": "0x100", "name": "A", "reset_value": 0}]}"#;
        assert!(matches!(
            DescriptorSet::from_json_str(json),
            Err(RegsError::Parse(_))
        ));
    }

    #[test]
    fn parse_number_forms() {
        assert_eq!(parse_number("0x8C"), Some(0x8C));
        assert_eq!(parse_number("0X8c"), Some(0x8C));
        assert_eq!(parse_number("140"), Some(140));
        assert_eq!(parse_number(" 12 "), Some(12));
        assert_eq!(parse_number("0xZZ"), None);
    }
}
