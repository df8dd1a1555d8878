use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::bitfield::format_hex;
use crate::config::RegistryConfig;
use crate::descriptor::{DescriptorSet, Register, RegisterField, RegisterGroup};
use crate::error::{RegsError, Result};
use crate::multibyte::{combine, split};

const ADV7393_DESCRIPTORS: &str = include_str!("../data/adv7393.json");

/// Marker line wrapped around the exported register listing.
pub const EXPORT_MARKER: &str = "/* Auto-generated configuration */";

/// Register descriptors plus the current value of every register.
///
/// Values start at each register's reset value. Snapshots from the device
/// overwrite them; edits go through the field and group accessors so bits
/// outside a field are never disturbed.
#[derive(Debug, Clone)]
pub struct RegisterMap {
    registers: BTreeMap<u8, Register>,
    groups: Vec<RegisterGroup>,
    values: BTreeMap<u8, u8>,
    config: RegistryConfig,
}

impl RegisterMap {
    /// Build a map from a validated descriptor set.
    pub fn new(descriptors: DescriptorSet) -> Result<Self> {
        Self::with_config(descriptors, RegistryConfig::default())
    }

    /// Build a map with explicit config.
    pub fn with_config(descriptors: DescriptorSet, config: RegistryConfig) -> Result<Self> {
        descriptors.validate()?;

        let values = descriptors
            .registers
            .iter()
            .map(|register| (register.address, register.reset_value))
            .collect();
        let registers = descriptors
            .registers
            .into_iter()
            .map(|register| (register.address, register))
            .collect();

        Ok(Self {
            registers,
            groups: descriptors.groups,
            values,
            config,
        })
    }

    /// The built-in ADV7393 video encoder table.
    pub fn adv7393() -> Result<Self> {
        Self::adv7393_with_config(RegistryConfig::default())
    }

    pub fn adv7393_with_config(config: RegistryConfig) -> Result<Self> {
        Self::with_config(DescriptorSet::from_json_str(ADV7393_DESCRIPTORS)?, config)
    }

    /// Load descriptors from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(DescriptorSet::from_json_str(json)?)
    }

    /// Load descriptors from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, RegistryConfig::default())
    }

    /// Load descriptors from a JSON file with explicit config.
    pub fn from_file_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| RegsError::LoadFailed(format!("{}: {err}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|err| RegsError::LoadFailed(err.to_string()))?;
        if !metadata.is_file() {
            return Err(RegsError::LoadFailed(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let max_bytes = config.max_descriptor_file_size;
        if metadata.len() > max_bytes as u64 {
            return Err(RegsError::LoadFailed(format!(
                "descriptor file too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                RegsError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > max_bytes {
            return Err(RegsError::LoadFailed(format!(
                "descriptor file too large while reading: {}",
                path.display()
            )));
        }

        Self::with_config(DescriptorSet::from_json_str(&content)?, config)
    }

    pub fn register(&self, address: u8) -> Option<&Register> {
        self.registers.get(&address)
    }

    /// Descriptors in address order.
    pub fn registers(&self) -> impl Iterator<Item = &Register> {
        self.registers.values()
    }

    pub fn groups(&self) -> &[RegisterGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&RegisterGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Current value of a register, including addresses learned from snapshots.
    pub fn value(&self, address: u8) -> Option<u8> {
        self.values.get(&address).copied()
    }

    pub fn set_value(&mut self, address: u8, value: u8) -> Result<()> {
        let slot = self
            .values
            .get_mut(&address)
            .ok_or(RegsError::UnknownRegister(address))?;
        *slot = value;
        Ok(())
    }

    /// Current value of a named field.
    pub fn field_value(&self, address: u8, field: &str) -> Result<u32> {
        let (descriptor, value) = self.field_and_value(address, field)?;
        Ok(descriptor.bits.extract(u32::from(value)))
    }

    /// Rewrite one field, leaving the register's other bits alone.
    pub fn set_field_value(&mut self, address: u8, field: &str, value: u32) -> Result<()> {
        let (descriptor, current) = self.field_and_value(address, field)?;
        let updated = descriptor.bits.insert(u32::from(current), value) & 0xFF;
        self.set_value(address, updated as u8)
    }

    /// True when a field differs from the same field of the reset value.
    pub fn is_field_modified(&self, address: u8, field: &str) -> Result<bool> {
        let (descriptor, value) = self.field_and_value(address, field)?;
        let reset = self.descriptor(address)?.reset_value;
        Ok(descriptor
            .bits
            .is_modified(u32::from(value), u32::from(reset)))
    }

    /// Combined little-endian value of a register group.
    pub fn group_value(&self, name: &str) -> Result<u32> {
        let group = self.group_or_err(name)?;
        let bytes = group
            .addresses
            .iter()
            .map(|addr| self.value(*addr).ok_or(RegsError::UnknownRegister(*addr)))
            .collect::<Result<Vec<u8>>>()?;
        combine(&bytes)
    }

    /// Split `value` across the group's registers.
    pub fn set_group_value(&mut self, name: &str, value: u32) -> Result<()> {
        let addresses = self.group_or_err(name)?.addresses.clone();
        let bytes = split(value, addresses.len())?;
        for (address, byte) in addresses.into_iter().zip(bytes) {
            self.set_value(address, byte)?;
        }
        Ok(())
    }

    /// Combined reset value of a register group.
    pub fn group_reset_value(&self, name: &str) -> Result<u32> {
        let group = self.group_or_err(name)?;
        let bytes = group
            .addresses
            .iter()
            .map(|addr| self.descriptor(*addr).map(|register| register.reset_value))
            .collect::<Result<Vec<u8>>>()?;
        combine(&bytes)
    }

    pub fn is_group_modified(&self, name: &str) -> Result<bool> {
        Ok(self.group_value(name)? != self.group_reset_value(name)?)
    }

    /// Current value of a field laid over a group's combined value.
    pub fn group_field_value(&self, group: &str, field: &str) -> Result<u32> {
        let bits = self.group_field(group, field)?.bits;
        Ok(bits.extract(self.group_value(group)?))
    }

    /// Rewrite one group field; bits outside it keep their current value.
    pub fn set_group_field_value(&mut self, group: &str, field: &str, value: u32) -> Result<()> {
        let bits = self.group_field(group, field)?.bits;
        let updated = bits.insert(self.group_value(group)?, value);
        self.set_group_value(group, updated)
    }

    pub fn is_group_field_modified(&self, group: &str, field: &str) -> Result<bool> {
        let bits = self.group_field(group, field)?.bits;
        Ok(bits.is_modified(self.group_value(group)?, self.group_reset_value(group)?))
    }

    pub fn reset_register(&mut self, address: u8) -> Result<()> {
        let reset = self.descriptor(address)?.reset_value;
        self.set_value(address, reset)
    }

    /// Restore every described register and forget addresses learned from
    /// snapshots.
    pub fn reset_all(&mut self) {
        self.values = self
            .registers
            .values()
            .map(|register| (register.address, register.reset_value))
            .collect();
    }

    /// Described registers whose value differs from reset, in address order.
    pub fn dirty_registers(&self) -> Vec<u8> {
        self.registers
            .values()
            .filter(|register| self.value(register.address) != Some(register.reset_value))
            .map(|register| register.address)
            .collect()
    }

    /// Merge a device snapshot and return the addresses whose value changed.
    ///
    /// The returned set is the change-set relative to the previous state.
    pub fn apply_snapshot(&mut self, snapshot: &BTreeMap<u8, u8>) -> Result<BTreeSet<u8>> {
        if self.config.strict_mode {
            if let Some(unknown) = snapshot
                .keys()
                .find(|addr| !self.registers.contains_key(*addr))
            {
                return Err(RegsError::UnknownRegister(*unknown));
            }
        }

        let mut changed = BTreeSet::new();
        for (&address, &value) in snapshot {
            if !self.registers.contains_key(&address) {
                debug!(address, value, "snapshot carries undescribed register");
            }
            let previous = self.values.insert(address, value);
            if previous != Some(value) {
                changed.insert(address);
            }
        }
        Ok(changed)
    }

    /// All current values in address order.
    pub fn values(&self) -> &BTreeMap<u8, u8> {
        &self.values
    }

    /// Every address with a current value, in order.
    pub fn addresses(&self) -> Vec<u8> {
        self.values.keys().copied().collect()
    }

    /// The "copy config" listing: one `ADV7393_writeReg` call per register,
    /// wrapped in marker comments.
    pub fn export_c_source(&self) -> String {
        let mut lines = Vec::with_capacity(self.values.len() + 2);
        lines.push(EXPORT_MARKER.to_string());
        for (address, value) in &self.values {
            lines.push(format!("ADV7393_writeReg({address:#04x}, {value:#04x});"));
        }
        lines.push(EXPORT_MARKER.to_string());
        lines.join("\n")
    }

    /// Hex rendering of a register value, `0x12`.
    pub fn format_value(&self, address: u8) -> Option<String> {
        self.value(address).map(|value| format_hex(value.into(), 1))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn descriptor(&self, address: u8) -> Result<&Register> {
        self.registers
            .get(&address)
            .ok_or(RegsError::UnknownRegister(address))
    }

    fn group_or_err(&self, name: &str) -> Result<&RegisterGroup> {
        self.group(name)
            .ok_or_else(|| RegsError::UnknownGroup(name.to_string()))
    }

    fn group_field(&self, group: &str, field: &str) -> Result<&RegisterField> {
        self.group_or_err(group)?
            .field(field)
            .ok_or_else(|| RegsError::UnknownGroupField {
                group: group.to_string(),
                field: field.to_string(),
            })
    }

    fn field_and_value(&self, address: u8, field: &str) -> Result<(&RegisterField, u8)> {
        let register = self.descriptor(address)?;
        let descriptor = register
            .field(field)
            .ok_or_else(|| RegsError::UnknownField {
                address,
                field: field.to_string(),
            })?;
        let value = self
            .value(address)
            .ok_or(RegsError::UnknownRegister(address))?;
        Ok((descriptor, value))
    }
}
