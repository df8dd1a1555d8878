use std::collections::BTreeSet;
use std::path::Path;

use panelcfg_device::{interpret, Message};
use panelcfg_frame::FrameDecoder;
use panelcfg_regs::{format_hex, RegisterMap, RegistryConfig};
use serde::Serialize;
use tracing::{debug, info};

use crate::cmd::capture::read_capture;
use crate::cmd::RegsArgs;
use crate::exit::{device_error, regs_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_listing, OutputFormat};

#[derive(Debug, Serialize)]
struct RegisterRow {
    address: u8,
    name: String,
    value: u8,
    reset: Option<u8>,
    modified: bool,
    fields: Vec<FieldRow>,
}

#[derive(Debug, Serialize)]
struct FieldRow {
    name: String,
    value: u32,
    label: Option<String>,
}

#[derive(Debug, Serialize)]
struct GroupRow {
    name: String,
    addresses: Vec<u8>,
    value: u32,
    reset: u32,
    modified: bool,
    fields: Vec<FieldRow>,
}

#[derive(Debug, Serialize)]
struct RegsReport {
    registers: Vec<RegisterRow>,
    groups: Vec<GroupRow>,
    changed: BTreeSet<u8>,
}

pub fn run(args: RegsArgs, format: OutputFormat) -> CliResult<i32> {
    let config = RegistryConfig {
        strict_mode: args.strict,
        ..RegistryConfig::default()
    };
    let mut map = match &args.descriptors {
        Some(path) => RegisterMap::from_file_with_config(path, config),
        None => RegisterMap::adv7393_with_config(config),
    }
    .map_err(|err| regs_error("failed loading descriptors", err))?;

    let changed = match &args.snapshot {
        Some(path) => apply_snapshot_capture(&mut map, path)?,
        None => BTreeSet::new(),
    };

    if args.export_c {
        println!("{}", map.export_c_source());
        return Ok(SUCCESS);
    }

    let report = build_report(&map, changed)?;
    let rows = table_rows(&report);
    print_listing(
        &report,
        vec!["ADDRESS", "NAME", "VALUE", "RESET", "FIELDS"],
        rows,
        format,
    );
    Ok(SUCCESS)
}

/// Apply every `ENCODER_CONFIG` reply in the capture, in order.
fn apply_snapshot_capture(map: &mut RegisterMap, path: &Path) -> CliResult<BTreeSet<u8>> {
    let capture = read_capture(Some(path), false)?;
    let mut decoder = FrameDecoder::new();
    let mut changed = BTreeSet::new();
    let mut applied = 0usize;

    for frame in decoder.feed(&capture) {
        match interpret(&frame) {
            Ok(Message::EncoderConfig(snapshot)) => {
                let delta = snapshot
                    .apply_to(map)
                    .map_err(|err| device_error("failed applying snapshot", err))?;
                changed.extend(delta);
                applied = applied.saturating_add(1);
            }
            Ok(other) => debug!(message = other.name(), "skipping non-snapshot message"),
            Err(err) => debug!(tag = frame.tag, error = %err, "skipping frame"),
        }
    }

    if applied == 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} holds no ENCODER_CONFIG frame", path.display()),
        ));
    }
    info!(snapshots = applied, changed = changed.len(), "snapshot applied");
    Ok(changed)
}

fn build_report(map: &RegisterMap, changed: BTreeSet<u8>) -> CliResult<RegsReport> {
    let mut registers = Vec::new();
    for (&address, &value) in map.values() {
        let row = match map.register(address) {
            Some(register) => {
                let mut fields = Vec::with_capacity(register.fields.len());
                for field in &register.fields {
                    let field_value = map
                        .field_value(address, &field.name)
                        .map_err(|err| regs_error("failed reading field", err))?;
                    fields.push(FieldRow {
                        name: field.name.clone(),
                        value: field_value,
                        label: field.label_for(field_value).map(str::to_string),
                    });
                }
                RegisterRow {
                    address,
                    name: register.name.clone(),
                    value,
                    reset: Some(register.reset_value),
                    modified: value != register.reset_value,
                    fields,
                }
            }
            None => RegisterRow {
                address,
                name: "(undescribed)".to_string(),
                value,
                reset: None,
                modified: true,
                fields: Vec::new(),
            },
        };
        registers.push(row);
    }

    let mut groups = Vec::with_capacity(map.groups().len());
    for group in map.groups() {
        let value = map
            .group_value(&group.name)
            .map_err(|err| regs_error("failed reading group", err))?;
        let reset = map
            .group_reset_value(&group.name)
            .map_err(|err| regs_error("failed reading group", err))?;
        let mut fields = Vec::with_capacity(group.fields.len());
        for field in &group.fields {
            let field_value = map
                .group_field_value(&group.name, &field.name)
                .map_err(|err| regs_error("failed reading group field", err))?;
            fields.push(FieldRow {
                name: field.name.clone(),
                value: field_value,
                label: field.label_for(field_value).map(str::to_string),
            });
        }
        groups.push(GroupRow {
            name: group.name.clone(),
            addresses: group.addresses.clone(),
            value,
            reset,
            modified: value != reset,
            fields,
        });
    }

    Ok(RegsReport {
        registers,
        groups,
        changed,
    })
}

fn table_rows(report: &RegsReport) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(report.registers.len() + report.groups.len());
    for register in &report.registers {
        let marker = if report.changed.contains(&register.address) {
            "*"
        } else {
            ""
        };
        rows.push(vec![
            format!("0x{:02X}", register.address),
            register.name.clone(),
            format!("{}{marker}", format_hex(register.value.into(), 1)),
            register
                .reset
                .map(|reset| format_hex(reset.into(), 1))
                .unwrap_or_else(|| "-".to_string()),
            field_summary(&register.fields),
        ]);
    }

    for group in &report.groups {
        let width = group.addresses.len();
        let span = match (group.addresses.first(), group.addresses.last()) {
            (Some(first), Some(last)) => format!("0x{first:02X}..0x{last:02X}"),
            _ => "-".to_string(),
        };
        rows.push(vec![
            span,
            group.name.clone(),
            format_hex(group.value, width),
            format_hex(group.reset, width),
            field_summary(&group.fields),
        ]);
    }
    rows
}

fn field_summary(fields: &[FieldRow]) -> String {
    fields
        .iter()
        .map(|field| match &field.label {
            Some(label) => format!("{}={}", field.name, label),
            None => format!("{}={}", field.name, field.value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
