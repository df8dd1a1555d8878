//! Loading captured link traffic: hex dumps or raw bytes.

use std::io::Read;
use std::path::Path;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};

/// Read a capture from `path`, or stdin when `None`.
///
/// Text made only of hex digit pairs, whitespace, `,`/`:` separators and
/// optional `0x` prefixes is decoded as hex unless `binary` is set.
pub fn read_capture(path: Option<&Path>, binary: bool) -> CliResult<Vec<u8>> {
    let raw = match path {
        Some(path) => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };

    if binary || !looks_like_hex(&raw) {
        return Ok(raw);
    }
    let text = String::from_utf8_lossy(&raw);
    parse_hex(&text).map_err(|reason| CliError::new(DATA_INVALID, reason))
}

fn looks_like_hex(raw: &[u8]) -> bool {
    raw.iter().any(u8::is_ascii_hexdigit)
        && raw.iter().all(|byte| {
            byte.is_ascii_hexdigit()
                || byte.is_ascii_whitespace()
                || matches!(byte, b',' | b':' | b'x' | b'X')
        })
}

/// Decode a hex dump like `f3 04 80 10` or `0xF3,0x04`.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    for token in text.split(|c: char| c.is_ascii_whitespace() || c == ',' || c == ':') {
        if token.is_empty() {
            continue;
        }
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let decoded = hex::decode(digits).map_err(|err| format!("bad hex {token:?}: {err}"))?;
        bytes.extend_from_slice(&decoded);
    }
    Ok(bytes)
}
