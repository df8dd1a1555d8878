//! PLLSAI clock tree feeding the LCD-TFT controller.

use serde::Serialize;

use crate::error::{DeviceError, Result};

/// Output divider selected by the DIVR index.
pub const DIVR_LOOKUP: [u32; 4] = [2, 4, 8, 16];

/// Full clock snapshot: oscillator, PLL M, N, R, DIVR index.
pub const CLOCK_PAYLOAD_LEN: usize = 20;

/// Writable subset (and what shipped firmware reports): N, R, DIVR index.
pub const CLOCK_SETTINGS_LEN: usize = 12;

/// Divisor for a DIVR index, `None` outside the lookup.
pub fn divr_divisor(index: i32) -> Option<u32> {
    usize::try_from(index)
        .ok()
        .and_then(|index| DIVR_LOOKUP.get(index))
        .copied()
}

/// Oscillator and PLL input divider, shared by every PLL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PllSource {
    pub osc_source_hz: i32,
    pub pll_m: i32,
}

/// Clock snapshot as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockConfig {
    /// Absent when the device sent the short layout.
    pub source: Option<PllSource>,
    pub pll_sai_n: i32,
    pub pll_sai_r: i32,
    pub pll_sai_div_r: i32,
}

impl ClockConfig {
    /// Decode either the 20-byte or the 12-byte layout.
    pub fn from_payload(tag: u8, payload: &[u8]) -> Result<Self> {
        let word = |i: usize| {
            let at = i * 4;
            i32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]])
        };

        if payload.len() >= CLOCK_PAYLOAD_LEN {
            Ok(Self {
                source: Some(PllSource {
                    osc_source_hz: word(0),
                    pll_m: word(1),
                }),
                pll_sai_n: word(2),
                pll_sai_r: word(3),
                pll_sai_div_r: word(4),
            })
        } else if payload.len() == CLOCK_SETTINGS_LEN {
            Ok(Self {
                source: None,
                pll_sai_n: word(0),
                pll_sai_r: word(1),
                pll_sai_div_r: word(2),
            })
        } else {
            Err(DeviceError::malformed(
                tag,
                format!(
                    "clock snapshot needs {CLOCK_PAYLOAD_LEN} or {CLOCK_SETTINGS_LEN} bytes, got {}",
                    payload.len()
                ),
            ))
        }
    }

    /// Fill in the oscillator side, e.g. from user input when the device
    /// only reported the PLLSAI settings.
    pub fn with_source(mut self, source: PllSource) -> Self {
        self.source = Some(source);
        self
    }

    /// `(osc / 1e6 / M) * N / R / DIVR`, in MHz.
    ///
    /// Derived on demand; `None` when the source is unknown, a divisor is
    /// zero or the DIVR index is out of range.
    pub fn lcd_clock_mhz(&self) -> Option<f64> {
        let source = self.source?;
        if source.pll_m == 0 || self.pll_sai_r == 0 {
            return None;
        }
        let divr = divr_divisor(self.pll_sai_div_r)?;
        let vco_in = f64::from(source.osc_source_hz) / 1e6 / f64::from(source.pll_m);
        Some(vco_in * f64::from(self.pll_sai_n) / f64::from(self.pll_sai_r) / f64::from(divr))
    }

    pub fn settings(&self) -> ClockSettings {
        ClockSettings {
            pll_sai_n: self.pll_sai_n,
            pll_sai_r: self.pll_sai_r,
            pll_sai_div_r: self.pll_sai_div_r,
        }
    }
}

/// What `PUSH_CLOCK_CONFIG` can change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClockSettings {
    pub pll_sai_n: i32,
    pub pll_sai_r: i32,
    pub pll_sai_div_r: i32,
}

impl ClockSettings {
    pub fn to_payload(&self) -> [u8; CLOCK_SETTINGS_LEN] {
        let mut payload = [0u8; CLOCK_SETTINGS_LEN];
        let words = [self.pll_sai_n, self.pll_sai_r, self.pll_sai_div_r];
        for (bytes, word) in payload.chunks_exact_mut(4).zip(words) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        payload
    }
}
