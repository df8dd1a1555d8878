//! LCD-TFT controller timing.
//!
//! The controller is programmed with accumulated counter values; people think
//! in sync widths and porches. [`DisplayTiming`] and [`TimingConfig`] convert
//! between the two exactly.

use serde::Serialize;

use crate::error::{DeviceError, Result};

/// Wire size of a timing snapshot: 10 little-endian `i32`.
pub const TIMING_PAYLOAD_LEN: usize = 40;

const WORDS: usize = TIMING_PAYLOAD_LEN / 4;

/// Raw accumulated register values, in wire order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimingConfig {
    pub horizontal_sync: i32,
    pub vertical_sync: i32,
    pub accumulated_hbp: i32,
    pub accumulated_vbp: i32,
    pub accumulated_active_w: i32,
    pub accumulated_active_h: i32,
    pub total_width: i32,
    pub total_height: i32,
    pub image_width: i32,
    pub image_height: i32,
}

impl TimingConfig {
    /// Decode a timing snapshot. Bytes past the first 40 are ignored.
    pub fn from_payload(tag: u8, payload: &[u8]) -> Result<Self> {
        if payload.len() < TIMING_PAYLOAD_LEN {
            return Err(DeviceError::malformed(
                tag,
                format!(
                    "timing snapshot needs {TIMING_PAYLOAD_LEN} bytes, got {}",
                    payload.len()
                ),
            ));
        }

        let mut words = [0i32; WORDS];
        for (word, bytes) in words.iter_mut().zip(payload.chunks_exact(4)) {
            *word = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        Ok(Self {
            horizontal_sync: words[0],
            vertical_sync: words[1],
            accumulated_hbp: words[2],
            accumulated_vbp: words[3],
            accumulated_active_w: words[4],
            accumulated_active_h: words[5],
            total_width: words[6],
            total_height: words[7],
            image_width: words[8],
            image_height: words[9],
        })
    }

    /// Encode in wire order, as carried by `PUSH_TIMING_CONFIG`.
    pub fn to_payload(&self) -> [u8; TIMING_PAYLOAD_LEN] {
        let words = [
            self.horizontal_sync,
            self.vertical_sync,
            self.accumulated_hbp,
            self.accumulated_vbp,
            self.accumulated_active_w,
            self.accumulated_active_h,
            self.total_width,
            self.total_height,
            self.image_width,
            self.image_height,
        ];
        let mut payload = [0u8; TIMING_PAYLOAD_LEN];
        for (bytes, word) in payload.chunks_exact_mut(4).zip(words) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        payload
    }

    /// Recover the human-facing parameters.
    pub fn to_display_timing(&self) -> DisplayTiming {
        DisplayTiming {
            h_sync_width: self.horizontal_sync.wrapping_add(1),
            h_back_porch: self.accumulated_hbp.wrapping_sub(self.horizontal_sync),
            active_width: self.accumulated_active_w.wrapping_sub(self.accumulated_hbp),
            h_front_porch: self.total_width.wrapping_sub(self.accumulated_active_w),
            v_sync_height: self.vertical_sync.wrapping_add(1),
            v_back_porch: self.accumulated_vbp.wrapping_sub(self.vertical_sync),
            active_height: self.accumulated_active_h.wrapping_sub(self.accumulated_vbp),
            v_front_porch: self.total_height.wrapping_sub(self.accumulated_active_h),
        }
    }

    /// Frames per second at `pixel_clock_mhz`.
    ///
    /// `None` when the total area is not positive.
    pub fn frame_rate(&self, pixel_clock_mhz: f64) -> Option<f64> {
        let width = f64::from(self.total_width) + 1.0;
        let height = f64::from(self.total_height) + 1.0;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(pixel_clock_mhz * 1e6 / (width * height))
    }
}

/// Sync widths, porches and active area in pixels/lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayTiming {
    pub h_sync_width: i32,
    pub h_back_porch: i32,
    pub active_width: i32,
    pub h_front_porch: i32,
    pub v_sync_height: i32,
    pub v_back_porch: i32,
    pub active_height: i32,
    pub v_front_porch: i32,
}

impl DisplayTiming {
    /// Accumulate into controller register values.
    pub fn to_config(&self) -> TimingConfig {
        let horizontal_sync = self.h_sync_width.wrapping_sub(1);
        let vertical_sync = self.v_sync_height.wrapping_sub(1);
        let accumulated_hbp = self.h_back_porch.wrapping_add(horizontal_sync);
        let accumulated_vbp = self.v_back_porch.wrapping_add(vertical_sync);
        let accumulated_active_w = self.active_width.wrapping_add(accumulated_hbp);
        let accumulated_active_h = self.active_height.wrapping_add(accumulated_vbp);
        TimingConfig {
            horizontal_sync,
            vertical_sync,
            accumulated_hbp,
            accumulated_vbp,
            accumulated_active_w,
            accumulated_active_h,
            total_width: accumulated_active_w.wrapping_add(self.h_front_porch),
            total_height: accumulated_active_h.wrapping_add(self.v_front_porch),
            image_width: self.active_width,
            image_height: self.active_height,
        }
    }

    pub fn frame_rate(&self, pixel_clock_mhz: f64) -> Option<f64> {
        self.to_config().frame_rate(pixel_clock_mhz)
    }
}
