/// Number of entries in a [`ColorLut`] table, spanning `[0, 1]` inclusive.
pub const LUT_SIZE: usize = 4096;

/// Transfer function applied when quantising linear float colour to 8 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transfer {
    /// Values are written as-is.
    Linear,
    /// IEC 61966-2-1 sRGB encoding.
    #[default]
    Srgb,
}

impl Transfer {
    /// Encode one linear value in `[0, 1]`.
    pub fn encode(self, v: f32) -> f32 {
        match self {
            Transfer::Linear => v,
            Transfer::Srgb => {
                if v <= 0.003_130_8 {
                    v * 12.92
                } else {
                    1.055 * v.powf(1.0 / 2.4) - 0.055
                }
            }
        }
    }
}

/// Precomputed float-to-byte table for one [`Transfer`].
///
/// Built once per writer and passed around explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorLut {
    transfer: Transfer,
    table: Vec<u8>,
}

impl ColorLut {
    /// Build the table for `transfer`.
    pub fn new(transfer: Transfer) -> Self {
        let last = (LUT_SIZE - 1) as f32;
        let table = (0..LUT_SIZE)
            .map(|i| quantize(transfer.encode(i as f32 / last)))
            .collect();
        Self { transfer, table }
    }

    /// Identity transfer.
    pub fn linear() -> Self {
        Self::new(Transfer::Linear)
    }

    /// sRGB transfer.
    pub fn srgb() -> Self {
        Self::new(Transfer::Srgb)
    }

    /// Transfer this table encodes.
    pub fn transfer(&self) -> Transfer {
        self.transfer
    }

    /// Convert one linear sample. Values outside `[0, 1]` (and NaN) are clamped first.
    pub fn to_byte(&self, v: f32) -> u8 {
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let idx = (v * (LUT_SIZE - 1) as f32).round() as usize;
        self.table[idx.min(LUT_SIZE - 1)]
    }
}

impl Default for ColorLut {
    fn default() -> Self {
        Self::new(Transfer::default())
    }
}

/// Linear `[0, 1]` to byte without a transfer, used for alpha.
pub fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/export/lut.rs"]
mod tests;
