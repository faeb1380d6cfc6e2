//! Overlay color handling
//!
//! The overlay color is stored in BGR channel order. The wire protocol
//! accepts RGB triplets and echoes them back BGR-reordered, so conversions
//! live here rather than in the HTTP layer.

use serde::{Deserialize, Serialize};

/// Overlay color in BGR channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    /// Default overlay color: green.
    pub const GREEN: Color = Color { b: 0, g: 255, r: 0 };

    /// Build from an RGB triplet as received on the wire.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            b: rgb[2],
            g: rgb[1],
            r: rgb[0],
        }
    }

    /// BGR array form, as echoed back to the client.
    pub fn to_bgr_array(&self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }

    /// RGB channel array for drawing into RGB pixel buffers.
    pub fn to_rgb_array(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::GREEN
    }
}
