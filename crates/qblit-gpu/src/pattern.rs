//! Content generators
//!
//! Byte-buffer builders only; nothing here touches the bus.

use crate::{PALETTE_LEN, PIXELS, WIDTH};

/// One scanline filled with a single palette index
pub fn solid_line(color: u8) -> Vec<u8> {
    vec![color; WIDTH]
}

/// 256-byte ascending palette-index ramp
pub fn gradient() -> Vec<u8> {
    (0..=255).collect()
}

/// Full-frame diagonal-band test pattern
pub fn test_frame() -> Vec<u8> {
    (0..PIXELS).map(|i| ((i / 25) % 256) as u8).collect()
}

/// Linear grayscale palette, 256 RGB triples
pub fn grayscale_palette() -> Vec<u8> {
    let mut palette = Vec::with_capacity(PALETTE_LEN);
    for level in 0..=255u8 {
        palette.extend_from_slice(&[level, level, level]);
    }
    palette
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sizes() {
        assert_eq!(solid_line(7).len(), WIDTH);
        assert_eq!(gradient().len(), 256);
        assert_eq!(test_frame().len(), PIXELS);
        assert_eq!(grayscale_palette().len(), PALETTE_LEN);
    }

    #[test]
    fn test_solid_line_is_uniform() {
        assert!(solid_line(0x42).iter().all(|&p| p == 0x42));
    }

    #[test]
    fn test_frame_bands() {
        let frame = test_frame();
        assert_eq!(frame[0], 0);
        assert_eq!(frame[24], 0);
        assert_eq!(frame[25], 1);
        assert_eq!(frame[25 * 256], 0);
    }
}
