//! DXT1 block compression.
//!
//! A DXT1 block stores a 4×4 tile in 8 bytes:
//! - 2 bytes: color0 (RGB565)
//! - 2 bytes: color1 (RGB565)
//! - 4 bytes: 16 2-bit indices, pixel 0 in the lowest bits
//!
//! When color0 > color1 the palette is color0, color1, 2/3·c0 + 1/3·c1 and
//! 1/3·c0 + 2/3·c1. Otherwise it is color0, color1, their midpoint and
//! transparent black.

use super::color::{color_distance_squared, luminance, rgb565_to_rgb888, rgb888_to_rgb565};

pub const BLOCK_BYTES: usize = 8;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Palette for a pair of endpoints. With `punch_through` unset the block is
/// always read in four-color mode, as DXT3 and DXT5 color blocks are.
pub fn palette(c0: u16, c1: u16, punch_through: bool) -> [[u8; 4]; 4] {
    let a = rgb565_to_rgb888(c0);
    let b = rgb565_to_rgb888(c1);
    let mix = |wa: u16, wb: u16| -> [u8; 4] {
        let d = wa + wb;
        [
            ((wa * a[0] as u16 + wb * b[0] as u16) / d) as u8,
            ((wa * a[1] as u16 + wb * b[1] as u16) / d) as u8,
            ((wa * a[2] as u16 + wb * b[2] as u16) / d) as u8,
            255,
        ]
    };
    let p0 = [a[0], a[1], a[2], 255];
    let p1 = [b[0], b[1], b[2], 255];

    if c0 > c1 || !punch_through {
        [p0, p1, mix(2, 1), mix(1, 2)]
    } else {
        [p0, p1, mix(1, 1), TRANSPARENT]
    }
}

pub fn decode_block(block: &[u8], punch_through: bool) -> [[u8; 4]; 16] {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let palette = palette(c0, c1, punch_through);

    let mut pixels = [[0u8; 4]; 16];
    for (i, pixel) in pixels.iter_mut().enumerate() {
        *pixel = palette[((indices >> (i * 2)) & 0x3) as usize];
    }
    pixels
}

/// Compress a 4×4 tile. With `punch_through` set, any pixel whose alpha is
/// below 128 switches the block to three-color mode and is stored as index 3.
pub fn encode_block(pixels: &[[u8; 4]; 16], punch_through: bool) -> [u8; 8] {
    if punch_through && pixels.iter().any(|p| p[3] < 128) {
        encode_three_color(pixels)
    } else {
        encode_four_color(pixels)
    }
}

fn pack(c0: u16, c1: u16, indices: u32) -> [u8; 8] {
    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0.to_le_bytes());
    output[2..4].copy_from_slice(&c1.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

/// Brightest and darkest pixel of the set, quantised to RGB565.
fn find_endpoints<'a>(pixels: impl Iterator<Item = &'a [u8; 4]>) -> Option<(u16, u16)> {
    let mut brightest: Option<&[u8; 4]> = None;
    let mut darkest: Option<&[u8; 4]> = None;
    for pixel in pixels {
        let lum = luminance(pixel);
        if brightest.map_or(true, |b| lum > luminance(b)) {
            brightest = Some(pixel);
        }
        if darkest.map_or(true, |d| lum < luminance(d)) {
            darkest = Some(pixel);
        }
    }
    let (hi, lo) = (brightest?, darkest?);
    Some((
        rgb888_to_rgb565(hi[0], hi[1], hi[2]),
        rgb888_to_rgb565(lo[0], lo[1], lo[2]),
    ))
}

fn nearest(pixel: &[u8; 4], candidates: &[[u8; 4]]) -> u32 {
    let mut best_dist = u32::MAX;
    let mut best_index = 0;
    for (idx, candidate) in candidates.iter().enumerate() {
        let dist = color_distance_squared(pixel, candidate);
        if dist < best_dist {
            best_dist = dist;
            best_index = idx as u32;
        }
    }
    best_index
}

fn encode_four_color(pixels: &[[u8; 4]; 16]) -> [u8; 8] {
    let Some((hi, lo)) = find_endpoints(pixels.iter()) else {
        return pack(0, 0, 0);
    };
    if hi == lo {
        return pack(hi, lo, 0);
    }

    // c0 > c1 selects four-color mode
    let (c0, c1) = if hi > lo { (hi, lo) } else { (lo, hi) };
    let palette = palette(c0, c1, false);

    let mut indices = 0u32;
    for (i, pixel) in pixels.iter().enumerate() {
        indices |= nearest(pixel, &palette) << (i * 2);
    }
    pack(c0, c1, indices)
}

fn encode_three_color(pixels: &[[u8; 4]; 16]) -> [u8; 8] {
    let opaque = pixels.iter().filter(|p| p[3] >= 128);
    let Some((hi, lo)) = find_endpoints(opaque) else {
        return pack(0, 0, u32::MAX);
    };

    // c0 <= c1 selects three-color mode
    let (c0, c1) = if hi <= lo { (hi, lo) } else { (lo, hi) };
    let palette = palette(c0, c1, true);

    let mut indices = 0u32;
    for (i, pixel) in pixels.iter().enumerate() {
        let index = if pixel[3] < 128 {
            3
        } else {
            nearest(pixel, &palette[..3])
        };
        indices |= index << (i * 2);
    }
    pack(c0, c1, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(top: [u8; 4], bottom: [u8; 4]) -> [[u8; 4]; 16] {
        let mut pixels = [bottom; 16];
        for pixel in pixels.iter_mut().take(8) {
            *pixel = top;
        }
        pixels
    }

    #[test]
    fn reference_block_white_over_black() {
        let pixels = two_tone([255, 255, 255, 255], [0, 0, 0, 255]);
        let block = encode_block(&pixels, true);
        assert_eq!(block, [0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x55, 0x55]);
        assert_eq!(decode_block(&block, true), pixels);
    }

    #[test]
    fn solid_red() {
        let pixels = [[255, 0, 0, 255]; 16];
        let block = encode_block(&pixels, true);
        assert_eq!(block, [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0]);
        assert_eq!(decode_block(&block, true), pixels);
    }

    #[test]
    fn decode_four_color_interpolation() {
        // c0 = white, c1 = black, every pixel index 2 then 3
        let block = [0xFF, 0xFF, 0x00, 0x00, 0xAA, 0xAA, 0xFF, 0xFF];
        let pixels = decode_block(&block, true);
        assert_eq!(pixels[0], [170, 170, 170, 255]);
        assert_eq!(pixels[15], [85, 85, 85, 255]);
    }

    #[test]
    fn decode_punch_through() {
        // c0 = black <= c1 = white: index 2 is the midpoint, index 3 transparent
        let block = [0x00, 0x00, 0xFF, 0xFF, 0xAA, 0xAA, 0xFF, 0xFF];
        let pixels = decode_block(&block, true);
        assert_eq!(pixels[0], [127, 127, 127, 255]);
        assert_eq!(pixels[15], [0, 0, 0, 0]);

        // DXT3/5 color blocks ignore the ordering
        let pixels = decode_block(&block, false);
        assert_eq!(pixels[0], [85, 85, 85, 255]);
        assert_eq!(pixels[15], [170, 170, 170, 255]);
    }

    #[test]
    fn transparent_pixels_use_three_color_mode() {
        let pixels = two_tone([0, 0, 255, 255], [0, 0, 0, 0]);
        let block = encode_block(&pixels, true);
        let c0 = u16::from_le_bytes([block[0], block[1]]);
        let c1 = u16::from_le_bytes([block[2], block[3]]);
        assert!(c0 <= c1);

        let decoded = decode_block(&block, true);
        for pixel in &decoded[..8] {
            assert_eq!(*pixel, [0, 0, 255, 255]);
        }
        for pixel in &decoded[8..] {
            assert_eq!(*pixel, [0, 0, 0, 0]);
        }
    }

    #[test]
    fn fully_transparent_block() {
        let pixels = [[10, 20, 30, 0]; 16];
        let block = encode_block(&pixels, true);
        assert!(decode_block(&block, true).iter().all(|p| *p == [0, 0, 0, 0]));
    }

    #[test]
    fn alpha_ignored_without_punch_through() {
        let pixels = [[0, 255, 0, 0]; 16];
        let block = encode_block(&pixels, false);
        assert_eq!(decode_block(&block, false)[0], [0, 255, 0, 255]);
    }

    #[test]
    fn gradient_stays_close() {
        let mut pixels = [[0u8; 4]; 16];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let v = (i * 17) as u8;
            *pixel = [v, v, v, 255];
        }
        let decoded = decode_block(&encode_block(&pixels, true), true);
        for (src, out) in pixels.iter().zip(decoded.iter()) {
            for c in 0..3 {
                // half of the widest interpolation step plus endpoint rounding
                assert!((src[c] as i32 - out[c] as i32).abs() <= 48, "{src:?} -> {out:?}");
            }
            assert_eq!(out[3], 255);
        }
    }
}
