//! DXT5 block compression.
//!
//! A DXT5 block stores a 4×4 tile in 16 bytes:
//! - 1 byte: alpha0
//! - 1 byte: alpha1
//! - 6 bytes: 16 3-bit alpha indices
//! - 8 bytes: DXT1 color block, always read in four-color mode

use super::bc1;

pub const BLOCK_BYTES: usize = 16;

/// Alpha ramp for a pair of endpoints. alpha0 > alpha1 gives six
/// interpolated values; otherwise four, followed by 0 and 255.
pub fn alpha_palette(alpha0: u8, alpha1: u8) -> [u8; 8] {
    let a0 = alpha0 as u16;
    let a1 = alpha1 as u16;
    if alpha0 > alpha1 {
        [
            alpha0,
            alpha1,
            ((6 * a0 + a1) / 7) as u8,
            ((5 * a0 + 2 * a1) / 7) as u8,
            ((4 * a0 + 3 * a1) / 7) as u8,
            ((3 * a0 + 4 * a1) / 7) as u8,
            ((2 * a0 + 5 * a1) / 7) as u8,
            ((a0 + 6 * a1) / 7) as u8,
        ]
    } else {
        [
            alpha0,
            alpha1,
            ((4 * a0 + a1) / 5) as u8,
            ((3 * a0 + 2 * a1) / 5) as u8,
            ((2 * a0 + 3 * a1) / 5) as u8,
            ((a0 + 4 * a1) / 5) as u8,
            0,
            255,
        ]
    }
}

pub fn decode_block(block: &[u8]) -> [[u8; 4]; 16] {
    let mut pixels = bc1::decode_block(&block[8..16], false);
    let palette = alpha_palette(block[0], block[1]);

    let mut index_bytes = [0u8; 8];
    index_bytes[..6].copy_from_slice(&block[2..8]);
    let indices = u64::from_le_bytes(index_bytes);

    for (i, pixel) in pixels.iter_mut().enumerate() {
        pixel[3] = palette[((indices >> (i * 3)) & 0x7) as usize];
    }
    pixels
}

pub fn encode_block(pixels: &[[u8; 4]; 16]) -> [u8; 16] {
    let mut output = [0u8; 16];
    output[0..8].copy_from_slice(&encode_alpha(pixels));
    output[8..16].copy_from_slice(&bc1::encode_block(pixels, false));
    output
}

fn encode_alpha(pixels: &[[u8; 4]; 16]) -> [u8; 8] {
    let max_alpha = pixels.iter().map(|p| p[3]).max().unwrap_or(255);
    let min_alpha = pixels.iter().map(|p| p[3]).min().unwrap_or(255);

    let mut output = [0u8; 8];
    output[0] = max_alpha;
    output[1] = min_alpha;
    if max_alpha == min_alpha {
        // index 0 everywhere
        return output;
    }

    let palette = alpha_palette(max_alpha, min_alpha);
    let mut indices = 0u64;
    for (i, pixel) in pixels.iter().enumerate() {
        let mut best_dist = u32::MAX;
        let mut best_index = 0u64;
        for (idx, &value) in palette.iter().enumerate() {
            let dist = (pixel[3] as i32 - value as i32).unsigned_abs();
            if dist < best_dist {
                best_dist = dist;
                best_index = idx as u64;
            }
        }
        indices |= best_index << (i * 3);
    }
    output[2..8].copy_from_slice(&indices.to_le_bytes()[..6]);
    output
}
