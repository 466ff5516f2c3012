//! DXT3 block compression: 8 bytes of explicit 4-bit alpha followed by a
//! DXT1 color block that is always read in four-color mode.

use super::bc1;
use super::color::{expand, quantize};

pub const BLOCK_BYTES: usize = 16;

pub fn decode_block(block: &[u8]) -> [[u8; 4]; 16] {
    let mut pixels = bc1::decode_block(&block[8..16], false);
    let mut alpha_bytes = [0u8; 8];
    alpha_bytes.copy_from_slice(&block[0..8]);
    let alpha = u64::from_le_bytes(alpha_bytes);

    for (i, pixel) in pixels.iter_mut().enumerate() {
        pixel[3] = expand(((alpha >> (i * 4)) & 0xF) as u16, 4);
    }
    pixels
}

pub fn encode_block(pixels: &[[u8; 4]; 16]) -> [u8; 16] {
    let mut alpha = 0u64;
    for (i, pixel) in pixels.iter().enumerate() {
        alpha |= (quantize(pixel[3], 4) as u64) << (i * 4);
    }

    let mut output = [0u8; 16];
    output[0..8].copy_from_slice(&alpha.to_le_bytes());
    output[8..16].copy_from_slice(&bc1::encode_block(pixels, false));
    output
}
