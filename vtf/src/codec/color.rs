//! Colour helpers shared by the block and packed-pixel codecs.

/// Quantise an 8-bit channel to `bits` bits, rounding to nearest.
#[inline]
pub fn quantize(value: u8, bits: u32) -> u16 {
    let max = (1u32 << bits) - 1;
    ((value as u32 * max + 127) / 255) as u16
}

/// Expand a `bits`-bit channel to 8 bits by replicating its high bits.
#[inline]
pub fn expand(value: u16, bits: u32) -> u8 {
    let v = value as u32 & ((1 << bits) - 1);
    match bits {
        1 => (v * 255) as u8,
        4 => (v * 17) as u8,
        _ => ((v << (8 - bits)) | (v >> (2 * bits - 8))) as u8,
    }
}

/// Pack to RGB565 with red in the high bits, as DXT endpoints are stored.
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (quantize(r, 5) << 11) | (quantize(g, 6) << 5) | quantize(b, 5)
}

/// Unpack RGB565 (red in the high bits) with bit replication.
pub fn rgb565_to_rgb888(color: u16) -> [u8; 3] {
    [
        expand(color >> 11, 5),
        expand(color >> 5, 6),
        expand(color, 5),
    ]
}

/// Rec. 601 luma scaled by 1000.
#[inline]
pub fn luminance(pixel: &[u8; 4]) -> u32 {
    299 * pixel[0] as u32 + 587 * pixel[1] as u32 + 114 * pixel[2] as u32
}

/// Rec. 601 luma rounded to 8 bits.
#[inline]
pub fn luminance8(pixel: &[u8; 4]) -> u8 {
    ((luminance(pixel) + 500) / 1000) as u8
}

pub fn color_distance_squared(a: &[u8; 4], b: &[u8; 4]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}
