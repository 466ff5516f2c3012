//! Mipmap chain generation.

use image::RgbaImage;

/// Number of levels from `width`×`height` down to 1×1.
pub fn level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    largest.ilog2() + 1
}

/// Size of mip `level` for a base of `width`×`height`.
pub fn level_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    (
        width.checked_shr(level).unwrap_or(0).max(1),
        height.checked_shr(level).unwrap_or(0).max(1),
    )
}

/// Generate the full chain: [original, half-size, quarter-size, ..., 1×1].
pub fn build_chain(source: &RgbaImage) -> Vec<RgbaImage> {
    let (width, height) = source.dimensions();
    build_chain_with_count(source, level_count(width, height))
}

/// Generate at most `count` levels, stopping early at 1×1.
pub fn build_chain_with_count(source: &RgbaImage, count: u32) -> Vec<RgbaImage> {
    let mut mipmaps = vec![source.clone()];

    for _ in 1..count {
        let Some(current) = mipmaps.last() else {
            break;
        };
        if current.width() <= 1 && current.height() <= 1 {
            break;
        }
        let next = downsample_box_2x(current);
        mipmaps.push(next);
    }

    mipmaps
}

/// Halve until both sides fit in `max_side`.
pub fn downsample_to_fit(source: &RgbaImage, max_side: u32) -> RgbaImage {
    let mut current = source.clone();
    while current.width() > max_side || current.height() > max_side {
        current = downsample_box_2x(&current);
    }
    current
}

/// Average each 2×2 block, rounding to nearest. An axis already at 1
/// samples its only row or column twice.
pub fn downsample_box_2x(source: &RgbaImage) -> RgbaImage {
    let (width, height) = source.dimensions();
    let new_width = (width / 2).max(1);
    let new_height = (height / 2).max(1);

    RgbaImage::from_fn(new_width, new_height, |x, y| {
        let x0 = (x * 2).min(width - 1);
        let x1 = (x * 2 + 1).min(width - 1);
        let y0 = (y * 2).min(height - 1);
        let y1 = (y * 2 + 1).min(height - 1);

        let p00 = source.get_pixel(x0, y0);
        let p10 = source.get_pixel(x1, y0);
        let p01 = source.get_pixel(x0, y1);
        let p11 = source.get_pixel(x1, y1);

        let mut avg = [0u8; 4];
        for (c, out) in avg.iter_mut().enumerate() {
            let sum = p00[c] as u16 + p10[c] as u16 + p01[c] as u16 + p11[c] as u16;
            *out = ((sum + 2) / 4) as u8;
        }
        image::Rgba(avg)
    })
}
