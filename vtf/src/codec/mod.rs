//! Conversion between RGBA8888 images and the on-disk pixel formats.

pub mod bc1;
pub mod bc2;
pub mod bc3;
pub mod color;
mod uncompressed;

use image::RgbaImage;

use crate::error::{Result, VtfError};
use crate::vtf::consts::ImageFormat;

/// Bytes one `width`×`height` image occupies in `format`.
pub fn level_size(format: ImageFormat, width: u32, height: u32) -> usize {
    format.bytes_for_size(width, height)
}

fn require_supported(format: ImageFormat, width: u32, height: u32) -> Result<()> {
    if !format.is_supported() {
        return Err(VtfError::UnsupportedFormat(format.to_string()));
    }
    if width == 0 || height == 0 {
        return Err(VtfError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Decode one image of `format` into a new RGBA8888 buffer.
///
/// `data` may be longer than needed, trailing bytes are ignored.
pub fn decode(format: ImageFormat, data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
    require_supported(format, width, height)?;
    let size = level_size(format, width, height);
    if data.len() < size {
        return Err(VtfError::MalformedData(format!(
            "{format} {width}x{height} needs {size} bytes, got {}",
            data.len()
        )));
    }
    let data = &data[..size];

    match format {
        ImageFormat::DXT1 | ImageFormat::DXT1_ONEBITALPHA => Ok(decode_blocks(
            data,
            width,
            height,
            bc1::BLOCK_BYTES,
            |block| bc1::decode_block(block, true),
        )),
        ImageFormat::DXT3 => Ok(decode_blocks(
            data,
            width,
            height,
            bc2::BLOCK_BYTES,
            bc2::decode_block,
        )),
        ImageFormat::DXT5 => Ok(decode_blocks(
            data,
            width,
            height,
            bc3::BLOCK_BYTES,
            bc3::decode_block,
        )),
        _ => {
            let bpp = size / (width as usize * height as usize);
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for pixel in data.chunks_exact(bpp) {
                rgba.extend_from_slice(&uncompressed::decode_pixel(format, pixel));
            }
            RgbaImage::from_raw(width, height, rgba)
                .ok_or_else(|| VtfError::malformed("decoded buffer has the wrong length"))
        }
    }
}

/// Encode an RGBA8888 image. The output is exactly [`level_size`] bytes.
pub fn encode(format: ImageFormat, image: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    require_supported(format, width, height)?;

    let out = match format {
        ImageFormat::DXT1 => encode_blocks(image, bc1::BLOCK_BYTES, |pixels| {
            bc1::encode_block(pixels, false).to_vec()
        }),
        ImageFormat::DXT1_ONEBITALPHA => encode_blocks(image, bc1::BLOCK_BYTES, |pixels| {
            bc1::encode_block(pixels, true).to_vec()
        }),
        ImageFormat::DXT3 => encode_blocks(image, bc2::BLOCK_BYTES, |pixels| {
            bc2::encode_block(pixels).to_vec()
        }),
        ImageFormat::DXT5 => encode_blocks(image, bc3::BLOCK_BYTES, |pixels| {
            bc3::encode_block(pixels).to_vec()
        }),
        _ => {
            let mut out = Vec::with_capacity(level_size(format, width, height));
            for pixel in image.pixels() {
                uncompressed::encode_pixel(format, pixel.0, &mut out);
            }
            out
        }
    };
    debug_assert_eq!(out.len(), level_size(format, width, height));
    Ok(out)
}

/// Gather the 4×4 tile at block (`bx`, `by`), repeating edge pixels where
/// the tile runs past the image.
fn read_block(image: &RgbaImage, bx: u32, by: u32) -> [[u8; 4]; 16] {
    let (width, height) = image.dimensions();
    let mut pixels = [[0u8; 4]; 16];
    for (i, pixel) in pixels.iter_mut().enumerate() {
        let x = (bx * 4 + i as u32 % 4).min(width - 1);
        let y = (by * 4 + i as u32 / 4).min(height - 1);
        *pixel = image.get_pixel(x, y).0;
    }
    pixels
}

fn write_block(image: &mut RgbaImage, bx: u32, by: u32, pixels: &[[u8; 4]; 16]) {
    let (width, height) = image.dimensions();
    for (i, pixel) in pixels.iter().enumerate() {
        let x = bx * 4 + i as u32 % 4;
        let y = by * 4 + i as u32 / 4;
        if x < width && y < height {
            image.put_pixel(x, y, image::Rgba(*pixel));
        }
    }
}

fn decode_blocks(
    data: &[u8],
    width: u32,
    height: u32,
    block_bytes: usize,
    decode_block: impl Fn(&[u8]) -> [[u8; 4]; 16],
) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    let blocks_x = width.div_ceil(4);
    for (i, block) in data.chunks_exact(block_bytes).enumerate() {
        let bx = i as u32 % blocks_x;
        let by = i as u32 / blocks_x;
        write_block(&mut image, bx, by, &decode_block(block));
    }
    image
}

fn encode_blocks(
    image: &RgbaImage,
    block_bytes: usize,
    encode_block: impl Fn(&[[u8; 4]; 16]) -> Vec<u8>,
) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let mut out = Vec::with_capacity(blocks_x as usize * blocks_y as usize * block_bytes);
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            out.extend_from_slice(&encode_block(&read_block(image, bx, by)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Deterministic noise covering every channel value.
    fn noise(width: u32, height: u32) -> RgbaImage {
        let mut state = 0x2545_f491u32;
        RgbaImage::from_fn(width, height, |_, _| {
            let mut px = [0u8; 4];
            for c in px.iter_mut() {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                *c = (state >> 24) as u8;
            }
            image::Rgba(px)
        })
    }

    fn max_channel_error(a: &RgbaImage, b: &RgbaImage, channels: usize) -> i32 {
        a.pixels()
            .zip(b.pixels())
            .flat_map(|(p, q)| (0..channels).map(move |c| (p[c] as i32 - q[c] as i32).abs()))
            .max()
            .unwrap_or(0)
    }

    #[rstest]
    #[case(ImageFormat::RGBA8888)]
    #[case(ImageFormat::ABGR8888)]
    #[case(ImageFormat::ARGB8888)]
    #[case(ImageFormat::BGRA8888)]
    #[case(ImageFormat::UVWQ8888)]
    #[case(ImageFormat::UVLX8888)]
    #[case(ImageFormat::RGBA16161616)]
    #[case(ImageFormat::RGBA16161616F)]
    #[case(ImageFormat::RGBA32323232F)]
    fn lossless_formats_round_trip(
        #[case] format: ImageFormat,
        #[values((1, 1), (2, 8), (16, 16))] size: (u32, u32),
    ) {
        let source = noise(size.0, size.1);
        let encoded = encode(format, &source).unwrap();
        assert_eq!(encoded.len(), level_size(format, size.0, size.1));
        assert_eq!(decode(format, &encoded, size.0, size.1).unwrap(), source);
    }

    #[rstest]
    #[case(ImageFormat::RGB888)]
    #[case(ImageFormat::BGR888)]
    #[case(ImageFormat::BGRX8888)]
    #[case(ImageFormat::RGB323232F)]
    fn opaque_formats_round_trip_opaque_images(#[case] format: ImageFormat) {
        let mut source = noise(8, 4);
        source.pixels_mut().for_each(|p| p[3] = 255);
        let encoded = encode(format, &source).unwrap();
        assert_eq!(decode(format, &encoded, 8, 4).unwrap(), source);
    }

    #[rstest]
    #[case(ImageFormat::BGR565, 4)]
    #[case(ImageFormat::RGB565, 4)]
    #[case(ImageFormat::BGRX5551, 4)]
    #[case(ImageFormat::BGRA4444, 8)]
    fn packed_formats_stay_within_quantisation(#[case] format: ImageFormat, #[case] bound: i32) {
        let mut source = noise(4, 4);
        source.pixels_mut().for_each(|p| p[3] = 255);
        let decoded = decode(format, &encode(format, &source).unwrap(), 4, 4).unwrap();
        assert!(max_channel_error(&source, &decoded, 4) <= bound);
    }

    #[test]
    fn packed_565_channel_order() {
        let red = RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        assert_eq!(encode(ImageFormat::BGR565, &red).unwrap(), vec![0x00, 0xF8]);
        assert_eq!(encode(ImageFormat::RGB565, &red).unwrap(), vec![0x1F, 0x00]);
    }

    #[test]
    fn one_bit_alpha_5551() {
        let source = RgbaImage::from_fn(2, 1, |x, _| {
            image::Rgba([255, 255, 255, if x == 0 { 0 } else { 200 }])
        });
        let decoded = decode(
            ImageFormat::BGRA5551,
            &encode(ImageFormat::BGRA5551, &source).unwrap(),
            2,
            1,
        )
        .unwrap();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255, 0]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn single_channel_formats() {
        let source = RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 99]));

        let i8 = encode(ImageFormat::I8, &source).unwrap();
        assert_eq!(i8, vec![76]);
        assert_eq!(
            decode(ImageFormat::I8, &i8, 1, 1).unwrap().get_pixel(0, 0).0,
            [76, 76, 76, 255]
        );

        let ia88 = encode(ImageFormat::IA88, &source).unwrap();
        assert_eq!(ia88, vec![76, 99]);

        let a8 = encode(ImageFormat::A8, &source).unwrap();
        assert_eq!(a8, vec![99]);
        assert_eq!(
            decode(ImageFormat::A8, &a8, 1, 1).unwrap().get_pixel(0, 0).0,
            [0, 0, 0, 99]
        );

        let uv = encode(ImageFormat::UV88, &source).unwrap();
        assert_eq!(uv, vec![255, 0]);
    }

    #[test]
    fn bluescreen_marks_transparency() {
        let source = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([9, 8, 7, 0])
            } else {
                image::Rgba([1, 2, 3, 255])
            }
        });
        let rgb = encode(ImageFormat::RGB888_BLUESCREEN, &source).unwrap();
        assert_eq!(rgb, vec![0, 0, 255, 1, 2, 3]);
        let bgr = encode(ImageFormat::BGR888_BLUESCREEN, &source).unwrap();
        assert_eq!(bgr, vec![255, 0, 0, 3, 2, 1]);

        let expected = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([0, 0, 0, 0])
            } else {
                image::Rgba([1, 2, 3, 255])
            }
        });
        assert_eq!(
            decode(ImageFormat::RGB888_BLUESCREEN, &rgb, 2, 1).unwrap(),
            expected
        );
        assert_eq!(
            decode(ImageFormat::BGR888_BLUESCREEN, &bgr, 2, 1).unwrap(),
            expected
        );
    }

    #[test]
    fn bgra_swizzle() {
        let source = RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        assert_eq!(encode(ImageFormat::BGRA8888, &source).unwrap(), vec![3, 2, 1, 4]);
        assert_eq!(encode(ImageFormat::ABGR8888, &source).unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(encode(ImageFormat::ARGB8888, &source).unwrap(), vec![4, 1, 2, 3]);
    }

    #[rstest]
    #[case(ImageFormat::DXT1)]
    #[case(ImageFormat::DXT1_ONEBITALPHA)]
    #[case(ImageFormat::DXT3)]
    #[case(ImageFormat::DXT5)]
    fn block_formats_pad_small_levels(
        #[case] format: ImageFormat,
        #[values((1, 1), (2, 2), (8, 4), (4, 16))] size: (u32, u32),
    ) {
        let source = RgbaImage::from_pixel(size.0, size.1, image::Rgba([0, 255, 0, 255]));
        let encoded = encode(format, &source).unwrap();
        assert_eq!(encoded.len(), level_size(format, size.0, size.1));
        let decoded = decode(format, &encoded, size.0, size.1).unwrap();
        assert_eq!(decoded.dimensions(), size);
        assert_eq!(decoded, source);
    }

    #[test]
    fn block_layout_is_row_major() {
        let source = RgbaImage::from_fn(8, 8, |x, y| {
            if x < 4 && y >= 4 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let encoded = encode(ImageFormat::DXT1, &source).unwrap();
        // third block is the bottom-left tile
        assert_eq!(&encoded[16..20], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&encoded[0..4], &[0, 0, 0, 0]);
        assert_eq!(decode(ImageFormat::DXT1, &encoded, 8, 8).unwrap(), source);
    }

    #[test]
    fn truncated_data_is_malformed() {
        let err = decode(ImageFormat::DXT5, &[0u8; 15], 4, 4).unwrap_err();
        assert!(matches!(err, VtfError::MalformedData(_)));
        let err = decode(ImageFormat::RGBA8888, &[0u8; 63], 4, 4).unwrap_err();
        assert!(matches!(err, VtfError::MalformedData(_)));
    }

    #[test]
    fn unsupported_formats_are_rejected() {
        let image = RgbaImage::new(4, 4);
        for format in [ImageFormat::P8, ImageFormat::ATI2N, ImageFormat::NONE] {
            assert!(matches!(
                encode(format, &image),
                Err(VtfError::UnsupportedFormat(_))
            ));
            assert!(matches!(
                decode(format, &[0u8; 256], 4, 4),
                Err(VtfError::UnsupportedFormat(_))
            ));
        }
    }
}
