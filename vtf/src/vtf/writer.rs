use std::mem;

use bytemuck::Zeroable;
use flagset::FlagSet;
use image::RgbaImage;

use crate::codec;
use crate::error::{check_dimensions, Result, VtfError};
use crate::mipmap;

use super::consts::{texture_flags, ImageFormat, TextureFlags};
use super::header::{
    ResourceEntryInfo, VTFHeader, VTFHeaderExt, EXT_HEADER_SIZE, LEGACY_HEADER_SIZE, SIGNATURE,
    TAG_HIGH_RES, TAG_LOW_RES,
};
use super::{MAJOR_VERSION, MAX_MINOR_VERSION};

pub const THUMBNAIL_FORMAT: ImageFormat = ImageFormat::DXT1;
/// Thumbnails are halved until both sides fit.
pub const THUMBNAIL_MAX_SIDE: u32 = 16;
pub const CUBE_FACES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    pub format: ImageFormat,
    /// Stored as given. With `ENVMAP` set the images are the six cube faces.
    pub flags: u32,
    pub generate_thumbnail: bool,
    pub generate_mipmaps: bool,
    pub version: (u32, u32),
    pub bumpmap_scale: f32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::DXT5,
            flags: 0,
            generate_thumbnail: true,
            generate_mipmaps: true,
            version: (7, 2),
            bumpmap_scale: 1.0,
        }
    }
}

impl WriteOptions {
    pub fn texture_flags(&self) -> FlagSet<TextureFlags> {
        texture_flags(self.flags)
    }
}

/// Mean colour of `image` with each channel in 0..=1.
pub fn reflectivity(image: &RgbaImage) -> [f32; 3] {
    let mut sum = [0u64; 3];
    for pixel in image.pixels() {
        for (total, value) in sum.iter_mut().zip(pixel.0) {
            *total += value as u64;
        }
    }
    let count = (image.width() as u64 * image.height() as u64).max(1) as f64;
    sum.map(|total| (total as f64 / count / 255.0) as f32)
}

pub fn write_single(image: &RgbaImage, options: &WriteOptions) -> Result<Vec<u8>> {
    write(std::slice::from_ref(image), options)
}

/// Encode `images` into a complete VTF file. Each image is one animation
/// frame, or one cube face when the flags carry `ENVMAP`.
pub fn write(images: &[RgbaImage], options: &WriteOptions) -> Result<Vec<u8>> {
    let (major, minor) = options.version;
    if major != MAJOR_VERSION || minor > MAX_MINOR_VERSION {
        return Err(VtfError::UnsupportedVersion { major, minor });
    }
    if !options.format.is_supported() {
        return Err(VtfError::UnsupportedFormat(options.format.to_string()));
    }

    let base = images
        .first()
        .ok_or_else(|| VtfError::InvalidOption("no images to write".to_string()))?;
    let (width, height) = base.dimensions();
    check_dimensions(width, height)?;
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(VtfError::InvalidDimensions { width, height });
    }
    if let Some(other) = images.iter().find(|image| image.dimensions() != (width, height)) {
        let (width, height) = other.dimensions();
        return Err(VtfError::InvalidDimensions { width, height });
    }

    let cube = options.texture_flags().contains(TextureFlags::ENVMAP);
    let frames = if cube {
        if images.len() != CUBE_FACES {
            return Err(VtfError::InvalidOption(format!(
                "an environment map needs {CUBE_FACES} faces, got {}",
                images.len()
            )));
        }
        1
    } else {
        u16::try_from(images.len()).map_err(|_| {
            VtfError::InvalidOption(format!("{} frames is too many", images.len()))
        })?
    };

    let mip_count = if options.generate_mipmaps {
        mipmap::level_count(width, height)
    } else {
        1
    };
    let chains = images
        .iter()
        .map(|image| mipmap::build_chain_with_count(image, mip_count))
        .collect::<Vec<_>>();

    let mut high_res = Vec::new();
    for mip in (0..mip_count as usize).rev() {
        for chain in &chains {
            high_res.extend_from_slice(&codec::encode(options.format, &chain[mip])?);
        }
    }

    let thumbnail = if options.generate_thumbnail {
        let small = mipmap::downsample_to_fit(base, THUMBNAIL_MAX_SIDE);
        let data = codec::encode(THUMBNAIL_FORMAT, &small)?;
        Some((small.dimensions(), data))
    } else {
        None
    };

    let mut header = VTFHeader::zeroed();
    header.signature = SIGNATURE;
    header.version = [major, minor];
    header.width = width as u16;
    header.height = height as u16;
    header.flags = options.flags;
    header.frames = frames;
    header.reflectivity = reflectivity(base);
    header.bumpmap_scale = options.bumpmap_scale;
    header.high_res_image_format = options.format.id();
    header.mipmap_count = mip_count as u8;
    header.low_res_image_format = ImageFormat::NONE.id();
    if let Some(((w, h), _)) = &thumbnail {
        header.low_res_image_format = THUMBNAIL_FORMAT.id();
        header.low_res_image_width = *w as u8;
        header.low_res_image_height = *h as u8;
    }

    // Sizes first; offsets follow once every block is known.
    let mut blocks = Vec::with_capacity(2);
    if let Some((_, data)) = thumbnail {
        blocks.push((TAG_LOW_RES, data));
    }
    blocks.push((TAG_HIGH_RES, high_res));

    let header_size = match minor {
        0 | 1 => LEGACY_HEADER_SIZE,
        2 => EXT_HEADER_SIZE,
        _ => EXT_HEADER_SIZE + blocks.len() * mem::size_of::<ResourceEntryInfo>(),
    };
    let mut resources = Vec::with_capacity(blocks.len());
    let mut end = header_size;
    for (tag, data) in &blocks {
        let offset = u32::try_from(end)
            .map_err(|_| VtfError::InvalidOption("encoded texture exceeds 4 GiB".to_string()))?;
        resources.push(ResourceEntryInfo::new(*tag, offset));
        end += data.len();
    }
    header.header_size = header_size as u32;

    let mut out = Vec::with_capacity(end);
    out.extend_from_slice(bytemuck::bytes_of(&header.swap_le()));
    if minor >= 2 {
        let ext = VTFHeaderExt {
            depth: 1,
            num_resources: if minor >= 3 { resources.len() as u32 } else { 0 },
            ..VTFHeaderExt::zeroed()
        };
        out.extend_from_slice(bytemuck::bytes_of(&ext.swap_le()));
        if minor >= 3 {
            for entry in &resources {
                out.extend_from_slice(bytemuck::bytes_of(&entry.swap_le()));
            }
        }
    }
    out.resize(header_size, 0);
    for (_, data) in &blocks {
        out.extend_from_slice(data);
    }

    log::debug!(
        "wrote vtf {major}.{minor} {width}x{height} {} mips={mip_count} images={} ({} bytes)",
        options.format,
        images.len(),
        out.len()
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::vtf::VTF;
    use super::*;
    use rstest::rstest;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255])
        })
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn options(format: ImageFormat) -> WriteOptions {
        WriteOptions {
            format,
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let options = WriteOptions::default();
        assert_eq!(options.format, ImageFormat::DXT5);
        assert_eq!(options.flags, 0);
        assert!(options.generate_thumbnail);
        assert!(options.generate_mipmaps);
        assert_eq!(options.version, (7, 2));
        assert_eq!(options.bumpmap_scale, 1.0);
    }

    #[rstest]
    fn lossless_round_trip_every_version(#[values(0, 1, 2, 3, 4, 5)] minor: u32) {
        let source = gradient(16, 8);
        let data = write_single(
            &source,
            &WriteOptions {
                version: (7, minor),
                ..options(ImageFormat::RGBA8888)
            },
        )
        .unwrap();

        let vtf = VTF::from_bytes(data).unwrap();
        assert_eq!(vtf.version(), (7, minor));
        assert_eq!((vtf.width(), vtf.height()), (16, 8));
        assert_eq!(vtf.mipmap_count(), 5);
        assert_eq!(vtf.decode_base().unwrap(), source);
        assert_eq!(vtf.decode(0, 0, 4).unwrap().dimensions(), (1, 1));

        let thumbnail = vtf.thumbnail().unwrap().unwrap();
        assert_eq!(thumbnail.dimensions(), (16, 8));
        assert_eq!(vtf.low_res_format(), Some(THUMBNAIL_FORMAT));
    }

    #[test]
    fn legacy_header_sizes() {
        let source = RgbaImage::new(4, 4);
        for (minor, size) in [(0, 64), (1, 64), (2, 80)] {
            let data = write_single(
                &source,
                &WriteOptions {
                    version: (7, minor),
                    generate_thumbnail: false,
                    generate_mipmaps: false,
                    ..options(ImageFormat::A8)
                },
            )
            .unwrap();
            assert_eq!(u32::from_le_bytes([data[12], data[13], data[14], data[15]]), size);
            assert_eq!(data.len(), size as usize + 16);
        }
    }

    #[test]
    fn resource_directory_layout() {
        init();
        let data = write_single(
            &RgbaImage::new(8, 8),
            &WriteOptions {
                version: (7, 4),
                generate_mipmaps: false,
                ..options(ImageFormat::DXT1)
            },
        )
        .unwrap();
        // header, two entries, 8x8 thumbnail and 8x8 image
        assert_eq!(data.len(), 96 + 32 + 32);
        assert_eq!(&data[80..84], &[0x01, 0, 0, 0]);
        assert_eq!(&data[84..88], &96u32.to_le_bytes());
        assert_eq!(&data[88..92], &[0x30, 0, 0, 0]);
        assert_eq!(&data[92..96], &128u32.to_le_bytes());

        let vtf = VTF::read(&data).unwrap();
        assert_eq!(vtf.resources().len(), 2);
        assert_eq!(vtf.resource_data(TAG_HIGH_RES).unwrap().unwrap().len(), 32);
    }

    #[test]
    fn header_fields() {
        init();
        let source = RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 51, 255]));
        let data = write_single(
            &source,
            &WriteOptions {
                flags: 0xC000_0004,
                bumpmap_scale: 0.5,
                generate_thumbnail: false,
                ..Default::default()
            },
        )
        .unwrap();
        let vtf = VTF::read(&data).unwrap();
        assert_eq!(vtf.flags_bits(), 0xC000_0004);
        assert_eq!(vtf.format(), ImageFormat::DXT5);
        assert_eq!(vtf.frame_count(), 1);
        assert_eq!(vtf.bumpmap_scale(), 0.5);
        assert_eq!(vtf.reflectivity(), glam::Vec3::new(1.0, 0.0, 0.2));
        assert_eq!(vtf.low_res_format(), None);
        assert_eq!((vtf.low_res_width(), vtf.low_res_height()), (0, 0));
        assert!(vtf.thumbnail().unwrap().is_none());
        let low_res_id = vtf.header().low_res_image_format;
        assert_eq!(low_res_id, -1);
    }

    #[test]
    fn mips_are_stored_smallest_first() {
        let data = write_single(
            &RgbaImage::from_pixel(4, 2, image::Rgba([7, 7, 7, 7])),
            &WriteOptions {
                generate_thumbnail: false,
                ..options(ImageFormat::I8)
            },
        )
        .unwrap();
        // 1x1, 2x1, 4x2
        assert_eq!(data.len(), 80 + 1 + 2 + 8);
        let vtf = VTF::read(&data).unwrap();
        assert_eq!(vtf.level(0, 0, 0, 2).unwrap().offset, 80);
        assert_eq!(vtf.level(0, 0, 0, 1).unwrap().offset, 81);
        assert_eq!(vtf.level(0, 0, 0, 0).unwrap().offset, 83);
    }

    #[test]
    fn animation_frames() {
        let frames = (0..3u8)
            .map(|i| RgbaImage::from_pixel(4, 4, image::Rgba([i * 50, 0, 0, 255])))
            .collect::<Vec<_>>();
        let data = write(&frames, &options(ImageFormat::BGR888)).unwrap();
        let vtf = VTF::read(&data).unwrap();
        assert_eq!(vtf.frame_count(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(&vtf.decode(i as u32, 0, 0).unwrap(), frame);
            assert_eq!(
                vtf.decode(i as u32, 0, 2).unwrap().get_pixel(0, 0).0,
                [i as u8 * 50, 0, 0, 255]
            );
        }
    }

    #[test]
    fn environment_map_faces() {
        let faces = (0..6u8)
            .map(|i| RgbaImage::from_pixel(2, 2, image::Rgba([0, i, 0, 255])))
            .collect::<Vec<_>>();
        let flags = FlagSet::from(TextureFlags::ENVMAP).bits();
        let data = write(
            &faces,
            &WriteOptions {
                flags,
                version: (7, 5),
                ..options(ImageFormat::RGB888)
            },
        )
        .unwrap();
        let vtf = VTF::read(&data).unwrap();
        assert_eq!(vtf.face_count(), 6);
        assert_eq!(vtf.frame_count(), 1);
        assert_eq!(vtf.decode(0, 5, 0).unwrap().get_pixel(1, 1).0, [0, 5, 0, 255]);

        let one = write(&faces[..1], &WriteOptions { flags, ..Default::default() });
        assert!(matches!(one, Err(VtfError::InvalidOption(_))));
    }

    #[test]
    fn rejects_invalid_input() {
        let defaults = WriteOptions::default();
        assert!(matches!(
            write_single(&RgbaImage::new(100, 128), &defaults),
            Err(VtfError::InvalidDimensions { width: 100, height: 128 })
        ));
        assert!(matches!(
            write(&[RgbaImage::new(4, 4), RgbaImage::new(8, 8)], &defaults),
            Err(VtfError::InvalidDimensions { width: 8, height: 8 })
        ));
        assert!(matches!(write(&[], &defaults), Err(VtfError::InvalidOption(_))));
        assert!(matches!(
            write_single(&RgbaImage::new(4, 4), &options(ImageFormat::P8)),
            Err(VtfError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            write_single(
                &RgbaImage::new(4, 4),
                &WriteOptions {
                    version: (7, 6),
                    ..Default::default()
                }
            ),
            Err(VtfError::UnsupportedVersion { major: 7, minor: 6 })
        ));
    }

    #[test]
    fn dxt1_red_without_extras() {
        let red = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let data = write_single(
            &red,
            &WriteOptions {
                generate_thumbnail: false,
                generate_mipmaps: false,
                ..options(ImageFormat::DXT1)
            },
        )
        .unwrap();
        assert_eq!(data.len(), 80 + 8);
        assert_eq!(VTF::read(&data).unwrap().decode_base().unwrap(), red);
    }
}
