use std::{fmt, str::FromStr};

use flagset::{flags, FlagSet};
use num_derive::FromPrimitive;

use crate::error::VtfError;

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, FromPrimitive, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ImageFormat {
    NONE = -1,
    RGBA8888 = 0,
    ABGR8888,
    RGB888,
    BGR888,
    RGB565,
    I8,
    IA88,
    P8,
    A8,
    RGB888_BLUESCREEN,
    BGR888_BLUESCREEN,
    ARGB8888,
    BGRA8888,
    DXT1,
    DXT3,
    DXT5,
    BGRX8888,
    BGR565,
    BGRX5551,
    BGRA4444,
    DXT1_ONEBITALPHA,
    BGRA5551,
    UV88,
    UVWQ8888,
    RGBA16161616F,
    RGBA16161616,
    UVLX8888,
    R32F,
    RGB323232F,
    RGBA32323232F,
    NV_DST16,
    NV_DST24,
    NV_INTZ,
    NV_RAWZ,
    ATI_DST16,
    ATI_DST24,
    NV_NULL,
    ATI2N,
    ATI1N,
}

/// Storage layout of one [`ImageFormat`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    pub block_width: u32,
    pub block_height: u32,
    /// Bytes per block, which is bytes per pixel for uncompressed formats.
    pub bytes_per_block: u32,
    pub has_alpha: bool,
}

impl FormatInfo {
    const fn pixel(bytes: u32, has_alpha: bool) -> Self {
        Self {
            block_width: 1,
            block_height: 1,
            bytes_per_block: bytes,
            has_alpha,
        }
    }

    const fn block(bytes: u32, has_alpha: bool) -> Self {
        Self {
            block_width: 4,
            block_height: 4,
            bytes_per_block: bytes,
            has_alpha,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.block_width > 1 || self.block_height > 1
    }
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 39] = [
        ImageFormat::RGBA8888,
        ImageFormat::ABGR8888,
        ImageFormat::RGB888,
        ImageFormat::BGR888,
        ImageFormat::RGB565,
        ImageFormat::I8,
        ImageFormat::IA88,
        ImageFormat::P8,
        ImageFormat::A8,
        ImageFormat::RGB888_BLUESCREEN,
        ImageFormat::BGR888_BLUESCREEN,
        ImageFormat::ARGB8888,
        ImageFormat::BGRA8888,
        ImageFormat::DXT1,
        ImageFormat::DXT3,
        ImageFormat::DXT5,
        ImageFormat::BGRX8888,
        ImageFormat::BGR565,
        ImageFormat::BGRX5551,
        ImageFormat::BGRA4444,
        ImageFormat::DXT1_ONEBITALPHA,
        ImageFormat::BGRA5551,
        ImageFormat::UV88,
        ImageFormat::UVWQ8888,
        ImageFormat::RGBA16161616F,
        ImageFormat::RGBA16161616,
        ImageFormat::UVLX8888,
        ImageFormat::R32F,
        ImageFormat::RGB323232F,
        ImageFormat::RGBA32323232F,
        ImageFormat::NV_DST16,
        ImageFormat::NV_DST24,
        ImageFormat::NV_INTZ,
        ImageFormat::NV_RAWZ,
        ImageFormat::ATI_DST16,
        ImageFormat::ATI_DST24,
        ImageFormat::NV_NULL,
        ImageFormat::ATI2N,
        ImageFormat::ATI1N,
    ];

    /// Block layout of this format, `None` for [`ImageFormat::NONE`].
    pub const fn info(&self) -> Option<FormatInfo> {
        Some(match self {
            ImageFormat::NONE => return None,
            ImageFormat::RGBA8888
            | ImageFormat::ABGR8888
            | ImageFormat::ARGB8888
            | ImageFormat::BGRA8888
            | ImageFormat::UVWQ8888
            | ImageFormat::UVLX8888 => FormatInfo::pixel(4, true),
            ImageFormat::BGRX8888 => FormatInfo::pixel(4, false),
            ImageFormat::RGB888
            | ImageFormat::BGR888
            | ImageFormat::RGB888_BLUESCREEN
            | ImageFormat::BGR888_BLUESCREEN => FormatInfo::pixel(3, false),
            ImageFormat::RGB565
            | ImageFormat::BGR565
            | ImageFormat::BGRX5551
            | ImageFormat::UV88 => FormatInfo::pixel(2, false),
            ImageFormat::IA88 | ImageFormat::BGRA4444 | ImageFormat::BGRA5551 => {
                FormatInfo::pixel(2, true)
            }
            ImageFormat::I8 | ImageFormat::P8 => FormatInfo::pixel(1, false),
            ImageFormat::A8 => FormatInfo::pixel(1, true),
            ImageFormat::RGBA16161616F | ImageFormat::RGBA16161616 => FormatInfo::pixel(8, true),
            ImageFormat::R32F => FormatInfo::pixel(4, false),
            ImageFormat::RGB323232F => FormatInfo::pixel(12, false),
            ImageFormat::RGBA32323232F => FormatInfo::pixel(16, true),
            ImageFormat::NV_DST16 | ImageFormat::ATI_DST16 => FormatInfo::pixel(2, false),
            ImageFormat::NV_DST24
            | ImageFormat::NV_INTZ
            | ImageFormat::NV_RAWZ
            | ImageFormat::ATI_DST24
            | ImageFormat::NV_NULL => FormatInfo::pixel(4, false),
            ImageFormat::DXT1 => FormatInfo::block(8, false),
            ImageFormat::DXT1_ONEBITALPHA => FormatInfo::block(8, true),
            ImageFormat::DXT3 | ImageFormat::DXT5 => FormatInfo::block(16, true),
            ImageFormat::ATI1N => FormatInfo::block(8, false),
            ImageFormat::ATI2N => FormatInfo::block(16, false),
        })
    }

    /// Whether the pixel codec can convert this format to and from RGBA8888.
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            ImageFormat::NONE
                | ImageFormat::P8
                | ImageFormat::R32F
                | ImageFormat::NV_DST16
                | ImageFormat::NV_DST24
                | ImageFormat::NV_INTZ
                | ImageFormat::NV_RAWZ
                | ImageFormat::ATI_DST16
                | ImageFormat::ATI_DST24
                | ImageFormat::NV_NULL
                | ImageFormat::ATI2N
                | ImageFormat::ATI1N
        )
    }

    pub fn is_compressed(&self) -> bool {
        self.info().map_or(false, |info| info.is_compressed())
    }

    /// Bytes needed to store one `width`×`height` image, padding partial blocks.
    pub fn bytes_for_size(&self, width: u32, height: u32) -> usize {
        let Some(info) = self.info() else {
            return 0;
        };
        let blocks_x = width.div_ceil(info.block_width) as usize;
        let blocks_y = height.div_ceil(info.block_height) as usize;
        blocks_x * blocks_y * info.bytes_per_block as usize
    }

    /// Raw value stored in the header.
    pub fn id(&self) -> i32 {
        *self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        num_traits::FromPrimitive::from_i32(id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::NONE => "NONE",
            ImageFormat::RGBA8888 => "RGBA8888",
            ImageFormat::ABGR8888 => "ABGR8888",
            ImageFormat::RGB888 => "RGB888",
            ImageFormat::BGR888 => "BGR888",
            ImageFormat::RGB565 => "RGB565",
            ImageFormat::I8 => "I8",
            ImageFormat::IA88 => "IA88",
            ImageFormat::P8 => "P8",
            ImageFormat::A8 => "A8",
            ImageFormat::RGB888_BLUESCREEN => "RGB888_BLUESCREEN",
            ImageFormat::BGR888_BLUESCREEN => "BGR888_BLUESCREEN",
            ImageFormat::ARGB8888 => "ARGB8888",
            ImageFormat::BGRA8888 => "BGRA8888",
            ImageFormat::DXT1 => "DXT1",
            ImageFormat::DXT3 => "DXT3",
            ImageFormat::DXT5 => "DXT5",
            ImageFormat::BGRX8888 => "BGRX8888",
            ImageFormat::BGR565 => "BGR565",
            ImageFormat::BGRX5551 => "BGRX5551",
            ImageFormat::BGRA4444 => "BGRA4444",
            ImageFormat::DXT1_ONEBITALPHA => "DXT1_ONEBITALPHA",
            ImageFormat::BGRA5551 => "BGRA5551",
            ImageFormat::UV88 => "UV88",
            ImageFormat::UVWQ8888 => "UVWQ8888",
            ImageFormat::RGBA16161616F => "RGBA16161616F",
            ImageFormat::RGBA16161616 => "RGBA16161616",
            ImageFormat::UVLX8888 => "UVLX8888",
            ImageFormat::R32F => "R32F",
            ImageFormat::RGB323232F => "RGB323232F",
            ImageFormat::RGBA32323232F => "RGBA32323232F",
            ImageFormat::NV_DST16 => "NV_DST16",
            ImageFormat::NV_DST24 => "NV_DST24",
            ImageFormat::NV_INTZ => "NV_INTZ",
            ImageFormat::NV_RAWZ => "NV_RAWZ",
            ImageFormat::ATI_DST16 => "ATI_DST16",
            ImageFormat::ATI_DST24 => "ATI_DST24",
            ImageFormat::NV_NULL => "NV_NULL",
            ImageFormat::ATI2N => "ATI2N",
            ImageFormat::ATI1N => "ATI1N",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = VtfError;

    /// Accepts names with or without the `IMAGE_FORMAT_` prefix, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("IMAGE_FORMAT_").unwrap_or(&upper);
        if name == "NONE" {
            return Ok(ImageFormat::NONE);
        }
        ImageFormat::ALL
            .iter()
            .copied()
            .find(|format| format.name() == name)
            .ok_or_else(|| VtfError::UnsupportedFormat(s.to_owned()))
    }
}

flags! {
    #[repr(u32)]
    pub enum TextureFlags: u32 {
        // Flags from the *.txt config file
        POINTSAMPLE = 0x00000001,
        TRILINEAR = 0x00000002,
        CLAMPS = 0x00000004,
        CLAMPT = 0x00000008,
        ANISOTROPIC = 0x00000010,
        HINTDXT5 = 0x00000020,
        PWLCORRECTED = 0x00000040,
        NORMAL = 0x00000080,
        NOMIP = 0x00000100,
        NOLOD = 0x00000200,
        ALLMIPS = 0x00000400,
        PROCEDURAL = 0x00000800,

        // These are automatically generated by vtex from the texture data.
        ONEBITALPHA = 0x00001000,
        EIGHTBITALPHA = 0x00002000,

        // Newer flags from the *.txt config file
        ENVMAP = 0x00004000,
        RENDERTARGET = 0x00008000,
        DEPTHRENDERTARGET = 0x00010000,
        NODEBUGOVERRIDE = 0x00020000,
        SINGLECOPY = 0x00040000,
        PRESRGB = 0x00080000,

        UNUSED00100000 = 0x00100000,
        UNUSED00200000 = 0x00200000,
        UNUSED00400000 = 0x00400000,

        NODEPTHBUFFER = 0x00800000,

        UNUSED01000000 = 0x01000000,

        CLAMPU = 0x02000000,
        VERTEXTEXTURE = 0x04000000,
        SSBUMP = 0x08000000,

        UNUSED10000000 = 0x10000000,

        BORDER = 0x20000000,

        UNUSED40000000 = 0x40000000,
        UNUSED80000000 = 0x80000000,
    }
}

/// Typed view over raw header flags. Every bit is named, so nothing is dropped.
pub fn texture_flags(bits: u32) -> FlagSet<TextureFlags> {
    FlagSet::new_truncated(bits)
}
