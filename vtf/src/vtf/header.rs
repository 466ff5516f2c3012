use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::consts::ImageFormat;

pub const SIGNATURE: [u8; 4] = *b"VTF\0";

/// Size of the fields every version carries.
pub const BASE_HEADER_SIZE: usize = std::mem::size_of::<VTFHeader>();
/// 7.2+ header, padded to 16 bytes. Resource entries start here on 7.3+.
pub const EXT_HEADER_SIZE: usize = BASE_HEADER_SIZE + std::mem::size_of::<VTFHeaderExt>();
/// 7.0 and 7.1 pad the base header to 16 bytes.
pub const LEGACY_HEADER_SIZE: usize = 64;

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VTFHeader {
    pub signature: [u8; 4], // File signature ("VTF\0"). (or as little-endian integer, 0x00465456)
    pub version: [u32; 2],  // version[0].version[1]
    pub header_size: u32, // Size of the header struct (16 byte aligned) + size of the resources dictionary (7.3+).
    pub width: u16,       // Width of the largest mipmap in pixels. Must be a power of 2.
    pub height: u16,      // Height of the largest mipmap in pixels. Must be a power of 2.
    pub flags: u32,       // VTF flags.
    pub frames: u16,      // Number of frames, if animated (1 for no animation).
    pub first_frame: u16, // First frame in animation (0 based). Can be -1 in environment maps older than 7.5, meaning there are 7 faces, not 6.
    pub padding0: [u8; 4], // reflectivity padding (16 byte alignment).
    pub reflectivity: [f32; 3], // reflectivity vector.
    pub padding1: [u8; 4], // reflectivity padding (8 byte packing).
    pub bumpmap_scale: f32, // Bumpmap scale.
    pub high_res_image_format: i32, // High resolution image format.
    pub mipmap_count: u8, // Number of mipmaps.
    pub low_res_image_format: i32, // Low resolution image format (always DXT1).
    pub low_res_image_width: u8, // Low resolution image width.
    pub low_res_image_height: u8, // Low resolution image height.
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VTFHeaderExt {
    // 7.2+
    pub depth: u16, // Depth of the largest mipmap in pixels. Must be a power of 2. Is 1 for a 2D texture.

    // 7.3+
    pub padding2: [u8; 3],  // depth padding (4 byte alignment).
    pub num_resources: u32, // Number of resources this vtf has. The max appears to be 32.

    pub padding3: [u8; 8], // Necessary on certain compilers
}

///Tags
///    { '\x01', '\0', '\0' } - Low-res (thumbnail) image data.
///    { '\x30', '\0', '\0' } - High-res image data.
///    { '\x10', '\0', '\0' } - Animated particle sheet data.
///    { 'C', 'R', 'C' } - CRC data.
///    { 'L', 'O', 'D' } - Texture LOD control information.
///    { 'T', 'S', 'O' } - Game-defined "extended" VTF flags.
///    { 'K', 'V', 'D' } - Arbitrary KeyValues data.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct ResourceEntryInfo {
    pub tag: [u8; 3], // A three-byte "tag" that identifies what this resource is.
    pub flags: u8, // Resource entry flags. The only known flag is 0x2, which indicates that no data chunk corresponds to this resource.
    pub offset: u32, // The offset of this resource's data in the file.
}

pub const TAG_LOW_RES: [u8; 3] = [0x01, 0, 0];
pub const TAG_HIGH_RES: [u8; 3] = [0x30, 0, 0];
pub const TAG_PARTICLE_SHEET: [u8; 3] = [0x10, 0, 0];
pub const TAG_CRC: [u8; 3] = *b"CRC";
pub const TAG_LOD: [u8; 3] = *b"LOD";
pub const TAG_TSO: [u8; 3] = *b"TSO";
pub const TAG_KVD: [u8; 3] = *b"KVD";

pub const RESOURCE_NO_DATA: u8 = 0x2;

impl ResourceEntryInfo {
    pub fn new(tag: [u8; 3], offset: u32) -> Self {
        Self {
            tag,
            flags: 0,
            offset,
        }
    }

    pub fn has_data(&self) -> bool {
        self.flags & RESOURCE_NO_DATA == 0
    }

    pub fn is_known(&self) -> bool {
        matches!(
            self.tag,
            TAG_LOW_RES | TAG_HIGH_RES | TAG_PARTICLE_SHEET | TAG_CRC | TAG_LOD | TAG_TSO | TAG_KVD
        )
    }

    pub(crate) fn swap_le(self) -> Self {
        Self {
            offset: u32::from_le(self.offset),
            ..self
        }
    }
}

fn f32_le(v: f32) -> f32 {
    f32::from_bits(u32::from_le(v.to_bits()))
}

impl VTFHeader {
    pub fn version(&self) -> (u32, u32) {
        let version = self.version;
        (version[0], version[1])
    }

    pub fn reflectivity(&self) -> Vec3 {
        let reflectivity = self.reflectivity;
        Vec3::from_array(reflectivity)
    }

    pub fn high_res_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_id(self.high_res_image_format)
    }

    pub fn low_res_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_id(self.low_res_image_format)
    }

    /// Converts between the on-disk little-endian layout and native order.
    /// The conversion is its own inverse.
    pub(crate) fn swap_le(self) -> Self {
        let version = self.version;
        let reflectivity = self.reflectivity;
        Self {
            signature: self.signature,
            version: [u32::from_le(version[0]), u32::from_le(version[1])],
            header_size: u32::from_le(self.header_size),
            width: u16::from_le(self.width),
            height: u16::from_le(self.height),
            flags: u32::from_le(self.flags),
            frames: u16::from_le(self.frames),
            first_frame: u16::from_le(self.first_frame),
            padding0: self.padding0,
            reflectivity: reflectivity.map(f32_le),
            padding1: self.padding1,
            bumpmap_scale: f32_le(self.bumpmap_scale),
            high_res_image_format: i32::from_le(self.high_res_image_format),
            mipmap_count: self.mipmap_count,
            low_res_image_format: i32::from_le(self.low_res_image_format),
            low_res_image_width: self.low_res_image_width,
            low_res_image_height: self.low_res_image_height,
        }
    }
}

impl VTFHeaderExt {
    pub(crate) fn swap_le(self) -> Self {
        Self {
            depth: u16::from_le(self.depth),
            num_resources: u32::from_le(self.num_resources),
            ..self
        }
    }
}
