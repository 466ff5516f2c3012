// Valve Texture File

pub mod consts;
pub mod header;
pub mod writer;

use std::{fmt, mem, ops::Range};

use flagset::FlagSet;
use glam::Vec3;
use image::RgbaImage;

use crate::codec;
use crate::error::{is_power_of_two, Result, VtfError};
use crate::mipmap;

use self::consts::{texture_flags, ImageFormat, TextureFlags};
use self::header::{
    ResourceEntryInfo, VTFHeader, VTFHeaderExt, BASE_HEADER_SIZE, EXT_HEADER_SIZE, SIGNATURE,
    TAG_HIGH_RES, TAG_LOW_RES,
};

pub const MAJOR_VERSION: u32 = 7;
pub const MAX_MINOR_VERSION: u32 = 5;

/// Whether `data` starts with the VTF signature.
pub fn has_signature(data: &[u8]) -> bool {
    data.len() >= SIGNATURE.len() && data[..SIGNATURE.len()] == SIGNATURE
}

/// One image inside the high-res block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageLevel {
    pub frame: u32,
    pub face: u32,
    pub slice: u32,
    pub mip: u32,
    pub width: u32,
    pub height: u32,
    /// Absolute offset into the file.
    pub offset: usize,
    pub length: usize,
}

impl ImageLevel {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }
}

/// A parsed VTF file. Owns the encoded bytes; images are decoded on request.
pub struct VTF {
    header: VTFHeader,
    header_ext: Option<VTFHeaderExt>,
    resources: Vec<ResourceEntryInfo>,
    format: ImageFormat,
    low_res_format: Option<ImageFormat>,
    low_res: Option<Range<usize>>,
    high_res: Range<usize>,
    faces: u32,
    data: Vec<u8>,
}

impl fmt::Debug for VTF {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ".vtf: {:?}", self.header)?;
        write!(f, " ext: {:?}", self.header_ext)?;
        write!(f, " resources: {:?}", self.resources)
    }
}

fn read_pod<T: bytemuck::Pod>(data: &[u8], offset: usize) -> Result<T> {
    let end = offset + mem::size_of::<T>();
    let bytes = data.get(offset..end).ok_or_else(|| {
        VtfError::MalformedData(format!(
            "{} bytes needed at offset {offset}, buffer holds {}",
            mem::size_of::<T>(),
            data.len()
        ))
    })?;
    Ok(bytemuck::pod_read_unaligned(bytes))
}

fn checked_range(start: usize, len: usize, total: usize, what: &str) -> Result<Range<usize>> {
    match start.checked_add(len) {
        Some(end) if end <= total => Ok(start..end),
        _ => Err(VtfError::MalformedData(format!(
            "{what} needs bytes {start}..{} but the buffer holds {total}",
            start.saturating_add(len)
        ))),
    }
}

impl VTF {
    /// Parse a copy of `data`.
    pub fn read(data: &[u8]) -> Result<Self> {
        Self::from_bytes(data.to_vec())
    }

    /// Parse and take ownership of `data`.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < BASE_HEADER_SIZE {
            return Err(VtfError::MalformedData(format!(
                "{} bytes is too short for a VTF header",
                data.len()
            )));
        }
        if !has_signature(&data) {
            return Err(VtfError::malformed("missing VTF signature"));
        }

        let header = read_pod::<VTFHeader>(&data, 0)?.swap_le();
        let (major, minor) = header.version();
        if major != MAJOR_VERSION || minor > MAX_MINOR_VERSION {
            return Err(VtfError::UnsupportedVersion { major, minor });
        }

        let header_size = header.header_size as usize;
        let min_header = if minor >= 2 {
            EXT_HEADER_SIZE
        } else {
            BASE_HEADER_SIZE
        };
        if header_size < min_header || header_size > data.len() {
            return Err(VtfError::MalformedData(format!(
                "header size {header_size} outside {min_header}..={}",
                data.len()
            )));
        }

        let header_ext = if minor >= 2 {
            Some(read_pod::<VTFHeaderExt>(&data, BASE_HEADER_SIZE)?.swap_le())
        } else {
            None
        };

        let width = header.width as u32;
        let height = header.height as u32;
        if !is_power_of_two(width) || !is_power_of_two(height) {
            return Err(VtfError::InvalidDimensions { width, height });
        }
        let depth = header_ext.map_or(1, |ext| ext.depth.max(1) as u32);
        if !is_power_of_two(depth) {
            return Err(VtfError::MalformedData(format!("depth {depth} is not a power of two")));
        }

        let max_mips = mipmap::level_count(width.max(depth), height);
        let mip_count = header.mipmap_count as u32;
        if mip_count == 0 || mip_count > max_mips {
            return Err(VtfError::MalformedData(format!(
                "{mip_count} mipmaps declared, {width}x{height}x{depth} allows 1..={max_mips}"
            )));
        }
        if header.frames == 0 {
            return Err(VtfError::malformed("frame count is zero"));
        }

        let format = match header.high_res_format() {
            Some(format) if format.is_supported() => format,
            Some(format) => return Err(VtfError::UnsupportedFormat(format.to_string())),
            None => {
                let id = header.high_res_image_format;
                return Err(VtfError::UnsupportedFormat(format!("#{id}")));
            }
        };

        let has_thumbnail = header.low_res_image_width > 0 && header.low_res_image_height > 0;
        let low_res_format = if has_thumbnail {
            match header.low_res_format() {
                Some(format) if format.is_supported() => Some(format),
                Some(format) => return Err(VtfError::UnsupportedFormat(format.to_string())),
                None => {
                    let id = header.low_res_image_format;
                    return Err(VtfError::UnsupportedFormat(format!("#{id}")));
                }
            }
        } else {
            None
        };

        let flags = texture_flags(header.flags);
        let faces = if flags.contains(TextureFlags::ENVMAP) {
            if minor < 5 && header.first_frame == 0xFFFF {
                7
            } else {
                6
            }
        } else {
            1
        };

        let mut vtf = Self {
            header,
            header_ext,
            resources: Vec::new(),
            format,
            low_res_format,
            low_res: None,
            high_res: 0..0,
            faces,
            data,
        };

        let high_res_len = vtf.high_res_size()?;
        let low_res_len = vtf.low_res_size();

        let (low_res_start, high_res_start) = if minor >= 3 {
            vtf.read_resources()?;
            let low = vtf
                .find_resource(TAG_LOW_RES)
                .filter(|entry| entry.has_data())
                .map(|entry| entry.offset as usize);
            let high = vtf
                .find_resource(TAG_HIGH_RES)
                .filter(|entry| entry.has_data())
                .map(|entry| entry.offset as usize)
                .ok_or_else(|| VtfError::malformed("no high-res image resource"))?;
            (low, high)
        } else {
            let thumbnail_end = header_size + low_res_len;
            (has_thumbnail.then_some(header_size), thumbnail_end)
        };

        if let (Some(start), true) = (low_res_start, has_thumbnail) {
            vtf.low_res = Some(checked_range(start, low_res_len, vtf.data.len(), "thumbnail")?);
        }
        vtf.high_res = checked_range(high_res_start, high_res_len, vtf.data.len(), "image data")?;

        if let Some(low) = &vtf.low_res {
            if low.start < vtf.high_res.end && vtf.high_res.start < low.end {
                return Err(VtfError::malformed("thumbnail overlaps image data"));
            }
        }

        log::debug!(
            "vtf {major}.{minor} {width}x{height}x{depth} {format} mips={mip_count} frames={} faces={faces} flags={:#010x}",
            vtf.frame_count(),
            vtf.flags_bits(),
        );

        Ok(vtf)
    }

    fn read_resources(&mut self) -> Result<()> {
        let count = self.header_ext.map_or(0, |ext| ext.num_resources) as usize;
        let header_size = self.header.header_size as usize;
        let entry_size = mem::size_of::<ResourceEntryInfo>();
        let directory_end = count
            .checked_mul(entry_size)
            .and_then(|len| len.checked_add(EXT_HEADER_SIZE))
            .filter(|end| *end <= header_size)
            .ok_or_else(|| {
                VtfError::MalformedData(format!(
                    "{count} resource entries do not fit in a {header_size} byte header"
                ))
            })?;

        self.resources.reserve(count);
        for i in 0..count {
            let entry = read_pod::<ResourceEntryInfo>(&self.data, EXT_HEADER_SIZE + i * entry_size)?
                .swap_le();
            if !entry.is_known() {
                log::warn!("Skipping unknown resource tag {:?}", entry.tag);
            }
            self.resources.push(entry);
        }

        let remaining_header = header_size - directory_end;
        if remaining_header > 0 {
            log::warn!(
                "Not all header has been read, skipping {} bytes",
                remaining_header
            );
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.header.width as u32
    }
    pub fn height(&self) -> u32 {
        self.header.height as u32
    }
    pub fn depth(&self) -> u32 {
        self.header_ext.map_or(1, |ext| ext.depth.max(1) as u32)
    }
    pub fn version(&self) -> (u32, u32) {
        self.header.version()
    }
    pub fn header(&self) -> &VTFHeader {
        &self.header
    }
    pub fn header_ext(&self) -> Option<&VTFHeaderExt> {
        self.header_ext.as_ref()
    }
    pub fn format(&self) -> ImageFormat {
        self.format
    }
    /// Raw flag bits exactly as stored.
    pub fn flags_bits(&self) -> u32 {
        self.header.flags
    }
    pub fn flags(&self) -> FlagSet<TextureFlags> {
        texture_flags(self.header.flags)
    }
    pub fn frame_count(&self) -> u32 {
        self.header.frames as u32
    }
    pub fn first_frame(&self) -> u16 {
        self.header.first_frame
    }
    pub fn face_count(&self) -> u32 {
        self.faces
    }
    pub fn mipmap_count(&self) -> u32 {
        self.header.mipmap_count as u32
    }
    pub fn reflectivity(&self) -> Vec3 {
        self.header.reflectivity()
    }
    pub fn bumpmap_scale(&self) -> f32 {
        self.header.bumpmap_scale
    }
    pub fn low_res_format(&self) -> Option<ImageFormat> {
        self.low_res_format
    }
    pub fn low_res_width(&self) -> u32 {
        self.header.low_res_image_width as u32
    }
    pub fn low_res_height(&self) -> u32 {
        self.header.low_res_image_height as u32
    }
    pub fn resources(&self) -> &[ResourceEntryInfo] {
        &self.resources
    }
    /// The full encoded file.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn find_resource(&self, tag: [u8; 3]) -> Option<&ResourceEntryInfo> {
        self.resources.iter().find(|entry| entry.tag == tag)
    }

    /// Payload of a resource. Image resources return their image block.
    /// Other data-bearing entries point at a `u32` length followed by that
    /// many bytes (the KVD/particle layout); entries flagged as carrying no
    /// data return their inline four-byte value.
    pub fn resource_data(&self, tag: [u8; 3]) -> Result<Option<&[u8]>> {
        let Some((index, entry)) = self
            .resources
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.tag == tag)
        else {
            return Ok(None);
        };
        match tag {
            TAG_HIGH_RES => return Ok(Some(&self.data[self.high_res.clone()])),
            TAG_LOW_RES => return Ok(self.low_res.clone().map(|range| &self.data[range])),
            _ => {}
        }
        if !entry.has_data() {
            let start = EXT_HEADER_SIZE + index * mem::size_of::<ResourceEntryInfo>() + 4;
            return Ok(Some(&self.data[start..start + 4]));
        }
        let offset = entry.offset as usize;
        let len = u32::from_le(read_pod::<u32>(&self.data, offset)?) as usize;
        let range = checked_range(offset + 4, len, self.data.len(), "resource")?;
        Ok(Some(&self.data[range]))
    }

    fn mip_dimensions(&self, mip: u32) -> (u32, u32, u32) {
        let (w, h) = mipmap::level_dimensions(self.width(), self.height(), mip);
        let d = self.depth().checked_shr(mip).unwrap_or(0).max(1);
        (w, h, d)
    }

    /// Bytes of one whole mip level: every frame, face and slice.
    fn mip_size(&self, mip: u32) -> Option<usize> {
        let (w, h, d) = self.mip_dimensions(mip);
        codec::level_size(self.format, w, h)
            .checked_mul(d as usize)?
            .checked_mul(self.faces as usize)?
            .checked_mul(self.frame_count() as usize)
    }

    /// Total bytes of mips `from..mipmap_count`.
    fn mips_size(&self, from: u32) -> Result<usize> {
        (from..self.mipmap_count())
            .try_fold(0usize, |total, mip| total.checked_add(self.mip_size(mip)?))
            .ok_or_else(|| {
                VtfError::MalformedData(format!(
                    "image data size overflows for {}x{}x{} {} with {} frames",
                    self.width(),
                    self.height(),
                    self.depth(),
                    self.format,
                    self.frame_count()
                ))
            })
    }

    fn high_res_size(&self) -> Result<usize> {
        self.mips_size(0)
    }

    fn low_res_size(&self) -> usize {
        self.low_res_format.map_or(0, |format| {
            codec::level_size(format, self.low_res_width(), self.low_res_height())
        })
    }

    /// Locate one image. Mips are stored smallest first, then frames, faces
    /// and slices.
    pub fn level(&self, frame: u32, face: u32, slice: u32, mip: u32) -> Result<ImageLevel> {
        let (width, height, depth) = self.mip_dimensions(mip);
        if frame >= self.frame_count()
            || face >= self.faces
            || slice >= depth
            || mip >= self.mipmap_count()
        {
            return Err(VtfError::MalformedData(format!(
                "no image at frame {frame} face {face} slice {slice} mip {mip}"
            )));
        }

        let smaller = self.mips_size(mip + 1)?;
        let length = codec::level_size(self.format, width, height);
        let index = (frame as usize * self.faces as usize + face as usize) * depth as usize
            + slice as usize;
        let offset = self.high_res.start + smaller + index * length;

        log::trace!("level f{frame} c{face} s{slice} m{mip} at {offset}+{length}");

        Ok(ImageLevel {
            frame,
            face,
            slice,
            mip,
            width,
            height,
            offset,
            length,
        })
    }

    pub fn level_data(&self, level: &ImageLevel) -> &[u8] {
        &self.data[level.range()]
    }

    pub fn decode_level(&self, level: &ImageLevel) -> Result<RgbaImage> {
        codec::decode(
            self.format,
            self.level_data(level),
            level.width,
            level.height,
        )
    }

    pub fn decode(&self, frame: u32, face: u32, mip: u32) -> Result<RgbaImage> {
        self.decode_slice(frame, face, 0, mip)
    }

    pub fn decode_slice(&self, frame: u32, face: u32, slice: u32, mip: u32) -> Result<RgbaImage> {
        let level = self.level(frame, face, slice, mip)?;
        self.decode_level(&level)
    }

    /// Largest mip of the first frame and face.
    pub fn decode_base(&self) -> Result<RgbaImage> {
        self.decode(0, 0, 0)
    }

    pub fn thumbnail(&self) -> Result<Option<RgbaImage>> {
        let (Some(format), Some(range)) = (self.low_res_format, self.low_res.clone()) else {
            return Ok(None);
        };
        codec::decode(
            format,
            &self.data[range],
            self.low_res_width(),
            self.low_res_height(),
        )
        .map(Some)
    }
}
