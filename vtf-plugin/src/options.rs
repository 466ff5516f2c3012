use common::{EncoderInfo, ParamValue};
use vtf::{ImageFormat, Result, VtfError, WriteOptions};

/// Options the host may pass when saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub texture_format: ImageFormat,
    pub texture_flags: u32,
    pub thumbnail: bool,
    pub mipmaps: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            texture_format: ImageFormat::DXT5,
            texture_flags: 0,
            thumbnail: true,
            mipmaps: true,
        }
    }
}

fn wrong_type(key: &str, expected: &str, value: &ParamValue) -> VtfError {
    VtfError::InvalidOption(format!(
        "{key} expects {expected}, got {}",
        value.type_name()
    ))
}

fn read_bool(info: &EncoderInfo, key: &str, default: bool) -> Result<bool> {
    match info.get(key) {
        None => Ok(default),
        Some(ParamValue::Bool(value)) => Ok(*value),
        Some(other) => Err(wrong_type(key, "bool", other)),
    }
}

impl SaveOptions {
    /// Read `texture_format`, `texture_flags`, `thumbnail` and `mipmaps`.
    /// Missing keys keep their defaults; other keys are ignored.
    pub fn from_encoder_info(info: &EncoderInfo) -> Result<Self> {
        let defaults = Self::default();

        let texture_format = match info.get("texture_format") {
            None => defaults.texture_format,
            Some(ParamValue::Int(id)) => i32::try_from(*id)
                .ok()
                .and_then(ImageFormat::from_id)
                .ok_or_else(|| VtfError::UnsupportedFormat(format!("#{id}")))?,
            Some(ParamValue::Str(name)) => name.parse()?,
            Some(other) => return Err(wrong_type("texture_format", "a format id or name", other)),
        };

        // Hosts with signed integers may hand the high flags over as negatives.
        let texture_flags = match info.get("texture_flags") {
            None => defaults.texture_flags,
            Some(ParamValue::Int(bits)) => u32::try_from(*bits)
                .or_else(|_| i32::try_from(*bits).map(|bits| bits as u32))
                .map_err(|_| {
                    VtfError::InvalidOption(format!("texture_flags {bits} is out of range"))
                })?,
            Some(other) => return Err(wrong_type("texture_flags", "int", other)),
        };

        Ok(Self {
            texture_format,
            texture_flags,
            thumbnail: read_bool(info, "thumbnail", defaults.thumbnail)?,
            mipmaps: read_bool(info, "mipmaps", defaults.mipmaps)?,
        })
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            format: self.texture_format,
            flags: self.texture_flags,
            generate_thumbnail: self.thumbnail,
            generate_mipmaps: self.mipmaps,
            ..Default::default()
        }
    }
}
