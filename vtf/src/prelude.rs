pub use crate::error::{check_dimensions, Result, VtfError};
pub use crate::vtf::{
    consts::{texture_flags, FormatInfo, ImageFormat, TextureFlags},
    has_signature,
    header::{ResourceEntryInfo, VTFHeader, VTFHeaderExt},
    writer::{write, write_single, WriteOptions},
    ImageLevel, VTF,
};
