use std::sync::Arc;

use common::{EncoderInfo, ImagePlugin, PluginError, Registry};
use image::DynamicImage;
use vtf::error::check_dimensions;
use vtf::vtf::has_signature;
use vtf::{Result, VtfError, VTF};

use crate::SaveOptions;

pub const FORMAT: &str = "VTF";
pub const DESCRIPTION: &str = "Valve Texture Format";
pub const EXTENSION: &str = ".vtf";

/// The largest mip of the first frame, as handed to the host.
#[derive(Debug, Clone)]
pub struct OpenedImage {
    pub width: u32,
    pub height: u32,
    pub image: DynamicImage,
}

/// Whether `prefix` starts with the VTF signature. Never fails.
pub fn accept(prefix: &[u8]) -> bool {
    has_signature(prefix)
}

pub fn open(data: &[u8]) -> Result<OpenedImage> {
    let vtf = VTF::read(data)?;
    let image = vtf.decode_base()?;

    Ok(OpenedImage {
        width: vtf.width(),
        height: vtf.height(),
        image: DynamicImage::ImageRgba8(image),
    })
}

/// Encode an RGBA8 image. Other pixel modes are refused rather than converted.
///
/// Flags are stored as given, except that `ENVMAP` (0x4000) makes the file a
/// six-face cube map: a single image saved with it fails with
/// [`VtfError::InvalidOption`].
pub fn save(image: &DynamicImage, options: &SaveOptions) -> Result<Vec<u8>> {
    let DynamicImage::ImageRgba8(rgba) = image else {
        return Err(VtfError::UnsupportedMode(format!("{:?}", image.color())));
    };
    check_dimensions(rgba.width(), rgba.height())?;

    vtf::write_single(rgba, &options.write_options())
}

#[derive(Default)]
pub struct VtfImagePlugin;

impl ImagePlugin for VtfImagePlugin {
    fn format(&self) -> &str {
        FORMAT
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn accept(&self, prefix: &[u8]) -> bool {
        accept(prefix)
    }

    fn open(&self, data: &[u8]) -> std::result::Result<DynamicImage, PluginError> {
        open(data)
            .map(|opened| opened.image)
            .map_err(PluginError::codec)
    }

    fn save(
        &self,
        image: &DynamicImage,
        info: &EncoderInfo,
    ) -> std::result::Result<Vec<u8>, PluginError> {
        let options = SaveOptions::from_encoder_info(info).map_err(PluginError::codec)?;
        save(image, &options).map_err(PluginError::codec)
    }
}

/// Register open and save handlers plus the `.vtf` extension.
pub fn register(registry: &mut Registry) {
    let plugin: Arc<dyn ImagePlugin> = Arc::new(VtfImagePlugin);
    registry.register_open(plugin.clone());
    registry.register_save(plugin);
    registry.register_extension(FORMAT, EXTENSION);

    log::info!("Registered {} ({}) for {}", FORMAT, DESCRIPTION, EXTENSION);
}
