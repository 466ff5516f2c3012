use std::{io::Write, sync::Arc};

use ahash::AHashMap;
use image::DynamicImage;

use crate::{EncoderInfo, PluginError, VFile};

/// Bytes handed to [`ImagePlugin::accept`].
pub const SNIFF_LEN: usize = 16;

/// A codec the host can open and save images through.
pub trait ImagePlugin: Send + Sync {
    /// Short identifier, e.g. `"VTF"`.
    fn format(&self) -> &str;
    fn description(&self) -> &str;
    /// Must not fail; a short or foreign prefix is simply rejected.
    fn accept(&self, prefix: &[u8]) -> bool;
    fn open(&self, data: &[u8]) -> Result<DynamicImage, PluginError>;
    fn save(&self, image: &DynamicImage, info: &EncoderInfo) -> Result<Vec<u8>, PluginError>;
}

#[derive(Default, Clone)]
pub struct Registry {
    openers: Vec<Arc<dyn ImagePlugin>>,
    savers: AHashMap<String, Arc<dyn ImagePlugin>>,
    extensions: AHashMap<String, String>,
}

fn normalise_extension(extension: &str) -> String {
    let extension = extension.to_ascii_lowercase();
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{extension}")
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_open(&mut self, plugin: Arc<dyn ImagePlugin>) {
        self.openers.push(plugin);
    }

    pub fn register_save(&mut self, plugin: Arc<dyn ImagePlugin>) {
        self.savers.insert(plugin.format().to_string(), plugin);
    }

    pub fn register_extension(&mut self, format: &str, extension: &str) {
        self.extensions
            .insert(normalise_extension(extension), format.to_string());
    }

    /// Registered extensions and the format each maps to.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extensions
            .iter()
            .map(|(ext, format)| (ext.as_str(), format.as_str()))
    }

    pub fn format_for_extension(&self, extension: &str) -> Option<&str> {
        self.extensions
            .get(&normalise_extension(extension))
            .map(String::as_str)
    }

    /// Decode with the first plugin that recognises the file.
    pub fn open(&self, file: &VFile) -> Result<DynamicImage, PluginError> {
        let prefix = file.prefix(SNIFF_LEN)?;
        match self.openers.iter().find(|plugin| plugin.accept(&prefix)) {
            Some(plugin) => {
                log::debug!("opening {:?} as {}", file.name, plugin.format());
                plugin.open(&file.data)
            }
            None => {
                log::error!("{:?} matches no registered format", file.name);
                Err(PluginError::UnknownFormat(file.name.clone()))
            }
        }
    }

    /// Encode into `file` using the plugin registered for its extension.
    pub fn save(
        &self,
        image: &DynamicImage,
        file: &mut VFile,
        info: &EncoderInfo,
    ) -> Result<(), PluginError> {
        let plugin = file
            .extension()
            .and_then(|ext| self.extensions.get(&ext))
            .and_then(|format| self.savers.get(format))
            .ok_or_else(|| PluginError::NoSaveHandler(file.name.clone()))?;

        let data = plugin.save(image, info)?;
        log::debug!(
            "saved {:?} as {} ({} bytes)",
            file.name,
            plugin.format(),
            data.len()
        );
        file.write_all(&data)?;
        Ok(())
    }
}
