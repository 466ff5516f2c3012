//! Image-host adapter for Valve Texture Format files.

pub mod options;
pub mod vtf_image_plugin;

pub use options::SaveOptions;
pub use vtf::{Result, VtfError};
pub use vtf_image_plugin::{
    accept, open, register, save, OpenedImage, VtfImagePlugin, DESCRIPTION, EXTENSION, FORMAT,
};
