pub use crate::encoder_info::{EncoderInfo, ParamValue};
pub use crate::error::PluginError;
pub use crate::registry::{ImagePlugin, Registry};
pub use crate::vfile::VFile;
