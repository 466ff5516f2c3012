pub mod encoder_info;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod vfile;

pub use encoder_info::{EncoderInfo, ParamValue};
pub use error::PluginError;
pub use registry::{ImagePlugin, Registry};
pub use vfile::VFile;
