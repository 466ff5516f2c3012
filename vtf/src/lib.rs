pub mod codec;
pub mod error;
pub mod mipmap;
pub mod prelude;
pub mod vtf;

pub use error::{Result, VtfError};
pub use vtf::consts::{ImageFormat, TextureFlags};
pub use vtf::writer::{write, write_single, WriteOptions};
pub use vtf::VTF;
