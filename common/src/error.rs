use std::{error::Error, io};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("no registered plugin recognises {0:?}")]
    UnknownFormat(String),
    #[error("no save handler for {0:?}")]
    NoSaveHandler(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(Box<dyn Error + Send + Sync>),
}

impl PluginError {
    pub fn codec(err: impl Error + Send + Sync + 'static) -> Self {
        PluginError::Codec(Box::new(err))
    }
}
