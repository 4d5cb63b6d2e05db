use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlateError>;

#[derive(Debug, Error)]
pub enum PlateError {
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("ocr engine: {0}")]
    Ocr(String),

    #[error("registry: {0}")]
    Registry(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error("notifier: {0}")]
    Notifier(#[from] std::io::Error),

    #[error("acquisition: {0}")]
    Acquisition(String),
}

impl From<mongodb::error::Error> for PlateError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::Registry(e.to_string())
    }
}
