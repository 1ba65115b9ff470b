use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid server profile: {0}")]
    InvalidServer(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
