use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable {name}: {hint}")]
    MissingVariable { name: String, hint: String },

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

impl Error {
    pub(crate) fn missing(name: &str, hint: &str) -> Self {
        Error::MissingVariable {
            name: name.to_string(),
            hint: hint.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
