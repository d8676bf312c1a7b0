use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Adx402(#[from] adx402::Adx402Error),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PRIVATE_KEY environment variable is required")]
    MissingPrivateKey,
}

impl CliError {
    /// Text shown to the user on failure.
    pub fn user_message(&self) -> String {
        match self {
            CliError::Adx402(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
