use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankError {
    /// The mirror directory service could not be reached or returned an
    /// undecodable payload. Fatal: no benchmarking happens without a
    /// candidate list.
    #[error("mirror directory unreachable ({url}): {reason}")]
    DirectoryUnreachable { url: String, reason: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RankError>;
