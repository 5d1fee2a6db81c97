use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color name specified: {0}")]
    UnknownName(String),
    #[error("invalid color constant specified: {0}")]
    UnknownId(u32),
}
