use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("composition arity must be at least 1, got {0}")]
    InvalidArity(usize),

    #[error("composition key sequence has {found} keys, table arity is {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("composition result is empty")]
    EmptyResult,

    #[error("unknown key name: {0}")]
    UnknownKeyName(String),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input injection failed: {0}")]
    Injection(String),

    #[error("cancel key {0:#04X} does not type a character and could never abort a composition")]
    CancelKeyNotCharacter(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
