//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid date on row {row}: '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid {column} on row {row}: '{value}'")]
    InvalidAmount {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("No transactions found in input")]
    Empty,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors caused by malformed input data rather than the environment
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::Csv(_)
                | Error::MissingColumn(_)
                | Error::InvalidDate { .. }
                | Error::InvalidAmount { .. }
                | Error::Empty
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
