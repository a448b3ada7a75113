use thiserror::Error;

#[derive(Error, Debug)]
pub enum TickerError {
    #[error("ticker name already in use: {0}")]
    NameInUse(String),
    #[error("unknown ticker: {0}")]
    Unknown(String),
}
