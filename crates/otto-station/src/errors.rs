use thiserror::Error;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("invalid station id")]
    InvalidId,
    #[error("station ticker already running")]
    AlreadyRunning,
    #[error("duplicate station id: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Ticker(#[from] otto_ticker::TickerError),
    #[error(transparent)]
    Messenger(#[from] otto_messenger::MessengerError),
}
