use rocket::http::Status;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] mongodb::error::Error),
}

impl ExchangeError {
    // HTTP katmanı için durum kodu eşlemesi
    pub fn status(&self) -> Status {
        match self {
            ExchangeError::NotFound(_) => Status::NotFound,
            ExchangeError::Forbidden(_) => Status::Forbidden,
            ExchangeError::InvalidState(_) => Status::Conflict,
            ExchangeError::InsufficientFunds => Status::BadRequest,
            ExchangeError::InvalidInput(_) => Status::BadRequest,
            ExchangeError::Conflict(_) => Status::Conflict,
            ExchangeError::Storage(_) => Status::InternalServerError,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
