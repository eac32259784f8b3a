// [libs/infra/bmp-driver/src/errors.rs]
//! Catalogacion de fallos del canal hacia el BMP.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BmpError {
    #[error("bmp transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bmp call exceeded its deadline")]
    Timeout,

    #[error("bmp rejected the command: {0}")]
    Rejected(String),

    #[error("blacklist payload decoding failed: {0}")]
    DecodingFault(#[from] serde_json::Error),
}
