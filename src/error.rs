//! Crate-level error type.

use crate::board::BoardError;
use crate::config::ConfigError;
use crate::eval::AssessError;
use crate::purchase::PurchaseError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Assess(#[from] AssessError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
