use thiserror::Error;

use crate::territory::TerritoryId;

pub type DispenserResult<T> = Result<T, DispenserError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispenserError {
    #[error("territory {0} not found")]
    NotFound(TerritoryId),

    #[error("territory {0} is already assigned")]
    AlreadyAssigned(TerritoryId),

    #[error("all territories assigned")]
    Exhausted,

    #[error("no eligible territory despite remaining capacity")]
    NoEligibleTerritory,

    #[error("catalog load failed: {0}")]
    CatalogLoad(String),
}
