use axum::http::StatusCode;
use dispenser_core::DispenserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicErrorCode {
    InvalidInput,
    NotFound,
    Conflict,
    Exhausted,
    Internal,
}

impl PublicErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Exhausted => "EXHAUSTED",
            Self::Internal => "INTERNAL",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Exhausted => StatusCode::GONE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&DispenserError> for PublicErrorCode {
    fn from(err: &DispenserError) -> Self {
        match err {
            DispenserError::NotFound(_) => Self::NotFound,
            DispenserError::AlreadyAssigned(_) => Self::Conflict,
            DispenserError::Exhausted => Self::Exhausted,
            DispenserError::NoEligibleTerritory | DispenserError::CatalogLoad(_) => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_errors_map_to_distinct_statuses() {
        let cases = [
            (DispenserError::NotFound(1), StatusCode::NOT_FOUND),
            (DispenserError::AlreadyAssigned(1), StatusCode::CONFLICT),
            (DispenserError::Exhausted, StatusCode::GONE),
            (
                DispenserError::NoEligibleTerritory,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(PublicErrorCode::from(&err).status(), status);
        }
    }
}
