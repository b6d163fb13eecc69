use crate::*;

/// Reasons a tabular model description is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No states or no actions.
    Empty,
    /// A table does not match the declared state and action counts.
    Shape(&'static str),
    /// Discount outside `(0, 1)`.
    Discount(Utility),
    /// A non-terminal transition row with negative entries or mass other than one.
    Row { state: State, action: Action, mass: Probability },
    /// A terminal marker pointing past the last state.
    Terminal(State),
    /// Malformed JSON.
    Json(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "model needs at least one state and one action"),
            Self::Shape(table) => write!(f, "{} table does not match states × actions", table),
            Self::Discount(gamma) => write!(f, "discount {} outside (0, 1)", gamma),
            Self::Row { state, action, mass } => write!(
                f,
                "transition row T({}, {}, ·) has mass {} (expected 1, all entries ≥ 0)",
                state, action, mass
            ),
            Self::Terminal(state) => write!(f, "terminal state {} out of range", state),
            Self::Json(reason) => write!(f, "invalid model json: {}", reason),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
