use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Contract misuse by the caller. Never recovered internally.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Terminal growth {terminal_growth:.4} must be below discount rate {discount_rate:.4}")]
    TerminalGrowthTooHigh {
        terminal_growth: f64,
        discount_rate: f64,
    },

    #[error("Invalid assumption: {0}")]
    Assumption(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl AnalysisError {
    /// Degenerate or out-of-domain model input.
    pub fn is_assumption(&self) -> bool {
        matches!(
            self,
            AnalysisError::Assumption(_) | AnalysisError::TerminalGrowthTooHigh { .. }
        )
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, AnalysisError::Precondition(_))
    }
}
