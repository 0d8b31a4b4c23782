use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name:   &'static str,
        value:  f64,
        reason: &'static str,
    },

    #[error("Theoretical result undefined for {model}: {reason}")]
    UndefinedTheoreticalResult { model: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        SimError::InvalidParameter { name, value, reason }
    }

    pub(crate) fn undefined(model: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::UndefinedTheoreticalResult {
            model:  model.into(),
            reason: reason.into(),
        }
    }
}

/// Reject NaN, infinities and values at or below zero.
pub(crate) fn require_positive(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() {
        return Err(SimError::invalid(name, value, "must be finite"));
    }
    if value <= 0.0 {
        return Err(SimError::invalid(name, value, "must be > 0"));
    }
    Ok(())
}

/// Reject NaN, infinities and negative values. Zero is allowed.
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() {
        return Err(SimError::invalid(name, value, "must be finite"));
    }
    if value < 0.0 {
        return Err(SimError::invalid(name, value, "must be >= 0"));
    }
    Ok(())
}

/// Reject a combined rate that overflows even though each part is finite.
pub(crate) fn require_finite_total(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() {
        return Err(SimError::invalid(name, value, "sum of rates must be finite"));
    }
    Ok(())
}

pub(crate) fn require_count(name: &'static str, value: u32) -> SimResult<()> {
    if value == 0 {
        return Err(SimError::invalid(name, value as f64, "must be a positive integer"));
    }
    Ok(())
}
