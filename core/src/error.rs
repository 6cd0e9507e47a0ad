use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Empty input: {context}")]
    EmptyInput { context: String },

    #[error("Insufficient data for {test}: {detail}")]
    InsufficientData { test: String, detail: String },

    #[error("Degenerate variance: both samples have zero variance and different means")]
    DegenerateVariance,

    #[error("Unknown dimension '{name}'")]
    UnknownDimension { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
