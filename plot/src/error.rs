pub type PlotResult<T> = Result<T, PlotError>;

#[derive(thiserror::Error, Debug)]
pub enum PlotError {
    #[error("viewport must be at least 1x1 pixels, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },

    #[error("scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    #[error("invalid zoom settings: {0}")]
    InvalidZoom(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PlotError {
    pub fn zoom(msg: impl Into<String>) -> Self {
        Self::InvalidZoom(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
