/// Errors that can occur during envelope encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is not valid JSON or does not match the expected shape.
    #[error("envelope json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request parameters did not serialize to a JSON object.
    #[error("request params must be a JSON object, got {0}")]
    ParamsNotObject(&'static str),
}

pub type Result<T> = std::result::Result<T, FrameError>;
