use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input `{0}`")]
    InvalidInput(String),

    #[error("primary unavailable `{0}`")]
    PrimaryUnavailable(String),

    #[error("primary failed with `{primary}`, backup failed with `{backup}`")]
    BothPathsFailed { primary: String, backup: String },

    #[error("subscription {0} dropped a delivery")]
    SubscriptionDropped(Uuid),

    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
