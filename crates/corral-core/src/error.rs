use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("no such key `{key}` in `{namespace}`")]
    MissingKey { namespace: String, key: String },

    #[error("`{fqn}` is not under namespace `{namespace}`")]
    InvalidMembership { namespace: String, fqn: String },

    #[error("type dependency graph is not a DAG: cycle through `{fqn}`")]
    CycleDetected { fqn: String },

    #[error("`{referrer}` depends on `{fqn}`, which is not in the graph")]
    UndefinedReference { referrer: String, fqn: String },

    #[error("malformed wire payload: {0}")]
    MalformedPayload(String),

    #[error("wire serialization error: {0}")]
    Wire(#[from] serde_json::Error),
}
