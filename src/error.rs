use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Resource not found: {kind} {name} in namespace {namespace}")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("Resource already exists: {kind} {name} in namespace {namespace}")]
    AlreadyExists {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{kind} {name} is invalid: {message}")]
    Invalid {
        kind: String,
        name: String,
        message: String,
    },

    #[error("Field {field} is immutable")]
    ImmutableField { field: String },

    #[error("too old resource version: {0}")]
    Expired(String),

    #[error("the server could not find the requested resource ({group}/{version}, Resource={resource})")]
    ResourceNotRegistered {
        group: String,
        version: String,
        resource: String,
    },

    #[error("Index {field} not registered for {kind}")]
    IndexNotFound { kind: String, field: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON patch error: {0}")]
    PatchError(#[from] json_patch::PatchError),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Failed to access object metadata: {0}")]
    MetadataError(String),
}

impl Error {
    /// HTTP status code the API server answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } | Error::ResourceNotRegistered { .. } => 404,
            Error::AlreadyExists { .. } | Error::Conflict(_) => 409,
            Error::Invalid { .. } | Error::ImmutableField { .. } => 422,
            Error::Expired(_) => 410,
            Error::InvalidRequest(_)
            | Error::IndexNotFound { .. }
            | Error::SerializationError(_)
            | Error::PatchError(_)
            | Error::MetadataError(_) => 400,
            Error::Kube(kube::Error::Api(ae)) => ae.code,
            Error::Kube(_) | Error::Internal(_) => 500,
        }
    }

    /// Machine-readable `Status.reason`.
    pub fn reason(&self) -> &str {
        match self {
            Error::NotFound { .. } | Error::ResourceNotRegistered { .. } => "NotFound",
            Error::AlreadyExists { .. } => "AlreadyExists",
            Error::Conflict(_) => "Conflict",
            Error::Invalid { .. } | Error::ImmutableField { .. } => "Invalid",
            Error::Expired(_) => "Expired",
            Error::InvalidRequest(_)
            | Error::IndexNotFound { .. }
            | Error::SerializationError(_)
            | Error::PatchError(_)
            | Error::MetadataError(_) => "BadRequest",
            Error::Kube(kube::Error::Api(ae)) => &ae.reason,
            Error::Kube(_) | Error::Internal(_) => "InternalError",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == 409
    }

    /// Body of the `Status` object returned to API clients.
    pub fn to_status(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": self.to_string(),
            "reason": self.reason(),
            "code": self.status_code(),
        })
    }
}
