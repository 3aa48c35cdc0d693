#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing --s3 or --profile argument")]
    Usage,
    #[error("failed to find the {profile} profile: {message}")]
    Profile { profile: String, message: String },
    #[error("failed to create temporary file: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ffmpeg process exited with {status}: {stderr}")]
    Encoder {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("error encountered on server during {operation}: '{message}'")]
    Service {
        operation: &'static str,
        message: String,
    },
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    #[error("failed to delete temporary file {}: {source}", .path.display())]
    Cleanup {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn from_rusoto<E>(operation: &'static str, e: rusoto_core::RusotoError<E>) -> Self
    where
        E: std::error::Error + 'static,
    {
        match e {
            rusoto_core::RusotoError::Service(e) => Error::Service {
                operation,
                message: e.to_string(),
            },
            rusoto_core::RusotoError::Unknown(response) => Error::Service {
                operation,
                message: format!("HTTP {}: {}", response.status, response.body_as_str()),
            },
            e => Error::Upload(format!("{} failed: {}", operation, e)),
        }
    }
}
