/// Errors raised by the newsdesk client and tool server.
///
/// Startup failures (`Configuration`, `Connection`) end the process. Failures
/// inside a single query (`Inference`, `ExhaustedRetries`, `ToolSession`) are
/// reported and the interactive loop carries on. Job errors surface to the
/// tool caller as a failed tool result.
#[derive(Debug, thiserror::Error)]
pub enum NewsdeskError {
    /// Missing credential, CLI argument or malformed config file.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tool session could not be established.
    #[error("connection error: {0}")]
    Connection(String),

    /// A single inference call failed.
    #[error("inference error: {0}")]
    Inference(String),

    /// Every inference attempt in the retry budget failed.
    #[error("inference failed after {attempts} attempt(s): {source}")]
    ExhaustedRetries {
        attempts: usize,
        #[source]
        source: Box<NewsdeskError>,
    },

    /// The tool session rejected or failed a request.
    #[error("tool session error: {0}")]
    ToolSession(String),

    /// A tool invocation failed while being executed.
    #[error("tool execution error: {0}")]
    ToolExecution(String),

    /// The search service did not hand back a job identifier.
    #[error("job submission error: {0}")]
    JobSubmission(String),

    /// The search job never reached `done` within the poll budget.
    #[error("search job {job_id} did not complete in time")]
    JobTimeout { job_id: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed JSON-RPC traffic on the tool transport.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NewsdeskError {
    /// Short tag shown next to user-visible failures.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIG",
            Self::Connection(_) => "CONNECTION",
            Self::Inference(_) | Self::ExhaustedRetries { .. } => "INFERENCE",
            Self::ToolSession(_) | Self::ToolExecution(_) => "TOOL",
            Self::JobSubmission(_) | Self::JobTimeout { .. } => "JOB",
            Self::Http(_) => "HTTP",
            Self::Protocol(_) => "PROTOCOL",
            Self::Io(_) => "IO",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsdeskError>;
