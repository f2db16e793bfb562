use thiserror::Error;

#[derive(Debug, Error)]
pub enum TickError {
    #[error("not configured: run 'tick config init' prior to use")]
    NotConfigured,

    #[error("invalid task key '{0}': expected <PROJECT>-<NUMBER>")]
    InvalidKeyFormat(String),

    #[error("task {0} is already running: stop it first")]
    AlreadyRunning(String),

    #[error("task {0} is not running")]
    NotRunning(String),

    #[error("no key provided and no current task")]
    NoCurrentTask,

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("invalid duration {0}: minimum is 1 minute")]
    InvalidDuration(u64),

    #[error("no transition to '{status}' available for {key}")]
    TransitionNotFound { key: String, status: String },

    #[error("current branch is '{actual}', expected '{expected}'")]
    WrongBranch { expected: String, actual: String },

    #[error(
        "resolution likely failed ({reason}); custom rules can be added using \
         'tick config edit' to fix the following:\n\
         repo -> {repo}\nbranch -> {branch}\nproject -> {project}"
    )]
    ResolutionFailed {
        repo: String,
        branch: String,
        project: String,
        reason: String,
    },

    #[error("path not found in response: {0}")]
    NotFound(String),

    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("git: {0}")]
    Git(String),

    #[error("git executable not found on PATH")]
    GitNotFound,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TickError>;
