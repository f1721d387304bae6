use std::time::Duration;

/// Represents all possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The helper program could not be started.
    #[error("Failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The helper program did not finish in time and was killed.
    #[error("`{program}` did not finish within {after:?}")]
    Timeout {
        program: &'static str,
        after: Duration,
    },

    /// The helper program exited with a non-zero status.
    #[error("`{program}` failed with {status}: {stderr}")]
    CommandFailed {
        program: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The unit name would not be passed to systemctl as a plain argument.
    #[error("Invalid service name: {0:?}")]
    InvalidServiceName(String),
}
