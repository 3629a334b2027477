use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
    DeviceUnreachable,
    Persistence,
    Config,
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no response from {url}")]
    Transport { url: String },

    #[error("{summary}")]
    BadStatus { summary: String },

    #[error("cannot find {field} in payload")]
    Parse { field: String },

    #[error("cannot reach switch during {operation}: {detail}")]
    DeviceUnreachable {
        operation: &'static str,
        detail: String,
    },

    #[error("cannot write run log {}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ControlError {
    pub fn unreachable(operation: &'static str, detail: impl ToString) -> Self {
        Self::DeviceUnreachable {
            operation,
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::BadStatus { .. } => ErrorKind::Transport,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::DeviceUnreachable { .. } => ErrorKind::DeviceUnreachable,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Fatal errors end the run; everything else is retried after one interval.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Persistence | ErrorKind::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_device_failures_are_retryable() {
        let retryable = [
            ControlError::Transport {
                url: "http://panel".to_string(),
            },
            ControlError::BadStatus {
                summary: "503 Service Unavailable".to_string(),
            },
            ControlError::Parse {
                field: "OutputPower".to_string(),
            },
            ControlError::unreachable("set_on", "connection refused"),
        ];

        for err in retryable {
            assert!(!err.is_fatal(), "{err} should be retryable");
        }
    }

    #[test]
    fn persistence_and_config_are_fatal() {
        let persistence = ControlError::Persistence {
            path: PathBuf::from("log.csv"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(persistence.kind(), ErrorKind::Persistence);
        assert!(persistence.is_fatal());
        assert!(ControlError::Config("no switch".to_string()).is_fatal());
    }

    #[test]
    fn messages_match_operator_wording() {
        let err = ControlError::Transport {
            url: "http://192.168.1.161/meters.xml".to_string(),
        };
        assert_eq!(err.to_string(), "no response from http://192.168.1.161/meters.xml");

        let err = ControlError::Parse {
            field: "OutputPower".to_string(),
        };
        assert_eq!(err.to_string(), "cannot find OutputPower in payload");
    }
}
