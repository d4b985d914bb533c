use std::path::PathBuf;
use thiserror::Error;

pub const RC_SUCCESS: i32 = 0;
pub const RC_GENERIC_FAILURE: i32 = 1;
pub const RC_PARSE_ERROR: i32 = 2;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Unable to open the file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error while parsing the file {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("{0}")]
    Structural(String),

    #[error("Failed loading data source: {0}")]
    SourceNotFound(String),

    #[error("{message}")]
    NamespaceImport { code: i32, message: String },

    #[error("Unable to write file {}: {source}", path.display())]
    DescriptionWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The graph engine exited on error ({reason}, file: {})", path.display())]
    LayoutEngine { path: PathBuf, reason: String },

    #[error("Invalid graphviz entry: {0}")]
    InvalidLayoutFormat(String),

    #[error("Failed to read file: {}", path.display())]
    FileRead { path: PathBuf },
}

impl ViewError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Structural(_) | Self::MalformedDocument { .. } => RC_PARSE_ERROR,
            Self::NamespaceImport { code, .. } => *code,
            _ => RC_GENERIC_FAILURE,
        }
    }

    /// Status code and message as reported to the dashboard.
    pub fn status(&self) -> (i32, String) {
        (self.code(), self.to_string())
    }
}

pub type ViewResult<T> = Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors_report_parse_code() {
        let err = ViewError::Structural("Unexpected number of nodes: 2".into());
        assert_eq!(err.status(), (RC_PARSE_ERROR, "Unexpected number of nodes: 2".into()));
    }

    #[test]
    fn namespace_import_keeps_its_code() {
        let err = ViewError::NamespaceImport {
            code: 7,
            message: "namespace not found".into(),
        };
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn engine_failure_is_generic() {
        let err = ViewError::LayoutEngine {
            path: PathBuf::from("/tmp/a.dot"),
            reason: "code: 1".into(),
        };
        assert_eq!(err.code(), RC_GENERIC_FAILURE);
        assert!(err.to_string().contains("/tmp/a.dot"));
    }
}
