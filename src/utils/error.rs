use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Execution failed at {stage}: {details}")]
    ExecutionError { stage: String, details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
    Execution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OrchestratorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::ApiError(_) => ErrorCategory::Network,
            OrchestratorError::IoError(_) | OrchestratorError::ZipError(_) => {
                ErrorCategory::Storage
            }
            OrchestratorError::CsvError(_)
            | OrchestratorError::SerializationError(_)
            | OrchestratorError::TomlSerializeError(_) => ErrorCategory::Data,
            OrchestratorError::ConfigValidationError { .. }
            | OrchestratorError::InvalidConfigValueError { .. }
            | OrchestratorError::MissingConfigError { .. } => ErrorCategory::Configuration,
            OrchestratorError::ExecutionError { .. } => ErrorCategory::Execution,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常重跑即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Execution => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            OrchestratorError::ApiError(_) => {
                "Check that the mock services are running and reachable".to_string()
            }
            OrchestratorError::IoError(_) | OrchestratorError::ZipError(_) => {
                "Check file permissions and free disk space for the output directory".to_string()
            }
            OrchestratorError::CsvError(_)
            | OrchestratorError::SerializationError(_)
            | OrchestratorError::TomlSerializeError(_) => {
                "Inspect the generated report data for unexpected values".to_string()
            }
            OrchestratorError::ConfigValidationError { field, .. }
            | OrchestratorError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' entry in the registry or suite configuration", field)
            }
            OrchestratorError::MissingConfigError { field } => {
                format!("Add the required '{}' setting", field)
            }
            OrchestratorError::ExecutionError { stage, .. } => {
                format!("Re-run with --verbose to see what went wrong during {}", stage)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a service: {}", self),
            ErrorCategory::Storage => format!("Could not write results: {}", self),
            ErrorCategory::Data => format!("Could not encode results: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Execution => format!("Test run failed: {}", self),
        }
    }

    /// 依嚴重程度對應到程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
