use std::fmt;

/// Failure categories a validator can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The candidate does not parse or compile.
    Compile,
    /// The candidate runs but its output differs from the source program.
    OutputMismatch,
}

impl ErrorCategory {
    pub fn code(self) -> i32 {
        match self {
            ErrorCategory::Compile => 1,
            ErrorCategory::OutputMismatch => 2,
        }
    }

    /// Maps a nonzero validation code back to its category.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ErrorCategory::Compile),
            2 => Some(ErrorCategory::OutputMismatch),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Compile => write!(f, "compile error"),
            ErrorCategory::OutputMismatch => write!(f, "output mismatch"),
        }
    }
}

/// Outcome of validating one candidate.
///
/// `code == 0` means the candidate is valid and `message` is empty. Any other
/// code names a failure category and `message` carries the diagnostic text fed
/// back into the repair prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub code: i32,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            code: category.code(),
            message: message.into(),
        }
    }

    /// Result reported for empty or whitespace-only candidates.
    pub fn empty_input() -> Self {
        Self::failed(ErrorCategory::Compile, "Empty code provided")
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        ErrorCategory::from_code(self.code)
    }
}

/// Record threaded through every stage of a single run.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub source_code: String,
    pub summary: String,
    pub plan: String,
    pub candidate_code: String,
    pub last_validation: ValidationResult,
    pub iteration_count: u32,
    pub scratchpad: String,
}

impl WorkflowState {
    pub fn new(source_code: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            ..Self::default()
        }
    }

    pub fn note(&mut self, line: &str) {
        if !self.scratchpad.is_empty() {
            self.scratchpad.push('\n');
        }
        self.scratchpad.push_str(line);
    }
}
