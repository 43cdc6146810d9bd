pub mod python;

use async_trait::async_trait;

use crate::error::Result;
use crate::workflow::state::ValidationResult;

pub use python::PyCompileValidator;

/// Checks whether a candidate translation is acceptable.
///
/// Implementors provide [`Validator::check`]. Callers go through
/// [`Validator::validate`], which answers blank candidates itself so the
/// underlying checker never sees them.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Run the underlying checker on non-blank code.
    async fn check(&self, code: &str) -> Result<ValidationResult>;

    async fn validate(&self, code: &str) -> Result<ValidationResult> {
        if code.trim().is_empty() {
            tracing::debug!("Skipping checker for empty candidate");
            return Ok(ValidationResult::empty_input());
        }
        self.check(code).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingValidator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Validator for CountingValidator {
        async fn check(&self, _code: &str) -> Result<ValidationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ValidationResult::ok())
        }
    }

    #[tokio::test]
    async fn test_blank_code_never_reaches_checker() {
        let validator = CountingValidator::default();

        let empty = validator.validate("").await.unwrap();
        let blank = validator.validate("   \n\t").await.unwrap();

        assert_ne!(empty.code, 0);
        assert_ne!(blank.code, 0);
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_blank_code_is_checked() {
        let validator = CountingValidator::default();
        let result = validator.validate("x = 1").await.unwrap();
        assert!(result.is_ok());
        assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
    }
}
