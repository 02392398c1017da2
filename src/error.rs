//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the crate.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// A construct the Objective-C generator cannot represent: an unmapped
    /// primitive kind, a constraint outside the supported table, or a
    /// streaming parameter declared outside the request body.
    /// We ignore this for `From<String>` to avoid conflict with General.
    #[from(ignore)]
    #[display("Unsupported construct: {_0}")]
    Unsupported(String),

    /// An inconsistency in the supplied code model: a dangling arena id, a
    /// cyclic base-type chain, a polymorphic leaf without a discriminator
    /// member, or a malformed extension value.
    #[from(ignore)]
    #[display("Model consistency error: {_0}")]
    ModelConsistency(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_conversion() {
        // Test that String defaults to General, not the tagged variants
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_unsupported_manual_creation() {
        // Unsupported errors must be created explicitly
        let app_err = AppError::Unsupported("constraint 'Foo'".into());
        assert_eq!(
            format!("{}", app_err),
            "Unsupported construct: constraint 'Foo'"
        );
    }

    #[test]
    fn test_model_consistency_display() {
        let app_err = AppError::ModelConsistency("cyclic base chain".into());
        assert_eq!(
            format!("{}", app_err),
            "Model consistency error: cyclic base chain"
        );
    }
}
