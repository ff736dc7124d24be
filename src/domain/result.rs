//! Result type alias for Lavendair

use super::errors::LavendairError;

/// Result type alias for Lavendair operations
///
/// # Examples
///
/// ```
/// use lavendair::domain::result::Result;
/// use lavendair::domain::errors::LavendairError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(LavendairError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, LavendairError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::LavendairError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(LavendairError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
