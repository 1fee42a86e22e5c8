//! Uniform outcome of every client operation.

/// Either data or a user-facing error message, never both.
///
/// `Data(None)` is a successful exchange without a usable payload: a
/// `204 No Content`, or a success body that did not parse as `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ApiResult<T> {
    Data(Option<T>),
    Error(String),
}

impl<T> ApiResult<T> {
    /// Successful outcome with a payload.
    pub fn ok(data: T) -> Self {
        Self::Data(Some(data))
    }

    /// Successful outcome without a payload.
    pub fn empty() -> Self {
        Self::Data(None)
    }

    /// Returns true for the error variant.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Payload, if the call succeeded with one.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data(data) => data.as_ref(),
            Self::Error(_) => None,
        }
    }

    /// Consume and return the payload.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(data) => data,
            Self::Error(_) => None,
        }
    }

    /// Error message, if the call failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Data(_) => None,
            Self::Error(message) => Some(message),
        }
    }

    /// Transform the payload, keeping errors as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            Self::Data(data) => ApiResult::Data(data.map(f)),
            Self::Error(message) => ApiResult::Error(message),
        }
    }

    /// Convert into a standard `Result` for use with `?`.
    pub fn into_result(self) -> Result<Option<T>, String> {
        match self {
            Self::Data(data) => Ok(data),
            Self::Error(message) => Err(message),
        }
    }
}

impl<T> From<ApiResult<T>> for Result<Option<T>, String> {
    fn from(result: ApiResult<T>) -> Self {
        result.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_side() {
        let ok: ApiResult<u32> = ApiResult::ok(3);
        assert_eq!(ok.data(), Some(&3));
        assert_eq!(ok.error(), None);

        let err: ApiResult<u32> = ApiResult::Error("nope".to_string());
        assert_eq!(err.data(), None);
        assert_eq!(err.error(), Some("nope"));
        assert!(err.is_error());
    }

    #[test]
    fn test_map_and_into_result() {
        let doubled = ApiResult::ok(21).map(|n| n * 2);
        assert_eq!(doubled.into_result(), Ok(Some(42)));

        let empty: ApiResult<u32> = ApiResult::empty();
        assert_eq!(empty.map(|n| n + 1).into_result(), Ok(None));

        let err: ApiResult<u32> = ApiResult::Error("x".to_string());
        assert_eq!(err.map(|n| n + 1), ApiResult::Error("x".to_string()));
    }
}
