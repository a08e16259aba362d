use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Result wrapper used on every peer-protocol boundary.
///
/// `success` is the only authoritative signal. `errors` is always a list so
/// multi-step operations can append to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntity<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> ResponseEntity<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn failure<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success: false,
            data: None,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Convert into a `Result`, mapping a missing payload on success to an error.
    pub fn into_result(self) -> Result<T, Vec<String>> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(vec!["response carries no data".to_string()]),
            (false, _) => Err(self.errors),
        }
    }
}

impl<T, E> From<Result<T, E>> for ResponseEntity<T>
where
    E: Display,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure([err.to_string()]),
        }
    }
}
