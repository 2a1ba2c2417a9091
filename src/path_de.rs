use serde::de::DeserializeOwned;
use std::fmt;

/// A deserialization failure located by its JSON path (`types[0].kind`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at JSON path {} → {}", self.path, self.message)
    }
}

impl std::error::Error for PathError {}

fn located(err: serde_path_to_error::Error<serde_json::Error>) -> PathError {
    let path = err.path().to_string();
    PathError { path, message: err.into_inner().to_string() }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(located)
}

/// Same as [`from_str_with_path`] for an already parsed tree.
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, PathError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(located)
}
