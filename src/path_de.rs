//! Deserialization that reports where in the document it failed.
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Read and deserialize `file`, naming the file and the JSON path on failure.
pub fn read_with_path<T: DeserializeOwned>(file: &Path) -> anyhow::Result<T> {
    let src = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    from_str_with_path(&src).map_err(|error| anyhow!("{}: {error}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn reports_the_failing_path() {
        let error = from_str_with_path::<BTreeMap<String, BTreeMap<String, u8>>>(r#"{"a": {"b": "x"}}"#)
            .unwrap_err();
        assert!(error.starts_with("at JSON path a.b →"), "{error}");
    }
}
