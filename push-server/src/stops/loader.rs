//! Alias mapping loader.
//!
//! Loads the quay → stop-place mapping from a JSON document, either a local
//! file or an HTTP endpoint, and feeds it into [`StopAliases`]. The document
//! is a flat object: `{"NSR:Quay:1": "NSR:StopPlace:100", ...}`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::StopRef;

use super::StopAliases;

/// Timeout for fetching the mapping over HTTP.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from loading the alias mapping.
#[derive(Debug, thiserror::Error)]
pub enum StopAliasError {
    #[error("failed to read alias file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch alias mapping: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse alias mapping: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the alias mapping comes from.
#[derive(Debug, Clone)]
pub enum AliasSource {
    Url(String),
    File(PathBuf),
}

/// Loads and refreshes the alias mapping.
pub struct AliasLoader {
    source: AliasSource,
    http: reqwest::Client,
}

impl AliasLoader {
    pub fn new(source: AliasSource) -> Result<Self, StopAliasError> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { source, http })
    }

    /// Load the mapping from the configured source.
    pub async fn load(&self) -> Result<HashMap<StopRef, StopRef>, StopAliasError> {
        let raw: HashMap<String, String> = match &self.source {
            AliasSource::Url(url) => self.http.get(url).send().await?.json().await?,
            AliasSource::File(path) => {
                let contents = std::fs::read_to_string(path)?;
                serde_json::from_str(&contents)?
            }
        };

        Ok(raw
            .into_iter()
            .map(|(quay, parent)| (StopRef::new(quay), StopRef::new(parent)))
            .collect())
    }

    /// Load the mapping and replace the resolver's contents.
    ///
    /// On failure the existing mapping is preserved and the error returned.
    pub async fn refresh_into(&self, aliases: &StopAliases) -> Result<usize, StopAliasError> {
        let mapping = self.load().await?;
        let count = mapping.len();
        aliases.replace_all(mapping).await;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_mapping(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("aliases.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(
            &dir,
            r#"{"NSR:Quay:1": "NSR:StopPlace:100", "NSR:Quay:2": "NSR:StopPlace:100"}"#,
        );

        let loader = AliasLoader::new(AliasSource::File(path)).unwrap();
        let mapping = loader.load().await.unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping.get(&StopRef::new("NSR:Quay:1")),
            Some(&StopRef::new("NSR:StopPlace:100"))
        );
    }

    #[tokio::test]
    async fn refresh_replaces_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(&dir, r#"{"NSR:Quay:1": "NSR:StopPlace:100"}"#);

        let aliases = StopAliases::empty();
        let loader = AliasLoader::new(AliasSource::File(path)).unwrap();
        let count = loader.refresh_into(&aliases).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(aliases.len().await, 1);
    }

    #[tokio::test]
    async fn failed_refresh_preserves_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(&dir, r#"{"NSR:Quay:1": "NSR:StopPlace:100"}"#);

        let aliases = StopAliases::empty();
        let loader = AliasLoader::new(AliasSource::File(path.clone())).unwrap();
        loader.refresh_into(&aliases).await.unwrap();

        std::fs::write(&path, "not json").unwrap();
        assert!(loader.refresh_into(&aliases).await.is_err());

        // Old mapping still answers lookups.
        assert_eq!(
            aliases.quay_to_parent(&StopRef::new("NSR:Quay:1")).await,
            Some(StopRef::new("NSR:StopPlace:100"))
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let loader = AliasLoader::new(AliasSource::File("/nonexistent/aliases.json".into())).unwrap();
        assert!(loader.load().await.is_err());
    }
}
