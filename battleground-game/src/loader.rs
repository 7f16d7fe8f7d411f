//! Bundled content shipped with the crate.
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::DataLoader;
use crate::data::{Catalog, CatalogLoadError};

const CATALOG_JSON: &str = include_str!("../assets/catalog.json");
const SESSION_JSON: &str = include_str!("../assets/session.json");

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),
    #[error("config `{name}` is malformed: {source}")]
    Config {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no bundled config named `{0}`")]
    UnknownConfig(String),
}

/// Loads the catalog and configs compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl StaticCatalogLoader {
    /// Raw bundled catalog JSON.
    #[must_use]
    pub const fn catalog_json() -> &'static str {
        CATALOG_JSON
    }
}

impl DataLoader for StaticCatalogLoader {
    type Error = LoaderError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(Catalog::from_json(CATALOG_JSON)?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let raw = match config_name {
            "session" => SESSION_JSON,
            other => return Err(LoaderError::UnknownConfig(other.to_string())),
        };
        serde_json::from_str(raw).map_err(|source| LoaderError::Config {
            name: config_name.to_string(),
            source,
        })
    }
}
