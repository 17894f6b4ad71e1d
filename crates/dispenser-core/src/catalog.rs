//! Territory catalog sources.
//!
//! A catalog is an ordered list of territories; the order is assignment
//! priority. Sources are read once by [`crate::Dispenser`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DispenserError, DispenserResult};
use crate::territory::Territory;

pub trait CatalogSource: Send + Sync {
    fn load(&self) -> DispenserResult<Vec<Territory>>;

    /// Human readable origin, used in logs.
    fn describe(&self) -> String;
}

/// JSON array of territory records on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileCatalog {
    fn load(&self) -> DispenserResult<Vec<Territory>> {
        let payload = fs::read(&self.path).map_err(|err| {
            DispenserError::CatalogLoad(format!("read {}: {err}", self.path.display()))
        })?;
        parse_catalog(&payload)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<Territory>);

impl CatalogSource for StaticCatalog {
    fn load(&self) -> DispenserResult<Vec<Territory>> {
        validate_catalog(&self.0)?;
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

pub fn parse_catalog(payload: &[u8]) -> DispenserResult<Vec<Territory>> {
    let territories: Vec<Territory> = serde_json::from_slice(payload)
        .map_err(|err| DispenserError::CatalogLoad(format!("parse: {err}")))?;
    validate_catalog(&territories)?;
    Ok(territories)
}

fn validate_catalog(territories: &[Territory]) -> DispenserResult<()> {
    let mut seen = HashSet::with_capacity(territories.len());
    for t in territories {
        if t.id == 0 {
            return Err(DispenserError::CatalogLoad(
                "territory id must be positive".to_string(),
            ));
        }
        if !seen.insert(t.id) {
            return Err(DispenserError::CatalogLoad(format!(
                "duplicate territory id {}",
                t.id
            )));
        }
    }
    Ok(())
}
