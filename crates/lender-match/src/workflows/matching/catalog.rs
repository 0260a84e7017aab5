use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::domain::PolicyId;
use super::evaluation::{LenderPolicy, PolicyConfigError};

const STANDARD_CATALOG: &str = include_str!("../../../policies/standard.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read policy catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid policy catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Policy(#[from] PolicyConfigError),
    #[error("policy id {0} appears more than once in the catalog")]
    DuplicatePolicy(PolicyId),
}

/// Loads lender policies from JSON, validating each before it is handed out.
pub struct PolicyCatalog;

impl PolicyCatalog {
    /// Bundled lender programs used when no catalog file is configured.
    pub fn standard() -> Result<Vec<LenderPolicy>, CatalogError> {
        Self::from_reader(STANDARD_CATALOG.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<LenderPolicy>, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<LenderPolicy>, CatalogError> {
        let policies: Vec<LenderPolicy> = serde_json::from_reader(reader)?;

        let mut ids = HashSet::new();
        for policy in &policies {
            if !ids.insert(policy.id) {
                return Err(CatalogError::DuplicatePolicy(policy.id));
            }
            policy.validate()?;
        }

        Ok(policies)
    }

    /// The bundled catalog unless a file is configured.
    pub fn load(path: Option<&Path>) -> Result<Vec<LenderPolicy>, CatalogError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::standard(),
        }
    }
}
