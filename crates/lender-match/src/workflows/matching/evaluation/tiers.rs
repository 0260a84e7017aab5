use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::super::domain::PolicyId;
use super::policy::PolicyConfigError;

/// Named band covering fit scores from `min_score` up to the next band's minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBand {
    pub name: String,
    pub min_score: u8,
}

impl TierBand {
    pub fn new(name: impl Into<String>, min_score: u8) -> Self {
        Self {
            name: name.into(),
            min_score,
        }
    }
}

/// Tier for an eligible application. Bands are ordered by descending minimum.
pub fn classify(fit_score: u8, eligible: bool, bands: &[TierBand]) -> Option<String> {
    if !eligible {
        return None;
    }

    bands
        .iter()
        .find(|band| fit_score >= band.min_score)
        .map(|band| band.name.clone())
}

/// Bands must be strictly descending, start within 0..=100, and end at 0 so every
/// score lands in exactly one band.
pub(crate) fn validate_bands(policy: PolicyId, bands: &[TierBand]) -> Result<(), PolicyConfigError> {
    let invalid = |reason| PolicyConfigError::InvalidTiers { policy, reason };

    let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
        return Err(invalid("must not be empty"));
    };
    if first.min_score > 100 {
        return Err(invalid("must start at or below 100"));
    }
    if last.min_score != 0 {
        return Err(invalid("must end with a band starting at 0"));
    }
    if bands
        .windows(2)
        .any(|pair| pair[1].min_score >= pair[0].min_score)
    {
        return Err(invalid("must be ordered by strictly descending minimum score"));
    }

    let mut names = HashSet::new();
    for band in bands {
        if band.name.trim().is_empty() {
            return Err(invalid("must all be named"));
        }
        if !names.insert(band.name.trim().to_lowercase()) {
            return Err(invalid("must have unique names"));
        }
    }

    Ok(())
}
