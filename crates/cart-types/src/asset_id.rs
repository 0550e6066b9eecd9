use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of an external 3D model asset.
///
/// Ids are referenced from item payloads through the
/// `minecraft:custom_model_data` component and stored in project files as
/// `models/{id}.glb`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelAssetId(u32);

impl ModelAssetId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Interpret a `custom_model_data` float as an asset id.
    ///
    /// Only finite, non-negative integral values that fit in a `u32` qualify.
    pub fn from_float(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return None;
        }
        Some(Self(value as u32))
    }
}

impl fmt::Debug for ModelAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelAssetId({})", self.0)
    }
}

impl fmt::Display for ModelAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ModelAssetId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for ModelAssetId {
    type Err = TypeError;

    /// Accepts plain decimal digits only; signs, whitespace and empty strings
    /// are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidAssetId(s.to_string()));
        }
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| TypeError::InvalidAssetId(s.to_string()))
    }
}
