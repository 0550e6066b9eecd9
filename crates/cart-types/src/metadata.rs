use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;

/// Schema version written into new project files.
pub const CURRENT_SCHEMA_VERSION: u32 = 0;

/// Plain 3-component vector used for positions and camera targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orbit camera state. View-only: editing it never marks a project unsaved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitControls {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f64,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 5.0, 5.0),
            target: Vec3::ZERO,
            zoom: 1.0,
        }
    }
}

/// Orientation of a reference grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidelinePlane {
    Xy,
    #[default]
    Xz,
    Yz,
}

impl GuidelinePlane {
    pub const ALL: [GuidelinePlane; 3] = [Self::Xy, Self::Xz, Self::Yz];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xy => "xy",
            Self::Xz => "xz",
            Self::Yz => "yz",
        }
    }
}

impl fmt::Display for GuidelinePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuidelinePlane {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|plane| plane.as_str() == s)
            .ok_or_else(|| TypeError::InvalidPlane(s.to_string()))
    }
}

/// A reference grid overlay drawn in the editor viewport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guideline {
    pub plane: GuidelinePlane,
    pub position: Vec3,
    pub cell_size: f64,
    pub section_size: f64,
    /// Hex colour, `#rrggbb`.
    pub cell_color: String,
    pub visible: bool,
}

impl Default for Guideline {
    fn default() -> Self {
        Self {
            plane: GuidelinePlane::default(),
            position: Vec3::ZERO,
            cell_size: 1.0,
            section_size: 16.0,
            cell_color: "#6f6f6f".into(),
            visible: true,
        }
    }
}

/// Project-level attributes persisted as `metadata.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub schema_version: u32,
    pub project_name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit_controls: Option<OrbitControls>,
    #[serde(default)]
    pub guidelines: Vec<Guideline>,
    /// Fields written by other versions of the editor, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            project_name: project_name.into(),
            created_at: None,
            last_modified_at: None,
            orbit_controls: None,
            guidelines: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Deep equality ignoring `orbit_controls`.
    ///
    /// This is the comparison behind the unsaved-changes flag: camera moves
    /// are view state, everything else (guidelines included) is content.
    pub fn same_content(&self, other: &Self) -> bool {
        let Metadata {
            schema_version,
            project_name,
            created_at,
            last_modified_at,
            orbit_controls: _,
            guidelines,
            extra,
        } = self;

        *schema_version == other.schema_version
            && *project_name == other.project_name
            && *created_at == other.created_at
            && *last_modified_at == other.last_modified_at
            && *guidelines == other.guidelines
            && *extra == other.extra
    }

    /// Copy of this metadata with timestamps applied for a save at `now`.
    pub fn stamped(&self, now: DateTime<Utc>) -> Self {
        Self {
            created_at: Some(self.created_at.unwrap_or(now)),
            last_modified_at: Some(now),
            ..self.clone()
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
