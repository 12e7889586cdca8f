//! Authored payload data
//!
//! Payloads arrive as JSON written by hand, so segment specs are parsed
//! leniently and only checked when a shot resolves them into `Segment`s.

use serde::{Deserialize, Serialize};

use super::segment::{Segment, SegmentShape};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Discriminator of an authored segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SegmentKind {
    Line,
    LineUntilCollision,
    /// Anything else; rejected at fire time
    Unknown(String),
}

impl SegmentKind {
    pub fn as_str(&self) -> &str {
        match self {
            SegmentKind::Line => "line",
            SegmentKind::LineUntilCollision => "lineUntilCollision",
            SegmentKind::Unknown(s) => s,
        }
    }
}

impl From<String> for SegmentKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "line" | "Line" => SegmentKind::Line,
            "lineUntilCollision" | "LineUntilCollision" => SegmentKind::LineUntilCollision,
            _ => SegmentKind::Unknown(s),
        }
    }
}

impl From<SegmentKind> for String {
    fn from(kind: SegmentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Ricochet settings of one segment
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RicochetSpec {
    pub enabled: bool,
    /// Falls back to `EngineConfig::max_ricochets`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bounces: Option<u32>,
}

/// Single-line sub-shot spawned at a segment's terminal point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSpec {
    /// Degrees added to the parent's terminal direction
    pub offset_angle: f64,
    pub length: f64,
}

/// One authored trajectory segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSpec {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Line length, or step length for `lineUntilCollision`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ricochet: Option<RicochetSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BranchSpec>,
}

impl SegmentSpec {
    pub fn line(length: f64) -> Self {
        Self {
            kind: SegmentKind::Line,
            length: Some(length),
            max_iterations: None,
            ricochet: None,
            children: Vec::new(),
        }
    }

    pub fn line_until_collision(step: f64, max_iterations: u32) -> Self {
        Self {
            kind: SegmentKind::LineUntilCollision,
            length: Some(step),
            max_iterations: Some(max_iterations),
            ricochet: None,
            children: Vec::new(),
        }
    }

    pub fn with_ricochet(mut self, max_bounces: u32) -> Self {
        self.ricochet = Some(RicochetSpec {
            enabled: true,
            max_bounces: Some(max_bounces),
        });
        self
    }

    pub fn with_child(mut self, offset_angle: f64, length: f64) -> Self {
        self.children.push(BranchSpec {
            offset_angle,
            length,
        });
        self
    }

    /// Validate this spec and turn it into an executable segment
    ///
    /// `index` is the spec's position in the payload, used in error messages.
    pub fn resolve(&self, index: usize, config: &EngineConfig) -> Result<Segment, EngineError> {
        let shape = match &self.kind {
            SegmentKind::Line => {
                let length = self.length.ok_or(EngineError::MissingField {
                    index,
                    field: "length",
                })?;
                SegmentShape::Line {
                    length: checked_length(index, "length", length)?.min(config.max_ray_distance),
                }
            }
            SegmentKind::LineUntilCollision => {
                let step = self.length.unwrap_or(config.fire_segment_length);
                let max_iterations = self.max_iterations.unwrap_or(config.max_fire_segments);
                if max_iterations == 0 {
                    return Err(EngineError::InvalidField {
                        index,
                        field: "maxIterations",
                        value: 0.0,
                    });
                }
                SegmentShape::LineUntilCollision {
                    step: checked_length(index, "length", step)?.min(config.max_ray_distance),
                    max_iterations,
                }
            }
            SegmentKind::Unknown(kind) => {
                return Err(EngineError::UnknownSegmentKind {
                    index,
                    kind: kind.clone(),
                });
            }
        };

        for branch in &self.children {
            checked_length(index, "children.length", branch.length)?;
            if !branch.offset_angle.is_finite() {
                return Err(EngineError::InvalidField {
                    index,
                    field: "children.offsetAngle",
                    value: branch.offset_angle,
                });
            }
        }

        let ricochet = self.ricochet.unwrap_or_default();
        Ok(Segment {
            shape,
            max_bounces: config.effective_bounces(ricochet.enabled, ricochet.max_bounces),
            children: self.children.clone(),
        })
    }
}

fn checked_length(index: usize, field: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidField {
            index,
            field,
            value,
        })
    }
}

/// Authored description of a projectile's path shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub name: String,
    pub trajectory: Vec<SegmentSpec>,
    /// How many leading rays ignore the shooter's own body (default 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_shooter_segments: Option<u32>,
}

impl Payload {
    pub fn new(name: impl Into<String>, trajectory: Vec<SegmentSpec>) -> Self {
        Self {
            name: name.into(),
            trajectory,
            ignore_shooter_segments: None,
        }
    }

    /// Single fixed-length line, the shape every branch fires
    pub fn single_line(name: impl Into<String>, length: f64) -> Self {
        let mut payload = Self::new(name, vec![SegmentSpec::line(length)]);
        payload.ignore_shooter_segments = Some(0);
        payload
    }

    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}
