//! Generative factors, their families, partitions and column identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Group of factors switched on and partitioned together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorFamily {
    Object,
    Position,
    Rotation,
    Hue,
}

impl FactorFamily {
    /// Construction order within a partition.
    pub const ALL: [FactorFamily; 4] = [
        FactorFamily::Object,
        FactorFamily::Position,
        FactorFamily::Rotation,
        FactorFamily::Hue,
    ];

    pub fn factors(self) -> &'static [Factor] {
        match self {
            FactorFamily::Object => &[Factor::Object],
            FactorFamily::Position => &[Factor::PositionX, Factor::PositionY, Factor::PositionZ],
            FactorFamily::Rotation => &[
                Factor::RotationAlpha,
                Factor::RotationBeta,
                Factor::RotationSpot,
            ],
            FactorFamily::Hue => &[Factor::ObjectHue, Factor::BackHue, Factor::SpotHue],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FactorFamily::Object => "object",
            FactorFamily::Position => "position",
            FactorFamily::Rotation => "rotation",
            FactorFamily::Hue => "hue",
        }
    }
}

impl fmt::Display for FactorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single scene-generating factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Factor {
    Object,
    PositionX,
    PositionY,
    PositionZ,
    RotationAlpha,
    RotationBeta,
    RotationSpot,
    ObjectHue,
    BackHue,
    SpotHue,
}

impl Factor {
    pub fn family(self) -> FactorFamily {
        match self {
            Factor::Object => FactorFamily::Object,
            Factor::PositionX | Factor::PositionY | Factor::PositionZ => FactorFamily::Position,
            Factor::RotationAlpha | Factor::RotationBeta | Factor::RotationSpot => {
                FactorFamily::Rotation
            }
            Factor::ObjectHue | Factor::BackHue | Factor::SpotHue => FactorFamily::Hue,
        }
    }

    /// Per-object factors get one instance per object; scene factors one.
    pub fn per_object(self) -> bool {
        !matches!(
            self,
            Factor::RotationSpot | Factor::BackHue | Factor::SpotHue
        )
    }

    /// Value written for this factor when its family is inactive or frozen.
    pub fn fixed_value(self) -> f64 {
        match self {
            Factor::SpotHue => 0.0,
            Factor::BackHue => 1.0,
            Factor::ObjectHue => -1.0,
            Factor::RotationAlpha => 1.0,
            Factor::RotationBeta => -1.0,
            Factor::RotationSpot => -0.5,
            Factor::PositionX | Factor::PositionY | Factor::PositionZ => 0.0,
            Factor::Object => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Factor::Object => "object",
            Factor::PositionX => "position_x",
            Factor::PositionY => "position_y",
            Factor::PositionZ => "position_z",
            Factor::RotationAlpha => "rotation_object_alpha",
            Factor::RotationBeta => "rotation_object_beta",
            Factor::RotationSpot => "rotation_spot",
            Factor::ObjectHue => "object_hue",
            Factor::BackHue => "back_hue",
            Factor::SpotHue => "spot_hue",
        }
    }
}

/// One output column: a factor instance for a given object.
///
/// Scene-level factors always use object 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column {
    pub factor: Factor,
    pub object: usize,
}

impl Column {
    #[inline]
    pub fn new(factor: Factor, object: usize) -> Self {
        Self { factor, object }
    }

    /// Every instance of `factor` for a scene with `n_objects` objects.
    pub fn instances(factor: Factor, n_objects: usize) -> impl Iterator<Item = Column> {
        let count = if factor.per_object() { n_objects } else { 1 };
        (0..count).map(move |object| Column::new(factor, object))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_object_{}", self.factor.name(), self.object)
    }
}

/// Role of a factor family between the two views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Shared; view 2 is a small content perturbation of view 1.
    Content,
    /// Varies between views under the noise parameters.
    Style,
    /// Held fixed (delta) in both views.
    Ms,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Content, Partition::Style, Partition::Ms];
}

/// Activation and partition flags for one factor family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyFlags {
    pub active: bool,
    pub content: bool,
    pub style: bool,
    pub ms: bool,
}

impl FamilyFlags {
    pub fn active_as(partition: Partition) -> Self {
        Self {
            active: true,
            content: partition == Partition::Content,
            style: partition == Partition::Style,
            ms: partition == Partition::Ms,
        }
    }

    /// First set flag among (content, style, ms); `None` if none is set.
    pub fn partition(&self) -> Option<Partition> {
        [self.content, self.style, self.ms]
            .iter()
            .zip(Partition::ALL)
            .find_map(|(set, p)| set.then_some(p))
    }
}
