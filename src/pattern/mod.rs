mod source;

pub use source::{load, parse, read, SourceError};

use std::time::Duration;

use glam::{Mat3, Vec2, Vec3};
use thiserror::Error;

use crate::config::{
    DEFAULT_FRAME_INTERVAL_MS, DEFAULT_HEIGHT, DEFAULT_MODULUS, DEFAULT_WIDTH, MAX_MODULUS,
};

/// Rejected pattern parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Width or height is zero.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    ZeroDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Modulus outside [2, 256].
    #[error("modulus must be in [2, 256], got {0}")]
    ModulusOutOfRange(u32),
}

/// Relation a cell must have with its transformed self-reference to keep its state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operator {
    /// Persist when both states are equal.
    #[default]
    Equal,
    /// Persist when the states differ.
    NotEqual,
}

impl Operator {
    /// Parses the `"=="` / `"!="` notation used in pattern files.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            _ => None,
        }
    }

    /// Whether a cell with state `current` keeps it, given the state `referenced`
    /// found at its transformed coordinate.
    #[inline]
    pub fn persists(self, current: u8, referenced: u8) -> bool {
        match self {
            Self::Equal => current == referenced,
            Self::NotEqual => current != referenced,
        }
    }
}

/// Policy for mapping out-of-range coordinates onto the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Fold back into the grid at the edges (single fold).
    #[default]
    Mirror,
    /// Toroidal wrap-around.
    Wrap,
}

impl BoundaryMode {
    /// Parses the `"mirror"` / `"wrap"` names used in pattern files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mirror" => Some(Self::Mirror),
            "wrap" => Some(Self::Wrap),
            _ => None,
        }
    }
}

/// Affine map over homogeneous 2D points `(x, y, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform(Mat3);

impl Transform {
    pub const IDENTITY: Self = Self(Mat3::IDENTITY);

    /// Builds a transform from a row-major 3x3 matrix, as written in pattern files.
    pub fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        // glam stores columns
        Self(Mat3::from_cols_array_2d(&rows).transpose())
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotation(angle: f32) -> Self {
        Self(Mat3::from_angle(angle))
    }

    pub fn translation(dx: f32, dy: f32) -> Self {
        Self(Mat3::from_translation(Vec2::new(dx, dy)))
    }

    #[inline]
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.0 * point
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Validated, immutable simulation parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    width: u32,
    height: u32,
    modulus: u32,
    operator: Operator,
    boundary: BoundaryMode,
    transforms: Vec<Transform>,
    frame_interval: Duration,
}

impl Pattern {
    pub fn builder() -> PatternBuilder {
        PatternBuilder::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells in one plane
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// Transform chain, in application order
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Pause between two simulation ticks
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Maps `(x, y)` through the whole transform chain.
    pub fn map_point(&self, x: f32, y: f32) -> Vec3 {
        self.transforms
            .iter()
            .fold(Vec3::new(x, y, 1.0), |p, t| t.apply(p))
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            modulus: DEFAULT_MODULUS,
            operator: Operator::default(),
            boundary: BoundaryMode::default(),
            transforms: Vec::new(),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
        }
    }
}

/// Step-by-step construction of a [`Pattern`], validated in [`PatternBuilder::build`].
#[derive(Clone, Debug)]
pub struct PatternBuilder {
    pattern: Pattern,
}

impl Default for PatternBuilder {
    fn default() -> Self {
        Self {
            pattern: Pattern::default(),
        }
    }
}

impl PatternBuilder {
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.pattern.width = width;
        self.pattern.height = height;
        self
    }

    pub fn modulus(mut self, modulus: u32) -> Self {
        self.pattern.modulus = modulus;
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.pattern.operator = operator;
        self
    }

    pub fn boundary(mut self, boundary: BoundaryMode) -> Self {
        self.pattern.boundary = boundary;
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.pattern.transforms.push(transform);
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.pattern.frame_interval = interval;
        self
    }

    pub fn build(self) -> Result<Pattern, PatternError> {
        let p = self.pattern;

        if p.width == 0 || p.height == 0 {
            return Err(PatternError::ZeroDimension {
                width: p.width,
                height: p.height,
            });
        }

        if !(2..=MAX_MODULUS).contains(&p.modulus) {
            return Err(PatternError::ModulusOutOfRange(p.modulus));
        }

        Ok(p)
    }
}
