use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{BoundaryMode, Operator, Pattern, Transform};
use crate::config::{
    DEFAULT_FRAME_INTERVAL_MS, DEFAULT_HEIGHT, DEFAULT_MODULUS, DEFAULT_WIDTH, MAX_DIMENSION,
    MAX_MODULUS,
};

/// Failure to read or decode a pattern file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read pattern file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed pattern document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw document as found on disk, before defaults are applied.
///
/// Fields stay untyped so one bad value only costs that field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PatternDocument {
    width: Option<Value>,
    height: Option<Value>,
    #[serde(rename = "mod")]
    modulus: Option<Value>,
    operation: Option<Value>,
    index: Option<Value>,
    sleep: Option<Value>,
    transforms: Option<Value>,
}

/// Loads a pattern file, falling back to the default pattern on any failure.
pub fn load(path: impl AsRef<Path>) -> Pattern {
    let path = path.as_ref();
    match read(path) {
        Ok(pattern) => {
            log::info!(
                "Loaded pattern {}: {}x{}, mod {}, {:?}, {:?}, {} transform(s), {:?} per tick",
                path.display(),
                pattern.width(),
                pattern.height(),
                pattern.modulus(),
                pattern.operator(),
                pattern.boundary(),
                pattern.transforms().len(),
                pattern.frame_interval(),
            );
            pattern
        }
        Err(e) => {
            log::warn!("{}; using default pattern", e);
            Pattern::default()
        }
    }
}

/// Reads and parses a pattern file.
pub fn read(path: impl AsRef<Path>) -> Result<Pattern, SourceError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// Parses a pattern document. Only syntax errors fail; bad values are defaulted.
pub fn parse(json: &str) -> Result<Pattern, SourceError> {
    let doc: PatternDocument = serde_json::from_str(json)?;
    Ok(doc.resolve())
}

impl PatternDocument {
    fn resolve(self) -> Pattern {
        let width = dimension("width", self.width, DEFAULT_WIDTH);
        let height = dimension("height", self.height, DEFAULT_HEIGHT);

        let modulus = match integer("mod", self.modulus) {
            None => DEFAULT_MODULUS,
            Some(m) => {
                let clamped = m.clamp(2, MAX_MODULUS as i64) as u32;
                if clamped as i64 != m {
                    log::warn!("mod {} out of range, clamped to {}", m, clamped);
                }
                clamped
            }
        };

        let operator = match text("operation", self.operation) {
            None => Operator::default(),
            Some(s) => Operator::from_symbol(&s).unwrap_or_else(|| {
                log::warn!("unknown operation {:?}, using \"==\"", s);
                Operator::default()
            }),
        };

        let boundary = match text("index", self.index) {
            None => BoundaryMode::default(),
            Some(s) => BoundaryMode::from_name(&s).unwrap_or_else(|| {
                log::warn!("unknown index mode {:?}, using \"mirror\"", s);
                BoundaryMode::default()
            }),
        };

        let sleep = match integer("sleep", self.sleep) {
            Some(ms) if ms >= 0 => ms as u64,
            Some(ms) => {
                log::warn!("negative sleep {}, using {}", ms, DEFAULT_FRAME_INTERVAL_MS);
                DEFAULT_FRAME_INTERVAL_MS
            }
            None => DEFAULT_FRAME_INTERVAL_MS,
        };

        Pattern {
            width,
            height,
            modulus,
            operator,
            boundary,
            transforms: transforms(self.transforms),
            frame_interval: Duration::from_millis(sleep),
        }
    }
}

/// Whole number, also when written as `16.0`. Anything else is ignored with a warning.
fn integer(name: &str, value: Option<Value>) -> Option<i64> {
    let value = value?;
    let parsed = match &value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    if parsed.is_none() {
        log::warn!("{} {} is not a whole number, using default", name, value);
    }
    parsed
}

fn text(name: &str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        other => {
            log::warn!("{} {} is not a string, using default", name, other);
            None
        }
    }
}

fn dimension(name: &str, value: Option<Value>, default: u32) -> u32 {
    match integer(name, value) {
        None => default,
        Some(v) if v > 0 && v <= i64::from(MAX_DIMENSION) => v as u32,
        Some(v) => {
            log::warn!(
                "{} {} is not a usable size (1..={}), using {}",
                name,
                v,
                MAX_DIMENSION,
                default
            );
            default
        }
    }
}

fn transforms(value: Option<Value>) -> Vec<Transform> {
    match value {
        None => Vec::new(),
        Some(Value::Array(matrices)) => matrices.iter().filter_map(matrix_rows).collect(),
        Some(other) => {
            log::warn!("transforms {} is not a list, using none", other);
            Vec::new()
        }
    }
}

/// Top-left 3x3 block of a matrix given as rows; absent or non-numeric entries read as 0.
fn matrix_rows(value: &Value) -> Option<Transform> {
    let Some(rows) = value.as_array() else {
        log::warn!("transform {} is not a matrix, skipped", value);
        return None;
    };

    let mut block = [[0.0f32; 3]; 3];
    for (i, row) in rows.iter().take(3).enumerate() {
        let Some(row) = row.as_array() else {
            log::warn!("transform row {} is not a list, read as zeros", row);
            continue;
        };
        for (j, v) in row.iter().take(3).enumerate() {
            match v.as_f64() {
                Some(f) => block[i][j] = f as f32,
                None => log::warn!("transform entry {} is not a number, read as 0", v),
            }
        }
    }
    Some(Transform::from_rows(block))
}
