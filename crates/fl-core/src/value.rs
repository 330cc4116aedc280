//! Typed values stored in variables, input data and event payloads.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── ValueKind ─────────────────────────────────────────────────────────────────

/// The type tag of a [`Value`].  A variable's kind is fixed at first write.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    Real,
    Integer,
    Boolean,
    String,
    Vector,
    Matrix,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Real    => "real",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::String  => "string",
            ValueKind::Vector  => "vector",
            ValueKind::Matrix  => "matrix",
        };
        f.write_str(s)
    }
}

// ── Matrix ────────────────────────────────────────────────────────────────────

/// Dense row-major matrix of reals.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix filled with `fill`.
    pub fn filled(rows: usize, cols: usize, fill: f64) -> Self {
        Self { rows, cols, data: vec![fill; rows * cols] }
    }

    /// Wrap row-major `data`; its length must be `rows * cols`.
    pub fn from_rows(rows: usize, cols: usize, data: Vec<f64>) -> CoreResult<Self> {
        if data.len() != rows * cols {
            return Err(CoreError::MatrixShape {
                rows,
                cols,
                expected: rows * cols,
                got:      data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at (`row`, `col`), or `None` if out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, v: f64) -> bool {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = v;
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A dynamically typed simulation value.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Real(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    Vector(Vec<f64>),
    Matrix(Matrix),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Real(_)    => ValueKind::Real,
            Value::Integer(_) => ValueKind::Integer,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::String(_)  => ValueKind::String,
            Value::Vector(_)  => ValueKind::Vector,
            Value::Matrix(_)  => ValueKind::Matrix,
        }
    }

    /// Read as a real.  Integers widen; every other kind is a conversion error.
    pub fn as_real(&self) -> CoreResult<f64> {
        match self {
            Value::Real(v)    => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            other => Err(CoreError::Conversion { expected: ValueKind::Real, got: other.kind() }),
        }
    }

    pub fn as_integer(&self) -> CoreResult<i64> {
        match self {
            Value::Integer(v) => Ok(*v),
            other => Err(CoreError::Conversion { expected: ValueKind::Integer, got: other.kind() }),
        }
    }

    pub fn as_bool(&self) -> CoreResult<bool> {
        match self {
            Value::Boolean(v) => Ok(*v),
            other => Err(CoreError::Conversion { expected: ValueKind::Boolean, got: other.kind() }),
        }
    }

    pub fn as_str(&self) -> CoreResult<&str> {
        match self {
            Value::String(v) => Ok(v),
            other => Err(CoreError::Conversion { expected: ValueKind::String, got: other.kind() }),
        }
    }

    pub fn as_vector(&self) -> CoreResult<&[f64]> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(CoreError::Conversion { expected: ValueKind::Vector, got: other.kind() }),
        }
    }

    pub fn as_matrix(&self) -> CoreResult<&Matrix> {
        match self {
            Value::Matrix(v) => Ok(v),
            other => Err(CoreError::Conversion { expected: ValueKind::Matrix, got: other.kind() }),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Matrix> for Value {
    fn from(v: Matrix) -> Self {
        Value::Matrix(v)
    }
}

impl fmt::Display for Value {
    /// Vectors and matrix rows are `;`-separated, matrix rows `|`-separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(v)    => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::String(v)  => f.write_str(v),
            Value::Vector(v)  => write_joined(f, v),
            Value::Matrix(m)  => {
                for (r, row) in m.data.chunks(m.cols.max(1)).enumerate() {
                    if r > 0 {
                        f.write_str("|")?;
                    }
                    write_joined(f, row)?;
                }
                Ok(())
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(";")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}
