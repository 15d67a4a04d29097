use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute column types carried through the pipeline. They mirror the
/// dBASE column types a shapefile attribute table can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Character,
    Numeric,
    /// 4-byte floating point.
    Float,
    Integer,
    Logical,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub length: u8,
    pub decimals: u8,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind, length: u8, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            kind,
            length,
            decimals,
        }
    }

    pub fn character(name: &str, length: u8) -> Self {
        Self::new(name, FieldKind::Character, length, 0)
    }

    pub fn numeric(name: &str, length: u8, decimals: u8) -> Self {
        Self::new(name, FieldKind::Numeric, length, decimals)
    }

    pub fn float(name: &str, length: u8, decimals: u8) -> Self {
        Self::new(name, FieldKind::Float, length, decimals)
    }

    /// The null value for this column.
    pub fn null_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Character => FieldValue::Character(None),
            FieldKind::Numeric => FieldValue::Numeric(None),
            FieldKind::Float => FieldValue::Float(None),
            FieldKind::Integer => FieldValue::Integer(None),
            FieldKind::Logical => FieldValue::Logical(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Character(Option<String>),
    Numeric(Option<f64>),
    Float(Option<f32>),
    Integer(Option<i32>),
    Logical(Option<bool>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Character(_) => FieldKind::Character,
            FieldValue::Numeric(_) => FieldKind::Numeric,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Logical(_) => FieldKind::Logical,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Character(v) => v.is_none(),
            FieldValue::Numeric(v) => v.is_none(),
            FieldValue::Float(v) => v.is_none(),
            FieldValue::Integer(v) => v.is_none(),
            FieldValue::Logical(v) => v.is_none(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Character(Some(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Numeric(v) => *v,
            FieldValue::Float(v) => v.map(f64::from),
            FieldValue::Integer(v) => v.map(f64::from),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Character(Some(v)) => write!(f, "{}", v),
            FieldValue::Numeric(Some(v)) => write!(f, "{}", v),
            FieldValue::Float(Some(v)) => write!(f, "{:.1}", v),
            FieldValue::Integer(Some(v)) => write!(f, "{}", v),
            FieldValue::Logical(Some(v)) => write!(f, "{}", v),
            _ => f.write_str("<null>"),
        }
    }
}
