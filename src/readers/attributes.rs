//! Conversions between source attribute encodings and [`FieldValue`].

use crate::error::Result;
use crate::models::{FieldDef, FieldKind, FieldValue};
use crate::utils::constants::{
    DEFAULT_NUMERIC_DECIMALS, DEFAULT_NUMERIC_LENGTH, MAX_CHARACTER_LENGTH,
};
use serde_json::Value;
use shapefile::dbase::{self, FieldInfo, FieldType};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::warn;

const DBF_PREFIX_LENGTH: usize = 32;
const DBF_DESCRIPTOR_LENGTH: usize = 32;
const DBF_NAME_LENGTH: usize = 11;
const DBF_DECIMALS_OFFSET: usize = 17;
const DBF_HEADER_TERMINATOR: u8 = 0x0D;

/// Decimal counts declared in a dbf header, keyed by field name.
///
/// `dbase::FieldInfo` keeps these private, so the descriptor array is read directly.
pub(crate) fn declared_decimals(dbf: &Path) -> Result<HashMap<String, u8>> {
    let mut file = BufReader::new(File::open(dbf)?);
    let mut prefix = [0u8; DBF_PREFIX_LENGTH];
    file.read_exact(&mut prefix)?;

    let header_length = u16::from_le_bytes([prefix[8], prefix[9]]) as usize;
    let mut descriptors = vec![0u8; header_length.saturating_sub(DBF_PREFIX_LENGTH)];
    file.read_exact(&mut descriptors)?;

    let mut decimals = HashMap::new();
    for descriptor in descriptors.chunks_exact(DBF_DESCRIPTOR_LENGTH) {
        if descriptor[0] == DBF_HEADER_TERMINATOR {
            break;
        }
        let name = String::from_utf8_lossy(&descriptor[..DBF_NAME_LENGTH])
            .trim_matches('\0')
            .to_string();
        decimals.insert(name, descriptor[DBF_DECIMALS_OFFSET]);
    }
    Ok(decimals)
}

/// Map a dbf field to a [`FieldDef`], keeping its declared decimals when known.
pub(crate) fn field_def_from_dbase(info: &FieldInfo, declared: Option<u8>) -> FieldDef {
    let name = info.name();
    let length = info.length();
    let decimals = declared
        .unwrap_or(DEFAULT_NUMERIC_DECIMALS)
        .min(length.saturating_sub(1));
    match info.field_type() {
        FieldType::Numeric | FieldType::Double => FieldDef::numeric(name, length.max(1), decimals),
        FieldType::Float => FieldDef::float(name, length.max(1), decimals),
        FieldType::Integer => FieldDef::new(name, FieldKind::Integer, length.max(1), 0),
        FieldType::Logical => FieldDef::new(name, FieldKind::Logical, 1, 0),
        // Dates, memos and the rest travel as text
        _ => FieldDef::character(name, length.max(1)),
    }
}

pub(crate) fn value_from_dbase(value: &dbase::FieldValue) -> FieldValue {
    match value {
        dbase::FieldValue::Character(v) => FieldValue::Character(v.clone()),
        dbase::FieldValue::Numeric(v) => FieldValue::Numeric(*v),
        dbase::FieldValue::Double(v) => FieldValue::Numeric(Some(*v)),
        dbase::FieldValue::Float(v) => FieldValue::Float(*v),
        dbase::FieldValue::Integer(v) => FieldValue::Integer(Some(*v)),
        dbase::FieldValue::Logical(v) => FieldValue::Logical(*v),
        other => {
            warn!("Unsupported dBASE value {:?}, stored as null", other);
            FieldValue::Character(None)
        }
    }
}

pub(crate) fn value_to_dbase(value: &FieldValue) -> dbase::FieldValue {
    match value {
        FieldValue::Character(v) => dbase::FieldValue::Character(v.clone()),
        FieldValue::Numeric(v) => dbase::FieldValue::Numeric(*v),
        FieldValue::Float(v) => dbase::FieldValue::Float(*v),
        // dBASE integers have no null encoding
        FieldValue::Integer(v) => dbase::FieldValue::Integer(v.unwrap_or(0)),
        FieldValue::Logical(v) => dbase::FieldValue::Logical(*v),
    }
}

pub(crate) fn value_from_json(value: &Value) -> FieldValue {
    match value {
        Value::String(s) => FieldValue::Character(Some(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => FieldValue::Integer(Some(i as i32)),
            _ => FieldValue::Numeric(n.as_f64()),
        },
        Value::Bool(b) => FieldValue::Logical(Some(*b)),
        Value::Null => FieldValue::Character(None),
        other => FieldValue::Character(Some(other.to_string())),
    }
}

/// Widen a column definition so it can also hold `value`.
pub(crate) fn widen_field(def: &mut FieldDef, value: &FieldValue) {
    if value.is_null() {
        return;
    }
    if def.kind != value.kind() {
        if def.kind == FieldKind::Integer && value.kind() == FieldKind::Numeric {
            def.kind = FieldKind::Numeric;
            def.length = DEFAULT_NUMERIC_LENGTH;
            def.decimals = DEFAULT_NUMERIC_DECIMALS;
        } else if !(def.kind == FieldKind::Numeric && value.kind() == FieldKind::Integer) {
            def.kind = FieldKind::Character;
            def.decimals = 0;
        }
    }
    if def.kind == FieldKind::Character {
        let len = value.to_string().len().min(MAX_CHARACTER_LENGTH as usize) as u8;
        def.length = def.length.max(len);
    }
}

/// Initial column definition for a first-seen value.
pub(crate) fn field_def_for(name: &str, value: &FieldValue) -> FieldDef {
    let mut def = match value.kind() {
        FieldKind::Character => FieldDef::character(name, 1),
        FieldKind::Numeric => {
            FieldDef::numeric(name, DEFAULT_NUMERIC_LENGTH, DEFAULT_NUMERIC_DECIMALS)
        }
        FieldKind::Float => FieldDef::float(name, DEFAULT_NUMERIC_LENGTH, DEFAULT_NUMERIC_DECIMALS),
        FieldKind::Integer => FieldDef::new(name, FieldKind::Integer, 11, 0),
        FieldKind::Logical => FieldDef::new(name, FieldKind::Logical, 1, 0),
    };
    widen_field(&mut def, value);
    def
}
