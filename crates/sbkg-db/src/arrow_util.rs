//! Small helpers shared by every table's Arrow <-> Rust conversion, so each
//! `schema_arrow` function stays a plain list of columns instead of a wall
//! of repeated downcasts.

use crate::error::{DbError, Result};
use arrow_array::{Array, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};

pub fn get_string(batch: &RecordBatch, col: usize, row: usize) -> String {
    batch.column(col).as_any().downcast_ref::<StringArray>().unwrap().value(row).to_string()
}

pub fn get_opt_string(batch: &RecordBatch, col: usize, row: usize) -> Option<String> {
    let arr = batch.column(col).as_any().downcast_ref::<StringArray>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row).to_string()) }
}

pub fn get_i64(batch: &RecordBatch, col: usize, row: usize) -> i64 {
    batch.column(col).as_any().downcast_ref::<Int64Array>().unwrap().value(row)
}

pub fn get_opt_i64(batch: &RecordBatch, col: usize, row: usize) -> Option<i64> {
    let arr = batch.column(col).as_any().downcast_ref::<Int64Array>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row)) }
}

pub fn get_f64(batch: &RecordBatch, col: usize, row: usize) -> f64 {
    batch.column(col).as_any().downcast_ref::<Float64Array>().unwrap().value(row)
}

pub fn get_bool(batch: &RecordBatch, col: usize, row: usize) -> bool {
    batch.column(col).as_any().downcast_ref::<BooleanArray>().unwrap().value(row)
}

/// Parse a JSON column into a typed value, defaulting when the cell is null.
pub fn get_json<T: serde::de::DeserializeOwned + Default>(batch: &RecordBatch, col: usize, row: usize) -> Result<T> {
    match get_opt_string(batch, col, row) {
        Some(s) => serde_json::from_str(&s).map_err(DbError::from),
        None => Ok(T::default()),
    }
}

pub fn to_json(value: &impl serde::Serialize) -> Result<String> {
    serde_json::to_string(value).map_err(DbError::from)
}
