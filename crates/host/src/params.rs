//! Typed accessors for a request's parameter mapping.
//!
//! Each accessor reports failures at the call site of the operation body
//! that asked for the parameter, so `file_line` in a diagnostic points at
//! the handler rather than at this module.

use envelope::Params;
use serde_json::Value;

use crate::document::Point3;
use crate::failure::HandlerError;

#[track_caller]
pub fn required_f64(params: &Params, key: &str) -> Result<f64, HandlerError> {
    match params.get(key) {
        Some(value) => as_f64(key, value),
        None => Err(HandlerError::key(key)),
    }
}

#[track_caller]
pub fn f64_or(params: &Params, key: &str, default: f64) -> Result<f64, HandlerError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => as_f64(key, value),
    }
}

#[track_caller]
pub fn u32_or(params: &Params, key: &str, default: u32) -> Result<u32, HandlerError> {
    let value = f64_or(params, key, f64::from(default))?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(HandlerError::value(format!(
            "parameter '{key}' must be a non-negative integer, got {value}"
        )));
    }
    Ok(value as u32)
}

#[track_caller]
pub fn required_str<'a>(params: &'a Params, key: &str) -> Result<&'a str, HandlerError> {
    match params.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(type_mismatch(key, "a string", other)),
        None => Err(HandlerError::key(key)),
    }
}

#[track_caller]
pub fn str_or<'a>(params: &'a Params, key: &str, default: &'a str) -> Result<&'a str, HandlerError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(type_mismatch(key, "a string", other)),
    }
}

#[track_caller]
pub fn bool_or(params: &Params, key: &str, default: bool) -> Result<bool, HandlerError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(type_mismatch(key, "a boolean", other)),
    }
}

#[track_caller]
pub fn required_point(params: &Params, key: &str) -> Result<Point3, HandlerError> {
    match params.get(key) {
        Some(value) => as_point(key, value),
        None => Err(HandlerError::key(key)),
    }
}

#[track_caller]
pub fn point_or(params: &Params, key: &str, default: Point3) -> Result<Point3, HandlerError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => as_point(key, value),
    }
}

/// Numbers, and strings holding numbers, are accepted.
#[track_caller]
fn as_f64(key: &str, value: &Value) -> Result<f64, HandlerError> {
    // No closures here: #[track_caller] does not reach through them.
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(type_mismatch(key, "a number", other)),
    };
    match parsed {
        Some(number) => Ok(number),
        None => Err(HandlerError::value(format!(
            "could not convert parameter '{key}' to float: {value}"
        ))),
    }
}

#[track_caller]
fn as_point(key: &str, value: &Value) -> Result<Point3, HandlerError> {
    let Value::Array(items) = value else {
        return Err(type_mismatch(key, "an [x, y, z] array", value));
    };
    if items.len() != 3 {
        return Err(HandlerError::value(format!(
            "parameter '{key}' must have exactly 3 coordinates, got {}",
            items.len()
        )));
    }
    Ok([
        as_f64(key, &items[0])?,
        as_f64(key, &items[1])?,
        as_f64(key, &items[2])?,
    ])
}

#[track_caller]
fn type_mismatch(key: &str, expected: &str, got: &Value) -> HandlerError {
    HandlerError::type_error(format!("parameter '{key}' must be {expected}, got {got}"))
}
