/// Transformer utilities
use serde_json::Value;

/// Safe get from JSON value
///
/// Path segments are object keys, or array indices when numeric.
pub fn safe_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(part)?,
        };
    }
    Some(current)
}

/// Safe get string from JSON
pub fn safe_get_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    safe_get(value, path)?.as_str()
}

/// Safe get unsigned integer from JSON, saturating to u32
pub fn safe_get_u32(value: &Value, path: &str) -> Option<u32> {
    safe_get(value, path)?
        .as_u64()
        .map(|n| n.min(u32::MAX as u64) as u32)
}
