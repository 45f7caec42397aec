//! Response envelope and pagination normalization.
//!
//! The backend services do not agree on one response shape. Every shape
//! the client accepts is mapped here, so callers only ever see the payload
//! itself or a canonical [`Page`].

use jobboard_models::Page;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

// =============================================================================
// Accepted Shapes
// =============================================================================

/// Keys that may hold the item array of a paginated response.
const ITEM_KEYS: &[&str] = &[
    "content",
    "items",
    "results",
    "jobs",
    "companies",
    "reviews",
    "applications",
    "data",
];

const PAGE_KEYS: &[&str] = &["number", "page", "currentPage", "pageNumber"];
const SIZE_KEYS: &[&str] = &["size", "pageSize", "limit"];
const TOTAL_KEYS: &[&str] = &["totalElements", "total", "totalCount", "totalItems"];
const TOTAL_PAGES_KEYS: &[&str] = &["totalPages", "pageCount"];

/// Nested objects that may carry the pagination fields.
const META_KEYS: &[&str] = &["pagination", "meta", "pageable"];

// =============================================================================
// Envelopes
// =============================================================================

/// Unwrap a `{ "data": X, ... }` envelope. Anything else is returned as-is.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// The human-readable message of a response body, if any.
pub fn extract_message(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Decode a payload after unwrapping its envelope.
pub fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    Ok(serde_json::from_value(unwrap_data(value))?)
}

// =============================================================================
// Pagination
// =============================================================================

/// Map any accepted paginated shape into a [`Page`].
///
/// Accepted shapes: a bare array; Spring-style `content`/`number`/
/// `totalPages`; `items`-style lists with `page`/`total`; any of those
/// under a `data` envelope; pagination fields nested under
/// `pagination`/`meta`. Page indices are zero-based.
pub fn normalize_page<T: DeserializeOwned>(value: Value) -> ApiResult<Page<T>> {
    // A `data` array is the item list itself; its siblings carry the counts.
    let value = match value {
        Value::Object(map) if map.get("data").is_some_and(Value::is_array) => Value::Object(map),
        other => unwrap_data(other),
    };

    let map = match value {
        Value::Array(items) => {
            let items = decode_items(items)?;
            return Ok(Page::single(items));
        }
        Value::Object(map) => map,
        Value::Null => return Ok(Page::empty()),
        other => {
            return Err(ApiError::invalid_response(format!(
                "expected a list or paginated object, got {}",
                type_name(&other)
            )))
        }
    };

    let items_value = ITEM_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| v.is_array()))
        .cloned()
        .ok_or_else(|| ApiError::invalid_response("paginated response has no item list"))?;

    let items: Vec<T> = match items_value {
        Value::Array(items) => decode_items(items)?,
        _ => Vec::new(),
    };

    let meta = META_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_object));
    let lookup = |keys: &[&str]| number_at(&map, keys).or_else(|| meta.and_then(|m| number_at(m, keys)));

    let len = items.len() as u64;
    let page = lookup(PAGE_KEYS).unwrap_or(0);
    let size = lookup(SIZE_KEYS).unwrap_or(len);
    let total_elements = lookup(TOTAL_KEYS).unwrap_or(len);
    let total_pages = lookup(TOTAL_PAGES_KEYS).unwrap_or_else(|| {
        if size == 0 {
            if len == 0 {
                0
            } else {
                1
            }
        } else {
            total_elements.div_ceil(size)
        }
    });

    Ok(Page {
        items,
        page: page as u32,
        size: size as u32,
        total_elements,
        total_pages: total_pages as u32,
    })
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> ApiResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ApiError::from))
        .collect()
}

fn number_at(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_u64))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_data_envelope() {
        assert_eq!(unwrap_data(json!({ "data": { "a": 1 }, "success": true })), json!({ "a": 1 }));
        assert_eq!(unwrap_data(json!({ "a": 1 })), json!({ "a": 1 }));
        assert_eq!(unwrap_data(json!({ "data": null, "a": 1 })), json!({ "data": null, "a": 1 }));
    }

    #[test]
    fn test_extract_message_prefers_message_then_error() {
        assert_eq!(
            extract_message(&json!({ "message": "m", "error": "e" })).as_deref(),
            Some("m")
        );
        assert_eq!(extract_message(&json!({ "error": "e" })).as_deref(), Some("e"));
        assert_eq!(extract_message(&json!({ "detail": " d " })).as_deref(), Some("d"));
        assert_eq!(extract_message(&json!({ "message": "" })), None);
        assert_eq!(extract_message(&json!([1])), None);
    }

    #[test]
    fn test_spring_page_shape() {
        let page: Page<u32> = normalize_page(json!({
            "content": [1, 2],
            "number": 1,
            "size": 2,
            "totalElements": 5,
            "totalPages": 3
        }))
        .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.page, 1);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_items_shape_under_data_envelope() {
        let page: Page<u32> = normalize_page(json!({
            "success": true,
            "data": { "companies": [1, 2, 3], "page": 0, "pageSize": 3, "total": 7 }
        }))
        .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
    }

    #[test]
    fn test_nested_pagination_meta() {
        let page: Page<u32> = normalize_page(json!({
            "jobs": [4],
            "pagination": { "currentPage": 2, "totalPages": 3, "totalItems": 9 }
        }))
        .unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next());
    }

    #[test]
    fn test_data_array_keeps_sibling_counts() {
        let page: Page<u32> = normalize_page(json!({
            "data": [1, 2],
            "page": 0,
            "size": 2,
            "total": 4
        }))
        .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_bare_array_and_null() {
        let page: Page<u32> = normalize_page(json!([1, 2, 3])).unwrap();
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
        let empty: Page<u32> = normalize_page(Value::Null).unwrap();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_rejects_unknown_shapes() {
        assert!(normalize_page::<u32>(json!({ "rows": [1] })).is_err());
        assert!(normalize_page::<u32>(json!("nope")).is_err());
    }
}
