//! JSON rendering of descriptors and fragments.
//!
//! The in-memory types preserve insertion order; the JSON view is rendered
//! through `serde_json` and therefore sorts object keys, which keeps output
//! deterministic. Dates render as RFC 3339 strings (an invalid date renders
//! as null), compiled regexes render as their pattern source with any inline
//! flag group included.
//!
//! # Examples
//!
//! ```
//! use query_sieve::{Config, QueryHandler};
//! use query_sieve::output::descriptor_to_json;
//!
//! let handler = QueryHandler::new(Config::default());
//! let descriptor = handler.handle_str("name=mike");
//! assert_eq!(
//!     descriptor_to_json(&descriptor),
//!     r#"{"fields":null,"opts":{"name":"mike"},"pageSort":{"limit":0,"skip":0,"sort":{}}}"#
//! );
//! ```

use serde_json::{Map, Value as Json};

use crate::fragment::Fragment;
use crate::handler::QueryDescriptor;
use crate::value::Value;

pub fn descriptor_to_json(descriptor: &QueryDescriptor) -> String {
    serde_json::to_string(&descriptor_value(descriptor)).unwrap_or_default()
}

pub fn descriptor_to_json_pretty(descriptor: &QueryDescriptor) -> String {
    serde_json::to_string_pretty(&descriptor_value(descriptor)).unwrap_or_default()
}

pub fn fragment_to_json(fragment: &Fragment) -> String {
    serde_json::to_string(&fragment_value(fragment)).unwrap_or_default()
}

/// The driver-facing JSON shape: `fields`, `opts`, and `pageSort`, with each
/// population request as its own top-level key.
pub fn descriptor_value(descriptor: &QueryDescriptor) -> Json {
    let mut map = Map::new();

    map.insert(
        "fields".to_string(),
        match &descriptor.fields {
            Some(fields) => Json::String(fields.clone()),
            None => Json::Null,
        },
    );
    map.insert("opts".to_string(), fragment_value(&descriptor.opts));

    let mut page_sort = Map::new();
    let mut sort = Map::new();
    for (field, direction) in &descriptor.page_sort.sort {
        sort.insert(field.clone(), Json::from(*direction));
    }
    page_sort.insert("sort".to_string(), Json::Object(sort));
    page_sort.insert("skip".to_string(), Json::from(descriptor.page_sort.skip));
    page_sort.insert("limit".to_string(), Json::from(descriptor.page_sort.limit));
    map.insert("pageSort".to_string(), Json::Object(page_sort));

    for (key, fields) in &descriptor.populate {
        map.insert(key.clone(), Json::String(fields.clone()));
    }

    Json::Object(map)
}

pub fn fragment_value(fragment: &Fragment) -> Json {
    let mut map = Map::new();
    for (key, value) in fragment.iter() {
        map.insert(key.to_string(), json_value(value));
    }
    Json::Object(map)
}

fn json_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(Some(dt)) => Json::String(dt.to_rfc3339()),
        Value::Date(None) => Json::Null,
        Value::Regex(re) => Json::String(re.as_str().to_string()),
        Value::Array(items) => Json::Array(items.iter().map(json_value).collect()),
        Value::Fragment(fragment) => fragment_value(fragment),
        Value::FragmentList(list) => Json::Array(list.iter().map(fragment_value).collect()),
    }
}
