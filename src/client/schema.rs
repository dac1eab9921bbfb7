//! # Schema Helpers
//!
//! The game API accepts only a subset of JSON Schema. These helpers check
//! action descriptors against that subset, strip what `schemars` adds on top
//! of it, and build sample parameters for a schema so the loopback
//! counterpart can answer forced actions on its own.

use serde_json::{Map, Value};

/// Characters allowed in action names.
pub const ACTION_NAME_ALLOWED_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789_-";

/// Schema keywords the game API does not support.
pub const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &[
    "$anchor",
    "$comment",
    "$defs",
    "$dynamicAnchor",
    "$dynamicRef",
    "$id",
    "$ref",
    "$schema",
    "$vocabulary",
    "additionalProperties",
    "allOf",
    "anyOf",
    "contentEncoding",
    "contentMediaType",
    "contentSchema",
    "definitions",
    "dependentRequired",
    "dependentSchemas",
    "deprecated",
    "description",
    "else",
    "if",
    "maxProperties",
    "minProperties",
    "not",
    "oneOf",
    "patternProperties",
    "readOnly",
    "then",
    "title",
    "unevaluatedItems",
    "unevaluatedProperties",
    "writeOnly",
];

/// Keywords whose value is a map from property name to sub-schema.
const SCHEMA_MAP_KEYS: &[&str] = &["properties", "definitions", "$defs", "patternProperties"];

/// Keywords whose value is a single sub-schema or an array of them.
const SUBSCHEMA_KEYS: &[&str] = &[
    "items",
    "additionalItems",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "allOf",
    "anyOf",
    "oneOf",
    "prefixItems",
];

/// Problems with an action name, in the order they are checked.
pub fn name_problems(name: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if name.is_empty() {
        problems.push("Action name is empty.".to_string());
    } else if !name.chars().all(|c| ACTION_NAME_ALLOWED_CHARS.contains(c)) {
        problems.push(format!(
            "Action name \"{name}\" should only contain lowercase letters, digits, '_' and '-'."
        ));
    }
    problems
}

/// Collects unsupported keywords anywhere in `schema`.
///
/// Property names are not keywords: a property called `title` is fine.
pub fn unsupported_keys(schema: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_unsupported(schema, &mut found);
    found
}

fn collect_unsupported(schema: &Value, found: &mut Vec<String>) {
    let Value::Object(map) = schema else {
        return;
    };
    for (key, value) in map {
        if UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
            found.push(key.clone());
        }
        if SCHEMA_MAP_KEYS.contains(&key.as_str()) {
            if let Value::Object(props) = value {
                for sub in props.values() {
                    collect_unsupported(sub, found);
                }
            }
        } else if SUBSCHEMA_KEYS.contains(&key.as_str()) {
            for_each_subschema(value, |sub| collect_unsupported(sub, found));
        }
    }
}

fn for_each_subschema(value: &Value, mut f: impl FnMut(&Value)) {
    match value {
        Value::Array(items) => items.iter().for_each(&mut f),
        other => f(other),
    }
}

/// Removes the keywords `schemars` emits that the game API rejects:
/// `$schema`, `title`, `definitions` and per-field `description`s.
pub fn normalize(schema: Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(normalize_map(map)),
        other => other,
    }
}

fn normalize_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        if matches!(
            key.as_str(),
            "$schema" | "title" | "description" | "definitions"
        ) {
            continue;
        }
        let value = if SCHEMA_MAP_KEYS.contains(&key.as_str()) {
            match value {
                Value::Object(props) => Value::Object(
                    props
                        .into_iter()
                        .map(|(name, sub)| (name, normalize(sub)))
                        .collect(),
                ),
                other => other,
            }
        } else if SUBSCHEMA_KEYS.contains(&key.as_str()) {
            match value {
                Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
                other => normalize(other),
            }
        } else {
            value
        };
        out.insert(key, value);
    }
    out
}

/// Builds a value that satisfies the simple shapes of `schema`.
///
/// Follows `const`, then the first `enum` entry, then `type`. Objects get
/// every declared property; arrays get `minItems` elements.
pub fn sample(schema: &Value) -> Value {
    let Value::Object(map) = schema else {
        return Value::Null;
    };
    if let Some(constant) = map.get("const") {
        return constant.clone();
    }
    if let Some(Value::Array(options)) = map.get("enum")
        && let Some(first) = options.first()
    {
        return first.clone();
    }

    let ty = match map.get("type") {
        Some(Value::String(ty)) => ty.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("null"),
        _ if map.contains_key("properties") => "object",
        _ => "null",
    };

    match ty {
        "object" => {
            let mut out = Map::new();
            if let Some(Value::Object(props)) = map.get("properties") {
                for (name, sub) in props {
                    out.insert(name.clone(), sample(sub));
                }
            }
            Value::Object(out)
        }
        "array" => {
            let count = map.get("minItems").and_then(Value::as_u64).unwrap_or(0);
            let item = map.get("items").map(sample).unwrap_or(Value::Null);
            Value::Array((0..count).map(|_| item.clone()).collect())
        }
        "string" => {
            let min = map.get("minLength").and_then(Value::as_u64).unwrap_or(0) as usize;
            Value::String("x".repeat(min))
        }
        "integer" => map
            .get("minimum")
            .and_then(Value::as_i64)
            .map(Value::from)
            .unwrap_or(Value::from(0)),
        "number" => map
            .get("minimum")
            .cloned()
            .unwrap_or(Value::from(0.0)),
        "boolean" => Value::Bool(false),
        _ => Value::Null,
    }
}
