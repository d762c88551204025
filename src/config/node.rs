//! Typed view over a parsed TOML table
//!
//! Mission and template files have dynamic keys (one table per mission, free
//! form `targets` sections), so they are read through this accessor layer
//! instead of fixed serde structs. Every node remembers its dotted path so
//! criteria errors can point at the offending field.

use toml::{Table, Value};

#[derive(Debug, Clone)]
pub struct ConfigNode<'a> {
    table: &'a Table,
    path: String,
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

impl<'a> ConfigNode<'a> {
    pub fn root(table: &'a Table) -> Self {
        Self {
            table,
            path: String::new(),
        }
    }

    /// A node for `table` living at `path` (used for top-level entries).
    pub fn at(table: &'a Table, path: &str) -> Self {
        Self {
            table,
            path: path.to_string(),
        }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Key of this node inside its parent.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or("")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dotted path of `key` below this node.
    pub fn path_of(&self, key: &str) -> String {
        join(&self.path, key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.table.keys().map(|k| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.table.get(key)
    }

    /// Scalars are stringified; tables and arrays are not strings.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.table.get(key).and_then(scalar_to_string)
    }

    /// Like `get_string`, but blank strings count as absent.
    pub fn get_non_blank(&self, key: &str) -> Option<String> {
        self.get_string(key).filter(|s| !s.trim().is_empty())
    }

    /// Arrays of scalars, or a single scalar as a one-element list.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_list(key).unwrap_or_default()
    }

    /// `None` when the key is absent, so callers can tell "unset" from "empty".
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        match self.table.get(key)? {
            Value::Array(items) => Some(items.iter().filter_map(scalar_to_string).collect()),
            other => Some(scalar_to_string(other).into_iter().collect()),
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.table.get(key)? {
            Value::Integer(i) => Some(*i),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.table.get(key) {
            Some(Value::Boolean(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Child table, if `key` holds one.
    pub fn get_subsection(&self, key: &str) -> Option<ConfigNode<'a>> {
        match self.table.get(key)? {
            Value::Table(table) => Some(ConfigNode {
                table,
                path: self.path_of(key),
            }),
            _ => None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}
