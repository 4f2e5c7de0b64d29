//! The dynamically-typed value substrate used as the universal IR for
//! decoded literals (see §4.4 of the design: value substrate is an external
//! collaborator, specified only down to its required operations).
//!
//! `Map` is an ordered association list rather than a hash map: keys are
//! arbitrary values (not just strings), and ordered iteration is a required
//! operation the front-end relies on for stable dumps.

use std::fmt;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn empty_array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    /// Length for sequences, mappings, and strings (code-point count);
    /// `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(v) => Some(v.len()),
            Value::Map(v) => Some(v.len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.len(), Some(0))
    }

    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        match self {
            Value::Array(v) => v.get(idx),
            _ => None,
        }
    }

    pub fn set_index(&mut self, idx: usize, value: Value) -> bool {
        match self {
            Value::Array(v) if idx < v.len() => {
                v[idx] = value;
                true
            }
            _ => false,
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        match self {
            Value::Map(entries) => entries.iter().any(|(k, _)| k == key),
            _ => false,
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Sets `key` to `value`, overwriting an existing entry in place so
    /// ordered iteration is stable across updates.
    pub fn set(&mut self, key: Value, value: Value) {
        if let Value::Map(entries) = self {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    pub fn delete(&mut self, key: &Value) -> bool {
        if let Value::Map(entries) = self {
            if let Some(pos) = entries.iter().position(|(k, _)| k == key) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn entries(&self) -> Vec<&(Value, Value)> {
        match self {
            Value::Map(entries) => entries.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_set_overwrites_in_place() {
        let mut v = Value::empty_map();
        v.set(Value::Str("a".into()), Value::Int(1));
        v.set(Value::Str("b".into()), Value::Int(2));
        v.set(Value::Str("a".into()), Value::Int(3));
        assert_eq!(v.entries().len(), 2);
        assert_eq!(v.get(&Value::Str("a".into())), Some(&Value::Int(3)));
    }

    #[test]
    fn array_length_and_index() {
        let v = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(v.len(), Some(2));
        assert_eq!(v.get_index(1), Some(&Value::Int(2)));
        assert_eq!(v.get_index(5), None);
    }
}
