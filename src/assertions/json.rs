//! JSON structure assertions.
//!
//! A [`JsonShape`] lists the keys a JSON document must contain. Bare keys only
//! require presence, keyed literals require a (loosely) equal value and keyed
//! shapes recurse. A shape checked against an array applies to every element.

use serde_json::Value;

use crate::http::CapturedResponse;

/// Build a [`JsonShape`] with list/keyed syntax.
///
/// ```
/// use controller_harness::json_shape;
///
/// let shape = json_shape!["status", "result" => ["data" => 123, "test"]];
/// assert_eq!(shape.entries().len(), 2);
/// ```
#[macro_export]
macro_rules! json_shape {
    (@entries [$($out:expr),*]) => {
        $crate::assertions::JsonShape::new(vec![$($out),*])
    };
    (@entries [$($out:expr),*] $key:literal => [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $crate::json_shape!(
            @entries [$($out,)* $crate::assertions::ShapeEntry::nested($key, $crate::json_shape!($($inner)*))]
            $($($rest)*)?
        )
    };
    (@entries [$($out:expr),*] $key:literal => $value:expr $(, $($rest:tt)*)?) => {
        $crate::json_shape!(
            @entries [$($out,)* $crate::assertions::ShapeEntry::value($key, $value)]
            $($($rest)*)?
        )
    };
    (@entries [$($out:expr),*] $key:literal $(, $($rest:tt)*)?) => {
        $crate::json_shape!(
            @entries [$($out,)* $crate::assertions::ShapeEntry::key($key)]
            $($($rest)*)?
        )
    };
    ($($tt:tt)*) => {
        $crate::json_shape!(@entries [] $($tt)*)
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeEntry {
    /// Key must exist; its value is not checked
    Key(String),
    /// Key must exist and equal the literal
    Value(String, Value),
    /// Key must exist and match the nested shape
    Nested(String, JsonShape),
}

impl ShapeEntry {
    pub fn key(name: impl Into<String>) -> Self {
        ShapeEntry::Key(name.into())
    }

    pub fn value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        ShapeEntry::Value(name.into(), value.into())
    }

    pub fn nested(name: impl Into<String>, shape: JsonShape) -> Self {
        ShapeEntry::Nested(name.into(), shape)
    }

    pub fn name(&self) -> &str {
        match self {
            ShapeEntry::Key(name) | ShapeEntry::Value(name, _) | ShapeEntry::Nested(name, _) => {
                name
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonShape {
    entries: Vec<ShapeEntry>,
}

impl JsonShape {
    pub fn new(entries: Vec<ShapeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ShapeEntry] {
        &self.entries
    }

    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.entries.push(ShapeEntry::key(name));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(ShapeEntry::value(name, value));
        self
    }

    pub fn nested(mut self, name: impl Into<String>, shape: JsonShape) -> Self {
        self.entries.push(ShapeEntry::nested(name, shape));
        self
    }

    /// Interpret a JSON value as a shape.
    ///
    /// Array items that are strings become bare keys and object items are
    /// merged in. Object members whose value is an array or object become
    /// nested shapes; scalar members become literals.
    pub fn from_value(value: &Value) -> Self {
        let mut shape = JsonShape::default();
        match value {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(name) => shape.entries.push(ShapeEntry::key(name.as_str())),
                        Value::Object(_) => shape.entries.extend(Self::from_value(item).entries),
                        other => shape.entries.push(ShapeEntry::key(other.to_string())),
                    }
                }
            }
            Value::Object(map) => {
                for (name, member) in map {
                    let entry = match member {
                        Value::Array(_) | Value::Object(_) => {
                            ShapeEntry::nested(name.as_str(), Self::from_value(member))
                        }
                        scalar => ShapeEntry::value(name.as_str(), scalar.clone()),
                    };
                    shape.entries.push(entry);
                }
            }
            Value::String(name) => shape.entries.push(ShapeEntry::key(name.as_str())),
            _ => {}
        }
        shape
    }
}

impl From<Value> for JsonShape {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

/// Check `data` against `shape`, returning a description of the first mismatch.
pub fn check_structure(shape: &JsonShape, data: &Value) -> Result<(), String> {
    check_container(shape, data, "$")
}

fn check_container(shape: &JsonShape, data: &Value, path: &str) -> Result<(), String> {
    match data {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                check_object(shape, item, &format!("{}[{}]", path, index))?;
            }
            Ok(())
        }
        Value::Object(_) => check_object(shape, data, path),
        other => Err(format!(
            "{}: expected an object or array, found {}",
            path,
            type_name(other)
        )),
    }
}

fn check_object(shape: &JsonShape, data: &Value, path: &str) -> Result<(), String> {
    let Value::Object(map) = data else {
        return Err(format!(
            "{}: expected an object, found {}",
            path,
            type_name(data)
        ));
    };

    for entry in shape.entries() {
        let name = entry.name();
        let Some(actual) = map.get(name) else {
            return Err(format!("{}: missing key '{}'", path, name));
        };
        let child = format!("{}.{}", path, name);
        match entry {
            ShapeEntry::Key(_) => {}
            ShapeEntry::Value(_, expected) => {
                if !loosely_equal(expected, actual) {
                    return Err(format!(
                        "{}: expected {} but found {}",
                        child, expected, actual
                    ));
                }
            }
            ShapeEntry::Nested(_, nested) => check_container(nested, actual, &child)?,
        }
    }
    Ok(())
}

/// Equality that treats `123`, `123.0` and `"123"` as the same value.
fn loosely_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        _ => expected == actual,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Assert the captured response body matches `shape`.
pub fn assert_json_structure(response: &CapturedResponse, shape: &JsonShape) {
    let data: Value = match response.json() {
        Ok(data @ (Value::Object(_) | Value::Array(_))) => data,
        _ => panic!(
            "response body could not be parsed as a JSON object or array: {}",
            response.text()
        ),
    };
    assert_json_structure_in(shape, &data);
}

/// Assert `data` matches `shape`.
pub fn assert_json_structure_in(shape: &JsonShape, data: &Value) {
    if let Err(mismatch) = check_structure(shape, data) {
        panic!("JSON structure mismatch at {}", mismatch);
    }
}
