//! Values the evaluator can produce.

/// Longest string a repeat or padded format may build, in bytes.
pub const MAX_STRING_LEN: usize = 1 << 20;

/// A Python value recovered from literal source.
///
/// `Unknown` stands for a value that exists at run time but cannot be
/// known statically (a call result, an opaque import). It propagates
/// through every operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Unknown,
}

impl Value {
    /// Python's `type(v).__name__`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Unknown => "object",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Python truthiness; `None` when the value is unknown.
    pub fn truthy(&self) -> Option<bool> {
        Some(match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) | Value::List(items) => !items.is_empty(),
            Value::Dict(items) => !items.is_empty(),
            Value::Unknown => return None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value; `True`/`False` count as 1/0 the way Python's `int` does.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Dict lookup by key equality.
    pub fn dict_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Dict(items) => items.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Python `str(v)`.
    pub fn py_str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.py_repr(),
        }
    }

    /// Python `repr(v)`.
    pub fn py_repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_repr(*f),
            Value::Str(s) => str_repr(s),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].py_repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::List(items) => format!("[{}]", join_repr(items)),
            Value::Dict(items) => {
                let inner: Vec<String> = items
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.py_repr(), v.py_repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Unknown => "<unknown>".to_string(),
        }
    }

    /// JSON rendering, used for schema defaults. `Unknown` has none.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::None => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number)?,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Tuple(items) | Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Value::Dict(items) => {
                let mut map = serde_json::Map::new();
                for (k, v) in items {
                    map.insert(k.py_str(), v.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Unknown => return None,
        })
    }
}

fn join_repr(items: &[Value]) -> String {
    items
        .iter()
        .map(Value::py_repr)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn float_repr(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprs_follow_python() {
        assert_eq!(Value::Float(1.0).py_repr(), "1.0");
        assert_eq!(Value::Float(0.25).py_repr(), "0.25");
        assert_eq!(Value::Str("it's".into()).py_repr(), "\"it's\"");
        assert_eq!(
            Value::Dict(vec![(Value::Str("obj".into()), Value::Int(1))]).py_repr(),
            "{'obj': 1}"
        );
        assert_eq!(Value::Tuple(vec![Value::None]).py_repr(), "(None,)");
    }

    #[test]
    fn truthiness() {
        assert_eq!(Value::Str(String::new()).truthy(), Some(false));
        assert_eq!(Value::Dict(vec![]).truthy(), Some(false));
        assert_eq!(Value::Int(3).truthy(), Some(true));
        assert_eq!(Value::Unknown.truthy(), None);
    }
}
