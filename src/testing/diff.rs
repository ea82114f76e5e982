//! Field-level differences between two states.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// One field whose expected and actual values differ.
///
/// `path` is rooted at `$`, e.g. `$.path[0].state.title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, actual {}",
            self.path, self.expected, self.actual
        )
    }
}

const MISSING: &str = "<missing>";

/// List the fields where `expected` and `actual` differ.
///
/// States are compared through their JSON form. When that form cannot be
/// produced, or hides the difference, a single whole-state entry at `$` is
/// returned using the `Debug` output.
pub fn state_diff<S>(expected: &S, actual: &S) -> Vec<FieldDiff>
where
    S: Serialize + fmt::Debug,
{
    let mut diffs = Vec::new();
    if let (Ok(expected), Ok(actual)) = (serde_json::to_value(expected), serde_json::to_value(actual))
    {
        walk("$".to_string(), &expected, &actual, &mut diffs);
    }
    if diffs.is_empty() {
        diffs.push(FieldDiff {
            path: "$".to_string(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        });
    }
    diffs
}

fn walk(path: String, expected: &Value, actual: &Value, diffs: &mut Vec<FieldDiff>) {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, value) in expected {
                let child = format!("{path}.{key}");
                match actual.get(key) {
                    Some(other) => walk(child, value, other, diffs),
                    None => diffs.push(FieldDiff {
                        path: child,
                        expected: value.to_string(),
                        actual: MISSING.to_string(),
                    }),
                }
            }
            for (key, value) in actual {
                if !expected.contains_key(key) {
                    diffs.push(FieldDiff {
                        path: format!("{path}.{key}"),
                        expected: MISSING.to_string(),
                        actual: value.to_string(),
                    });
                }
            }
        }
        (Value::Array(expected), Value::Array(actual)) => {
            for index in 0..expected.len().max(actual.len()) {
                let child = format!("{path}[{index}]");
                match (expected.get(index), actual.get(index)) {
                    (Some(e), Some(a)) => walk(child, e, a, diffs),
                    (Some(e), None) => diffs.push(FieldDiff {
                        path: child,
                        expected: e.to_string(),
                        actual: MISSING.to_string(),
                    }),
                    (None, Some(a)) => diffs.push(FieldDiff {
                        path: child,
                        expected: MISSING.to_string(),
                        actual: a.to_string(),
                    }),
                    (None, None) => {}
                }
            }
        }
        (expected, actual) if expected != actual => diffs.push(FieldDiff {
            path,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        _ => {}
    }
}
