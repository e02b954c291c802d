//! Document query builders, serialised in the REST API's JSON form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMethod {
    Equal,
    Search,
    Limit,
    CursorAfter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub method: QueryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

impl Query {
    /// Attribute equals the value.
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::Equal,
            attribute: Some(attribute.into()),
            values: vec![value.into()],
        }
    }

    /// Full-text search on an indexed attribute.
    pub fn search(attribute: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            method: QueryMethod::Search,
            attribute: Some(attribute.into()),
            values: vec![Value::String(text.into())],
        }
    }

    pub fn limit(n: usize) -> Self {
        Self {
            method: QueryMethod::Limit,
            attribute: None,
            values: vec![Value::from(n)],
        }
    }

    pub fn cursor_after(id: impl Into<String>) -> Self {
        Self {
            method: QueryMethod::CursorAfter,
            attribute: None,
            values: vec![Value::String(id.into())],
        }
    }

    /// Encoded form for a `queries[]` parameter.
    pub fn to_param(&self) -> String {
        // A struct of strings and JSON values always serialises.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn limit_value(&self) -> Option<usize> {
        match self.method {
            QueryMethod::Limit => self.values.first()?.as_u64().map(|n| n as usize),
            _ => None,
        }
    }

    pub fn cursor_value(&self) -> Option<&str> {
        match self.method {
            QueryMethod::CursorAfter => self.values.first()?.as_str(),
            _ => None,
        }
    }
}
