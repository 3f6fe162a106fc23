//! Attribute value types.
//!
//! Directory values arrive as strings or octet strings. After conversion they
//! are held as native values, one [`AttrValue`] per directory value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime representation of one attribute value.
///
/// Serialized as `{"type": "text", "value": "..."}` so a value document
/// parses back into exactly the same variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl AttrValue {
    /// Compare the string forms of two values, ignoring case.
    pub fn eq_ignore_case(&self, other: &AttrValue) -> bool {
        self.to_string().to_lowercase() == other.to_string().to_lowercase()
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Integer(n) => write!(f, "{}", n),
            AttrValue::Boolean(true) => write!(f, "TRUE"),
            AttrValue::Boolean(false) => write!(f, "FALSE"),
            AttrValue::Binary(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            AttrValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Integer(value.into())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttrValue::Timestamp(value)
    }
}

/// Anything that can be turned into a sequence of values: a single value is
/// wrapped, a vector or array is taken as is.
pub trait IntoValues {
    fn into_values(self) -> Vec<AttrValue>;
}

macro_rules! single_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValues for $ty {
                fn into_values(self) -> Vec<AttrValue> {
                    vec![self.into()]
                }
            }
        )*
    };
}

single_value!(AttrValue, &str, String, i64, i32, bool, DateTime<Utc>);

impl<T: Into<AttrValue>> IntoValues for Vec<T> {
    fn into_values(self) -> Vec<AttrValue> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<AttrValue>, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Vec<AttrValue> {
        self.into_iter().map(Into::into).collect()
    }
}
