//! Flat key-value argument sets for the dispatch boundary.
//!
//! Every dispatched method call carries its arguments as a flat map of
//! field name to [`ArgValue`]. Type and range checking happen in the
//! dispatcher; this module only defines the wire-side value types.

use std::collections::HashMap;

/// Argument set for one dispatched method call.
pub type CallArgs = HashMap<String, ArgValue>;

/// Argument value types accepted over the dispatch boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ArgValue {
    /// Convert to i64 if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to f64 if possible (integers widen losslessly).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert to string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for ArgValue {
    fn from(i: i32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<u32> for ArgValue {
    fn from(i: u32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// Create a [`CallArgs`] map with key-value pairs.
///
/// # Example
/// ```
/// use soundfont_voicer::args;
///
/// let args = args! {
///     "path" => "piano.sf2",
///     "bank" => 0,
///     "program" => 0,
/// };
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::CallArgs::new();
        $(
            map.insert($key.to_string(), $value.into());
        )*
        map
    }};
}
