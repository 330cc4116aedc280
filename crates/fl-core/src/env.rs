//! Per-run environment.
//!
//! A small string key/value context built once by the application and handed
//! to every ware through its access object.  Conventional keys:
//!
//! | Key            | Meaning                                   |
//! |----------------|-------------------------------------------|
//! | `dir.input`    | directory holding the run's input files   |
//! | `dir.output`   | directory where observers write results   |
//! | `mode.verbose` | `true`/`false`                            |

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunEnv {
    values: BTreeMap<String, String>,
}

impl RunEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_owned(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean lookup.  Accepts `true/false`, `1/0`, `yes/no`.
    /// Returns `None` for missing keys and unparseable values alike.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
