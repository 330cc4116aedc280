//! String-keyed ware parameters with typed getters.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{WareError, WareResult, WareSignature};

/// Separator of list-valued parameters (`"0.1;0.2;0.4"`).
pub const LIST_SEPARATOR: char = ';';

/// Parameters bound to one ware instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WareParams {
    values: BTreeMap<String, String>,
}

impl WareParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_owned(), value.into());
    }

    /// Fill in the declared default of every parameter not given explicitly.
    pub fn apply_defaults(&mut self, signature: &WareSignature) {
        for spec in &signature.params {
            if let Some(default) = &spec.default {
                self.values.entry(spec.name.clone()).or_insert_with(|| default.clone());
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ── Typed getters ─────────────────────────────────────────────────────

    pub fn string(&self, name: &str) -> WareResult<&str> {
        self.get(name).ok_or_else(|| WareError::MissingParam(name.to_owned()))
    }

    pub fn real(&self, name: &str) -> WareResult<f64> {
        parse(name, self.string(name)?, "a real")
    }

    pub fn integer(&self, name: &str) -> WareResult<i64> {
        parse(name, self.string(name)?, "an integer")
    }

    pub fn boolean(&self, name: &str) -> WareResult<bool> {
        let raw = self.string(name)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(invalid(name, raw, "a boolean")),
        }
    }

    /// `;`-separated reals.  An empty string is an empty list.
    pub fn reals(&self, name: &str) -> WareResult<Vec<f64>> {
        self.list(name, "a list of reals")
    }

    pub fn integers(&self, name: &str) -> WareResult<Vec<i64>> {
        self.list(name, "a list of integers")
    }

    pub fn strings(&self, name: &str) -> WareResult<Vec<String>> {
        Ok(split(self.string(name)?).map(str::to_owned).collect())
    }

    /// [`real`](Self::real), falling back to `default` when absent.  A
    /// present but malformed value is still an error.
    pub fn real_or(&self, name: &str, default: f64) -> WareResult<f64> {
        if self.contains(name) { self.real(name) } else { Ok(default) }
    }

    pub fn integer_or(&self, name: &str, default: i64) -> WareResult<i64> {
        if self.contains(name) { self.integer(name) } else { Ok(default) }
    }

    fn list<T: FromStr>(&self, name: &str, expected: &'static str) -> WareResult<Vec<T>> {
        let raw = self.string(name)?;
        split(raw)
            .map(|item| item.parse().map_err(|_| invalid(name, raw, expected)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WareParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

fn split(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LIST_SEPARATOR).map(str::trim).filter(|s| !s.is_empty())
}

fn parse<T: FromStr>(name: &str, raw: &str, expected: &'static str) -> WareResult<T> {
    raw.trim().parse().map_err(|_| invalid(name, raw, expected))
}

fn invalid(name: &str, raw: &str, expected: &'static str) -> WareError {
    WareError::InvalidParam { name: name.to_owned(), value: raw.to_owned(), expected }
}
