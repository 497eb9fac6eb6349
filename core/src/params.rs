//! Parameter declarations and the grid of bindings every case runs under.

use std::fmt;

use crate::error::{HarnessError, HarnessResult};
use rustc_hash::FxHashSet;

/// Largest value a parameter may take.
pub const MAX_PARAM_VALUE: u64 = 1_000_000;

/// One named integer parameter and the values it ranges over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    name: String,
    values: Vec<u64>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, values: impl Into<Vec<u64>>) -> Self {
        Self {
            name: name.into(),
            values: values.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::config("parameter name must not be empty"));
        }
        if self.values.is_empty() {
            return Err(HarnessError::config(format!(
                "parameter '{}' declares no values",
                self.name
            )));
        }
        let mut seen = FxHashSet::default();
        for &value in &self.values {
            if value == 0 {
                return Err(HarnessError::config(format!(
                    "parameter '{}' values must be positive, got 0",
                    self.name
                )));
            }
            if value > MAX_PARAM_VALUE {
                return Err(HarnessError::config(format!(
                    "parameter '{}' value {} exceeds {}",
                    self.name, value, MAX_PARAM_VALUE
                )));
            }
            if !seen.insert(value) {
                return Err(HarnessError::config(format!(
                    "parameter '{}' declares value {} more than once",
                    self.name, value
                )));
            }
        }
        Ok(())
    }
}

/// A single point of the parameter grid: one value per declared parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    pairs: Vec<(String, u64)>,
}

impl Binding {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Like [`Binding::get`], but a missing parameter is a configuration error.
    pub fn require(&self, name: &str) -> HarnessResult<u64> {
        self.get(name)
            .ok_or_else(|| HarnessError::config(format!("binding {} has no parameter '{}'", self, name)))
    }

    pub fn pairs(&self) -> &[(String, u64)] {
        &self.pairs
    }

    fn with(&self, name: &str, value: u64) -> Self {
        let mut pairs = Vec::with_capacity(self.pairs.len() + 1);
        pairs.extend(self.pairs.iter().cloned());
        pairs.push((name.to_string(), value));
        Self { pairs }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() {
            return write!(f, "-");
        }
        for (idx, (name, value)) in self.pairs.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Validated set of parameter declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    decls: Vec<ParamDecl>,
}

impl ParameterSet {
    pub fn new(decls: Vec<ParamDecl>) -> HarnessResult<Self> {
        if decls.is_empty() {
            return Err(HarnessError::config("at least one parameter must be declared"));
        }
        let mut names = FxHashSet::default();
        for decl in &decls {
            decl.validate()?;
            if !names.insert(decl.name.as_str()) {
                return Err(HarnessError::config(format!(
                    "parameter '{}' is declared more than once",
                    decl.name
                )));
            }
        }
        Ok(Self { decls })
    }

    /// Shorthand for a grid over a single parameter.
    pub fn single(name: impl Into<String>, values: impl Into<Vec<u64>>) -> HarnessResult<Self> {
        Self::new(vec![ParamDecl::new(name, values)])
    }

    pub fn decls(&self) -> &[ParamDecl] {
        &self.decls
    }

    /// Number of bindings the grid expands to.
    pub fn len(&self) -> usize {
        self.decls.iter().map(|decl| decl.values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of all declarations. The first declared parameter varies slowest.
    pub fn bindings(&self) -> Vec<Binding> {
        let mut grid = vec![Binding::default()];
        for decl in &self.decls {
            let mut next = Vec::with_capacity(grid.len() * decl.values.len());
            for partial in &grid {
                for &value in &decl.values {
                    next.push(partial.with(&decl.name, value));
                }
            }
            grid = next;
        }
        grid
    }
}
