use crate::error::{Error, Result};
use crate::types::Ordinal;
use std::collections::HashMap;

pub const DEFAULT_ARITY: usize = 2;

/// Ordered key sequences mapped to their composed output.
///
/// Built once by the host and shared read-only with the composer. Every key
/// sequence has exactly `arity` ordinals and every result is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionTable {
    arity: usize,
    map: HashMap<Vec<Ordinal>, Vec<Ordinal>>,
}

impl Default for CompositionTable {
    fn default() -> Self {
        Self {
            arity: DEFAULT_ARITY,
            map: HashMap::new(),
        }
    }
}

impl CompositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arity(arity: usize) -> Result<Self> {
        if arity == 0 {
            return Err(Error::InvalidArity(arity));
        }
        Ok(Self {
            arity,
            map: HashMap::new(),
        })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Adds a sequence, replacing and returning any previous result.
    pub fn insert_ordinals(
        &mut self,
        keys: &[Ordinal],
        result: &[Ordinal],
    ) -> Result<Option<Vec<Ordinal>>> {
        if keys.len() != self.arity {
            return Err(Error::ArityMismatch {
                expected: self.arity,
                found: keys.len(),
            });
        }
        if result.is_empty() {
            return Err(Error::EmptyResult);
        }
        Ok(self.map.insert(keys.to_vec(), result.to_vec()))
    }

    pub fn insert(&mut self, keys: &[char], result: &str) -> Result<Option<Vec<Ordinal>>> {
        let keys: Vec<Ordinal> = keys.iter().map(|&c| c as Ordinal).collect();
        let result: Vec<Ordinal> = result.chars().map(|c| c as Ordinal).collect();
        self.insert_ordinals(&keys, &result)
    }

    pub fn lookup(&self, keys: &[Ordinal]) -> Option<&[Ordinal]> {
        self.map.get(keys).map(Vec::as_slice)
    }

    /// Builds a table from `(keys, result)` pairs, failing on the first bad entry.
    pub fn from_entries<'a, I>(arity: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a [char], &'a str)>,
    {
        let mut table = Self::with_arity(arity)?;
        for (keys, result) in entries {
            table.insert(keys, result)?;
        }
        Ok(table)
    }
}
