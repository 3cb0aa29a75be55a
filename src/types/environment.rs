//! Scope table used while building the AST.
//!
//! The table is a stack of maps, one per open scope. Index 0 is the program
//! scope. Lookups search from the innermost scope outward.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// The two declaration scope levels in CPRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeLevel {
    Program,
    Subprogram,
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLevel::Program => write!(f, "Program"),
            ScopeLevel::Subprogram => write!(f, "Subprogram"),
        }
    }
}

/// Returned by [`ScopeTable::add`] when the name is already bound in the current scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Identifier \"{0}\" is already defined in the current scope.")]
pub struct DuplicateIdentifier(pub String);

/// A stack of name bindings.
#[derive(Debug, Clone)]
pub struct ScopeTable<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V> ScopeTable<V> {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Close the innermost scope.
    ///
    /// Closing the program scope is a bug in the caller.
    pub fn close_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot close the program scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of scopes open beyond the program scope.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn current_level(&self) -> ScopeLevel {
        if self.depth() == 0 {
            ScopeLevel::Program
        } else {
            ScopeLevel::Subprogram
        }
    }

    /// Bind `name` in the current scope.
    pub fn add(&mut self, name: impl Into<String>, value: V) -> Result<(), DuplicateIdentifier> {
        let name = name.into();
        // the program scope is never closed, so there is always a last scope
        let innermost = self.scopes.len() - 1;
        let scope = &mut self.scopes[innermost];

        if scope.contains_key(&name) {
            return Err(DuplicateIdentifier(name));
        }
        scope.insert(name, value);
        Ok(())
    }

    /// Find the nearest binding for `name`, searching enclosing scopes.
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Find a binding in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&V> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }
}

impl<V> Default for ScopeTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
