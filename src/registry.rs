//! Memoization state threaded through one compilation pass.
use indexmap::{IndexMap, IndexSet};

use crate::decl::Declaration;
use crate::error::CompileError;

/// Canonical name → anonymous declaration, in the order declarations were completed.
///
/// A name, once present, is never rebound for the rest of the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerTypes {
    decls: IndexMap<String, Declaration>,
}

impl InnerTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.decls.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(String::as_str)
    }

    /// Build and register `name` unless it already exists.
    ///
    /// The builder gets the registry back so it can register whatever the new
    /// declaration depends on; those entries land before `name` itself.
    pub fn get_or_try_insert_with<F>(
        &mut self,
        name: &str,
        build: F,
    ) -> Result<&Declaration, CompileError>
    where
        F: FnOnce(&mut Self) -> Result<Declaration, CompileError>,
    {
        if !self.decls.contains_key(name) {
            let decl = build(self)?;
            let bound: &Declaration = self.decls.entry(name.to_string()).or_insert(decl);
            return Ok(bound);
        }
        Ok(&self.decls[name])
    }

    pub fn get_or_insert_with<F>(&mut self, name: &str, build: F) -> &Declaration
    where
        F: FnOnce(&mut Self) -> Declaration,
    {
        if !self.decls.contains_key(name) {
            let decl = build(self);
            return self.decls.entry(name.to_string()).or_insert(decl);
        }
        &self.decls[name]
    }

    /// Fold in a registry built by an independent session.
    ///
    /// Entries are pure functions of their names, so existing bindings win and
    /// new ones are appended in `other`'s order.
    pub fn merge(&mut self, other: InnerTypes) {
        for (name, decl) in other.decls {
            self.decls.entry(name).or_insert(decl);
        }
    }

    pub fn into_declarations(self) -> Vec<Declaration> {
        self.decls.into_values().collect()
    }
}

/// Per-declaration tally used to name repeated same-typed fields `<Type>_1`, `<Type>_2`, ...
#[derive(Debug, Clone, Default)]
pub struct OccurrenceCounter {
    counts: IndexMap<String, usize>,
}

impl OccurrenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self, type_name: &str) -> String {
        let count = self.counts.entry(type_name.to_string()).or_insert(0);
        *count += 1;
        format!("{type_name}_{count}")
    }
}

/// Names taken inside one declaration scope. A clash gets the first free
/// `_<n>` suffix, starting at 2.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    taken: IndexSet<String>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    pub fn claim(&mut self, name: String) -> String {
        if !self.taken.contains(&name) {
            self.taken.insert(name.clone());
            return name;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{name}_{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclarationKind;

    fn decl(name: &str) -> Declaration {
        Declaration::new(DeclarationKind::Marker, name)
    }

    #[test]
    fn counter_is_one_based_and_per_type() {
        let mut c = OccurrenceCounter::new();
        assert_eq!(c.next_name("_digit"), "_digit_1");
        assert_eq!(c.next_name("x61"), "x61_1");
        assert_eq!(c.next_name("_digit"), "_digit_2");
        assert_eq!(c.next_name("_digit"), "_digit_3");
    }

    #[test]
    fn scope_suffixes_clashes_only() {
        let mut scope = NameScope::new();
        scope.reserve("Visitor");
        assert_eq!(scope.claim("a".into()), "a");
        assert_eq!(scope.claim("a".into()), "a_2");
        assert_eq!(scope.claim("a_2".into()), "a_2_2");
        assert_eq!(scope.claim("a".into()), "a_3");
        assert_eq!(scope.claim("Visitor".into()), "Visitor_2");
    }

    #[test]
    fn builder_runs_once_per_name() {
        let mut reg = InnerTypes::new();
        let mut calls = 0;
        for _ in 0..3 {
            reg.get_or_insert_with("x61", |_| {
                calls += 1;
                decl("x61")
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn dependencies_register_before_dependents() {
        let mut reg = InnerTypes::new();
        reg.get_or_try_insert_with("outer", |reg| {
            reg.get_or_insert_with("inner", |_| decl("inner"));
            Ok(decl("outer"))
        })
        .unwrap();
        assert_eq!(reg.names().collect::<Vec<_>>(), ["inner", "outer"]);
    }

    #[test]
    fn failed_builder_leaves_name_unbound() {
        let mut reg = InnerTypes::new();
        let err = reg.get_or_try_insert_with("bad", |_| {
            Err(CompileError::Unsupported(crate::error::Construct::BinVal("1".into())))
        });
        assert!(err.is_err());
        assert!(!reg.contains("bad"));
    }

    #[test]
    fn merge_keeps_existing_and_appends_new() {
        let mut a = InnerTypes::new();
        a.get_or_insert_with("x61", |_| decl("x61"));
        let mut b = InnerTypes::new();
        b.get_or_insert_with("x62", |_| decl("x62"));
        b.get_or_insert_with("x61", |_| decl("x61"));
        a.merge(b);
        assert_eq!(a.names().collect::<Vec<_>>(), ["x61", "x62"]);
    }
}
