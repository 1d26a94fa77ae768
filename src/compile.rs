//! Grammar CST → declaration model.
//!
//! One pass threads a single [`InnerTypes`] registry through the recursive
//! descent:
//!
//! - every rule becomes a top-level declaration named `<prefix><rule>`:
//!   a product when it has one alternative, otherwise an abstract sum with one
//!   nested variant product per alternative (source order) plus a visitor;
//! - anonymous structure (groups, options, literals, hex values and ranges)
//!   is memoized in the registry by canonical name and emitted once, nested
//!   under the helper declaration;
//! - fields are named `<Type>_<n>` from a counter local to the product that
//!   owns them.
//!
//! A failed pass leaves the registry half-populated, so sessions are consumed
//! rather than reused after an error.
mod element;
mod hex;
pub mod shape;

use rayon::prelude::*;

use crate::config::CompilerConfig;
use crate::decl::{Declaration, TypeRef};
use crate::error::CompileError;
use crate::grammar::{Alternation, Concatenation, Rule, RuleList, RuleName, RuleNames};
use crate::naming::Namer;
use crate::registry::{InnerTypes, OccurrenceCounter};

// ------------------------------- Output ----------------------------------- //

/// Result of one pass: rule declarations in rule order, then the helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub rules: Vec<Declaration>,
    pub helper: Declaration,
}

impl Compilation {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.rules.iter().chain(std::iter::once(&self.helper))
    }

    pub fn into_declarations(self) -> Vec<Declaration> {
        let mut out = self.rules;
        out.push(self.helper);
        out
    }

    pub fn rule(&self, name: &str) -> Option<&Declaration> {
        self.rules.iter().find(|d| d.name == name)
    }

    pub fn inner(&self, name: &str) -> Option<&Declaration> {
        self.helper.find_nested(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    pub rule: String,
    pub error: CompileError,
}

// ------------------------------- Session ---------------------------------- //

/// One compilation session; owns the registry for its pass.
///
/// `rule_names` is the set of rules defined in the grammar being compiled.
/// References resolve through it, so `SIGN` points at a rule defined as `sign`.
pub struct Compiler<'c> {
    config: &'c CompilerConfig,
    rule_names: &'c RuleNames,
    registry: InnerTypes,
}

impl<'c> Compiler<'c> {
    pub fn new(config: &'c CompilerConfig, rule_names: &'c RuleNames) -> Self {
        Self { config, rule_names, registry: InnerTypes::new() }
    }

    pub fn registry(&self) -> &InnerTypes {
        &self.registry
    }

    pub fn compile_rule(&mut self, rule: &Rule) -> Result<Declaration, CompileError> {
        let result = match self.rule_names.definitions(&rule.name) {
            count @ 2.. => Err(CompileError::DuplicateRule { count }),
            _ => Lowering::new(self.config, self.rule_names).rule(&mut self.registry, rule),
        };
        result.map_err(|e| CompileError::in_rule(rule.name.as_str(), e))
    }

    /// Compile already-merged rules in order and close the pass.
    pub fn compile_rules(mut self, rules: &[Rule]) -> Result<Compilation, CompileError> {
        let decls = rules
            .iter()
            .map(|rule| self.compile_rule(rule))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.finish(decls))
    }

    pub fn finish(self, rules: Vec<Declaration>) -> Compilation {
        let helper = shape::helper(&self.config.helper_name, self.registry.into_declarations());
        Compilation { rules, helper }
    }
}

// ------------------------------- Front API -------------------------------- //

/// Fold `=/` alternatives, then compile every rule on one session.
pub fn compile(list: &RuleList, config: &CompilerConfig) -> Result<Compilation, CompileError> {
    let rules = list.merged_rules();
    let rule_names = RuleNames::from_rules(&rules);
    Compiler::new(config, &rule_names).compile_rules(&rules)
}

/// Compile rules on independent sessions in parallel, then merge registries in
/// rule order. Produces the same result as [`compile`]; on failure, reports the
/// earliest failing rule.
pub fn compile_parallel(
    list: &RuleList,
    config: &CompilerConfig,
) -> Result<Compilation, CompileError> {
    let rules = list.merged_rules();
    let rule_names = RuleNames::from_rules(&rules);
    let parts = rules
        .par_iter()
        .map(|rule| {
            let mut session = Compiler::new(config, &rule_names);
            let decl = session.compile_rule(rule)?;
            Ok((decl, session.registry))
        })
        .collect::<Vec<Result<_, CompileError>>>();

    let mut registry = InnerTypes::new();
    let mut decls = Vec::with_capacity(parts.len());
    for part in parts {
        let (decl, inner) = part?;
        registry.merge(inner);
        decls.push(decl);
    }
    Ok(Compiler { config, rule_names: &rule_names, registry }.finish(decls))
}

/// Compile each rule on a throwaway session and report every failure.
pub fn diagnose(list: &RuleList, config: &CompilerConfig) -> Vec<RuleDiagnostic> {
    let rules = list.merged_rules();
    let rule_names = RuleNames::from_rules(&rules);
    rules
        .iter()
        .filter_map(|rule| {
            let mut session = Compiler::new(config, &rule_names);
            session.compile_rule(rule).err().map(|error| RuleDiagnostic {
                rule: rule.name.as_str().to_string(),
                error,
            })
        })
        .collect()
}

// ------------------------------- Lowering --------------------------------- //

/// Read-only half of a session; the registry is passed alongside explicitly.
#[derive(Clone, Copy)]
pub(crate) struct Lowering<'a> {
    config: &'a CompilerConfig,
    namer: Namer<'a>,
}

impl<'a> Lowering<'a> {
    pub(crate) fn new(config: &'a CompilerConfig, rule_names: &'a RuleNames) -> Self {
        let namer = Namer::new(&config.substitutions).with_rule_names(rule_names);
        Self { config, namer }
    }

    pub(crate) fn rule(
        &self,
        reg: &mut InnerTypes,
        rule: &Rule,
    ) -> Result<Declaration, CompileError> {
        let name = self.rule_class_name(&rule.name);
        self.alternation(reg, &[name], &rule.elements)
    }

    /// Product for a single concatenation, otherwise a sum named by `path`.
    pub(crate) fn alternation(
        &self,
        reg: &mut InnerTypes,
        path: &[String],
        alt: &Alternation,
    ) -> Result<Declaration, CompileError> {
        let name = path.last().map(String::as_str).unwrap_or_default();
        if alt.rest.is_empty() {
            return self.concatenation(reg, name, &alt.first);
        }
        let mut variants = Vec::with_capacity(alt.len());
        for cat in alt.concatenations() {
            let variant_name = self.namer.concatenation(cat)?;
            variants.push(self.concatenation(reg, &variant_name, cat)?);
        }
        Ok(shape::sum(path, variants, self.config.emit_visitors))
    }

    fn concatenation(
        &self,
        reg: &mut InnerTypes,
        name: &str,
        cat: &Concatenation,
    ) -> Result<Declaration, CompileError> {
        let mut counter = OccurrenceCounter::new();
        let mut fields = Vec::with_capacity(cat.len());
        for rep in cat.repetitions() {
            fields.push(self.element(reg, &rep.element, rep.repeat.is_some(), &mut counter)?);
        }
        Ok(shape::product(name, fields))
    }

    /// `<prefix><name>`, with `name` resolved to its defining spelling.
    pub(crate) fn rule_class_name(&self, name: &RuleName) -> String {
        format!("{}{}", self.config.rule_prefix, self.namer.rule_name(name))
    }

    pub(crate) fn inner_path(&self, name: &str) -> Vec<String> {
        vec![self.config.helper_name.clone(), name.to_string()]
    }

    pub(crate) fn inner_ref(&self, name: &str) -> TypeRef {
        TypeRef::named(self.inner_path(name))
    }
}

// ------------------------------- Tests ------------------------------------ //
