//! Compile an ABNF grammar CST into a target-neutral type-declaration model.
//!
//! Each rule becomes one top-level declaration. Anonymous structure (groups,
//! options, literals and `%x` values) is memoized by canonical name and
//! emitted once under a shared helper declaration.
//!
//! ```no_run
//! use abnf_typegen::{compile, CompilerConfig, RuleList};
//!
//! let list: RuleList = abnf_typegen::path_de::from_str_with_path("[]")?;
//! let out = compile(&list, &CompilerConfig::default())?;
//! assert!(out.rules.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod cli;
pub mod compile;
pub mod config;
pub mod decl;
pub mod error;
pub mod grammar;
pub mod jq_exec;
pub mod naming;
pub mod path_de;
pub mod registry;

pub use compile::{compile, compile_parallel, diagnose, Compilation, Compiler, RuleDiagnostic};
pub use config::{CompilerConfig, ConfigError, Substitutions};
pub use decl::{Declaration, DeclarationKind, TypeRef};
pub use error::{CompileError, Construct, RangeViolation};
pub use grammar::{Rule, RuleList};
