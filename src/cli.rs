//! CLI: grammar CST JSON → (declaration model | diagnostics)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::compile::{compile, compile_parallel, diagnose};
use crate::config::CompilerConfig;
use crate::grammar::RuleList;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile an ABNF grammar CST (JSON) into a target-neutral type-declaration model
#[derive(Parser, Debug)]
#[command(name = "abnf-typegen")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile every rule and print the declaration model as JSON
    Compile(CompileOut),
    /// compile every rule independently and report the ones that fail
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the rule list in each document (e.g. /grammar/rules)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is read as a rule list
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// report progress on stderr
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// JSON compiler config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// prefix for rule-derived declaration names
    #[arg(long)]
    prefix: Option<String>,

    /// name of the declaration holding the shared inner types
    #[arg(long)]
    helper_name: Option<String>,

    /// skip visitor and dispatch members on sum types
    #[arg(long)]
    no_visitors: bool,

    /// compile rules on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// JSON compiler config
    #[arg(long)]
    config: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every input's rule list, concatenated in input order.
    fn load_grammar(&self) -> Result<RuleList> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut grammar = RuleList::default();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let before = grammar.items.len();
            for document in self.load_documents(&source_path)? {
                let list = crate::path_de::from_value_with_path::<RuleList>(document)
                    .with_context(|| format!("invalid grammar in {source_path_str}"))?;
                grammar.extend(list);
            }
            if self.verbose {
                let added = grammar.items.len() - before;
                eprintln!("{} {source_path_str} ({added} items)", "loaded".green());
            }
        }
        Ok(grammar)
    }

    fn load_documents(&self, source_path: &Path) -> Result<Vec<serde_json::Value>> {
        let source_path_str = source_path.to_string_lossy();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file {source_path_str}"))?;
        let mut document = serde_json::from_str::<serde_json::Value>(&source)
            .with_context(|| format!("failed to parse JSON source file {source_path_str}"))?;
        if let Some(pointer) = self.json_pointer.as_deref() {
            document = document.pointer(pointer).cloned().ok_or_else(|| {
                anyhow!("JSON pointer {pointer} selects nothing in {source_path_str}")
            })?;
        }
        match self.jq_expr.as_ref() {
            None => Ok(vec![document]),
            Some(jq_expr) => crate::jq_exec::run_filter(jq_expr, &document).with_context(|| {
                format!("failed to apply jq expression to source file {source_path_str}")
            }),
        }
    }
}

impl CompileOut {
    fn config(&self) -> Result<CompilerConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(prefix) = self.prefix.as_ref() {
            config.rule_prefix = prefix.clone();
        }
        if let Some(helper_name) = self.helper_name.as_ref() {
            config.helper_name = helper_name.clone();
        }
        if self.no_visitors {
            config.emit_visitors = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn run(&self) -> Result<()> {
        let config = self.config()?;
        let grammar = self.input_settings.load_grammar()?;
        let compiled = if self.parallel {
            compile_parallel(&grammar, &config)?
        } else {
            compile(&grammar, &config)?
        };
        if self.input_settings.verbose {
            eprintln!(
                "{} {} rules, {} inner types",
                "compiled".green(),
                compiled.rules.len(),
                compiled.helper.nested.len(),
            );
        }

        let declarations = compiled.declarations().collect::<Vec<_>>();
        let model_src = serde_json::to_string_pretty(&declarations)?;
        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &model_src)
                .with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            println!("{model_src}");
        }
        Ok(())
    }
}

impl CheckOut {
    fn run(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let grammar = self.input_settings.load_grammar()?;
        let total = grammar.merged_rules().len();
        let failures = diagnose(&grammar, &config);
        for failure in &failures {
            eprintln!("{} {}: {}", "error".red().bold(), failure.rule, failure.error.root());
        }
        if failures.is_empty() {
            eprintln!("{} {total} rules compile", "ok".green().bold());
            Ok(())
        } else {
            bail!("{} of {total} rules failed to compile", failures.len())
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Compile(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    match path {
        Some(path) => Ok(CompilerConfig::from_json_path(path)?),
        None => Ok(CompilerConfig::default()),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
