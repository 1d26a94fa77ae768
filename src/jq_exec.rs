//! jq pre-processing of grammar documents.
use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

type Source<'s> = load::File<&'s str, ()>;

/// Run a jq filter over one grammar document; every output becomes one document.
pub fn run_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let arena = load::Arena::default();
    let modules = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()))
        .load(&arena, load::File { code: filter_src, path: () })
        .map_err(|errs| describe_syntax_errors(&errs))?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| describe_unbound_names(&errs))?;

    let no_inputs = RcIter::new(core::iter::empty());
    filter
        .run((Ctx::new([], &no_inputs), Val::from(input.clone())))
        .map(|output| {
            let val = output.map_err(|e| anyhow!("jq filter `{filter_src}` failed: {e:?}"))?;
            // Display on Val is JSON text
            serde_json::from_str::<Value>(&val.to_string())
                .with_context(|| format!("jq filter `{filter_src}` produced non-JSON output"))
        })
        .collect()
}

fn describe_syntax_errors(errs: &[(Source<'_>, load::Error<&str>)]) -> anyhow::Error {
    let report: Vec<String> = errs
        .iter()
        .map(|(file, err)| format!("cannot parse jq filter `{}`: {err:?}", file.code))
        .collect();
    anyhow!(report.join("\n"))
}

fn describe_unbound_names(errs: &[(Source<'_>, Vec<(&str, Undefined)>)]) -> anyhow::Error {
    let report: Vec<String> = errs
        .iter()
        .flat_map(|(file, names)| {
            names.iter().map(move |(name, kind)| {
                format!("jq filter `{}` uses unbound {kind:?} `{name}`", file.code)
            })
        })
        .collect();
    anyhow!(report.join("\n"))
}
