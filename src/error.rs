//! Errors raised while compiling a grammar CST.
//!
//! There is no partial-output mode: every variant aborts the pass that raised it.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("unsupported construct: {0}")]
    Unsupported(Construct),

    #[error("invalid hex range {low}-{high}: {violation}")]
    InvalidRange {
        low: String,
        high: String,
        violation: RangeViolation,
    },

    /// Two or more `=` definitions of one name (compared case-insensitively).
    #[error("rule is defined {count} times; use `=/` to add alternatives")]
    DuplicateRule { count: usize },

    #[error("in rule `{rule}`: {source}")]
    InRule {
        rule: String,
        #[source]
        source: Box<CompileError>,
    },
}

/// Grammar constructs the compiler refuses to approximate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Construct {
    ProseVal(String),
    BinVal(String),
    DecVal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    LengthMismatch,
    Descending,
}

impl CompileError {
    pub fn in_rule(rule: impl Into<String>, error: CompileError) -> Self {
        CompileError::InRule { rule: rule.into(), source: Box::new(error) }
    }

    /// Innermost error, with any rule context peeled off.
    pub fn root(&self) -> &CompileError {
        match self {
            CompileError::InRule { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn construct(&self) -> Option<&Construct> {
        match self.root() {
            CompileError::Unsupported(c) => Some(c),
            _ => None,
        }
    }

    /// Name of the outermost rule this error was raised in, if known.
    pub fn rule(&self) -> Option<&str> {
        match self {
            CompileError::InRule { rule, .. } => Some(rule),
            _ => None,
        }
    }
}

impl Construct {
    pub fn kind(&self) -> &'static str {
        match self {
            Construct::ProseVal(_) => "prose-val",
            Construct::BinVal(_) => "bin-val",
            Construct::DecVal(_) => "dec-val",
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construct::ProseVal(text) => write!(f, "{} <{text}>", self.kind()),
            Construct::BinVal(text) => write!(f, "{} %b{text}", self.kind()),
            Construct::DecVal(text) => write!(f, "{} %d{text}", self.kind()),
        }
    }
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeViolation::LengthMismatch => f.write_str("bounds have different digit counts"),
            RangeViolation::Descending => f.write_str("low bound is greater than high bound"),
        }
    }
}
