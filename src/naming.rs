//! Canonical names for grammar constructs.
//!
//! Every construct maps to one deterministic identifier built from the
//! configured [`Substitutions`]. The same string doubles as the memoization
//! key in the inner-type registry, so structurally identical sub-expressions
//! name (and therefore share) one declaration.
//!
//! Examples with the default substitutions:
//!
//! | construct            | name             |
//! |----------------------|------------------|
//! | `rule-name`          | `ruleⲻname`      |
//! | `("a" / b)`          | `Ⲥʺx61ʺⳆbↃ`      |
//! | `[a b]`              | `꘡a_b꘡`          |
//! | `1*3digit`           | `1ж3digit`       |
//! | `%x41.42`            | `_x41ˑ42`        |
//! | `%x30-39`            | `_x30ⲻ39`        |
use std::fmt::Write as _;

use crate::config::Substitutions;
use crate::error::{CompileError, Construct};
use crate::grammar::{
    Alternation, CharVal, Concatenation, DigitSeq, Element, HexDigit, HexVal, NumVal, Repeat,
    Repetition, RuleName, RuleNames,
};

#[derive(Debug, Clone, Copy)]
pub struct Namer<'a> {
    subs: &'a Substitutions,
    rule_names: Option<&'a RuleNames>,
}

impl<'a> Namer<'a> {
    pub fn new(subs: &'a Substitutions) -> Self {
        Self { subs, rule_names: None }
    }

    /// Spell rule references the way their definition in `rule_names` does.
    pub fn with_rule_names(self, rule_names: &'a RuleNames) -> Self {
        Self { rule_names: Some(rule_names), ..self }
    }

    pub fn rule_name(&self, name: &RuleName) -> String {
        let name = match self.rule_names {
            Some(defined) => defined.resolve(name),
            None => name,
        };
        let mut out = String::with_capacity(name.as_str().len());
        for c in name.as_str().chars() {
            match c {
                '-' => out.push_str(&self.subs.dash),
                c => out.push(c),
            }
        }
        out
    }

    pub fn group(&self, inner: &Alternation) -> Result<String, CompileError> {
        Ok(format!("{}{}{}", self.subs.open_paren, self.alternation(inner)?, self.subs.close_paren))
    }

    pub fn option(&self, inner: &Alternation) -> Result<String, CompileError> {
        Ok(format!(
            "{}{}{}",
            self.subs.open_bracket,
            self.alternation(inner)?,
            self.subs.close_bracket
        ))
    }

    pub fn alternation(&self, alt: &Alternation) -> Result<String, CompileError> {
        let mut out = self.concatenation(&alt.first)?;
        for c in &alt.rest {
            out.push_str(&self.subs.slash);
            out.push_str(&self.concatenation(c)?);
        }
        Ok(out)
    }

    pub fn concatenation(&self, cat: &Concatenation) -> Result<String, CompileError> {
        let mut out = self.repetition(&cat.first)?;
        for r in &cat.rest {
            out.push_str(&self.subs.space);
            out.push_str(&self.repetition(r)?);
        }
        Ok(out)
    }

    pub fn repetition(&self, rep: &Repetition) -> Result<String, CompileError> {
        let element = self.element(&rep.element)?;
        Ok(match &rep.repeat {
            Some(repeat) => format!("{}{element}", self.repeat(repeat)),
            None => element,
        })
    }

    pub fn repeat(&self, repeat: &Repeat) -> String {
        match *repeat {
            Repeat::Count(n) => n.to_string(),
            Repeat::Range { min, max } => {
                let mut out = String::new();
                if let Some(min) = min {
                    let _ = write!(out, "{min}");
                }
                out.push_str(&self.subs.asterisk);
                if let Some(max) = max {
                    let _ = write!(out, "{max}");
                }
                out
            }
        }
    }

    pub fn element(&self, element: &Element) -> Result<String, CompileError> {
        match element {
            Element::RuleName(name) => Ok(self.rule_name(name)),
            Element::Group(inner) => self.group(inner),
            Element::Option(inner) => self.option(inner),
            Element::CharVal(literal) => Ok(self.char_val(literal)),
            Element::NumVal(num) => self.num_val(num),
            Element::ProseVal(text) => {
                Err(CompileError::Unsupported(Construct::ProseVal(text.clone())))
            }
        }
    }

    pub fn char_val(&self, literal: &CharVal) -> String {
        let mut out = self.subs.double_quote.clone();
        for c in literal.0.chars() {
            out.push_str(&Self::char_marker(c));
        }
        out.push_str(&self.subs.double_quote);
        out
    }

    /// `x` + upper-case code point, at least two digits: `a` → `x61`.
    pub fn char_marker(c: char) -> String {
        format!("x{:02X}", c as u32)
    }

    pub fn num_val(&self, num: &NumVal) -> Result<String, CompileError> {
        match num {
            NumVal::Hex(hex) => Ok(self.hex_val(hex)),
            NumVal::Bin(text) => Err(CompileError::Unsupported(Construct::BinVal(text.clone()))),
            NumVal::Dec(text) => Err(CompileError::Unsupported(Construct::DecVal(text.clone()))),
        }
    }

    pub fn hex_val(&self, hex: &HexVal) -> String {
        match hex {
            HexVal::Single(digits) => self.hex_value(digits),
            HexVal::Concat(segments) => {
                let joined = segments
                    .iter()
                    .map(DigitSeq::to_string)
                    .collect::<Vec<_>>()
                    .join(self.subs.period.as_str());
                format!("{}x{joined}", self.subs.percent)
            }
            HexVal::Range { low, high } => {
                format!("{}x{low}{}{high}", self.subs.percent, self.subs.dash)
            }
        }
    }

    /// Name of a single `%x..` value.
    pub fn hex_value(&self, digits: &DigitSeq) -> String {
        format!("{}x{digits}", self.subs.percent)
    }

    /// Marker for one digit position: `4` → `_4`.
    pub fn digit_marker(digit: HexDigit) -> String {
        format!("_{digit}")
    }
}

// ------------------------------- Tests ------------------------------------ //
