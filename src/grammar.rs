//! Concrete syntax tree of an ABNF-style rule list.
//!
//! The tree is produced by an external parser and handed over as-is; nothing
//! here re-parses grammar text. Every type deserializes from JSON so the CLI
//! can load trees written by other tools:
//!
//! ```json
//! [
//!   {"rule": {"name": "foo", "elements": [
//!     [{"element": {"char_val": "a"}}],
//!     [{"element": {"char_val": "b"}}, {"element": {"rule_name": "bar"}}]
//!   ]}},
//!   {"comment": "terminals"},
//!   {"rule": {"name": "bar", "elements": [[{"element": {"num_val": {"hex": {"single": "41"}}}}]]}}
//! ]
//! ```
//!
//! Alternations and concatenations are stored as "first + rest" so an empty
//! one cannot be represented.
pub mod hex;

use std::collections::HashMap;

use serde::Deserialize;

pub use hex::{expand_range, DigitSeq, HexDigit, ParseDigitsError};

// ------------------------------- Rule list -------------------------------- //

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RuleList {
    pub items: Vec<RuleListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleListItem {
    Rule(Rule),
    /// Comment-only line; produces no declaration.
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    pub name: RuleName,
    #[serde(default)]
    pub defined_as: DefinedAs,
    pub elements: Alternation,
}

/// `=` or `=/`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinedAs {
    #[default]
    Basic,
    Incremental,
}

/// Letters, digits and dashes, starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct RuleName(pub String);

// ------------------------------ Expressions ------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Concatenation>")]
pub struct Alternation {
    pub first: Concatenation,
    pub rest: Vec<Concatenation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Repetition>")]
pub struct Concatenation {
    pub first: Repetition,
    pub rest: Vec<Repetition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repetition {
    #[serde(default)]
    pub repeat: Option<Repeat>,
    pub element: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// `3element`
    Count(u32),
    /// `min*max`, either bound optional.
    Range {
        #[serde(default)]
        min: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    RuleName(RuleName),
    Group(Box<Alternation>),
    Option(Box<Alternation>),
    CharVal(CharVal),
    NumVal(NumVal),
    ProseVal(String),
}

/// Quoted literal; one marker per character.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CharVal(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumVal {
    /// Raw digits after `%b`.
    Bin(String),
    /// Raw digits after `%d`.
    Dec(String),
    Hex(HexVal),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexVal {
    /// `%x41`
    Single(DigitSeq),
    /// `%x41.42.43`
    Concat(Vec<DigitSeq>),
    /// `%x30-39`
    Range { low: DigitSeq, high: DigitSeq },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("an alternation needs at least one concatenation")]
    EmptyAlternation,
    #[error("a concatenation needs at least one repetition")]
    EmptyConcatenation,
}

// ----------------------------- Construction ------------------------------- //

impl RuleList {
    pub fn new(items: Vec<RuleListItem>) -> Self {
        Self { items }
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self { items: rules.into_iter().map(RuleListItem::Rule).collect() }
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.items.iter().filter_map(|item| match item {
            RuleListItem::Rule(rule) => Some(rule),
            RuleListItem::Comment(_) => None,
        })
    }

    /// Append another rule list, e.g. a second grammar file.
    pub fn extend(&mut self, other: RuleList) {
        self.items.extend(other.items);
    }

    /// Rules with every `=/` folded into the earliest same-named rule.
    ///
    /// Names match case-insensitively. An incremental rule with no earlier
    /// base stands in as the base itself.
    pub fn merged_rules(&self) -> Vec<Rule> {
        let mut merged: Vec<Rule> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for rule in self.rules() {
            let key = rule.name.key();
            match (rule.defined_as, by_name.get(&key)) {
                (DefinedAs::Incremental, Some(&at)) => {
                    merged[at].elements.extend(rule.elements.clone());
                }
                _ => {
                    by_name.entry(key).or_insert(merged.len());
                    merged.push(Rule { defined_as: DefinedAs::Basic, ..rule.clone() });
                }
            }
        }
        merged
    }
}

impl Rule {
    pub fn new(name: &str, elements: Alternation) -> Self {
        Self { name: RuleName::new(name), defined_as: DefinedAs::Basic, elements }
    }

    pub fn incremental(name: &str, elements: Alternation) -> Self {
        Self { name: RuleName::new(name), defined_as: DefinedAs::Incremental, elements }
    }
}

impl RuleName {
    pub fn new(name: &str) -> Self {
        RuleName(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form; ABNF rule names are case-insensitive.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

/// Defined rule names, looked up case-insensitively.
///
/// References resolve to the spelling of the first definition. Names with
/// no definition (core rules such as `DIGIT`) resolve to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleNames {
    defined: HashMap<String, (RuleName, usize)>,
}

impl RuleNames {
    pub fn from_rules<'r>(rules: impl IntoIterator<Item = &'r Rule>) -> Self {
        let mut defined: HashMap<String, (RuleName, usize)> = HashMap::new();
        for rule in rules {
            defined
                .entry(rule.name.key())
                .and_modify(|(_, count)| *count += 1)
                .or_insert_with(|| (rule.name.clone(), 1));
        }
        Self { defined }
    }

    pub fn resolve<'n>(&'n self, name: &'n RuleName) -> &'n RuleName {
        self.defined.get(&name.key()).map_or(name, |(first, _)| first)
    }

    /// Number of `=` definitions of `name` after `=/` folding.
    pub fn definitions(&self, name: &RuleName) -> usize {
        self.defined.get(&name.key()).map_or(0, |&(_, count)| count)
    }
}

impl Alternation {
    pub fn new(first: Concatenation, rest: Vec<Concatenation>) -> Self {
        Self { first, rest }
    }

    /// Primary concatenation first, then each `/` branch left to right.
    pub fn concatenations(&self) -> impl Iterator<Item = &Concatenation> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn extend(&mut self, other: Alternation) {
        self.rest.push(other.first);
        self.rest.extend(other.rest);
    }

    /// The lone element when this is exactly one unrepeated element.
    pub fn as_single_element(&self) -> Option<&Element> {
        if !self.rest.is_empty() || !self.first.rest.is_empty() {
            return None;
        }
        let rep = &self.first.first;
        match rep.repeat {
            None => Some(&rep.element),
            Some(_) => None,
        }
    }
}

impl Concatenation {
    pub fn new(first: Repetition, rest: Vec<Repetition>) -> Self {
        Self { first, rest }
    }

    pub fn repetitions(&self) -> impl Iterator<Item = &Repetition> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Repetition {
    pub fn new(element: Element) -> Self {
        Self { repeat: None, element }
    }

    pub fn repeated(repeat: Repeat, element: Element) -> Self {
        Self { repeat: Some(repeat), element }
    }
}

impl Element {
    pub fn rule(name: &str) -> Self {
        Element::RuleName(RuleName::new(name))
    }

    pub fn group(alternation: Alternation) -> Self {
        Element::Group(Box::new(alternation))
    }

    pub fn option(alternation: Alternation) -> Self {
        Element::Option(Box::new(alternation))
    }

    pub fn chars(literal: &str) -> Self {
        Element::CharVal(CharVal(literal.to_string()))
    }

    pub fn hex(digits: &str) -> Result<Self, ParseDigitsError> {
        Ok(Element::NumVal(NumVal::Hex(HexVal::Single(digits.parse()?))))
    }

    pub fn hex_concat(segments: &[&str]) -> Result<Self, ParseDigitsError> {
        let segments = segments.iter().map(|s| s.parse()).collect::<Result<Vec<_>, _>>()?;
        Ok(Element::NumVal(NumVal::Hex(HexVal::Concat(segments))))
    }

    pub fn hex_range(low: &str, high: &str) -> Result<Self, ParseDigitsError> {
        Ok(Element::NumVal(NumVal::Hex(HexVal::Range { low: low.parse()?, high: high.parse()? })))
    }
}

impl TryFrom<Vec<Concatenation>> for Alternation {
    type Error = ShapeError;

    fn try_from(concatenations: Vec<Concatenation>) -> Result<Self, Self::Error> {
        let mut it = concatenations.into_iter();
        let first = it.next().ok_or(ShapeError::EmptyAlternation)?;
        Ok(Alternation { first, rest: it.collect() })
    }
}

impl TryFrom<Vec<Repetition>> for Concatenation {
    type Error = ShapeError;

    fn try_from(repetitions: Vec<Repetition>) -> Result<Self, Self::Error> {
        let mut it = repetitions.into_iter();
        let first = it.next().ok_or(ShapeError::EmptyConcatenation)?;
        Ok(Concatenation { first, rest: it.collect() })
    }
}

impl From<Concatenation> for Alternation {
    fn from(c: Concatenation) -> Self {
        Alternation::new(c, Vec::new())
    }
}

impl From<Repetition> for Concatenation {
    fn from(r: Repetition) -> Self {
        Concatenation::new(r, Vec::new())
    }
}

impl From<Element> for Repetition {
    fn from(e: Element) -> Self {
        Repetition::new(e)
    }
}

impl From<Element> for Concatenation {
    fn from(e: Element) -> Self {
        Repetition::new(e).into()
    }
}

impl From<Element> for Alternation {
    fn from(e: Element) -> Self {
        Concatenation::from(e).into()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_rule_list_with_comments() {
        let doc = json!([
            {"rule": {"name": "foo", "elements": [
                [{"element": {"char_val": "a"}}],
                [{"element": {"char_val": "b"}}, {"element": {"rule_name": "bar"}}]
            ]}},
            {"comment": "terminals"},
            {"rule": {"name": "bar", "elements": [[
                {
                    "repeat": {"range": {"min": 1}},
                    "element": {"num_val": {"hex": {"range": {"low": "30", "high": "39"}}}}
                }
            ]]}}
        ]);
        let list: RuleList = serde_json::from_value(doc).unwrap();
        assert_eq!(list.items.len(), 3);
        let rules: Vec<_> = list.rules().collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].elements.len(), 2);
        assert_eq!(rules[0].elements.rest[0].len(), 2);
        assert_eq!(
            rules[1].elements.first.first.repeat,
            Some(Repeat::Range { min: Some(1), max: None })
        );
    }

    #[test]
    fn empty_alternation_is_rejected() {
        let doc = json!({"name": "foo", "elements": []});
        assert!(serde_json::from_value::<Rule>(doc).is_err());
    }

    #[test]
    fn invalid_hex_digits_are_rejected() {
        let doc = json!({"hex": {"single": "4Z"}});
        assert!(serde_json::from_value::<NumVal>(doc).is_err());
    }

    #[test]
    fn incremental_alternatives_fold_into_base_rule() {
        let list = RuleList::from_rules([
            Rule::new("digit", Element::chars("0").into()),
            Rule::new("other", Element::chars("x").into()),
            Rule::incremental("DIGIT", Element::chars("1").into()),
            Rule::incremental("fresh", Element::chars("y").into()),
        ]);
        let merged = list.merged_rules();
        let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["digit", "other", "fresh"]);
        assert_eq!(merged[0].elements.len(), 2);
        assert_eq!(merged[0].elements.rest[0], Concatenation::from(Element::chars("1")));
        assert_eq!(merged[2].defined_as, DefinedAs::Basic);
    }

    #[test]
    fn single_element_detection_ignores_repeats() {
        let bare: Alternation = Element::rule("a").into();
        assert_eq!(bare.as_single_element(), Some(&Element::rule("a")));

        let repeated: Alternation =
            Concatenation::from(Repetition::repeated(Repeat::Count(2), Element::rule("a"))).into();
        assert_eq!(repeated.as_single_element(), None);
    }

    #[test]
    fn rule_names_resolve_to_first_spelling() {
        let list = RuleList::from_rules([
            Rule::new("Sign", Element::chars("+").into()),
            Rule::incremental("SIGN", Element::chars("-").into()),
            Rule::new("num", Element::rule("sign").into()),
        ]);
        let merged = list.merged_rules();
        let names = RuleNames::from_rules(&merged);
        assert_eq!(names.resolve(&RuleName::new("SIGN")), &RuleName::new("Sign"));
        assert_eq!(names.resolve(&RuleName::new("sign")), &RuleName::new("Sign"));
        assert_eq!(names.resolve(&RuleName::new("DIGIT")), &RuleName::new("DIGIT"));
        assert_eq!(names.definitions(&RuleName::new("sIgN")), 1);
        assert_eq!(names.definitions(&RuleName::new("DIGIT")), 0);
    }

    #[test]
    fn repeated_basic_definitions_are_counted() {
        let list = RuleList::from_rules([
            Rule::new("a", Element::chars("x").into()),
            Rule::new("A", Element::chars("y").into()),
        ]);
        let merged = list.merged_rules();
        assert_eq!(merged.len(), 2);
        assert_eq!(RuleNames::from_rules(&merged).definitions(&RuleName::new("a")), 2);
    }
}
