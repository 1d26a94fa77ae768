//! Element → field, registering whatever anonymous declarations the field needs.
use super::{shape, Lowering};
use crate::decl::{Field, TypeRef};
use crate::error::{CompileError, Construct};
use crate::grammar::{Alternation, CharVal, Element};
use crate::naming::Namer;
use crate::registry::{InnerTypes, OccurrenceCounter};

impl Lowering<'_> {
    /// One field for `element`, named `<Type>_<n>` from `counter`.
    pub(crate) fn element(
        &self,
        reg: &mut InnerTypes,
        element: &Element,
        is_collection: bool,
        counter: &mut OccurrenceCounter,
    ) -> Result<Field, CompileError> {
        let (ty, type_name) = match element {
            Element::RuleName(name) => {
                let class = self.rule_class_name(name);
                (TypeRef::named([class.as_str()]), class)
            }
            Element::Group(inner) => {
                let name = self.group(reg, inner)?;
                (self.inner_ref(&name), name)
            }
            Element::Option(inner) => {
                let (ty, name) = self.resolve_inner(reg, inner)?;
                (ty.optional(), name)
            }
            Element::CharVal(literal) => {
                let name = self.char_val(reg, literal);
                (self.inner_ref(&name), name)
            }
            Element::NumVal(num) => {
                let name = self.num_val(reg, num)?;
                (self.inner_ref(&name), name)
            }
            Element::ProseVal(text) => {
                return Err(CompileError::Unsupported(Construct::ProseVal(text.clone())));
            }
        };
        let ty = if is_collection { ty.sequence() } else { ty };
        Ok(Field::new(ty, counter.next_name(&type_name)))
    }

    /// Wrapper around the group's inner alternation, registered under the group's name.
    fn group(&self, reg: &mut InnerTypes, inner: &Alternation) -> Result<String, CompileError> {
        let name = self.namer.group(inner)?;
        reg.get_or_try_insert_with(&name, |reg| {
            let (target, target_name) = self.resolve_inner(reg, inner)?;
            let mut counter = OccurrenceCounter::new();
            let field = Field::new(target, counter.next_name(&target_name));
            Ok(shape::product(&name, vec![field]))
        })?;
        Ok(name)
    }

    /// Type a group or option body points at, plus the name its field is counted under.
    ///
    /// A bare rule name points at the rule. A lone unrepeated group, literal or
    /// hex value already owns a registry entry under the very name the
    /// alternation would get, so it is reused as-is. Anything else becomes its
    /// own memoized declaration.
    fn resolve_inner(
        &self,
        reg: &mut InnerTypes,
        inner: &Alternation,
    ) -> Result<(TypeRef, String), CompileError> {
        match inner.as_single_element() {
            Some(Element::RuleName(rule)) => {
                let class = self.rule_class_name(rule);
                return Ok((TypeRef::named([class.as_str()]), class));
            }
            Some(Element::Group(nested)) => {
                let name = self.group(reg, nested)?;
                return Ok((self.inner_ref(&name), name));
            }
            Some(Element::CharVal(literal)) => {
                let name = self.char_val(reg, literal);
                return Ok((self.inner_ref(&name), name));
            }
            Some(Element::NumVal(num)) => {
                let name = self.num_val(reg, num)?;
                return Ok((self.inner_ref(&name), name));
            }
            Some(Element::Option(_) | Element::ProseVal(_)) | None => {}
        }

        let name = self.namer.alternation(inner)?;
        reg.get_or_try_insert_with(&name, |reg| {
            self.alternation(reg, &self.inner_path(&name), inner)
        })?;
        Ok((self.inner_ref(&name), name))
    }

    /// Positional record over one character marker per literal character.
    fn char_val(&self, reg: &mut InnerTypes, literal: &CharVal) -> String {
        let name = self.namer.char_val(literal);
        reg.get_or_insert_with(&name, |reg| {
            let mut counter = OccurrenceCounter::new();
            let fields = literal
                .0
                .chars()
                .map(|c| {
                    let marker = self.marker(reg, Namer::char_marker(c));
                    Field::new(self.inner_ref(&marker), counter.next_name(&marker))
                })
                .collect();
            shape::product(&name, fields)
        });
        name
    }

    /// Register a zero-field singleton under `name` and hand the name back.
    pub(crate) fn marker(&self, reg: &mut InnerTypes, name: String) -> String {
        reg.get_or_insert_with(&name, |_| shape::marker(&name, self.inner_ref(&name)));
        name
    }
}

// ------------------------------- Tests ------------------------------------ //
