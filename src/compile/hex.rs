//! `%x` values: digit records, concatenations and enumerated ranges.
use super::{shape, Lowering};
use crate::decl::{Declaration, Field};
use crate::error::{CompileError, Construct};
use crate::grammar::{expand_range, DigitSeq, HexVal, NumVal};
use crate::naming::Namer;
use crate::registry::{InnerTypes, OccurrenceCounter};

impl Lowering<'_> {
    /// Register the declaration for `num` and return its canonical name.
    pub(crate) fn num_val(
        &self,
        reg: &mut InnerTypes,
        num: &NumVal,
    ) -> Result<String, CompileError> {
        match num {
            NumVal::Hex(HexVal::Single(digits)) => Ok(self.hex_value(reg, digits)),
            NumVal::Hex(HexVal::Concat(segments)) => Ok(self.hex_concat(reg, segments)),
            NumVal::Hex(HexVal::Range { low, high }) => self.hex_range(reg, low, high),
            NumVal::Bin(text) => Err(CompileError::Unsupported(Construct::BinVal(text.clone()))),
            NumVal::Dec(text) => Err(CompileError::Unsupported(Construct::DecVal(text.clone()))),
        }
    }

    fn hex_value(&self, reg: &mut InnerTypes, digits: &DigitSeq) -> String {
        let name = self.namer.hex_value(digits);
        reg.get_or_insert_with(&name, |reg| self.digit_product(reg, &name, digits));
        name
    }

    fn hex_concat(&self, reg: &mut InnerTypes, segments: &[DigitSeq]) -> String {
        let name = self.namer.hex_val(&HexVal::Concat(segments.to_vec()));
        reg.get_or_insert_with(&name, |reg| {
            let mut counter = OccurrenceCounter::new();
            let fields = segments
                .iter()
                .map(|segment| {
                    let value = self.hex_value(reg, segment);
                    Field::new(self.inner_ref(&value), counter.next_name(&value))
                })
                .collect();
            shape::product(&name, fields)
        });
        name
    }

    /// Sum with one digit-record variant per value in `low..=high`.
    fn hex_range(
        &self,
        reg: &mut InnerTypes,
        low: &DigitSeq,
        high: &DigitSeq,
    ) -> Result<String, CompileError> {
        let name = self.namer.hex_val(&HexVal::Range { low: low.clone(), high: high.clone() });
        reg.get_or_try_insert_with(&name, |reg| {
            let variants = expand_range(low, high)?
                .iter()
                .map(|value| self.digit_product(reg, &self.namer.hex_value(value), value))
                .collect();
            Ok(shape::sum(&self.inner_path(&name), variants, self.config.emit_visitors))
        })?;
        Ok(name)
    }

    /// One marker-typed field per digit, most significant first.
    fn digit_product(&self, reg: &mut InnerTypes, name: &str, digits: &DigitSeq) -> Declaration {
        let mut counter = OccurrenceCounter::new();
        let fields = digits
            .digits()
            .iter()
            .map(|&digit| {
                let marker = self.marker(reg, Namer::digit_marker(digit));
                Field::new(self.inner_ref(&marker), counter.next_name(&marker))
            })
            .collect();
        shape::product(name, fields)
    }
}

#[cfg(test)]
mod tests {
    use crate::compile::{compile, Compilation};
    use crate::config::CompilerConfig;
    use crate::decl::{DeclarationKind, TypeRef};
    use crate::error::{CompileError, RangeViolation};
    use crate::grammar::{Element, NumVal, Rule, RuleList};

    fn one_rule(element: Element) -> RuleList {
        RuleList::from_rules([Rule::new("r", element.into())])
    }

    fn compile_one(element: Element) -> Result<Compilation, CompileError> {
        compile(&one_rule(element), &CompilerConfig::default())
    }

    #[test]
    fn single_value_is_a_record_of_digit_markers() {
        let out = compile_one(Element::hex("4a4").unwrap()).unwrap();
        assert_eq!(out.rule("_r").unwrap().field_names(), ["_x4A4_1"]);

        let value = out.inner("_x4A4").unwrap();
        assert_eq!(value.field_names(), ["_4_1", "_A_1", "_4_2"]);
        assert_eq!(value.fields[1].ty, TypeRef::named(["Inners", "_A"]));

        let names: Vec<_> = out.helper.nested.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["_4", "_A", "_x4A4"]);
        assert_eq!(out.inner("_4").unwrap().kind, DeclarationKind::Marker);
    }

    #[test]
    fn concatenation_points_at_segment_records() {
        let out = compile_one(Element::hex_concat(&["0D", "0A"]).unwrap()).unwrap();
        let crlf = out.inner("_x0Dˑ0A").unwrap();
        assert_eq!(crlf.field_names(), ["_x0D_1", "_x0A_1"]);
        assert_eq!(crlf.fields[0].ty, TypeRef::named(["Inners", "_x0D"]));
        assert_eq!(out.inner("_x0A").unwrap().field_names(), ["_0_1", "_A_1"]);
        assert!(out.inner("_0").is_some());
    }

    #[test]
    fn range_enumerates_variants_across_carry() {
        let out = compile_one(Element::hex_range("0e", "11").unwrap()).unwrap();
        let range = out.inner("_x0Eⲻ11").unwrap();
        assert_eq!(range.kind, DeclarationKind::Sum);
        let variants: Vec<_> = range.variants().map(|v| v.name.as_str()).collect();
        assert_eq!(variants, ["_x0E", "_x0F", "_x10", "_x11"]);
        for v in range.variants() {
            assert_eq!(v.base, Some(TypeRef::named(["Inners", "_x0Eⲻ11"])));
        }
        assert_eq!(range.find_nested("_x11").unwrap().field_names(), ["_1_1", "_1_2"]);
        // variants live inside the sum, not in the helper
        assert!(out.inner("_x0E").is_none());
    }

    #[test]
    fn bad_range_reports_bounds() {
        let err = compile_one(Element::hex_range("39", "30").unwrap()).unwrap_err();
        assert_eq!(err.rule(), Some("r"));
        assert_eq!(
            *err.root(),
            CompileError::InvalidRange {
                low: "39".into(),
                high: "30".into(),
                violation: RangeViolation::Descending,
            }
        );
    }

    #[test]
    fn bin_and_dec_values_are_rejected() {
        let err = compile_one(Element::NumVal(NumVal::Bin("0101".into()))).unwrap_err();
        assert_eq!(err.construct().map(|c| c.kind()), Some("bin-val"));
        let err = compile_one(Element::NumVal(NumVal::Dec("13".into()))).unwrap_err();
        assert_eq!(err.construct().map(|c| c.kind()), Some("dec-val"));
    }
}
