//! Declaration skeletons: products, markers, sums with their visitor, and the helper.
use crate::decl::{
    Constructor, Declaration, DeclarationKind, Expr, Field, Method, MethodModifier, Parameter,
    Statement, TypeRef, Visibility,
};
use crate::registry::NameScope;

pub const VISITOR: &str = "Visitor";
pub const VISIT: &str = "Visit";
pub const ACCEPT: &str = "Accept";
pub const DISPATCH: &str = "Dispatch";
pub const INSTANCE: &str = "Instance";
const RESULT: &str = "TResult";
const CONTEXT: &str = "TContext";

/// Sealed record with one constructor parameter per field, assigned in order.
pub fn product(name: &str, fields: Vec<Field>) -> Declaration {
    let mut decl = Declaration::new(DeclarationKind::Product, name);
    decl.constructors.push(Constructor {
        visibility: Visibility::Public,
        params: fields
            .iter()
            .map(|f| Parameter { ty: f.ty.clone(), name: f.name.clone() })
            .collect(),
        body: fields
            .iter()
            .map(|f| Statement::Assign { field: f.name.clone(), value: Expr::ident(&f.name) })
            .collect(),
    });
    decl.fields = fields;
    decl
}

/// Zero-field singleton: private constructor plus a static `Instance`.
pub fn marker(name: &str, self_ty: TypeRef) -> Declaration {
    let mut decl = Declaration::new(DeclarationKind::Marker, name);
    decl.constructors.push(Constructor {
        visibility: Visibility::Private,
        params: Vec::new(),
        body: Vec::new(),
    });
    decl.fields.push(Field { is_static: true, ..Field::new(self_ty, INSTANCE) });
    decl
}

/// Static container for every memoized inner declaration.
pub fn helper(name: &str, nested: Vec<Declaration>) -> Declaration {
    let mut decl = Declaration::new(DeclarationKind::Helper, name);
    decl.nested = nested;
    decl
}

/// Abstract sum over `variants`, each re-based onto the sum at `path`.
///
/// The private constructor keeps the hierarchy closed. With `emit_visitors`
/// every variant gets a `Dispatch` override and the sum gets a nested
/// `Visitor<TResult, TContext>` with one `Accept` per variant.
///
/// Variant names are unique within the sum and never equal the sum's own
/// name or `Visitor`; a clash is renamed `<name>_2`, `<name>_3`, ...
pub fn sum(path: &[String], variants: Vec<Declaration>, emit_visitors: bool) -> Declaration {
    let name = path.last().map(String::as_str).unwrap_or_default();
    let self_ty = TypeRef::named(path.iter().cloned());
    let visitor_ty = TypeRef::named(path.iter().cloned().chain([VISITOR.to_string()]))
        .with_args(vec![TypeRef::Param(RESULT.into()), TypeRef::Param(CONTEXT.into())]);

    let mut decl = Declaration::new(DeclarationKind::Sum, name);
    decl.constructors.push(Constructor {
        visibility: Visibility::Private,
        params: Vec::new(),
        body: Vec::new(),
    });

    let mut scope = NameScope::new();
    scope.reserve(name);
    scope.reserve(VISITOR);

    let mut accepts = Vec::with_capacity(variants.len());
    for mut variant in variants {
        variant.name = scope.claim(std::mem::take(&mut variant.name));
        variant.base = Some(self_ty.clone());
        if emit_visitors {
            let variant_ty = TypeRef::named(path.iter().cloned().chain([variant.name.clone()]));
            accepts.push(accept_method(variant_ty));
            variant.methods.push(dispatch_method(&visitor_ty, MethodModifier::Override));
        }
        decl.nested.push(variant);
    }

    if emit_visitors {
        decl.methods.push(dispatch_method(&visitor_ty, MethodModifier::Abstract));
        decl.nested.push(visitor(self_ty, accepts));
    }
    decl
}

fn dispatch_method(visitor_ty: &TypeRef, modifier: MethodModifier) -> Method {
    let body = match modifier {
        MethodModifier::Abstract => Vec::new(),
        _ => vec![Statement::Return(Expr::call(
            Expr::ident("visitor"),
            ACCEPT,
            vec![Expr::This, Expr::ident("context")],
        ))],
    };
    Method {
        visibility: Visibility::Protected,
        modifier,
        name: DISPATCH.into(),
        generics: vec![RESULT.into(), CONTEXT.into()],
        returns: Some(TypeRef::Param(RESULT.into())),
        params: vec![
            Parameter { ty: visitor_ty.clone(), name: "visitor".into() },
            Parameter { ty: TypeRef::Param(CONTEXT.into()), name: "context".into() },
        ],
        body,
    }
}

fn accept_method(node_ty: TypeRef) -> Method {
    Method {
        visibility: Visibility::Protected,
        modifier: MethodModifier::Abstract,
        name: ACCEPT.into(),
        generics: Vec::new(),
        returns: Some(TypeRef::Param(RESULT.into())),
        params: vec![
            Parameter { ty: node_ty, name: "node".into() },
            Parameter { ty: TypeRef::Param(CONTEXT.into()), name: "context".into() },
        ],
        body: Vec::new(),
    }
}

fn visitor(node_ty: TypeRef, accepts: Vec<Method>) -> Declaration {
    let mut decl = Declaration::new(DeclarationKind::Visitor, VISITOR);
    decl.generics = vec![RESULT.into(), CONTEXT.into()];
    decl.methods.push(Method {
        visibility: Visibility::Public,
        modifier: MethodModifier::None,
        name: VISIT.into(),
        generics: Vec::new(),
        returns: Some(TypeRef::Param(RESULT.into())),
        params: vec![
            Parameter { ty: node_ty, name: "node".into() },
            Parameter { ty: TypeRef::Param(CONTEXT.into()), name: "context".into() },
        ],
        body: vec![Statement::Return(Expr::call(
            Expr::ident("node"),
            DISPATCH,
            vec![Expr::This, Expr::ident("context")],
        ))],
    });
    decl.methods.extend(accepts);
    decl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn product_constructor_mirrors_fields() {
        let decl = product("p", vec![
            Field::new(TypeRef::named(["_a"]), "_a_1"),
            Field::new(TypeRef::named(["_a"]).sequence(), "_a_2"),
        ]);
        let ctor = &decl.constructors[0];
        assert_eq!(ctor.params.len(), 2);
        assert_eq!(ctor.params[1].ty, TypeRef::named(["_a"]).sequence());
        assert_eq!(
            ctor.body[0],
            Statement::Assign { field: "_a_1".into(), value: Expr::ident("_a_1") }
        );
        assert!(decl.fields.iter().all(|f| !f.settable && !f.is_static));
    }

    #[test]
    fn marker_is_a_private_singleton() {
        let decl = marker("x61", TypeRef::named(["Inners", "x61"]));
        assert_eq!(decl.kind, DeclarationKind::Marker);
        assert_eq!(decl.constructors[0].visibility, Visibility::Private);
        let instance = decl.field(INSTANCE).unwrap();
        assert!(instance.is_static);
        assert_eq!(instance.ty, TypeRef::named(["Inners", "x61"]));
    }

    #[test]
    fn sum_wires_visitor_and_dispatch() {
        let decl = sum(&path(&["_foo"]), vec![product("a", vec![]), product("b", vec![])], true);
        assert_eq!(decl.kind, DeclarationKind::Sum);
        assert_eq!(decl.method(DISPATCH).unwrap().modifier, MethodModifier::Abstract);

        let variants: Vec<_> = decl.variants().map(|v| v.name.as_str()).collect();
        assert_eq!(variants, ["a", "b"]);
        for v in decl.variants() {
            assert_eq!(v.base, Some(TypeRef::named(["_foo"])));
            assert_eq!(v.method(DISPATCH).unwrap().modifier, MethodModifier::Override);
        }

        let visitor = decl.find_nested(VISITOR).unwrap();
        assert_eq!(visitor.generics, ["TResult", "TContext"]);
        let accepts: Vec<_> = visitor
            .methods
            .iter()
            .filter(|m| m.name == ACCEPT)
            .map(|m| m.params[0].ty.clone())
            .collect();
        assert_eq!(accepts, [TypeRef::named(["_foo", "a"]), TypeRef::named(["_foo", "b"])]);
        assert_eq!(visitor.method(VISIT).unwrap().params[0].ty, TypeRef::named(["_foo"]));
    }

    #[test]
    fn clashing_variant_names_are_suffixed() {
        let variants = ["a", "a", "Visitor", "r"].map(|n| product(n, vec![]));
        let decl = sum(&path(&["r"]), variants.to_vec(), true);
        let nested: Vec<_> = decl.nested.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(nested, ["a", "a_2", "Visitor_2", "r_2", VISITOR]);

        let accepts: Vec<_> = decl
            .find_nested(VISITOR)
            .unwrap()
            .methods
            .iter()
            .filter(|m| m.name == ACCEPT)
            .map(|m| m.params[0].ty.clone())
            .collect();
        assert_eq!(accepts[1], TypeRef::named(["r", "a_2"]));
        assert_eq!(accepts[2], TypeRef::named(["r", "Visitor_2"]));
    }

    #[test]
    fn sum_without_visitors_keeps_shape() {
        let variants = vec![product("a", vec![]), product("b", vec![])];
        let decl = sum(&path(&["Inners", "aⳆb"]), variants, false);
        assert!(decl.methods.is_empty());
        assert!(decl.find_nested(VISITOR).is_none());
        assert_eq!(decl.variants().count(), 2);
        assert!(decl.variants().all(|v| v.methods.is_empty()));
        assert_eq!(decl.variants().next().unwrap().base, Some(TypeRef::named(["Inners", "aⳆb"])));
    }
}
