// Target-neutral type-declaration model. A renderer turns this into source text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Internal,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    None,
    Abstract,
    Sealed,
    Static,
}

/// What a declaration stands for; lets renderers with native sum types skip the visitor plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Product,
    Sum,
    Marker,
    Visitor,
    Helper,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// Path from the top level, e.g. `["Inners", "ʺx61ʺ"]`, with generic arguments.
    Named { path: Vec<String>, args: Vec<TypeRef> },
    /// A generic parameter in scope.
    Param(String),
    /// Ordered sequence of the inner type.
    Sequence(Box<TypeRef>),
    /// Nullable inner type.
    Optional(Box<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub visibility: Visibility,
    pub modifier: Modifier,
    pub kind: DeclarationKind,
    pub name: String,
    pub generics: Vec<String>,
    pub base: Option<TypeRef>,
    pub constructors: Vec<Constructor>,
    pub methods: Vec<Method>,
    pub nested: Vec<Declaration>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub visibility: Visibility,
    pub ty: TypeRef,
    pub name: String,
    pub settable: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constructor {
    pub visibility: Visibility,
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub visibility: Visibility,
    pub modifier: MethodModifier,
    pub name: String,
    pub generics: Vec<String>,
    pub returns: Option<TypeRef>,
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodModifier {
    None,
    Abstract,
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub ty: TypeRef,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    /// `this.<field> = <value>`
    Assign { field: String, value: Expr },
    Return(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A parameter or local by name.
    Ident(String),
    /// The receiving instance.
    This,
    /// `<receiver>.<method>(<args>)`
    Call { receiver: Box<Expr>, method: String, args: Vec<Expr> },
}

// ------------------------------- TypeRef ---------------------------------- //

impl TypeRef {
    pub fn named<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        TypeRef::Named { path: path.into_iter().map(Into::into).collect(), args: Vec::new() }
    }

    pub fn with_args(self, extra: Vec<TypeRef>) -> Self {
        match self {
            TypeRef::Named { path, mut args } => {
                args.extend(extra);
                TypeRef::Named { path, args }
            }
            other => other,
        }
    }

    pub fn sequence(self) -> Self {
        TypeRef::Sequence(Box::new(self))
    }

    pub fn optional(self) -> Self {
        TypeRef::Optional(Box::new(self))
    }

    /// Last path segment of the innermost named type.
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { path, .. } => path.last().map(String::as_str),
            TypeRef::Param(_) => None,
            TypeRef::Sequence(inner) | TypeRef::Optional(inner) => inner.leaf_name(),
        }
    }
}

// ----------------------------- Declaration -------------------------------- //

impl Declaration {
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        let modifier = match kind {
            DeclarationKind::Product | DeclarationKind::Marker => Modifier::Sealed,
            DeclarationKind::Sum | DeclarationKind::Visitor => Modifier::Abstract,
            DeclarationKind::Helper => Modifier::Static,
        };
        Self {
            visibility: Visibility::Public,
            modifier,
            kind,
            name: name.into(),
            generics: Vec::new(),
            base: None,
            constructors: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn find_nested(&self, name: &str) -> Option<&Declaration> {
        self.nested.iter().find(|d| d.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Variant products of a sum declaration, in source order.
    pub fn variants(&self) -> impl Iterator<Item = &Declaration> {
        self.nested
            .iter()
            .filter(|d| d.kind == DeclarationKind::Product && d.base.is_some())
    }

    /// Depth-first, self first.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a Declaration>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Declaration;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.nested.iter().rev());
        Some(next)
    }
}

impl Field {
    /// Public, read-only instance field.
    pub fn new(ty: TypeRef, name: impl Into<String>) -> Self {
        Self {
            visibility: Visibility::Public,
            ty,
            name: name.into(),
            settable: false,
            is_static: false,
        }
    }
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call { receiver: Box::new(receiver), method: method.into(), args }
    }
}
