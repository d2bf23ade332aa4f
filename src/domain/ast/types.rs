// Type references as written in source.

use serde::Serialize;

use super::Span;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Type {
    Primitive(PrimitiveType),
    Reference(ReferenceType),
    Array(ArrayType),
    Wildcard(WildcardType),
}

impl Type {
    pub fn span(&self) -> Span {
        match self {
            Type::Primitive(t) => t.span,
            Type::Reference(t) => t.span,
            Type::Array(t) => t.span,
            Type::Wildcard(t) => t.span,
        }
    }

    /// Erased name: `java.util.List<String>` gives `java.util.List`,
    /// `int[][]` gives `int[][]`.
    pub fn erasure(&self) -> String {
        match self {
            Type::Primitive(t) => t.name.clone(),
            Type::Reference(t) => t.name.clone(),
            Type::Array(t) => format!("{}[]", t.component_type.erasure()),
            Type::Wildcard(_) => "?".to_string(),
        }
    }

    /// The referenced class name, if this is a class or interface type.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Type::Reference(t) => Some(&t.name),
            _ => None,
        }
    }
}

/// `int`, `boolean`, ... and `void`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "primitiveType", rename_all = "camelCase")]
pub struct PrimitiveType {
    pub span: Span,
    pub name: String,
}

/// A class or interface type; `name` is dotted as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "referenceType", rename_all = "camelCase")]
pub struct ReferenceType {
    pub span: Span,
    pub name: String,
    pub type_arguments: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "arrayType", rename_all = "camelCase")]
pub struct ArrayType {
    pub span: Span,
    pub component_type: Box<Type>,
}

/// `?`, `? extends T`, `? super T`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "wildcardType", rename_all = "camelCase")]
pub struct WildcardType {
    pub span: Span,
    pub bound_kind: Option<String>,
    pub bound: Option<Box<Type>>,
}
