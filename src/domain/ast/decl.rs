// Declarations: package, imports, type declarations, members, annotations.

use serde::{Serialize, Serializer};

use super::{Block, Modifiers, Nesting, Rvalue, Span, Statement, Type};
use crate::domain::node_kind::NodeKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "packageDeclaration", rename_all = "camelCase")]
pub struct PackageDeclaration {
    pub span: Span,
    pub annotations: Vec<Annotation>,
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────
// Imports
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImportDeclaration {
    SingleType(SingleTypeImportDeclaration),
    TypeOnDemand(TypeImportOnDemandDeclaration),
    SingleStatic(SingleStaticImportDeclaration),
    StaticOnDemand(StaticImportOnDemandDeclaration),
}

/// `import a.b.C;`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "singleTypeImportDeclaration", rename_all = "camelCase")]
pub struct SingleTypeImportDeclaration {
    pub span: Span,
    pub name: String,
}

/// `import a.b.*;`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "typeImportOnDemandDeclaration", rename_all = "camelCase")]
pub struct TypeImportOnDemandDeclaration {
    pub span: Span,
    pub package: String,
}

/// `import static a.b.C.member;`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "singleStaticImportDeclaration", rename_all = "camelCase")]
pub struct SingleStaticImportDeclaration {
    pub span: Span,
    pub type_name: String,
    pub member: String,
}

/// `import static a.b.C.*;`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "staticImportOnDemandDeclaration", rename_all = "camelCase")]
pub struct StaticImportOnDemandDeclaration {
    pub span: Span,
    pub type_name: String,
}

// ─────────────────────────────────────────────────────────────────────────
// Type declarations
// ─────────────────────────────────────────────────────────────────────────

/// A named type declaration. The same shapes occur at package level, as
/// members and as local declarations; `nesting` tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypeDeclaration {
    Class(ClassDeclaration),
    Interface(InterfaceDeclaration),
    Enum(EnumDeclaration),
    AnnotationType(AnnotationTypeDeclaration),
    Record(RecordDeclaration),
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        match self {
            TypeDeclaration::Class(d) => &d.name,
            TypeDeclaration::Interface(d) => &d.name,
            TypeDeclaration::Enum(d) => &d.name,
            TypeDeclaration::AnnotationType(d) => &d.name,
            TypeDeclaration::Record(d) => &d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeDeclaration::Class(d) => d.span,
            TypeDeclaration::Interface(d) => d.span,
            TypeDeclaration::Enum(d) => d.span,
            TypeDeclaration::AnnotationType(d) => d.span,
            TypeDeclaration::Record(d) => d.span,
        }
    }

    pub fn modifiers(&self) -> &Modifiers {
        match self {
            TypeDeclaration::Class(d) => &d.modifiers,
            TypeDeclaration::Interface(d) => &d.modifiers,
            TypeDeclaration::Enum(d) => &d.modifiers,
            TypeDeclaration::AnnotationType(d) => &d.modifiers,
            TypeDeclaration::Record(d) => &d.modifiers,
        }
    }

    pub fn members(&self) -> &[MemberDeclaration] {
        match self {
            TypeDeclaration::Class(d) => &d.members,
            TypeDeclaration::Interface(d) => &d.members,
            TypeDeclaration::Enum(d) => &d.members,
            TypeDeclaration::AnnotationType(d) => &d.members,
            TypeDeclaration::Record(d) => &d.members,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TypeDeclaration::Class(d) => d.kind(),
            TypeDeclaration::Interface(d) => d.kind(),
            TypeDeclaration::Enum(d) => d.kind(),
            TypeDeclaration::AnnotationType(d) => d.kind(),
            TypeDeclaration::Record(d) => d.kind(),
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, TypeDeclaration::Interface(_) | TypeDeclaration::AnnotationType(_))
    }

    /// Declared super types: `extends` first, then `implements`.
    pub fn super_types(&self) -> Vec<&Type> {
        match self {
            TypeDeclaration::Class(d) => d.extends.iter().chain(d.implements.iter()).collect(),
            TypeDeclaration::Interface(d) => d.extends.iter().collect(),
            TypeDeclaration::Enum(d) => d.implements.iter().collect(),
            TypeDeclaration::AnnotationType(_) => Vec::new(),
            TypeDeclaration::Record(d) => d.implements.iter().collect(),
        }
    }
}

fn class_kind<S: Serializer>(nesting: &Nesting, s: S) -> Result<S::Ok, S::Error> {
    NodeKind::class_declaration(*nesting).serialize(s)
}

fn interface_kind<S: Serializer>(nesting: &Nesting, s: S) -> Result<S::Ok, S::Error> {
    NodeKind::interface_declaration(*nesting).serialize(s)
}

fn enum_kind<S: Serializer>(nesting: &Nesting, s: S) -> Result<S::Ok, S::Error> {
    NodeKind::enum_declaration(*nesting).serialize(s)
}

fn annotation_type_kind<S: Serializer>(nesting: &Nesting, s: S) -> Result<S::Ok, S::Error> {
    NodeKind::annotation_type_declaration(*nesting).serialize(s)
}

fn record_kind<S: Serializer>(nesting: &Nesting, s: S) -> Result<S::Ok, S::Error> {
    NodeKind::record_declaration(*nesting).serialize(s)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclaration {
    #[serde(rename = "kind", serialize_with = "class_kind")]
    pub nesting: Nesting,
    pub span: Span,
    pub modifiers: Modifiers,
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,
    pub extends: Option<Type>,
    pub implements: Vec<Type>,
    pub members: Vec<MemberDeclaration>,
}

impl ClassDeclaration {
    pub fn kind(&self) -> NodeKind {
        NodeKind::class_declaration(self.nesting)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDeclaration {
    #[serde(rename = "kind", serialize_with = "interface_kind")]
    pub nesting: Nesting,
    pub span: Span,
    pub modifiers: Modifiers,
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,
    pub extends: Vec<Type>,
    pub members: Vec<MemberDeclaration>,
}

impl InterfaceDeclaration {
    pub fn kind(&self) -> NodeKind {
        NodeKind::interface_declaration(self.nesting)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDeclaration {
    #[serde(rename = "kind", serialize_with = "enum_kind")]
    pub nesting: Nesting,
    pub span: Span,
    pub modifiers: Modifiers,
    pub name: String,
    /// Always empty; present so enums answer every class field.
    pub type_parameters: Vec<TypeParameter>,
    /// Always `None`.
    pub extends: Option<Type>,
    pub implements: Vec<Type>,
    pub constants: Vec<EnumConstant>,
    pub members: Vec<MemberDeclaration>,
}

impl EnumDeclaration {
    pub fn kind(&self) -> NodeKind {
        NodeKind::enum_declaration(self.nesting)
    }
}

/// `@interface`. Never local; the parser rejects local annotation types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationTypeDeclaration {
    #[serde(rename = "kind", serialize_with = "annotation_type_kind")]
    pub nesting: Nesting,
    pub span: Span,
    pub modifiers: Modifiers,
    pub name: String,
    pub members: Vec<MemberDeclaration>,
}

impl AnnotationTypeDeclaration {
    pub fn kind(&self) -> NodeKind {
        NodeKind::annotation_type_declaration(self.nesting)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeclaration {
    #[serde(rename = "kind", serialize_with = "record_kind")]
    pub nesting: Nesting,
    pub span: Span,
    pub modifiers: Modifiers,
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,
    /// Always `None`.
    pub extends: Option<Type>,
    pub components: FormalParameters,
    pub implements: Vec<Type>,
    pub members: Vec<MemberDeclaration>,
}

impl RecordDeclaration {
    pub fn kind(&self) -> NodeKind {
        NodeKind::record_declaration(self.nesting)
    }
}

/// The body of `new Base(...) { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "anonymousClassDeclaration", rename_all = "camelCase")]
pub struct AnonymousClassDeclaration {
    pub span: Span,
    pub base_type: Type,
    pub members: Vec<MemberDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "typeParameter", rename_all = "camelCase")]
pub struct TypeParameter {
    pub span: Span,
    pub name: String,
    pub bounds: Vec<Type>,
}

// ─────────────────────────────────────────────────────────────────────────
// Members
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MemberDeclaration {
    Field(FieldDeclaration),
    Method(MethodDeclarator),
    Constructor(ConstructorDeclarator),
    Initializer(Initializer),
    Type(TypeDeclaration),
}

/// Also used for interface constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "fieldDeclaration", rename_all = "camelCase")]
pub struct FieldDeclaration {
    pub span: Span,
    pub modifiers: Modifiers,
    #[serde(rename = "type")]
    pub type_: Type,
    pub variable_declarators: Vec<VariableDeclarator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "variableDeclarator", rename_all = "camelCase")]
pub struct VariableDeclarator {
    pub span: Span,
    pub name: String,
    /// Extra `[]` after the name, as in `int a[]`.
    pub brackets: usize,
    pub initializer: Option<Rvalue>,
}

/// Methods, and annotation type elements (which carry a `defaultValue`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "methodDeclarator", rename_all = "camelCase")]
pub struct MethodDeclarator {
    pub span: Span,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<TypeParameter>,
    pub return_type: Type,
    pub name: String,
    pub formal_parameters: FormalParameters,
    pub thrown_exceptions: Vec<Type>,
    pub default_value: Option<ElementValue>,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "constructorDeclarator", rename_all = "camelCase")]
pub struct ConstructorDeclarator {
    pub span: Span,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<TypeParameter>,
    pub name: String,
    pub formal_parameters: FormalParameters,
    pub thrown_exceptions: Vec<Type>,
    pub constructor_invocation: Option<ConstructorInvocation>,
    pub statements: Vec<Statement>,
}

/// `this(...)` or `super(...)` as the first statement of a constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstructorInvocation {
    Alternate(AlternateConstructorInvocation),
    Super(SuperConstructorInvocation),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "alternateConstructorInvocation", rename_all = "camelCase")]
pub struct AlternateConstructorInvocation {
    pub span: Span,
    pub arguments: Vec<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "superConstructorInvocation", rename_all = "camelCase")]
pub struct SuperConstructorInvocation {
    pub span: Span,
    pub qualification: Option<Box<Rvalue>>,
    pub arguments: Vec<Rvalue>,
}

/// Static or instance initializer block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "initializer", rename_all = "camelCase")]
pub struct Initializer {
    pub span: Span,
    pub is_static: bool,
    pub block: Block,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "formalParameters", rename_all = "camelCase")]
pub struct FormalParameters {
    pub span: Span,
    pub parameters: Vec<FormalParameter>,
    pub variable_arity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "formalParameter", rename_all = "camelCase")]
pub struct FormalParameter {
    pub span: Span,
    pub modifiers: Modifiers,
    #[serde(rename = "type")]
    pub type_: Type,
    pub name: String,
    pub variable_arity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "enumConstant", rename_all = "camelCase")]
pub struct EnumConstant {
    pub span: Span,
    pub modifiers: Modifiers,
    pub name: String,
    pub arguments: Vec<Rvalue>,
    pub class_body: Option<Vec<MemberDeclaration>>,
}

// ─────────────────────────────────────────────────────────────────────────
// Annotations
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Annotation {
    Marker(MarkerAnnotation),
    SingleElement(SingleElementAnnotation),
    Normal(NormalAnnotation),
}

impl Annotation {
    pub fn type_name(&self) -> &str {
        match self {
            Annotation::Marker(a) => &a.type_name,
            Annotation::SingleElement(a) => &a.type_name,
            Annotation::Normal(a) => &a.type_name,
        }
    }
}

/// `@Override`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "markerAnnotation", rename_all = "camelCase")]
pub struct MarkerAnnotation {
    pub span: Span,
    pub type_name: String,
}

/// `@SuppressWarnings("unchecked")`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "singleElementAnnotation", rename_all = "camelCase")]
pub struct SingleElementAnnotation {
    pub span: Span,
    pub type_name: String,
    pub element_value: Box<ElementValue>,
}

/// `@Retention(value = RUNTIME)`, and `@A()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "normalAnnotation", rename_all = "camelCase")]
pub struct NormalAnnotation {
    pub span: Span,
    pub type_name: String,
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "elementValuePair", rename_all = "camelCase")]
pub struct ElementValuePair {
    pub span: Span,
    pub key: String,
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementValue {
    Rvalue(Rvalue),
    Annotation(Annotation),
    ArrayInitializer(ElementValueArrayInitializer),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "elementValueArrayInitializer", rename_all = "camelCase")]
pub struct ElementValueArrayInitializer {
    pub span: Span,
    pub element_values: Vec<ElementValue>,
}
