// Expressions. Everything that can produce a value is an `Rvalue`.

use serde::Serialize;

use super::{AnonymousClassDeclaration, Block, FormalParameters, Span, SwitchCase, Type};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rvalue {
    AmbiguousName(AmbiguousName),
    FieldAccess(FieldAccessExpression),
    SuperclassFieldAccess(SuperclassFieldAccessExpression),
    ArrayAccess(ArrayAccessExpression),
    Parenthesized(ParenthesizedExpression),
    Assignment(Assignment),
    Unary(UnaryOperation),
    Binary(BinaryOperation),
    Cast(Cast),
    ClassLiteral(ClassLiteral),
    Conditional(ConditionalExpression),
    Crement(Crement),
    Instanceof(Instanceof),
    MethodInvocation(MethodInvocation),
    SuperclassMethodInvocation(SuperclassMethodInvocation),
    NewClassInstance(NewClassInstance),
    NewAnonymousClassInstance(NewAnonymousClassInstance),
    NewArray(NewArray),
    NewInitializedArray(NewInitializedArray),
    ArrayInitializer(ArrayInitializer),
    This(ThisReference),
    QualifiedThis(QualifiedThisReference),
    Lambda(LambdaExpression),
    MethodReference(MethodReference),
    Switch(SwitchExpression),
    IntegerLiteral(IntegerLiteral),
    FloatingPointLiteral(FloatingPointLiteral),
    BooleanLiteral(BooleanLiteral),
    CharacterLiteral(CharacterLiteral),
    StringLiteral(StringLiteral),
    NullLiteral(NullLiteral),
}

impl Rvalue {
    pub fn span(&self) -> Span {
        match self {
            Rvalue::AmbiguousName(e) => e.span,
            Rvalue::FieldAccess(e) => e.span,
            Rvalue::SuperclassFieldAccess(e) => e.span,
            Rvalue::ArrayAccess(e) => e.span,
            Rvalue::Parenthesized(e) => e.span,
            Rvalue::Assignment(e) => e.span,
            Rvalue::Unary(e) => e.span,
            Rvalue::Binary(e) => e.span,
            Rvalue::Cast(e) => e.span,
            Rvalue::ClassLiteral(e) => e.span,
            Rvalue::Conditional(e) => e.span,
            Rvalue::Crement(e) => e.span,
            Rvalue::Instanceof(e) => e.span,
            Rvalue::MethodInvocation(e) => e.span,
            Rvalue::SuperclassMethodInvocation(e) => e.span,
            Rvalue::NewClassInstance(e) => e.span,
            Rvalue::NewAnonymousClassInstance(e) => e.span,
            Rvalue::NewArray(e) => e.span,
            Rvalue::NewInitializedArray(e) => e.span,
            Rvalue::ArrayInitializer(e) => e.span,
            Rvalue::This(e) => e.span,
            Rvalue::QualifiedThis(e) => e.span,
            Rvalue::Lambda(e) => e.span,
            Rvalue::MethodReference(e) => e.span,
            Rvalue::Switch(e) => e.span,
            Rvalue::IntegerLiteral(e) => e.span,
            Rvalue::FloatingPointLiteral(e) => e.span,
            Rvalue::BooleanLiteral(e) => e.span,
            Rvalue::CharacterLiteral(e) => e.span,
            Rvalue::StringLiteral(e) => e.span,
            Rvalue::NullLiteral(e) => e.span,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Lvalues
// ─────────────────────────────────────────────────────────────────────────

/// A dotted identifier chain (`a`, `a.b.c`) whose meaning (local, field,
/// package, type) is not decided syntactically.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "ambiguousName", rename_all = "camelCase")]
pub struct AmbiguousName {
    pub span: Span,
    pub identifiers: Vec<String>,
}

impl AmbiguousName {
    pub fn dotted(&self) -> String {
        self.identifiers.join(".")
    }
}

/// `expr.field` where `expr` is not a plain name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "fieldAccessExpression", rename_all = "camelCase")]
pub struct FieldAccessExpression {
    pub span: Span,
    pub lhs: Box<Rvalue>,
    pub field_name: String,
}

/// `super.field` or `Outer.super.field`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "superclassFieldAccessExpression", rename_all = "camelCase")]
pub struct SuperclassFieldAccessExpression {
    pub span: Span,
    pub qualification: Option<Type>,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "arrayAccessExpression", rename_all = "camelCase")]
pub struct ArrayAccessExpression {
    pub span: Span,
    pub lhs: Box<Rvalue>,
    pub index: Box<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "parenthesizedExpression", rename_all = "camelCase")]
pub struct ParenthesizedExpression {
    pub span: Span,
    pub value: Box<Rvalue>,
}

// ─────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────

/// `=` and the compound assignments; `operator` is the token as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "assignment", rename_all = "camelCase")]
pub struct Assignment {
    pub span: Span,
    pub lhs: Box<Rvalue>,
    pub operator: String,
    pub rhs: Box<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "unaryOperation", rename_all = "camelCase")]
pub struct UnaryOperation {
    pub span: Span,
    pub operator: String,
    pub operand: Box<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "binaryOperation", rename_all = "camelCase")]
pub struct BinaryOperation {
    pub span: Span,
    pub lhs: Box<Rvalue>,
    pub operator: String,
    pub rhs: Box<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "cast", rename_all = "camelCase")]
pub struct Cast {
    pub span: Span,
    pub target_type: Type,
    pub value: Box<Rvalue>,
}

/// `Foo.class`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "classLiteral", rename_all = "camelCase")]
pub struct ClassLiteral {
    pub span: Span,
    #[serde(rename = "type")]
    pub type_: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "conditionalExpression", rename_all = "camelCase")]
pub struct ConditionalExpression {
    pub span: Span,
    pub condition: Box<Rvalue>,
    pub then_value: Box<Rvalue>,
    pub else_value: Box<Rvalue>,
}

/// `++x`, `x--` and friends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "crement", rename_all = "camelCase")]
pub struct Crement {
    pub span: Span,
    pub operator: String,
    pub is_prefix: bool,
    pub operand: Box<Rvalue>,
}

/// `x instanceof T` and `x instanceof T t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "instanceof", rename_all = "camelCase")]
pub struct Instanceof {
    pub span: Span,
    pub lhs: Box<Rvalue>,
    pub rhs: Type,
    pub binding: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────
// Invocations and instance creation
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "methodInvocation", rename_all = "camelCase")]
pub struct MethodInvocation {
    pub span: Span,
    pub target: Option<Box<Rvalue>>,
    pub type_arguments: Vec<Type>,
    pub method_name: String,
    pub arguments: Vec<Rvalue>,
}

/// `super.m(...)`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "superclassMethodInvocation", rename_all = "camelCase")]
pub struct SuperclassMethodInvocation {
    pub span: Span,
    pub method_name: String,
    pub arguments: Vec<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "newClassInstance", rename_all = "camelCase")]
pub struct NewClassInstance {
    pub span: Span,
    pub qualification: Option<Box<Rvalue>>,
    #[serde(rename = "type")]
    pub type_: Type,
    pub arguments: Vec<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "newAnonymousClassInstance", rename_all = "camelCase")]
pub struct NewAnonymousClassInstance {
    pub span: Span,
    pub qualification: Option<Box<Rvalue>>,
    pub anonymous_class_declaration: AnonymousClassDeclaration,
    pub arguments: Vec<Rvalue>,
}

/// `new int[n][]`: `type` is the element type, `dimensionExpressions` the
/// sized dimensions and `dimensions` the count of trailing empty ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "newArray", rename_all = "camelCase")]
pub struct NewArray {
    pub span: Span,
    #[serde(rename = "type")]
    pub type_: Type,
    pub dimension_expressions: Vec<Rvalue>,
    pub dimensions: usize,
}

/// `new int[] { 1, 2 }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "newInitializedArray", rename_all = "camelCase")]
pub struct NewInitializedArray {
    pub span: Span,
    pub array_type: Type,
    pub array_initializer: ArrayInitializer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "arrayInitializer", rename_all = "camelCase")]
pub struct ArrayInitializer {
    pub span: Span,
    pub values: Vec<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "thisReference", rename_all = "camelCase")]
pub struct ThisReference {
    pub span: Span,
}

/// `Outer.this`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "qualifiedThisReference", rename_all = "camelCase")]
pub struct QualifiedThisReference {
    pub span: Span,
    pub qualification: Type,
}

// ─────────────────────────────────────────────────────────────────────────
// Lambdas, method references, switch expressions
// ─────────────────────────────────────────────────────────────────────────

/// Inferred parameters (`x -> ...`, `(a, b) -> ...`) are listed by name in
/// `parameterNames`; declared ones live in `formalParameters`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "lambdaExpression", rename_all = "camelCase")]
pub struct LambdaExpression {
    pub span: Span,
    pub parameter_names: Vec<String>,
    pub formal_parameters: Option<FormalParameters>,
    pub body: LambdaBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LambdaBody {
    Expression(Box<Rvalue>),
    Block(Block),
}

/// `target::name`; `name` is `new` for constructor references and
/// `target` is `None` for `super::name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "methodReference", rename_all = "camelCase")]
pub struct MethodReference {
    pub span: Span,
    pub target: Option<MethodReferenceTarget>,
    pub method_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MethodReferenceTarget {
    Type(Type),
    Expression(Box<Rvalue>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "switchExpression", rename_all = "camelCase")]
pub struct SwitchExpression {
    pub span: Span,
    pub selector: Box<Rvalue>,
    pub cases: Vec<SwitchCase>,
}

// ─────────────────────────────────────────────────────────────────────────
// Literals: `value` is the token exactly as written.
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "integerLiteral", rename_all = "camelCase")]
pub struct IntegerLiteral {
    pub span: Span,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "floatingPointLiteral", rename_all = "camelCase")]
pub struct FloatingPointLiteral {
    pub span: Span,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "booleanLiteral", rename_all = "camelCase")]
pub struct BooleanLiteral {
    pub span: Span,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "characterLiteral", rename_all = "camelCase")]
pub struct CharacterLiteral {
    pub span: Span,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "stringLiteral", rename_all = "camelCase")]
pub struct StringLiteral {
    pub span: Span,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "nullLiteral", rename_all = "camelCase")]
pub struct NullLiteral {
    pub span: Span,
    pub value: String,
}
