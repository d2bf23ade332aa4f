// Statements, blocks and the clauses that only occur inside them.

use serde::Serialize;

use super::{FormalParameter, Modifiers, Rvalue, Span, Type, TypeDeclaration, VariableDeclarator};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statement {
    Labeled(LabeledStatement),
    Block(Block),
    Expression(ExpressionStatement),
    If(IfStatement),
    For(ForStatement),
    ForEach(ForEachStatement),
    While(WhileStatement),
    Do(DoStatement),
    Try(TryStatement),
    Switch(SwitchStatement),
    Synchronized(SynchronizedStatement),
    LocalVariableDeclaration(LocalVariableDeclarationStatement),
    Return(ReturnStatement),
    Throw(ThrowStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Assert(AssertStatement),
    Empty(EmptyStatement),
    LocalClassDeclaration(LocalClassDeclarationStatement),
    Yield(YieldStatement),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Labeled(s) => s.span,
            Statement::Block(s) => s.span,
            Statement::Expression(s) => s.span,
            Statement::If(s) => s.span,
            Statement::For(s) => s.span,
            Statement::ForEach(s) => s.span,
            Statement::While(s) => s.span,
            Statement::Do(s) => s.span,
            Statement::Try(s) => s.span,
            Statement::Switch(s) => s.span,
            Statement::Synchronized(s) => s.span,
            Statement::LocalVariableDeclaration(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Throw(s) => s.span,
            Statement::Break(s) => s.span,
            Statement::Continue(s) => s.span,
            Statement::Assert(s) => s.span,
            Statement::Empty(s) => s.span,
            Statement::LocalClassDeclaration(s) => s.span,
            Statement::Yield(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "labeledStatement", rename_all = "camelCase")]
pub struct LabeledStatement {
    pub span: Span,
    pub label: String,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "block", rename_all = "camelCase")]
pub struct Block {
    pub span: Span,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "expressionStatement", rename_all = "camelCase")]
pub struct ExpressionStatement {
    pub span: Span,
    pub expression: Rvalue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "ifStatement", rename_all = "camelCase")]
pub struct IfStatement {
    pub span: Span,
    pub condition: Rvalue,
    pub then_statement: Box<Statement>,
    pub else_statement: Option<Box<Statement>>,
}

/// Classic `for (init; condition; update)`. `init` holds either one local
/// variable declaration or a list of expression statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "forStatement", rename_all = "camelCase")]
pub struct ForStatement {
    pub span: Span,
    pub init: Vec<Statement>,
    pub condition: Option<Rvalue>,
    pub update: Vec<Rvalue>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "forEachStatement", rename_all = "camelCase")]
pub struct ForEachStatement {
    pub span: Span,
    pub current_element: FormalParameter,
    pub expression: Rvalue,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "whileStatement", rename_all = "camelCase")]
pub struct WhileStatement {
    pub span: Span,
    pub condition: Rvalue,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "doStatement", rename_all = "camelCase")]
pub struct DoStatement {
    pub span: Span,
    pub body: Box<Statement>,
    pub condition: Rvalue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "tryStatement", rename_all = "camelCase")]
pub struct TryStatement {
    pub span: Span,
    pub resources: Vec<TryResource>,
    pub body: Block,
    pub catch_clauses: Vec<CatchClause>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TryResource {
    LocalVariableDeclarator(LocalVariableDeclaratorResource),
    VariableAccess(VariableAccessResource),
}

impl TryResource {
    pub fn span(&self) -> Span {
        match self {
            TryResource::LocalVariableDeclarator(r) => r.span,
            TryResource::VariableAccess(r) => r.span,
        }
    }
}

/// `try (Reader r = open()) ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "localVariableDeclaratorResource", rename_all = "camelCase")]
pub struct LocalVariableDeclaratorResource {
    pub span: Span,
    pub modifiers: Modifiers,
    #[serde(rename = "type")]
    pub type_: Type,
    pub name: String,
    pub initializer: Rvalue,
}

/// `try (this.reader) ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "variableAccessResource", rename_all = "camelCase")]
pub struct VariableAccessResource {
    pub span: Span,
    pub variable_access: Rvalue,
}

/// One `catch`; `types` has more than one entry for a multi-catch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "catchClause", rename_all = "camelCase")]
pub struct CatchClause {
    pub span: Span,
    pub modifiers: Modifiers,
    pub types: Vec<Type>,
    pub name: String,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "switchStatement", rename_all = "camelCase")]
pub struct SwitchStatement {
    pub span: Span,
    pub selector: Rvalue,
    pub cases: Vec<SwitchCase>,
}

/// A group of `case` labels (or `default`) with its statements. Arrow
/// cases hold their single body (expression, block or throw) as the only
/// statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "switchCase", rename_all = "camelCase")]
pub struct SwitchCase {
    pub span: Span,
    pub labels: Vec<Rvalue>,
    pub is_default: bool,
    pub arrow: bool,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "synchronizedStatement", rename_all = "camelCase")]
pub struct SynchronizedStatement {
    pub span: Span,
    pub expression: Rvalue,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "localVariableDeclarationStatement", rename_all = "camelCase")]
pub struct LocalVariableDeclarationStatement {
    pub span: Span,
    pub modifiers: Modifiers,
    #[serde(rename = "type")]
    pub type_: Type,
    pub variable_declarators: Vec<VariableDeclarator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "returnStatement", rename_all = "camelCase")]
pub struct ReturnStatement {
    pub span: Span,
    pub return_value: Option<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "throwStatement", rename_all = "camelCase")]
pub struct ThrowStatement {
    pub span: Span,
    pub expression: Rvalue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "breakStatement", rename_all = "camelCase")]
pub struct BreakStatement {
    pub span: Span,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "continueStatement", rename_all = "camelCase")]
pub struct ContinueStatement {
    pub span: Span,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "assertStatement", rename_all = "camelCase")]
pub struct AssertStatement {
    pub span: Span,
    pub condition: Rvalue,
    pub message: Option<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "emptyStatement", rename_all = "camelCase")]
pub struct EmptyStatement {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "localClassDeclarationStatement", rename_all = "camelCase")]
pub struct LocalClassDeclarationStatement {
    pub span: Span,
    pub declaration: TypeDeclaration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "yieldStatement", rename_all = "camelCase")]
pub struct YieldStatement {
    pub span: Span,
    pub value: Rvalue,
}
