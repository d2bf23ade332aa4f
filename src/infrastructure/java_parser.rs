//! Java source parser: tree-sitter-java concrete syntax lowered into the
//! typed AST.
//!
//! Any ERROR or MISSING node fails the file. Constructs the AST does not
//! model (patterns, string templates, top-level statements) fail it too;
//! nothing is skipped silently except comments and `module-info`
//! declarations.

use std::cell::Cell;
use std::sync::Arc;

use tree_sitter::{Node, Parser};

use crate::domain::ast::*;
use crate::domain::errors::ParseError;
use crate::ports::SourceParser;

type Lowered<T> = Result<T, ParseError>;

/// Deepest nesting of expressions, statements and types a unit may have.
/// Lowering and traversal both recurse once per level.
pub const MAX_NESTING: usize = 1000;

const TYPE_KINDS: &[&str] = &[
    "void_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "annotated_type",
];

const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Stateless; each call builds its own tree-sitter parser, so one instance
/// serves every parse-phase worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaParser;

impl SourceParser for JavaParser {
    fn parse(&self, path: &str, source: Arc<str>) -> Result<CompilationUnit, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| ParseError::Language(e.to_string()))?;
        let tree = parser
            .parse(source.as_bytes(), None)
            .ok_or_else(|| ParseError::Language(format!("no syntax tree produced for {}", path)))?;

        let root = tree.root_node();
        let lowering = Lowering { path, src: &source, depth: Cell::new(0) };
        if root.has_error() {
            return Err(lowering.syntax_error(root));
        }
        let mut unit = lowering.compilation_unit(root)?;
        unit.source = Arc::clone(&source);
        Ok(unit)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Tree helpers
// ─────────────────────────────────────────────────────────────────────────

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).filter(|c| !c.is_extra()).collect()
}

fn all_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).filter(|c| !c.is_extra()).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    all_children(node).iter().any(|c| c.kind() == token)
}

fn is_annotation(node: Node<'_>) -> bool {
    matches!(node.kind(), "marker_annotation" | "annotation")
}

fn is_type(node: Node<'_>) -> bool {
    TYPE_KINDS.contains(&node.kind())
}

/// Number of `[]` pairs in a `dimensions` node.
fn bracket_count(dimensions: Option<Node<'_>>) -> usize {
    dimensions.map_or(0, |d| all_children(d).iter().filter(|c| c.kind() == "[").count())
}

fn span_of(node: Node<'_>) -> Span {
    let start = node.start_position();
    Span {
        line: start.row + 1,
        column: start.column + 1,
        start: node.start_byte(),
        end: node.end_byte(),
    }
}

/// First ERROR or MISSING node in document order.
fn find_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            return None;
        }
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|c| c.is_error() || c.is_missing() || c.has_error());
        node = next?;
    }
}

fn wrap_array(component: Type, dimensions: usize, span: Span) -> Type {
    (0..dimensions).fold(component, |inner, _| {
        Type::Array(ArrayType { span, component_type: Box::new(inner) })
    })
}

struct Lowering<'s> {
    path: &'s str,
    src: &'s str,
    depth: Cell<usize>,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.src.get(node.byte_range()).unwrap_or("")
    }

    /// Source text with whitespace dropped, for dotted names.
    fn dotted(&self, node: Node<'_>) -> String {
        self.text(node).chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Lowered<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            let span = span_of(node);
            ParseError::Syntax {
                path: self.path.to_string(),
                line: span.line,
                column: span.column,
                message: format!("{} without {}", node.kind().replace('_', " "), name),
            }
        })
    }

    fn field_text(&self, node: Node<'_>, name: &str) -> Lowered<String> {
        Ok(self.text(self.field(node, name)?).to_string())
    }

    fn unsupported(&self, node: Node<'_>) -> ParseError {
        let span = span_of(node);
        ParseError::Unsupported {
            path: self.path.to_string(),
            line: span.line,
            column: span.column,
            construct: node.kind().replace('_', " "),
        }
    }

    /// Runs `lower` one nesting level deeper.
    fn nested<T>(&self, node: Node<'_>, lower: impl FnOnce() -> Lowered<T>) -> Lowered<T> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING {
            let span = span_of(node);
            return Err(ParseError::Unsupported {
                path: self.path.to_string(),
                line: span.line,
                column: span.column,
                construct: format!("{} nested deeper than {} levels", node.kind().replace('_', " "), MAX_NESTING),
            });
        }
        self.depth.set(depth + 1);
        let lowered = lower();
        self.depth.set(depth);
        lowered
    }

    fn syntax_error(&self, root: Node<'_>) -> ParseError {
        let node = find_error(root).unwrap_or(root);
        let span = span_of(node);
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            let snippet: String = self.text(node).lines().next().unwrap_or("").chars().take(40).collect();
            if snippet.trim().is_empty() {
                "syntax error".to_string()
            } else {
                format!("syntax error at `{}`", snippet.trim())
            }
        };
        ParseError::Syntax {
            path: self.path.to_string(),
            line: span.line,
            column: span.column,
            message,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Compilation unit and declarations
    // ═══════════════════════════════════════════════════════════════════

    fn compilation_unit(&self, root: Node<'_>) -> Lowered<CompilationUnit> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();

        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    let annotations = self.annotations(child)?;
                    let name = named_children(child)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
                        .map(|n| self.dotted(n))
                        .unwrap_or_default();
                    package = Some(PackageDeclaration { span: span_of(child), annotations, name });
                }
                "import_declaration" => imports.push(self.import_declaration(child)?),
                "module_declaration" => {}
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                    types.push(self.type_declaration(child, Nesting::PackageMember)?)
                }
                _ => return Err(self.unsupported(child)),
            }
        }

        Ok(CompilationUnit {
            path: self.path.to_string(),
            source: Arc::from(""),
            span: span_of(root),
            package,
            imports,
            types,
        })
    }

    fn import_declaration(&self, node: Node<'_>) -> Lowered<ImportDeclaration> {
        let span = span_of(node);
        let is_static = has_token(node, "static");
        let on_demand = child_of_kind(node, "asterisk").is_some();
        let name = named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
            .map(|n| self.dotted(n))
            .unwrap_or_default();

        Ok(match (is_static, on_demand) {
            (false, false) => ImportDeclaration::SingleType(SingleTypeImportDeclaration { span, name }),
            (false, true) => {
                ImportDeclaration::TypeOnDemand(TypeImportOnDemandDeclaration { span, package: name })
            }
            (true, false) => {
                let (type_name, member) = name.rsplit_once('.').unwrap_or(("", name.as_str()));
                ImportDeclaration::SingleStatic(SingleStaticImportDeclaration {
                    span,
                    type_name: type_name.to_string(),
                    member: member.to_string(),
                })
            }
            (true, true) => {
                ImportDeclaration::StaticOnDemand(StaticImportOnDemandDeclaration { span, type_name: name })
            }
        })
    }

    fn type_declaration(&self, node: Node<'_>, nesting: Nesting) -> Lowered<TypeDeclaration> {
        self.nested(node, || self.lower_type_declaration(node, nesting))
    }

    fn lower_type_declaration(&self, node: Node<'_>, nesting: Nesting) -> Lowered<TypeDeclaration> {
        let span = span_of(node);
        let modifiers = self.modifiers(node)?;
        let name = self.field_text(node, "name")?;
        let type_parameters = self.type_parameters(node.child_by_field_name("type_parameters"))?;
        let implements = match child_of_kind(node, "super_interfaces") {
            Some(si) => self.type_list(si)?,
            None => Vec::new(),
        };

        Ok(match node.kind() {
            "class_declaration" => {
                let extends = match child_of_kind(node, "superclass") {
                    Some(sc) => match named_children(sc).into_iter().find(|c| is_type(*c)) {
                        Some(t) => Some(self.type_(t)?),
                        None => None,
                    },
                    None => None,
                };
                TypeDeclaration::Class(ClassDeclaration {
                    nesting,
                    span,
                    modifiers,
                    name,
                    type_parameters,
                    extends,
                    implements,
                    members: self.members(self.field(node, "body")?)?,
                })
            }
            "interface_declaration" => {
                let extends = match child_of_kind(node, "extends_interfaces") {
                    Some(ei) => self.type_list(ei)?,
                    None => Vec::new(),
                };
                TypeDeclaration::Interface(InterfaceDeclaration {
                    nesting,
                    span,
                    modifiers,
                    name,
                    type_parameters,
                    extends,
                    members: self.members(self.field(node, "body")?)?,
                })
            }
            "enum_declaration" => {
                let body = self.field(node, "body")?;
                let mut constants = Vec::new();
                let mut members = Vec::new();
                for child in named_children(body) {
                    match child.kind() {
                        "enum_constant" => constants.push(self.enum_constant(child)?),
                        "enum_body_declarations" => members = self.members(child)?,
                        _ => return Err(self.unsupported(child)),
                    }
                }
                TypeDeclaration::Enum(EnumDeclaration {
                    nesting,
                    span,
                    modifiers,
                    name,
                    type_parameters,
                    extends: None,
                    implements,
                    constants,
                    members,
                })
            }
            "record_declaration" => TypeDeclaration::Record(RecordDeclaration {
                nesting,
                span,
                modifiers,
                name,
                type_parameters,
                extends: None,
                components: self.formal_parameters(self.field(node, "parameters")?)?,
                implements,
                members: self.members(self.field(node, "body")?)?,
            }),
            "annotation_type_declaration" if nesting != Nesting::Local => {
                TypeDeclaration::AnnotationType(AnnotationTypeDeclaration {
                    nesting,
                    span,
                    modifiers,
                    name,
                    members: self.members(self.field(node, "body")?)?,
                })
            }
            _ => return Err(self.unsupported(node)),
        })
    }

    /// Lowers the declarations of a class, interface, annotation type or
    /// enum body.
    fn members(&self, body: Node<'_>) -> Lowered<Vec<MemberDeclaration>> {
        let mut members = Vec::new();
        for child in named_children(body) {
            let member = match child.kind() {
                "field_declaration" | "constant_declaration" => {
                    MemberDeclaration::Field(self.field_declaration(child)?)
                }
                "method_declaration" | "annotation_type_element_declaration" => {
                    MemberDeclaration::Method(self.method_declarator(child)?)
                }
                "constructor_declaration" | "compact_constructor_declaration" => {
                    MemberDeclaration::Constructor(self.constructor_declarator(child)?)
                }
                "block" => MemberDeclaration::Initializer(Initializer {
                    span: span_of(child),
                    is_static: false,
                    block: self.block(child)?,
                }),
                "static_initializer" => {
                    let block = child_of_kind(child, "block").ok_or_else(|| self.unsupported(child))?;
                    MemberDeclaration::Initializer(Initializer {
                        span: span_of(child),
                        is_static: true,
                        block: self.block(block)?,
                    })
                }
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                    MemberDeclaration::Type(self.type_declaration(child, Nesting::Member)?)
                }
                _ => return Err(self.unsupported(child)),
            };
            members.push(member);
        }
        Ok(members)
    }

    fn modifiers(&self, node: Node<'_>) -> Lowered<Modifiers> {
        let mut modifiers = Modifiers::default();
        if let Some(m) = child_of_kind(node, "modifiers") {
            for child in all_children(m) {
                if is_annotation(child) {
                    modifiers.annotations.push(self.annotation(child)?);
                } else if !child.is_named() {
                    modifiers.flags.push(child.kind().to_string());
                }
            }
        }
        Ok(modifiers)
    }

    fn type_parameters(&self, node: Option<Node<'_>>) -> Lowered<Vec<TypeParameter>> {
        let Some(node) = node else {
            return Ok(Vec::new());
        };
        let mut params = Vec::new();
        for tp in named_children(node).into_iter().filter(|c| c.kind() == "type_parameter") {
            let name = named_children(tp)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                .map(|n| self.text(n).to_string())
                .unwrap_or_default();
            let bounds = match child_of_kind(tp, "type_bound") {
                Some(b) => self.types_in(b)?,
                None => Vec::new(),
            };
            params.push(TypeParameter { span: span_of(tp), name, bounds });
        }
        Ok(params)
    }

    fn field_declaration(&self, node: Node<'_>) -> Lowered<FieldDeclaration> {
        Ok(FieldDeclaration {
            span: span_of(node),
            modifiers: self.modifiers(node)?,
            type_: self.type_(self.field(node, "type")?)?,
            variable_declarators: self.variable_declarators(node)?,
        })
    }

    fn variable_declarators(&self, node: Node<'_>) -> Lowered<Vec<VariableDeclarator>> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
            .map(|vd| {
                let initializer = match vd.child_by_field_name("value") {
                    Some(v) => Some(self.expression(v)?),
                    None => None,
                };
                Ok(VariableDeclarator {
                    span: span_of(vd),
                    name: self.field_text(vd, "name")?,
                    brackets: bracket_count(vd.child_by_field_name("dimensions")),
                    initializer,
                })
            })
            .collect()
    }

    fn method_declarator(&self, node: Node<'_>) -> Lowered<MethodDeclarator> {
        let span = span_of(node);
        let return_type = self.type_(self.field(node, "type")?)?;
        let extra_dims = bracket_count(node.child_by_field_name("dimensions"));
        let return_type = wrap_array(return_type, extra_dims, span);

        let formal_parameters = match node.child_by_field_name("parameters") {
            Some(p) => self.formal_parameters(p)?,
            // Annotation type elements: `int value() default 0;`
            None => {
                let parens: Vec<Span> = all_children(node)
                    .into_iter()
                    .filter(|c| matches!(c.kind(), "(" | ")"))
                    .map(span_of)
                    .collect();
                let span = match (parens.first(), parens.last()) {
                    (Some(open), Some(close)) => open.to(*close),
                    _ => span,
                };
                FormalParameters { span, parameters: Vec::new(), variable_arity: false }
            }
        };
        let default_value = match node.child_by_field_name("value") {
            Some(v) => Some(self.element_value(v)?),
            None => None,
        };
        let body = match node.child_by_field_name("body") {
            Some(b) => Some(self.block(b)?),
            None => None,
        };

        Ok(MethodDeclarator {
            span,
            modifiers: self.modifiers(node)?,
            type_parameters: self.type_parameters(node.child_by_field_name("type_parameters"))?,
            return_type,
            name: self.field_text(node, "name")?,
            formal_parameters,
            thrown_exceptions: self.throws(node)?,
            default_value,
            body,
        })
    }

    fn constructor_declarator(&self, node: Node<'_>) -> Lowered<ConstructorDeclarator> {
        let span = span_of(node);
        let formal_parameters = match node.child_by_field_name("parameters") {
            Some(p) => self.formal_parameters(p)?,
            // Compact record constructor.
            None => FormalParameters { span, parameters: Vec::new(), variable_arity: false },
        };

        let mut constructor_invocation = None;
        let mut statements = Vec::new();
        let body = self.field(node, "body")?;
        for child in all_children(body) {
            match child.kind() {
                "{" | "}" => {}
                "explicit_constructor_invocation" => {
                    constructor_invocation = Some(self.constructor_invocation(child)?)
                }
                _ => statements.push(self.statement(child)?),
            }
        }

        Ok(ConstructorDeclarator {
            span,
            modifiers: self.modifiers(node)?,
            type_parameters: self.type_parameters(node.child_by_field_name("type_parameters"))?,
            name: self.field_text(node, "name")?,
            formal_parameters,
            thrown_exceptions: self.throws(node)?,
            constructor_invocation,
            statements,
        })
    }

    fn constructor_invocation(&self, node: Node<'_>) -> Lowered<ConstructorInvocation> {
        let span = span_of(node);
        let arguments = self.arguments(self.field(node, "arguments")?)?;
        let constructor = self.field(node, "constructor")?;
        if constructor.kind() == "this" {
            return Ok(ConstructorInvocation::Alternate(AlternateConstructorInvocation {
                span,
                arguments,
            }));
        }
        let qualification = match node.child_by_field_name("object") {
            Some(o) => Some(Box::new(self.expression(o)?)),
            None => None,
        };
        Ok(ConstructorInvocation::Super(SuperConstructorInvocation { span, qualification, arguments }))
    }

    fn throws(&self, node: Node<'_>) -> Lowered<Vec<Type>> {
        match child_of_kind(node, "throws") {
            Some(t) => self.types_in(t),
            None => Ok(Vec::new()),
        }
    }

    fn enum_constant(&self, node: Node<'_>) -> Lowered<EnumConstant> {
        let arguments = match node.child_by_field_name("arguments") {
            Some(a) => self.arguments(a)?,
            None => Vec::new(),
        };
        let class_body = match node.child_by_field_name("body") {
            Some(b) => Some(self.members(b)?),
            None => None,
        };
        Ok(EnumConstant {
            span: span_of(node),
            modifiers: self.modifiers(node)?,
            name: self.field_text(node, "name")?,
            arguments,
            class_body,
        })
    }

    fn formal_parameters(&self, node: Node<'_>) -> Lowered<FormalParameters> {
        let mut parameters = Vec::new();
        let mut variable_arity = false;
        for child in named_children(node) {
            match child.kind() {
                "formal_parameter" => parameters.push(self.formal_parameter(child)?),
                "spread_parameter" => {
                    variable_arity = true;
                    parameters.push(self.spread_parameter(child)?);
                }
                "receiver_parameter" => {}
                _ => return Err(self.unsupported(child)),
            }
        }
        Ok(FormalParameters { span: span_of(node), parameters, variable_arity })
    }

    fn formal_parameter(&self, node: Node<'_>) -> Lowered<FormalParameter> {
        let span = span_of(node);
        let type_ = self.type_(self.field(node, "type")?)?;
        let dims = bracket_count(node.child_by_field_name("dimensions"));
        Ok(FormalParameter {
            span,
            modifiers: self.modifiers(node)?,
            type_: wrap_array(type_, dims, span),
            name: self.field_text(node, "name")?,
            variable_arity: false,
        })
    }

    /// `String... args`; the type is kept as written, without the implied
    /// array dimension.
    fn spread_parameter(&self, node: Node<'_>) -> Lowered<FormalParameter> {
        let children = named_children(node);
        let type_node = children.iter().copied().find(|c| is_type(*c)).ok_or_else(|| self.unsupported(node))?;
        let name = match children.iter().find(|c| c.kind() == "variable_declarator") {
            Some(vd) => self.field_text(*vd, "name")?,
            None => match node.child_by_field_name("name") {
                Some(n) => self.text(n).to_string(),
                None => children
                    .iter()
                    .rev()
                    .find(|c| c.kind() == "identifier")
                    .map(|n| self.text(*n).to_string())
                    .ok_or_else(|| self.unsupported(node))?,
            },
        };
        Ok(FormalParameter {
            span: span_of(node),
            modifiers: self.modifiers(node)?,
            type_: self.type_(type_node)?,
            name,
            variable_arity: true,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    fn block(&self, node: Node<'_>) -> Lowered<Block> {
        let mut statements = Vec::new();
        for child in all_children(node) {
            if !matches!(child.kind(), "{" | "}") {
                statements.push(self.statement(child)?);
            }
        }
        Ok(Block { span: span_of(node), statements })
    }

    fn statement(&self, node: Node<'_>) -> Lowered<Statement> {
        self.nested(node, || self.lower_statement(node))
    }

    fn lower_statement(&self, node: Node<'_>) -> Lowered<Statement> {
        let span = span_of(node);
        let named = named_children(node);
        Ok(match node.kind() {
            ";" => Statement::Empty(EmptyStatement { span }),
            "block" => Statement::Block(self.block(node)?),
            "expression_statement" => {
                let expr = named.first().ok_or_else(|| self.unsupported(node))?;
                Statement::Expression(ExpressionStatement { span, expression: self.expression(*expr)? })
            }
            "labeled_statement" => {
                let label = named.first().ok_or_else(|| self.unsupported(node))?;
                let body = named.get(1).ok_or_else(|| self.unsupported(node))?;
                Statement::Labeled(LabeledStatement {
                    span,
                    label: self.text(*label).to_string(),
                    body: Box::new(self.statement(*body)?),
                })
            }
            "if_statement" => {
                let else_statement = match node.child_by_field_name("alternative") {
                    Some(e) => Some(Box::new(self.statement(e)?)),
                    None => None,
                };
                Statement::If(IfStatement {
                    span,
                    condition: self.condition(self.field(node, "condition")?)?,
                    then_statement: Box::new(self.statement(self.field(node, "consequence")?)?),
                    else_statement,
                })
            }
            "while_statement" => Statement::While(WhileStatement {
                span,
                condition: self.condition(self.field(node, "condition")?)?,
                body: Box::new(self.statement(self.field(node, "body")?)?),
            }),
            "do_statement" => Statement::Do(DoStatement {
                span,
                body: Box::new(self.statement(self.field(node, "body")?)?),
                condition: self.condition(self.field(node, "condition")?)?,
            }),
            "for_statement" => {
                let mut init = Vec::new();
                for i in field_children(node, "init") {
                    if i.kind() == "local_variable_declaration" {
                        init.push(self.statement(i)?);
                    } else {
                        init.push(Statement::Expression(ExpressionStatement {
                            span: span_of(i),
                            expression: self.expression(i)?,
                        }));
                    }
                }
                let condition = match node.child_by_field_name("condition") {
                    Some(c) => Some(self.expression(c)?),
                    None => None,
                };
                let update = field_children(node, "update")
                    .into_iter()
                    .map(|u| self.expression(u))
                    .collect::<Lowered<Vec<_>>>()?;
                Statement::For(ForStatement {
                    span,
                    init,
                    condition,
                    update,
                    body: Box::new(self.statement(self.field(node, "body")?)?),
                })
            }
            "enhanced_for_statement" => {
                let type_node = self.field(node, "type")?;
                let name_node = self.field(node, "name")?;
                let element_span = Span {
                    end: name_node.end_byte(),
                    ..child_of_kind(node, "modifiers").map_or_else(|| span_of(type_node), span_of)
                };
                let dims = bracket_count(node.child_by_field_name("dimensions"));
                Statement::ForEach(ForEachStatement {
                    span,
                    current_element: FormalParameter {
                        span: element_span,
                        modifiers: self.modifiers(node)?,
                        type_: wrap_array(self.type_(type_node)?, dims, element_span),
                        name: self.text(name_node).to_string(),
                        variable_arity: false,
                    },
                    expression: self.expression(self.field(node, "value")?)?,
                    body: Box::new(self.statement(self.field(node, "body")?)?),
                })
            }
            "try_statement" | "try_with_resources_statement" => {
                let mut resources = Vec::new();
                if let Some(spec) = node.child_by_field_name("resources") {
                    for r in named_children(spec).into_iter().filter(|c| c.kind() == "resource") {
                        resources.push(self.resource(r)?);
                    }
                }
                let mut catch_clauses = Vec::new();
                let mut finally = None;
                for child in &named {
                    match child.kind() {
                        "catch_clause" => catch_clauses.push(self.catch_clause(*child)?),
                        "finally_clause" => {
                            let block = child_of_kind(*child, "block").ok_or_else(|| self.unsupported(*child))?;
                            finally = Some(self.block(block)?);
                        }
                        _ => {}
                    }
                }
                Statement::Try(TryStatement {
                    span,
                    resources,
                    body: self.block(self.field(node, "body")?)?,
                    catch_clauses,
                    finally,
                })
            }
            "switch_expression" => Statement::Switch(SwitchStatement {
                span,
                selector: self.condition(self.field(node, "condition")?)?,
                cases: self.switch_block(self.field(node, "body")?)?,
            }),
            "synchronized_statement" => {
                let lock = child_of_kind(node, "parenthesized_expression").ok_or_else(|| self.unsupported(node))?;
                Statement::Synchronized(SynchronizedStatement {
                    span,
                    expression: self.condition(lock)?,
                    body: self.block(self.field(node, "body")?)?,
                })
            }
            "local_variable_declaration" => {
                Statement::LocalVariableDeclaration(LocalVariableDeclarationStatement {
                    span,
                    modifiers: self.modifiers(node)?,
                    type_: self.type_(self.field(node, "type")?)?,
                    variable_declarators: self.variable_declarators(node)?,
                })
            }
            "return_statement" => {
                let return_value = match named.first() {
                    Some(v) => Some(self.expression(*v)?),
                    None => None,
                };
                Statement::Return(ReturnStatement { span, return_value })
            }
            "throw_statement" => {
                let expr = named.first().ok_or_else(|| self.unsupported(node))?;
                Statement::Throw(ThrowStatement { span, expression: self.expression(*expr)? })
            }
            "break_statement" => Statement::Break(BreakStatement {
                span,
                label: named.first().map(|l| self.text(*l).to_string()),
            }),
            "continue_statement" => Statement::Continue(ContinueStatement {
                span,
                label: named.first().map(|l| self.text(*l).to_string()),
            }),
            "assert_statement" => {
                let condition = named.first().ok_or_else(|| self.unsupported(node))?;
                let message = match named.get(1) {
                    Some(m) => Some(self.expression(*m)?),
                    None => None,
                };
                Statement::Assert(AssertStatement { span, condition: self.expression(*condition)?, message })
            }
            "yield_statement" => {
                let value = named.first().ok_or_else(|| self.unsupported(node))?;
                Statement::Yield(YieldStatement { span, value: self.expression(*value)? })
            }
            kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                Statement::LocalClassDeclaration(LocalClassDeclarationStatement {
                    span,
                    declaration: self.type_declaration(node, Nesting::Local)?,
                })
            }
            _ => return Err(self.unsupported(node)),
        })
    }

    fn resource(&self, node: Node<'_>) -> Lowered<TryResource> {
        let span = span_of(node);
        if let Some(type_node) = node.child_by_field_name("type") {
            return Ok(TryResource::LocalVariableDeclarator(LocalVariableDeclaratorResource {
                span,
                modifiers: self.modifiers(node)?,
                type_: self.type_(type_node)?,
                name: self.field_text(node, "name")?,
                initializer: self.expression(self.field(node, "value")?)?,
            }));
        }
        let access = named_children(node).into_iter().next().ok_or_else(|| self.unsupported(node))?;
        Ok(TryResource::VariableAccess(VariableAccessResource {
            span,
            variable_access: self.expression(access)?,
        }))
    }

    fn catch_clause(&self, node: Node<'_>) -> Lowered<CatchClause> {
        let param = child_of_kind(node, "catch_formal_parameter").ok_or_else(|| self.unsupported(node))?;
        let types = match child_of_kind(param, "catch_type") {
            Some(ct) => self.types_in(ct)?,
            None => Vec::new(),
        };
        Ok(CatchClause {
            span: span_of(node),
            modifiers: self.modifiers(param)?,
            types,
            name: self.field_text(param, "name")?,
            body: self.block(self.field(node, "body")?)?,
        })
    }

    fn switch_block(&self, node: Node<'_>) -> Lowered<Vec<SwitchCase>> {
        let mut cases = Vec::new();
        for group in named_children(node) {
            let mut case = SwitchCase {
                span: span_of(group),
                labels: Vec::new(),
                is_default: false,
                arrow: group.kind() == "switch_rule",
                statements: Vec::new(),
            };
            match group.kind() {
                "switch_block_statement_group" | "switch_rule" => {
                    for child in all_children(group) {
                        match child.kind() {
                            "switch_label" => self.switch_label(child, &mut case)?,
                            ":" | "," | "->" => {}
                            _ => case.statements.push(self.statement(child)?),
                        }
                    }
                }
                _ => return Err(self.unsupported(group)),
            }
            cases.push(case);
        }
        Ok(cases)
    }

    fn switch_label(&self, node: Node<'_>, case: &mut SwitchCase) -> Lowered<()> {
        if has_token(node, "default") {
            case.is_default = true;
        }
        for child in named_children(node) {
            if matches!(child.kind(), "pattern" | "type_pattern" | "record_pattern" | "guard") {
                return Err(self.unsupported(child));
            }
            case.labels.push(self.expression(child)?);
        }
        Ok(())
    }

    /// Conditions are syntactically parenthesized; the parentheses are not
    /// a node of their own.
    fn condition(&self, node: Node<'_>) -> Lowered<Rvalue> {
        if node.kind() == "parenthesized_expression" {
            if let Some(inner) = named_children(node).into_iter().next() {
                return self.expression(inner);
            }
        }
        self.expression(node)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    fn arguments(&self, node: Node<'_>) -> Lowered<Vec<Rvalue>> {
        named_children(node).into_iter().map(|a| self.expression(a)).collect()
    }

    fn boxed(&self, node: Node<'_>, field: &str) -> Lowered<Box<Rvalue>> {
        Ok(Box::new(self.expression(self.field(node, field)?)?))
    }

    fn expression(&self, node: Node<'_>) -> Lowered<Rvalue> {
        self.nested(node, || self.lower_expression(node))
    }

    fn lower_expression(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let span = span_of(node);
        let value = || self.text(node).to_string();
        Ok(match node.kind() {
            "identifier" => Rvalue::AmbiguousName(AmbiguousName { span, identifiers: vec![value()] }),
            "field_access" => self.field_access(node)?,
            "array_access" => Rvalue::ArrayAccess(ArrayAccessExpression {
                span,
                lhs: self.boxed(node, "array")?,
                index: self.boxed(node, "index")?,
            }),
            "parenthesized_expression" => {
                let inner = named_children(node).into_iter().next().ok_or_else(|| self.unsupported(node))?;
                Rvalue::Parenthesized(ParenthesizedExpression {
                    span,
                    value: Box::new(self.expression(inner)?),
                })
            }
            "assignment_expression" => Rvalue::Assignment(Assignment {
                span,
                lhs: self.boxed(node, "left")?,
                operator: self.field_text(node, "operator")?,
                rhs: self.boxed(node, "right")?,
            }),
            "binary_expression" => Rvalue::Binary(BinaryOperation {
                span,
                lhs: self.boxed(node, "left")?,
                operator: self.field_text(node, "operator")?,
                rhs: self.boxed(node, "right")?,
            }),
            "unary_expression" => Rvalue::Unary(UnaryOperation {
                span,
                operator: self.field_text(node, "operator")?,
                operand: self.boxed(node, "operand")?,
            }),
            "update_expression" => {
                let children = all_children(node);
                let operand = children.iter().find(|c| c.is_named()).ok_or_else(|| self.unsupported(node))?;
                let op = children.iter().find(|c| !c.is_named()).ok_or_else(|| self.unsupported(node))?;
                Rvalue::Crement(Crement {
                    span,
                    operator: op.kind().to_string(),
                    is_prefix: op.start_byte() < operand.start_byte(),
                    operand: Box::new(self.expression(*operand)?),
                })
            }
            "cast_expression" => Rvalue::Cast(Cast {
                span,
                target_type: self.type_(self.field(node, "type")?)?,
                value: self.boxed(node, "value")?,
            }),
            "class_literal" => {
                let t = named_children(node).into_iter().next().ok_or_else(|| self.unsupported(node))?;
                Rvalue::ClassLiteral(ClassLiteral { span, type_: self.type_(t)? })
            }
            "ternary_expression" => Rvalue::Conditional(ConditionalExpression {
                span,
                condition: self.boxed(node, "condition")?,
                then_value: self.boxed(node, "consequence")?,
                else_value: self.boxed(node, "alternative")?,
            }),
            "instanceof_expression" => {
                let rhs = match node.child_by_field_name("right") {
                    Some(r) => self.type_(r)?,
                    None => {
                        let pattern = node.child_by_field_name("pattern").unwrap_or(node);
                        return Err(self.unsupported(pattern));
                    }
                };
                Rvalue::Instanceof(Instanceof {
                    span,
                    lhs: self.boxed(node, "left")?,
                    rhs,
                    binding: node.child_by_field_name("name").map(|n| self.text(n).to_string()),
                })
            }
            "method_invocation" => self.method_invocation(node)?,
            "object_creation_expression" => self.object_creation(node)?,
            "array_creation_expression" => self.array_creation(node)?,
            "array_initializer" => Rvalue::ArrayInitializer(self.array_initializer(node)?),
            "this" => Rvalue::This(ThisReference { span }),
            "lambda_expression" => self.lambda(node)?,
            "method_reference" => self.method_reference(node)?,
            "switch_expression" => Rvalue::Switch(SwitchExpression {
                span,
                selector: Box::new(self.condition(self.field(node, "condition")?)?),
                cases: self.switch_block(self.field(node, "body")?)?,
            }),
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal"
            | "binary_integer_literal" => Rvalue::IntegerLiteral(IntegerLiteral { span, value: value() }),
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                Rvalue::FloatingPointLiteral(FloatingPointLiteral { span, value: value() })
            }
            "true" | "false" => Rvalue::BooleanLiteral(BooleanLiteral { span, value: value() }),
            "character_literal" => Rvalue::CharacterLiteral(CharacterLiteral { span, value: value() }),
            "string_literal" | "text_block" => Rvalue::StringLiteral(StringLiteral { span, value: value() }),
            "null_literal" => Rvalue::NullLiteral(NullLiteral { span, value: value() }),
            _ => return Err(self.unsupported(node)),
        })
    }

    fn field_access(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let span = span_of(node);
        let object = self.field(node, "object")?;
        let field = self.field(node, "field")?;

        if field.kind() == "this" {
            return Ok(Rvalue::QualifiedThis(QualifiedThisReference {
                span,
                qualification: self.name_type(object),
            }));
        }
        let field_name = self.text(field).to_string();
        if object.kind() == "super" {
            return Ok(Rvalue::SuperclassFieldAccess(SuperclassFieldAccessExpression {
                span,
                qualification: None,
                field_name,
            }));
        }
        // `Outer.super.field`
        if named_children(node).iter().any(|c| c.kind() == "super" && c.id() != object.id()) {
            return Ok(Rvalue::SuperclassFieldAccess(SuperclassFieldAccessExpression {
                span,
                qualification: Some(self.name_type(object)),
                field_name,
            }));
        }

        Ok(match self.expression(object)? {
            Rvalue::AmbiguousName(mut name) => {
                name.span = span;
                name.identifiers.push(field_name);
                Rvalue::AmbiguousName(name)
            }
            lhs => Rvalue::FieldAccess(FieldAccessExpression { span, lhs: Box::new(lhs), field_name }),
        })
    }

    /// A name in type position, as in `Outer.this`.
    fn name_type(&self, node: Node<'_>) -> Type {
        Type::Reference(ReferenceType {
            span: span_of(node),
            name: self.dotted(node),
            type_arguments: Vec::new(),
        })
    }

    fn method_invocation(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let span = span_of(node);
        let method_name = self.field_text(node, "name")?;
        let arguments = self.arguments(self.field(node, "arguments")?)?;
        let object = node.child_by_field_name("object");

        let is_super = match object {
            Some(o) if o.kind() == "super" => true,
            Some(o) => named_children(node).iter().any(|c| c.kind() == "super" && c.id() != o.id()),
            None => false,
        };
        if is_super {
            return Ok(Rvalue::SuperclassMethodInvocation(SuperclassMethodInvocation {
                span,
                method_name,
                arguments,
            }));
        }

        let target = match object {
            Some(o) => Some(Box::new(self.expression(o)?)),
            None => None,
        };
        let type_arguments = match node.child_by_field_name("type_arguments") {
            Some(ta) => self.types_in(ta)?,
            None => Vec::new(),
        };
        Ok(Rvalue::MethodInvocation(MethodInvocation { span, target, type_arguments, method_name, arguments }))
    }

    fn object_creation(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let span = span_of(node);
        let children = all_children(node);
        let new_pos = children.iter().position(|c| c.kind() == "new").unwrap_or(0);
        let qualification = match children[..new_pos].iter().find(|c| c.is_named()) {
            Some(q) => Some(Box::new(self.expression(*q)?)),
            None => None,
        };
        let type_node = self.field(node, "type")?;
        let type_ = self.type_(type_node)?;
        let arguments = self.arguments(self.field(node, "arguments")?)?;

        match child_of_kind(node, "class_body") {
            Some(body) => Ok(Rvalue::NewAnonymousClassInstance(NewAnonymousClassInstance {
                span,
                qualification,
                anonymous_class_declaration: AnonymousClassDeclaration {
                    span: span_of(type_node).to(span_of(body)),
                    base_type: type_,
                    members: self.members(body)?,
                },
                arguments,
            })),
            None => Ok(Rvalue::NewClassInstance(NewClassInstance { span, qualification, type_, arguments })),
        }
    }

    fn array_creation(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let span = span_of(node);
        let element = self.type_(self.field(node, "type")?)?;
        let dims = bracket_count(child_of_kind(node, "dimensions"));

        if let Some(value) = node.child_by_field_name("value") {
            return Ok(Rvalue::NewInitializedArray(NewInitializedArray {
                span,
                array_type: wrap_array(element, dims, span),
                array_initializer: self.array_initializer(value)?,
            }));
        }

        let mut dimension_expressions = Vec::new();
        for de in named_children(node).into_iter().filter(|c| c.kind() == "dimensions_expr") {
            let expr = named_children(de)
                .into_iter()
                .find(|c| !is_annotation(*c))
                .ok_or_else(|| self.unsupported(de))?;
            dimension_expressions.push(self.expression(expr)?);
        }
        Ok(Rvalue::NewArray(NewArray { span, type_: element, dimension_expressions, dimensions: dims }))
    }

    fn array_initializer(&self, node: Node<'_>) -> Lowered<ArrayInitializer> {
        Ok(ArrayInitializer {
            span: span_of(node),
            values: named_children(node).into_iter().map(|v| self.expression(v)).collect::<Lowered<_>>()?,
        })
    }

    fn lambda(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let params = self.field(node, "parameters")?;
        let (parameter_names, formal_parameters) = match params.kind() {
            "identifier" => (vec![self.text(params).to_string()], None),
            "inferred_parameters" => (
                named_children(params).into_iter().map(|p| self.text(p).to_string()).collect(),
                None,
            ),
            "formal_parameters" => {
                let fp = self.formal_parameters(params)?;
                (fp.parameters.iter().map(|p| p.name.clone()).collect(), Some(fp))
            }
            _ => return Err(self.unsupported(params)),
        };
        let body = self.field(node, "body")?;
        let body = if body.kind() == "block" {
            LambdaBody::Block(self.block(body)?)
        } else {
            LambdaBody::Expression(Box::new(self.expression(body)?))
        };
        Ok(Rvalue::Lambda(LambdaExpression { span: span_of(node), parameter_names, formal_parameters, body }))
    }

    fn method_reference(&self, node: Node<'_>) -> Lowered<Rvalue> {
        let named = named_children(node);
        let first = *named.first().ok_or_else(|| self.unsupported(node))?;
        let target = match first.kind() {
            "super" => None,
            _ if is_type(first) => Some(MethodReferenceTarget::Type(self.type_(first)?)),
            _ => Some(MethodReferenceTarget::Expression(Box::new(self.expression(first)?))),
        };
        let method_name = if has_token(node, "new") {
            "new".to_string()
        } else {
            named[1..]
                .iter()
                .rev()
                .find(|c| c.kind() == "identifier")
                .map(|n| self.text(*n).to_string())
                .ok_or_else(|| self.unsupported(node))?
        };
        Ok(Rvalue::MethodReference(MethodReference { span: span_of(node), target, method_name }))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Types and annotations
    // ═══════════════════════════════════════════════════════════════════

    /// All types (and wildcards) directly under `node`: type lists, bounds,
    /// `throws`, type arguments.
    fn types_in(&self, node: Node<'_>) -> Lowered<Vec<Type>> {
        named_children(node)
            .into_iter()
            .filter(|c| is_type(*c) || c.kind() == "wildcard")
            .map(|t| self.type_(t))
            .collect()
    }

    fn type_list(&self, node: Node<'_>) -> Lowered<Vec<Type>> {
        match child_of_kind(node, "type_list") {
            Some(list) => self.types_in(list),
            None => self.types_in(node),
        }
    }

    fn type_(&self, node: Node<'_>) -> Lowered<Type> {
        self.nested(node, || self.lower_type(node))
    }

    fn lower_type(&self, node: Node<'_>) -> Lowered<Type> {
        let span = span_of(node);
        Ok(match node.kind() {
            "void_type" | "integral_type" | "floating_point_type" | "boolean_type" => {
                Type::Primitive(PrimitiveType { span, name: self.text(node).to_string() })
            }
            "type_identifier" | "identifier" | "scoped_identifier" => Type::Reference(ReferenceType {
                span,
                name: self.dotted(node),
                type_arguments: Vec::new(),
            }),
            "scoped_type_identifier" | "generic_type" => Type::Reference(ReferenceType {
                span,
                name: self.type_name(node),
                type_arguments: match child_of_kind(node, "type_arguments") {
                    Some(ta) => self.types_in(ta)?,
                    None => Vec::new(),
                },
            }),
            "array_type" => {
                let element = self.type_(self.field(node, "element")?)?;
                wrap_array(element, bracket_count(node.child_by_field_name("dimensions")), span)
            }
            "annotated_type" => {
                let inner = named_children(node)
                    .into_iter()
                    .find(|c| is_type(*c))
                    .ok_or_else(|| self.unsupported(node))?;
                self.type_(inner)?
            }
            "wildcard" => {
                let bound_kind = if has_token(node, "extends") {
                    Some("extends".to_string())
                } else if child_of_kind(node, "super").is_some() || has_token(node, "super") {
                    Some("super".to_string())
                } else {
                    None
                };
                let bound = match named_children(node).into_iter().rev().find(|c| is_type(*c)) {
                    Some(b) => Some(Box::new(self.type_(b)?)),
                    None => None,
                };
                Type::Wildcard(WildcardType { span, bound_kind, bound })
            }
            _ => return Err(self.unsupported(node)),
        })
    }

    /// Dotted name of a possibly scoped, possibly generic type, without
    /// annotations or type arguments.
    fn type_name(&self, node: Node<'_>) -> String {
        match node.kind() {
            "scoped_type_identifier" => named_children(node)
                .into_iter()
                .filter(|c| !is_annotation(*c))
                .map(|c| self.type_name(c))
                .collect::<Vec<_>>()
                .join("."),
            "generic_type" => named_children(node)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "scoped_type_identifier"))
                .map(|c| self.type_name(c))
                .unwrap_or_default(),
            _ => self.dotted(node),
        }
    }

    fn annotations(&self, node: Node<'_>) -> Lowered<Vec<Annotation>> {
        named_children(node)
            .into_iter()
            .filter(|c| is_annotation(*c))
            .map(|a| self.annotation(a))
            .collect()
    }

    fn annotation(&self, node: Node<'_>) -> Lowered<Annotation> {
        let span = span_of(node);
        let type_name = self.dotted(self.field(node, "name")?);
        if node.kind() == "marker_annotation" {
            return Ok(Annotation::Marker(MarkerAnnotation { span, type_name }));
        }

        let args = match node.child_by_field_name("arguments") {
            Some(a) => named_children(a),
            None => Vec::new(),
        };
        if args.iter().any(|a| a.kind() == "element_value_pair") || args.is_empty() {
            let mut element_value_pairs = Vec::new();
            for pair in args {
                element_value_pairs.push(ElementValuePair {
                    span: span_of(pair),
                    key: self.field_text(pair, "key")?,
                    value: self.element_value(self.field(pair, "value")?)?,
                });
            }
            return Ok(Annotation::Normal(NormalAnnotation { span, type_name, element_value_pairs }));
        }
        Ok(Annotation::SingleElement(SingleElementAnnotation {
            span,
            type_name,
            element_value: Box::new(self.element_value(args[0])?),
        }))
    }

    fn element_value(&self, node: Node<'_>) -> Lowered<ElementValue> {
        Ok(match node.kind() {
            "element_value_array_initializer" => {
                ElementValue::ArrayInitializer(ElementValueArrayInitializer {
                    span: span_of(node),
                    element_values: named_children(node)
                        .into_iter()
                        .map(|v| self.element_value(v))
                        .collect::<Lowered<_>>()?,
                })
            }
            "marker_annotation" | "annotation" => ElementValue::Annotation(self.annotation(node)?),
            _ => ElementValue::Rvalue(self.expression(node)?),
        })
    }
}
