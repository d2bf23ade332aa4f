//! Traversal engine.
//!
//! One `traverse_*` method per node family. Each fires the node (every
//! action bound to its concrete kind, then to each generalization in chain
//! order) and then descends into the children in source order. Firing
//! never replaces or skips the descent. The first action error aborts the
//! traversal.

use std::io::Write;

use crate::domain::ast::*;
use crate::domain::errors::ActionError;
use crate::domain::node_kind::NodeRef;
use crate::domain::registry::ActionRegistry;
use crate::domain::repository::ClassRepository;

/// What an action sees besides the node itself.
pub struct ActionContext<'a> {
    /// The unit being traversed; source text and locations come from here.
    pub unit: &'a CompilationUnit,
    pub classes: &'a ClassRepository<'a>,
    pub out: &'a mut dyn Write,
}

impl<'a> ActionContext<'a> {
    pub fn location(&self, span: &Span) -> String {
        self.unit.location(span)
    }

    pub fn text(&self, span: &Span) -> &'a str {
        self.unit.text(span)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub actions_invoked: usize,
}

pub struct Traverser<'a> {
    registry: &'a ActionRegistry,
    cx: ActionContext<'a>,
    stats: TraversalStats,
}

impl<'a> Traverser<'a> {
    pub fn new(
        registry: &'a ActionRegistry,
        unit: &'a CompilationUnit,
        classes: &'a ClassRepository<'a>,
        out: &'a mut dyn Write,
    ) -> Self {
        Traverser {
            registry,
            cx: ActionContext { unit, classes, out },
            stats: TraversalStats::default(),
        }
    }

    /// Traverses the whole unit.
    pub fn run(mut self) -> Result<TraversalStats, ActionError> {
        let unit = self.cx.unit;
        self.traverse_compilation_unit(unit)?;
        Ok(self.stats)
    }

    fn fire(&mut self, node: NodeRef<'a>) -> Result<(), ActionError> {
        self.stats.nodes_visited += 1;
        let registry = self.registry;
        for kind in node.kind().chain() {
            for action in registry.actions(kind) {
                self.stats.actions_invoked += 1;
                action.invoke(node, &mut self.cx)?;
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════

    pub fn traverse_compilation_unit(&mut self, cu: &'a CompilationUnit) -> Result<(), ActionError> {
        self.fire(NodeRef::CompilationUnit(cu))?;
        if let Some(package) = &cu.package {
            self.fire(NodeRef::PackageDeclaration(package))?;
            self.traverse_annotations(&package.annotations)?;
        }
        for import in &cu.imports {
            self.traverse_import_declaration(import)?;
        }
        for decl in &cu.types {
            self.traverse_type_declaration(decl)?;
        }
        Ok(())
    }

    fn traverse_import_declaration(&mut self, import: &'a ImportDeclaration) -> Result<(), ActionError> {
        match import {
            ImportDeclaration::SingleType(i) => self.fire(NodeRef::SingleTypeImportDeclaration(i)),
            ImportDeclaration::TypeOnDemand(i) => self.fire(NodeRef::TypeImportOnDemandDeclaration(i)),
            ImportDeclaration::SingleStatic(i) => self.fire(NodeRef::SingleStaticImportDeclaration(i)),
            ImportDeclaration::StaticOnDemand(i) => {
                self.fire(NodeRef::StaticImportOnDemandDeclaration(i))
            }
        }
    }

    pub fn traverse_type_declaration(&mut self, decl: &'a TypeDeclaration) -> Result<(), ActionError> {
        self.fire(NodeRef::type_declaration(decl))?;
        match decl {
            TypeDeclaration::Class(d) => {
                self.traverse_modifiers(&d.modifiers)?;
                self.traverse_type_parameters(&d.type_parameters)?;
                if let Some(extends) = &d.extends {
                    self.traverse_type(extends)?;
                }
                self.traverse_types(&d.implements)?;
                self.traverse_members(&d.members)
            }
            TypeDeclaration::Interface(d) => {
                self.traverse_modifiers(&d.modifiers)?;
                self.traverse_type_parameters(&d.type_parameters)?;
                self.traverse_types(&d.extends)?;
                self.traverse_members(&d.members)
            }
            TypeDeclaration::Enum(d) => {
                self.traverse_modifiers(&d.modifiers)?;
                self.traverse_type_parameters(&d.type_parameters)?;
                if let Some(extends) = &d.extends {
                    self.traverse_type(extends)?;
                }
                self.traverse_types(&d.implements)?;
                for constant in &d.constants {
                    self.traverse_enum_constant(constant)?;
                }
                self.traverse_members(&d.members)
            }
            TypeDeclaration::AnnotationType(d) => {
                self.traverse_modifiers(&d.modifiers)?;
                self.traverse_members(&d.members)
            }
            TypeDeclaration::Record(d) => {
                self.traverse_modifiers(&d.modifiers)?;
                self.traverse_type_parameters(&d.type_parameters)?;
                if let Some(extends) = &d.extends {
                    self.traverse_type(extends)?;
                }
                self.traverse_formal_parameters(&d.components)?;
                self.traverse_types(&d.implements)?;
                self.traverse_members(&d.members)
            }
        }
    }

    fn traverse_anonymous_class_declaration(
        &mut self,
        decl: &'a AnonymousClassDeclaration,
    ) -> Result<(), ActionError> {
        self.fire(NodeRef::AnonymousClassDeclaration(decl))?;
        self.traverse_type(&decl.base_type)?;
        self.traverse_members(&decl.members)
    }

    fn traverse_type_parameters(&mut self, params: &'a [TypeParameter]) -> Result<(), ActionError> {
        for param in params {
            self.fire(NodeRef::TypeParameter(param))?;
            self.traverse_types(&param.bounds)?;
        }
        Ok(())
    }

    fn traverse_members(&mut self, members: &'a [MemberDeclaration]) -> Result<(), ActionError> {
        for member in members {
            match member {
                MemberDeclaration::Field(f) => self.traverse_field_declaration(f)?,
                MemberDeclaration::Method(m) => self.traverse_method_declarator(m)?,
                MemberDeclaration::Constructor(c) => self.traverse_constructor_declarator(c)?,
                MemberDeclaration::Initializer(i) => {
                    self.fire(NodeRef::Initializer(i))?;
                    self.traverse_block(&i.block)?;
                }
                MemberDeclaration::Type(t) => self.traverse_type_declaration(t)?,
            }
        }
        Ok(())
    }

    fn traverse_field_declaration(&mut self, field: &'a FieldDeclaration) -> Result<(), ActionError> {
        self.fire(NodeRef::FieldDeclaration(field))?;
        self.traverse_modifiers(&field.modifiers)?;
        self.traverse_type(&field.type_)?;
        self.traverse_variable_declarators(&field.variable_declarators)
    }

    fn traverse_variable_declarators(
        &mut self,
        declarators: &'a [VariableDeclarator],
    ) -> Result<(), ActionError> {
        for vd in declarators {
            self.fire(NodeRef::VariableDeclarator(vd))?;
            if let Some(init) = &vd.initializer {
                self.traverse_rvalue(init)?;
            }
        }
        Ok(())
    }

    fn traverse_method_declarator(&mut self, method: &'a MethodDeclarator) -> Result<(), ActionError> {
        self.fire(NodeRef::MethodDeclarator(method))?;
        self.traverse_modifiers(&method.modifiers)?;
        self.traverse_type_parameters(&method.type_parameters)?;
        self.traverse_type(&method.return_type)?;
        self.traverse_formal_parameters(&method.formal_parameters)?;
        self.traverse_types(&method.thrown_exceptions)?;
        if let Some(default) = &method.default_value {
            self.traverse_element_value(default)?;
        }
        if let Some(body) = &method.body {
            self.traverse_block(body)?;
        }
        Ok(())
    }

    fn traverse_constructor_declarator(
        &mut self,
        ctor: &'a ConstructorDeclarator,
    ) -> Result<(), ActionError> {
        self.fire(NodeRef::ConstructorDeclarator(ctor))?;
        self.traverse_modifiers(&ctor.modifiers)?;
        self.traverse_type_parameters(&ctor.type_parameters)?;
        self.traverse_formal_parameters(&ctor.formal_parameters)?;
        self.traverse_types(&ctor.thrown_exceptions)?;
        match &ctor.constructor_invocation {
            Some(ConstructorInvocation::Alternate(ci)) => {
                self.fire(NodeRef::AlternateConstructorInvocation(ci))?;
                self.traverse_rvalues(&ci.arguments)?;
            }
            Some(ConstructorInvocation::Super(ci)) => {
                self.fire(NodeRef::SuperConstructorInvocation(ci))?;
                if let Some(q) = &ci.qualification {
                    self.traverse_rvalue(q)?;
                }
                self.traverse_rvalues(&ci.arguments)?;
            }
            None => {}
        }
        self.traverse_statements(&ctor.statements)
    }

    fn traverse_enum_constant(&mut self, constant: &'a EnumConstant) -> Result<(), ActionError> {
        self.fire(NodeRef::EnumConstant(constant))?;
        self.traverse_modifiers(&constant.modifiers)?;
        self.traverse_rvalues(&constant.arguments)?;
        if let Some(body) = &constant.class_body {
            self.traverse_members(body)?;
        }
        Ok(())
    }

    fn traverse_formal_parameters(&mut self, params: &'a FormalParameters) -> Result<(), ActionError> {
        self.fire(NodeRef::FormalParameters(params))?;
        for param in &params.parameters {
            self.traverse_formal_parameter(param)?;
        }
        Ok(())
    }

    fn traverse_formal_parameter(&mut self, param: &'a FormalParameter) -> Result<(), ActionError> {
        self.fire(NodeRef::FormalParameter(param))?;
        self.traverse_modifiers(&param.modifiers)?;
        self.traverse_type(&param.type_)
    }

    fn traverse_modifiers(&mut self, modifiers: &'a Modifiers) -> Result<(), ActionError> {
        self.traverse_annotations(&modifiers.annotations)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    fn traverse_block(&mut self, block: &'a Block) -> Result<(), ActionError> {
        self.fire(NodeRef::Block(block))?;
        self.traverse_statements(&block.statements)
    }

    fn traverse_statements(&mut self, statements: &'a [Statement]) -> Result<(), ActionError> {
        for statement in statements {
            self.traverse_statement(statement)?;
        }
        Ok(())
    }

    pub fn traverse_statement(&mut self, statement: &'a Statement) -> Result<(), ActionError> {
        match statement {
            Statement::Labeled(s) => {
                self.fire(NodeRef::LabeledStatement(s))?;
                self.traverse_statement(&s.body)
            }
            Statement::Block(b) => self.traverse_block(b),
            Statement::Expression(s) => {
                self.fire(NodeRef::ExpressionStatement(s))?;
                self.traverse_rvalue(&s.expression)
            }
            Statement::If(s) => {
                self.fire(NodeRef::IfStatement(s))?;
                self.traverse_rvalue(&s.condition)?;
                self.traverse_statement(&s.then_statement)?;
                if let Some(e) = &s.else_statement {
                    self.traverse_statement(e)?;
                }
                Ok(())
            }
            Statement::For(s) => {
                self.fire(NodeRef::ForStatement(s))?;
                self.traverse_statements(&s.init)?;
                if let Some(c) = &s.condition {
                    self.traverse_rvalue(c)?;
                }
                self.traverse_rvalues(&s.update)?;
                self.traverse_statement(&s.body)
            }
            Statement::ForEach(s) => {
                self.fire(NodeRef::ForEachStatement(s))?;
                self.traverse_formal_parameter(&s.current_element)?;
                self.traverse_rvalue(&s.expression)?;
                self.traverse_statement(&s.body)
            }
            Statement::While(s) => {
                self.fire(NodeRef::WhileStatement(s))?;
                self.traverse_rvalue(&s.condition)?;
                self.traverse_statement(&s.body)
            }
            Statement::Do(s) => {
                self.fire(NodeRef::DoStatement(s))?;
                self.traverse_statement(&s.body)?;
                self.traverse_rvalue(&s.condition)
            }
            Statement::Try(s) => {
                self.fire(NodeRef::TryStatement(s))?;
                for resource in &s.resources {
                    self.traverse_resource(resource)?;
                }
                self.traverse_block(&s.body)?;
                for clause in &s.catch_clauses {
                    self.fire(NodeRef::CatchClause(clause))?;
                    self.traverse_modifiers(&clause.modifiers)?;
                    self.traverse_types(&clause.types)?;
                    self.traverse_block(&clause.body)?;
                }
                if let Some(f) = &s.finally {
                    self.traverse_block(f)?;
                }
                Ok(())
            }
            Statement::Switch(s) => {
                self.fire(NodeRef::SwitchStatement(s))?;
                self.traverse_rvalue(&s.selector)?;
                self.traverse_switch_cases(&s.cases)
            }
            Statement::Synchronized(s) => {
                self.fire(NodeRef::SynchronizedStatement(s))?;
                self.traverse_rvalue(&s.expression)?;
                self.traverse_block(&s.body)
            }
            Statement::LocalVariableDeclaration(s) => {
                self.fire(NodeRef::LocalVariableDeclarationStatement(s))?;
                self.traverse_modifiers(&s.modifiers)?;
                self.traverse_type(&s.type_)?;
                self.traverse_variable_declarators(&s.variable_declarators)
            }
            Statement::Return(s) => {
                self.fire(NodeRef::ReturnStatement(s))?;
                if let Some(v) = &s.return_value {
                    self.traverse_rvalue(v)?;
                }
                Ok(())
            }
            Statement::Throw(s) => {
                self.fire(NodeRef::ThrowStatement(s))?;
                self.traverse_rvalue(&s.expression)
            }
            Statement::Break(s) => self.fire(NodeRef::BreakStatement(s)),
            Statement::Continue(s) => self.fire(NodeRef::ContinueStatement(s)),
            Statement::Assert(s) => {
                self.fire(NodeRef::AssertStatement(s))?;
                self.traverse_rvalue(&s.condition)?;
                if let Some(m) = &s.message {
                    self.traverse_rvalue(m)?;
                }
                Ok(())
            }
            Statement::Empty(s) => self.fire(NodeRef::EmptyStatement(s)),
            Statement::LocalClassDeclaration(s) => {
                self.fire(NodeRef::LocalClassDeclarationStatement(s))?;
                self.traverse_type_declaration(&s.declaration)
            }
            Statement::Yield(s) => {
                self.fire(NodeRef::YieldStatement(s))?;
                self.traverse_rvalue(&s.value)
            }
        }
    }

    fn traverse_resource(&mut self, resource: &'a TryResource) -> Result<(), ActionError> {
        match resource {
            TryResource::LocalVariableDeclarator(r) => {
                self.fire(NodeRef::LocalVariableDeclaratorResource(r))?;
                self.traverse_modifiers(&r.modifiers)?;
                self.traverse_type(&r.type_)?;
                self.traverse_rvalue(&r.initializer)
            }
            TryResource::VariableAccess(r) => {
                self.fire(NodeRef::VariableAccessResource(r))?;
                self.traverse_rvalue(&r.variable_access)
            }
        }
    }

    fn traverse_switch_cases(&mut self, cases: &'a [SwitchCase]) -> Result<(), ActionError> {
        for case in cases {
            self.fire(NodeRef::SwitchCase(case))?;
            self.traverse_rvalues(&case.labels)?;
            self.traverse_statements(&case.statements)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    fn traverse_rvalues(&mut self, values: &'a [Rvalue]) -> Result<(), ActionError> {
        for value in values {
            self.traverse_rvalue(value)?;
        }
        Ok(())
    }

    pub fn traverse_rvalue(&mut self, rv: &'a Rvalue) -> Result<(), ActionError> {
        match rv {
            Rvalue::AmbiguousName(e) => self.fire(NodeRef::AmbiguousName(e)),
            Rvalue::FieldAccess(e) => {
                self.fire(NodeRef::FieldAccessExpression(e))?;
                self.traverse_rvalue(&e.lhs)
            }
            Rvalue::SuperclassFieldAccess(e) => {
                self.fire(NodeRef::SuperclassFieldAccessExpression(e))?;
                if let Some(q) = &e.qualification {
                    self.traverse_type(q)?;
                }
                Ok(())
            }
            Rvalue::ArrayAccess(e) => {
                self.fire(NodeRef::ArrayAccessExpression(e))?;
                self.traverse_rvalue(&e.lhs)?;
                self.traverse_rvalue(&e.index)
            }
            Rvalue::Parenthesized(e) => {
                self.fire(NodeRef::ParenthesizedExpression(e))?;
                self.traverse_rvalue(&e.value)
            }
            Rvalue::Assignment(e) => {
                self.fire(NodeRef::Assignment(e))?;
                self.traverse_rvalue(&e.lhs)?;
                self.traverse_rvalue(&e.rhs)
            }
            Rvalue::Unary(e) => {
                self.fire(NodeRef::UnaryOperation(e))?;
                self.traverse_rvalue(&e.operand)
            }
            Rvalue::Binary(e) => {
                self.fire(NodeRef::BinaryOperation(e))?;
                self.traverse_rvalue(&e.lhs)?;
                self.traverse_rvalue(&e.rhs)
            }
            Rvalue::Cast(e) => {
                self.fire(NodeRef::Cast(e))?;
                self.traverse_type(&e.target_type)?;
                self.traverse_rvalue(&e.value)
            }
            Rvalue::ClassLiteral(e) => {
                self.fire(NodeRef::ClassLiteral(e))?;
                self.traverse_type(&e.type_)
            }
            Rvalue::Conditional(e) => {
                self.fire(NodeRef::ConditionalExpression(e))?;
                self.traverse_rvalue(&e.condition)?;
                self.traverse_rvalue(&e.then_value)?;
                self.traverse_rvalue(&e.else_value)
            }
            Rvalue::Crement(e) => {
                self.fire(NodeRef::Crement(e))?;
                self.traverse_rvalue(&e.operand)
            }
            Rvalue::Instanceof(e) => {
                self.fire(NodeRef::Instanceof(e))?;
                self.traverse_rvalue(&e.lhs)?;
                self.traverse_type(&e.rhs)
            }
            Rvalue::MethodInvocation(e) => {
                self.fire(NodeRef::MethodInvocation(e))?;
                if let Some(target) = &e.target {
                    self.traverse_rvalue(target)?;
                }
                self.traverse_types(&e.type_arguments)?;
                self.traverse_rvalues(&e.arguments)
            }
            Rvalue::SuperclassMethodInvocation(e) => {
                self.fire(NodeRef::SuperclassMethodInvocation(e))?;
                self.traverse_rvalues(&e.arguments)
            }
            Rvalue::NewClassInstance(e) => {
                self.fire(NodeRef::NewClassInstance(e))?;
                if let Some(q) = &e.qualification {
                    self.traverse_rvalue(q)?;
                }
                self.traverse_type(&e.type_)?;
                self.traverse_rvalues(&e.arguments)
            }
            Rvalue::NewAnonymousClassInstance(e) => {
                self.fire(NodeRef::NewAnonymousClassInstance(e))?;
                if let Some(q) = &e.qualification {
                    self.traverse_rvalue(q)?;
                }
                self.traverse_rvalues(&e.arguments)?;
                self.traverse_anonymous_class_declaration(&e.anonymous_class_declaration)
            }
            Rvalue::NewArray(e) => {
                self.fire(NodeRef::NewArray(e))?;
                self.traverse_type(&e.type_)?;
                self.traverse_rvalues(&e.dimension_expressions)
            }
            Rvalue::NewInitializedArray(e) => {
                self.fire(NodeRef::NewInitializedArray(e))?;
                self.traverse_type(&e.array_type)?;
                self.traverse_array_initializer(&e.array_initializer)
            }
            Rvalue::ArrayInitializer(e) => self.traverse_array_initializer(e),
            Rvalue::This(e) => self.fire(NodeRef::ThisReference(e)),
            Rvalue::QualifiedThis(e) => {
                self.fire(NodeRef::QualifiedThisReference(e))?;
                self.traverse_type(&e.qualification)
            }
            Rvalue::Lambda(e) => {
                self.fire(NodeRef::LambdaExpression(e))?;
                if let Some(params) = &e.formal_parameters {
                    self.traverse_formal_parameters(params)?;
                }
                match &e.body {
                    LambdaBody::Expression(body) => self.traverse_rvalue(body),
                    LambdaBody::Block(body) => self.traverse_block(body),
                }
            }
            Rvalue::MethodReference(e) => {
                self.fire(NodeRef::MethodReference(e))?;
                match &e.target {
                    Some(MethodReferenceTarget::Type(t)) => self.traverse_type(t),
                    Some(MethodReferenceTarget::Expression(x)) => self.traverse_rvalue(x),
                    None => Ok(()),
                }
            }
            Rvalue::Switch(e) => {
                self.fire(NodeRef::SwitchExpression(e))?;
                self.traverse_rvalue(&e.selector)?;
                self.traverse_switch_cases(&e.cases)
            }
            Rvalue::IntegerLiteral(e) => self.fire(NodeRef::IntegerLiteral(e)),
            Rvalue::FloatingPointLiteral(e) => self.fire(NodeRef::FloatingPointLiteral(e)),
            Rvalue::BooleanLiteral(e) => self.fire(NodeRef::BooleanLiteral(e)),
            Rvalue::CharacterLiteral(e) => self.fire(NodeRef::CharacterLiteral(e)),
            Rvalue::StringLiteral(e) => self.fire(NodeRef::StringLiteral(e)),
            Rvalue::NullLiteral(e) => self.fire(NodeRef::NullLiteral(e)),
        }
    }

    fn traverse_array_initializer(&mut self, init: &'a ArrayInitializer) -> Result<(), ActionError> {
        self.fire(NodeRef::ArrayInitializer(init))?;
        self.traverse_rvalues(&init.values)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Types and annotations
    // ═══════════════════════════════════════════════════════════════════

    fn traverse_types(&mut self, types: &'a [Type]) -> Result<(), ActionError> {
        for t in types {
            self.traverse_type(t)?;
        }
        Ok(())
    }

    pub fn traverse_type(&mut self, t: &'a Type) -> Result<(), ActionError> {
        match t {
            Type::Primitive(p) => self.fire(NodeRef::PrimitiveType(p)),
            Type::Reference(r) => {
                self.fire(NodeRef::ReferenceType(r))?;
                self.traverse_types(&r.type_arguments)
            }
            Type::Array(a) => {
                self.fire(NodeRef::ArrayType(a))?;
                self.traverse_type(&a.component_type)
            }
            Type::Wildcard(w) => {
                self.fire(NodeRef::WildcardType(w))?;
                if let Some(bound) = &w.bound {
                    self.traverse_type(bound)?;
                }
                Ok(())
            }
        }
    }

    fn traverse_annotations(&mut self, annotations: &'a [Annotation]) -> Result<(), ActionError> {
        for annotation in annotations {
            self.traverse_annotation(annotation)?;
        }
        Ok(())
    }

    fn traverse_annotation(&mut self, annotation: &'a Annotation) -> Result<(), ActionError> {
        match annotation {
            Annotation::Marker(a) => self.fire(NodeRef::MarkerAnnotation(a)),
            Annotation::SingleElement(a) => {
                self.fire(NodeRef::SingleElementAnnotation(a))?;
                self.traverse_element_value(&a.element_value)
            }
            Annotation::Normal(a) => {
                self.fire(NodeRef::NormalAnnotation(a))?;
                for pair in &a.element_value_pairs {
                    self.fire(NodeRef::ElementValuePair(pair))?;
                    self.traverse_element_value(&pair.value)?;
                }
                Ok(())
            }
        }
    }

    fn traverse_element_value(&mut self, value: &'a ElementValue) -> Result<(), ActionError> {
        match value {
            ElementValue::Rvalue(rv) => self.traverse_rvalue(rv),
            ElementValue::Annotation(a) => self.traverse_annotation(a),
            ElementValue::ArrayInitializer(init) => {
                self.fire(NodeRef::ElementValueArrayInitializer(init))?;
                for v in &init.element_values {
                    self.traverse_element_value(v)?;
                }
                Ok(())
            }
        }
    }
}
