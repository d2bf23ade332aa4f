//! Node-kind dispatch table.
//!
//! `NodeKind` is the closed set of traversal entry points an action can be
//! bound to. Concrete kinds correspond 1:1 with AST node structs; abstract
//! kinds are generalizations (`statement`, `rvalue`, `literal`, ...) that
//! fire for every concrete kind whose chain names them.
//!
//! The whole table lives in one `node_kinds!` invocation so the identifier,
//! node type, field schema and generalization chain of a kind cannot drift
//! apart.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::domain::ast::{self, Nesting, Span, TypeDeclaration};

macro_rules! node_kinds {
    (
        concrete {
            $( $variant:ident ( $ty:ty ) = $id:literal [ $( $field:literal ),* ] => [ $( $gen:ident ),* ]; )*
        }
        abstract {
            $( $avariant:ident = $aid:literal => [ $( $agen:ident ),* ]; )*
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $( $variant, )*
            $( $avariant, )*
        }

        impl NodeKind {
            /// Every kind, concrete kinds first, in table order.
            pub const ALL: &'static [NodeKind] = &[
                $( NodeKind::$variant, )*
                $( NodeKind::$avariant, )*
            ];

            /// Caller-facing identifier, also the `kind` of serialized nodes.
            pub fn id(self) -> &'static str {
                match self {
                    $( NodeKind::$variant => $id, )*
                    $( NodeKind::$avariant => $aid, )*
                }
            }

            pub fn is_abstract(self) -> bool {
                match self {
                    $( NodeKind::$variant => false, )*
                    $( NodeKind::$avariant => true, )*
                }
            }

            /// Generalization chain, most specific first, excluding `self`.
            pub fn generalizations(self) -> &'static [NodeKind] {
                match self {
                    $( NodeKind::$variant => &[ $( NodeKind::$gen ),* ], )*
                    $( NodeKind::$avariant => &[ $( NodeKind::$agen ),* ], )*
                }
            }

            fn declared_fields(self) -> &'static [&'static str] {
                match self {
                    $( NodeKind::$variant => &[ $( $field ),* ], )*
                    $( NodeKind::$avariant => &[], )*
                }
            }
        }

        /// Borrowed, typed handle on one AST node.
        #[derive(Debug, Clone, Copy)]
        pub enum NodeRef<'a> {
            $( $variant(&'a $ty), )*
        }

        impl<'a> NodeRef<'a> {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $( NodeRef::$variant(_) => NodeKind::$variant, )*
                }
            }

            pub fn span(&self) -> Span {
                match self {
                    $( NodeRef::$variant(n) => n.span, )*
                }
            }

            /// The node as a structured value: `kind`, `span` and its fields.
            pub fn to_value(&self) -> Value {
                let value = match self {
                    $( NodeRef::$variant(n) => serde_json::to_value(n), )*
                };
                value.unwrap_or(Value::Null)
            }
        }
    };
}

node_kinds! {
    concrete {
        CompilationUnit(ast::CompilationUnit) = "compilationUnit" ["path", "package", "imports", "types"] => [];
        PackageDeclaration(ast::PackageDeclaration) = "packageDeclaration" ["annotations", "name"] => [Located];

        SingleTypeImportDeclaration(ast::SingleTypeImportDeclaration) = "singleTypeImportDeclaration"
            ["name"] => [ImportDeclaration, Located];
        TypeImportOnDemandDeclaration(ast::TypeImportOnDemandDeclaration) = "typeImportOnDemandDeclaration"
            ["package"] => [ImportDeclaration, Located];
        SingleStaticImportDeclaration(ast::SingleStaticImportDeclaration) = "singleStaticImportDeclaration"
            ["typeName", "member"] => [ImportDeclaration, Located];
        StaticImportOnDemandDeclaration(ast::StaticImportOnDemandDeclaration) = "staticImportOnDemandDeclaration"
            ["typeName"] => [ImportDeclaration, Located];

        PackageMemberClassDeclaration(ast::ClassDeclaration) = "packageMemberClassDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "implements", "members"]
            => [NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, Located];
        MemberClassDeclaration(ast::ClassDeclaration) = "memberClassDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "implements", "members"]
            => [NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, AbstractTypeBodyDeclaration, Located];
        LocalClassDeclaration(ast::ClassDeclaration) = "localClassDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "implements", "members"]
            => [NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, Located];
        PackageMemberEnumDeclaration(ast::EnumDeclaration) = "packageMemberEnumDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "implements", "constants", "members"]
            => [PackageMemberClassDeclaration, NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, Located];
        MemberEnumDeclaration(ast::EnumDeclaration) = "memberEnumDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "implements", "constants", "members"]
            => [MemberClassDeclaration, NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, AbstractTypeBodyDeclaration, Located];
        LocalEnumDeclaration(ast::EnumDeclaration) = "localEnumDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "implements", "constants", "members"]
            => [LocalClassDeclaration, NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, Located];
        PackageMemberRecordDeclaration(ast::RecordDeclaration) = "packageMemberRecordDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "components", "implements", "members"]
            => [PackageMemberClassDeclaration, NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, Located];
        MemberRecordDeclaration(ast::RecordDeclaration) = "memberRecordDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "components", "implements", "members"]
            => [MemberClassDeclaration, NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, AbstractTypeBodyDeclaration, Located];
        LocalRecordDeclaration(ast::RecordDeclaration) = "localRecordDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "components", "implements", "members"]
            => [LocalClassDeclaration, NamedClassDeclaration, ClassDeclaration, AbstractTypeDeclaration, Located];
        PackageMemberInterfaceDeclaration(ast::InterfaceDeclaration) = "packageMemberInterfaceDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "members"]
            => [InterfaceDeclaration, AbstractTypeDeclaration, Located];
        MemberInterfaceDeclaration(ast::InterfaceDeclaration) = "memberInterfaceDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "members"]
            => [InterfaceDeclaration, AbstractTypeDeclaration, AbstractTypeBodyDeclaration, Located];
        LocalInterfaceDeclaration(ast::InterfaceDeclaration) = "localInterfaceDeclaration"
            ["modifiers", "name", "typeParameters", "extends", "members"]
            => [InterfaceDeclaration, AbstractTypeDeclaration, Located];
        PackageMemberAnnotationTypeDeclaration(ast::AnnotationTypeDeclaration) = "packageMemberAnnotationTypeDeclaration"
            ["modifiers", "name", "members"]
            => [InterfaceDeclaration, AbstractTypeDeclaration, Located];
        MemberAnnotationTypeDeclaration(ast::AnnotationTypeDeclaration) = "memberAnnotationTypeDeclaration"
            ["modifiers", "name", "members"]
            => [InterfaceDeclaration, AbstractTypeDeclaration, AbstractTypeBodyDeclaration, Located];
        AnonymousClassDeclaration(ast::AnonymousClassDeclaration) = "anonymousClassDeclaration"
            ["baseType", "members"] => [ClassDeclaration, AbstractTypeDeclaration, Located];

        TypeParameter(ast::TypeParameter) = "typeParameter" ["name", "bounds"] => [Located];
        FieldDeclaration(ast::FieldDeclaration) = "fieldDeclaration"
            ["modifiers", "type", "variableDeclarators"] => [AbstractTypeBodyDeclaration, Located];
        VariableDeclarator(ast::VariableDeclarator) = "variableDeclarator"
            ["name", "brackets", "initializer"] => [Located];
        MethodDeclarator(ast::MethodDeclarator) = "methodDeclarator"
            ["modifiers", "typeParameters", "returnType", "name", "formalParameters", "thrownExceptions", "defaultValue", "body"]
            => [FunctionDeclarator, AbstractTypeBodyDeclaration, Located];
        ConstructorDeclarator(ast::ConstructorDeclarator) = "constructorDeclarator"
            ["modifiers", "typeParameters", "name", "formalParameters", "thrownExceptions", "constructorInvocation", "statements"]
            => [FunctionDeclarator, AbstractTypeBodyDeclaration, Located];
        Initializer(ast::Initializer) = "initializer" ["isStatic", "block"] => [AbstractTypeBodyDeclaration, Located];
        EnumConstant(ast::EnumConstant) = "enumConstant"
            ["modifiers", "name", "arguments", "classBody"] => [Located];
        FormalParameters(ast::FormalParameters) = "formalParameters" ["parameters", "variableArity"] => [Located];
        FormalParameter(ast::FormalParameter) = "formalParameter"
            ["modifiers", "type", "name", "variableArity"] => [Located];

        LabeledStatement(ast::LabeledStatement) = "labeledStatement"
            ["label", "body"] => [BreakableStatement, Statement, Located];
        Block(ast::Block) = "block" ["statements"] => [BreakableStatement, Statement, Located];
        ExpressionStatement(ast::ExpressionStatement) = "expressionStatement" ["expression"] => [Statement, Located];
        IfStatement(ast::IfStatement) = "ifStatement"
            ["condition", "thenStatement", "elseStatement"] => [Statement, Located];
        ForStatement(ast::ForStatement) = "forStatement"
            ["init", "condition", "update", "body"] => [ContinuableStatement, BreakableStatement, Statement, Located];
        ForEachStatement(ast::ForEachStatement) = "forEachStatement"
            ["currentElement", "expression", "body"] => [ContinuableStatement, BreakableStatement, Statement, Located];
        WhileStatement(ast::WhileStatement) = "whileStatement"
            ["condition", "body"] => [ContinuableStatement, BreakableStatement, Statement, Located];
        DoStatement(ast::DoStatement) = "doStatement"
            ["body", "condition"] => [ContinuableStatement, BreakableStatement, Statement, Located];
        TryStatement(ast::TryStatement) = "tryStatement"
            ["resources", "body", "catchClauses", "finally"] => [Statement, Located];
        SwitchStatement(ast::SwitchStatement) = "switchStatement"
            ["selector", "cases"] => [BreakableStatement, Statement, Located];
        SynchronizedStatement(ast::SynchronizedStatement) = "synchronizedStatement"
            ["expression", "body"] => [Statement, Located];
        LocalVariableDeclarationStatement(ast::LocalVariableDeclarationStatement) = "localVariableDeclarationStatement"
            ["modifiers", "type", "variableDeclarators"] => [Statement, Located];
        ReturnStatement(ast::ReturnStatement) = "returnStatement" ["returnValue"] => [Statement, Located];
        ThrowStatement(ast::ThrowStatement) = "throwStatement" ["expression"] => [Statement, Located];
        BreakStatement(ast::BreakStatement) = "breakStatement" ["label"] => [Statement, Located];
        ContinueStatement(ast::ContinueStatement) = "continueStatement" ["label"] => [Statement, Located];
        AssertStatement(ast::AssertStatement) = "assertStatement" ["condition", "message"] => [Statement, Located];
        EmptyStatement(ast::EmptyStatement) = "emptyStatement" [] => [Statement, Located];
        LocalClassDeclarationStatement(ast::LocalClassDeclarationStatement) = "localClassDeclarationStatement"
            ["declaration"] => [Statement, Located];
        YieldStatement(ast::YieldStatement) = "yieldStatement" ["value"] => [Statement, Located];

        CatchClause(ast::CatchClause) = "catchClause" ["modifiers", "types", "name", "body"] => [Located];
        SwitchCase(ast::SwitchCase) = "switchCase" ["labels", "isDefault", "arrow", "statements"] => [Located];
        LocalVariableDeclaratorResource(ast::LocalVariableDeclaratorResource) = "localVariableDeclaratorResource"
            ["modifiers", "type", "name", "initializer"] => [Resource, Located];
        VariableAccessResource(ast::VariableAccessResource) = "variableAccessResource"
            ["variableAccess"] => [Resource, Located];
        AlternateConstructorInvocation(ast::AlternateConstructorInvocation) = "alternateConstructorInvocation"
            ["arguments"] => [ConstructorInvocation, Located];
        SuperConstructorInvocation(ast::SuperConstructorInvocation) = "superConstructorInvocation"
            ["qualification", "arguments"] => [ConstructorInvocation, Located];

        AmbiguousName(ast::AmbiguousName) = "ambiguousName" ["identifiers"] => [Lvalue, Rvalue, Atom, Located];
        FieldAccessExpression(ast::FieldAccessExpression) = "fieldAccessExpression"
            ["lhs", "fieldName"] => [Lvalue, Rvalue, Atom, Located];
        SuperclassFieldAccessExpression(ast::SuperclassFieldAccessExpression) = "superclassFieldAccessExpression"
            ["qualification", "fieldName"] => [Lvalue, Rvalue, Atom, Located];
        ArrayAccessExpression(ast::ArrayAccessExpression) = "arrayAccessExpression"
            ["lhs", "index"] => [Lvalue, Rvalue, Atom, Located];
        ParenthesizedExpression(ast::ParenthesizedExpression) = "parenthesizedExpression"
            ["value"] => [Lvalue, Rvalue, Atom, Located];
        Assignment(ast::Assignment) = "assignment" ["lhs", "operator", "rhs"] => [Rvalue, Atom, Located];
        UnaryOperation(ast::UnaryOperation) = "unaryOperation" ["operator", "operand"] => [Rvalue, Atom, Located];
        BinaryOperation(ast::BinaryOperation) = "binaryOperation" ["lhs", "operator", "rhs"] => [Rvalue, Atom, Located];
        Cast(ast::Cast) = "cast" ["targetType", "value"] => [Rvalue, Atom, Located];
        ClassLiteral(ast::ClassLiteral) = "classLiteral" ["type"] => [Rvalue, Atom, Located];
        ConditionalExpression(ast::ConditionalExpression) = "conditionalExpression"
            ["condition", "thenValue", "elseValue"] => [Rvalue, Atom, Located];
        Crement(ast::Crement) = "crement" ["operator", "isPrefix", "operand"] => [Rvalue, Atom, Located];
        Instanceof(ast::Instanceof) = "instanceof" ["lhs", "rhs", "binding"] => [Rvalue, Atom, Located];
        MethodInvocation(ast::MethodInvocation) = "methodInvocation"
            ["target", "typeArguments", "methodName", "arguments"] => [Invocation, Rvalue, Atom, Located];
        SuperclassMethodInvocation(ast::SuperclassMethodInvocation) = "superclassMethodInvocation"
            ["methodName", "arguments"] => [Invocation, Rvalue, Atom, Located];
        NewClassInstance(ast::NewClassInstance) = "newClassInstance"
            ["qualification", "type", "arguments"] => [Rvalue, Atom, Located];
        NewAnonymousClassInstance(ast::NewAnonymousClassInstance) = "newAnonymousClassInstance"
            ["qualification", "anonymousClassDeclaration", "arguments"] => [Rvalue, Atom, Located];
        NewArray(ast::NewArray) = "newArray" ["type", "dimensionExpressions", "dimensions"] => [Rvalue, Atom, Located];
        NewInitializedArray(ast::NewInitializedArray) = "newInitializedArray"
            ["arrayType", "arrayInitializer"] => [Rvalue, Atom, Located];
        ArrayInitializer(ast::ArrayInitializer) = "arrayInitializer" ["values"] => [Rvalue, Atom, Located];
        ThisReference(ast::ThisReference) = "thisReference" [] => [Rvalue, Atom, Located];
        QualifiedThisReference(ast::QualifiedThisReference) = "qualifiedThisReference"
            ["qualification"] => [Rvalue, Atom, Located];
        LambdaExpression(ast::LambdaExpression) = "lambdaExpression"
            ["parameterNames", "formalParameters", "body"] => [Rvalue, Atom, Located];
        MethodReference(ast::MethodReference) = "methodReference" ["target", "methodName"] => [Rvalue, Atom, Located];
        SwitchExpression(ast::SwitchExpression) = "switchExpression" ["selector", "cases"] => [Rvalue, Atom, Located];

        IntegerLiteral(ast::IntegerLiteral) = "integerLiteral" ["value"] => [Literal, Rvalue, Atom, Located];
        FloatingPointLiteral(ast::FloatingPointLiteral) = "floatingPointLiteral" ["value"] => [Literal, Rvalue, Atom, Located];
        BooleanLiteral(ast::BooleanLiteral) = "booleanLiteral" ["value"] => [Literal, Rvalue, Atom, Located];
        CharacterLiteral(ast::CharacterLiteral) = "characterLiteral" ["value"] => [Literal, Rvalue, Atom, Located];
        StringLiteral(ast::StringLiteral) = "stringLiteral" ["value"] => [Literal, Rvalue, Atom, Located];
        NullLiteral(ast::NullLiteral) = "nullLiteral" ["value"] => [Literal, Rvalue, Atom, Located];

        PrimitiveType(ast::PrimitiveType) = "primitiveType" ["name"] => [Type, Atom, Located];
        ReferenceType(ast::ReferenceType) = "referenceType" ["name", "typeArguments"] => [Type, Atom, Located];
        ArrayType(ast::ArrayType) = "arrayType" ["componentType"] => [Type, Atom, Located];
        WildcardType(ast::WildcardType) = "wildcardType" ["boundKind", "bound"] => [Type, Atom, Located];

        MarkerAnnotation(ast::MarkerAnnotation) = "markerAnnotation" ["typeName"] => [Annotation, ElementValue, Located];
        SingleElementAnnotation(ast::SingleElementAnnotation) = "singleElementAnnotation"
            ["typeName", "elementValue"] => [Annotation, ElementValue, Located];
        NormalAnnotation(ast::NormalAnnotation) = "normalAnnotation"
            ["typeName", "elementValuePairs"] => [Annotation, ElementValue, Located];
        ElementValuePair(ast::ElementValuePair) = "elementValuePair" ["key", "value"] => [Located];
        ElementValueArrayInitializer(ast::ElementValueArrayInitializer) = "elementValueArrayInitializer"
            ["elementValues"] => [ElementValue, Located];
    }
    abstract {
        ImportDeclaration = "importDeclaration" => [Located];
        AbstractTypeDeclaration = "abstractTypeDeclaration" => [Located];
        ClassDeclaration = "classDeclaration" => [AbstractTypeDeclaration, Located];
        NamedClassDeclaration = "namedClassDeclaration" => [ClassDeclaration, AbstractTypeDeclaration, Located];
        InterfaceDeclaration = "interfaceDeclaration" => [AbstractTypeDeclaration, Located];
        AbstractTypeBodyDeclaration = "abstractTypeBodyDeclaration" => [Located];
        FunctionDeclarator = "functionDeclarator" => [AbstractTypeBodyDeclaration, Located];
        Statement = "statement" => [Located];
        BreakableStatement = "breakableStatement" => [Statement, Located];
        ContinuableStatement = "continuableStatement" => [BreakableStatement, Statement, Located];
        ConstructorInvocation = "constructorInvocation" => [Located];
        Resource = "resource" => [Located];
        Rvalue = "rvalue" => [Atom, Located];
        Lvalue = "lvalue" => [Rvalue, Atom, Located];
        Invocation = "invocation" => [Rvalue, Atom, Located];
        Literal = "literal" => [Rvalue, Atom, Located];
        Type = "type" => [Atom, Located];
        Atom = "atom" => [Located];
        Annotation = "annotation" => [ElementValue, Located];
        ElementValue = "elementValue" => [Located];
        Located = "located" => [];
    }
}

/// Always part of a node's value, whatever its kind.
pub const COMMON_FIELDS: [&str; 2] = ["kind", "span"];

impl NodeKind {
    /// Resolves a caller-supplied name. A leading `-` and any `-`, `_` or
    /// whitespace are ignored and case does not matter, so
    /// `method-invocation`, `MethodInvocation` and `-methodInvocation` all
    /// name [`NodeKind::MethodInvocation`].
    pub fn from_name(name: &str) -> Option<NodeKind> {
        let wanted = normalize(name.strip_prefix('-').unwrap_or(name));
        if wanted.is_empty() {
            return None;
        }
        NodeKind::ALL.iter().copied().find(|kind| normalize(kind.id()) == wanted)
    }

    /// `self` followed by its generalization chain: the order in which
    /// action lists fire for a node of this kind.
    pub fn chain(self) -> impl Iterator<Item = NodeKind> {
        std::iter::once(self).chain(self.generalizations().iter().copied())
    }

    /// Whether a node of kind `self` also fires actions bound to `other`.
    pub fn is_a(self, other: NodeKind) -> bool {
        self.chain().any(|k| k == other)
    }

    /// Field names every node firing this kind is guaranteed to carry,
    /// `kind` and `span` aside: the intersection over the kind itself (if
    /// concrete) and all concrete kinds that generalize to it.
    pub fn fields(self) -> Vec<&'static str> {
        let mut members = NodeKind::ALL
            .iter()
            .copied()
            .filter(|k| !k.is_abstract() && k.is_a(self));
        let Some(first) = members.next() else {
            return Vec::new();
        };
        let mut fields: Vec<&'static str> = first.declared_fields().to_vec();
        for kind in members {
            let declared = kind.declared_fields();
            fields.retain(|f| declared.contains(f));
        }
        fields
    }

    pub fn has_field(self, field: &str) -> bool {
        COMMON_FIELDS.contains(&field) || self.fields().contains(&field)
    }

    pub fn class_declaration(nesting: Nesting) -> NodeKind {
        match nesting {
            Nesting::PackageMember => NodeKind::PackageMemberClassDeclaration,
            Nesting::Member => NodeKind::MemberClassDeclaration,
            Nesting::Local => NodeKind::LocalClassDeclaration,
        }
    }

    pub fn interface_declaration(nesting: Nesting) -> NodeKind {
        match nesting {
            Nesting::PackageMember => NodeKind::PackageMemberInterfaceDeclaration,
            Nesting::Member => NodeKind::MemberInterfaceDeclaration,
            Nesting::Local => NodeKind::LocalInterfaceDeclaration,
        }
    }

    pub fn enum_declaration(nesting: Nesting) -> NodeKind {
        match nesting {
            Nesting::PackageMember => NodeKind::PackageMemberEnumDeclaration,
            Nesting::Member => NodeKind::MemberEnumDeclaration,
            Nesting::Local => NodeKind::LocalEnumDeclaration,
        }
    }

    pub fn record_declaration(nesting: Nesting) -> NodeKind {
        match nesting {
            Nesting::PackageMember => NodeKind::PackageMemberRecordDeclaration,
            Nesting::Member => NodeKind::MemberRecordDeclaration,
            Nesting::Local => NodeKind::LocalRecordDeclaration,
        }
    }

    /// Annotation types are never local; `Local` maps like `Member`.
    pub fn annotation_type_declaration(nesting: Nesting) -> NodeKind {
        match nesting {
            Nesting::PackageMember => NodeKind::PackageMemberAnnotationTypeDeclaration,
            Nesting::Member | Nesting::Local => NodeKind::MemberAnnotationTypeDeclaration,
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'a> NodeRef<'a> {
    /// The handle for a named type declaration, by shape and nesting.
    pub fn type_declaration(decl: &'a TypeDeclaration) -> NodeRef<'a> {
        match decl {
            TypeDeclaration::Class(d) => match d.nesting {
                Nesting::PackageMember => NodeRef::PackageMemberClassDeclaration(d),
                Nesting::Member => NodeRef::MemberClassDeclaration(d),
                Nesting::Local => NodeRef::LocalClassDeclaration(d),
            },
            TypeDeclaration::Interface(d) => match d.nesting {
                Nesting::PackageMember => NodeRef::PackageMemberInterfaceDeclaration(d),
                Nesting::Member => NodeRef::MemberInterfaceDeclaration(d),
                Nesting::Local => NodeRef::LocalInterfaceDeclaration(d),
            },
            TypeDeclaration::Enum(d) => match d.nesting {
                Nesting::PackageMember => NodeRef::PackageMemberEnumDeclaration(d),
                Nesting::Member => NodeRef::MemberEnumDeclaration(d),
                Nesting::Local => NodeRef::LocalEnumDeclaration(d),
            },
            TypeDeclaration::Record(d) => match d.nesting {
                Nesting::PackageMember => NodeRef::PackageMemberRecordDeclaration(d),
                Nesting::Member => NodeRef::MemberRecordDeclaration(d),
                Nesting::Local => NodeRef::LocalRecordDeclaration(d),
            },
            TypeDeclaration::AnnotationType(d) => match d.nesting {
                Nesting::PackageMember => NodeRef::PackageMemberAnnotationTypeDeclaration(d),
                Nesting::Member | Nesting::Local => NodeRef::MemberAnnotationTypeDeclaration(d),
            },
        }
    }
}
