//! Typed Java syntax tree.
//!
//! Every node owns its children exclusively and carries a [`Span`]. Nodes
//! serialize to structured values whose `kind` key is the node-kind
//! identifier used by the action registry, so snippets see the same names
//! the caller used to bind them.

mod decl;
mod expr;
mod stmt;
mod types;

pub use decl::*;
pub use expr::*;
pub use stmt::*;
pub use types::*;

use std::sync::Arc;

use serde::Serialize;

use crate::domain::descriptor::ClassDescriptor;

/// Source position of a node: 1-based line/column plus the byte range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        if other.start < self.start {
            return other.to(self);
        }
        Span {
            line: self.line,
            column: self.column,
            start: self.start,
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Modifier keywords and annotations preceding a declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifiers {
    pub flags: Vec<String>,
    pub annotations: Vec<Annotation>,
}

impl Modifiers {
    pub fn has(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Where a named type declaration sits; decides its node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Nesting {
    PackageMember,
    Member,
    Local,
}

/// One parsed source file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename = "compilationUnit", rename_all = "camelCase")]
pub struct CompilationUnit {
    pub path: String,
    #[serde(skip)]
    pub source: Arc<str>,
    pub span: Span,
    pub package: Option<PackageDeclaration>,
    pub imports: Vec<ImportDeclaration>,
    pub types: Vec<TypeDeclaration>,
}

impl CompilationUnit {
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    /// Source text covered by `span`, empty if the span is out of range.
    pub fn text(&self, span: &Span) -> &str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    /// `path:line:column` for a node of this unit.
    pub fn location(&self, span: &Span) -> String {
        format!("{}:{}:{}", self.path, span.line, span.column)
    }

    /// Binary name (`pkg.Outer$Inner`) of a top-level type called `simple_name`.
    pub fn binary_name(&self, simple_name: &str) -> String {
        match self.package_name() {
            Some(pkg) => format!("{}.{}", pkg, simple_name),
            None => simple_name.to_string(),
        }
    }

    /// Synthesizes a descriptor for the top-level or member type with the
    /// given binary name, if this unit declares it.
    pub fn find_class(&self, binary_name: &str) -> Option<ClassDescriptor> {
        self.types.iter().find_map(|decl| {
            let name = self.binary_name(decl.name());
            self.find_in(decl, &name, binary_name)
        })
    }

    fn find_in(
        &self,
        decl: &TypeDeclaration,
        decl_name: &str,
        wanted: &str,
    ) -> Option<ClassDescriptor> {
        if decl_name == wanted {
            return Some(ClassDescriptor::from_declaration(decl_name, decl, &self.path));
        }
        let nested_prefix = format!("{}$", decl_name);
        if !wanted.starts_with(&nested_prefix) {
            return None;
        }
        decl.members().iter().find_map(|member| match member {
            MemberDeclaration::Type(inner) => {
                let inner_name = format!("{}{}", nested_prefix, inner.name());
                self.find_in(inner, &inner_name, wanted)
            }
            _ => None,
        })
    }

    /// Binary names of every top-level and member type declared here.
    pub fn declared_class_names(&self) -> Vec<String> {
        fn collect(decl: &TypeDeclaration, name: String, out: &mut Vec<String>) {
            for member in decl.members() {
                if let MemberDeclaration::Type(inner) = member {
                    collect(inner, format!("{}${}", name, inner.name()), out);
                }
            }
            out.push(name);
        }
        let mut names = Vec::new();
        for decl in &self.types {
            collect(decl, self.binary_name(decl.name()), &mut names);
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, nesting: Nesting, members: Vec<MemberDeclaration>) -> TypeDeclaration {
        TypeDeclaration::Class(ClassDeclaration {
            nesting,
            span: Span::default(),
            modifiers: Modifiers::default(),
            name: name.to_string(),
            type_parameters: vec![],
            extends: None,
            implements: vec![],
            members,
        })
    }

    fn unit(types: Vec<TypeDeclaration>) -> CompilationUnit {
        CompilationUnit {
            path: "Outer.java".to_string(),
            source: Arc::from(""),
            span: Span::default(),
            package: Some(PackageDeclaration {
                span: Span::default(),
                annotations: vec![],
                name: "pkg".to_string(),
            }),
            imports: vec![],
            types,
        }
    }

    #[test]
    fn test_find_top_level_and_member_classes() {
        let inner = class("Inner", Nesting::Member, vec![]);
        let cu = unit(vec![class(
            "Outer",
            Nesting::PackageMember,
            vec![MemberDeclaration::Type(inner)],
        )]);

        assert_eq!(cu.find_class("pkg.Outer").map(|d| d.name), Some("pkg.Outer".to_string()));
        assert_eq!(
            cu.find_class("pkg.Outer$Inner").map(|d| d.name),
            Some("pkg.Outer$Inner".to_string())
        );
        assert!(cu.find_class("pkg.Inner").is_none());
        assert!(cu.find_class("pkg.Outer.Inner").is_none());
        assert_eq!(cu.declared_class_names(), vec!["pkg.Outer$Inner", "pkg.Outer"]);
    }

    #[test]
    fn test_span_union() {
        let a = Span { line: 1, column: 5, start: 4, end: 10 };
        let b = Span { line: 2, column: 1, start: 12, end: 20 };
        assert_eq!(a.to(b), Span { line: 1, column: 5, start: 4, end: 20 });
        assert_eq!(b.to(a), Span { line: 1, column: 5, start: 4, end: 20 });
        assert!(a.to(b).contains(&b));
    }
}
