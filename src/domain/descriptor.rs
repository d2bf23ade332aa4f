//! Class descriptors: what the resolver knows about a class or interface.

use serde::Serialize;

use crate::domain::ast::{FormalParameters, MemberDeclaration, TypeDeclaration};

/// Where a descriptor came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Origin {
    /// Synthesized from a compilation unit parsed in this run.
    Source { path: String },
    /// Decoded from a compiled class on the classpath.
    Classpath { location: String },
}

/// A field, method or constructor. `signature` reads like a declaration
/// with erased types: `int count`, `void run(java.lang.String, int[])`,
/// `<init>(int)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSignature {
    pub name: String,
    pub signature: String,
    pub is_static: bool,
}

/// A possibly partial description of a class or interface. Source-derived
/// descriptors name super types as written, without resolving them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDescriptor {
    /// Binary name, `pkg.Outer$Inner`.
    pub name: String,
    pub origin: Origin,
    pub is_interface: bool,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberSignature>,
    pub methods: Vec<MemberSignature>,
}

const OBJECT: &str = "java.lang.Object";

impl ClassDescriptor {
    pub fn from_declaration(binary_name: &str, decl: &TypeDeclaration, path: &str) -> Self {
        let (superclass, interfaces) = match decl {
            TypeDeclaration::Class(d) => (
                Some(d.extends.as_ref().map_or_else(|| OBJECT.to_string(), |t| t.erasure())),
                d.implements.iter().map(|t| t.erasure()).collect(),
            ),
            TypeDeclaration::Interface(d) => {
                (Some(OBJECT.to_string()), d.extends.iter().map(|t| t.erasure()).collect())
            }
            TypeDeclaration::Enum(d) => (
                Some("java.lang.Enum".to_string()),
                d.implements.iter().map(|t| t.erasure()).collect(),
            ),
            TypeDeclaration::Record(d) => (
                Some("java.lang.Record".to_string()),
                d.implements.iter().map(|t| t.erasure()).collect(),
            ),
            TypeDeclaration::AnnotationType(_) => (
                Some(OBJECT.to_string()),
                vec!["java.lang.annotation.Annotation".to_string()],
            ),
        };

        let mut fields = Vec::new();
        let mut methods = Vec::new();

        match decl {
            TypeDeclaration::Enum(d) => {
                for constant in &d.constants {
                    fields.push(MemberSignature {
                        name: constant.name.clone(),
                        signature: format!("{} {}", d.name, constant.name),
                        is_static: true,
                    });
                }
            }
            TypeDeclaration::Record(d) => {
                for component in &d.components.parameters {
                    fields.push(MemberSignature {
                        name: component.name.clone(),
                        signature: format!("{} {}", component.type_.erasure(), component.name),
                        is_static: false,
                    });
                }
            }
            _ => {}
        }

        let in_interface = decl.is_interface();
        for member in decl.members() {
            match member {
                MemberDeclaration::Field(f) => {
                    let is_static = in_interface || f.modifiers.has("static");
                    for var in &f.variable_declarators {
                        let brackets = "[]".repeat(var.brackets);
                        fields.push(MemberSignature {
                            name: var.name.clone(),
                            signature: format!("{}{} {}", f.type_.erasure(), brackets, var.name),
                            is_static,
                        });
                    }
                }
                MemberDeclaration::Method(m) => methods.push(MemberSignature {
                    name: m.name.clone(),
                    signature: format!(
                        "{} {}({})",
                        m.return_type.erasure(),
                        m.name,
                        parameter_list(&m.formal_parameters)
                    ),
                    is_static: m.modifiers.has("static"),
                }),
                MemberDeclaration::Constructor(c) => methods.push(MemberSignature {
                    name: "<init>".to_string(),
                    signature: format!("<init>({})", parameter_list(&c.formal_parameters)),
                    is_static: false,
                }),
                MemberDeclaration::Initializer(_) | MemberDeclaration::Type(_) => {}
            }
        }

        ClassDescriptor {
            name: binary_name.to_string(),
            origin: Origin::Source { path: path.to_string() },
            is_interface: in_interface,
            superclass,
            interfaces,
            fields,
            methods,
        }
    }

    pub fn is_from_source(&self) -> bool {
        matches!(self.origin, Origin::Source { .. })
    }

    pub fn method(&self, name: &str) -> Option<&MemberSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&MemberSignature> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn parameter_list(params: &FormalParameters) -> String {
    params
        .parameters
        .iter()
        .map(|p| {
            let erased = p.type_.erasure();
            if p.variable_arity {
                format!("{}[]", erased)
            } else {
                erased
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::*;

    fn reference(name: &str) -> Type {
        Type::Reference(ReferenceType {
            span: Span::default(),
            name: name.to_string(),
            type_arguments: vec![],
        })
    }

    fn primitive(name: &str) -> Type {
        Type::Primitive(PrimitiveType { span: Span::default(), name: name.to_string() })
    }

    #[test]
    fn test_descriptor_from_class_declaration() {
        let method = MethodDeclarator {
            span: Span::default(),
            modifiers: Modifiers { flags: vec!["static".to_string()], annotations: vec![] },
            type_parameters: vec![],
            return_type: primitive("void"),
            name: "m".to_string(),
            formal_parameters: FormalParameters {
                span: Span::default(),
                parameters: vec![FormalParameter {
                    span: Span::default(),
                    modifiers: Modifiers::default(),
                    type_: reference("String"),
                    name: "args".to_string(),
                    variable_arity: true,
                }],
                variable_arity: true,
            },
            thrown_exceptions: vec![],
            default_value: None,
            body: None,
        };
        let field = FieldDeclaration {
            span: Span::default(),
            modifiers: Modifiers::default(),
            type_: primitive("int"),
            variable_declarators: vec![VariableDeclarator {
                span: Span::default(),
                name: "count".to_string(),
                brackets: 1,
                initializer: None,
            }],
        };
        let decl = TypeDeclaration::Class(ClassDeclaration {
            nesting: Nesting::PackageMember,
            span: Span::default(),
            modifiers: Modifiers::default(),
            name: "B".to_string(),
            type_parameters: vec![],
            extends: Some(reference("Base")),
            implements: vec![reference("java.io.Serializable")],
            members: vec![MemberDeclaration::Field(field), MemberDeclaration::Method(method)],
        });

        let d = ClassDescriptor::from_declaration("pkg.B", &decl, "B.java");
        assert_eq!(d.name, "pkg.B");
        assert!(d.is_from_source());
        assert!(!d.is_interface);
        assert_eq!(d.superclass.as_deref(), Some("Base"));
        assert_eq!(d.interfaces, vec!["java.io.Serializable"]);
        assert_eq!(d.field("count").unwrap().signature, "int[] count");
        let m = d.method("m").unwrap();
        assert_eq!(m.signature, "void m(String[])");
        assert!(m.is_static);
    }
}
