//! Class repository: the in-memory resolver in front of the classpath.
//!
//! Names declared by a compilation unit of this run always shadow the
//! classpath. Names in the runtime namespace (`java.`) never consult the
//! units. Every answer, including "not found", is cached: the unit list is
//! frozen before the first lookup, so an answer can never change.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::ast::{CompilationUnit, ImportDeclaration};
use crate::domain::descriptor::ClassDescriptor;
use crate::ports::ClassResolver;

/// Names with this prefix belong to the runtime library.
pub const RUNTIME_PACKAGE_PREFIX: &str = "java.";

/// Implicitly imported into every unit.
const IMPLICIT_PACKAGE: &str = "java.lang";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    /// Lookups answered from the cache.
    pub cache_hits: usize,
    /// Lookups that scanned the compilation units.
    pub unit_scans: usize,
    /// Lookups delegated to the classpath leaf.
    pub leaf_lookups: usize,
}

pub struct ClassRepository<'u> {
    units: &'u [CompilationUnit],
    leaf: Box<dyn ClassResolver>,
    cache: DashMap<String, Option<Arc<ClassDescriptor>>>,
    cache_hits: AtomicUsize,
    unit_scans: AtomicUsize,
    leaf_lookups: AtomicUsize,
}

impl<'u> ClassRepository<'u> {
    /// `units` must be the complete, parsed unit list of the run.
    pub fn new(units: &'u [CompilationUnit], leaf: Box<dyn ClassResolver>) -> Self {
        ClassRepository {
            units,
            leaf,
            cache: DashMap::new(),
            cache_hits: AtomicUsize::new(0),
            unit_scans: AtomicUsize::new(0),
            leaf_lookups: AtomicUsize::new(0),
        }
    }

    pub fn units(&self) -> &'u [CompilationUnit] {
        self.units
    }

    /// Resolves a binary name (`pkg.Outer$Inner`). `None` is an ordinary
    /// answer, not an error.
    pub fn resolve(&self, binary_name: &str) -> Option<Arc<ClassDescriptor>> {
        if let Some(cached) = self.cache.get(binary_name) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return cached.value().clone();
        }

        let mut found = None;
        if !binary_name.starts_with(RUNTIME_PACKAGE_PREFIX) {
            self.unit_scans.fetch_add(1, Ordering::Relaxed);
            found = self.units.iter().find_map(|unit| {
                let descriptor = unit.find_class(binary_name)?;
                tracing::debug!("{} resolved from {}", binary_name, unit.path);
                Some(descriptor)
            });
        }
        if found.is_none() {
            self.leaf_lookups.fetch_add(1, Ordering::Relaxed);
            found = self.leaf.resolve(binary_name);
            match &found {
                Some(_) => tracing::debug!("{} resolved from classpath", binary_name),
                None => tracing::debug!("{} not found", binary_name),
            }
        }

        let found = found.map(Arc::new);
        self.cache
            .entry(binary_name.to_string())
            .or_insert(found)
            .value()
            .clone()
    }

    /// Resolves a type name as written in `unit`: a qualified name (with
    /// `$` nesting variants), then single-type imports, the unit's own
    /// package, on-demand imports and finally `java.lang`.
    pub fn resolve_in_unit(&self, unit: &CompilationUnit, name: &str) -> Option<Arc<ClassDescriptor>> {
        let (first, rest) = match name.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };

        if rest.is_some() {
            if let Some(found) = self.resolve_dotted(name) {
                return Some(found);
            }
        }

        // Imports and packages only name the first segment; the rest are
        // member types.
        let suffix = rest.map(|r| format!("${}", r.replace('.', "$"))).unwrap_or_default();
        let qualify = |base: String| format!("{}{}", base, suffix);

        for import in &unit.imports {
            if let ImportDeclaration::SingleType(i) = import {
                let simple = i.name.rsplit('.').next().unwrap_or(&i.name);
                if simple == first {
                    return self.resolve_dotted(&qualify(i.name.clone()));
                }
            }
        }

        if let Some(found) = self.resolve(&qualify(unit.binary_name(first))) {
            return Some(found);
        }

        for import in &unit.imports {
            let package = match import {
                ImportDeclaration::TypeOnDemand(i) => i.package.as_str(),
                ImportDeclaration::StaticOnDemand(i) => i.type_name.as_str(),
                _ => continue,
            };
            let candidate = qualify(format!("{}.{}", package, first));
            if let Some(found) = self.resolve_dotted(&candidate) {
                return Some(found);
            }
        }

        self.resolve(&qualify(format!("{}.{}", IMPLICIT_PACKAGE, first)))
    }

    /// Tries `a.b.C.D` as `a.b.C.D`, `a.b.C$D`, `a.b$C$D`, ... until one
    /// resolves. Runtime names keep their `java.` prefix throughout.
    fn resolve_dotted(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        let floor = if name.starts_with(RUNTIME_PACKAGE_PREFIX) { RUNTIME_PACKAGE_PREFIX.len() } else { 0 };
        let mut candidate = name.to_string();
        loop {
            if let Some(found) = self.resolve(&candidate) {
                return Some(found);
            }
            let dot = candidate.rfind('.').filter(|&dot| dot >= floor)?;
            candidate.replace_range(dot..dot + 1, "$");
        }
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            unit_scans: self.unit_scans.load(Ordering::Relaxed),
            leaf_lookups: self.leaf_lookups.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::*;
    use crate::domain::descriptor::Origin;
    use crate::ports::EmptyClasspath;

    fn class(name: &str) -> TypeDeclaration {
        TypeDeclaration::Class(ClassDeclaration {
            nesting: Nesting::PackageMember,
            span: Span::default(),
            modifiers: Modifiers::default(),
            name: name.to_string(),
            type_parameters: vec![],
            extends: None,
            implements: vec![],
            members: vec![],
        })
    }

    fn unit(path: &str, package: &str, imports: Vec<ImportDeclaration>, types: Vec<TypeDeclaration>) -> CompilationUnit {
        CompilationUnit {
            path: path.to_string(),
            source: Arc::from(""),
            span: Span::default(),
            package: Some(PackageDeclaration {
                span: Span::default(),
                annotations: vec![],
                name: package.to_string(),
            }),
            imports,
            types,
        }
    }

    #[test]
    fn test_nested_runtime_names_never_scan_units() {
        let units = vec![unit("A.java", "p", vec![], vec![class("A")])];
        let classes = ClassRepository::new(&units, Box::new(EmptyClasspath));

        assert!(classes.resolve_dotted("java.util.Map.Entry").is_none());
        let stats = classes.stats();
        assert_eq!(stats.unit_scans, 0);
        assert_eq!(stats.leaf_lookups, 3);
        assert!(classes.cache.contains_key("java.util$Map$Entry"));
        assert!(!classes.cache.contains_key("java$util$Map$Entry"));

        assert!(classes.resolve_dotted("p.A.Inner").is_none());
        assert_eq!(classes.stats().unit_scans, 3);
    }

    #[test]
    fn test_misses_are_cached() {
        let units = vec![unit("A.java", "p", vec![], vec![class("A")])];
        let repo = ClassRepository::new(&units, Box::new(EmptyClasspath));

        assert!(repo.resolve("p.Missing").is_none());
        assert!(repo.resolve("p.Missing").is_none());
        let stats = repo.stats();
        assert_eq!(stats.unit_scans, 1);
        assert_eq!(stats.leaf_lookups, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_resolve_in_unit_uses_imports_and_package() {
        let units = vec![
            unit(
                "a/A.java",
                "a",
                vec![
                    ImportDeclaration::SingleType(SingleTypeImportDeclaration {
                        span: Span::default(),
                        name: "b.B".to_string(),
                    }),
                    ImportDeclaration::TypeOnDemand(TypeImportOnDemandDeclaration {
                        span: Span::default(),
                        package: "c".to_string(),
                    }),
                ],
                vec![class("A"), class("Sibling")],
            ),
            unit("b/B.java", "b", vec![], vec![class("B")]),
            unit("c/C.java", "c", vec![], vec![class("C")]),
        ];
        let repo = ClassRepository::new(&units, Box::new(EmptyClasspath));
        let a = &units[0];

        let name_of = |n: &str| repo.resolve_in_unit(a, n).map(|d| d.name.clone());
        assert_eq!(name_of("B").as_deref(), Some("b.B"));
        assert_eq!(name_of("Sibling").as_deref(), Some("a.Sibling"));
        assert_eq!(name_of("C").as_deref(), Some("c.C"));
        assert_eq!(name_of("c.C").as_deref(), Some("c.C"));
        assert_eq!(name_of("Nowhere"), None);

        let b = repo.resolve("b.B").unwrap();
        assert_eq!(b.origin, Origin::Source { path: "b/B.java".to_string() });
    }
}
