//! Source discovery: walking roots, combined name patterns and decoding.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::domain::errors::{ConfigError, ParseError};
use crate::ports::SourceLoader;

pub const DEFAULT_FILE_PATTERN: &str = "*.java";
pub const DEFAULT_DIR_PATTERN: &str = "*";

// ═══════════════════════════════════════════════════════════════════════
// Name patterns
// ═══════════════════════════════════════════════════════════════════════

/// Globs joined by `+` (include) or `-` (exclude), e.g. `*.java-*Test*`.
/// The last glob matching a name decides; a name no glob matches is
/// excluded.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    rules: Vec<(bool, glob::Pattern)>,
}

impl NamePattern {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let mut rules = Vec::new();
        let mut include = true;
        let mut current = String::new();
        let mut push = |include: bool, text: &mut String| -> Result<(), ConfigError> {
            if !text.is_empty() {
                let pattern = glob::Pattern::new(text).map_err(|e| ConfigError::Pattern {
                    pattern: source.to_string(),
                    message: e.to_string(),
                })?;
                rules.push((include, pattern));
                text.clear();
            }
            Ok(())
        };

        for ch in source.chars() {
            match ch {
                '+' | '-' => {
                    push(include, &mut current)?;
                    include = ch == '+';
                }
                _ => current.push(ch),
            }
        }
        push(include, &mut current)?;

        if rules.is_empty() {
            return Err(ConfigError::Pattern {
                pattern: source.to_string(),
                message: "no globs".to_string(),
            });
        }
        Ok(NamePattern { source: source.to_string(), rules })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|(_, glob)| glob.matches(name))
            .is_some_and(|(include, _)| *include)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Walking
// ═══════════════════════════════════════════════════════════════════════

pub struct SourceFinder {
    dirs: NamePattern,
    files: NamePattern,
}

impl SourceFinder {
    pub fn new(dirs: NamePattern, files: NamePattern) -> Self {
        SourceFinder { dirs, files }
    }

    pub fn from_patterns(dirs: &str, files: &str) -> Result<Self, ConfigError> {
        Ok(SourceFinder::new(NamePattern::parse(dirs)?, NamePattern::parse(files)?))
    }

    /// Every matching file under `roots`, each root walked in file-name
    /// order. A root that is itself a file is taken as is.
    pub fn find(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for root in roots {
            let meta = fs::metadata(root).with_context(|| format!("cannot read root {}", root.display()))?;
            if meta.is_file() {
                found.push(root.clone());
                continue;
            }
            let before = found.len();
            self.walk(root, &mut found)?;
            tracing::debug!("{}: {} source file(s)", root.display(), found.len() - before);
        }
        Ok(found)
    }

    fn walk(&self, root: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || self.dirs.matches(&file_name(e.path())));

        for entry in walker {
            let entry = entry.with_context(|| format!("walking {}", root.display()))?;
            if entry.file_type().is_file() && self.files.matches(&file_name(entry.path())) {
                found.push(entry.into_path());
            }
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════
// Decoding
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Encoding {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "iso88591" | "latin1" => Ok(Encoding::Latin1),
            "usascii" | "ascii" => Ok(Encoding::Ascii),
            _ => Err(ConfigError::UnsupportedEncoding(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Ascii => "US-ASCII",
        }
    }

    pub fn decode(self, path: &str, bytes: Vec<u8>) -> Result<String, ParseError> {
        let decode_error = |message: String| ParseError::Decode {
            path: path.to_string(),
            encoding: self.name().to_string(),
            message,
        };
        match self {
            Encoding::Utf8 => {
                let text = String::from_utf8(bytes).map_err(|e| decode_error(e.utf8_error().to_string()))?;
                Ok(match text.strip_prefix('\u{feff}') {
                    Some(rest) => rest.to_string(),
                    None => text,
                })
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(decode_error(format!("byte {:#04x} at offset {}", bytes[offset], offset))),
                None => String::from_utf8(bytes).map_err(|e| decode_error(e.to_string())),
            },
        }
    }
}

impl SourceLoader for Encoding {
    fn load(&self, path: &Path) -> Result<Arc<str>, ParseError> {
        let display = path.display().to_string();
        let bytes = fs::read(path).map_err(|source| ParseError::Io { path: display.clone(), source })?;
        Ok(Arc::from(self.decode(&display, bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_matching_glob_decides() {
        let p = NamePattern::parse("*.java-*Test*+*TestUtil.java").unwrap();
        assert!(p.matches("A.java"));
        assert!(!p.matches("ATest.java"));
        assert!(p.matches("ATestUtil.java"));
        assert!(!p.matches("A.kt"));

        let p = NamePattern::parse("-gen").unwrap();
        assert!(!p.matches("gen"));
        assert!(!p.matches("src"));

        assert!(matches!(NamePattern::parse("+-"), Err(ConfigError::Pattern { .. })));
        assert!(matches!(NamePattern::parse("[a"), Err(ConfigError::Pattern { .. })));
    }

    #[test]
    fn test_walks_in_file_name_order_and_prunes_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in ["b/B.java", "a/Z.java", "a/A.java", "a/notes.txt", "gen/G.java", "Top.java"] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "class X {}").unwrap();
        }

        let finder = SourceFinder::new(NamePattern::parse("*-gen").unwrap(), NamePattern::parse("*.java").unwrap());
        let found: Vec<String> = finder
            .find(&[root.to_path_buf()])
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(found, vec!["Top.java", "a/A.java", "a/Z.java", "b/B.java"]);

        let all = SourceFinder::from_patterns(DEFAULT_DIR_PATTERN, DEFAULT_FILE_PATTERN).unwrap().find(&[root.to_path_buf()]).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_root_pattern_does_not_prune_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("gen");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("A.java"), "class A {}").unwrap();
        let finder = SourceFinder::new(NamePattern::parse("*-gen").unwrap(), NamePattern::parse("*.java").unwrap());
        assert_eq!(finder.find(&[root]).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceFinder::from_patterns(DEFAULT_DIR_PATTERN, DEFAULT_FILE_PATTERN).unwrap().find(&[dir.path().join("nope")]).unwrap_err();
        assert!(err.to_string().contains("cannot read root"), "{err}");
    }

    #[test]
    fn test_encodings() {
        assert_eq!(Encoding::from_name("utf-8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::from_name("ISO-8859-1").unwrap(), Encoding::Latin1);
        assert_eq!(Encoding::from_name("latin1").unwrap(), Encoding::Latin1);
        assert_eq!(Encoding::from_name("US-ASCII").unwrap(), Encoding::Ascii);
        assert!(matches!(Encoding::from_name("EBCDIC"), Err(ConfigError::UnsupportedEncoding(_))));

        assert_eq!(Encoding::Latin1.decode("A.java", vec![b'c', 0xE9]).unwrap(), "c\u{e9}");
        assert_eq!(Encoding::Utf8.decode("A.java", b"\xEF\xBB\xBFclass".to_vec()).unwrap(), "class");
        let err = Encoding::Utf8.decode("A.java", vec![b'c', 0xE9]).unwrap_err();
        assert!(matches!(err, ParseError::Decode { .. }));
        let err = Encoding::Ascii.decode("A.java", vec![b'c', 0xE9]).unwrap_err();
        assert!(err.to_string().contains("byte 0xe9 at offset 1"), "{err}");
    }

    #[test]
    fn test_loader_reports_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = Encoding::Utf8.load(&dir.path().join("Missing.java")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
