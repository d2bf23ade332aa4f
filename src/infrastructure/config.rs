//! Run settings and the optional TOML configuration file.
//!
//! ```toml
//! roots = ["src/main/java"]
//! files = "*.java-*Generated*"
//! classpath = ["build/classes"]
//! check_references = true
//!
//! [[action]]
//! kind = "methodInvocation"
//! script = 'if (_.methodName == "foo") println(_.location())'
//! ```
//!
//! Relative paths in the file are taken relative to the file's directory.
//! Without a `classpath`, classes are looked up under the working
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::errors::ConfigError;
use crate::domain::registry::ActionSpec;
use crate::infrastructure::classpath::DirectoryClasspath;
use crate::infrastructure::source_finder::{DEFAULT_DIR_PATTERN, DEFAULT_FILE_PATTERN};

pub const DEFAULT_CLASSPATH: &str = ".";

fn default_dirs() -> String {
    DEFAULT_DIR_PATTERN.to_string()
}

fn default_files() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    #[serde(default = "default_dirs")]
    pub dirs: String,
    #[serde(default = "default_files")]
    pub files: String,
    #[serde(default)]
    pub classpath: Option<Vec<PathBuf>>,
    /// Searched before the classpath.
    #[serde(default)]
    pub bootclasspath: Option<Vec<PathBuf>>,
    /// Directories whose archives come between the boot entries and the
    /// classpath.
    #[serde(default)]
    pub extdirs: Option<Vec<PathBuf>>,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub check_references: bool,
    /// Parse-phase workers; 0 picks one per core.
    #[serde(default)]
    pub jobs: usize,
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            dirs: default_dirs(),
            files: default_files(),
            classpath: None,
            bootclasspath: None,
            extdirs: None,
            encoding: default_encoding(),
            check_references: false,
            jobs: 0,
            actions: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_error = |message: String| ConfigError::ConfigFile { path: path.to_path_buf(), message };
        let content = fs::read_to_string(path).map_err(|e| config_error(format!("failed to read config file: {}", e)))?;
        let mut settings: Settings =
            toml::from_str(&content).map_err(|e| config_error(format!("failed to parse config file: {}", e)))?;

        let base = path.parent().unwrap_or(Path::new(""));
        let paths = settings
            .roots
            .iter_mut()
            .chain(settings.classpath.iter_mut().flatten())
            .chain(settings.bootclasspath.iter_mut().flatten())
            .chain(settings.extdirs.iter_mut().flatten());
        for p in paths {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        tracing::debug!("loaded {} action(s) from {}", settings.actions.len(), path.display());
        Ok(settings)
    }

    /// The classpath leaf for these settings.
    pub fn class_resolver(&self) -> DirectoryClasspath {
        let working_dir = [PathBuf::from(DEFAULT_CLASSPATH)];
        DirectoryClasspath::javac_like(
            self.bootclasspath.as_deref().unwrap_or_default(),
            self.extdirs.as_deref().unwrap_or_default(),
            self.classpath.as_deref().unwrap_or(&working_dir),
        )
    }
}

/// Command-line values layered over [`Settings`]: scalars and paths
/// replace, lists append.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub roots: Vec<PathBuf>,
    pub dirs: Option<String>,
    pub files: Option<String>,
    pub classpath: Option<Vec<PathBuf>>,
    pub bootclasspath: Option<Vec<PathBuf>>,
    pub extdirs: Option<Vec<PathBuf>>,
    pub encoding: Option<String>,
    pub check_references: bool,
    pub jobs: Option<usize>,
    pub actions: Vec<ActionSpec>,
}

impl Settings {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        self.roots.extend(overrides.roots);
        self.classpath = overrides.classpath.or(self.classpath);
        self.bootclasspath = overrides.bootclasspath.or(self.bootclasspath);
        self.extdirs = overrides.extdirs.or(self.extdirs);
        self.actions.extend(overrides.actions);
        if let Some(dirs) = overrides.dirs {
            self.dirs = dirs;
        }
        if let Some(files) = overrides.files {
            self.files = files;
        }
        if let Some(encoding) = overrides.encoding {
            self.encoding = encoding;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
        self.check_references |= overrides.check_references;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_resolves_paths_against_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jgrep.toml");
        fs::write(
            &path,
            r#"
roots = ["src", "/abs/src"]
files = "*.java-*Test*"
classpath = ["classes"]
bootclasspath = ["/jdk/classes"]
check_references = true

[[action]]
kind = "methodInvocation"
script = 'println(_.location())'

[[action]]
kind = "fieldDeclaration"
script = "print(_)"
"#,
        )
        .unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.roots, vec![dir.path().join("src"), PathBuf::from("/abs/src")]);
        assert_eq!(s.classpath, Some(vec![dir.path().join("classes")]));
        assert_eq!(s.bootclasspath, Some(vec![PathBuf::from("/jdk/classes")]));
        assert_eq!(s.extdirs, None);
        assert_eq!(s.files, "*.java-*Test*");
        assert_eq!(s.dirs, "*");
        assert_eq!(s.encoding, "UTF-8");
        assert!(s.check_references);
        assert_eq!(s.jobs, 0);
        assert_eq!(
            s.actions,
            vec![
                ActionSpec::new("methodInvocation", "println(_.location())"),
                ActionSpec::new("fieldDeclaration", "print(_)"),
            ]
        );
    }

    #[test]
    fn test_overrides_replace_scalars_and_append_lists() {
        let base = Settings {
            roots: vec![PathBuf::from("a")],
            actions: vec![ActionSpec::new("block", "print(1)")],
            ..Settings::default()
        };
        let s = base.apply(Overrides {
            roots: vec![PathBuf::from("b")],
            encoding: Some("latin1".to_string()),
            jobs: Some(2),
            actions: vec![ActionSpec::new("block", "print(2)")],
            ..Overrides::default()
        });
        assert_eq!(s.roots, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(s.encoding, "latin1");
        assert_eq!(s.jobs, 2);
        assert_eq!(s.files, "*.java");
        assert_eq!(s.actions.len(), 2);
        assert_eq!(s.actions[1].script, "print(2)");
    }

    #[test]
    fn test_classpath_defaults_to_the_working_directory() {
        let s = Settings::default();
        assert_eq!(s.class_resolver().directories(), &[PathBuf::from(".")]);

        let dir = tempfile::tempdir().unwrap();
        let boot = dir.path().join("boot");
        let classes = dir.path().join("classes");
        fs::create_dir_all(&boot).unwrap();
        fs::create_dir_all(&classes).unwrap();

        let base = Settings { classpath: Some(vec![PathBuf::from("from-config")]), ..Settings::default() };
        let s = base.apply(Overrides {
            classpath: Some(vec![classes.clone()]),
            bootclasspath: Some(vec![boot.clone()]),
            ..Overrides::default()
        });
        assert_eq!(s.classpath, Some(vec![classes.clone()]));
        assert_eq!(s.class_resolver().directories(), &[boot, classes]);
    }

    #[test]
    fn test_bad_files_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jgrep.toml");
        fs::write(&path, "rootz = []").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigFile { .. }));
        assert!(err.to_string().contains("failed to parse config file"), "{err}");

        let err = Settings::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"), "{err}");
    }
}
