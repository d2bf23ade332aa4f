//! Classpath leaf resolver over directories of compiled classes.
//!
//! `a.b.C$D` is looked up as `a/b/C$D.class` under each directory entry in
//! order. Only the class file header is decoded: constant pool, access
//! flags, this/super class, interfaces, fields and methods. Archive
//! entries are skipped with a warning.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error;

use crate::domain::descriptor::{ClassDescriptor, MemberSignature, Origin};
use crate::ports::ClassResolver;

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_STATIC: u16 = 0x0008;
const ACC_INTERFACE: u16 = 0x0200;

#[derive(Debug, Error)]
pub enum ClassFileError {
    #[error("truncated class file")]
    Truncated(#[from] io::Error),

    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstant { tag: u8, index: u16 },

    #[error("constant pool index {0} does not name a {1}")]
    BadIndex(u16, &'static str),

    #[error("malformed descriptor \"{0}\"")]
    BadDescriptor(String),
}

pub struct DirectoryClasspath {
    directories: Vec<PathBuf>,
}

impl DirectoryClasspath {
    /// Keeps directory entries; archives and missing entries are logged
    /// and dropped.
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut directories = Vec::new();
        for entry in entries {
            let entry = entry.into();
            if entry.is_dir() {
                directories.push(entry);
            } else if is_archive(&entry) {
                tracing::warn!("skipping archive classpath entry {}", entry.display());
            } else {
                tracing::warn!("skipping classpath entry {}: not a directory", entry.display());
            }
        }
        tracing::debug!("classpath has {} directory entries", directories.len());
        DirectoryClasspath { directories }
    }

    /// javac lookup order: boot entries, then the archives found in each
    /// extension directory, then the classpath.
    pub fn javac_like(boot: &[PathBuf], extdirs: &[PathBuf], classpath: &[PathBuf]) -> Self {
        let mut entries = boot.to_vec();
        for dir in extdirs {
            match fs::read_dir(dir) {
                Ok(listing) => {
                    let mut archives: Vec<PathBuf> =
                        listing.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| is_archive(p)).collect();
                    archives.sort();
                    entries.extend(archives);
                }
                Err(e) => tracing::warn!("cannot list extension directory {}: {}", dir.display(), e),
            }
        }
        entries.extend(classpath.iter().cloned());
        Self::new(entries)
    }

    /// Splits a platform path list (`a:b` on Unix, `a;b` on Windows).
    pub fn from_path_list(list: &str) -> Self {
        Self::new(std::env::split_paths(list).filter(|p| !p.as_os_str().is_empty()))
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

impl ClassResolver for DirectoryClasspath {
    fn resolve(&self, binary_name: &str) -> Option<ClassDescriptor> {
        let relative = format!("{}.class", binary_name.replace('.', "/"));
        for dir in &self.directories {
            let path = dir.join(&relative);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!("cannot read {}: {}", path.display(), e);
                    continue;
                }
            };
            match parse_class_file(&bytes, &path.display().to_string()) {
                Ok(descriptor) if descriptor.name == binary_name => return Some(descriptor),
                Ok(descriptor) => {
                    tracing::warn!("{} declares {}, not {}", path.display(), descriptor.name, binary_name);
                }
                Err(e) => tracing::warn!("ignoring {}: {}", path.display(), e),
            }
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Class file decoding
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    /// Any entry whose content is never looked at, and the unusable slot
    /// following a long or double.
    Other,
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(ClassFileError::BadIndex(index, "UTF-8 string")),
        }
    }

    /// Binary name of a class constant, `java.lang.String`.
    fn class_name(&self, index: u16) -> Result<String, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name)) => Ok(self.utf8(*name)?.replace('/', ".")),
            _ => Err(ClassFileError::BadIndex(index, "class")),
        }
    }
}

fn read_constant_pool(r: &mut Cursor<&[u8]>) -> Result<ConstantPool, ClassFileError> {
    let count = r.read_u16::<BigEndian>()?;
    let mut pool = vec![Constant::Other];
    let mut index = 1;
    while index < count {
        let tag = r.read_u8()?;
        let (constant, width) = match tag {
            1 => {
                let len = r.read_u16::<BigEndian>()? as usize;
                let mut bytes = vec![0; len];
                r.read_exact(&mut bytes)?;
                (Constant::Utf8(String::from_utf8_lossy(&bytes).into_owned()), 1)
            }
            7 => (Constant::Class(r.read_u16::<BigEndian>()?), 1),
            3 | 4 => {
                r.read_u32::<BigEndian>()?;
                (Constant::Other, 1)
            }
            5 | 6 => {
                r.read_u64::<BigEndian>()?;
                (Constant::Other, 2)
            }
            8 | 16 | 19 | 20 => {
                r.read_u16::<BigEndian>()?;
                (Constant::Other, 1)
            }
            9 | 10 | 11 | 12 | 17 | 18 => {
                r.read_u32::<BigEndian>()?;
                (Constant::Other, 1)
            }
            15 => {
                r.read_u8()?;
                r.read_u16::<BigEndian>()?;
                (Constant::Other, 1)
            }
            _ => return Err(ClassFileError::UnknownConstant { tag, index }),
        };
        pool.push(constant);
        if width == 2 {
            pool.push(Constant::Other);
        }
        index += width;
    }
    Ok(ConstantPool(pool))
}

fn skip_attributes(r: &mut Cursor<&[u8]>) -> Result<(), ClassFileError> {
    let count = r.read_u16::<BigEndian>()?;
    for _ in 0..count {
        r.read_u16::<BigEndian>()?;
        let len = r.read_u32::<BigEndian>()?;
        let skipped = io::copy(&mut r.by_ref().take(u64::from(len)), &mut io::sink())?;
        if skipped < u64::from(len) {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
    }
    Ok(())
}

/// One field descriptor type at the start of `chars`, as a Java type name.
fn descriptor_type(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, whole: &str) -> Result<String, ClassFileError> {
    let bad = || ClassFileError::BadDescriptor(whole.to_string());
    let mut dims = 0;
    while chars.peek() == Some(&'[') {
        chars.next();
        dims += 1;
    }
    let base = match chars.next().ok_or_else(bad)? {
        'B' => "byte".to_string(),
        'C' => "char".to_string(),
        'D' => "double".to_string(),
        'F' => "float".to_string(),
        'I' => "int".to_string(),
        'J' => "long".to_string(),
        'S' => "short".to_string(),
        'Z' => "boolean".to_string(),
        'V' if dims == 0 => "void".to_string(),
        'L' => {
            let mut name = String::new();
            loop {
                match chars.next().ok_or_else(bad)? {
                    ';' => break,
                    '/' => name.push('.'),
                    c => name.push(c),
                }
            }
            name
        }
        _ => return Err(bad()),
    };
    Ok(format!("{}{}", base, "[]".repeat(dims)))
}

fn field_signature(name: &str, descriptor: &str) -> Result<String, ClassFileError> {
    let mut chars = descriptor.chars().peekable();
    let ty = descriptor_type(&mut chars, descriptor)?;
    if chars.next().is_some() {
        return Err(ClassFileError::BadDescriptor(descriptor.to_string()));
    }
    Ok(format!("{} {}", ty, name))
}

fn method_signature(name: &str, descriptor: &str) -> Result<String, ClassFileError> {
    let bad = || ClassFileError::BadDescriptor(descriptor.to_string());
    let mut chars = descriptor.chars().peekable();
    if chars.next() != Some('(') {
        return Err(bad());
    }
    let mut params = Vec::new();
    while chars.peek() != Some(&')') {
        if chars.peek().is_none() {
            return Err(bad());
        }
        params.push(descriptor_type(&mut chars, descriptor)?);
    }
    chars.next();
    let ret = descriptor_type(&mut chars, descriptor)?;
    if name == "<init>" {
        Ok(format!("<init>({})", params.join(", ")))
    } else {
        Ok(format!("{} {}({})", ret, name, params.join(", ")))
    }
}

fn read_members(
    r: &mut Cursor<&[u8]>,
    pool: &ConstantPool,
    signature: fn(&str, &str) -> Result<String, ClassFileError>,
) -> Result<Vec<MemberSignature>, ClassFileError> {
    let count = r.read_u16::<BigEndian>()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access = r.read_u16::<BigEndian>()?;
        let name = pool.utf8(r.read_u16::<BigEndian>()?)?.to_string();
        let descriptor = pool.utf8(r.read_u16::<BigEndian>()?)?;
        skip_attributes(r)?;
        if name == "<clinit>" {
            continue;
        }
        members.push(MemberSignature {
            signature: signature(&name, descriptor)?,
            name,
            is_static: access & ACC_STATIC != 0,
        });
    }
    Ok(members)
}

/// Decodes a class file into a descriptor. `location` ends up in the
/// descriptor's origin.
pub fn parse_class_file(bytes: &[u8], location: &str) -> Result<ClassDescriptor, ClassFileError> {
    let mut r = Cursor::new(bytes);
    let magic = r.read_u32::<BigEndian>()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    r.read_u16::<BigEndian>()?; // minor
    r.read_u16::<BigEndian>()?; // major

    let pool = read_constant_pool(&mut r)?;
    let access = r.read_u16::<BigEndian>()?;
    let name = pool.class_name(r.read_u16::<BigEndian>()?)?;
    let superclass = match r.read_u16::<BigEndian>()? {
        0 => None,
        index => Some(pool.class_name(index)?),
    };
    let interface_count = r.read_u16::<BigEndian>()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(r.read_u16::<BigEndian>()?)?);
    }
    let fields = read_members(&mut r, &pool, field_signature)?;
    let methods = read_members(&mut r, &pool, method_signature)?;

    Ok(ClassDescriptor {
        name,
        origin: Origin::Classpath { location: location.to_string() },
        is_interface: access & ACC_INTERFACE != 0,
        superclass,
        interfaces,
        fields,
        methods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assembles a minimal class file by hand.
    struct ClassFileBuilder {
        pool: Vec<Vec<u8>>,
        access: u16,
        this_class: u16,
        super_class: u16,
        interfaces: Vec<u16>,
        fields: Vec<(u16, u16, u16)>,
        methods: Vec<(u16, u16, u16)>,
    }

    impl ClassFileBuilder {
        fn new(name: &str, superclass: Option<&str>) -> Self {
            let mut b = ClassFileBuilder {
                pool: Vec::new(),
                access: 0x0021,
                this_class: 0,
                super_class: 0,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            };
            b.this_class = b.class(name);
            if let Some(s) = superclass {
                b.super_class = b.class(s);
            }
            b
        }

        fn utf8(&mut self, s: &str) -> u16 {
            let mut entry = vec![1];
            entry.extend_from_slice(&(s.len() as u16).to_be_bytes());
            entry.extend_from_slice(s.as_bytes());
            self.pool.push(entry);
            self.pool.len() as u16
        }

        fn class(&mut self, internal_name: &str) -> u16 {
            let name = self.utf8(internal_name);
            let mut entry = vec![7];
            entry.extend_from_slice(&name.to_be_bytes());
            self.pool.push(entry);
            self.pool.len() as u16
        }

        fn interface(mut self) -> Self {
            self.access |= ACC_INTERFACE;
            self
        }

        fn implements(mut self, internal_name: &str) -> Self {
            let index = self.class(internal_name);
            self.interfaces.push(index);
            self
        }

        fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
            let n = self.utf8(name);
            let d = self.utf8(descriptor);
            self.fields.push((access, n, d));
            self
        }

        fn method(mut self, access: u16, name: &str, descriptor: &str) -> Self {
            let n = self.utf8(name);
            let d = self.utf8(descriptor);
            self.methods.push((access, n, d));
            self
        }

        fn build(&self) -> Vec<u8> {
            let mut out = Vec::new();
            out.extend_from_slice(&MAGIC.to_be_bytes());
            out.extend_from_slice(&[0, 0, 0, 52]);
            out.extend_from_slice(&((self.pool.len() + 1) as u16).to_be_bytes());
            for entry in &self.pool {
                out.extend_from_slice(entry);
            }
            out.extend_from_slice(&self.access.to_be_bytes());
            out.extend_from_slice(&self.this_class.to_be_bytes());
            out.extend_from_slice(&self.super_class.to_be_bytes());
            out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
            for i in &self.interfaces {
                out.extend_from_slice(&i.to_be_bytes());
            }
            for members in [&self.fields, &self.methods] {
                out.extend_from_slice(&(members.len() as u16).to_be_bytes());
                for (access, name, descriptor) in members {
                    out.extend_from_slice(&access.to_be_bytes());
                    out.extend_from_slice(&name.to_be_bytes());
                    out.extend_from_slice(&descriptor.to_be_bytes());
                    out.extend_from_slice(&0u16.to_be_bytes());
                }
            }
            out.extend_from_slice(&0u16.to_be_bytes());
            out
        }
    }

    #[test]
    fn test_decodes_header_and_members() {
        let bytes = ClassFileBuilder::new("lib/Widget$Part", Some("java/lang/Object"))
            .implements("java/io/Serializable")
            .field(ACC_STATIC, "COUNT", "[[I")
            .method(0, "<init>", "(Ljava/lang/String;J)V")
            .method(ACC_STATIC, "of", "([Ljava/lang/String;)Llib/Widget$Part;")
            .method(ACC_STATIC, "<clinit>", "()V")
            .build();

        let d = parse_class_file(&bytes, "cp/lib/Widget$Part.class").unwrap();
        assert_eq!(d.name, "lib.Widget$Part");
        assert_eq!(d.superclass.as_deref(), Some("java.lang.Object"));
        assert_eq!(d.interfaces, vec!["java.io.Serializable"]);
        assert!(!d.is_interface);
        assert_eq!(d.field("COUNT").unwrap().signature, "int[][] COUNT");
        assert!(d.field("COUNT").unwrap().is_static);
        assert_eq!(d.method("<init>").unwrap().signature, "<init>(java.lang.String, long)");
        assert_eq!(d.method("of").unwrap().signature, "lib.Widget$Part of(java.lang.String[])");
        assert!(d.method("<clinit>").is_none());
        assert_eq!(d.origin, Origin::Classpath { location: "cp/lib/Widget$Part.class".to_string() });
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse_class_file(b"\x00\x01\x02\x03", "x"), Err(ClassFileError::BadMagic(_))));
        let mut bytes = ClassFileBuilder::new("A", None).build();
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(parse_class_file(&bytes, "x"), Err(ClassFileError::Truncated(_))));
    }

    #[test]
    fn test_directory_lookup_skips_archives_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("classes");
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(
            root.join("lib/Api.class"),
            ClassFileBuilder::new("lib/Api", Some("java/lang/Object")).interface().build(),
        )
        .unwrap();
        fs::write(root.join("lib/Broken.class"), b"not a class").unwrap();
        let jar = dir.path().join("deps.jar");
        fs::write(&jar, b"PK").unwrap();

        let list = std::env::join_paths([jar.as_path(), root.as_path()]).unwrap();
        let cp = DirectoryClasspath::from_path_list(list.to_str().unwrap());
        assert_eq!(cp.directories(), &[root.clone()]);

        let api = cp.resolve("lib.Api").unwrap();
        assert!(api.is_interface);
        assert!(cp.resolve("lib.Broken").is_none());
        assert!(cp.resolve("lib.Missing").is_none());
    }

    #[test]
    fn test_boot_entries_come_before_the_classpath() {
        let dir = tempfile::tempdir().unwrap();
        let boot = dir.path().join("boot");
        let ext = dir.path().join("ext");
        let classes = dir.path().join("classes");
        for (root, api) in [
            (&boot, ClassFileBuilder::new("lib/Api", Some("java/lang/Object")).interface()),
            (&classes, ClassFileBuilder::new("lib/Api", Some("java/lang/Object"))),
        ] {
            fs::create_dir_all(root.join("lib")).unwrap();
            fs::write(root.join("lib/Api.class"), api.build()).unwrap();
        }
        fs::create_dir_all(ext.join("nested")).unwrap();
        fs::write(ext.join("tools.jar"), b"PK").unwrap();

        let cp = DirectoryClasspath::javac_like(
            &[boot.clone()],
            &[ext, dir.path().join("no-such-dir")],
            &[classes.clone()],
        );
        assert_eq!(cp.directories(), &[boot, classes]);
        assert!(cp.resolve("lib.Api").unwrap().is_interface);
    }
}
