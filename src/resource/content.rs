use super::{ResourceResolver, ResourceStream};
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Error, ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

const CONTENT_SCHEME: &str = "content://";
const FILE_SCHEME: &str = "file://";

/// Resolves `content://{authority}/{path}` against registered root
/// directories, plus `file://` URIs and bare paths.
///
/// Only `content://` references answer display-name queries.
#[derive(Debug, Clone, Default)]
pub struct ContentResolver {
    authorities: HashMap<String, PathBuf>,
}

enum Target {
    Content(PathBuf),
    Plain(PathBuf),
}

impl ContentResolver {
    pub fn new(authorities: HashMap<String, PathBuf>) -> Self {
        ContentResolver { authorities }
    }

    pub fn with_authority(mut self, authority: &str, root: impl Into<PathBuf>) -> Self {
        self.authorities.insert(authority.to_string(), root.into());
        self
    }

    fn locate(&self, reference: &str) -> Result<Target> {
        if let Some(rest) = reference.strip_prefix(CONTENT_SCHEME) {
            let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
            let root = self.authorities.get(authority).ok_or_else(|| {
                Error::new(ErrorKind::NotFound, format!("unknown authority: {}", authority))
            })?;
            let relative = Path::new(path);
            if path.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_)))
            {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("invalid content path: {}", path),
                ));
            }
            return Ok(Target::Content(root.join(relative)));
        }
        if let Some(path) = reference.strip_prefix(FILE_SCHEME) {
            return Ok(Target::Plain(PathBuf::from(path)));
        }
        if reference.contains("://") {
            return Err(Error::new(
                ErrorKind::Unsupported,
                format!("unsupported reference: {}", reference),
            ));
        }
        Ok(Target::Plain(PathBuf::from(reference)))
    }
}

impl Target {
    fn path(&self) -> &Path {
        match self {
            Target::Content(path) | Target::Plain(path) => path,
        }
    }
}

impl ResourceResolver for ContentResolver {
    fn open(&self, reference: &str) -> Result<ResourceStream> {
        let target = self.locate(reference)?;
        let path = target.path();
        if !path.is_file() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("not a readable file: {}", path.display()),
            ));
        }
        debug!("Opening {}", path.display());
        Ok(Box::new(File::open(path)?))
    }

    fn display_name(&self, reference: &str) -> Option<String> {
        match self.locate(reference).ok()? {
            Target::Content(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Target::Plain(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn resolver_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, ContentResolver) {
        let root = tempfile::tempdir().unwrap();
        for (name, data) in files {
            let path = root.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }
        let resolver = ContentResolver::default().with_authority("valid", root.path());
        (root, resolver)
    }

    #[test]
    fn test_open_content_reference() {
        let (_root, resolver) = resolver_with(&[("docs/doc.pdf", &b"%PDF-1.4"[..])]);
        let mut buf = Vec::new();
        resolver
            .open("content://valid/docs/doc.pdf")
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, b"%PDF-1.4");
        assert_eq!(
            resolver.display_name("content://valid/docs/doc.pdf").as_deref(),
            Some("doc.pdf")
        );
    }

    #[test]
    fn test_missing_content_fails() {
        let (_root, resolver) = resolver_with(&[]);
        assert!(resolver.open("content://valid/nope.pdf").is_err());
        assert!(resolver.open("content://other/doc.pdf").is_err());
        assert!(resolver.open("content://valid").is_err());
    }

    #[test]
    fn test_traversal_rejected() {
        let (_root, resolver) = resolver_with(&[("doc.pdf", &b"x"[..])]);
        let err = resolver.open("content://valid/../secret.txt").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(resolver.open("content://valid//etc/passwd").is_err());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let (_root, resolver) = resolver_with(&[("sub/doc.pdf", &b"x"[..])]);
        let err = resolver.open("content://valid/sub").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_plain_paths_have_no_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, b"hello").unwrap();
        let resolver = ContentResolver::default();

        let plain = path.to_string_lossy().to_string();
        let uri = format!("file://{}", plain);
        assert!(resolver.open(&plain).is_ok());
        assert!(resolver.open(&uri).is_ok());
        assert_eq!(resolver.display_name(&plain), None);
        assert_eq!(resolver.display_name(&uri), None);
    }

    #[test]
    fn test_unknown_scheme_unsupported() {
        let resolver = ContentResolver::default();
        let err = resolver.open("https://example.com/a.pdf").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
