use crate::resource::ResourceStream;
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// A resource copied into the scratch directory, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub local_path: PathBuf,
    pub display_name: String,
    pub size_bytes: u64,
}

impl StagedFile {
    /// Name the file is uploaded under.
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> &str {
        extension_of(&self.display_name)
    }
}

/// Writes resource streams to uniquely named files in one scratch directory.
#[derive(Debug, Clone)]
pub struct Stager {
    scratch_dir: PathBuf,
}

impl Stager {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let scratch_dir = scratch_dir.into();
        fs::create_dir_all(&scratch_dir)?;
        Ok(Stager { scratch_dir })
    }

    /// Copy the whole stream into a fresh scratch file.
    ///
    /// The stream is consumed and dropped on every path. A partially
    /// written file is removed if the copy fails.
    pub fn stage(&self, mut stream: ResourceStream, display_name: &str) -> io::Result<StagedFile> {
        let local_path = self.scratch_dir.join(scratch_name(display_name));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&local_path)?;
        let mut writer = BufWriter::new(file);

        let copied = io::copy(&mut stream, &mut writer).and_then(|n| {
            writer.flush()?;
            Ok(n)
        });
        drop(writer);
        drop(stream);

        match copied {
            Ok(size_bytes) => {
                let staged = StagedFile {
                    local_path,
                    display_name: display_name.to_string(),
                    size_bytes,
                };
                debug!(
                    "Staged {} bytes at {} (extension {:?})",
                    size_bytes,
                    staged.local_path.display(),
                    staged.extension()
                );
                Ok(staged)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&local_path) {
                    warn!("Cannot remove partial file {}: {}", local_path.display(), rm);
                }
                Err(e)
            }
        }
    }
}

/// Everything after the last `.` of `display_name`, or empty.
pub fn extension_of(display_name: &str) -> &str {
    match display_name.rsplit_once('.') {
        Some((_, ext)) if !ext.contains(['/', '\\']) => ext,
        _ => "",
    }
}

fn scratch_name(display_name: &str) -> String {
    let stem = format!(
        "temp_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    );
    match extension_of(display_name) {
        "" => stem,
        ext => format!("{}.{}", stem, ext),
    }
}
