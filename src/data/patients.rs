//! Patient registry
//!
//! Every patient is one file under a data root, named by the patient id:
//! `<root>/<id>.libsvm`, `<root>/<id>.svm` or `<root>/<id>.csv`.

use crate::core::{RFError, Result, Sample};
use crate::data::{CsvDataset, LibSvmDataset};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const LIBSVM_EXTENSIONS: [&str; 2] = ["libsvm", "svm"];
const CSV_EXTENSION: &str = "csv";

/// Identifier of a single patient
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Directory of per-patient sample files
#[derive(Debug, Clone)]
pub struct PatientStore {
    root: PathBuf,
}

impl PatientStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All patient ids under the root, sorted and deduplicated
    pub fn discover(&self) -> Result<Vec<PatientId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || Self::format_of(&path).is_none() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(PatientId::new(stem));
            }
        }

        ids.sort();
        ids.dedup();
        debug!("discovered {} patients under {}", ids.len(), self.root.display());
        Ok(ids)
    }

    /// Load every sample of one patient
    pub fn load(&self, id: &PatientId) -> Result<Vec<Sample>> {
        let path = self.locate(id)?;
        debug!("loading patient {id} from {}", path.display());
        match Self::format_of(&path) {
            Some(Format::Csv) => Ok(CsvDataset::from_file(&path)?.into_samples()),
            Some(Format::LibSvm) => Ok(LibSvmDataset::from_file(&path)?.into_samples()),
            None => Err(RFError::InvalidDataset(format!(
                "unsupported patient file {}",
                path.display()
            ))),
        }
    }

    /// Path of the file holding `id`'s samples
    pub fn locate(&self, id: &PatientId) -> Result<PathBuf> {
        LIBSVM_EXTENSIONS
            .iter()
            .chain(std::iter::once(&CSV_EXTENSION))
            .map(|ext| self.root.join(format!("{id}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                RFError::InvalidDataset(format!(
                    "unknown patient {id} under {}",
                    self.root.display()
                ))
            })
    }

    fn format_of(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        if ext == CSV_EXTENSION {
            Some(Format::Csv)
        } else if LIBSVM_EXTENSIONS.contains(&ext) {
            Some(Format::LibSvm)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    LibSvm,
    Csv,
}

/// Leading patients, `patients[:n]` with Python semantics
///
/// `n >= 0` keeps the first `min(n, len)`; `n < 0` drops the last `|n|`.
pub fn select_head(patients: &[PatientId], n: isize) -> Vec<PatientId> {
    let len = patients.len();
    let end = if n >= 0 {
        n.unsigned_abs().min(len)
    } else {
        len.saturating_sub(n.unsigned_abs())
    };
    patients[..end].to_vec()
}

/// Trailing patients, `patients[-n:]` for `n > 0`
///
/// `n > 0` keeps the last `min(n, len)`; `n < 0` drops the first `|n|`;
/// `n == 0` selects nothing.
pub fn select_tail(patients: &[PatientId], n: isize) -> Vec<PatientId> {
    let len = patients.len();
    let start = match n {
        0 => len,
        n if n > 0 => len.saturating_sub(n.unsigned_abs()),
        n => n.unsigned_abs().min(len),
    };
    patients[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn ids(n: usize) -> Vec<PatientId> {
        (0..n).map(|i| PatientId::new(format!("p{i:02}"))).collect()
    }

    #[test]
    fn test_select_head() {
        let all = ids(5);
        assert_eq!(select_head(&all, 2), all[..2].to_vec());
        assert_eq!(select_head(&all, 9), all);
        assert_eq!(select_head(&all, -2), all[..3].to_vec());
        assert!(select_head(&all, -9).is_empty());
        assert!(select_head(&all, 0).is_empty());
    }

    #[test]
    fn test_select_tail() {
        let all = ids(5);
        assert_eq!(select_tail(&all, 2), all[3..].to_vec());
        assert_eq!(select_tail(&all, 9), all);
        assert_eq!(select_tail(&all, -2), all[2..].to_vec());
        assert!(select_tail(&all, -9).is_empty());
        assert!(select_tail(&all, 0).is_empty());
    }

    #[test]
    fn test_default_split_is_disjoint() {
        let all = ids(60);
        let train = select_head(&all, -25);
        let test = select_tail(&all, 25);

        assert_eq!(train.len(), 35);
        assert_eq!(test.len(), 25);
        assert!(train.iter().all(|p| !test.contains(p)));
    }

    #[test]
    fn test_discover_and_load() {
        let dir = TempDir::new().unwrap();
        let mut libsvm = fs::File::create(dir.path().join("b.libsvm")).unwrap();
        writeln!(libsvm, "1 1:0.5 2:0.25").unwrap();
        writeln!(libsvm, "0 1:-0.5").unwrap();
        let mut csv = fs::File::create(dir.path().join("a.csv")).unwrap();
        writeln!(csv, "x,y,class").unwrap();
        writeln!(csv, "1.0,0.0,1").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = PatientStore::new(dir.path());
        let found = store.discover().unwrap();
        assert_eq!(found, vec![PatientId::from("a"), PatientId::from("b")]);

        let samples = store.load(&PatientId::from("b")).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].class, 1);
        assert_eq!(samples[0].features.indices, vec![0, 1]);

        let samples = store.load(&PatientId::from("a")).unwrap();
        assert_eq!(samples[0].features.values, vec![1.0]);
    }

    #[test]
    fn test_unknown_patient() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path());
        assert!(matches!(
            store.load(&PatientId::from("missing")),
            Err(RFError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_missing_root() {
        let store = PatientStore::new("/non/existent/patients");
        assert!(matches!(store.discover(), Err(RFError::IoError(_))));
    }
}
