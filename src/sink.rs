use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::FetchError;
use crate::model::{ShotRecord, SHOT_COLUMNS};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> FetchError + '_ {
    move |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Replace `path` with `bytes` by way of a temporary sibling, so an
/// interrupted write leaves the previous file in place.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_error(path))
}

/// Pretty-print with the 4-space indent the existing data files use.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FetchError> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| FetchError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    replace_file(path, &bytes)
}

/// `None` when there is no file yet.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, FetchError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(path)(source)),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| FetchError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// An in-memory collection mirrored to a JSON array on disk.
///
/// Every checkpoint rewrites the whole file from the collection.
#[derive(Debug)]
pub struct JsonSink<T> {
    path: PathBuf,
    records: Vec<T>,
}

impl<T: Serialize + DeserializeOwned> JsonSink<T> {
    /// Start from whatever a previous run left at `path`.
    pub fn resume(path: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let path = path.into();
        let records: Vec<T> = read_json(&path)?.unwrap_or_default();
        if !records.is_empty() {
            info!("Resuming from {} ({} records)", path.display(), records.len());
        }
        Ok(Self { path, records })
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers already present, by the given identifier field.
    pub fn fetched_ids<K: Eq + Hash>(&self, id: impl Fn(&T) -> K) -> HashSet<K> {
        self.records.iter().map(id).collect()
    }

    pub fn checkpoint(&self) -> Result<(), FetchError> {
        write_json(&self.path, &self.records)
    }
}

/// Header row followed by one row per shot.
pub fn write_shots_csv(path: &Path, shots: &[ShotRecord]) -> Result<(), FetchError> {
    let csv_error = |source| FetchError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(SHOT_COLUMNS).map_err(csv_error)?;
    for shot in shots {
        writer.serialize(shot).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| io_error(path)(e.into_error()))?;
    replace_file(path, &bytes)
}
