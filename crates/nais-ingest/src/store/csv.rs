//! CSV-backed feature store
//!
//! A store is a directory (conventionally named `*.gdb`); each feature class
//! is a `<name>.csv` file with a header row. Attribute values are kept as
//! strings; only the operations that need numbers (status scans, spatial
//! containment) parse them.

use super::{
    FeatureClassInfo, FeatureStore, POINT_X_FIELD, POINT_Y_FIELD, SHAPE_X_FIELD, SHAPE_Y_FIELD,
};
use crate::region::RegionPolygon;
use nais_common::error::{NaisError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Feature store laid out as a directory of CSV files
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Open an existing store directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(NaisError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("store directory '{}' does not exist", path.display()),
            )));
        }
        Ok(Self { path })
    }

    /// Open a store directory, creating it (with intermediates) if missing.
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Copy every feature class into a new store at `dest` and return it.
    ///
    /// Used to duplicate a pristine raw store before destructive stages.
    pub fn duplicate(&self, dest: impl Into<PathBuf>) -> Result<CsvStore> {
        let dest = Self::open_or_create(dest)?;
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                fs::copy(&path, dest.path.join(entry.file_name()))?;
            }
        }
        Ok(dest)
    }

    fn class_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.csv"))
    }

    fn require_class(&self, name: &str) -> Result<PathBuf> {
        let path = self.class_path(name);
        if !path.is_file() {
            return Err(NaisError::FeatureClassNotFound {
                store: self.path.clone(),
                name: name.to_string(),
            });
        }
        Ok(path)
    }

    fn read_class(&self, name: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let path = self.require_class(name)?;
        let mut reader = csv::Reader::from_path(&path)?;

        let header = reader
            .headers()?
            .iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok((header, rows))
    }

    pub(crate) fn write_class(&self, name: &str, header: &[String], rows: &[Vec<String>]) -> Result<()> {
        let mut writer = csv::Writer::from_path(self.class_path(name))?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(NaisError::Io)?;
        Ok(())
    }

    /// Index of `field` within `header`, or a field-not-found error.
    fn field_index(header: &[String], class: &str, field: &str) -> Result<usize> {
        header
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| NaisError::FieldNotFound {
                class: class.to_string(),
                field: field.to_string(),
            })
    }

    /// Indices of the position columns, preferring the derived fields.
    fn xy_indices(header: &[String], class: &str) -> Result<(usize, usize)> {
        if let (Some(x), Some(y)) = (
            header.iter().position(|f| f == POINT_X_FIELD),
            header.iter().position(|f| f == POINT_Y_FIELD),
        ) {
            return Ok((x, y));
        }
        Ok((
            Self::field_index(header, class, SHAPE_X_FIELD)?,
            Self::field_index(header, class, SHAPE_Y_FIELD)?,
        ))
    }

    fn parse_coord(class: &str, value: &str) -> Result<f64> {
        value.parse::<f64>().map_err(|_| {
            NaisError::Other(anyhow::anyhow!(
                "non-numeric coordinate '{value}' in feature class '{class}'"
            ))
        })
    }
}

/// Lazy attribute cursor over a CSV feature class
pub struct RowCursor {
    records: csv::StringRecordsIntoIter<fs::File>,
    indices: Vec<usize>,
}

impl Iterator for RowCursor {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(record) => Some(Ok(self
                .indices
                .iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect())),
            Err(e) => Some(Err(e.into())),
        }
    }
}

impl FeatureStore for CsvStore {
    type Cursor = RowCursor;

    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self, name: &str) -> bool {
        self.class_path(name).is_file()
    }

    fn create(&self, name: &str, fields: &[String]) -> Result<()> {
        self.write_class(name, fields, &[])
    }

    fn copy(&self, name: &str, dest: &Self, dest_name: &str) -> Result<()> {
        let src = self.require_class(name)?;
        fs::copy(src, dest.class_path(dest_name))?;
        Ok(())
    }

    fn append(&self, name: &str, dest: &Self, dest_name: &str) -> Result<()> {
        let (src_header, src_rows) = self.read_class(name)?;
        let (dest_header, _) = dest.read_class(dest_name)?;

        // Map source columns onto the destination's field order
        let mapping: Vec<Option<usize>> = dest_header
            .iter()
            .map(|field| src_header.iter().position(|f| f == field))
            .collect();

        let file = fs::OpenOptions::new()
            .append(true)
            .open(dest.class_path(dest_name))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        for row in &src_rows {
            let record: Vec<&str> = mapping
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i)).map_or("", |v| v.as_str()))
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush().map_err(NaisError::Io)?;

        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.require_class(name)?;
        fs::remove_file(path)?;
        Ok(())
    }

    fn describe(&self, name: &str) -> Result<FeatureClassInfo> {
        let (fields, rows) = self.read_class(name)?;
        Ok(FeatureClassInfo {
            name: name.to_string(),
            fields,
            count: rows.len(),
        })
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_fields(&self, name: &str) -> Result<Vec<String>> {
        let path = self.require_class(name)?;
        let mut reader = csv::Reader::from_path(path)?;
        Ok(reader.headers()?.iter().map(String::from).collect())
    }

    fn split_by_attribute(&self, name: &str, field: &str) -> Result<Vec<String>> {
        let (header, rows) = self.read_class(name)?;
        let key = Self::field_index(&header, name, field)?;

        // Group in first-seen order
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        for row in rows {
            let value = row.get(key).cloned().unwrap_or_default();
            if !groups.contains_key(&value) {
                order.push(value.clone());
            }
            groups.entry(value).or_default().push(row);
        }

        for value in &order {
            if let Some(group) = groups.get(value) {
                self.write_class(value, &header, group)?;
            }
        }

        debug!(class = name, classes = order.len(), "Split by {}", field);
        Ok(order)
    }

    fn add_xy(&self, name: &str) -> Result<()> {
        let (mut header, mut rows) = self.read_class(name)?;
        if header.iter().any(|f| f == POINT_X_FIELD) && header.iter().any(|f| f == POINT_Y_FIELD) {
            return Ok(());
        }

        let x = Self::field_index(&header, name, SHAPE_X_FIELD)?;
        let y = Self::field_index(&header, name, SHAPE_Y_FIELD)?;

        header.push(POINT_X_FIELD.to_string());
        header.push(POINT_Y_FIELD.to_string());
        for row in &mut rows {
            let px = row.get(x).cloned().unwrap_or_default();
            let py = row.get(y).cloned().unwrap_or_default();
            row.push(px);
            row.push(py);
        }

        self.write_class(name, &header, &rows)
    }

    fn count_within(&self, name: &str, region: &RegionPolygon) -> Result<usize> {
        let (header, rows) = self.read_class(name)?;
        let (x, y) = Self::xy_indices(&header, name)?;

        let mut count = 0;
        for row in &rows {
            let px = Self::parse_coord(name, row.get(x).map_or("", |v| v.as_str()))?;
            let py = Self::parse_coord(name, row.get(y).map_or("", |v| v.as_str()))?;
            if region.contains(px, py) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn copy_within(&self, name: &str, region: &RegionPolygon, dest_name: &str) -> Result<usize> {
        let (header, rows) = self.read_class(name)?;
        let (x, y) = Self::xy_indices(&header, name)?;

        let mut selected = Vec::new();
        for row in rows {
            let px = Self::parse_coord(name, row.get(x).map_or("", |v| v.as_str()))?;
            let py = Self::parse_coord(name, row.get(y).map_or("", |v| v.as_str()))?;
            if region.contains(px, py) {
                selected.push(row);
            }
        }

        let count = selected.len();
        self.write_class(dest_name, &header, &selected)?;
        Ok(count)
    }

    fn rows(&self, name: &str, fields: &[&str]) -> Result<Self::Cursor> {
        let path = self.require_class(name)?;
        let mut reader = csv::Reader::from_path(&path)?;

        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let indices = fields
            .iter()
            .map(|&field| Self::field_index(&header, name, field))
            .collect::<Result<Vec<_>>>()?;

        Ok(RowCursor {
            records: reader.into_records(),
            indices,
        })
    }
}
