//! Geodatabase-style feature storage
//!
//! The original toolchain kept feature classes in an ambient "current
//! workspace" that every call implicitly used. Here the store is an explicit
//! value passed to every stage operation, and the toolkit surface is the
//! [`FeatureStore`] trait: named feature classes that can be created, copied,
//! appended, deleted, listed, described, spatially filtered, and iterated as
//! attribute rows.
//!
//! The shipped binding is [`csv::CsvStore`], which lays a store out as a
//! directory of CSV files. Binding the trait to a real geodatabase engine is
//! a drop-in replacement for it.

pub mod csv;

use crate::region::RegionPolygon;
use nais_common::error::Result;
use std::path::Path;

pub use csv::CsvStore;

// ============================================================================
// Field name constants
// ============================================================================

/// Key field used to partition broadcast records per vessel.
pub const MMSI_FIELD: &str = "MMSI";

/// Navigational status field.
pub const STATUS_FIELD: &str = "Status";

/// Geometry columns carried by raw broadcast records.
pub const SHAPE_X_FIELD: &str = "SHAPE_X";
/// See [`SHAPE_X_FIELD`].
pub const SHAPE_Y_FIELD: &str = "SHAPE_Y";

/// Derived position fields added by the enrich stage.
pub const POINT_X_FIELD: &str = "POINT_X";
/// See [`POINT_X_FIELD`].
pub const POINT_Y_FIELD: &str = "POINT_Y";

/// Ordered column set of the exported tables.
pub const EXPORT_FIELDS: [&str; 11] = [
    "SOG",
    "COG",
    "Heading",
    "ROT",
    "BaseDateTime",
    "Status",
    "VoyageID",
    "MMSI",
    "ReceiverType",
    "POINT_X",
    "POINT_Y",
];

// ============================================================================
// Feature store interface
// ============================================================================

/// Summary of a feature class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureClassInfo {
    /// Class name within the store
    pub name: String,
    /// Attribute field names, in storage order
    pub fields: Vec<String>,
    /// Number of records
    pub count: usize,
}

/// A geodatabase-style store of named feature classes.
///
/// All operations address classes by name; nothing here relies on ambient
/// state. `copy` and `append` move records between stores of the same
/// binding, which is how the monthly working copy feeds the shared
/// cross-month store.
pub trait FeatureStore {
    /// Lazy row cursor returned by [`FeatureStore::rows`]
    type Cursor: Iterator<Item = Result<Vec<String>>>;

    /// Location of the store on disk
    fn path(&self) -> &Path;

    /// Whether a class with this name exists
    fn exists(&self, name: &str) -> bool;

    /// Create an empty class with the given fields
    fn create(&self, name: &str, fields: &[String]) -> Result<()>;

    /// Copy a class into `dest` under `dest_name`, replacing any existing class
    fn copy(&self, name: &str, dest: &Self, dest_name: &str) -> Result<()>
    where
        Self: Sized;

    /// Append a class's records to an existing class in `dest`
    ///
    /// Records are reordered to the destination's field order; source fields
    /// the destination lacks are dropped, missing ones are left empty.
    fn append(&self, name: &str, dest: &Self, dest_name: &str) -> Result<()>
    where
        Self: Sized;

    /// Delete a class
    fn delete(&self, name: &str) -> Result<()>;

    /// Describe a class (name, fields, record count)
    fn describe(&self, name: &str) -> Result<FeatureClassInfo>;

    /// List the class names in this store, sorted
    fn list(&self) -> Result<Vec<String>>;

    /// List a class's attribute field names
    fn list_fields(&self, name: &str) -> Result<Vec<String>>;

    /// Partition a class into one class per distinct value of `field`,
    /// named by the value; returns the new class names
    fn split_by_attribute(&self, name: &str, field: &str) -> Result<Vec<String>>;

    /// Materialize the geometry columns as `POINT_X` / `POINT_Y` attribute
    /// fields; a no-op when both fields are already present
    fn add_xy(&self, name: &str) -> Result<()>;

    /// Count the records whose position lies within the region polygon
    fn count_within(&self, name: &str, region: &RegionPolygon) -> Result<usize>;

    /// Persist the records within the region polygon as a new class named
    /// `dest_name`; returns the number of records written
    fn copy_within(&self, name: &str, region: &RegionPolygon, dest_name: &str) -> Result<usize>;

    /// Attribute cursor over the named fields, in the given order
    fn rows(&self, name: &str, fields: &[&str]) -> Result<Self::Cursor>;
}
