//! Per-year aggregation pass
//!
//! One work unit is (zone, year). The pass acquires the World EEZ reference
//! dataset (a one-time, interactive step), derives the US EEZ polygon from
//! it, filters every vessel's cross-month records to points within the US
//! EEZ, and exports the surviving classes to CSV tables.
//!
//! Known limitation: the select-eez stage deletes each original class after
//! testing it, whether or not a filtered copy was persisted, so it is not
//! safely re-runnable if interrupted mid-class. A vessel with a nonzero but
//! below-threshold number of EEZ points loses its data entirely; this
//! preserves the observed upstream behavior and is flagged for product-owner
//! confirmation rather than silently changed.

use crate::pipeline::prompt::ConfirmPrompt;
use crate::pipeline::{StageOutcome, StageReport};
use crate::region::{RegionDataset, RegionPolygon};
use crate::store::{CsvStore, FeatureStore, EXPORT_FIELDS};
use nais_common::error::{NaisError, Result};
use nais_common::files;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Download page for the World EEZ reference dataset.
const EEZ_DOWNLOAD_URL: &str =
    "http://www.marineregions.org/download_file.php?name=World_EEZ_v10_20180221.zip";

/// Shared reference region folder under the data root.
const WORLD_EEZ_DIR: &str = "World EEZ";

/// World EEZ dataset file name within the reference folder.
const WORLD_EEZ_FILE: &str = "eez_v10.geojson";

/// Derived US EEZ file name within the reference folder.
const US_EEZ_FILE: &str = "eez_us.geojson";

/// Attribute value identifying the US EEZ feature in the world dataset.
const US_EEZ_GEONAME: &str = "United States Exclusive Economic Zone";

/// File name pattern of the manually downloaded archive.
const EEZ_ARCHIVE_PATTERN: &str = "World_EEZ";

/// A filtered class is persisted only when more than this many records lie
/// within the EEZ.
const EEZ_POINT_THRESHOLD: usize = 2;

/// The cross-month records of one (zone, year)
#[derive(Debug)]
pub struct MmsiRun {
    root: PathBuf,
    zone: String,
    year: String,

    /// Browser downloads directory searched for the manual EEZ archive
    downloads_dir: PathBuf,
    /// `<root>/<year>/MMSI`
    workspace: PathBuf,
    /// Cross-month store name
    gdb_mmsi: String,
}

impl MmsiRun {
    pub fn new(
        root: impl Into<PathBuf>,
        zone: impl Into<String>,
        year: impl Into<String>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let root = root.into();
        let zone = zone.into();
        let year = year.into();

        let workspace = root.join(&year).join("MMSI");
        let gdb_mmsi = format!("Zone{zone}_{year}_MMSI.gdb");

        Ok(Self {
            root,
            zone,
            year,
            downloads_dir: downloads_dir.into(),
            workspace,
            gdb_mmsi,
        })
    }

    /// Run the year's stages in order, skipping completed ones.
    pub fn preprocess_mmsi(&self, prompt: &dyn ConfirmPrompt) -> Result<Vec<StageReport>> {
        info!(
            zone = %self.zone,
            year = %self.year,
            "Preprocessing cross-month records in {}",
            self.workspace.display()
        );

        let acquired = self.acquire_eez(prompt)?;
        let mut reports = vec![StageReport::new("acquire-eez", acquired)];

        if acquired == StageOutcome::Cancelled {
            warn!("World EEZ acquisition declined; the remaining stages were not run");
            for report in &reports {
                info!("{report}");
            }
            return Ok(reports);
        }

        reports.push(StageReport::new("make-eez-us", self.make_eez_us()?));

        let region = RegionPolygon::load(&self.eez_dir().join(US_EEZ_FILE))?;
        let store = CsvStore::open(self.workspace.join(&self.gdb_mmsi))?;

        reports.push(StageReport::new(
            "select-eez",
            self.select_eez(&store, &region)?,
        ));
        reports.push(StageReport::new("export", self.export(&store)?));

        for report in &reports {
            info!("{report}");
        }
        Ok(reports)
    }

    fn eez_dir(&self) -> PathBuf {
        self.root.join(WORLD_EEZ_DIR)
    }

    /// Acquire the World EEZ dataset.
    ///
    /// The dataset sits behind a registration form, so it cannot be fetched
    /// directly: the user confirms, the download page opens in the browser,
    /// and the archive is then picked up from the downloads directory and
    /// extracted. Declining either confirmation yields a cancelled outcome;
    /// the caller stops the pass there and re-invocation re-prompts.
    fn acquire_eez(&self, prompt: &dyn ConfirmPrompt) -> Result<StageOutcome> {
        let folder = files::create_folder(&self.root, WORLD_EEZ_DIR)?;
        if folder.join(WORLD_EEZ_FILE).exists() {
            return Ok(StageOutcome::Skipped);
        }

        if !prompt.confirm(
            "Please download the World EEZ file",
            "Open the Marine Regions download page in your browser?",
        )? {
            info!("World EEZ download declined");
            return Ok(StageOutcome::Cancelled);
        }

        if let Err(e) = open::that(EEZ_DOWNLOAD_URL) {
            warn!("Could not open a browser ({e}); download manually from {EEZ_DOWNLOAD_URL}");
        }

        let message = format!("Extract the downloaded archive to '{}'?", folder.display());
        if !prompt.confirm("Extract World EEZ", &message)? {
            info!("World EEZ extraction declined");
            return Ok(StageOutcome::Cancelled);
        }

        let archive = files::find_file(&self.downloads_dir, EEZ_ARCHIVE_PATTERN)?;
        info!("Extracting files from {}", archive.display());
        files::extract_zip(&archive, &folder)?;
        fs::remove_file(&archive)?;

        Ok(StageOutcome::Completed)
    }

    /// Select the US EEZ feature from the world dataset and persist it.
    fn make_eez_us(&self) -> Result<StageOutcome> {
        let us_path = self.eez_dir().join(US_EEZ_FILE);
        if us_path.exists() {
            return Ok(StageOutcome::Skipped);
        }

        info!("Selecting '{US_EEZ_GEONAME}' from the world dataset...");
        let world = RegionDataset::load(&self.eez_dir().join(WORLD_EEZ_FILE))?;
        let feature = world.select_by_attribute("GeoName", US_EEZ_GEONAME)?;
        RegionDataset::save_feature(feature, &us_path)?;

        Ok(StageOutcome::Completed)
    }

    /// Filter every vessel class to points within the US EEZ.
    ///
    /// The original class is deleted in all cases once tested; see the module
    /// docs for the data-loss caveat this preserves.
    fn select_eez(&self, store: &CsvStore, region: &RegionPolygon) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::Skipped;

        for class in store.list()? {
            if class.contains("_eez") {
                continue;
            }

            let filtered = format!("{class}_eez");
            if store.exists(&filtered) {
                continue;
            }

            info!("Selecting points within the EEZ for {}...", class);
            let count = store.count_within(&class, region)?;
            if count > EEZ_POINT_THRESHOLD {
                info!("Saving {} EEZ points as {}", count, filtered);
                store.copy_within(&class, region, &filtered)?;
            } else if count > 0 {
                warn!(
                    "Discarding {} with {} EEZ points (at or below threshold {})",
                    class, count, EEZ_POINT_THRESHOLD
                );
            }

            info!("Deleting original class {}", class);
            store.delete(&class)?;
            outcome = StageOutcome::Completed;
        }

        Ok(outcome)
    }

    /// Export every surviving class to a CSV table under `<root>/<year>/`.
    fn export(&self, store: &CsvStore) -> Result<StageOutcome> {
        let out_dir = files::create_folder(&self.root, &self.year)?;
        let mut outcome = StageOutcome::Skipped;

        for class in store.list()? {
            let out_file = out_dir.join(format!("{class}.csv"));
            if out_file.exists() {
                continue;
            }

            info!("Writing {} to {}", class, out_file.display());
            let mut writer = csv::Writer::from_path(&out_file)?;
            writer.write_record(EXPORT_FIELDS)?;
            for row in store.rows(&class, &EXPORT_FIELDS)? {
                writer.write_record(&row?)?;
            }
            writer.flush().map_err(NaisError::Io)?;
            outcome = StageOutcome::Completed;
        }

        Ok(outcome)
    }
}
