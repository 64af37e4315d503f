//! Monthly preprocessing pass
//!
//! One work unit is (zone, year, month). The raw archive for the month is
//! downloaded and extracted, the store is copied so destructive stages never
//! touch the pristine download, the broadcast class is split per vessel
//! (MMSI), the derived position fields are added, and every vessel's records
//! are merged into the shared cross-month store for the (zone, year).
//!
//! Artifact lifecycle: the archive is deleted after extraction, the broadcast
//! class after splitting, and each per-month vessel class after it has been
//! merged, which is what makes re-running a month safe.

use crate::locator;
use crate::pipeline::{StageOutcome, StageReport};
use crate::status::has_stop_and_go;
use crate::store::{
    CsvStore, FeatureStore, MMSI_FIELD, POINT_X_FIELD, POINT_Y_FIELD, STATUS_FIELD,
};
use nais_common::error::Result;
use nais_common::{download, files};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// One month of raw data for a zone
#[derive(Debug)]
pub struct MonthRun {
    root: PathBuf,
    zone: String,
    year: String,
    month: String,

    /// `<root>/<year>/<month>/Zone <zone>`
    workspace: PathBuf,
    /// Pristine extracted store name
    gdb_raw: String,
    /// Working copy store name
    gdb_copy: String,
    /// Broadcast feature class name
    broadcast: String,

    /// Discard vessels without both stopped and moving records
    stop_and_go_only: bool,
    /// Test hook; the locator rule is used when unset
    source_url: Option<String>,
}

impl MonthRun {
    /// Create the work unit and its workspace directory.
    pub fn new(
        root: impl Into<PathBuf>,
        zone: impl Into<String>,
        year: impl Into<String>,
        month: impl Into<String>,
    ) -> Result<Self> {
        let root = root.into();
        let zone = zone.into();
        let year = year.into();
        let month = month.into();

        let parent = root.join(&year).join(&month);
        let workspace = files::create_folder(&parent, &format!("Zone {zone}"))?;

        let gdb_raw = format!("Zone{zone}_{year}_{month}.gdb");
        let gdb_copy = format!("Zone{zone}_{year}_{month}_MMSI.gdb");
        let broadcast = format!("Zone{zone}_{year}_{month}_Broadcast");

        Ok(Self {
            root,
            zone,
            year,
            month,
            workspace,
            gdb_raw,
            gdb_copy,
            broadcast,
            stop_and_go_only: false,
            source_url: None,
        })
    }

    /// Enable the per-year variant that keeps only vessels with observable
    /// stop/go behavior in the month.
    pub fn with_stop_and_go_filter(mut self) -> Self {
        self.stop_and_go_only = true;
        self
    }

    /// Override the source URL (tests).
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Run the month's stages in order, skipping completed ones.
    pub async fn preprocess_month(&self) -> Result<Vec<StageReport>> {
        info!(
            zone = %self.zone,
            year = %self.year,
            month = %self.month,
            "Preprocessing month in {}",
            self.workspace.display()
        );

        let mut reports = vec![
            StageReport::new("download", self.download_raw_data().await?),
            StageReport::new("copy", self.copy_raw_data()?),
            StageReport::new("split", self.split_by_mmsi()?),
        ];

        let store = CsvStore::open(self.workspace.join(&self.gdb_copy))?;

        if self.stop_and_go_only {
            reports.push(StageReport::new(
                "stop-go-filter",
                self.filter_stop_and_go(&store)?,
            ));
        }
        reports.push(StageReport::new("enrich", self.enrich(&store)?));
        reports.push(StageReport::new("aggregate", self.aggregate(&store)?));

        for report in &reports {
            info!("{report}");
        }
        Ok(reports)
    }

    /// Download the month's archive and extract it into the workspace.
    ///
    /// The extracted raw store is the completion artifact; the archive itself
    /// is deleted once extraction succeeds.
    async fn download_raw_data(&self) -> Result<StageOutcome> {
        if self.workspace.join(&self.gdb_raw).exists() {
            info!("Data already downloaded for {}", self.month);
            return Ok(StageOutcome::Skipped);
        }

        let url = match &self.source_url {
            Some(url) => url.clone(),
            None => locator::source_url(&self.zone, &self.year, &self.month)?,
        };

        info!("Downloading data from {url}");
        let archive = download::download_url(&url, &self.workspace, ".zip").await?;

        info!("Extracting files from {}", archive.display());
        files::extract_zip(&archive, &self.workspace)?;
        fs::remove_file(&archive)?;

        Ok(StageOutcome::Completed)
    }

    /// Duplicate the raw store so destructive stages work on a copy.
    fn copy_raw_data(&self) -> Result<StageOutcome> {
        let copy = self.workspace.join(&self.gdb_copy);
        if copy.exists() {
            info!("Copy of raw store already exists: {}", self.gdb_copy);
            return Ok(StageOutcome::Skipped);
        }

        info!("Making copy of raw store: {}", self.gdb_copy);
        let raw = CsvStore::open(self.workspace.join(&self.gdb_raw))?;
        raw.duplicate(copy)?;
        Ok(StageOutcome::Completed)
    }

    /// Split the broadcast class by MMSI, then delete it.
    ///
    /// A missing broadcast class means the split already ran; this is what
    /// prevents the split from running twice. Past this point the month can
    /// only be re-derived by re-copying the raw store.
    fn split_by_mmsi(&self) -> Result<StageOutcome> {
        let store = CsvStore::open(self.workspace.join(&self.gdb_copy))?;
        if !store.exists(&self.broadcast) {
            info!("{} already split by MMSI", self.broadcast);
            return Ok(StageOutcome::Skipped);
        }

        info!("Splitting {} by MMSI...", self.broadcast);
        let classes = store.split_by_attribute(&self.broadcast, MMSI_FIELD)?;
        info!("Split into {} vessel classes", classes.len());

        info!("Deleting input broadcast class {}", self.broadcast);
        store.delete(&self.broadcast)?;
        Ok(StageOutcome::Completed)
    }

    /// Delete vessel classes that never show both a stopped and a moving
    /// navigational status in this month.
    fn filter_stop_and_go(&self, store: &CsvStore) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::Skipped;

        for class in store.list()? {
            let cursor = store.rows(&class, &[STATUS_FIELD])?;

            let mut scan_error = None;
            let statuses = cursor
                .map_while(|row| match row {
                    Ok(values) => Some(values.first().and_then(|v| v.parse::<i32>().ok())),
                    Err(e) => {
                        scan_error = Some(e);
                        None
                    },
                })
                .flatten();
            let keep = has_stop_and_go(statuses);
            if let Some(e) = scan_error {
                return Err(e);
            }

            if !keep {
                info!("Deleting {} (no stop/go behavior)", class);
                store.delete(&class)?;
                outcome = StageOutcome::Completed;
            }
        }

        Ok(outcome)
    }

    /// Add the derived position fields to every vessel class.
    fn enrich(&self, store: &CsvStore) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::Skipped;

        for class in store.list()? {
            let fields = store.list_fields(&class)?;
            if fields.iter().any(|f| f == POINT_X_FIELD) && fields.iter().any(|f| f == POINT_Y_FIELD)
            {
                info!("XY fields have already been added to {}", class);
                continue;
            }

            info!("Adding XY fields to {}", class);
            store.add_xy(&class)?;
            outcome = StageOutcome::Completed;
        }

        Ok(outcome)
    }

    /// Merge every vessel class into the shared cross-month store, then
    /// delete the per-month class to prevent double-appending on re-run.
    fn aggregate(&self, store: &CsvStore) -> Result<StageOutcome> {
        let shared = self.mmsi_store()?;
        let mut outcome = StageOutcome::Skipped;

        for class in store.list()? {
            let info = store.describe(&class)?;

            if shared.exists(&info.name) {
                info!("Appending {} ({} records)...", info.name, info.count);
                store.append(&class, &shared, &info.name)?;
            } else {
                info!("Copying {} ({} records)...", info.name, info.count);
                store.copy(&class, &shared, &info.name)?;
            }

            info!("Deleting month class for {}...", info.name);
            store.delete(&class)?;
            outcome = StageOutcome::Completed;
        }

        Ok(outcome)
    }

    /// Open the shared cross-month store, creating it on first use.
    fn mmsi_store(&self) -> Result<CsvStore> {
        let folder = files::create_folder(&self.root.join(&self.year), "MMSI")?;
        let name = format!("Zone{}_{}_MMSI.gdb", self.zone, self.year);
        CsvStore::open_or_create(folder.join(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pipeline::StageOutcome::{Completed, Skipped};
    use std::io::Write;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BROADCAST_CSV: &str = "\
MMSI,Status,SHAPE_X,SHAPE_Y
100,0,-122.5,47.6
200,1,-123.0,48.0
100,5,-122.6,47.7
";

    /// Zip a raw store holding one broadcast class, as the portal ships it.
    fn raw_archive(zone: &str, year: &str, month: &str) -> Vec<u8> {
        let gdb = format!("Zone{zone}_{year}_{month}.gdb");
        let class = format!("Zone{zone}_{year}_{month}_Broadcast");

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file(
                format!("{gdb}/{class}.csv"),
                zip::write::FileOptions::default(),
            )
            .unwrap();
        writer.write_all(BROADCAST_CSV.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    async fn archive_server(zone: &str, year: &str, month: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/Zone{zone}_{year}_{month}.zip")))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(raw_archive(zone, year, month)),
            )
            .mount(&server)
            .await;
        server
    }

    fn shared_store(root: &Path) -> CsvStore {
        CsvStore::open(root.join("2014/MMSI/Zone10_2014_MMSI.gdb")).unwrap()
    }

    #[tokio::test]
    async fn test_preprocess_month_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let server = archive_server("10", "2014", "01").await;

        let run = MonthRun::new(&root, "10", "2014", "01")
            .unwrap()
            .with_source_url(format!("{}/Zone10_2014_01.zip", server.uri()));

        let reports = run.preprocess_month().await.unwrap();
        assert!(reports.iter().all(|r| r.outcome == Completed));

        // Vessel records landed in the shared store, enriched with XY fields
        let shared = shared_store(&root);
        assert_eq!(shared.list().unwrap(), vec!["100", "200"]);
        assert_eq!(shared.describe("100").unwrap().count, 2);
        let fields = shared.list_fields("100").unwrap();
        assert!(fields.contains(&POINT_X_FIELD.to_string()));

        // The pristine raw store still holds the broadcast class
        let raw = CsvStore::open(root.join("2014/01/Zone 10/Zone10_2014_01.gdb")).unwrap();
        assert!(raw.exists("Zone10_2014_01_Broadcast"));

        // The working copy was drained by the aggregate stage
        let copy = CsvStore::open(root.join("2014/01/Zone 10/Zone10_2014_01_MMSI.gdb")).unwrap();
        assert!(copy.list().unwrap().is_empty());

        // The downloaded archive was deleted after extraction
        assert!(!root.join("2014/01/Zone 10/temp_data.zip").exists());
    }

    #[tokio::test]
    async fn test_second_invocation_skips_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let server = archive_server("10", "2014", "01").await;
        let url = format!("{}/Zone10_2014_01.zip", server.uri());

        let run = MonthRun::new(&root, "10", "2014", "01")
            .unwrap()
            .with_source_url(&url);
        run.preprocess_month().await.unwrap();

        let counts_before = shared_store(&root).describe("100").unwrap().count;

        let rerun = MonthRun::new(&root, "10", "2014", "01")
            .unwrap()
            .with_source_url(&url);
        let reports = rerun.preprocess_month().await.unwrap();

        assert!(reports.iter().all(|r| r.outcome == Skipped), "{reports:?}");
        assert_eq!(shared_store(&root).describe("100").unwrap().count, counts_before);
    }

    #[tokio::test]
    async fn test_stop_and_go_variant_discards_one_sided_vessels() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let server = archive_server("10", "2014", "01").await;

        let run = MonthRun::new(&root, "10", "2014", "01")
            .unwrap()
            .with_source_url(format!("{}/Zone10_2014_01.zip", server.uri()))
            .with_stop_and_go_filter();

        run.preprocess_month().await.unwrap();

        // Vessel 100 saw statuses {0, 5}; vessel 200 only {1}
        let shared = shared_store(&root);
        assert_eq!(shared.list().unwrap(), vec!["100"]);
    }

    #[tokio::test]
    async fn test_resumes_after_partial_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let server = archive_server("10", "2014", "01").await;
        let url = format!("{}/Zone10_2014_01.zip", server.uri());

        // Simulate an interruption right after the download stage
        let run = MonthRun::new(&root, "10", "2014", "01")
            .unwrap()
            .with_source_url(&url);
        run.download_raw_data().await.unwrap();

        // Resume picks up from copy
        let resume = MonthRun::new(&root, "10", "2014", "01")
            .unwrap()
            .with_source_url(&url);
        let reports = resume.preprocess_month().await.unwrap();

        assert_eq!(reports[0].outcome, Skipped); // download
        assert_eq!(reports[1].outcome, Completed); // copy
        assert_eq!(reports[2].outcome, Completed); // split
        assert_eq!(shared_store(&root).describe("100").unwrap().count, 2);
    }
}
