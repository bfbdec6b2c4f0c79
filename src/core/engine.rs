use crate::core::dashboard::{build_dashboard, DashboardReport, DashboardRequest};
use crate::core::export::{bundle_zip, render_files};
use crate::core::loader::{load_table, InputFormat};
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::Table;
use crate::utils::error::Result;
use std::path::Path;

/// Outcome of one end-to-end run.
#[derive(Debug, Clone)]
pub struct DashboardRun {
    pub report: DashboardReport,
    pub outputs: Vec<String>,
}

/// Load → aggregate → export for a single request.
pub struct DashboardEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> DashboardEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn request(&self) -> DashboardRequest {
        DashboardRequest {
            category: self.config.category(),
            age_histogram: self.config.age_histogram(),
        }
    }

    pub async fn load(&self) -> Result<Table> {
        let path = self.config.input_path();
        let format = InputFormat::from_path(path)?;
        tracing::debug!("Reading {:?} input from: {}", format, path);

        let bytes = self.storage.read_file(path).await?;
        load_table(&bytes, format)
    }

    pub fn build(&self, table: &Table) -> DashboardReport {
        build_dashboard(table, &self.request())
    }

    /// Writes the report and returns the paths written.
    pub async fn export(&self, report: &DashboardReport) -> Result<Vec<String>> {
        let files = render_files(report, self.config.output_formats())?;
        let output_dir = Path::new(self.config.output_path());

        if self.config.compress() {
            let archive = bundle_zip(&files)?;
            let path = output_dir
                .join(self.config.archive_name())
                .to_string_lossy()
                .into_owned();
            tracing::debug!(
                "Writing ZIP file with {} files ({} bytes) to {}",
                files.len(),
                archive.len(),
                path
            );
            self.storage.write_file(&path, &archive).await?;
            return Ok(vec![path]);
        }

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let path = output_dir.join(&file.name).to_string_lossy().into_owned();
            tracing::debug!("Writing {} ({} bytes)", path, file.contents.len());
            self.storage.write_file(&path, &file.contents).await?;
            written.push(path);
        }
        Ok(written)
    }

    pub async fn run(&self) -> Result<DashboardRun> {
        tracing::info!("📥 Loading table from {}", self.config.input_path());
        let table = self.load().await?;
        tracing::info!(
            "📥 Loaded {} rows, {} columns",
            table.row_count(),
            table.column_names().len()
        );

        tracing::info!("🧮 Building {} dashboard", self.config.category());
        let report = self.build(&table);

        tracing::info!("💾 Exporting to {}", self.config.output_path());
        let outputs = self.export(&report).await?;
        tracing::info!("💾 Wrote {} file(s)", outputs.len());

        Ok(DashboardRun { report, outputs })
    }
}
