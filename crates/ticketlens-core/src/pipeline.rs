//! Ingestion entry point: bytes in, [`Dataset`] out.

use tracing::{info, instrument};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::reader::TableReader;
use crate::records::Normalizer;
use crate::types::Dataset;

/// Reader and normalizer bundled for one-call ingestion.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    reader: TableReader,
    normalizer: Normalizer,
}

impl Pipeline {
    pub fn new(reader: TableReader, normalizer: Normalizer) -> Self {
        Self { reader, normalizer }
    }

    /// Pipeline using the configured sniff window and the local clock.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            TableReader::new().with_sniff_bytes(config.sniff_bytes),
            Normalizer::default(),
        )
    }

    /// Read and normalise one upload.
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn ingest(&self, bytes: &[u8]) -> Result<Dataset, IngestError> {
        let table = self.reader.read(bytes)?;
        let dataset = self.normalizer.normalize(&table);
        info!(
            tickets = dataset.len(),
            delimiter = %dataset.source().delimiter.escape_default(),
            encoding = %dataset.source().encoding,
            "ingested upload"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateNormalizer;
    use chrono::NaiveDate;

    #[test]
    fn ingest_propagates_reader_errors() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.ingest(b"").unwrap_err(), IngestError::Empty);
        assert_eq!(
            pipeline.ingest(b"ID;Estado\n").unwrap_err(),
            IngestError::Empty
        );
    }

    #[test]
    fn configured_pipeline_accepts_dates_after_construction() {
        let pipeline = Pipeline::from_config(&crate::config::IngestConfig::default());
        std::thread::sleep(std::time::Duration::from_millis(1100));

        let opened = chrono::Local::now().naive_local() - chrono::Duration::seconds(1);
        let csv = format!("ID;Fecha\n1;{}\n", opened.format("%d-%m-%Y %H:%M:%S"));
        let ds = pipeline.ingest(csv.as_bytes()).unwrap();

        assert_eq!(
            ds.records()[0].date.map(|d| d.format("%d-%m-%Y %H:%M:%S").to_string()),
            Some(opened.format("%d-%m-%Y %H:%M:%S").to_string())
        );
    }

    #[test]
    fn ingest_builds_dataset() {
        let now = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let pipeline = Pipeline::new(TableReader::new(), Normalizer::new(DateNormalizer::new(now)));
        let ds = pipeline
            .ingest("ID|Estado|Fecha\n1|Nuevo|2024-01-05\n".as_bytes())
            .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.source().delimiter, '|');
        assert_eq!(ds.records()[0].year_month().as_deref(), Some("2024-01"));
    }
}
