//! Boundaries to the services around the compiler: row fetching and chart
//! persistence. The in-memory implementations back tests and previews that
//! already hold their rows.

use std::cell::RefCell;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::Row;
use crate::error::{ChartError, ChartResult};

use super::ChartDocument;

/// Supplies rows for a dataset (or dataset preview) identifier.
pub trait RowSource {
    fn fetch_rows(&self, dataset_id: &str) -> ChartResult<Vec<Row>>;
}

/// Stores and loads chart documents by id.
pub trait ChartStore {
    fn save(&self, chart_id: &str, document: &ChartDocument) -> ChartResult<()>;
    fn load(&self, chart_id: &str) -> ChartResult<ChartDocument>;
}

/// Row source over a fixed set of datasets.
#[derive(Debug, Clone, Default)]
pub struct StaticRowSource {
    datasets: IndexMap<String, Vec<Row>>,
}

impl StaticRowSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset_id: impl Into<String>, rows: Vec<Row>) -> Self {
        self.datasets.insert(dataset_id.into(), rows);
        self
    }
}

impl RowSource for StaticRowSource {
    fn fetch_rows(&self, dataset_id: &str) -> ChartResult<Vec<Row>> {
        self.datasets
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| ChartError::RowSource(format!("unknown dataset `{dataset_id}`")))
    }
}

/// Chart store keeping documents in stored (templated) form in memory.
#[derive(Debug, Default)]
pub struct MemoryChartStore {
    documents: RefCell<IndexMap<String, ChartDocument>>,
}

impl MemoryChartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }
}

impl ChartStore for MemoryChartStore {
    fn save(&self, chart_id: &str, document: &ChartDocument) -> ChartResult<()> {
        let stored = document.for_storage();
        debug!(chart_id, templated = stored.is_templated(), "storing chart document");
        self.documents
            .borrow_mut()
            .insert(chart_id.to_owned(), stored);
        Ok(())
    }

    fn load(&self, chart_id: &str) -> ChartResult<ChartDocument> {
        self.documents
            .borrow()
            .get(chart_id)
            .cloned()
            .ok_or_else(|| ChartError::Store(format!("unknown chart `{chart_id}`")))
    }
}
