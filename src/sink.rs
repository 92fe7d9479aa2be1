//! Result sinks for streamed output.
//!
//! In streamed mode every result is handed to a sink as soon as the
//! search finds it. Sinks are shared across roots mined in parallel, so
//! they take `&self` and guard their state with a mutex.

use std::io::Write;

use parking_lot::Mutex;

use crate::io::report::{ActivityMap, ReportFormat, ReportWriter};
use crate::types::MiningResult;

/// Destination for streamed results.
pub trait ResultSink: Send + Sync {
    /// Accept one result.
    fn accept(&self, result: &MiningResult) -> std::io::Result<()>;

    /// Flush buffered output.
    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink that renders results through a [`ReportWriter`].
pub struct WriterSink<W: Write + Send> {
    inner: Mutex<ReportWriter<W>>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Render into `writer` in `format`, splitting supports by `activities`.
    pub fn new(writer: W, format: ReportFormat, activities: ActivityMap) -> Self {
        Self {
            inner: Mutex::new(ReportWriter::new(writer, format, activities)),
        }
    }

    /// Number of results rendered so far.
    pub fn written(&self) -> usize {
        self.inner.lock().written()
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().into_inner()
    }
}

impl<W: Write + Send> ResultSink for WriterSink<W> {
    fn accept(&self, result: &MiningResult) -> std::io::Result<()> {
        self.inner.lock().write_result(result)
    }

    fn flush(&self) -> std::io::Result<()> {
        self.inner.lock().flush()
    }
}

/// Sink that keeps results in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    results: Mutex<Vec<MiningResult>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of results received so far.
    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    /// Whether nothing was received.
    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    /// Take the received results, leaving the sink empty.
    pub fn take(&self) -> Vec<MiningResult> {
        std::mem::take(&mut *self.results.lock())
    }
}

impl ResultSink for CollectingSink {
    fn accept(&self, result: &MiningResult) -> std::io::Result<()> {
        self.results.lock().push(result.clone());
        Ok(())
    }
}
