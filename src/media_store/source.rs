use std::collections::VecDeque;
use std::convert::Infallible;

use super::{AttachmentId, AttachmentRecord, MediaDatabase, MediaStoreError};

/// Paginated access to attachment records.
///
/// Pages are keyed on ascending attachment id: a call returns up to `limit`
/// records whose id is strictly greater than `after`. Ids are unique.
pub trait AttachmentSource {
    type Error: std::error::Error;

    fn fetch_page(
        &self,
        after: Option<AttachmentId>,
        limit: usize,
    ) -> Result<Vec<AttachmentRecord>, Self::Error>;
}

impl AttachmentSource for MediaDatabase {
    type Error = MediaStoreError;

    fn fetch_page(
        &self,
        after: Option<AttachmentId>,
        limit: usize,
    ) -> Result<Vec<AttachmentRecord>, Self::Error> {
        self.attachments_after(after, limit)
    }
}

/// In-memory attachment records kept in ascending id order.
///
/// Sorted once on construction; later duplicates of an id are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentList {
    records: Vec<AttachmentRecord>,
}

impl AttachmentList {
    pub fn as_slice(&self) -> &[AttachmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<AttachmentRecord>> for AttachmentList {
    fn from(mut records: Vec<AttachmentRecord>) -> Self {
        records.sort_by_key(|record| record.id);
        records.dedup_by_key(|record| record.id);
        Self { records }
    }
}

impl FromIterator<AttachmentRecord> for AttachmentList {
    fn from_iter<I: IntoIterator<Item = AttachmentRecord>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl AttachmentSource for AttachmentList {
    type Error = Infallible;

    fn fetch_page(
        &self,
        after: Option<AttachmentId>,
        limit: usize,
    ) -> Result<Vec<AttachmentRecord>, Self::Error> {
        let start = match after {
            Some(after) => self.records.partition_point(|record| record.id <= after),
            None => 0,
        };
        let end = start.saturating_add(limit).min(self.records.len());
        Ok(self.records[start..end].to_vec())
    }
}

/// Lazy record stream over an [`AttachmentSource`], one page in memory at a time.
///
/// Yields every record once in id order. A fetch error is yielded once and
/// ends the stream. Call [`AttachmentPages::restart`] to enumerate again.
pub struct AttachmentPages<'a, S: AttachmentSource + ?Sized> {
    source: &'a S,
    page_size: usize,
    cursor: Option<AttachmentId>,
    buffer: VecDeque<AttachmentRecord>,
    pages_fetched: usize,
    finished: bool,
}

impl<'a, S: AttachmentSource + ?Sized> AttachmentPages<'a, S> {
    pub fn new(source: &'a S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            cursor: None,
            buffer: VecDeque::new(),
            pages_fetched: 0,
            finished: false,
        }
    }

    /// Rewind to the first record.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.buffer.clear();
        self.pages_fetched = 0;
        self.finished = false;
    }

    /// Number of pages pulled from the source so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn refill(&mut self) -> Result<(), S::Error> {
        let page = self.source.fetch_page(self.cursor, self.page_size)?;
        self.pages_fetched += 1;
        tracing::debug!(
            page = self.pages_fetched,
            records = page.len(),
            "Fetched attachment page"
        );
        if page.len() < self.page_size {
            self.finished = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some(last.id);
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl<S: AttachmentSource + ?Sized> Iterator for AttachmentPages<'_, S> {
    type Item = Result<AttachmentRecord, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.finished {
            if let Err(err) = self.refill() {
                self.finished = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
