use async_trait::async_trait;
use futures::stream;

use crate::errors::SessionResult;
use crate::session::envelope::QueryPage;
use crate::session::RecordStream;
use crate::types::Record;

/// Fetches the page that follows a query locator
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn next_page(&self, locator: &str) -> SessionResult<QueryPage>;
}

/// Rows of `first` and of every following page, in delivery order.
///
/// The next page is requested only once the current one is drained. A failed
/// fetch is yielded as the last item of the stream.
pub fn record_stream<'a, P: PageSource + ?Sized>(
    source: &'a P,
    first: QueryPage,
) -> RecordStream<'a> {
    Box::pin(stream::try_unfold(first, move |page| next_record(source, page)))
}

async fn next_record<P: PageSource + ?Sized>(
    source: &P,
    mut page: QueryPage,
) -> SessionResult<Option<(Record, QueryPage)>> {
    loop {
        if let Some(record) = page.records.pop_front() {
            return Ok(Some((record, page)));
        }
        match page.locator.take() {
            Some(locator) => page = source.next_page(&locator).await?,
            None => return Ok(None),
        }
    }
}
