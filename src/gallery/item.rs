use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    api::{ApiTag, ImageDetail, ImageId, ImageRecord},
    error::FetchError,
    service::FetchService,
};

/// Identifies one detail load so a late result can be matched to the load that
/// produced it.
pub type LoadTicket = u64;

#[derive(Debug)]
struct InFlightLoad {
    ticket: LoadTicket,
    token: CancellationToken,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applied,
    /// The item was already initialized; the result was dropped.
    AlreadyInitialized,
    Cancelled,
    /// The result belongs to a load that was superseded or never started here.
    Stale,
    Failed(FetchError),
}

/// One image as the gallery presents it: the record plus detail data that is
/// fetched the first time the image becomes current.
#[derive(Debug)]
pub struct PresentationItem {
    record: ImageRecord,
    detail: Option<ImageDetail>,
    in_flight: Option<InFlightLoad>,
    synthesized: bool,
}

impl PresentationItem {
    pub fn new(record: ImageRecord) -> Self {
        Self {
            record,
            detail: None,
            in_flight: None,
            synthesized: false,
        }
    }

    /// An item built from a navigation target rather than from the feed.
    pub fn synthesized(record: ImageRecord) -> Self {
        let mut item = Self::new(record);
        item.synthesized = true;
        item
    }

    pub fn record(&self) -> &ImageRecord {
        &self.record
    }

    pub fn id(&self) -> ImageId {
        self.record.id()
    }

    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    pub fn is_initialized(&self) -> bool {
        self.detail.is_some()
    }

    pub fn detail(&self) -> Option<&ImageDetail> {
        self.detail.as_ref()
    }

    pub fn tags(&self) -> &[ApiTag] {
        self.detail.as_ref().map_or(&[], |d| d.tags.as_slice())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|load| !load.token.is_cancelled())
    }

    /// Fetches the detail payload unless it is already present. A cancelled or
    /// failed fetch leaves the item exactly as it was.
    pub async fn init_external_data(
        &mut self,
        service: &dyn FetchService,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        if self.is_initialized() {
            return Ok(());
        }
        let detail = load_detail(service, self.id(), cancel).await?;
        self.apply_detail(detail);
        Ok(())
    }

    /// Records a load started elsewhere. A previous load still attached to
    /// this item is cancelled.
    pub fn begin_load(&mut self, ticket: LoadTicket, token: CancellationToken) {
        if let Some(previous) = self.in_flight.replace(InFlightLoad { ticket, token }) {
            previous.token.cancel();
        }
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<ImageDetail, FetchError>) -> LoadOutcome {
        match &self.in_flight {
            Some(load) if load.ticket == ticket => {}
            _ => return LoadOutcome::Stale,
        }
        let Some(load) = self.in_flight.take() else {
            return LoadOutcome::Stale;
        };
        if load.token.is_cancelled() {
            return LoadOutcome::Cancelled;
        }
        match result {
            Ok(_) if self.is_initialized() => LoadOutcome::AlreadyInitialized,
            Ok(detail) => {
                self.apply_detail(detail);
                LoadOutcome::Applied
            }
            Err(err) if err.is_cancelled() => LoadOutcome::Cancelled,
            Err(err) => LoadOutcome::Failed(err),
        }
    }

    /// Cancels any in-flight load. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(load) = self.in_flight.take() {
            debug!(id = %self.id(), ticket = load.ticket, "disposing item with load in flight");
            load.token.cancel();
        }
    }

    fn apply_detail(&mut self, detail: ImageDetail) {
        self.detail = Some(detail);
    }
}

impl Drop for PresentationItem {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Fetches the detail payload for `id`, giving up as soon as `cancel` fires.
/// A result that arrives after cancellation is discarded.
pub async fn load_detail(
    service: &dyn FetchService,
    id: ImageId,
    cancel: &CancellationToken,
) -> Result<ImageDetail, FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = service.fetch_detail(id) => {
            let detail = result?;
            if cancel.is_cancelled() {
                Err(FetchError::Cancelled)
            } else {
                Ok(detail)
            }
        }
    }
}
