pub mod detail;
pub mod item;
pub mod pagination;
pub mod selection;
pub mod source;
pub mod view;

use std::sync::Arc;

use tokio::{sync::broadcast, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ApiTag, ImageDetail, ImageId, ImageRecord, ImageSearchResponse},
    error::{FetchError, GalleryError},
    service::{BackPayload, FetchService, Navigator},
    settings::{GalleryConfig, Settings},
};

use self::{
    detail::{DetailLoader, LoadOwner},
    item::{LoadOutcome, LoadTicket, PresentationItem},
    pagination::{is_near_end, is_near_start, PageFetchGuard, Pagination},
    selection::{BackOutcome, BackStep, NavigationState, Selection},
    source::SourceCollection,
    view::{ChangeSet, LiveView},
};

const EVENT_CAPACITY: usize = 256;

pub(crate) enum WorkerEvent {
    PageFetched {
        guard: PageFetchGuard,
        result: Result<ImageSearchResponse, FetchError>,
    },
    DetailFetched {
        id: ImageId,
        ticket: LoadTicket,
        result: Result<ImageDetail, FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    ViewChanged(ChangeSet),
    CurrentChanged { index: usize, id: ImageId },
    SelectionCleared,
    DetailLoaded(ImageId),
    PageLoaded { page: u32, added: usize },
    PageFailed { page: u32, error: String },
}

/// The image gallery feed: a paginated, filtered, ordered list of images with
/// a current item whose details are loaded on demand.
///
/// All state is mutated by the owner of this value. Fetches run as tasks on
/// the tokio runtime; call [`Gallery::pump`] or await [`Gallery::next_event`] /
/// [`Gallery::settle`] to apply their results.
pub struct Gallery {
    service: Arc<dyn FetchService>,
    navigator: Arc<dyn Navigator>,
    config: GalleryConfig,
    settings: Settings,
    source: SourceCollection,
    view: LiveView,
    pagination: Pagination,
    selection: Selection,
    nav: NavigationState,
    details: DetailLoader,
    tasks: JoinSet<WorkerEvent>,
    notify: broadcast::Sender<GalleryEvent>,
    shutdown: CancellationToken,
    last_page_error: Option<String>,
}

impl Gallery {
    pub fn new(
        service: Arc<dyn FetchService>,
        navigator: Arc<dyn Navigator>,
        config: GalleryConfig,
        settings: Settings,
    ) -> Self {
        let (notify, _) = broadcast::channel(EVENT_CAPACITY);
        let shutdown = CancellationToken::new();
        let details = DetailLoader::new(Arc::clone(&service), shutdown.clone());
        Self {
            service,
            navigator,
            config,
            settings,
            source: SourceCollection::new(),
            view: LiveView::default(),
            pagination: Pagination::new(),
            selection: Selection::NoSelection,
            nav: NavigationState::new(),
            details,
            tasks: JoinSet::new(),
            notify,
            shutdown,
            last_page_error: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.notify.subscribe()
    }

    /// Starts fetching `page` unless a fetch is already running or the page
    /// was merged before. Returns whether a fetch was started.
    pub fn request_page(&mut self, page: u32, page_size: u32) -> Result<bool, GalleryError> {
        let Some(guard) = self.pagination.try_begin(page, page_size)? else {
            debug!(page, fetching = self.pagination.is_fetching(), "page request skipped");
            return Ok(false);
        };
        info!(page, page_size, "requesting page");
        let service = Arc::clone(&self.service);
        let token = self.shutdown.child_token();
        self.tasks.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                result = service.fetch_page(page, page_size) => result,
            };
            WorkerEvent::PageFetched { guard, result }
        });
        Ok(true)
    }

    pub fn threshold_reached(&mut self) -> bool {
        let Some(page) = self.pagination.next_page() else {
            debug!("search exhausted, not requesting more pages");
            return false;
        };
        match self.request_page(page, self.config.page_size) {
            Ok(started) => started,
            Err(err) => {
                warn!(%err, "threshold page request rejected");
                false
            }
        }
    }

    pub fn start_reached(&mut self) -> bool {
        let Some(page) = self.pagination.previous_page() else {
            return false;
        };
        match self.request_page(page, self.config.page_size) {
            Ok(started) => started,
            Err(err) => {
                warn!(%err, "previous page request rejected");
                false
            }
        }
    }

    /// Scroll signal from the UI: `index` is the last visible item.
    pub fn item_visible(&mut self, index: usize) -> bool {
        if is_near_end(index, self.view.len(), self.config.remaining_items_threshold) {
            return self.threshold_reached();
        }
        false
    }

    /// Scroll signal from the UI: `index` is the first visible item.
    pub fn first_item_visible(&mut self, index: usize) -> bool {
        if is_near_start(index, self.config.remaining_items_threshold) {
            return self.start_reached();
        }
        false
    }

    pub fn move_to(&mut self, index: usize) -> bool {
        if !self.selection.move_to(index, self.view.len()) {
            return false;
        }
        self.current_changed();
        true
    }

    pub fn next(&mut self) -> bool {
        match self.selection.index() {
            Some(index) => self.move_to(index + 1),
            None => self.move_to(0),
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.selection.index() {
            Some(index) if index > 0 => self.move_to(index - 1),
            _ => false,
        }
    }

    pub fn jump_to(&mut self, target: ImageRecord) {
        info!(id = %target.id(), "jump requested");
        self.nav.set_pending(target);
        self.resolve_pending();
    }

    pub fn navigated_to(&mut self, target: Option<ImageRecord>) {
        self.nav.begin_visit();
        match target {
            Some(target) => self.jump_to(target),
            None => debug!("navigated to gallery without a target image"),
        }
    }

    pub fn back(&mut self) -> BackOutcome {
        let current = self.current_item().map(|item| item.record().clone());
        match self.nav.back(current.as_ref()) {
            BackStep::CloseViewer => {
                debug!("closing full-size viewer");
                BackOutcome::Handled
            }
            BackStep::DeliverPayload(record) => {
                info!(id = ?record.as_ref().map(ImageRecord::id), "handing current image back");
                self.navigator.back(record.map(BackPayload::Image));
                BackOutcome::Handled
            }
            BackStep::PassThrough => BackOutcome::NotHandled,
        }
    }

    pub fn tag_tapped(&mut self, tag: ApiTag) {
        info!(tag = %tag.name, "handing tag back");
        self.nav.set_back_prepared(true);
        self.navigator.back(Some(BackPayload::Tag(tag)));
        self.nav.set_back_prepared(false);
    }

    pub fn open_full_size(&mut self) -> bool {
        if self.current_item().is_none() {
            return false;
        }
        self.nav.open_viewer();
        true
    }

    /// Applies every background result that is ready, without waiting.
    /// Re-raises the panic of a background task.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(joined) = self.tasks.try_join_next() {
            self.joined(joined);
            applied += 1;
        }
        applied
    }

    /// Waits for the next background result and applies it. Returns false
    /// when nothing is outstanding.
    pub async fn next_event(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(joined) => {
                self.joined(joined);
                true
            }
            None => false,
        }
    }

    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn view(&self) -> &LiveView {
        &self.view
    }

    pub fn source(&self) -> &SourceCollection {
        &self.source
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selection.index()
    }

    pub fn current_item(&self) -> Option<&PresentationItem> {
        self.selection.index().and_then(|index| self.view.get(index))
    }

    pub fn can_go_back(&self) -> bool {
        self.selection.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.selection.can_go_forward(self.view.len())
    }

    pub fn current_number(&self) -> Option<usize> {
        self.selection.current_number()
    }

    pub fn pending_target(&self) -> Option<ImageId> {
        self.nav.pending().map(ImageRecord::id)
    }

    pub fn is_viewer_open(&self) -> bool {
        self.nav.is_viewer_open()
    }

    pub fn is_back_prepared(&self) -> bool {
        self.nav.is_back_prepared()
    }

    pub fn title(&self) -> Option<String> {
        let id = self.current_item()?.id();
        Some(if self.nav.is_viewer_open() {
            format!("{id}: Large")
        } else {
            format!("{id}")
        })
    }

    pub fn browser_url(&self) -> Option<String> {
        let id = self.current_item()?.id();
        Some(format!("{}images/{id}", self.config.base_uri))
    }

    pub fn total_images(&self) -> Option<u32> {
        self.pagination.total()
    }

    pub fn last_page_error(&self) -> Option<&str> {
        self.last_page_error.as_deref()
    }

    fn joined(&mut self, joined: Result<WorkerEvent, tokio::task::JoinError>) {
        match joined {
            Ok(WorkerEvent::PageFetched { guard, result }) => self.page_fetched(guard, result),
            Ok(WorkerEvent::DetailFetched { id, ticket, result }) => self.detail_fetched(id, ticket, result),
            Err(err) if err.is_panic() => {
                error!("background fetch panicked");
                std::panic::resume_unwind(err.into_panic());
            }
            Err(err) => debug!(%err, "background fetch aborted"),
        }
    }

    fn page_fetched(&mut self, guard: PageFetchGuard, result: Result<ImageSearchResponse, FetchError>) {
        let page = guard.page();
        match result {
            Ok(response) => {
                let received = response.images.len();
                self.pagination.complete(page, received, response.total);
                drop(guard);

                let added = self.source.merge(ImageRecord::from_page(page, response.images));
                let changes = self.view.apply(&added);
                info!(page, received, added = changes.inserted(), len = self.view.len(), "page merged");
                self.last_page_error = None;
                self.publish_changes(changes);
                self.notify(GalleryEvent::PageLoaded {
                    page,
                    added: added.len(),
                });
            }
            Err(err) => {
                drop(guard);
                if err.is_cancelled() {
                    debug!(page, "page fetch cancelled");
                } else {
                    warn!(page, %err, "page fetch failed");
                    self.last_page_error = Some(err.to_string());
                    self.notify(GalleryEvent::PageFailed {
                        page,
                        error: err.to_string(),
                    });
                }
            }
        }

        if self.nav.pending().is_some() {
            self.resolve_pending();
        } else if self.selection.index().is_none() && !self.view.is_empty() {
            self.move_to(0);
        }
    }

    fn detail_fetched(&mut self, id: ImageId, ticket: LoadTicket, result: Result<ImageDetail, FetchError>) {
        let Some(item) = self.view.find_mut(id) else {
            debug!(%id, "detail arrived for an item no longer in view");
            return;
        };
        match item.finish_load(ticket, result) {
            LoadOutcome::Applied => {
                debug!(%id, ticket, "detail loaded");
                self.notify(GalleryEvent::DetailLoaded(id));
            }
            LoadOutcome::Cancelled => {
                debug!(%id, ticket, generation = self.details.generation(), "detail load cancelled");
            }
            LoadOutcome::Stale | LoadOutcome::AlreadyInitialized => {
                debug!(%id, ticket, "dropping superseded detail result");
            }
            LoadOutcome::Failed(err) => {
                warn!(%id, %err, "detail load failed");
            }
        }
    }

    // The target stays pending while a page is in flight.
    fn resolve_pending(&mut self) {
        let Some(id) = self.nav.pending().map(ImageRecord::id) else {
            return;
        };
        if let Some(index) = self.view.index_of(id) {
            self.nav.clear_pending();
            debug!(%id, index, "jump target found in view");
            self.move_to(index);
            return;
        }
        if self.pagination.is_fetching() {
            debug!(%id, "jump target not in view yet, waiting for page");
            return;
        }
        let Some(target) = self.nav.clear_pending() else {
            return;
        };

        info!(%id, "jump target absent, inserting it at the front");
        let mut item = PresentationItem::synthesized(target);
        self.details.start(&mut self.tasks, &mut item, LoadOwner::Eager);
        if let Some(changes) = self.view.pin_front(item) {
            self.publish_changes(changes);
        }
        self.move_to(0);
    }

    fn publish_changes(&mut self, changes: ChangeSet) {
        if changes.is_empty() {
            return;
        }
        if self.selection.apply(&changes, self.view.len()) {
            self.current_changed();
        }
        self.notify(GalleryEvent::ViewChanged(changes));
    }

    fn current_changed(&mut self) {
        let Some(index) = self.selection.index() else {
            self.details.begin_selection();
            self.notify(GalleryEvent::SelectionCleared);
            return;
        };
        let generation = self.details.begin_selection();
        let len = self.view.len();
        let item = self
            .view
            .get_mut(index)
            .expect("selection index outside the live view");
        let id = item.id();
        self.details.start(&mut self.tasks, item, LoadOwner::Selection);
        debug!(%id, index, generation, "current image changed");
        self.notify(GalleryEvent::CurrentChanged { index, id });

        let threshold = self.config.remaining_items_threshold;
        if is_near_end(index, len, threshold) {
            self.threshold_reached();
        }
        if is_near_start(index, threshold) {
            self.start_reached();
        }
    }

    fn notify(&self, event: GalleryEvent) {
        let _ = self.notify.send(event);
    }
}

impl Drop for Gallery {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
