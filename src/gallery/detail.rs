use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::service::FetchService;

use super::{
    item::{load_detail, LoadTicket, PresentationItem},
    WorkerEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOwner {
    /// Belongs to the current selection and dies with it.
    Selection,
    /// Runs to completion regardless of where the user moves.
    Eager,
}

/// Starts detail loads in the background and scopes them to the selection
/// that asked for them.
///
/// Every selection change bumps the generation and cancels the previous scope,
/// so at most one selection-owned load is live at a time.
pub(crate) struct DetailLoader {
    service: Arc<dyn FetchService>,
    root: CancellationToken,
    scope: CancellationToken,
    generation: u64,
    next_ticket: LoadTicket,
}

impl DetailLoader {
    pub(crate) fn new(service: Arc<dyn FetchService>, root: CancellationToken) -> Self {
        Self {
            service,
            scope: root.child_token(),
            root,
            generation: 0,
            next_ticket: 0,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn begin_selection(&mut self) -> u64 {
        self.scope.cancel();
        self.scope = self.root.child_token();
        self.generation += 1;
        self.generation
    }

    /// Spawns a detail fetch for `item` into `tasks` unless it is initialized
    /// or already loading.
    pub(crate) fn start(
        &mut self,
        tasks: &mut JoinSet<WorkerEvent>,
        item: &mut PresentationItem,
        owner: LoadOwner,
    ) -> Option<LoadTicket> {
        if item.is_initialized() || item.is_loading() {
            return None;
        }
        let token = match owner {
            LoadOwner::Selection => self.scope.child_token(),
            LoadOwner::Eager => self.root.child_token(),
        };
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        item.begin_load(ticket, token.clone());

        let id = item.id();
        let service = Arc::clone(&self.service);
        debug!(%id, ticket, generation = self.generation, ?owner, "starting detail load");
        tasks.spawn(async move {
            let result = load_detail(service.as_ref(), id, &token).await;
            WorkerEvent::DetailFetched { id, ticket, result }
        });
        Some(ticket)
    }
}
