use crate::api::ImageRecord;

use super::view::{Change, ChangeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    NoSelection,
    Selected(usize),
}

impl Selection {
    pub fn index(&self) -> Option<usize> {
        match self {
            Selection::NoSelection => None,
            Selection::Selected(index) => Some(*index),
        }
    }

    pub fn move_to(&mut self, index: usize, len: usize) -> bool {
        if index >= len || self.index() == Some(index) {
            return false;
        }
        *self = Selection::Selected(index);
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.index().is_some_and(|i| i > 0)
    }

    pub fn can_go_forward(&self, len: usize) -> bool {
        self.index().is_some_and(|i| i + 1 < len)
    }

    pub fn current_number(&self) -> Option<usize> {
        self.index().map(|i| i + 1)
    }

    /// Follows the current item through a batch of view changes. Returns true
    /// when the current item itself was removed.
    pub fn apply(&mut self, changes: &ChangeSet, len_after: usize) -> bool {
        let Selection::Selected(mut current) = *self else {
            return false;
        };
        let mut lost = false;
        for change in changes.changes() {
            match change {
                Change::Insert { index, ids } => {
                    if *index <= current {
                        current += ids.len();
                    }
                }
                Change::Remove { index, .. } => {
                    if *index < current {
                        current -= 1;
                    } else if *index == current {
                        lost = true;
                    }
                }
            }
        }
        *self = if len_after == 0 {
            Selection::NoSelection
        } else {
            Selection::Selected(current.min(len_after - 1))
        };
        lost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Handled,
    NotHandled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackStep {
    CloseViewer,
    DeliverPayload(Option<ImageRecord>),
    PassThrough,
}

#[derive(Debug, Default)]
pub struct NavigationState {
    pending: Option<ImageRecord>,
    back_prepared: bool,
    viewer_open: bool,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_visit(&mut self) {
        self.back_prepared = false;
    }

    pub fn set_pending(&mut self, target: ImageRecord) {
        self.pending = Some(target);
    }

    pub fn pending(&self) -> Option<&ImageRecord> {
        self.pending.as_ref()
    }

    pub fn clear_pending(&mut self) -> Option<ImageRecord> {
        self.pending.take()
    }

    pub fn open_viewer(&mut self) {
        self.viewer_open = true;
    }

    pub fn is_viewer_open(&self) -> bool {
        self.viewer_open
    }

    pub fn is_back_prepared(&self) -> bool {
        self.back_prepared
    }

    pub fn set_back_prepared(&mut self, prepared: bool) {
        self.back_prepared = prepared;
    }

    /// The viewer closes first, then the current record is handed back once
    /// per visit.
    pub fn back(&mut self, current: Option<&ImageRecord>) -> BackStep {
        if self.viewer_open {
            self.viewer_open = false;
            return BackStep::CloseViewer;
        }
        if !self.back_prepared {
            self.back_prepared = true;
            return BackStep::DeliverPayload(current.cloned());
        }
        BackStep::PassThrough
    }
}
