//! Module: endpoint::load_state
//! Responsibility: the Incomplete/Complete state machine of one virtual
//! object end-point.
//! Does not own: loader dispatch or event recording (see `virtual_object`).

mod complete;
mod incomplete;

#[cfg(test)]
mod tests;

pub use complete::CompleteVirtualObjectEndPointLoadState;
pub(crate) use complete::UnregisterOutcome;
pub use incomplete::{CompletionReplay, IncompleteVirtualObjectEndPointLoadState, PendingCompletion};

///
/// VirtualObjectEndPointLoadState
///
/// Exactly one state is held at a time. `Incomplete → Complete` happens once
/// per load; `Complete → Incomplete` only through an explicit unload.
///

#[derive(Clone, Debug)]
pub enum VirtualObjectEndPointLoadState {
    Incomplete(IncompleteVirtualObjectEndPointLoadState),
    Complete(CompleteVirtualObjectEndPointLoadState),
}

impl VirtualObjectEndPointLoadState {
    #[must_use]
    pub const fn is_data_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// An incomplete end-point has no data, so nothing can have changed.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        match self {
            Self::Incomplete(_) => false,
            Self::Complete(state) => state.has_changed(),
        }
    }

    #[must_use]
    pub fn can_be_collected(&self) -> bool {
        match self {
            Self::Incomplete(state) => state.can_be_collected(),
            Self::Complete(_) => false,
        }
    }

    #[must_use]
    pub const fn as_complete(&self) -> Option<&CompleteVirtualObjectEndPointLoadState> {
        match self {
            Self::Complete(state) => Some(state),
            Self::Incomplete(_) => None,
        }
    }
}

impl Default for VirtualObjectEndPointLoadState {
    fn default() -> Self {
        Self::Incomplete(IncompleteVirtualObjectEndPointLoadState::new())
    }
}
