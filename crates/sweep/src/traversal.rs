//! Keyboard-driven walk through the explorer tree
//!
//! The tree's shape is unknown up front: a node may be a leaf, a collapsed
//! group or an expanded one. Advancing therefore tries to descend first
//! (groups are the common case) and falls back to the next sibling, checking
//! after each attempt whether the selected offset moved.
//!
//! ```text
//!            ┌──────────── round < attempts ───────────┐
//!            ▼                                         │
//!   ┌──────────────────┐ moved  ┌──────────────────┐   │
//!   │ Descend          │───────▶│ Advanced(Descend)│   │
//!   │ ArrowRight+Enter │        └──────────────────┘   │
//!   └────────┬─────────┘                               │
//!            │ same / none                             │
//!   ┌────────▼─────────┐ moved  ┌──────────────────┐   │
//!   │ Sibling          │───────▶│ Advanced(Sibling)│   │
//!   │ ArrowDown+Enter  │        └──────────────────┘   │
//!   └────────┬─────────┘                               │
//!            │ same / none                             │
//!            └─────────────────────────────────────────┘
//!                         rounds used up ──▶ Exhausted
//! ```
//!
//! End of sweep is detected by wrap-around: once the selection jumps back
//! above the last recorded offset, every entry has been seen.

use std::time::Duration;

use tracing::debug;

use storysweep_common::{Result, TreeSelectionPosition};

use crate::selection::SelectionTracker;
use crate::session::{BrowserSession, Key};

/// One directional command followed by a confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceAttempt {
    /// Move into children / expand
    Descend,
    /// Move to the next sibling
    Sibling,
}

impl AdvanceAttempt {
    pub fn keys(&self) -> [Key; 2] {
        match self {
            AdvanceAttempt::Descend => [Key::ArrowRight, Key::Enter],
            AdvanceAttempt::Sibling => [Key::ArrowDown, Key::Enter],
        }
    }
}

impl std::fmt::Display for AdvanceAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvanceAttempt::Descend => write!(f, "descend"),
            AdvanceAttempt::Sibling => write!(f, "sibling"),
        }
    }
}

/// Result of trying to move the selection by one entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceOutcome {
    Advanced {
        via: AdvanceAttempt,
        position: TreeSelectionPosition,
    },
    /// No attempt moved the selection. Not an error.
    Exhausted,
}

impl AdvanceOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }
}

/// Result of comparing a fresh position against the recorded one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapCheck {
    Continue,
    /// The selection wrapped to the top: every entry has been visited
    Complete,
}

/// Advances the selection and tracks wrap-around
#[derive(Debug, Clone)]
pub struct TraversalDriver {
    tracker: SelectionTracker,
    key_delay: Duration,
    attempts: usize,
    recorded: TreeSelectionPosition,
}

impl TraversalDriver {
    pub fn new(tracker: SelectionTracker, key_delay: Duration, attempts: usize) -> Self {
        Self {
            tracker,
            key_delay,
            attempts,
            recorded: TreeSelectionPosition::BEFORE_FIRST,
        }
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    /// Last position the wrap check accepted
    pub fn recorded_position(&self) -> TreeSelectionPosition {
        self.recorded
    }

    /// Move the selection to the next entry: descend first, sibling second.
    pub async fn advance<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<AdvanceOutcome> {
        self.advance_with(session, [AdvanceAttempt::Descend, AdvanceAttempt::Sibling], |_, after| {
            after.is_some()
        })
        .await
    }

    /// Put the selection on the first real entry after load.
    ///
    /// The first tree item is a group header at offset 0, so this tries the
    /// sibling direction first and only accepts a strictly positive offset.
    pub async fn position_on_first_entry<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<AdvanceOutcome> {
        self.advance_with(session, [AdvanceAttempt::Sibling, AdvanceAttempt::Descend], |_, after| {
            after.map(|p| p.offset() > 0.0).unwrap_or(false)
        })
        .await
    }

    async fn advance_with<S, F>(
        &self,
        session: &mut S,
        order: [AdvanceAttempt; 2],
        accept: F,
    ) -> Result<AdvanceOutcome>
    where
        S: BrowserSession + ?Sized,
        F: Fn(Option<TreeSelectionPosition>, Option<TreeSelectionPosition>) -> bool,
    {
        for round in 0..self.attempts {
            for attempt in order {
                let before = self.tracker.current_position(session).await?;
                for key in attempt.keys() {
                    session.press_key(key, self.key_delay).await?;
                }
                let after = self.tracker.current_position(session).await?;

                if let Some(position) = after {
                    if after != before && accept(before, after) {
                        debug!("{} worked! (round {})", attempt, round + 1);
                        return Ok(AdvanceOutcome::Advanced {
                            via: attempt,
                            position,
                        });
                    }
                }
            }
        }

        debug!("selection did not move after {} rounds", self.attempts);
        Ok(AdvanceOutcome::Exhausted)
    }

    /// Compare a freshly read position with the recorded one.
    ///
    /// A smaller offset means the selection wrapped to the top. Otherwise the
    /// new offset is recorded for the next check.
    pub fn check_wrap(&mut self, observed: TreeSelectionPosition) -> WrapCheck {
        if self.recorded > observed {
            debug!("{} > {}", self.recorded, observed);
            WrapCheck::Complete
        } else {
            self.recorded = observed;
            WrapCheck::Continue
        }
    }
}
