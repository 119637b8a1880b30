//! # Stage Gate
//!
//! Defers callbacks until a named asynchronous precondition has been
//! satisfied, without the caller tracking which preconditions have fired.
//!
//! ## State Machine
//!
//! Every declared stage moves independently:
//!
//! | From | To | Trigger |
//! |------|----|---------|
//! | incomplete | complete | [`StageGate::mark_completed`] |
//! | complete | incomplete | [`StageGate::reset`] (all stages at once) |
//!
//! No other transitions exist.
//!
//! ## Execution Model
//!
//! The gate belongs to one execution context. It is neither `Send` nor
//! `Sync` and performs no locking. Nothing blocks: due actions run on the
//! calling stack before `mark_completed`/`run` return.
//!
//! Methods take `&self` so that a gate shared through `Rc` can be driven
//! from inside the actions it dispatches. The internal borrow is released
//! before any action is invoked.

use crate::GateError;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;

/// A deferred zero-argument callback.
pub type PendingAction = Box<dyn FnOnce()>;

/// Completion flag and FIFO queue for one stage.
#[derive(Default)]
struct StageSlot {
    completed: bool,
    pending: VecDeque<PendingAction>,
}

struct GateState<S> {
    slots: BTreeMap<S, StageSlot>,
    /// Incremented by every reset. A dispatch loop started in an older
    /// cycle must stop as soon as it observes a newer one.
    cycle: u64,
}

/// Tracks completion of a fixed set of stages and runs actions once their
/// stage is complete.
///
/// ```
/// use stagegate_core::StageGate;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// enum Stage { Sized }
///
/// let gate = StageGate::new([Stage::Sized]).expect("stages");
/// let ran = Rc::new(Cell::new(false));
///
/// let flag = Rc::clone(&ran);
/// gate.run(Stage::Sized, move || flag.set(true)).expect("declared");
/// assert!(!ran.get());
///
/// gate.mark_completed(Stage::Sized).expect("declared");
/// assert!(ran.get());
/// ```
pub struct StageGate<S> {
    state: RefCell<GateState<S>>,
}

impl<S: Debug> Debug for StageGate<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => {
                let stages: Vec<(&S, bool, usize)> = state
                    .slots
                    .iter()
                    .map(|(s, slot)| (s, slot.completed, slot.pending.len()))
                    .collect();
                f.debug_struct("StageGate")
                    .field("cycle", &state.cycle)
                    .field("stages", &stages)
                    .finish()
            }
            Err(_) => f.debug_struct("StageGate").finish_non_exhaustive(),
        }
    }
}

impl<S> StageGate<S>
where
    S: Copy + Ord + Debug,
{
    /// Declare the complete set of stages. All start incomplete.
    ///
    /// Duplicate stages collapse into one.
    ///
    /// # Errors
    ///
    /// Returns `GateError::EmptyStageSet` if `stages` yields nothing.
    pub fn new(stages: impl IntoIterator<Item = S>) -> Result<Self, GateError> {
        let slots: BTreeMap<S, StageSlot> = stages
            .into_iter()
            .map(|s| (s, StageSlot::default()))
            .collect();

        if slots.is_empty() {
            return Err(GateError::EmptyStageSet);
        }

        Ok(Self {
            state: RefCell::new(GateState { slots, cycle: 0 }),
        })
    }

    /// Mark `stage` complete.
    ///
    /// On the first transition, every action queued against `stage` runs
    /// synchronously in FIFO order. Marking an already complete stage does
    /// nothing.
    ///
    /// If an action resets the gate, dispatch stops and the actions still
    /// queued are dropped with the rest of the cycle.
    pub fn mark_completed(&self, stage: S) -> Result<(), GateError> {
        let cycle = {
            let mut state = self.state.borrow_mut();
            let cycle = state.cycle;
            let slot = state
                .slots
                .get_mut(&stage)
                .ok_or_else(|| unknown(stage))?;

            if slot.completed {
                tracing::trace!(?stage, "stage already complete");
                return Ok(());
            }
            slot.completed = true;
            tracing::debug!(?stage, pending = slot.pending.len(), "stage completed");
            cycle
        };

        while let Some(action) = self.next_due(stage, cycle) {
            action();
        }
        Ok(())
    }

    /// Run `action` now if `stage` is complete, otherwise queue it until the
    /// stage completes.
    pub fn run(&self, stage: S, action: impl FnOnce() + 'static) -> Result<(), GateError> {
        {
            let mut state = self.state.borrow_mut();
            let slot = state
                .slots
                .get_mut(&stage)
                .ok_or_else(|| unknown(stage))?;

            if !slot.completed {
                slot.pending.push_back(Box::new(action));
                tracing::trace!(?stage, queued = slot.pending.len(), "action deferred");
                return Ok(());
            }
        }

        action();
        Ok(())
    }

    /// Revert every stage to incomplete and drop all queued actions
    /// without running them.
    pub fn reset(&self) {
        let dropped: Vec<PendingAction> = {
            let mut state = self.state.borrow_mut();
            state.cycle = state.cycle.wrapping_add(1);
            state
                .slots
                .values_mut()
                .flat_map(|slot| {
                    slot.completed = false;
                    std::mem::take(&mut slot.pending)
                })
                .collect()
        };

        tracing::debug!(discarded = dropped.len(), "stage gate reset");
        // Closures are dropped here, outside the borrow, in case their
        // captures hold a handle back to this gate.
        drop(dropped);
    }

    /// Whether `stage` is currently complete.
    pub fn is_completed(&self, stage: S) -> Result<bool, GateError> {
        let state = self.state.borrow();
        state
            .slots
            .get(&stage)
            .map(|slot| slot.completed)
            .ok_or_else(|| unknown(stage))
    }

    /// Number of actions waiting on `stage`.
    pub fn pending_count(&self, stage: S) -> Result<usize, GateError> {
        let state = self.state.borrow();
        state
            .slots
            .get(&stage)
            .map(|slot| slot.pending.len())
            .ok_or_else(|| unknown(stage))
    }

    /// The declared stages, in their `Ord` order.
    pub fn stages(&self) -> Vec<S> {
        self.state.borrow().slots.keys().copied().collect()
    }

    /// Pop the next action for `stage`, as long as the gate is still in
    /// `cycle` and the stage is still complete.
    fn next_due(&self, stage: S, cycle: u64) -> Option<PendingAction> {
        let mut state = self.state.borrow_mut();
        if state.cycle != cycle {
            return None;
        }
        let slot = state.slots.get_mut(&stage)?;
        if !slot.completed {
            return None;
        }
        slot.pending.pop_front()
    }
}

fn unknown<S: Debug>(stage: S) -> GateError {
    GateError::UnknownStage(format!("{stage:?}"))
}

// =============================================================================
// TESTS
// =============================================================================
