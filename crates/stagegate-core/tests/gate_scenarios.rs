//! # Stage Gate Scenario Tests
//!
//! ## Tiers
//! - G0: Construction
//! - G1: Deferral and immediate execution
//! - G2: Idempotent completion
//! - G3: Reset and reuse across cycles
//! - G4: Misuse

use stagegate_core::{GateError, StageGate};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    A,
    B,
    X,
    Y,
    Z,
}

type Log = Rc<RefCell<Vec<&'static str>>>;

fn record(log: &Log, name: &'static str) -> impl FnOnce() + 'static {
    let log = Rc::clone(log);
    move || log.borrow_mut().push(name)
}

fn snapshot(log: &Log) -> Vec<&'static str> {
    log.borrow().clone()
}

// =============================================================================
// TIER G0: CONSTRUCTION
// =============================================================================

mod g0_construction {
    use super::*;

    /// G0.1: An empty stage set is refused.
    #[test]
    fn empty_stage_set_fails() {
        let result = StageGate::<Stage>::new(Vec::new());
        assert!(matches!(result, Err(GateError::EmptyStageSet)));
    }

    /// G0.2: Every declared stage starts incomplete with nothing queued.
    #[test]
    fn declared_stages_start_incomplete() {
        let gate = StageGate::new([Stage::A, Stage::B]).expect("gate");
        for stage in gate.stages() {
            assert_eq!(gate.is_completed(stage), Ok(false));
            assert_eq!(gate.pending_count(stage), Ok(0));
        }
    }
}

// =============================================================================
// TIER G1: DEFERRAL
// =============================================================================

mod g1_deferral {
    use super::*;

    /// G1.1: Actions queued on two stages run per stage, FIFO, only when their
    /// own stage completes; reset defers again.
    #[test]
    fn two_stage_scenario() {
        let gate = StageGate::new([Stage::A, Stage::B]).expect("gate");
        let log: Log = Rc::default();

        gate.run(Stage::A, record(&log, "action1")).expect("run");
        gate.run(Stage::B, record(&log, "action2")).expect("run");
        gate.run(Stage::A, record(&log, "action3")).expect("run");
        assert!(snapshot(&log).is_empty());

        gate.mark_completed(Stage::A).expect("mark A");
        assert_eq!(snapshot(&log), vec!["action1", "action3"]);

        gate.mark_completed(Stage::B).expect("mark B");
        assert_eq!(snapshot(&log), vec!["action1", "action3", "action2"]);

        gate.reset();
        gate.run(Stage::A, record(&log, "action4")).expect("run");
        assert_eq!(snapshot(&log).len(), 3);

        gate.mark_completed(Stage::A).expect("mark A again");
        assert_eq!(
            snapshot(&log),
            vec!["action1", "action3", "action2", "action4"]
        );
    }

    /// G1.2: Running on a complete stage happens before `run` returns.
    #[test]
    fn complete_stage_runs_synchronously() {
        let gate = StageGate::new([Stage::A]).expect("gate");
        let log: Log = Rc::default();

        gate.mark_completed(Stage::A).expect("mark");
        gate.run(Stage::A, record(&log, "sync")).expect("run");
        assert_eq!(snapshot(&log), vec!["sync"]);
        assert_eq!(gate.pending_count(Stage::A), Ok(0));
    }
}

// =============================================================================
// TIER G2: IDEMPOTENT COMPLETION
// =============================================================================

mod g2_idempotence {
    use super::*;

    /// G2.1: Marking twice then queueing runs the action once, immediately.
    #[test]
    fn double_mark_then_run() {
        let gate = StageGate::new([Stage::X]).expect("gate");
        let log: Log = Rc::default();

        gate.mark_completed(Stage::X).expect("first mark");
        gate.mark_completed(Stage::X).expect("second mark");
        gate.run(Stage::X, record(&log, "action5")).expect("run");

        assert_eq!(snapshot(&log), vec!["action5"]);
    }

    /// G2.2: An action queued before the first mark runs only after it and is
    /// not repeated by the second.
    #[test]
    fn queued_action_not_rerun() {
        let gate = StageGate::new([Stage::X]).expect("gate");
        let log: Log = Rc::default();

        gate.run(Stage::X, record(&log, "once")).expect("run");
        gate.mark_completed(Stage::X).expect("first mark");
        gate.mark_completed(Stage::X).expect("second mark");
        assert_eq!(snapshot(&log), vec!["once"]);
    }
}

// =============================================================================
// TIER G3: RESET
// =============================================================================

mod g3_reset {
    use super::*;

    /// G3.1: Reset drops queued actions without running them.
    #[test]
    fn reset_drops_pending() {
        let gate = StageGate::new([Stage::A, Stage::B]).expect("gate");
        let log: Log = Rc::default();

        gate.run(Stage::A, record(&log, "a")).expect("run");
        gate.run(Stage::B, record(&log, "b")).expect("run");
        gate.reset();

        gate.mark_completed(Stage::A).expect("mark");
        gate.mark_completed(Stage::B).expect("mark");
        assert!(snapshot(&log).is_empty());
    }

    /// G3.2: Reset is the only way back to incomplete, and it affects every stage.
    #[test]
    fn reset_reverts_all_stages() {
        let gate = StageGate::new([Stage::A, Stage::B]).expect("gate");
        gate.mark_completed(Stage::A).expect("mark");
        gate.mark_completed(Stage::B).expect("mark");
        gate.mark_completed(Stage::A).expect("mark again");
        assert_eq!(gate.is_completed(Stage::A), Ok(true));

        gate.reset();
        assert_eq!(gate.is_completed(Stage::A), Ok(false));
        assert_eq!(gate.is_completed(Stage::B), Ok(false));
    }
}

// =============================================================================
// TIER G4: MISUSE
// =============================================================================

mod g4_misuse {
    use super::*;

    /// G4.1: Waiting on an undeclared stage fails and never runs the action.
    #[test]
    fn undeclared_stage_run() {
        let gate = StageGate::new([Stage::Y]).expect("gate");
        let log: Log = Rc::default();

        let result = gate.run(Stage::Z, record(&log, "action6"));
        assert!(matches!(result, Err(GateError::UnknownStage(_))));

        gate.mark_completed(Stage::Y).expect("mark");
        assert!(snapshot(&log).is_empty());
    }

    /// G4.2: Marking an undeclared stage fails and leaves declared stages alone.
    #[test]
    fn undeclared_stage_mark() {
        let gate = StageGate::new([Stage::Y]).expect("gate");
        let err = gate.mark_completed(Stage::Z).expect_err("must fail");
        assert_eq!(err.to_string(), "Unknown stage: Z");
        assert_eq!(gate.is_completed(Stage::Y), Ok(false));
    }
}
