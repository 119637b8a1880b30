//! # Property-Based Tests
//!
//! Ordering and exactly-once guarantees of the stage gate under arbitrary
//! interleavings of `run`, `mark_completed` and `reset`.

use proptest::collection::vec;
use proptest::prelude::*;
use stagegate_core::StageGate;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

const STAGES: u8 = 4;

#[derive(Debug, Clone)]
enum Op {
    Run(u8),
    Mark(u8),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..STAGES).prop_map(Op::Run),
        2 => (0..STAGES).prop_map(Op::Mark),
        1 => Just(Op::Reset),
    ]
}

/// Straightforward reference model of the gate.
#[derive(Default)]
struct Model {
    completed: BTreeMap<u8, bool>,
    pending: BTreeMap<u8, Vec<usize>>,
    ran: Vec<usize>,
}

impl Model {
    fn apply(&mut self, op: &Op, id: usize) {
        match *op {
            Op::Run(s) => {
                if *self.completed.get(&s).unwrap_or(&false) {
                    self.ran.push(id);
                } else {
                    self.pending.entry(s).or_default().push(id);
                }
            }
            Op::Mark(s) => {
                if !*self.completed.get(&s).unwrap_or(&false) {
                    self.completed.insert(s, true);
                    let queued = self.pending.remove(&s).unwrap_or_default();
                    self.ran.extend(queued);
                }
            }
            Op::Reset => {
                self.completed.clear();
                self.pending.clear();
            }
        }
    }
}

proptest! {
    /// The gate executes exactly the actions the reference model executes,
    /// in the same order.
    #[test]
    fn gate_matches_reference_model(ops in vec(op(), 0..200)) {
        let gate = StageGate::new(0..STAGES).expect("gate");
        let ran: Rc<RefCell<Vec<usize>>> = Rc::default();
        let mut model = Model::default();

        for (id, op) in ops.iter().enumerate() {
            match *op {
                Op::Run(s) => {
                    let ran = Rc::clone(&ran);
                    gate.run(s, move || ran.borrow_mut().push(id)).expect("declared");
                }
                Op::Mark(s) => gate.mark_completed(s).expect("declared"),
                Op::Reset => gate.reset(),
            }
            model.apply(op, id);
            prop_assert_eq!(&*ran.borrow(), &model.ran);
        }
    }

    /// No action ever runs twice.
    #[test]
    fn actions_run_at_most_once(ops in vec(op(), 0..200)) {
        let gate = StageGate::new(0..STAGES).expect("gate");
        let counts: Rc<RefCell<BTreeMap<usize, u32>>> = Rc::default();

        for (id, op) in ops.iter().enumerate() {
            match *op {
                Op::Run(s) => {
                    let counts = Rc::clone(&counts);
                    gate.run(s, move || *counts.borrow_mut().entry(id).or_default() += 1)
                        .expect("declared");
                }
                Op::Mark(s) => gate.mark_completed(s).expect("declared"),
                Op::Reset => gate.reset(),
            }
        }

        prop_assert!(counts.borrow().values().all(|&n| n == 1));
    }

    /// Actions queued on one stage run in queue order, and only after mark.
    #[test]
    fn fifo_within_stage(count in 1usize..50, stage in 0..STAGES) {
        let gate = StageGate::new(0..STAGES).expect("gate");
        let ran: Rc<RefCell<Vec<usize>>> = Rc::default();

        for id in 0..count {
            let ran = Rc::clone(&ran);
            gate.run(stage, move || ran.borrow_mut().push(id)).expect("declared");
        }
        prop_assert!(ran.borrow().is_empty());
        prop_assert_eq!(gate.pending_count(stage), Ok(count));

        gate.mark_completed(stage).expect("declared");
        prop_assert_eq!(ran.borrow().clone(), (0..count).collect::<Vec<_>>());
    }

    /// Any stage outside the declared range is refused.
    #[test]
    fn undeclared_stages_refused(stage in STAGES..=u8::MAX) {
        let gate = StageGate::new(0..STAGES).expect("gate");
        prop_assert!(gate.mark_completed(stage).is_err());
        let run_result = gate.run(stage, || {});
        prop_assert!(run_result.is_err());
    }
}
