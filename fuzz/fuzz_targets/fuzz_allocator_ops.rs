#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use dispenser_core::{AllocatorState, DispenserError, Territory};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Next,
    Claim,
    Specific(u8),
    Toggle(u8),
    Reset,
}

#[derive(Arbitrary, Debug)]
struct Input {
    active: Vec<bool>,
    ops: Vec<(u16, Op)>,
}

fuzz_target!(|input: Input| {
    let catalog: Vec<Territory> = input
        .active
        .iter()
        .take(32)
        .enumerate()
        .map(|(i, active)| {
            let t = Territory::new(i as u32 + 1, format!("t{i}"));
            if *active {
                t
            } else {
                t.inactive()
            }
        })
        .collect();
    let mut state = AllocatorState::new(catalog);
    let mut handed_out = HashSet::new();
    let mut now = 0u64;
    let mut last_at = 0u64;

    for (delta, op) in input.ops {
        now = now.saturating_add(u64::from(delta));
        let assigned = match op {
            Op::Next => state.assign_next(now).map(|t| t.id),
            Op::Claim => match state.claim(now) {
                Ok(t) => Some(t.id),
                Err(err) => {
                    assert_eq!(err, DispenserError::Exhausted);
                    None
                }
            },
            Op::Specific(id) => state
                .assign_specific(u32::from(id), now)
                .ok()
                .map(|r| r.territory_id),
            Op::Toggle(id) => {
                let _ = state.toggle_active(u32::from(id));
                None
            }
            Op::Reset => {
                state.reset();
                handed_out.clear();
                None
            }
        };
        if let Some(id) = assigned {
            assert!(handed_out.insert(id));
            let at = state.assignments().last().map(|r| r.assigned_at).unwrap_or(0);
            assert!(at >= last_at);
            last_at = at;
        }

        let stats = state.stats();
        let active = state.list().iter().filter(|t| t.active).count();
        assert_eq!(stats.assigned, handed_out.len());
        assert_eq!(stats.remaining, active.saturating_sub(handed_out.len()));
        assert_eq!(state.assignments().len(), handed_out.len());
    }
});
