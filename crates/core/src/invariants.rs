//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible room states during
//! development. [`crate::Room::dispatch`] runs them after every event in
//! debug builds.

use std::collections::HashSet;

use crate::election::ElectionState;
use crate::models::ChairPhase;
use crate::pool::NumberPool;
use crate::room::Room;

/// Free and allocated numbers partition `1..=max`
pub fn assert_pool_invariants(pool: &NumberPool) {
    let free: HashSet<u32> = pool.free_numbers().iter().copied().collect();
    debug_assert_eq!(
        free.len(),
        pool.free_numbers().len(),
        "Pool free list holds duplicates"
    );

    for number in pool.allocated_numbers() {
        debug_assert!(
            !free.contains(&number),
            "Number {} is both free and allocated",
            number
        );
    }

    debug_assert_eq!(
        free.len() + pool.allocated_count(),
        pool.max() as usize,
        "Pool lost or invented numbers"
    );
    debug_assert!(
        free.iter().all(|n| (1..=pool.max()).contains(n)),
        "Pool holds a number outside 1..={}",
        pool.max()
    );
}

/// Validate the whole room: pool, numbering and election roles
pub fn assert_room_invariants(room: &Room) {
    let pool = room.pool();
    let registry = room.registry();
    assert_pool_invariants(pool);

    // Every allocated number belongs to exactly one participant
    let mut numbers = HashSet::new();
    for participant in registry.list_live() {
        if let Some(number) = participant.number {
            debug_assert!(
                numbers.insert(number),
                "Number {} held by two participants",
                number
            );
            debug_assert!(
                pool.is_allocated(number),
                "Participant {} holds unallocated number {}",
                participant.id,
                number
            );
        }
    }
    debug_assert_eq!(
        numbers.len(),
        pool.allocated_count(),
        "Pool has allocations with no owner"
    );

    // At most one outstanding question and at most one chairperson
    let asked: Vec<_> = registry
        .list_live()
        .filter(|p| p.chair == ChairPhase::Asked)
        .map(|p| p.id)
        .collect();
    let chairs: Vec<_> = registry
        .list_live()
        .filter(|p| p.chair == ChairPhase::Chair)
        .map(|p| p.id)
        .collect();

    match room.election().state() {
        ElectionState::Idle => {
            debug_assert!(asked.is_empty(), "Idle election with candidate {:?}", asked);
            debug_assert!(chairs.is_empty(), "Idle election with chair {:?}", chairs);
        }
        ElectionState::Polling(candidate) => {
            debug_assert_eq!(asked, vec![candidate], "Polling state out of sync");
            debug_assert!(chairs.is_empty(), "Polling while chair {:?} is seated", chairs);
        }
        ElectionState::Resolved(chair) => {
            debug_assert!(asked.is_empty(), "Resolved election with candidate {:?}", asked);
            debug_assert_eq!(chairs, vec![chair], "Resolved state out of sync");
        }
    }

    if room.game().is_started() {
        debug_assert!(
            room.election().candidate().is_none(),
            "Chair question outstanding after game start"
        );
    }
}
