//! Slot bookkeeping shared by the acquire/release engine and the eviction sweep
//!
//! Everything here is synchronous. Callers hold the pool lock for the whole
//! scan-and-transition, so a slot is always observed in exactly one state.

use std::time::Instant;

/// Identifies an in-flight creation independently of its slot index.
///
/// Eviction compacts the slot sequence, so the index a creation reserved may
/// move before the creation completes.
pub(crate) type Ticket = u64;

#[derive(Debug)]
pub(crate) enum Slot<R> {
    /// Idle resource, available since `returned_at`
    Free { resource: R, returned_at: Instant },
    /// Checked out
    Busy { resource: R },
    /// Creation in flight
    Reserved { ticket: Ticket },
    /// Reusable position
    Empty,
}

impl<R> Slot<R> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Slot::Free { .. })
    }
}

/// Per-state slot counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SlotCounts {
    pub free: usize,
    pub busy: usize,
    pub reserved: usize,
}

impl SlotCounts {
    pub fn occupied_or_reserved(&self) -> usize {
        self.free + self.busy + self.reserved
    }
}

/// Free slot captured by an eviction sweep
#[derive(Debug)]
pub(crate) struct IdleSlot<R> {
    pub index: usize,
    pub resource: R,
    pub returned_at: Instant,
}

/// Slot sequence plus pool bounds
pub(crate) struct SlotStore<R> {
    slots: Vec<Slot<R>>,
    min_count: usize,
    max_count: Option<usize>,
    next_ticket: Ticket,
}

impl<R: Clone> SlotStore<R> {
    pub fn new(min_count: usize, max_count: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            min_count,
            max_count,
            next_ticket: 0,
        }
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }

    pub fn max_count(&self) -> Option<usize> {
        self.max_count
    }

    /// Claim the first free slot, marking it busy
    pub fn claim_free(&mut self) -> Option<R> {
        let slot = self.slots.iter_mut().find(|slot| slot.is_free())?;
        let Slot::Free { resource, .. } = slot else {
            return None;
        };
        let resource = resource.clone();
        *slot = Slot::Busy {
            resource: resource.clone(),
        };
        Some(resource)
    }

    /// Whether another slot may be reserved without exceeding `max_count`
    pub fn has_capacity(&self) -> bool {
        match self.max_count {
            Some(max) => self.counts().occupied_or_reserved() < max,
            None => true,
        }
    }

    /// Reserve the first empty slot, or a new one at the end
    pub fn reserve(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);

        let reserved = Slot::Reserved { ticket };
        match self.slots.iter_mut().find(|slot| slot.is_empty()) {
            Some(slot) => *slot = reserved,
            None => self.slots.push(reserved),
        }
        ticket
    }

    fn reserved_slot(&mut self, ticket: Ticket) -> Option<&mut Slot<R>> {
        self.slots
            .iter_mut()
            .find(|slot| matches!(slot, Slot::Reserved { ticket: t } if *t == ticket))
    }

    /// Fill a reservation with a freshly created resource.
    ///
    /// Returns `false` when the reservation no longer exists, in which case
    /// the resource is appended so it stays accounted for. The pool never
    /// completes a cancelled ticket, so that path is a fallback only.
    pub fn fill(&mut self, ticket: Ticket, slot_state: Slot<R>) -> bool {
        match self.reserved_slot(ticket) {
            Some(slot) => {
                *slot = slot_state;
                true
            }
            None => {
                self.slots.push(slot_state);
                false
            }
        }
    }

    /// Give a reservation back after a failed or abandoned creation
    pub fn cancel(&mut self, ticket: Ticket) {
        if let Some(slot) = self.reserved_slot(ticket) {
            *slot = Slot::Empty;
        }
    }

    /// Mark the busy slot holding `resource` as free
    pub fn mark_free<F>(&mut self, resource: &R, equality: F, now: Instant) -> bool
    where
        F: Fn(&R, &R) -> bool,
    {
        let found = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Slot::Busy { resource: held } if equality(held, resource)));

        let Some(slot) = found else {
            return false;
        };
        if let Slot::Busy { resource } = std::mem::replace(slot, Slot::Empty) {
            *slot = Slot::Free {
                resource,
                returned_at: now,
            };
        }
        true
    }

    pub fn counts(&self) -> SlotCounts {
        let mut counts = SlotCounts::default();
        for slot in &self.slots {
            match slot {
                Slot::Free { .. } => counts.free += 1,
                Slot::Busy { .. } => counts.busy += 1,
                Slot::Reserved { .. } => counts.reserved += 1,
                Slot::Empty => {}
            }
        }
        counts
    }

    /// Snapshot the free slots at or past `min_count`
    pub fn idle_candidates(&self) -> Vec<IdleSlot<R>> {
        self.slots
            .iter()
            .enumerate()
            .skip(self.min_count)
            .filter_map(|(index, slot)| match slot {
                Slot::Free {
                    resource,
                    returned_at,
                } => Some(IdleSlot {
                    index,
                    resource: resource.clone(),
                    returned_at: *returned_at,
                }),
                _ => None,
            })
            .collect()
    }

    /// Remove the accepted candidates that are still idle, then drop empty
    /// slots from the sequence.
    ///
    /// A candidate whose slot was claimed (or claimed and released again)
    /// since the snapshot is kept.
    pub fn remove_idle<F>(&mut self, accepted: Vec<IdleSlot<R>>, equality: F) -> Vec<R>
    where
        F: Fn(&R, &R) -> bool,
    {
        let mut evicted = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            let Some(slot) = self.slots.get_mut(candidate.index) else {
                continue;
            };
            let unchanged = matches!(
                slot,
                Slot::Free { resource, returned_at }
                    if *returned_at == candidate.returned_at && equality(resource, &candidate.resource)
            );
            if !unchanged {
                continue;
            }
            if let Slot::Free { resource, .. } = std::mem::replace(slot, Slot::Empty) {
                evicted.push(resource);
            }
        }
        self.slots.retain(|slot| !slot.is_empty());
        evicted
    }

    #[cfg(test)]
    pub fn slots(&self) -> &[Slot<R>] {
        &self.slots
    }
}
