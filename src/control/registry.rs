//! Process-wide table of active control functions.
//!
//! One slot per (vessel, channel). Ownership of a slot is tracked by a
//! generation number: every install or replace stamps the slot with a fresh
//! generation, and a [`ControlManager`] is current only while its generation
//! matches. Generations come from a single counter that never goes
//! backwards, so a slot that is released and later re-created can never
//! revive an old manager.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::ControlConfig;
use crate::error::EvaluationError;

use super::diagnostics::{ControlFault, FaultLog};
use super::function::{BoundFunction, ControlFunction};
use super::kind::ChannelKind;
use super::manager::ControlManager;
use super::overrides::InputOverride;
use super::types::{Channel, ControlValue, VesselId};

// ---------------------------------------------------------------------------
// Slot table
// ---------------------------------------------------------------------------

pub(super) struct Slot {
    pub(super) function: Arc<BoundFunction>,
    pub(super) generation: u64,
}

#[derive(Default)]
pub(super) struct VesselSlots {
    pub(super) slots: [Option<Slot>; Channel::COUNT],
    pub(super) overrides: Vec<InputOverride>,
}

impl VesselSlots {
    fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none) && self.overrides.is_empty()
    }

    fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[derive(Default)]
pub(super) struct SlotTable {
    pub(super) vessels: HashMap<VesselId, VesselSlots>,
    pub(super) ticks: u64,
    last_generation: u64,
}

impl SlotTable {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn slot(&self, vessel: VesselId, channel: Channel) -> Option<&Slot> {
        self.vessels.get(&vessel)?.slots[channel.index()].as_ref()
    }

    fn slot_mut(&mut self, vessel: VesselId, channel: Channel) -> Option<&mut Slot> {
        self.vessels.get_mut(&vessel)?.slots[channel.index()].as_mut()
    }

    fn is_current(&self, vessel: VesselId, channel: Channel, generation: u64) -> bool {
        self.slot(vessel, channel).is_some_and(|s| s.generation == generation)
    }

    /// Drop the vessel's entry once nothing is left in it.
    pub(super) fn prune(&mut self, vessel: VesselId) {
        if self.vessels.get(&vessel).is_some_and(VesselSlots::is_empty) {
            self.vessels.remove(&vessel);
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared by the registry handle and (weakly) by every manager.
pub(crate) struct Shared {
    pub(super) table: RwLock<SlotTable>,
    pub(super) faults: Mutex<FaultLog>,
    pub(super) config: ControlConfig,
}

impl Shared {
    pub(super) fn is_current(&self, vessel: VesselId, channel: Channel, generation: u64) -> bool {
        self.table.read().is_current(vessel, channel, generation)
    }

    /// Swap the function in place if `generation` still owns the slot.
    /// Returns the new generation on success.
    pub(super) fn replace(
        &self,
        vessel: VesselId,
        channel: Channel,
        generation: u64,
        function: BoundFunction,
    ) -> Option<u64> {
        let mut table = self.table.write();
        if !table.is_current(vessel, channel, generation) {
            return None;
        }
        let next = table.next_generation();
        let slot = table.slot_mut(vessel, channel)?;
        slot.function = Arc::new(function);
        slot.generation = next;
        debug!(%vessel, %channel, generation = next, function = slot.function.label(), "control replaced");
        Some(next)
    }

    /// Clear the slot if `generation` still owns it.
    pub(super) fn release(&self, vessel: VesselId, channel: Channel, generation: u64) -> bool {
        let mut table = self.table.write();
        if !table.is_current(vessel, channel, generation) {
            return false;
        }
        if let Some(slots) = table.vessels.get_mut(&vessel) {
            slots.slots[channel.index()] = None;
        }
        table.prune(vessel);
        debug!(%vessel, %channel, generation, "control released");
        true
    }

    /// Evaluate one function, containing any failure to this pair and tick.
    pub(super) fn resolve(
        &self,
        tick: u64,
        vessel: VesselId,
        channel: Channel,
        function: &BoundFunction,
        sim_time: f64,
    ) -> Option<ControlValue> {
        // A panicking function is a fault like any other; it must not unwind
        // through the tick.
        let evaluated = panic::catch_unwind(AssertUnwindSafe(|| function.evaluate(sim_time)))
            .unwrap_or_else(|payload| Err(EvaluationError::panicked(payload.as_ref())));
        let outcome = evaluated.and_then(|value| {
            if self.config.reject_non_finite && !value.is_finite() {
                Err(EvaluationError::non_finite())
            } else {
                Ok(value)
            }
        });

        match outcome {
            Ok(value) if self.config.clamp_outputs => Some(value.clamped()),
            Ok(value) => Some(value),
            Err(error) => {
                warn!(
                    %vessel,
                    %channel,
                    tick,
                    sim_time,
                    function = function.label(),
                    %error,
                    "control function failed, channel left to native control this tick"
                );
                self.faults.lock().push(ControlFault {
                    tick,
                    sim_time,
                    vessel,
                    channel,
                    function: function.label().to_owned(),
                    error,
                });
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Registry handle
// ---------------------------------------------------------------------------

/// Arbitrates which control function drives each vessel channel.
///
/// Create one per session and hand clones to both the tick driver and the
/// scripting layer; clones share the same table. Managers only hold a weak
/// reference, so dropping the last registry handle ends the session and
/// turns every outstanding manager stale.
#[derive(Clone)]
pub struct VesselControlRegistry {
    pub(super) shared: Arc<Shared>,
}

impl VesselControlRegistry {
    pub fn new(config: ControlConfig) -> Self {
        let faults = FaultLog::new(config.fault_log_capacity);
        Self {
            shared: Arc::new(Shared {
                table: RwLock::new(SlotTable::default()),
                faults: Mutex::new(faults),
                config,
            }),
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.shared.config
    }

    /// Take over channel `K` on `vessel`, superseding whatever owned it.
    ///
    /// Never fails; the slot (and the vessel's slot set) is created on demand.
    pub fn install<K, F>(&self, vessel: VesselId, function: F) -> ControlManager<K>
    where
        K: ChannelKind,
        F: ControlFunction<K::Output> + 'static,
    {
        let function = Arc::new(BoundFunction::bind::<K, F>(function));
        let label = function.label().to_owned();

        let mut table = self.shared.table.write();
        let generation = table.next_generation();
        let previous = table.vessels.entry(vessel).or_default().slots[K::CHANNEL.index()]
            .replace(Slot { function, generation });
        drop(table);

        match previous {
            Some(old) => debug!(
                %vessel,
                channel = %K::CHANNEL,
                generation,
                superseded = old.generation,
                function = %label,
                "control installed over previous owner"
            ),
            None => debug!(%vessel, channel = %K::CHANNEL, generation, function = %label, "control installed"),
        }

        ControlManager::new(vessel, generation, Arc::downgrade(&self.shared))
    }

    /// Current output of the function installed on (vessel, channel).
    ///
    /// `None` means "no override": either nothing is installed or the
    /// function failed (the failure is recorded in [`faults`](Self::faults)).
    pub fn evaluate(&self, vessel: VesselId, channel: Channel, sim_time: f64) -> Option<ControlValue> {
        let (tick, function) = {
            let table = self.shared.table.read();
            (table.ticks, Arc::clone(&table.slot(vessel, channel)?.function))
        };
        self.shared.resolve(tick, vessel, channel, &function, sim_time)
    }

    /// Release through the registry; same as [`ControlManager::release`].
    pub fn release<K: ChannelKind>(&self, manager: &mut ControlManager<K>) -> bool {
        manager.release()
    }

    /// Give every channel of `vessel` back to native control in one step.
    ///
    /// Returns the number of channels that were active. Pending input
    /// overrides for the vessel are discarded too.
    pub fn release_all(&self, vessel: VesselId) -> usize {
        let removed = self.shared.table.write().vessels.remove(&vessel);
        let released = removed.as_ref().map_or(0, VesselSlots::active_count);
        if released > 0 {
            debug!(%vessel, channels = released, "all control released");
        }
        released
    }

    /// The host destroyed `vessel`: drop everything held for it.
    pub fn release_vessel(&self, vessel: VesselId) -> usize {
        let released = self.release_all(vessel);
        debug!(%vessel, channels = released, "vessel destroyed, slot set discarded");
        released
    }

    /// Channels of `vessel` that currently carry an override, in dispatch order.
    pub fn active_channels(&self, vessel: VesselId) -> Vec<Channel> {
        let table = self.shared.table.read();
        let Some(slots) = table.vessels.get(&vessel) else {
            return Vec::new();
        };
        Channel::ALL
            .into_iter()
            .filter(|c| slots.slots[c.index()].is_some())
            .collect()
    }

    pub fn has_overrides(&self, vessel: VesselId) -> bool {
        !self.active_channels(vessel).is_empty()
    }

    /// Number of vessels with at least one active slot or pending input.
    pub fn vessel_count(&self) -> usize {
        self.shared.table.read().vessels.len()
    }

    /// Ticks dispatched so far.
    pub fn tick_count(&self) -> u64 {
        self.shared.table.read().ticks
    }

    /// Most recent evaluation faults, oldest first.
    pub fn faults(&self) -> Vec<ControlFault> {
        self.shared.faults.lock().recent()
    }

    pub fn drain_faults(&self) -> Vec<ControlFault> {
        self.shared.faults.lock().drain()
    }

    /// Faults recorded over the registry's lifetime, including evicted ones.
    pub fn total_faults(&self) -> u64 {
        self.shared.faults.lock().total()
    }
}

impl Default for VesselControlRegistry {
    fn default() -> Self {
        Self::new(ControlConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
