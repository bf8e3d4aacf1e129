use crate::hardware::{InterruptStatus, TimerId, UnitId};
use crate::phase::PendingFlag;

/// Reaction to "PWM period completed" interrupts of the inverter unit.
///
/// Runs in interrupt context: reads the status word once, marks the legs whose
/// timers fired, then acknowledges exactly the bits it read. No table access,
/// no duty computation.
pub struct CycleCompletionHandler<'a> {
    unit: UnitId,
    sources: [(u32, &'a PendingFlag); 3],
}

impl<'a> CycleCompletionHandler<'a> {
    pub fn new(unit: UnitId, sources: [(TimerId, &'a PendingFlag); 3]) -> Self {
        Self {
            unit,
            sources: sources.map(|(timer, flag)| (timer.period_elapsed_bit(), flag)),
        }
    }

    /// Returns the status word that was handled.
    #[inline]
    pub fn on_interrupt<S: InterruptStatus>(&self, hw: &mut S) -> u32 {
        let status = hw.read_status(self.unit);
        for (bit, flag) in self.sources.iter() {
            if status & bit != 0 {
                flag.mark_dirty();
            }
        }
        hw.clear(self.unit, status);
        status
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }
}
