use axerrno::{ax_err, AxResult};
use log::{debug, trace};

use crate::consts::*;
use crate::isr::{dummy_isr, isr_addr, VectoredIsr};
use crate::regs::{RegisterAccess, Vic};
use crate::table::{Binding, PriorityTable};

/// A routine bound to a line for hardware vectored dispatch.
#[derive(Clone, Copy)]
pub struct VectoredEntry {
    /// Line served by this entry, `None` when vacant.
    pub irq: Option<usize>,
    /// The routine, [`dummy_isr`] when vacant.
    pub isr: VectoredIsr,
    /// Priority of this entry, `None` when vacant.
    pub priority: Option<u8>,
}

impl Binding for VectoredEntry {
    const VACANT: Self = Self {
        irq: None,
        isr: dummy_isr,
        priority: None,
    };

    fn irq(&self) -> Option<usize> {
        self.irq
    }

    fn priority(&self) -> Option<u8> {
        self.priority
    }
}

/// Writes entry `pos` into hardware vector slot `pos` if it has one.
fn mirror<R: RegisterAccess>(vic: &Vic<R>, pos: usize, entry: &VectoredEntry) {
    if pos >= NR_VECTORS {
        return;
    }
    match entry.irq {
        Some(irq) => {
            vic.set_slot_cntl(pos, (irq & VECT_CNTL_IRQ_MASK) | VECT_CNTL_ENABLE);
            vic.set_slot_addr(pos, isr_addr(entry.isr));
        }
        None => {
            vic.set_slot_cntl(pos, 0);
            vic.set_slot_addr(pos, isr_addr(dummy_isr));
        }
    }
}

/// Handlers dispatched by the VIC's own priority logic.
///
/// The first [`NR_VECTORS`] entries are mirrored into the VICVECTADDRn and
/// VICVECTCNTLn registers; the rest are only reachable through the default
/// vector.
pub struct VectoredRegistry {
    table: PriorityTable<VectoredEntry>,
}

impl VectoredRegistry {
    pub const fn new() -> Self {
        Self {
            table: PriorityTable::new(),
        }
    }

    pub fn entries(&self) -> &[VectoredEntry; NR_INTERRUPTS] {
        self.table.entries()
    }

    pub fn position(&self, irq: usize) -> Option<usize> {
        self.table.position(irq)
    }

    /// Vacates the whole table and every hardware slot.
    pub fn reset<R: RegisterAccess>(&mut self, vic: &Vic<R>) {
        self.table.clear(|pos, e| mirror(vic, pos, e));
    }

    /// Binds `isr` to `irq`, replacing and re-sorting any previous binding.
    ///
    /// Every table position rewritten on the way that has a hardware slot is
    /// written through to the VIC, so slots and table agree when this returns.
    /// The slot, if any, is enabled. Returns the entry's position.
    pub fn register<R: RegisterAccess>(
        &mut self,
        vic: &Vic<R>,
        irq: usize,
        isr: VectoredIsr,
        priority: u8,
    ) -> AxResult<usize> {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "vectored IRQ out of range");
        }
        let priority = priority & PRIORITY_MASK;
        let pos = self.table.insert(
            VectoredEntry {
                irq: Some(irq),
                isr,
                priority: Some(priority),
            },
            |pos, e| mirror(vic, pos, e),
        );
        debug!("vectored IRQ {irq} registered at {pos} with priority {priority}");
        Ok(pos)
    }

    /// Removes the binding for `irq`, if any, shifting later entries and
    /// their hardware slots up by one.
    pub fn unregister<R: RegisterAccess>(&mut self, vic: &Vic<R>, irq: usize) {
        if let Some(pos) = self.table.remove(irq, |pos, e| mirror(vic, pos, e)) {
            debug!("vectored IRQ {irq} unregistered from {pos}");
        }
    }

    /// Same as [`reset`](Self::reset).
    pub fn unregister_all<R: RegisterAccess>(&mut self, vic: &Vic<R>) {
        self.reset(vic);
        debug!("all vectored IRQs unregistered");
    }

    /// Sets the enable bit of the slot holding `irq`. The table is untouched.
    ///
    /// Returns the slot, or `NotFound` if `irq` is not in a hardware slot.
    pub fn enable_slot<R: RegisterAccess>(&self, vic: &Vic<R>, irq: usize) -> AxResult<usize> {
        let mut found = None;
        for slot in self.slots_of(irq) {
            vic.set_slot_cntl(slot, vic.slot_cntl(slot) | VECT_CNTL_ENABLE);
            found.get_or_insert(slot);
        }
        match found {
            Some(slot) => Ok(slot),
            None => ax_err!(NotFound, "IRQ has no vector slot"),
        }
    }

    /// Clears the enable bit of every slot holding `irq`. The table is untouched.
    pub fn disable_slot<R: RegisterAccess>(&self, vic: &Vic<R>, irq: usize) {
        for slot in self.slots_of(irq) {
            vic.set_slot_cntl(slot, vic.slot_cntl(slot) & !VECT_CNTL_ENABLE);
        }
    }

    /// Clears the enable bit of all hardware slots.
    pub fn disable_all_slots<R: RegisterAccess>(&self, vic: &Vic<R>) {
        for slot in 0..NR_VECTORS {
            vic.set_slot_cntl(slot, vic.slot_cntl(slot) & !VECT_CNTL_ENABLE);
        }
    }

    fn slots_of(&self, irq: usize) -> impl Iterator<Item = usize> + '_ {
        self.table.entries()[..NR_VECTORS]
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.irq == Some(irq))
            .map(|(slot, _)| slot)
    }

    /// Services an interrupt that matched no hardware slot.
    ///
    /// Scans the entries past the hardware slots and runs the first one whose
    /// line is enabled in VICINTENABLE. One routine runs per call. Returns
    /// false if nothing qualified.
    pub fn service_unmirrored<R: RegisterAccess>(&self, vic: &Vic<R>) -> bool {
        let enabled = vic.int_enable();
        let hit = self.table.entries()[NR_VECTORS..]
            .iter()
            .find(|e| matches!(e.irq, Some(irq) if irq < NR_INTERRUPTS && enabled.get(irq)));
        match hit {
            Some(entry) => {
                trace!("default vector serving IRQ {:?}", entry.irq);
                (entry.isr)();
                true
            }
            None => false,
        }
    }
}

impl Default for VectoredRegistry {
    fn default() -> Self {
        Self::new()
    }
}
