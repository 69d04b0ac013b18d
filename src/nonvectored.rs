use axerrno::{ax_err, AxResult};
use bitmaps::Bitmap;
use log::debug;

use crate::consts::*;
use crate::isr::{InterruptHandler, Spurious};
use crate::table::{Binding, PriorityTable};

/// A handler bound to a line for software polled dispatch.
#[derive(Clone, Copy)]
pub struct NonVectoredEntry {
    /// Line served by this entry, `None` when vacant.
    pub irq: Option<usize>,
    /// The routine, [`Spurious`] when vacant.
    pub handler: &'static dyn InterruptHandler,
    /// Priority of this entry, `None` when vacant.
    pub priority: Option<u8>,
}

impl Binding for NonVectoredEntry {
    const VACANT: Self = Self {
        irq: None,
        handler: &Spurious,
        priority: None,
    };

    fn irq(&self) -> Option<usize> {
        self.irq
    }

    fn priority(&self) -> Option<u8> {
        self.priority
    }
}

/// Handlers serviced by scanning VICIRQSTATUS in priority order.
pub struct NonVectoredRegistry {
    table: PriorityTable<NonVectoredEntry>,
}

impl NonVectoredRegistry {
    pub const fn new() -> Self {
        Self {
            table: PriorityTable::new(),
        }
    }

    pub fn entries(&self) -> &[NonVectoredEntry; NR_INTERRUPTS] {
        self.table.entries()
    }

    pub fn position(&self, irq: usize) -> Option<usize> {
        self.table.position(irq)
    }

    /// Binds `handler` to `irq`, replacing and re-sorting any previous binding.
    ///
    /// Only the low 7 bits of `priority` are kept; a higher value means the
    /// handler runs earlier. Returns the entry's position in the table.
    pub fn register(
        &mut self,
        irq: usize,
        handler: &'static dyn InterruptHandler,
        priority: u8,
    ) -> AxResult<usize> {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "non-vectored IRQ out of range");
        }
        let priority = priority & PRIORITY_MASK;
        let pos = self.table.insert(
            NonVectoredEntry {
                irq: Some(irq),
                handler,
                priority: Some(priority),
            },
            |_, _| {},
        );
        debug!("non-vectored IRQ {irq} registered at {pos} with priority {priority}");
        Ok(pos)
    }

    /// Removes the binding for `irq`, if any.
    pub fn unregister(&mut self, irq: usize) {
        if let Some(pos) = self.table.remove(irq, |_, _| {}) {
            debug!("non-vectored IRQ {irq} unregistered from {pos}");
        }
    }

    pub fn reset(&mut self) {
        self.table.clear(|_, _| {});
    }

    /// Invokes, in priority order, every handler whose line is set in `status`.
    ///
    /// The scan stops at the first vacant entry, which relies on the table
    /// being dense. Returns how many handlers ran.
    pub fn service(&self, status: Bitmap<NR_INTERRUPTS>) -> usize {
        let mut serviced = 0;
        for entry in self.table.entries() {
            let Some(irq) = entry.irq else {
                break;
            };
            if status.get(irq) {
                entry.handler.handle();
                serviced += 1;
            }
        }
        serviced
    }

    #[cfg(test)]
    pub(crate) fn table_mut(&mut self) -> &mut PriorityTable<NonVectoredEntry> {
        &mut self.table
    }
}

impl Default for NonVectoredRegistry {
    fn default() -> Self {
        Self::new()
    }
}
