use log::{trace, warn};
use portable_atomic::Ordering;

use crate::cpu::PrivilegedControl;
use crate::isr::{default_vector_isr, dummy_isr, isr_addr, isr_from_addr, InterruptHandler, SPURIOUS};
use crate::regs::RegisterAccess;
use crate::Pic;

/// Where [`Pic::handle_irq`] looks for handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Scan the non-vectored table against VICIRQSTATUS.
    NonVectored,
    /// Jump to the address the VIC presents in VICVECTADDR.
    Vectored,
}

impl<R: RegisterAccess, C: PrivilegedControl> Pic<R, C> {
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Firmware picks one mode at start-up and keeps it; switching is meant
    /// for test harnesses.
    #[doc(hidden)]
    pub fn set_dispatch_mode(&mut self, mode: DispatchMode) {
        self.mode = mode;
    }

    /// Number of interrupts that ended up in the dummy handler.
    pub fn spurious_count(&self) -> usize {
        self.spurious.load(Ordering::Relaxed)
    }

    fn spurious(&self) {
        self.spurious.fetch_add(1, Ordering::Relaxed);
    }

    /// Services the pending IRQ. Called from the IRQ exception entry with
    /// IRQ delivery masked.
    ///
    /// Never fails: whatever cannot be matched to a registered handler is
    /// routed to the dummy handler.
    pub fn handle_irq(&self) {
        match self.mode {
            DispatchMode::NonVectored => self.handle_non_vectored(),
            DispatchMode::Vectored => self.handle_vectored(),
        }
    }

    fn handle_non_vectored(&self) {
        let status = self.vic.irq_status();
        trace!("non-vectored IRQ, status {:#x}", status.into_value());
        if self.non_vectored.service(status) == 0 {
            self.spurious();
            SPURIOUS.handle();
        }
    }

    fn handle_vectored(&self) {
        // Reading VICVECTADDR tells the priority hardware servicing started.
        let addr = self.vic.vect_addr();
        trace!("vectored IRQ, vector {addr:#x}");

        if addr == isr_addr(default_vector_isr) {
            if !self.vectored.service_unmirrored(&self.vic) {
                self.spurious();
                dummy_isr();
            }
        } else {
            if addr == isr_addr(dummy_isr) {
                self.spurious();
            }
            // SAFETY: every value the VIC can present was written as a
            // `VectoredIsr` address by this crate or by
            // `set_default_vector_addr`.
            match unsafe { isr_from_addr(addr) } {
                Some(isr) => isr(),
                None => {
                    warn!("VIC presented a null vector");
                    self.spurious();
                    dummy_isr();
                }
            }
        }

        // Any write to VICVECTADDR signals that servicing has completed.
        self.vic.ack_vect_addr();
    }
}
