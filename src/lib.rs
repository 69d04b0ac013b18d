#![cfg_attr(not(test), no_std)]

mod consts;
mod utils;

pub mod board;
pub mod cpu;
pub mod dispatch;
pub mod isr;
pub mod nonvectored;
pub mod regs;
pub mod relocate;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod table;
pub mod vectored;

pub use consts::*;
pub use cpu::{without_irq, Arm926Cpu, PrivilegedControl};
pub use dispatch::DispatchMode;
pub use isr::{ContextIsr, InterruptHandler, VectoredIsr};
pub use regs::{MmioRegisters, RegisterAccess, Vic};

use axerrno::AxResult;
use log::debug;
use portable_atomic::{AtomicUsize, Ordering};

use isr::{default_vector_isr, isr_addr};
use nonvectored::NonVectoredRegistry;
use vectored::VectoredRegistry;

/// Class of exception a line raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    Irq,
    Fiq,
}

/// Interrupt line reserved for software generated interrupts.
pub const SOFTWARE_IRQ: usize = 1;

/// State of one primary interrupt controller.
///
/// Mutating operations must not race with [`Pic::handle_irq`]; run them with
/// IRQ delivery masked, e.g. through [`Pic::masked`].
pub struct Pic<R, C> {
    /// The controller's registers.
    pub vic: Vic<R>,
    /// Status word control of the CPU the controller interrupts.
    pub cpu: C,
    /// Software polled handlers.
    non_vectored: NonVectoredRegistry,
    /// Hardware vectored handlers.
    vectored: VectoredRegistry,
    /// How [`Pic::handle_irq`] finds handlers.
    mode: DispatchMode,
    /// Times a dispatch ended up in the dummy handler.
    spurious: AtomicUsize,
}

impl<R, C> Pic<R, C> {
    /// Wraps a controller. Nothing is written until [`init`](Self::init).
    pub const fn new(regs: R, cpu: C) -> Self {
        Self {
            vic: Vic::new(regs),
            cpu,
            non_vectored: NonVectoredRegistry::new(),
            vectored: VectoredRegistry::new(),
            mode: DispatchMode::NonVectored,
            spurious: AtomicUsize::new(0),
        }
    }

    pub fn non_vectored(&self) -> &NonVectoredRegistry {
        &self.non_vectored
    }

    pub fn vectored(&self) -> &VectoredRegistry {
        &self.vectored
    }
}

impl<R: RegisterAccess, C: PrivilegedControl> Pic<R, C> {
    /// Puts the controller into a known empty state.
    ///
    /// All lines are routed to IRQ and disabled, software interrupts are
    /// cleared, every vector slot points at the dummy handler, both tables are
    /// emptied, dispatch falls back to non-vectored mode and the spurious
    /// count restarts at zero.
    pub fn init(&mut self) {
        self.vic.set_int_select(0);
        self.vic.disable_lines(ALL_LINES);
        self.vic.clear_soft(ALL_LINES);
        self.vic.set_def_vect_addr(isr_addr(default_vector_isr));

        self.vectored.reset(&self.vic);
        self.non_vectored.reset();
        self.mode = DispatchMode::NonVectored;
        self.spurious.store(0, Ordering::Relaxed);
        debug!("VIC {:#x} initialized", self.vic.peripheral_id());
    }

    /// Unmasks IRQ delivery on the CPU.
    pub fn enable_irq_mode(&self) {
        self.cpu.enable_irq();
    }

    /// Masks IRQ delivery on the CPU.
    pub fn disable_irq_mode(&self) {
        self.cpu.disable_irq();
    }

    /// Runs `f` with IRQ delivery masked on the CPU.
    pub fn masked<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.cpu.read_status();
        self.cpu.disable_irq();
        let ret = f(self);
        self.cpu.write_status(saved);
        ret
    }

    pub fn enable_interrupt(&self, irq: usize) -> AxResult {
        self.vic.enable_interrupt(irq)
    }

    pub fn disable_interrupt(&self, irq: usize) -> AxResult {
        self.vic.disable_interrupt(irq)
    }

    pub fn disable_all_interrupts(&self) {
        self.vic.disable_lines(ALL_LINES);
    }

    pub fn is_interrupt_enabled(&self, irq: usize) -> bool {
        self.vic.is_interrupt_enabled(irq)
    }

    pub fn interrupt_type(&self, irq: usize) -> Option<InterruptType> {
        self.vic.interrupt_type(irq)
    }

    pub fn set_interrupt_type(&self, irq: usize, ty: InterruptType) -> AxResult {
        self.vic.set_interrupt_type(irq, ty)
    }

    /// Replaces the routine the VIC jumps to when no vector slot matches.
    ///
    /// This bypasses the scan of vectored entries that did not fit into a
    /// hardware slot.
    pub fn set_default_vector_addr(&self, isr: VectoredIsr) {
        self.vic.set_def_vect_addr(isr_addr(isr));
    }

    /// See [`NonVectoredRegistry::register`].
    pub fn register_non_vectored_irq(
        &mut self,
        irq: usize,
        handler: &'static dyn InterruptHandler,
        priority: u8,
    ) -> AxResult<usize> {
        self.non_vectored.register(irq, handler, priority)
    }

    pub fn unregister_non_vectored_irq(&mut self, irq: usize) {
        self.non_vectored.unregister(irq)
    }

    /// See [`VectoredRegistry::register`].
    pub fn register_vector_irq(
        &mut self,
        irq: usize,
        isr: VectoredIsr,
        priority: u8,
    ) -> AxResult<usize> {
        self.vectored.register(&self.vic, irq, isr, priority)
    }

    pub fn unregister_vector_irq(&mut self, irq: usize) {
        self.vectored.unregister(&self.vic, irq)
    }

    /// Returns the hardware slot serving `irq`.
    pub fn enable_vector_irq(&self, irq: usize) -> AxResult<usize> {
        self.vectored.enable_slot(&self.vic, irq)
    }

    pub fn disable_vector_irq(&self, irq: usize) {
        self.vectored.disable_slot(&self.vic, irq)
    }

    pub fn unregister_all_vector_irqs(&mut self) {
        self.vectored.unregister_all(&self.vic)
    }

    pub fn disable_all_vector_irqs(&self) {
        self.vectored.disable_all_slots(&self.vic)
    }

    /// See [`Vic::set_sw_interrupt`].
    pub fn set_sw_interrupt(&self, irq: usize) -> AxResult<usize> {
        self.vic.set_sw_interrupt(irq)
    }

    /// See [`Vic::clear_sw_interrupt`].
    pub fn clear_sw_interrupt(&self, irq: usize) -> AxResult<usize> {
        self.vic.clear_sw_interrupt(irq)
    }

    /// Raises the interrupt reserved for software use.
    pub fn set_software_interrupt(&self) -> AxResult<usize> {
        self.set_sw_interrupt(SOFTWARE_IRQ)
    }

    pub fn clear_software_interrupt(&self) -> AxResult<usize> {
        self.clear_sw_interrupt(SOFTWARE_IRQ)
    }
}
