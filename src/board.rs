//! Versatile Application Baseboard for ARM926EJ-S (DUI0225D).

use axaddrspace::HostPhysAddr;

use crate::cpu::Arm926Cpu;
use crate::regs::{MmioRegisters, Vic};
use crate::Pic;

/// Base address of the primary interrupt controller.
pub const PIC_BASE: usize = 0x1014_0000;

pub const IRQ_WATCHDOG: usize = 0;
pub const IRQ_SOFTWARE: usize = crate::SOFTWARE_IRQ;
pub const IRQ_TIMER0: usize = 4;
pub const IRQ_TIMER1: usize = 5;
pub const IRQ_RTC: usize = 10;
pub const IRQ_UART0: usize = 12;
pub const IRQ_UART1: usize = 13;
pub const IRQ_UART2: usize = 14;

/// The controller of this board.
pub type VersatilePic = Pic<MmioRegisters, Arm926Cpu>;

/// Wraps the board's controller. Nothing is written until `init`.
///
/// # Safety
///
/// The PL190 must be identity mapped at [`PIC_BASE`], and there must be at
/// most one live instance.
pub const unsafe fn versatile_pic() -> VersatilePic {
    Pic::new(
        MmioRegisters::new(HostPhysAddr::from_usize(PIC_BASE)),
        Arm926Cpu,
    )
}

/// A register-only view of the board's controller, independent of any
/// [`VersatilePic`].
///
/// # Safety
///
/// The PL190 must be identity mapped at [`PIC_BASE`].
pub const unsafe fn versatile_vic() -> Vic<MmioRegisters> {
    Vic::new(MmioRegisters::new(HostPhysAddr::from_usize(PIC_BASE)))
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod global {
    use spin::Mutex;

    use super::*;
    use crate::cpu::{without_irq, PrivilegedControl};

    static PIC: Mutex<Option<VersatilePic>> = Mutex::new(None);

    /// Relocates the exception vectors and brings up the board's controller
    /// with IRQ delivery masked.
    pub fn init() {
        crate::relocate::copy_vectors();
        without_irq(&Arm926Cpu, || {
            // SAFETY: this is the only instance, owned by `PIC`.
            let mut pic = unsafe { versatile_pic() };
            pic.init();
            *PIC.lock() = Some(pic);
        });
    }

    /// Runs `f` on the board's controller with IRQ delivery masked.
    ///
    /// Returns `None` before [`init`]. Must not be called from an interrupt
    /// handler: dispatch holds the controller for the whole IRQ, so this
    /// would spin forever. Handlers use [`vic`] instead.
    pub fn with_pic<T>(f: impl FnOnce(&mut VersatilePic) -> T) -> Option<T> {
        without_irq(&Arm926Cpu, || PIC.lock().as_mut().map(f))
    }

    /// Register access for interrupt handlers, e.g. to acknowledge a
    /// software interrupt or mask their own line. Takes no lock.
    pub fn vic() -> Vic<MmioRegisters> {
        // SAFETY: the board maps the PL190 at `PIC_BASE`.
        unsafe { versatile_vic() }
    }

    /// Unmasks IRQ delivery.
    pub fn enable_irq_mode() {
        Arm926Cpu.enable_irq();
    }

    /// Called by the IRQ exception vector.
    #[no_mangle]
    pub extern "C" fn _pic_irq_handler() {
        // Mutators hold the lock only with IRQs masked, so it is normally
        // free here; never spin on it in interrupt context.
        match PIC.try_lock() {
            Some(guard) => match guard.as_ref() {
                Some(pic) => pic.handle_irq(),
                None => log::warn!("IRQ before controller init"),
            },
            None => log::warn!("IRQ while controller is locked"),
        }
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use global::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_lines_fit_the_controller() {
        for irq in [
            IRQ_WATCHDOG,
            IRQ_SOFTWARE,
            IRQ_TIMER0,
            IRQ_TIMER1,
            IRQ_RTC,
            IRQ_UART0,
            IRQ_UART1,
            IRQ_UART2,
        ] {
            assert!(irq < crate::NR_INTERRUPTS);
        }
        assert_eq!(IRQ_SOFTWARE, 1);
    }

    #[test]
    fn controller_sits_at_pic_base() {
        let pic = unsafe { versatile_pic() };
        assert_eq!(pic.vic.regs().base.as_usize(), PIC_BASE);
        let vic = unsafe { versatile_vic() };
        assert_eq!(vic.regs().base.as_usize(), PIC_BASE);
    }
}
