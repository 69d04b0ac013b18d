/// CPSR bit that masks IRQ delivery when set.
pub const CPSR_IRQ_DISABLE: u32 = 0x80;

/// CPSR bit that masks FIQ delivery when set.
pub const CPSR_FIQ_DISABLE: u32 = 0x40;

/// Privileged access to the processor status word.
///
/// Only the control field is ever written, mode and condition flags are left
/// to the implementation.
pub trait PrivilegedControl {
    fn read_status(&self) -> u32;
    fn write_status(&self, status: u32);

    /// Unmasks IRQ delivery.
    fn enable_irq(&self) {
        self.write_status(self.read_status() & !CPSR_IRQ_DISABLE);
    }

    /// Masks IRQ delivery.
    fn disable_irq(&self) {
        self.write_status(self.read_status() | CPSR_IRQ_DISABLE);
    }

    fn enable_fiq(&self) {
        self.write_status(self.read_status() & !CPSR_FIQ_DISABLE);
    }

    fn disable_fiq(&self) {
        self.write_status(self.read_status() | CPSR_FIQ_DISABLE);
    }

    fn irq_enabled(&self) -> bool {
        self.read_status() & CPSR_IRQ_DISABLE == 0
    }

    fn fiq_enabled(&self) -> bool {
        self.read_status() & CPSR_FIQ_DISABLE == 0
    }
}

/// Runs `f` with IRQ delivery masked, then restores the previous status word.
pub fn without_irq<C, F, T>(cpu: &C, f: F) -> T
where
    C: PrivilegedControl + ?Sized,
    F: FnOnce() -> T,
{
    let saved = cpu.read_status();
    cpu.write_status(saved | CPSR_IRQ_DISABLE);
    let ret = f();
    cpu.write_status(saved);
    ret
}

/// The ARM926EJ-S core the firmware runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct Arm926Cpu;

#[cfg(target_arch = "arm")]
impl PrivilegedControl for Arm926Cpu {
    fn read_status(&self) -> u32 {
        let status: u32;
        unsafe { core::arch::asm!("mrs {}, cpsr", out(reg) status, options(nomem, nostack)) };
        status
    }

    fn write_status(&self, status: u32) {
        unsafe { core::arch::asm!("msr cpsr_c, {}", in(reg) status, options(nostack)) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimCpu;

    #[test]
    fn irq_and_fiq_bits_are_independent() {
        let cpu = SimCpu::new();
        assert!(!cpu.irq_enabled());
        assert!(!cpu.fiq_enabled());

        cpu.enable_irq();
        assert!(cpu.irq_enabled());
        assert!(!cpu.fiq_enabled());

        cpu.enable_fiq();
        cpu.disable_irq();
        assert!(!cpu.irq_enabled());
        assert!(cpu.fiq_enabled());
    }

    #[test]
    fn without_irq_restores_previous_state() {
        let cpu = SimCpu::new();
        cpu.enable_irq();

        let seen = without_irq(&cpu, || cpu.irq_enabled());
        assert!(!seen);
        assert!(cpu.irq_enabled());

        cpu.disable_irq();
        without_irq(&cpu, || ());
        assert!(!cpu.irq_enabled());
    }
}
