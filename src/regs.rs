use axaddrspace::{device::AccessWidth, HostPhysAddr};
use axerrno::{ax_err, AxResult};
use bitmaps::Bitmap;

use crate::consts::*;
use crate::utils::*;
use crate::InterruptType;

/// Word-sized access to the controller's register block.
///
/// Every call is exactly one bus access with whatever side effect the
/// hardware attaches to it, so callers must not assume reads are idempotent.
pub trait RegisterAccess {
    /// Reads the 32-bit register at `offset`.
    fn read(&self, offset: usize) -> usize;
    /// Writes the 32-bit register at `offset`.
    fn write(&self, offset: usize, val: usize);
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    fn read(&self, offset: usize) -> usize {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, val: usize) {
        (**self).write(offset, val)
    }
}

/// Memory mapped register block of a physical PL190.
pub struct MmioRegisters {
    /// The host physical address of the VIC.
    pub base: HostPhysAddr,
}

impl MmioRegisters {
    /// # Safety
    ///
    /// `base` must be the identity mapped address of a PL190 register block.
    pub const unsafe fn new(base: HostPhysAddr) -> Self {
        Self { base }
    }
}

impl RegisterAccess for MmioRegisters {
    fn read(&self, offset: usize) -> usize {
        debug_assert!(offset < VIC_REGION_SIZE, "VIC offset {offset:#x} out of range");
        perform_mmio_read(
            HostPhysAddr::from_usize(self.base.as_usize() + offset),
            AccessWidth::Dword,
        )
    }

    fn write(&self, offset: usize, val: usize) {
        debug_assert!(offset < VIC_REGION_SIZE, "VIC offset {offset:#x} out of range");
        perform_mmio_write(
            HostPhysAddr::from_usize(self.base.as_usize() + offset),
            AccessWidth::Dword,
            val,
        )
    }
}

/// Typed view over the VIC registers.
pub struct Vic<R> {
    regs: R,
}

impl<R> Vic<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }
}

impl<R: RegisterAccess> Vic<R> {
    /// Lines currently requesting an IRQ (enabled and routed to IRQ).
    pub fn irq_status(&self) -> Bitmap<NR_INTERRUPTS> {
        Bitmap::from_value(self.regs.read(VIC_IRQ_STATUS) as u32)
    }

    /// Lines currently requesting an FIQ.
    pub fn fiq_status(&self) -> Bitmap<NR_INTERRUPTS> {
        Bitmap::from_value(self.regs.read(VIC_FIQ_STATUS) as u32)
    }

    /// Lines asserted before masking, including software interrupts.
    pub fn raw_intr(&self) -> Bitmap<NR_INTERRUPTS> {
        Bitmap::from_value(self.regs.read(VIC_RAW_INTR) as u32)
    }

    pub fn int_select(&self) -> usize {
        self.regs.read(VIC_INT_SELECT)
    }

    pub fn set_int_select(&self, mask: usize) {
        self.regs.write(VIC_INT_SELECT, mask)
    }

    pub fn int_enable(&self) -> Bitmap<NR_INTERRUPTS> {
        Bitmap::from_value(self.regs.read(VIC_INT_ENABLE) as u32)
    }

    /// Enables the lines whose bits are set in `mask`, other lines are untouched.
    pub fn enable_lines(&self, mask: usize) {
        self.regs.write(VIC_INT_ENABLE, mask)
    }

    /// Disables exactly the lines whose bits are set in `mask`.
    ///
    /// VICINTENCLEAR is write only, reading it faults the bus.
    pub fn disable_lines(&self, mask: usize) {
        self.regs.write(VIC_INT_EN_CLEAR, mask)
    }

    pub fn soft_int(&self) -> usize {
        self.regs.read(VIC_SOFT_INT)
    }

    pub fn raise_soft(&self, mask: usize) {
        self.regs.write(VIC_SOFT_INT, mask)
    }

    /// Clears the software interrupts whose bits are set in `mask`. Write only.
    pub fn clear_soft(&self, mask: usize) {
        self.regs.write(VIC_SOFT_INT_CLEAR, mask)
    }

    /// Address of the handler for the highest priority active interrupt.
    ///
    /// This read tells the priority hardware that servicing has started; it
    /// must happen exactly once per vectored interrupt.
    pub fn vect_addr(&self) -> usize {
        self.regs.read(VIC_VECT_ADDR)
    }

    /// Tells the priority hardware that servicing has completed.
    pub fn ack_vect_addr(&self) {
        self.regs.write(VIC_VECT_ADDR, VECT_ADDR_ACK)
    }

    pub fn def_vect_addr(&self) -> usize {
        self.regs.read(VIC_DEF_VECT_ADDR)
    }

    pub fn set_def_vect_addr(&self, addr: usize) {
        self.regs.write(VIC_DEF_VECT_ADDR, addr)
    }

    pub fn slot_addr(&self, slot: usize) -> usize {
        debug_assert!(slot < NR_VECTORS);
        self.regs.read(VIC_VECT_ADDR_BASE + slot * 4)
    }

    pub fn set_slot_addr(&self, slot: usize, addr: usize) {
        debug_assert!(slot < NR_VECTORS);
        self.regs.write(VIC_VECT_ADDR_BASE + slot * 4, addr)
    }

    pub fn slot_cntl(&self, slot: usize) -> usize {
        debug_assert!(slot < NR_VECTORS);
        self.regs.read(VIC_VECT_CNTL_BASE + slot * 4)
    }

    pub fn set_slot_cntl(&self, slot: usize, cntl: usize) {
        debug_assert!(slot < NR_VECTORS);
        self.regs.write(VIC_VECT_CNTL_BASE + slot * 4, cntl)
    }

    /// Part number and revision assembled from VICPERIPHID0..3.
    pub fn peripheral_id(&self) -> u32 {
        (0..4).fold(0, |id, i| {
            id | ((self.regs.read(VIC_PERIPH_ID_BASE + i * 4) as u32 & 0xFF) << (i * 8))
        })
    }
}

/// Per-line operations. They touch only registers, so an interrupt handler
/// may run them through its own `Vic` while the controller state is borrowed
/// by dispatch.
impl<R: RegisterAccess> Vic<R> {
    pub fn enable_interrupt(&self, irq: usize) -> AxResult {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "IRQ out of range");
        }
        self.enable_lines(line_bit(irq));
        Ok(())
    }

    pub fn disable_interrupt(&self, irq: usize) -> AxResult {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "IRQ out of range");
        }
        self.disable_lines(line_bit(irq));
        Ok(())
    }

    /// False for out of range lines.
    pub fn is_interrupt_enabled(&self, irq: usize) -> bool {
        irq < NR_INTERRUPTS && self.int_enable().get(irq)
    }

    /// `None` for out of range lines.
    pub fn interrupt_type(&self, irq: usize) -> Option<InterruptType> {
        if irq >= NR_INTERRUPTS {
            return None;
        }
        if self.int_select() & line_bit(irq) != 0 {
            Some(InterruptType::Fiq)
        } else {
            Some(InterruptType::Irq)
        }
    }

    /// Routes `irq` to IRQ or FIQ, leaving the other lines as they are.
    pub fn set_interrupt_type(&self, irq: usize, ty: InterruptType) -> AxResult {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "IRQ out of range");
        }
        let select = self.int_select();
        match ty {
            InterruptType::Irq => self.set_int_select(select & !line_bit(irq)),
            InterruptType::Fiq => self.set_int_select(select | line_bit(irq)),
        }
        Ok(())
    }

    /// Raises a software interrupt on `irq`. The line must be enabled for the
    /// interrupt to be delivered.
    pub fn set_sw_interrupt(&self, irq: usize) -> AxResult<usize> {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "IRQ out of range");
        }
        self.raise_soft(line_bit(irq));
        Ok(irq)
    }

    /// Clears a software interrupt on `irq`, provided the line is active.
    pub fn clear_sw_interrupt(&self, irq: usize) -> AxResult<usize> {
        if irq >= NR_INTERRUPTS {
            return ax_err!(InvalidInput, "IRQ out of range");
        }
        if !self.raw_intr().get(irq) {
            return ax_err!(BadState, "IRQ not active");
        }
        self.clear_soft(line_bit(irq));
        Ok(irq)
    }
}
