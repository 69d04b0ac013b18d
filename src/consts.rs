// Strictly follows the PL190 register map as provided in DDI0181.

/// Number of interrupt request lines served by the controller.
pub const NR_INTERRUPTS: usize = 32;

/// Number of hardware vector slots (VICVECTADDRn/VICVECTCNTLn pairs).
pub const NR_VECTORS: usize = 16;

/// Priorities are silently truncated to their low 7 bits.
pub const PRIORITY_MASK: u8 = 0x7F;

/// Line number field of a vector control register.
pub const VECT_CNTL_IRQ_MASK: usize = 0x1F;

/// Enable bit of a vector control register.
pub const VECT_CNTL_ENABLE: usize = 0x20;

/// Value written to VICVECTADDR to signal that servicing has completed.
pub const VECT_ADDR_ACK: usize = 0xFFFF_FFFF;

/// All interrupt lines.
pub const ALL_LINES: usize = 0xFFFF_FFFF;

// --- Register Offsets (relative to the VIC base) ---

/// IRQ status after masking and FIQ/IRQ routing, read only.
pub const VIC_IRQ_STATUS: usize = 0x000;

/// FIQ status after masking and FIQ/IRQ routing, read only.
pub const VIC_FIQ_STATUS: usize = 0x004;

/// Raw interrupt status before masking, read only.
pub const VIC_RAW_INTR: usize = 0x008;

/// Interrupt select; a set bit routes the line to FIQ.
pub const VIC_INT_SELECT: usize = 0x00C;

/// Interrupt enable, write 1 to set.
pub const VIC_INT_ENABLE: usize = 0x010;

/// Interrupt enable clear, write 1 to clear. Must never be read.
pub const VIC_INT_EN_CLEAR: usize = 0x014;

/// Software interrupt, write 1 to set.
pub const VIC_SOFT_INT: usize = 0x018;

/// Software interrupt clear, write 1 to clear. Must never be read.
pub const VIC_SOFT_INT_CLEAR: usize = 0x01C;

/// Protection enable.
pub const VIC_PROTECTION: usize = 0x020;

/// Vector address of the interrupt being serviced.
/// Reading it signals the priority hardware that servicing has started.
pub const VIC_VECT_ADDR: usize = 0x030;

/// Default vector address, used when no vector slot matches.
pub const VIC_DEF_VECT_ADDR: usize = 0x034;

/// Offset to VICVECTADDR0. Slot N lives at: VIC_VECT_ADDR_BASE + N * 4
pub const VIC_VECT_ADDR_BASE: usize = 0x100;

/// Offset to VICVECTCNTL0. Slot N lives at: VIC_VECT_CNTL_BASE + N * 4
pub const VIC_VECT_CNTL_BASE: usize = 0x200;

/// Offset to VICPERIPHID0..3.
pub const VIC_PERIPH_ID_BASE: usize = 0xFE0;

/// Offset to VICPCELLID0..3.
pub const VIC_PCELL_ID_BASE: usize = 0xFF0;

/// End of the register block.
pub const VIC_REGION_SIZE: usize = 0x1000;

/// Bit of a line inside the 32-bit status/enable registers.
#[inline]
pub const fn line_bit(irq: usize) -> usize {
    1 << irq
}
