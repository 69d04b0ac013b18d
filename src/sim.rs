//! In-memory models of the VIC and the CPU status word, for exercising the
//! dispatch core without hardware.

use bitmaps::Bitmap;
use portable_atomic::{AtomicU32, Ordering};
use spin::Mutex;

use crate::consts::*;
use crate::cpu::{PrivilegedControl, CPSR_FIQ_DISABLE, CPSR_IRQ_DISABLE};
use crate::regs::RegisterAccess;

/// PL190 identification registers, VICPERIPHID0..3 then VICPCELLID0..3.
const PL190_ID: [usize; 8] = [0x90, 0x11, 0x04, 0x00, 0x0D, 0xF0, 0x05, 0xB1];

struct SimState {
    /// Lines asserted by peripherals.
    raw: Bitmap<NR_INTERRUPTS>,
    /// Lines asserted through VICSOFTINT.
    soft: Bitmap<NR_INTERRUPTS>,
    enabled: Bitmap<NR_INTERRUPTS>,
    /// Lines routed to FIQ.
    select: Bitmap<NR_INTERRUPTS>,
    protection: usize,
    def_vect_addr: usize,
    vect_addr: [usize; NR_VECTORS],
    vect_cntl: [usize; NR_VECTORS],
    /// Interrupts whose vector address has been read but not yet acknowledged.
    in_service: usize,
    vector_reads: usize,
    acks: usize,
}

impl SimState {
    fn asserted(&self) -> Bitmap<NR_INTERRUPTS> {
        self.raw | self.soft
    }

    fn irq_status(&self) -> Bitmap<NR_INTERRUPTS> {
        self.asserted() & self.enabled & !self.select
    }

    fn fiq_status(&self) -> Bitmap<NR_INTERRUPTS> {
        self.asserted() & self.enabled & self.select
    }

    /// What the priority hardware presents in VICVECTADDR: the address of
    /// the lowest numbered enabled slot whose line requests an IRQ, or the
    /// default vector address.
    fn current_vector(&self) -> usize {
        let status = self.irq_status();
        (0..NR_VECTORS)
            .find(|&slot| {
                let cntl = self.vect_cntl[slot];
                cntl & VECT_CNTL_ENABLE != 0 && status.get(cntl & VECT_CNTL_IRQ_MASK)
            })
            .map_or(self.def_vect_addr, |slot| self.vect_addr[slot])
    }
}

/// A PL190 register block held in memory.
///
/// Register side effects follow DDI0181: VICINTENABLE and VICSOFTINT set the
/// bits written as 1, their clear registers clear them and fault on read,
/// reading VICVECTADDR starts servicing and writing it acknowledges.
pub struct SimVic {
    state: Mutex<SimState>,
}

impl SimVic {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                raw: Bitmap::new(),
                soft: Bitmap::new(),
                enabled: Bitmap::new(),
                select: Bitmap::new(),
                protection: 0,
                def_vect_addr: 0,
                vect_addr: [0; NR_VECTORS],
                vect_cntl: [0; NR_VECTORS],
                in_service: 0,
                vector_reads: 0,
                acks: 0,
            }),
        }
    }

    /// Asserts the peripheral input for `irq`.
    pub fn raise(&self, irq: usize) {
        self.state.lock().raw.set(irq, true);
    }

    /// Deasserts the peripheral input for `irq`.
    pub fn lower(&self, irq: usize) {
        self.state.lock().raw.set(irq, false);
    }

    /// Number of VICVECTADDR reads so far.
    pub fn vector_reads(&self) -> usize {
        self.state.lock().vector_reads
    }

    /// Number of VICVECTADDR acknowledge writes so far.
    pub fn acks(&self) -> usize {
        self.state.lock().acks
    }

    /// Interrupts currently being serviced.
    pub fn in_service(&self) -> usize {
        self.state.lock().in_service
    }
}

impl Default for SimVic {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterAccess for SimVic {
    fn read(&self, offset: usize) -> usize {
        let mut s = self.state.lock();
        match offset {
            VIC_IRQ_STATUS => s.irq_status().into_value() as usize,
            VIC_FIQ_STATUS => s.fiq_status().into_value() as usize,
            VIC_RAW_INTR => s.asserted().into_value() as usize,
            VIC_INT_SELECT => s.select.into_value() as usize,
            VIC_INT_ENABLE => s.enabled.into_value() as usize,
            VIC_SOFT_INT => s.soft.into_value() as usize,
            VIC_PROTECTION => s.protection,
            VIC_VECT_ADDR => {
                s.vector_reads += 1;
                s.in_service += 1;
                s.current_vector()
            }
            VIC_DEF_VECT_ADDR => s.def_vect_addr,
            VIC_VECT_ADDR_BASE..VIC_VECT_CNTL_BASE if offset < VIC_VECT_ADDR_BASE + NR_VECTORS * 4 => {
                s.vect_addr[(offset - VIC_VECT_ADDR_BASE) / 4]
            }
            VIC_VECT_CNTL_BASE..VIC_PERIPH_ID_BASE if offset < VIC_VECT_CNTL_BASE + NR_VECTORS * 4 => {
                s.vect_cntl[(offset - VIC_VECT_CNTL_BASE) / 4]
            }
            VIC_PERIPH_ID_BASE..VIC_REGION_SIZE => PL190_ID[(offset - VIC_PERIPH_ID_BASE) / 4],
            _ => {
                unimplemented!("Unsupported VIC read for reg {offset:#x}")
            }
        }
    }

    fn write(&self, offset: usize, val: usize) {
        let mut s = self.state.lock();
        let lines = Bitmap::<NR_INTERRUPTS>::from_value(val as u32);
        match offset {
            VIC_INT_SELECT => s.select = lines,
            VIC_INT_ENABLE => s.enabled = s.enabled | lines,
            VIC_INT_EN_CLEAR => s.enabled = s.enabled & !lines,
            VIC_SOFT_INT => s.soft = s.soft | lines,
            VIC_SOFT_INT_CLEAR => s.soft = s.soft & !lines,
            VIC_PROTECTION => s.protection = val & 1,
            VIC_VECT_ADDR => {
                s.acks += 1;
                s.in_service = s.in_service.saturating_sub(1);
            }
            VIC_DEF_VECT_ADDR => s.def_vect_addr = val,
            VIC_VECT_ADDR_BASE..VIC_VECT_CNTL_BASE if offset < VIC_VECT_ADDR_BASE + NR_VECTORS * 4 => {
                s.vect_addr[(offset - VIC_VECT_ADDR_BASE) / 4] = val;
            }
            VIC_VECT_CNTL_BASE..VIC_PERIPH_ID_BASE if offset < VIC_VECT_CNTL_BASE + NR_VECTORS * 4 => {
                s.vect_cntl[(offset - VIC_VECT_CNTL_BASE) / 4] = val & (VECT_CNTL_ENABLE | VECT_CNTL_IRQ_MASK);
            }
            _ => {
                unimplemented!("Unsupported VIC write for reg {offset:#x}")
            }
        }
    }
}

/// A processor status word held in memory. Starts with IRQ and FIQ masked,
/// as after reset.
pub struct SimCpu {
    cpsr: AtomicU32,
}

impl SimCpu {
    pub fn new() -> Self {
        Self {
            cpsr: AtomicU32::new(0x13 | CPSR_IRQ_DISABLE | CPSR_FIQ_DISABLE),
        }
    }
}

impl Default for SimCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivilegedControl for SimCpu {
    fn read_status(&self) -> u32 {
        self.cpsr.load(Ordering::SeqCst)
    }

    fn write_status(&self, status: u32) {
        // Only the control field (bits 7:0) is writable through cpsr_c.
        let old = self.cpsr.load(Ordering::SeqCst);
        self.cpsr
            .store((old & !0xFF) | (status & 0xFF), Ordering::SeqCst);
    }
}
