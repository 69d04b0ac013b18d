use log::warn;

/// A vectored interrupt service routine.
///
/// Its address is written straight into a VICVECTADDRn register, so it takes
/// no arguments and must not capture anything.
pub type VectoredIsr = fn();

/// A non-vectored interrupt service routine.
///
/// Whatever context the routine needs is carried by the implementing value.
pub trait InterruptHandler: Sync {
    fn handle(&self);
}

impl<F: Fn() + Sync> InterruptHandler for F {
    fn handle(&self) {
        self()
    }
}

/// A routine paired with the context it is called with.
pub struct ContextIsr<T: 'static> {
    func: fn(&T),
    context: &'static T,
}

impl<T: Sync + 'static> ContextIsr<T> {
    pub const fn new(func: fn(&T), context: &'static T) -> Self {
        Self { func, context }
    }

    pub fn context(&self) -> &'static T {
        self.context
    }
}

impl<T: Sync + 'static> InterruptHandler for ContextIsr<T> {
    fn handle(&self) {
        (self.func)(self.context)
    }
}

/// Stands in for every unconfigured handler, both in the tables and in the
/// hardware vector slots, so that a stray interrupt never jumps to an
/// arbitrary address.
pub fn dummy_isr() {
    warn!("unhandled interrupt, dummy ISR invoked");
}

/// Non-vectored counterpart of [`dummy_isr`].
pub struct Spurious;

impl InterruptHandler for Spurious {
    fn handle(&self) {
        dummy_isr()
    }
}

pub static SPURIOUS: Spurious = Spurious;

/// Installed into VICDEFVECTADDR by [`Pic::init`](crate::Pic::init).
///
/// The dispatch engine recognises this address and scans the vectored entries
/// that did not fit into hardware slots. It only runs as a plain function if
/// something jumps to the default vector behind the dispatcher's back.
pub fn default_vector_isr() {
    warn!("default vector reached outside of the dispatcher");
}

#[inline]
pub(crate) fn isr_addr(isr: VectoredIsr) -> usize {
    isr as usize
}

/// Turns a vector register value back into a routine.
///
/// # Safety
///
/// `addr` must be zero or a value previously produced by [`isr_addr`].
#[inline]
pub(crate) unsafe fn isr_from_addr(addr: usize) -> Option<VectoredIsr> {
    if addr == 0 {
        None
    } else {
        Some(core::mem::transmute::<usize, VectoredIsr>(addr))
    }
}
