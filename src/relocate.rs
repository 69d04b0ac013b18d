//! Relocation of the exception vector block to the address the CPU fetches
//! vectors from.

use core::mem::size_of;

/// How a relocation was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Source already at the destination, or the copy would run past the end
    /// of the address space. Nothing was written.
    Skipped,
    /// Copied from low to high addresses.
    Forward,
    /// Copied from high to low addresses, because the destination lies inside
    /// the source block.
    Backward,
}

/// Copies the words of `[start, end)` to `dst`.
///
/// The bounds may be given in either order. Overlapping source and
/// destination are handled; the destination ends up equal to the source as
/// it was before the call. Trailing bytes that do not form a full word are
/// not copied.
///
/// # Safety
///
/// Both ranges must be valid for word-sized volatile reads and writes
/// respectively, and word aligned.
pub unsafe fn relocate_words(start: *const u32, end: *const u32, dst: *mut u32) -> Relocation {
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    let (lo_addr, hi_addr, dst_addr) = (lo as usize, hi as usize, dst as usize);
    let words = (hi_addr - lo_addr) / size_of::<u32>();

    if lo_addr == dst_addr || dst_addr.checked_add(hi_addr - lo_addr).is_none() {
        return Relocation::Skipped;
    }

    if dst_addr < lo_addr || dst_addr >= hi_addr {
        for i in 0..words {
            store_word(dst.wrapping_add(i), lo.wrapping_add(i).read_volatile());
        }
        Relocation::Forward
    } else {
        for i in (0..words).rev() {
            store_word(dst.wrapping_add(i), lo.wrapping_add(i).read_volatile());
        }
        Relocation::Backward
    }
}

/// Volatile word store that also works at address zero, where
/// `write_volatile` would be undefined.
#[inline(always)]
unsafe fn store_word(dst: *mut u32, val: u32) {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    core::arch::asm!("str {val}, [{dst}]", val = in(reg) val, dst = in(reg) dst, options(nostack));
    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    dst.write_volatile(val);
}

/// Address the ARM926EJ-S fetches exception vectors from.
pub const VECTORS_DEST: usize = 0x0000_0000;

#[cfg(all(target_arch = "arm", target_os = "none"))]
static RELOCATED: spin::Once<Relocation> = spin::Once::new();

/// Copies the vector block placed by the linker between `vectors_start` and
/// `vectors_end` to [`VECTORS_DEST`]. Only the first call does any work.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub fn copy_vectors() -> Relocation {
    extern "C" {
        static vectors_start: u32;
        static vectors_end: u32;
    }

    *RELOCATED.call_once(|| {
        // SAFETY: the linker script places the vector block between these
        // symbols, and the first page of RAM is reserved for the vectors.
        let how = unsafe {
            relocate_words(
                core::ptr::addr_of!(vectors_start),
                core::ptr::addr_of!(vectors_end),
                VECTORS_DEST as *mut u32,
            )
        };
        log::debug!("exception vectors relocated: {how:?}");
        how
    })
}
