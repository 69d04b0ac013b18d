use axaddrspace::{device::AccessWidth, HostPhysAddr};

// The controller is identity mapped on the target, so physical addresses are
// dereferenced directly.

pub(crate) fn perform_mmio_read(addr: HostPhysAddr, width: AccessWidth) -> usize {
    let addr = addr.as_usize() as *const u8;

    match width {
        AccessWidth::Byte => unsafe { addr.read_volatile() as _ },
        AccessWidth::Word => unsafe { (addr as *const u16).read_volatile() as _ },
        AccessWidth::Dword => unsafe { (addr as *const u32).read_volatile() as _ },
        AccessWidth::Qword => unsafe { (addr as *const u64).read_volatile() as _ },
    }
}

pub(crate) fn perform_mmio_write(addr: HostPhysAddr, width: AccessWidth, val: usize) {
    let addr = addr.as_usize() as *mut u8;

    match width {
        AccessWidth::Byte => unsafe {
            addr.write_volatile(val as _);
        },
        AccessWidth::Word => unsafe {
            (addr as *mut u16).write_volatile(val as _);
        },
        AccessWidth::Dword => unsafe {
            (addr as *mut u32).write_volatile(val as _);
        },
        AccessWidth::Qword => unsafe {
            (addr as *mut u64).write_volatile(val as _);
        },
    }
}
