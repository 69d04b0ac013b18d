use std::cell::RefCell;

use pl190_pic::isr::{dummy_isr, ContextIsr};
use pl190_pic::sim::{SimCpu, SimVic};
use pl190_pic::{DispatchMode, Pic, NR_INTERRUPTS, NR_VECTORS, VECT_CNTL_ENABLE};

thread_local! {
    static CALLS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

fn record(irq: &usize) {
    CALLS.with(|c| c.borrow_mut().push(*irq));
}

fn take_calls() -> Vec<usize> {
    CALLS.with(|c| c.borrow_mut().drain(..).collect())
}

static LINE3: ContextIsr<usize> = ContextIsr::new(record, &3);
static LINE5: ContextIsr<usize> = ContextIsr::new(record, &5);

fn new_pic() -> Pic<SimVic, SimCpu> {
    let mut pic = Pic::new(SimVic::new(), SimCpu::new());
    pic.init();
    pic
}

fn nv_order(pic: &Pic<SimVic, SimCpu>) -> Vec<(usize, u8)> {
    pic.non_vectored()
        .entries()
        .iter()
        .filter_map(|e| Some((e.irq?, e.priority?)))
        .collect()
}

fn vect_order(pic: &Pic<SimVic, SimCpu>) -> Vec<(usize, u8)> {
    pic.vectored()
        .entries()
        .iter()
        .filter_map(|e| Some((e.irq?, e.priority?)))
        .collect()
}

/// Minimal deterministic generator for operation sequences.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn non_vectored_overwrite_then_unregister() {
    let mut pic = new_pic();
    pic.register_non_vectored_irq(5, &LINE5, 10).unwrap();
    pic.register_non_vectored_irq(3, &LINE3, 50).unwrap();
    pic.register_non_vectored_irq(5, &LINE5, 90).unwrap();
    assert_eq!(nv_order(&pic), [(5, 90), (3, 50)]);

    pic.unregister_non_vectored_irq(3);
    assert_eq!(nv_order(&pic), [(5, 90)]);

    pic.register_non_vectored_irq(3, &LINE3, 200).unwrap();
    assert_eq!(nv_order(&pic), [(5, 90), (3, 72)]);
}

#[test]
fn non_vectored_dispatch_end_to_end() {
    let mut pic = new_pic();
    pic.register_non_vectored_irq(5, &LINE5, 10).unwrap();
    pic.register_non_vectored_irq(3, &LINE3, 50).unwrap();
    pic.enable_interrupt(3).unwrap();
    pic.enable_interrupt(5).unwrap();
    pic.enable_irq_mode();

    pic.vic.regs().raise(5);
    pic.handle_irq();
    assert_eq!(take_calls(), [5]);

    pic.vic.regs().raise(3);
    pic.handle_irq();
    assert_eq!(take_calls(), [3, 5]);

    pic.vic.regs().lower(3);
    pic.vic.regs().lower(5);
    pic.set_software_interrupt().unwrap();
    pic.handle_irq();
    assert!(take_calls().is_empty());
    assert_eq!(pic.spurious_count(), 1);
}

#[test]
fn registration_sequences_stay_sorted_and_stable() {
    let mut rng = Lcg(0x5eed);
    for _ in 0..50 {
        let mut pic = new_pic();
        // Reference model: (line, priority, registration stamp).
        let mut model: Vec<(usize, u8, usize)> = Vec::new();
        for stamp in 0..64 {
            let irq = rng.next(NR_INTERRUPTS);
            if rng.next(4) == 0 {
                pic.unregister_non_vectored_irq(irq);
                model.retain(|e| e.0 != irq);
            } else {
                let prio = rng.next(256) as u8;
                pic.register_non_vectored_irq(irq, &LINE3, prio).unwrap();
                model.retain(|e| e.0 != irq);
                model.push((irq, prio & 0x7F, stamp));
            }
            let mut expected = model.clone();
            expected.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
            let expected: Vec<_> = expected.iter().map(|e| (e.0, e.1)).collect();
            assert_eq!(nv_order(&pic), expected);

            let first_gap = pic
                .non_vectored()
                .entries()
                .iter()
                .position(|e| e.irq.is_none())
                .unwrap_or(NR_INTERRUPTS);
            assert!(pic.non_vectored().entries()[first_gap..]
                .iter()
                .all(|e| e.irq.is_none() && e.priority.is_none()));
        }
    }
}

fn isr_a() {}
fn isr_b() {}

#[test]
fn vectored_slots_mirror_table_under_random_operations() {
    let mut rng = Lcg(42);
    let mut pic = new_pic();
    for _ in 0..500 {
        let irq = rng.next(NR_INTERRUPTS);
        match rng.next(5) {
            0 => pic.unregister_vector_irq(irq),
            1 => {
                let isr = if irq % 2 == 0 { isr_a } else { isr_b };
                pic.register_vector_irq(irq, isr, rng.next(128) as u8).unwrap();
            }
            _ => {
                pic.register_vector_irq(irq, isr_a, rng.next(128) as u8).unwrap();
            }
        }

        let entries = pic.vectored().entries();
        for slot in 0..NR_VECTORS {
            let e = &entries[slot];
            match e.irq {
                Some(irq) => {
                    assert_eq!(pic.vic.slot_cntl(slot), irq | VECT_CNTL_ENABLE);
                    assert_eq!(pic.vic.slot_addr(slot), e.isr as usize);
                }
                None => {
                    assert_eq!(pic.vic.slot_cntl(slot), 0);
                    assert_eq!(pic.vic.slot_addr(slot), dummy_isr as usize);
                }
            }
        }
        let order = vect_order(&pic);
        assert!(order.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}

fn line0_isr() {
    record(&0);
}

fn line1_isr() {
    record(&1);
}

fn line2_isr() {
    record(&2);
}

fn line3_isr() {
    record(&3);
}

fn mirrored_isr() {
    record(&99);
}

#[test]
fn twenty_vectored_registrations_overflow_into_default_vector() {
    let unmirrored: [fn(); 4] = [line0_isr, line1_isr, line2_isr, line3_isr];
    let mut pic = new_pic();
    pic.set_dispatch_mode(DispatchMode::Vectored);
    for irq in 0..20 {
        let isr = unmirrored.get(irq).copied().unwrap_or(mirrored_isr);
        pic.register_vector_irq(irq, isr, irq as u8).unwrap();
        // Line 3 ranks first among the unmirrored entries; leaving it masked
        // lets the fallback reach line 2.
        if irq != 3 {
            pic.enable_interrupt(irq).unwrap();
        }
    }

    let in_hw: Vec<_> = (0..NR_VECTORS).map(|s| pic.vic.slot_cntl(s) & 0x1F).collect();
    assert_eq!(in_hw, (4..20).rev().collect::<Vec<_>>());
    assert_eq!(pic.vectored().position(2), Some(NR_VECTORS + 1));

    // Line 2 only lives in the table, past the hardware slots.
    pic.vic.regs().raise(2);
    pic.handle_irq();
    assert_eq!(take_calls(), [2]);

    pic.vic.regs().lower(2);
    pic.vic.regs().raise(7);
    pic.handle_irq();
    assert_eq!(take_calls(), [99]);

    assert_eq!(pic.vic.regs().acks(), 2);
    assert_eq!(pic.vic.regs().in_service(), 0);
    assert_eq!(pic.spurious_count(), 0);
}
