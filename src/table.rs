use crate::consts::NR_INTERRUPTS;

/// An entry of a [`PriorityTable`].
pub trait Binding: Copy {
    /// The entry used for every unoccupied position.
    const VACANT: Self;

    /// Line served by this entry, `None` when vacant.
    fn irq(&self) -> Option<usize>;

    /// Priority of this entry, `None` when vacant. Vacant entries rank below
    /// every valid priority.
    fn priority(&self) -> Option<u8>;

    fn is_vacant(&self) -> bool {
        self.irq().is_none()
    }
}

/// Fixed-capacity table kept sorted by descending priority.
///
/// All positions are always populated; unoccupied ones hold
/// [`Binding::VACANT`] and trail the occupied ones. Entries of equal priority
/// keep their registration order. Every mutation reports each index it writes
/// through a `sync` callback so a hardware mirror can follow along.
pub struct PriorityTable<E> {
    entries: [E; NR_INTERRUPTS],
}

impl<E: Binding> PriorityTable<E> {
    pub const fn new() -> Self {
        Self {
            entries: [E::VACANT; NR_INTERRUPTS],
        }
    }

    pub fn entries(&self) -> &[E; NR_INTERRUPTS] {
        &self.entries
    }

    pub fn position(&self, irq: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.irq() == Some(irq))
    }

    /// Number of occupied entries.
    pub fn occupied(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_vacant()).count()
    }

    /// Inserts `entry`, replacing an existing entry for the same line.
    ///
    /// Returns the final index of the entry.
    pub fn insert(&mut self, entry: E, mut sync: impl FnMut(usize, &E)) -> usize {
        let (irq, prio) = (entry.irq(), entry.priority());
        debug_assert!(irq.is_some() && prio.is_some());

        let mut irq_pos = None;
        let mut pr_pos = None;
        for (i, e) in self.entries.iter().enumerate() {
            if irq_pos.is_none() && (e.is_vacant() || e.irq() == irq) {
                irq_pos = Some(i);
            }
            if pr_pos.is_none() && e.priority() < prio {
                pr_pos = Some(i);
            }
        }

        // The table only lacks both a vacancy and the line itself if the
        // line is out of range, which callers reject beforehand.
        let irq_pos = irq_pos.unwrap_or(NR_INTERRUPTS - 1);
        // Nothing ranks lower: the entry goes to the end of the table.
        let mut pr_pos = pr_pos.unwrap_or(NR_INTERRUPTS);

        if irq_pos > pr_pos {
            for i in (pr_pos + 1..=irq_pos).rev() {
                self.entries[i] = self.entries[i - 1];
                sync(i, &self.entries[i]);
            }
        } else if pr_pos > irq_pos {
            // The entry at pr_pos ranks lower and stays where it is.
            pr_pos -= 1;
            for i in irq_pos..pr_pos {
                self.entries[i] = self.entries[i + 1];
                sync(i, &self.entries[i]);
            }
        }

        self.entries[pr_pos] = entry;
        sync(pr_pos, &self.entries[pr_pos]);
        debug_assert!(self.is_dense());
        pr_pos
    }

    /// Removes the entry for `irq` and compacts the table.
    ///
    /// Returns the index the entry was removed from.
    pub fn remove(&mut self, irq: usize, mut sync: impl FnMut(usize, &E)) -> Option<usize> {
        let pos = self.position(irq)?;

        for i in pos..NR_INTERRUPTS - 1 {
            self.entries[i] = self.entries[i + 1];
            sync(i, &self.entries[i]);
        }
        self.entries[NR_INTERRUPTS - 1] = E::VACANT;
        sync(NR_INTERRUPTS - 1, &self.entries[NR_INTERRUPTS - 1]);

        debug_assert!(self.is_dense());
        Some(pos)
    }

    /// Vacates every position.
    pub fn clear(&mut self, mut sync: impl FnMut(usize, &E)) {
        for (i, e) in self.entries.iter_mut().enumerate() {
            *e = E::VACANT;
            sync(i, e);
        }
    }

    /// Checks that occupied entries come first, sorted by descending priority,
    /// and that no line appears twice.
    pub fn is_dense(&self) -> bool {
        let mut seen = 0u32;
        let mut prev = None;
        let mut vacancy_seen = false;
        for e in self.entries.iter() {
            match e.irq() {
                None => vacancy_seen = true,
                Some(irq) => {
                    if vacancy_seen || irq >= NR_INTERRUPTS || seen & (1 << irq) != 0 {
                        return false;
                    }
                    if prev.is_some() && e.priority() > prev {
                        return false;
                    }
                    seen |= 1 << irq;
                    prev = e.priority();
                }
            }
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn entries_mut(&mut self) -> &mut [E; NR_INTERRUPTS] {
        &mut self.entries
    }
}

impl<E: Binding> Default for PriorityTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Line {
        irq: Option<usize>,
        priority: Option<u8>,
        tag: u32,
    }

    impl Binding for Line {
        const VACANT: Self = Line {
            irq: None,
            priority: None,
            tag: 0,
        };

        fn irq(&self) -> Option<usize> {
            self.irq
        }

        fn priority(&self) -> Option<u8> {
            self.priority
        }
    }

    fn line(irq: usize, priority: u8, tag: u32) -> Line {
        Line {
            irq: Some(irq),
            priority: Some(priority),
            tag,
        }
    }

    fn order(t: &PriorityTable<Line>) -> Vec<(usize, u8)> {
        t.entries()
            .iter()
            .filter_map(|e| Some((e.irq?, e.priority?)))
            .collect()
    }

    #[test]
    fn keeps_descending_priority() {
        let mut t = PriorityTable::new();
        for (irq, prio) in [(0, 5), (1, 50), (2, 20), (3, 90), (4, 0)] {
            t.insert(line(irq, prio, 0), |_, _| {});
        }
        assert_eq!(order(&t), [(3, 90), (1, 50), (2, 20), (0, 5), (4, 0)]);
        assert!(t.is_dense());
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut t = PriorityTable::new();
        for irq in [7, 3, 9, 1] {
            t.insert(line(irq, 10, 0), |_, _| {});
        }
        t.insert(line(4, 20, 0), |_, _| {});
        assert_eq!(order(&t), [(4, 20), (7, 10), (3, 10), (9, 10), (1, 10)]);
    }

    #[test]
    fn reinsert_moves_instead_of_duplicating() {
        let mut t = PriorityTable::new();
        t.insert(line(0, 50, 1), |_, _| {});
        t.insert(line(1, 40, 1), |_, _| {});
        t.insert(line(2, 30, 1), |_, _| {});

        // Moving down.
        assert_eq!(t.insert(line(0, 35, 2), |_, _| {}), 1);
        assert_eq!(order(&t), [(1, 40), (0, 35), (2, 30)]);

        // Moving up.
        assert_eq!(t.insert(line(2, 45, 2), |_, _| {}), 0);
        assert_eq!(order(&t), [(2, 45), (1, 40), (0, 35)]);

        // In place.
        assert_eq!(t.insert(line(1, 41, 2), |_, _| {}), 1);
        assert_eq!(t.entries()[1].tag, 2);
        assert_eq!(t.occupied(), 3);
    }

    #[test]
    fn reinsert_with_same_priority_goes_behind_equals() {
        let mut t = PriorityTable::new();
        t.insert(line(0, 10, 0), |_, _| {});
        t.insert(line(1, 10, 0), |_, _| {});
        assert_eq!(t.insert(line(0, 10, 0), |_, _| {}), 1);
        assert_eq!(order(&t), [(1, 10), (0, 10)]);
    }

    #[test]
    fn full_table_accepts_lowest_priority_reinsert() {
        let mut t = PriorityTable::new();
        for irq in 0..NR_INTERRUPTS {
            t.insert(line(irq, 50, 0), |_, _| {});
        }
        assert_eq!(t.insert(line(0, 10, 0), |_, _| {}), NR_INTERRUPTS - 1);
        assert_eq!(t.entries()[NR_INTERRUPTS - 1].irq, Some(0));
        assert_eq!(t.entries()[0].irq, Some(1));
        assert_eq!(t.occupied(), NR_INTERRUPTS);
        assert!(t.is_dense());
    }

    #[test]
    fn remove_compacts() {
        let mut t = PriorityTable::new();
        for (irq, prio) in [(0, 30), (1, 20), (2, 10)] {
            t.insert(line(irq, prio, 0), |_, _| {});
        }
        assert_eq!(t.remove(1, |_, _| {}), Some(1));
        assert_eq!(order(&t), [(0, 30), (2, 10)]);
        assert_eq!(t.remove(1, |_, _| {}), None);
        assert_eq!(t.entries()[NR_INTERRUPTS - 1], Line::VACANT);
        assert!(t.is_dense());
    }

    #[test]
    fn sync_sees_every_written_index() {
        let mut t = PriorityTable::new();
        t.insert(line(0, 10, 0), |_, _| {});
        t.insert(line(1, 5, 0), |_, _| {});

        let mut written = Vec::new();
        t.insert(line(2, 20, 0), |i, e| written.push((i, e.irq)));
        assert_eq!(written, [(2, Some(1)), (1, Some(0)), (0, Some(2))]);

        written.clear();
        t.remove(2, |i, e| written.push((i, e.irq)));
        assert_eq!(written.len(), NR_INTERRUPTS);
        assert_eq!(written[0], (0, Some(0)));
        assert_eq!(written[1], (1, Some(1)));
        assert_eq!(written[2], (2, None));
    }

    #[test]
    fn density_check_catches_gaps_and_disorder() {
        let mut t: PriorityTable<Line> = PriorityTable::new();
        t.insert(line(0, 10, 0), |_, _| {});
        t.entries_mut()[2] = line(3, 5, 0);
        assert!(!t.is_dense());

        t.entries_mut()[2] = Line::VACANT;
        t.entries_mut()[1] = line(3, 50, 0);
        assert!(!t.is_dense());
    }
}
