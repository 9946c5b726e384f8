use crate::sat::formula::assignment::Assignment;
use crate::sat::formula::clause::{ClauseAllocator, ClauseRef};
use crate::sat::formula::{Lit, LitMap, Var};

#[derive(Clone, Copy)]
struct Watcher {
    cref: ClauseRef,
    blocker: Lit,
}

struct WatchesLine {
    binary: Vec<Watcher>,
    long: Vec<Watcher>,
    dirty: bool,
}

/// Per-literal watch-list tables, split into binary clauses (resolved
/// without touching the arena) and long clauses (size >= 3), per
/// spec.md §3/§4.3.
pub struct Watches {
    watches: LitMap<WatchesLine>,
    pub propagations: u64,
}

impl Watches {
    pub fn new() -> Watches {
        Watches { watches: LitMap::new(), propagations: 0 }
    }

    pub fn init_var(&mut self, var: Var) {
        self.init_lit(var.pos_lit());
        self.init_lit(var.neg_lit());
    }

    fn init_lit(&mut self, lit: Lit) {
        self.watches.insert(&lit, WatchesLine { binary: Vec::new(), long: Vec::new(), dirty: false });
    }

    pub fn watch_binary(&mut self, l0: Lit, l1: Lit, cr: ClauseRef) {
        self.watches[&!l0].binary.push(Watcher { cref: cr, blocker: l1 });
        self.watches[&!l1].binary.push(Watcher { cref: cr, blocker: l0 });
    }

    pub fn watch_long(&mut self, l0: Lit, l1: Lit, cr: ClauseRef) {
        self.watches[&!l0].long.push(Watcher { cref: cr, blocker: l1 });
        self.watches[&!l1].long.push(Watcher { cref: cr, blocker: l0 });
    }

    pub fn watch_clause(&mut self, ca: &ClauseAllocator, cr: ClauseRef) {
        let c = ca.view(cr);
        let (c0, c1) = c.head_pair();
        if c.len() == 2 {
            self.watch_binary(c0, c1, cr);
        } else {
            self.watch_long(c0, c1, cr);
        }
    }

    /// Removes a watcher by cref; O(n) scan, acceptable since lists are
    /// short on average (spec.md §4.3).
    pub fn unwatch_clause_strict(&mut self, ca: &ClauseAllocator, cr: ClauseRef) {
        let c = ca.view(cr);
        let (c0, c1) = c.head_pair();
        let binary = c.len() == 2;
        for &l in &[c0, c1] {
            let line = &mut self.watches[&!l];
            if binary {
                line.binary.retain(|w| w.cref != cr);
            } else {
                line.long.retain(|w| w.cref != cr);
            }
        }
    }

    /// Marks the clause's watch entries stale without scanning; actually
    /// dropped lazily the next time those lists are walked.
    pub fn unwatch_clause_lazy(&mut self, ca: &ClauseAllocator, cr: ClauseRef) {
        let c = ca.view(cr);
        let (c0, c1) = c.head_pair();
        self.watches[&!c0].dirty = true;
        self.watches[&!c1].dirty = true;
    }

    /// Propagates all enqueued facts. Returns the conflicting clause's
    /// reference on conflict, otherwise `None`; the propagation queue is
    /// always fully drained, even on conflict (spec.md §4.4).
    pub fn propagate(&mut self, ca: &mut ClauseAllocator, assigns: &mut Assignment) -> Option<ClauseRef> {
        while let Some(p) = assigns.dequeue() {
            self.propagations += 1;
            let false_lit = !p;

            // Binary clauses: resolved without touching the arena.
            let mut i = 0;
            while i < self.watches[&p].binary.len() {
                let w = self.watches[&p].binary[i];
                if assigns.is_sat(w.blocker) {
                    i += 1;
                    continue;
                }
                if assigns.is_unsat(w.blocker) {
                    assigns.dequeue_all();
                    return Some(w.cref);
                }
                assigns.assign_lit(w.blocker, Some(w.cref));
                i += 1;
            }

            {
                let line = &mut self.watches[&p];
                if line.dirty {
                    line.long.retain(|w| !ca.is_deleted(w.cref));
                    line.dirty = false;
                }
            }

            let mut i = 0;
            let mut j = 0;
            loop {
                let (cw, new_watch) = {
                    let p_watches = &mut self.watches[&p].long;
                    if i >= p_watches.len() {
                        break;
                    }
                    let pwi = p_watches[i];
                    i += 1;

                    if assigns.is_sat(pwi.blocker) {
                        p_watches[j] = pwi;
                        j += 1;
                        continue;
                    }

                    let mut c = ca.edit(pwi.cref);
                    if c.head() == false_lit {
                        c.swap(0, 1);
                    }
                    debug_assert_eq!(c[1], false_lit);

                    let cw = Watcher { cref: pwi.cref, blocker: c.head() };
                    if cw.blocker != pwi.blocker && assigns.is_sat(cw.blocker) {
                        p_watches[j] = cw;
                        j += 1;
                        continue;
                    }

                    (cw, c.pull_literal(1, |lit| !assigns.is_unsat(lit)))
                };

                match new_watch {
                    Some(lit) => {
                        self.watches[&!lit].long.push(cw);
                    }

                    None => {
                        let p_watches = &mut self.watches[&p].long;
                        p_watches[j] = cw;
                        j += 1;

                        if assigns.is_unsat(cw.blocker) {
                            assigns.dequeue_all();
                            while i < p_watches.len() {
                                p_watches[j] = p_watches[i];
                                j += 1;
                                i += 1;
                            }
                            p_watches.truncate(j);
                            return Some(cw.cref);
                        } else {
                            assigns.assign_lit(cw.blocker, Some(cw.cref));
                        }
                    }
                }
            }

            self.watches[&p].long.truncate(j);
        }

        None
    }

    pub fn reloc_gc(&mut self, from: &mut ClauseAllocator, to: &mut ClauseAllocator) {
        for (_, line) in self.watches.iter_mut() {
            line.dirty = false;
            line.binary.retain(|w| !from.is_deleted(w.cref));
            for w in line.binary.iter_mut() {
                w.cref = from.reloc_to(to, w.cref).unwrap();
            }
            line.long.retain(|w| !from.is_deleted(w.cref));
            for w in line.long.iter_mut() {
                w.cref = from.reloc_to(to, w.cref).unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::formula::assignment::Assignment;

    #[test]
    fn binary_clause_propagates_without_arena_read() {
        let mut ca = ClauseAllocator::new_empty();
        let mut w = Watches::new();
        let mut a = Assignment::new();

        let x = a.new_var();
        let y = a.new_var();
        w.init_var(x);
        w.init_var(y);

        let cr = ca.alloc(&[x.neg_lit(), y.pos_lit()], false);
        w.watch_clause(&ca, cr);

        a.assign_lit(x.pos_lit(), None);
        let conflict = w.propagate(&mut ca, &mut a);
        assert!(conflict.is_none());
        assert!(a.is_sat(y.pos_lit()));
    }

    #[test]
    fn long_clause_implies_last_literal() {
        let mut ca = ClauseAllocator::new_empty();
        let mut w = Watches::new();
        let mut a = Assignment::new();

        let x = a.new_var();
        let y = a.new_var();
        let z = a.new_var();
        for v in &[x, y, z] {
            w.init_var(*v);
        }

        let cr = ca.alloc(&[x.pos_lit(), y.pos_lit(), z.pos_lit()], false);
        w.watch_clause(&ca, cr);

        a.assign_lit(x.neg_lit(), None);
        assert!(w.propagate(&mut ca, &mut a).is_none());
        a.assign_lit(y.neg_lit(), None);
        assert!(w.propagate(&mut ca, &mut a).is_none());
        assert!(a.is_sat(z.pos_lit()));
    }

    #[test]
    fn long_clause_conflict_is_detected() {
        let mut ca = ClauseAllocator::new_empty();
        let mut w = Watches::new();
        let mut a = Assignment::new();

        let x = a.new_var();
        let y = a.new_var();
        let z = a.new_var();
        for v in &[x, y, z] {
            w.init_var(*v);
        }

        let cr = ca.alloc(&[x.pos_lit(), y.pos_lit(), z.pos_lit()], false);
        w.watch_clause(&ca, cr);

        a.assign_lit(x.neg_lit(), None);
        a.assign_lit(y.neg_lit(), None);
        a.assign_lit(z.neg_lit(), None);
        let conflict = w.propagate(&mut ca, &mut a);
        assert_eq!(conflict, Some(cr));
    }
}
