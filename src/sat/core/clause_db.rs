use crate::sat::formula::assignment::Assignment;
use crate::sat::formula::clause::{retain_clause, ClauseAllocator, ClauseRef};
use crate::sat::formula::Lit;
use super::watches::Watches;

#[derive(Clone)]
pub struct ClauseDBSettings {
    pub clause_decay: f64,
    /// Conflicts before the first reduce-DB pass (spec.md §4.8, `n_conf_fst_reduce`).
    pub n_conf_fst_reduce: u64,
    /// Linear growth added to the reduce threshold after each pass (`inc_reduce`).
    pub inc_reduce: u64,
    /// Extra growth applied periodically on top of `inc_reduce` (`inc_special_reduce`).
    pub inc_special_reduce: u64,
    /// Clauses whose LBD improves below this are "frozen" against reduction for one round.
    pub lbd_freeze_clause: u32,
}

impl Default for ClauseDBSettings {
    fn default() -> ClauseDBSettings {
        ClauseDBSettings {
            clause_decay: 0.999,
            n_conf_fst_reduce: 2000,
            inc_reduce: 300,
            inc_special_reduce: 1000,
            lbd_freeze_clause: 30,
        }
    }
}

#[derive(Default, Debug)]
pub struct Stats {
    pub learnts: u64,
    pub learnts_literals: u64,
    pub clauses_literals: u64,
    pub max_literals: u64,
    pub tot_literals: u64,
}

/// Tracks the original and learnt clause sets (spec.md §4.1, §4.9): both
/// live in the same arena, but originals are never subject to reduction.
pub struct ClauseDB {
    settings: ClauseDBSettings,
    ca: ClauseAllocator,
    clauses: Vec<ClauseRef>,
    learnts: Vec<ClauseRef>,
    cla_inc: f64,
    pub n_confl_bfr_reduce: u64,
    reduce_round: u64,
    stats: Stats,
}

impl ClauseDB {
    pub fn new(settings: ClauseDBSettings) -> ClauseDB {
        let n_confl_bfr_reduce = settings.n_conf_fst_reduce;
        ClauseDB {
            settings,
            ca: ClauseAllocator::new_empty(),
            clauses: Vec::new(),
            learnts: Vec::new(),
            cla_inc: 1.0,
            n_confl_bfr_reduce,
            reduce_round: 0,
            stats: Stats::default(),
        }
    }

    pub fn ca(&self) -> &ClauseAllocator {
        &self.ca
    }

    pub fn ca_mut(&mut self) -> &mut ClauseAllocator {
        &mut self.ca
    }

    pub fn number_of_originals(&self) -> usize {
        self.clauses.len()
    }

    pub fn number_of_learnts(&self) -> usize {
        self.learnts.len()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn add_clause(&mut self, literals: &[Lit], watches: &mut Watches) -> ClauseRef {
        let cr = self.ca.alloc(literals, false);
        watches.watch_clause(&self.ca, cr);
        self.clauses.push(cr);
        self.stats.clauses_literals += literals.len() as u64;
        cr
    }

    pub fn learn_clause(&mut self, literals: &[Lit], lbd: u32, watches: &mut Watches) -> ClauseRef {
        let cr = self.ca.alloc(literals, true);
        self.ca.edit(cr).set_lbd(lbd);
        watches.watch_clause(&self.ca, cr);
        self.learnts.push(cr);
        self.stats.learnts += 1;
        self.stats.learnts_literals += literals.len() as u64;
        cr
    }

    pub fn bump_activity(&mut self, cr: ClauseRef) {
        let new = self.ca.view(cr).activity() as f64 + self.cla_inc;
        if new > 1e20 {
            self.cla_inc *= 1e-20;
            for &lr in self.learnts.iter() {
                let rescaled = self.ca.view(lr).activity() as f64 * 1e-20;
                self.ca.edit(lr).set_activity(rescaled as f32);
            }
            self.ca.edit(cr).set_activity((new * 1e-20) as f32);
        } else {
            self.ca.edit(cr).set_activity(new as f32);
        }
    }

    pub fn decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.settings.clause_decay;
    }

    /// Deletes a learnt clause: unwatch, mark, drop from the learnts list.
    fn remove_learnt(&mut self, cr: ClauseRef, watches: &mut Watches) {
        watches.unwatch_clause_lazy(&self.ca, cr);
        self.ca.free(cr);
        self.learnts.retain(|&x| x != cr);
    }

    /// Drops originals satisfied at the ground level, and shrinks the
    /// literals of surviving clauses that are already falsified there
    /// (spec.md §4.7).
    pub fn remove_satisfied_originals(&mut self, assigns: &Assignment, watches: &mut Watches) {
        let ca = &mut self.ca;
        self.clauses.retain(|&cr| {
            let satisfied_at_ground = ca
                .view(cr)
                .lits()
                .iter()
                .any(|&l| assigns.is_sat(l) && assigns.vardata(l).reason.is_none());
            if satisfied_at_ground {
                watches.unwatch_clause_lazy(ca, cr);
                ca.free(cr);
                false
            } else {
                retain_clause(ca, cr, |l| !assigns.is_unsat(l));
                true
            }
        });
    }

    /// Learned-clause reduction (spec.md §4.9). Clauses with LBD <= 2 and
    /// clauses currently serving as a propagation reason are protected;
    /// the remaining worst half (ordered by LBD desc, activity asc) is
    /// deleted. The Open Question in spec.md §9 about the exact protection
    /// policy is resolved here by following the conventional Glucose rule
    /// named in the spec text itself.
    pub fn reduce(&mut self, assigns: &Assignment, watches: &mut Watches) {
        self.reduce_round += 1;

        let mut candidates: Vec<ClauseRef> = self
            .learnts
            .iter()
            .copied()
            .filter(|&cr| {
                let c = self.ca.view(cr);
                c.lbd() > 2 && !assigns.is_locked(c.head(), cr)
            })
            .collect();

        candidates.sort_by(|&a, &b| {
            let ca_view = self.ca.view(a);
            let cb_view = self.ca.view(b);
            cb_view
                .lbd()
                .cmp(&ca_view.lbd())
                .then(ca_view.activity().partial_cmp(&cb_view.activity()).unwrap())
        });

        let to_delete = candidates.len() / 2;
        for &cr in candidates.iter().take(to_delete) {
            self.remove_learnt(cr, watches);
        }

        self.n_confl_bfr_reduce += self.settings.inc_reduce
            + if self.reduce_round % 8 == 0 { self.settings.inc_special_reduce } else { 0 };
    }

    pub fn reloc_gc(&mut self, assigns: &mut Assignment, watches: &mut Watches) {
        let mut to = ClauseAllocator::new_for_gc(&self.ca);

        for cr in self.clauses.iter_mut() {
            *cr = self.ca.reloc_to(&mut to, *cr).expect("original clause must be live");
        }
        for cr in self.learnts.iter_mut() {
            *cr = self.ca.reloc_to(&mut to, *cr).expect("learnt clause must be live");
        }

        assigns.reloc_reasons(&mut self.ca, &mut to);
        watches.reloc_gc(&mut self.ca, &mut to);

        self.ca = to;
    }

    pub fn garbage_ratio_exceeds(&self, max_ratio: f64) -> bool {
        self.ca.garbage_ratio() > max_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learnt_clauses_are_tracked_separately_from_originals() {
        let mut db = ClauseDB::new(ClauseDBSettings::default());
        let mut watches = Watches::new();
        let mut assigns = Assignment::new();
        let vars: Vec<_> = (0..4)
            .map(|_| {
                let v = assigns.new_var();
                watches.init_var(v);
                v
            })
            .collect();

        db.add_clause(&[vars[0].pos_lit(), vars[1].pos_lit()], &mut watches);
        db.learn_clause(&[vars[2].pos_lit(), vars[3].neg_lit()], 2, &mut watches);

        assert_eq!(db.number_of_originals(), 1);
        assert_eq!(db.number_of_learnts(), 1);
    }
}
