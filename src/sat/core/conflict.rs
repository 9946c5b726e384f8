use crate::sat::formula::assignment::{Assignment, GROUND_LEVEL};
use crate::sat::formula::clause::{ClauseAllocator, ClauseRef};
use crate::sat::formula::{Lit, LitMap, Var, VarMap};
use super::clause_db::ClauseDB;

#[derive(PartialEq, Eq)]
pub enum CCMinMode {
    None,
    Basic,
    Deep,
}

impl Default for CCMinMode {
    fn default() -> Self {
        CCMinMode::Deep
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Seen {
    Undef,
    Source,
    Removable,
    Failed,
}

pub enum Conflict {
    Ground,
    Unit(Lit),
    Learned { backjump_level: usize, asserting: Lit, clause: Vec<Lit>, lbd: u32 },
}

/// First-UIP conflict analysis (spec.md §4.5): resolves the conflict clause
/// against reasons walking the trail backwards until exactly one literal at
/// the current decision level remains, then minimizes the result and
/// computes its LBD.
pub struct AnalyzeContext {
    ccmin_mode: CCMinMode,
    seen: VarMap<Seen>,
    analyze_toclear: Vec<Lit>,
    /// Indexed by decision-level offset, not by variable: `compute_lbd`
    /// counts distinct levels, and many variables share a level.
    level_stamp: Vec<u32>,
    cur_stamp: u32,
    pub max_literals: u64,
    pub tot_literals: u64,
}

impl AnalyzeContext {
    pub fn new(ccmin_mode: CCMinMode) -> AnalyzeContext {
        AnalyzeContext {
            ccmin_mode,
            seen: VarMap::new(),
            analyze_toclear: Vec::new(),
            level_stamp: Vec::new(),
            cur_stamp: 0,
            max_literals: 0,
            tot_literals: 0,
        }
    }

    pub fn init_var(&mut self, v: Var) {
        self.seen.insert(&v, Seen::Undef);
    }

    pub fn analyze<BV>(
        &mut self,
        assigns: &Assignment,
        db: &mut ClauseDB,
        confl0: ClauseRef,
        mut bump_var: BV,
    ) -> Conflict
    where
        BV: FnMut(Var) -> (),
    {
        if assigns.is_ground_level() {
            return Conflict::Ground;
        }

        let mut out_learnt = Vec::with_capacity(assigns.number_of_assigns());

        {
            let mut confl = confl0;
            let mut pivot = None;
            let mut path_c = 0;

            let trail = assigns.trail();
            let mut index = trail.len();
            loop {
                if db.ca().view(confl).is_learnt() {
                    db.bump_activity(confl);
                }

                let lits = db.ca().view(confl).lits().to_vec();
                for &q in lits.iter().filter(|&&q| Some(q) != pivot) {
                    let v = q.var();
                    if self.seen[&v] == Seen::Undef {
                        let level = assigns.vardata(q).level;
                        if level > GROUND_LEVEL {
                            self.seen[&v] = Seen::Source;
                            bump_var(v);
                            if level >= assigns.current_level() {
                                path_c += 1;
                            } else {
                                out_learnt.push(q);
                            }
                        }
                    }
                }

                let pl = loop {
                    index -= 1;
                    if self.seen[&trail[index].var()] != Seen::Undef {
                        break trail[index];
                    }
                };

                self.seen[&pl.var()] = Seen::Undef;

                path_c -= 1;
                if path_c <= 0 {
                    out_learnt.insert(0, !pl);
                    break;
                }

                confl = assigns.vardata(!pl).reason.unwrap();
                pivot = Some(pl);
            }
        }

        self.analyze_toclear = out_learnt.clone();
        self.max_literals += out_learnt.len() as u64;
        match self.ccmin_mode {
            CCMinMode::Deep => out_learnt.retain(|&l| !self.lit_redundant(db.ca(), assigns, l)),
            CCMinMode::Basic => out_learnt.retain(|&l| !self.lit_redundant_basic(db.ca(), assigns, l)),
            CCMinMode::None => {}
        }
        self.tot_literals += out_learnt.len() as u64;

        let lbd = self.compute_lbd(assigns, &out_learnt);

        for l in self.analyze_toclear.iter() {
            self.seen[&l.var()] = Seen::Undef;
        }

        if out_learnt.len() == 1 {
            Conflict::Unit(out_learnt[0])
        } else {
            let mut max_i = 1;
            let mut max_level = assigns.vardata(out_learnt[1]).level;
            for i in 2..out_learnt.len() {
                let level = assigns.vardata(out_learnt[i]).level;
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            out_learnt.swap(1, max_i);
            Conflict::Learned {
                backjump_level: max_level.offset(),
                asserting: out_learnt[0],
                clause: out_learnt,
                lbd,
            }
        }
    }

    /// Number of distinct decision levels among `lits` (spec.md §4.5),
    /// computed with a monotone stamp so no O(n) clear is needed between
    /// calls (spec.md §9).
    fn compute_lbd(&mut self, assigns: &Assignment, lits: &[Lit]) -> u32 {
        self.cur_stamp = self.cur_stamp.wrapping_add(1);
        if self.cur_stamp == 0 {
            for s in self.level_stamp.iter_mut() {
                *s = 0;
            }
            self.cur_stamp = 1;
        }

        let mut lbd = 0;
        for &lit in lits {
            let offset = assigns.vardata(lit).level.offset();
            if offset >= self.level_stamp.len() {
                self.level_stamp.resize(offset + 1, 0);
            }
            if self.level_stamp[offset] != self.cur_stamp {
                self.level_stamp[offset] = self.cur_stamp;
                lbd += 1;
            }
        }
        lbd
    }

    fn lit_redundant_basic(&self, ca: &ClauseAllocator, assigns: &Assignment, literal: Lit) -> bool {
        match assigns.vardata(literal).reason {
            None => false,
            Some(cr) => {
                let pivot = !literal;
                for &lit in ca.view(cr).lits().iter().filter(|&&l| l != pivot) {
                    if self.seen[&lit.var()] == Seen::Undef && assigns.vardata(lit).level > GROUND_LEVEL {
                        return false;
                    }
                }
                true
            }
        }
    }

    fn lit_redundant(&mut self, ca: &ClauseAllocator, assigns: &Assignment, literal: Lit) -> bool {
        debug_assert!({
            let s = self.seen[&literal.var()];
            s == Seen::Undef || s == Seen::Source
        });

        let mut analyze_stack = match assigns.vardata(literal).reason {
            None => return false,
            Some(cr) => {
                let pivot = !literal;
                vec![(literal, ca.view(cr).lits().iter().cloned().filter(|&l| l != pivot).collect::<Vec<_>>())]
            }
        };

        while let Some((p, lits)) = analyze_stack.pop() {
            match lits.split_first() {
                Some((&l, tail)) => {
                    analyze_stack.push((p, tail.to_vec()));
                    let vd = assigns.vardata(l);
                    let seen = self.seen[&l.var()];

                    if vd.level == GROUND_LEVEL || seen == Seen::Source || seen == Seen::Removable {
                        continue;
                    }

                    match vd.reason {
                        Some(cr) if seen == Seen::Undef => {
                            let pivot = !l;
                            let rest = ca.view(cr).lits().iter().cloned().filter(|&x| x != pivot).collect();
                            analyze_stack.push((l, rest));
                        }
                        _ => {
                            for &(l, _) in analyze_stack.iter() {
                                if self.seen[&l.var()] == Seen::Undef {
                                    self.seen[&l.var()] = Seen::Failed;
                                    self.analyze_toclear.push(l);
                                }
                            }
                            return false;
                        }
                    }
                }

                None => {
                    if self.seen[&p.var()] == Seen::Undef {
                        self.seen[&p.var()] = Seen::Removable;
                        self.analyze_toclear.push(p);
                    }
                }
            }
        }

        true
    }

    /// Computes the final conflict core over assumptions (spec.md §3, §6).
    pub fn analyze_final(&mut self, ca: &ClauseAllocator, assigns: &Assignment, p: Lit) -> LitMap<()> {
        let mut out_conflict = LitMap::new();
        out_conflict.insert(&p, ());

        if assigns.is_ground_level() {
            return out_conflict;
        }

        self.seen[&p.var()] = Seen::Source;
        for &lit in assigns.trail_above(GROUND_LEVEL).iter().rev() {
            let v = lit.var();
            if self.seen[&v] != Seen::Undef {
                match assigns.vardata(lit).reason {
                    None => {
                        debug_assert!(assigns.vardata(lit).level > GROUND_LEVEL);
                        out_conflict.insert(&!lit, ());
                    }
                    Some(cr) => {
                        for &other in ca.view(cr).lits().iter().filter(|&&x| x != lit) {
                            if assigns.vardata(other).level > GROUND_LEVEL {
                                self.seen[&other.var()] = Seen::Source;
                            }
                        }
                    }
                }
                self.seen[&v] = Seen::Undef;
            }
        }
        self.seen[&p.var()] = Seen::Undef;

        out_conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::clause_db::ClauseDBSettings;

    #[test]
    fn ground_level_conflict_is_reported() {
        let mut ctx = AnalyzeContext::new(CCMinMode::Deep);
        let assigns = Assignment::new();
        let mut db = ClauseDB::new(ClauseDBSettings::default());
        match ctx.analyze(&assigns, &mut db, 0, |_| {}) {
            Conflict::Ground => {}
            _ => panic!("expected ground-level conflict"),
        }
    }
}
