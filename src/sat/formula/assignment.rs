use std::{cmp, fmt};
use super::clause::ClauseRef;
use super::{Lit, LBool, Var};

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct DecisionLevel(usize);

pub const GROUND_LEVEL: DecisionLevel = DecisionLevel(0);

impl DecisionLevel {
    pub fn new(offset: usize) -> DecisionLevel {
        DecisionLevel(offset)
    }

    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Reason + decision level recorded for each assigned variable. `reason`
/// is `None` for decision literals and for every literal assigned at the
/// ground level via top-level simplification.
#[derive(Clone, Copy)]
pub struct VarData {
    pub reason: Option<ClauseRef>,
    pub level: DecisionLevel,
}

struct VarLine {
    value: LBool,
    vd: VarData,
}

/// The assignment trail: a stack of literals in the order they became
/// true, partitioned into decision levels by `lim`. `qhead` is the index of
/// the next trail position the propagator has not yet processed.
pub struct Assignment {
    assignment: Vec<VarLine>,
    trail: Vec<Lit>,
    lim: Vec<usize>,
    qhead: usize,
}

impl Assignment {
    pub fn new() -> Assignment {
        Assignment { assignment: Vec::new(), trail: Vec::new(), lim: Vec::new(), qhead: 0 }
    }

    #[inline]
    pub fn number_of_vars(&self) -> usize {
        self.assignment.len()
    }

    #[inline]
    pub fn number_of_assigns(&self) -> usize {
        self.trail.len()
    }

    pub fn new_var(&mut self) -> Var {
        self.assignment.push(VarLine {
            value: LBool::Undef,
            vd: VarData { reason: None, level: GROUND_LEVEL },
        });
        Var::from_index(self.assignment.len() - 1)
    }

    #[inline]
    pub fn current_level(&self) -> DecisionLevel {
        DecisionLevel(self.lim.len())
    }

    #[inline]
    pub fn is_ground_level(&self) -> bool {
        self.lim.is_empty()
    }

    #[inline]
    pub fn new_decision_level(&mut self) {
        self.lim.push(self.trail.len());
    }

    /// Assigns `lit` true, recording `reason` (`None` ⇒ decision literal).
    #[inline]
    pub fn assign_lit(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        let line = &mut self.assignment[lit.var().index()];
        debug_assert!(line.value.is_undef());
        line.value = lit.pos_assignment();
        line.vd = VarData { reason, level: DecisionLevel(self.lim.len()) };
        self.trail.push(lit);
    }

    /// Pops the trail back to `target_level`, invoking `f` for each
    /// unassigned literal in reverse trail order (used to restore polarity
    /// and re-insert variables into the decision heap).
    #[inline]
    pub fn rewind_until_level<F: FnMut(Lit) -> ()>(&mut self, DecisionLevel(target_level): DecisionLevel, mut f: F) {
        while self.lim.len() > target_level {
            let bottom = self.lim.pop().unwrap();
            while self.trail.len() > bottom {
                let lit = self.trail.pop().unwrap();
                f(lit);
                let line = &mut self.assignment[lit.var().index()];
                line.value = LBool::Undef;
                line.vd.reason = None;
            }
        }
        self.qhead = cmp::min(self.qhead, self.trail.len());
    }

    #[inline]
    pub fn dequeue_all(&mut self) {
        self.qhead = self.trail.len();
    }

    #[inline]
    pub fn dequeue(&mut self) -> Option<Lit> {
        if self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            Some(p)
        } else {
            None
        }
    }

    #[inline]
    pub fn qhead(&self) -> usize {
        self.qhead
    }

    #[inline]
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// The suffix of the trail assigned strictly above `level`.
    #[inline]
    pub fn trail_above(&self, DecisionLevel(level): DecisionLevel) -> &[Lit] {
        if self.lim.len() > level {
            &self.trail[self.lim[level]..]
        } else {
            &[]
        }
    }

    #[inline]
    pub fn value(&self, var: Var) -> LBool {
        self.assignment[var.index()].value
    }

    #[inline]
    pub fn is_undef(&self, var: Var) -> bool {
        self.value(var).is_undef()
    }

    #[inline]
    pub fn lit_value(&self, lit: Lit) -> LBool {
        lit.apply_sign(self.value(lit.var()))
    }

    #[inline]
    pub fn is_sat(&self, lit: Lit) -> bool {
        self.lit_value(lit) == LBool::True
    }

    #[inline]
    pub fn is_unsat(&self, lit: Lit) -> bool {
        self.lit_value(lit) == LBool::False
    }

    #[inline]
    pub fn vardata(&self, lit: Lit) -> &VarData {
        let line = &self.assignment[lit.var().index()];
        debug_assert!(!line.value.is_undef());
        &line.vd
    }

    pub fn is_locked(&self, reason_head: Lit, cr: ClauseRef) -> bool {
        if !self.is_sat(reason_head) {
            return false;
        }
        self.vardata(reason_head).reason == Some(cr)
    }

    /// Rewrites every reason clause reference after a compaction of the
    /// arena (spec.md §4.1).
    pub fn reloc_reasons(&mut self, from: &mut super::clause::ClauseAllocator, to: &mut super::clause::ClauseAllocator) {
        for &lit in self.trail.iter() {
            let reason = &mut self.assignment[lit.var().index()].vd.reason;
            *reason = reason.and_then(|cr| from.reloc_to(to, cr));
        }
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for level in 0..1 + self.lim.len() {
            let l = if level > 0 { self.lim[level - 1] } else { 0 };
            let r = if level < self.lim.len() { self.lim[level] } else { self.trail.len() };
            if r > l {
                write!(f, "[{}:", level)?;
                for lit in self.trail[l..r].iter() {
                    write!(f, " {:?}", lit)?;
                }
                write!(f, " ]")?;
            }
        }
        Ok(())
    }
}

pub fn progress_estimate(assigns: &Assignment) -> f64 {
    let f = 1.0 / (assigns.number_of_vars() as f64);
    let mut progress = 0.0;
    let cl = assigns.lim.len();
    for level in 0..cl + 1 {
        let l = if level == 0 { 0 } else { assigns.lim[level - 1] };
        let r = if level == cl { assigns.trail.len() } else { assigns.lim[level] };
        progress += f.powi(level as i32) * ((r - l) as f64);
    }
    progress * f
}

pub fn extract_model(assigns: &Assignment) -> Vec<LBool> {
    let mut model = Vec::with_capacity(assigns.assignment.len());
    for line in assigns.assignment.iter() {
        model.push(line.value);
    }
    model
}
