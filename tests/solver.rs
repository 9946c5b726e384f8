use std::sync::Once;

use cdcl_core::{Budget, CoreSettings, LBool, SolveResult, Solver, Var};

static INIT_LOG: Once = Once::new();

fn init() {
    INIT_LOG.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn new_solver(n: usize) -> (Solver, Vec<Var>) {
    let mut solver = Solver::new(CoreSettings::default());
    let vars = (0..n).map(|_| solver.new_var(None, true)).collect();
    (solver, vars)
}

fn clause(vars: &[Var], lits: &[(usize, bool)]) -> Vec<cdcl_core::Lit> {
    lits.iter().map(|&(i, positive)| if positive { vars[i].pos_lit() } else { vars[i].neg_lit() }).collect()
}

fn no_budget() -> Budget {
    Budget::new()
}

#[test]
fn small_satisfiable_formula_finds_a_model() {
    init();
    let (mut solver, x) = new_solver(2);

    // (x1 v x2) & (~x1 v x2) & (x1 v ~x2)
    assert!(solver.add_clause(&clause(&x, &[(0, true), (1, true)])));
    assert!(solver.add_clause(&clause(&x, &[(0, false), (1, true)])));
    assert!(solver.add_clause(&clause(&x, &[(0, true), (1, false)])));

    assert_eq!(solver.solve(&no_budget()), SolveResult::Sat);

    let model = solver.model();
    let v1 = model[0] == LBool::True;
    let v2 = model[1] == LBool::True;
    assert!(v1 || v2);
    assert!(!v1 || v2);
    assert!(v1 || !v2);
}

#[test]
fn conflicting_unit_clauses_are_unsat_at_add_time() {
    init();
    let (mut solver, x) = new_solver(1);

    assert!(solver.add_clause(&clause(&x, &[(0, true)])));
    assert!(!solver.add_clause(&clause(&x, &[(0, false)])));

    // the contradiction is already resolved; solving only confirms it
    assert_eq!(solver.solve(&no_budget()), SolveResult::Unsat);
}

#[test]
fn pigeonhole_three_into_two_is_unsat() {
    init();
    // p[i][j]: pigeon i sits in hole j, i in 0..3, j in 0..2
    let (mut solver, vars) = new_solver(6);
    let p = |i: usize, j: usize| i * 2 + j;

    for i in 0..3 {
        assert!(solver.add_clause(&clause(&vars, &[(p(i, 0), true), (p(i, 1), true)])));
    }
    for j in 0..2 {
        for i in 0..3 {
            for k in (i + 1)..3 {
                assert!(solver.add_clause(&clause(&vars, &[(p(i, j), false), (p(k, j), false)])));
            }
        }
    }

    assert_eq!(solver.solve(&no_budget()), SolveResult::Unsat);
}

#[test]
fn unit_propagation_chain_forces_a_unique_model() {
    init();
    let (mut solver, x) = new_solver(3);

    // (~x1 v ~x2 v ~x3) & (~x1 v x2) & (~x2 v x3) & (~x3)
    assert!(solver.add_clause(&clause(&x, &[(0, false), (1, false), (2, false)])));
    assert!(solver.add_clause(&clause(&x, &[(0, false), (1, true)])));
    assert!(solver.add_clause(&clause(&x, &[(1, false), (2, true)])));
    assert!(solver.add_clause(&clause(&x, &[(2, false)])));

    assert_eq!(solver.solve(&no_budget()), SolveResult::Sat);

    assert_eq!(solver.value(x[2]), LBool::False);
    assert_eq!(solver.value(x[1]), LBool::False);
    assert_eq!(solver.value(x[0]), LBool::False);
}

#[test]
fn failed_assumptions_are_reported_in_the_final_conflict() {
    init();
    let (mut solver, x) = new_solver(2);

    // ~x1 v x2
    assert!(solver.add_clause(&clause(&x, &[(0, false), (1, true)])));

    solver.assume(x[0].pos_lit());
    solver.assume(x[1].neg_lit());

    assert_eq!(solver.solve(&no_budget()), SolveResult::Unsat);

    let mut conflict: Vec<_> = solver.final_conflict().to_vec();
    conflict.sort();
    let mut expected = vec![x[0].pos_lit(), x[1].neg_lit()];
    expected.sort();
    assert_eq!(conflict, expected);
}

#[test]
fn random_3sat_terminates_within_a_conflict_budget() {
    init();
    // Small deterministic LCG, independent of the solver's own RNG, just to
    // generate a fixed random 3-SAT instance at clause/variable ratio 4.25.
    struct Lcg(u64);
    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            self.0 >> 33
        }
        fn below(&mut self, n: usize) -> usize {
            (self.next() as usize) % n
        }
    }

    let n_vars = 50;
    let n_clauses = (n_vars as f64 * 4.25) as usize;
    let (mut solver, x) = new_solver(n_vars);

    let mut rng = Lcg(0xC0FFEE);
    for _ in 0..n_clauses {
        let mut picked = Vec::with_capacity(3);
        while picked.len() < 3 {
            let v = rng.below(n_vars);
            if !picked.iter().any(|&(i, _)| i == v) {
                picked.push((v, rng.next() % 2 == 0));
            }
        }
        solver.add_clause(&clause(&x, &picked));
    }

    let budget = Budget::with_limits(200_000, 0);
    let result = solver.solve(&budget);
    assert!(result == SolveResult::Sat || result == SolveResult::Unsat);
}

#[test]
fn resolving_the_same_instance_twice_agrees() {
    init();
    let (mut solver, x) = new_solver(2);
    assert!(solver.add_clause(&clause(&x, &[(0, true), (1, true)])));
    assert!(solver.add_clause(&clause(&x, &[(0, false), (1, true)])));
    assert!(solver.add_clause(&clause(&x, &[(0, true), (1, false)])));

    let first = solver.solve(&no_budget());
    let second = solver.solve(&no_budget());
    assert_eq!(first, second);
    assert_eq!(first, SolveResult::Sat);
}

#[test]
fn clearing_assumptions_restores_satisfiability() {
    init();
    let (mut solver, x) = new_solver(2);
    assert!(solver.add_clause(&clause(&x, &[(0, false), (1, true)])));

    solver.assume(x[0].pos_lit());
    solver.assume(x[1].neg_lit());
    assert_eq!(solver.solve(&no_budget()), SolveResult::Unsat);

    solver.clear_assumptions();
    assert_eq!(solver.solve(&no_budget()), SolveResult::Sat);
}
