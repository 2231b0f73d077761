//! Interface to the external predicate solver.

use crate::literal::SetLiteral;
use crate::module::ModuleId;

/// Predicate over module parameters, handed to the solver.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// The parameter's domain equals the literal.
    Is(ModuleId, SetLiteral),
    /// Every operand holds.
    And(Vec<Predicate>),
    /// At least one operand holds.
    Or(Vec<Predicate>),
    /// Trivially true.
    True,
}

impl Predicate {
    /// The always-valid predicate, an `Or` over the constant true.
    #[must_use]
    pub fn tautology() -> Self {
        Self::Or(vec![Self::True])
    }
}

/// Outcome of [`Solver::assert_any_predicate`]: the satisfiable subset of
/// the candidates, in solver order, each with the caller-supplied tag.
#[derive(Debug, Default)]
pub struct SolveResult {
    /// Predicates the solver proved satisfiable, with their tags.
    pub true_predicates: Vec<(Predicate, usize)>,
}

/// External predicate solver.
///
/// The engine is agnostic of the solving machinery behind this trait; the
/// only contract is the one below. Implementations must preserve a stable,
/// caller-meaningful order in [`SolveResult::true_predicates`]; an
/// order-preserving solver returns them in input order.
pub trait Solver {
    /// Out of `candidates`, return those satisfiable under the current
    /// constraint state. With `lock` set, the chosen disjunct must be
    /// durably committed before returning.
    fn assert_any_predicate(
        &mut self,
        candidates: &[(Predicate, usize)],
        lock: bool,
    ) -> SolveResult;

    /// Human-readable description of the solver's knowledge about `param`,
    /// `None` when it knows nothing.
    fn describe(&self, param: ModuleId) -> Option<String>;
}
