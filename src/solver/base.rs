/// A solver bounded by a work budget.
///
/// What one unit of budget buys is up to the solver (branch expansions,
/// restarts, ...). `solve_to_end` runs with `MAX_ITER`.
pub trait Solver<R>: Send + Sync
where
    R: Send + Sync,
{
    const MAX_ITER: usize = usize::MAX;

    fn solve(self, budget: usize) -> R;

    #[inline]
    fn solve_to_end(self) -> R
    where
        Self: Sized,
    {
        self.solve(Self::MAX_ITER)
    }
}
