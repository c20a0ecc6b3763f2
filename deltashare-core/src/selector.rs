/// Chooses which flat positions a peer shares in a round.
///
/// Determinism: implementations must return the same positions for the same
/// signal so that test fixtures and replayed rounds are reproducible.
pub trait Selector {
    /// Pick positions from an accumulated delta signal. Every returned index
    /// is `< signal.len()` and appears at most once.
    fn select(&self, signal: &[f32]) -> Vec<usize>;
}
