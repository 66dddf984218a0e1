/// Defines game phases and how they may follow each other
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    /// Whether player input is accepted in this phase.
    fn allows_input(&self) -> bool;

    /// Whether `next` may directly follow this phase. Staying put is never a transition.
    fn can_advance_to(&self, next: Self) -> bool;

    fn is_terminal(&self) -> bool;

    /// Stable lowercase name handed to the host in snapshots.
    fn label(&self) -> &'static str;

    /// Whether the engine may be paused while in this phase.
    fn is_pausable(&self) -> bool {
        !self.is_terminal()
    }
}
