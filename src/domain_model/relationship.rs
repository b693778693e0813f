/// Derived state of an unordered pair, seen from the first user of the query.
///
/// `PendingAtoB` means the first user sent the request, `PendingBtoA` means
/// the second one did.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RelationshipState {
    None,
    PendingAtoB,
    PendingBtoA,
    Friends,
}

impl RelationshipState {
    /// The same state seen from the other side of the pair.
    pub fn reversed(self) -> Self {
        match self {
            RelationshipState::PendingAtoB => RelationshipState::PendingBtoA,
            RelationshipState::PendingBtoA => RelationshipState::PendingAtoB,
            other => other,
        }
    }
}
