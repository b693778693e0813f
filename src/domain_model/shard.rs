use crate::domain_model::UserId;
use std::fmt;

/// The three per-user collections that make up one user's shard.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Collection {
    Friends,
    IncomingRequests,
    OutgoingRequests,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Friends => "friends",
            Collection::IncomingRequests => "incomingRequests",
            Collection::OutgoingRequests => "outgoingRequests",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address of one projection: `<owner>/<collection>/<member>`.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct DocKey {
    pub owner: UserId,
    pub collection: Collection,
    pub member: UserId,
}

impl DocKey {
    pub fn new(owner: &UserId, collection: Collection, member: &UserId) -> Self {
        DocKey {
            owner: owner.clone(),
            collection,
            member: member.clone(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.collection, self.member)
    }
}
