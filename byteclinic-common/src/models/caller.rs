use uuid::Uuid;

use crate::Error;

/// The identity attached to a request after session verification.
/// Services that require a login call `require_user` and get a typed
/// `Unauthenticated` error for anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Authenticated { user_id: Uuid },
    Anonymous,
}

impl Caller {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Caller::Authenticated { user_id } => Some(*user_id),
            Caller::Anonymous => None,
        }
    }

    pub fn require_user(&self) -> Result<Uuid, Error> {
        self.user_id()
            .ok_or_else(|| Error::Unauthenticated("a valid session is required".into()))
    }
}
