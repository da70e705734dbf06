use firmhub_core::UserId;

/// Authenticated identity for a request.
///
/// Inserted into request extensions by the auth gate; handlers read it
/// instead of any process-wide state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
}

impl PrincipalContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
