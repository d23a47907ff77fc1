use keyhold_domain::id::{LockId, UserId};

use crate::domain::repository::{LockRepository, OpenAttemptRepository, UserRepository};
use crate::domain::types::OpenAttempt;
use crate::error::AccessServiceError;
use crate::usecase::access::ensure_lock_owner;

pub struct ListAttemptsUseCase<U, L, A>
where
    U: UserRepository,
    L: LockRepository,
    A: OpenAttemptRepository,
{
    pub users: U,
    pub locks: L,
    pub attempts: A,
}

impl<U, L, A> ListAttemptsUseCase<U, L, A>
where
    U: UserRepository,
    L: LockRepository,
    A: OpenAttemptRepository,
{
    /// Open-attempt log of a lock, newest first. Owner only.
    pub async fn execute(
        &self,
        actor_id: UserId,
        lock_id: LockId,
    ) -> Result<Vec<OpenAttempt>, AccessServiceError> {
        let lock = ensure_lock_owner(&self.users, &self.locks, actor_id, lock_id).await?;
        self.attempts.list_by_lock(lock.id).await
    }
}
