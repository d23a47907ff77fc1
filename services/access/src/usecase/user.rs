use keyhold_domain::id::UserId;
use keyhold_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{NewUser, User};
use crate::error::AccessServiceError;
use crate::usecase::property::require_owner;

// ── RegisterUser ─────────────────────────────────────────────────────────────

pub struct RegisterUserInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub credential: String,
    pub role: UserRole,
}

pub struct RegisterUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> RegisterUserUseCase<R> {
    pub async fn execute(&self, input: RegisterUserInput) -> Result<User, AccessServiceError> {
        if self.repo.find_by_email(&input.email).await?.is_some() {
            return Err(AccessServiceError::UserAlreadyExists);
        }
        self.repo
            .create(&NewUser {
                name: input.name,
                email: input.email,
                phone: input.phone,
                credential: input.credential,
                role: input.role,
            })
            .await
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetUserUseCase<R> {
    pub async fn execute(&self, user_id: UserId) -> Result<User, AccessServiceError> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(AccessServiceError::UserNotFound)
    }
}

// ── FindUserByEmail ──────────────────────────────────────────────────────────

/// Owner-only lookup used to resolve a guest before granting access.
pub struct FindUserByEmailUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> FindUserByEmailUseCase<R> {
    pub async fn execute(
        &self,
        actor_id: UserId,
        email: &str,
    ) -> Result<User, AccessServiceError> {
        require_owner(&self.repo, actor_id).await?;
        self.repo
            .find_by_email(email)
            .await?
            .ok_or(AccessServiceError::UserNotFound)
    }
}
