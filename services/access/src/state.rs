use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbGrantRepository, DbLockRepository, DbOpenAttemptRepository, DbPropertyRepository,
    DbTokenRepository, DbUserRepository,
};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn property_repo(&self) -> DbPropertyRepository {
        DbPropertyRepository {
            db: self.db.clone(),
        }
    }

    pub fn lock_repo(&self) -> DbLockRepository {
        DbLockRepository {
            db: self.db.clone(),
        }
    }

    pub fn grant_repo(&self) -> DbGrantRepository {
        DbGrantRepository {
            db: self.db.clone(),
        }
    }

    pub fn token_repo(&self) -> DbTokenRepository {
        DbTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn open_attempt_repo(&self) -> DbOpenAttemptRepository {
        DbOpenAttemptRepository {
            db: self.db.clone(),
        }
    }
}
