use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    SqlErr, TransactionTrait,
    sea_query::Expr,
};

use keyhold_access_schema::{access_grants, locks, open_attempts, properties, tokens, users};
use keyhold_domain::id::{AttemptId, GrantId, LockId, PropertyId, TokenId, UserId};
use keyhold_domain::window::TimeWindow;

use crate::domain::repository::{
    GrantRepository, LockRepository, OpenAttemptRepository, PropertyRepository, TokenRepository,
    UserRepository,
};
use crate::domain::types::{
    AccessGrant, Lock, NewGrant, NewOpenAttempt, NewProperty, NewToken, NewUser, OpenAttempt,
    Property, Token, User,
};
use crate::error::AccessServiceError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AccessServiceError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &NewUser) -> Result<User, AccessServiceError> {
        let result = users::ActiveModel {
            id: NotSet,
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            phone: Set(user.phone.clone()),
            credential: Set(user.credential.clone()),
            role: Set(i16::from(user.role.as_u8())),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(model) => Ok(user_from_model(model)),
            // Lost a race with a concurrent registration of the same email.
            Err(e) if is_unique_violation(&e) => Err(AccessServiceError::UserAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: UserId(model.id),
        name: model.name,
        email: model.email,
        phone: model.phone,
        credential: model.credential,
        // Out-of-range values become an unknown role.
        role: u8::try_from(model.role).unwrap_or(u8::MAX),
        created_at: model.created_at,
    }
}

// ── Property repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPropertyRepository {
    pub db: DatabaseConnection,
}

impl PropertyRepository for DbPropertyRepository {
    async fn find_by_id(&self, id: PropertyId) -> Result<Option<Property>, AccessServiceError> {
        let model = properties::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find property by id")?;
        Ok(model.map(property_from_model))
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Property>, AccessServiceError> {
        let models = properties::Entity::find()
            .filter(properties::Column::OwnerId.eq(owner_id.0))
            .order_by_asc(properties::Column::Id)
            .all(&self.db)
            .await
            .context("list properties by owner")?;
        Ok(models.into_iter().map(property_from_model).collect())
    }

    async fn create(&self, property: &NewProperty) -> Result<Property, AccessServiceError> {
        let model = properties::ActiveModel {
            id: NotSet,
            owner_id: Set(property.owner_id.0),
            name: Set(property.name.clone()),
            address: Set(property.address.clone()),
            image_ref: Set(property.image_ref.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("create property")?;
        Ok(property_from_model(model))
    }
}

fn property_from_model(model: properties::Model) -> Property {
    Property {
        id: PropertyId(model.id),
        owner_id: UserId(model.owner_id),
        name: model.name,
        address: model.address,
        image_ref: model.image_ref,
        created_at: model.created_at,
    }
}

// ── Lock repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbLockRepository {
    pub db: DatabaseConnection,
}

impl LockRepository for DbLockRepository {
    async fn find_by_id(&self, id: LockId) -> Result<Option<Lock>, AccessServiceError> {
        let model = locks::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find lock by id")?;
        Ok(model.map(lock_from_model))
    }

    async fn find_property_owner_id(
        &self,
        lock_id: LockId,
    ) -> Result<Option<UserId>, AccessServiceError> {
        let found = locks::Entity::find_by_id(lock_id.0)
            .find_also_related(properties::Entity)
            .one(&self.db)
            .await
            .context("find lock property owner")?;
        Ok(found
            .and_then(|(_, property)| property)
            .map(|property| UserId(property.owner_id)))
    }

    async fn list_by_property(
        &self,
        property_id: PropertyId,
    ) -> Result<Vec<Lock>, AccessServiceError> {
        let models = locks::Entity::find()
            .filter(locks::Column::PropertyId.eq(property_id.0))
            .order_by_asc(locks::Column::Id)
            .all(&self.db)
            .await
            .context("list locks by property")?;
        Ok(models.into_iter().map(lock_from_model).collect())
    }

    async fn create(
        &self,
        property_id: PropertyId,
        model: &str,
    ) -> Result<Lock, AccessServiceError> {
        let model = locks::ActiveModel {
            id: NotSet,
            property_id: Set(property_id.0),
            model: Set(model.to_owned()),
            locked: Set(true),
            updated_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("create lock")?;
        Ok(lock_from_model(model))
    }

    async fn set_locked(&self, id: LockId, locked: bool) -> Result<Lock, AccessServiceError> {
        let model = write_lock_state(&self.db, id, locked)
            .await
            .context("set lock state")?;
        Ok(lock_from_model(model))
    }

    async fn unlock_with_attempt(
        &self,
        id: LockId,
        attempt: &NewOpenAttempt,
    ) -> Result<Lock, AccessServiceError> {
        let model = self
            .db
            .transaction::<_, locks::Model, DbErr>(|txn| {
                let attempt = attempt.clone();
                Box::pin(async move {
                    let lock = write_lock_state(txn, id, false).await?;
                    insert_attempt(txn, &attempt).await?;
                    Ok(lock)
                })
            })
            .await
            .context("unlock with attempt")?;
        Ok(lock_from_model(model))
    }
}

async fn write_lock_state<C: ConnectionTrait>(
    conn: &C,
    id: LockId,
    locked: bool,
) -> Result<locks::Model, DbErr> {
    locks::ActiveModel {
        id: Set(id.0),
        locked: Set(locked),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .update(conn)
    .await
}

fn lock_from_model(model: locks::Model) -> Lock {
    Lock {
        id: LockId(model.id),
        property_id: PropertyId(model.property_id),
        model: model.model,
        locked: model.locked,
        updated_at: model.updated_at,
    }
}

// ── Grant repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbGrantRepository {
    pub db: DatabaseConnection,
}

impl GrantRepository for DbGrantRepository {
    async fn find_active_for_guest(
        &self,
        guest_id: UserId,
        instant: DateTime<Utc>,
    ) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let models = access_grants::Entity::find()
            .filter(access_grants::Column::GuestId.eq(guest_id.0))
            .filter(access_grants::Column::StartsAt.lte(instant))
            .filter(access_grants::Column::EndsAt.gte(instant))
            .all(&self.db)
            .await
            .context("find active grants for guest")?;
        models.into_iter().map(grant_from_model).collect()
    }

    async fn list_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let models = access_grants::Entity::find()
            .filter(access_grants::Column::GuestId.eq(guest_id.0))
            .order_by_asc(access_grants::Column::StartsAt)
            .all(&self.db)
            .await
            .context("list grants by guest")?;
        models.into_iter().map(grant_from_model).collect()
    }

    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let models = access_grants::Entity::find()
            .filter(access_grants::Column::LockId.eq(lock_id.0))
            .order_by_asc(access_grants::Column::StartsAt)
            .all(&self.db)
            .await
            .context("list grants by lock")?;
        models.into_iter().map(grant_from_model).collect()
    }

    async fn create(&self, grant: &NewGrant) -> Result<AccessGrant, AccessServiceError> {
        let model = access_grants::ActiveModel {
            id: NotSet,
            guest_id: Set(grant.guest_id.0),
            lock_id: Set(grant.lock_id.0),
            starts_at: Set(grant.window.start()),
            ends_at: Set(grant.window.end()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("create grant")?;
        grant_from_model(model)
    }
}

fn grant_from_model(model: access_grants::Model) -> Result<AccessGrant, AccessServiceError> {
    let window = TimeWindow::new(model.starts_at, model.ends_at)
        .with_context(|| format!("grant {} has an inverted window", model.id))?;
    Ok(AccessGrant {
        id: GrantId(model.id),
        guest_id: UserId(model.guest_id),
        lock_id: LockId(model.lock_id),
        window,
        created_at: model.created_at,
    })
}

// ── Token repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTokenRepository {
    pub db: DatabaseConnection,
}

impl TokenRepository for DbTokenRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, AccessServiceError> {
        let model = tokens::Entity::find()
            .filter(tokens::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find token by code")?;
        model.map(token_from_model).transpose()
    }

    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<Token>, AccessServiceError> {
        let models = tokens::Entity::find()
            .filter(tokens::Column::LockId.eq(lock_id.0))
            .order_by_desc(tokens::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list tokens by lock")?;
        models.into_iter().map(token_from_model).collect()
    }

    async fn create(&self, token: &NewToken) -> Result<Option<Token>, AccessServiceError> {
        let max_uses = i32::try_from(token.max_uses).context("token max uses out of range")?;
        let result = tokens::ActiveModel {
            id: NotSet,
            code: Set(token.code.clone()),
            lock_id: Set(token.lock_id.0),
            starts_at: Set(token.window.start()),
            ends_at: Set(token.window.end()),
            single_use: Set(token.single_use),
            uses: Set(0),
            max_uses: Set(max_uses),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(model) => token_from_model(model).map(Some),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("create token").into()),
        }
    }

    async fn consume_and_unlock(
        &self,
        id: TokenId,
        expected_uses: u32,
        attempt: &NewOpenAttempt,
    ) -> Result<Option<Token>, AccessServiceError> {
        let expected = i32::try_from(expected_uses).context("token use counter out of range")?;
        let consumed = self
            .db
            .transaction::<_, Option<tokens::Model>, DbErr>(|txn| {
                let attempt = attempt.clone();
                Box::pin(async move {
                    // Compare-and-increment: a concurrent redemption that committed first
                    // leaves `uses != expected`, so this matches nothing.
                    let result = tokens::Entity::update_many()
                        .col_expr(tokens::Column::Uses, Expr::col(tokens::Column::Uses).add(1))
                        .filter(tokens::Column::Id.eq(id.0))
                        .filter(tokens::Column::Uses.eq(expected))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        return Ok(None);
                    }
                    let token = tokens::Entity::find_by_id(id.0)
                        .one(txn)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound(format!("token {id}")))?;
                    write_lock_state(txn, LockId(token.lock_id), false).await?;
                    insert_attempt(txn, &attempt).await?;
                    Ok(Some(token))
                })
            })
            .await
            .context("consume token and unlock")?;
        consumed.map(token_from_model).transpose()
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let result = tokens::Entity::delete_many()
            .filter(tokens::Column::EndsAt.lt(now))
            .exec(&self.db)
            .await
            .context("delete expired tokens")?;
        Ok(result.rows_affected)
    }
}

fn token_from_model(model: tokens::Model) -> Result<Token, AccessServiceError> {
    let window = TimeWindow::new(model.starts_at, model.ends_at)
        .with_context(|| format!("token {} has an inverted window", model.id))?;
    Ok(Token {
        id: TokenId(model.id),
        code: model.code,
        lock_id: LockId(model.lock_id),
        window,
        single_use: model.single_use,
        uses: u32::try_from(model.uses).context("negative token use counter")?,
        max_uses: u32::try_from(model.max_uses).context("negative token max uses")?,
        created_at: model.created_at,
    })
}

// ── Open-attempt repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOpenAttemptRepository {
    pub db: DatabaseConnection,
}

impl OpenAttemptRepository for DbOpenAttemptRepository {
    async fn append(&self, attempt: &NewOpenAttempt) -> Result<OpenAttempt, AccessServiceError> {
        let model = insert_attempt(&self.db, attempt)
            .await
            .context("append open attempt")?;
        Ok(attempt_from_model(model))
    }

    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<OpenAttempt>, AccessServiceError> {
        let models = open_attempts::Entity::find()
            .filter(open_attempts::Column::LockId.eq(lock_id.0))
            .order_by_desc(open_attempts::Column::OccurredAt)
            .order_by_desc(open_attempts::Column::Id)
            .all(&self.db)
            .await
            .context("list open attempts by lock")?;
        Ok(models.into_iter().map(attempt_from_model).collect())
    }
}

async fn insert_attempt<C: ConnectionTrait>(
    conn: &C,
    attempt: &NewOpenAttempt,
) -> Result<open_attempts::Model, DbErr> {
    open_attempts::ActiveModel {
        id: NotSet,
        occurred_at: Set(attempt.occurred_at),
        success: Set(attempt.success),
        reason: Set(attempt.reason.clone()),
        user_id: Set(attempt.user_id.map(|u| u.0)),
        lock_id: Set(attempt.lock_id.0),
    }
    .insert(conn)
    .await
}

fn attempt_from_model(model: open_attempts::Model) -> OpenAttempt {
    OpenAttempt {
        id: AttemptId(model.id),
        occurred_at: model.occurred_at,
        success: model.success,
        reason: model.reason,
        user_id: model.user_id.map(UserId),
        lock_id: LockId(model.lock_id),
    }
}
