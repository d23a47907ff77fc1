use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use keyhold_access::domain::repository::{
    GrantRepository, LockRepository, OpenAttemptRepository, PropertyRepository, TokenRepository,
    UserRepository,
};
use keyhold_access::domain::types::{
    AccessGrant, Lock, NewGrant, NewOpenAttempt, NewProperty, NewToken, NewUser, OpenAttempt,
    Property, Token, User,
};
use keyhold_access::error::AccessServiceError;
use keyhold_access::usecase::token::CodeGenerator;
use keyhold_domain::id::{AttemptId, GrantId, LockId, PropertyId, TokenId, UserId};
use keyhold_domain::user::UserRole;
use keyhold_domain::window::TimeWindow;

/// 2025-06-01 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    properties: Vec<Property>,
    locks: Vec<Lock>,
    grants: Vec<AccessGrant>,
    tokens: Vec<Token>,
    attempts: Vec<OpenAttempt>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn set_locked(&mut self, id: LockId, locked: bool) -> Option<Lock> {
        let lock = self.locks.iter_mut().find(|l| l.id == id)?;
        lock.locked = locked;
        lock.updated_at = Utc::now();
        Some(lock.clone())
    }

    fn append_attempt(&mut self, attempt: &NewOpenAttempt) -> OpenAttempt {
        let record = OpenAttempt {
            id: AttemptId(self.next_id()),
            occurred_at: attempt.occurred_at,
            success: attempt.success,
            reason: attempt.reason.clone(),
            user_id: attempt.user_id,
            lock_id: attempt.lock_id,
        };
        self.attempts.push(record.clone());
        record
    }
}

/// In-memory store implementing every repository trait over shared state.
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, name: &str, role: UserRole) -> User {
        let mut t = self.tables.lock().unwrap();
        let id = UserId(t.next_id());
        let user = User {
            id,
            name: name.to_owned(),
            email: format!("{name}@example.com"),
            phone: "+10000000000".to_owned(),
            credential: "secret".to_owned(),
            role: role.as_u8(),
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        user
    }

    /// User with a role discriminator no `UserRole` maps to.
    pub fn add_user_with_raw_role(&self, name: &str, role: u8) -> User {
        let user = self.add_user(name, UserRole::Guest);
        let mut t = self.tables.lock().unwrap();
        let stored = t.users.iter_mut().find(|u| u.id == user.id).unwrap();
        stored.role = role;
        stored.clone()
    }

    pub fn add_property(&self, owner_id: UserId) -> Property {
        let mut t = self.tables.lock().unwrap();
        let property = Property {
            id: PropertyId(t.next_id()),
            owner_id,
            name: "Beach House".to_owned(),
            address: "1 Shore Rd".to_owned(),
            image_ref: None,
            created_at: Utc::now(),
        };
        t.properties.push(property.clone());
        property
    }

    pub fn add_lock(&self, property_id: PropertyId) -> Lock {
        let mut t = self.tables.lock().unwrap();
        let lock = Lock {
            id: LockId(t.next_id()),
            property_id,
            model: "KL-200".to_owned(),
            locked: true,
            updated_at: Utc::now(),
        };
        t.locks.push(lock.clone());
        lock
    }

    pub fn add_grant(
        &self,
        guest_id: UserId,
        lock_id: LockId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AccessGrant {
        let mut t = self.tables.lock().unwrap();
        let grant = AccessGrant {
            id: GrantId(t.next_id()),
            guest_id,
            lock_id,
            window: TimeWindow::new(start, end).unwrap(),
            created_at: Utc::now(),
        };
        t.grants.push(grant.clone());
        grant
    }

    pub fn add_token(
        &self,
        code: &str,
        lock_id: LockId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        single_use: bool,
    ) -> Token {
        let mut t = self.tables.lock().unwrap();
        let token = Token {
            id: TokenId(t.next_id()),
            code: code.to_owned(),
            lock_id,
            window: TimeWindow::new(start, end).unwrap(),
            single_use,
            uses: 0,
            max_uses: if single_use { 1 } else { 9999 },
            created_at: Utc::now(),
        };
        t.tokens.push(token.clone());
        token
    }

    /// Seed an owner with one property holding one lock.
    pub fn owner_with_lock(&self) -> (User, Property, Lock) {
        let owner = self.add_user("olivia", UserRole::Owner);
        let property = self.add_property(owner.id);
        let lock = self.add_lock(property.id);
        (owner, property, lock)
    }

    pub fn lock_state(&self, id: LockId) -> Lock {
        let t = self.tables.lock().unwrap();
        t.locks.iter().find(|l| l.id == id).cloned().unwrap()
    }

    pub fn attempts(&self) -> Vec<OpenAttempt> {
        self.tables.lock().unwrap().attempts.clone()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.tables.lock().unwrap().tokens.clone()
    }

    pub fn grants(&self) -> Vec<AccessGrant> {
        self.tables.lock().unwrap().grants.clone()
    }
}

impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let user = User {
            id: UserId(t.next_id()),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            credential: user.credential.clone(),
            role: user.role.as_u8(),
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }
}

impl PropertyRepository for MemoryStore {
    async fn find_by_id(&self, id: PropertyId) -> Result<Option<Property>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.properties.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Property>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.properties
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, property: &NewProperty) -> Result<Property, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let property = Property {
            id: PropertyId(t.next_id()),
            owner_id: property.owner_id,
            name: property.name.clone(),
            address: property.address.clone(),
            image_ref: property.image_ref.clone(),
            created_at: Utc::now(),
        };
        t.properties.push(property.clone());
        Ok(property)
    }
}

impl LockRepository for MemoryStore {
    async fn find_by_id(&self, id: LockId) -> Result<Option<Lock>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.locks.iter().find(|l| l.id == id).cloned())
    }

    async fn find_property_owner_id(
        &self,
        lock_id: LockId,
    ) -> Result<Option<UserId>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        let Some(lock) = t.locks.iter().find(|l| l.id == lock_id) else {
            return Ok(None);
        };
        Ok(t.properties
            .iter()
            .find(|p| p.id == lock.property_id)
            .map(|p| p.owner_id))
    }

    async fn list_by_property(
        &self,
        property_id: PropertyId,
    ) -> Result<Vec<Lock>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.locks
            .iter()
            .filter(|l| l.property_id == property_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        property_id: PropertyId,
        model: &str,
    ) -> Result<Lock, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let lock = Lock {
            id: LockId(t.next_id()),
            property_id,
            model: model.to_owned(),
            locked: true,
            updated_at: Utc::now(),
        };
        t.locks.push(lock.clone());
        Ok(lock)
    }

    async fn set_locked(&self, id: LockId, locked: bool) -> Result<Lock, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        t.set_locked(id, locked)
            .ok_or_else(|| anyhow::anyhow!("lock {id} vanished").into())
    }

    async fn unlock_with_attempt(
        &self,
        id: LockId,
        attempt: &NewOpenAttempt,
    ) -> Result<Lock, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let lock = t
            .set_locked(id, false)
            .ok_or_else(|| AccessServiceError::from(anyhow::anyhow!("lock {id} vanished")))?;
        t.append_attempt(attempt);
        Ok(lock)
    }
}

impl GrantRepository for MemoryStore {
    async fn find_active_for_guest(
        &self,
        guest_id: UserId,
        instant: DateTime<Utc>,
    ) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.grants
            .iter()
            .filter(|g| g.guest_id == guest_id && g.window.contains(instant))
            .cloned()
            .collect())
    }

    async fn list_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.grants
            .iter()
            .filter(|g| g.guest_id == guest_id)
            .cloned()
            .collect())
    }

    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.grants
            .iter()
            .filter(|g| g.lock_id == lock_id)
            .cloned()
            .collect())
    }

    async fn create(&self, grant: &NewGrant) -> Result<AccessGrant, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let grant = AccessGrant {
            id: GrantId(t.next_id()),
            guest_id: grant.guest_id,
            lock_id: grant.lock_id,
            window: grant.window,
            created_at: Utc::now(),
        };
        t.grants.push(grant.clone());
        Ok(grant)
    }
}

impl TokenRepository for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, AccessServiceError> {
        let found = {
            let t = self.tables.lock().unwrap();
            t.tokens.iter().find(|tk| tk.code == code).cloned()
        };
        // Let concurrent callers read the same snapshot before anyone consumes.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<Token>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        Ok(t.tokens
            .iter()
            .filter(|tk| tk.lock_id == lock_id)
            .cloned()
            .collect())
    }

    async fn create(&self, token: &NewToken) -> Result<Option<Token>, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        if t.tokens.iter().any(|tk| tk.code == token.code) {
            return Ok(None);
        }
        let token = Token {
            id: TokenId(t.next_id()),
            code: token.code.clone(),
            lock_id: token.lock_id,
            window: token.window,
            single_use: token.single_use,
            uses: 0,
            max_uses: token.max_uses,
            created_at: Utc::now(),
        };
        t.tokens.push(token.clone());
        Ok(Some(token))
    }

    async fn consume_and_unlock(
        &self,
        id: TokenId,
        expected_uses: u32,
        attempt: &NewOpenAttempt,
    ) -> Result<Option<Token>, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let Some(token) = t
            .tokens
            .iter_mut()
            .find(|tk| tk.id == id && tk.uses == expected_uses)
        else {
            return Ok(None);
        };
        token.uses += 1;
        let token = token.clone();
        t.set_locked(token.lock_id, false);
        t.append_attempt(attempt);
        Ok(Some(token))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.tokens.len();
        t.tokens.retain(|tk| !tk.window.has_ended(now));
        Ok((before - t.tokens.len()) as u64)
    }
}

impl OpenAttemptRepository for MemoryStore {
    async fn append(&self, attempt: &NewOpenAttempt) -> Result<OpenAttempt, AccessServiceError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.append_attempt(attempt))
    }

    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<OpenAttempt>, AccessServiceError> {
        let t = self.tables.lock().unwrap();
        let mut attempts: Vec<OpenAttempt> = t
            .attempts
            .iter()
            .filter(|a| a.lock_id == lock_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        Ok(attempts)
    }
}

// ── ScriptedCodes ────────────────────────────────────────────────────────────

/// Yields the scripted codes in order, then `fallback` forever.
pub struct ScriptedCodes {
    codes: Mutex<VecDeque<String>>,
    fallback: String,
}

impl ScriptedCodes {
    pub fn new(codes: &[&str], fallback: &str) -> Self {
        Self {
            codes: Mutex::new(codes.iter().map(|c| (*c).to_owned()).collect()),
            fallback: fallback.to_owned(),
        }
    }

    pub fn always(code: &str) -> Self {
        Self::new(&[], code)
    }
}

impl CodeGenerator for ScriptedCodes {
    fn generate(&self) -> String {
        self.codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
