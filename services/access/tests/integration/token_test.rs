use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;

use keyhold_access::domain::types::{ATTEMPT_GRANTED, MULTI_USE_MAX_USES};
use keyhold_access::error::AccessServiceError;
use keyhold_access::usecase::token::{
    IssueTokenInput, IssueTokenUseCase, ListOwnerTokensUseCase, PurgeExpiredTokensUseCase,
    ValidateTokenInput, ValidateTokenUseCase,
};
use keyhold_domain::id::{LockId, UserId};
use keyhold_domain::user::UserRole;

use crate::helpers::{MemoryStore, ScriptedCodes, at};

fn issue(
    store: &MemoryStore,
    codes: ScriptedCodes,
) -> IssueTokenUseCase<MemoryStore, MemoryStore, ScriptedCodes> {
    IssueTokenUseCase {
        locks: store.clone(),
        tokens: store.clone(),
        codes,
    }
}

fn validate(
    store: &MemoryStore,
) -> ValidateTokenUseCase<MemoryStore, MemoryStore, MemoryStore> {
    ValidateTokenUseCase {
        locks: store.clone(),
        tokens: store.clone(),
        attempts: store.clone(),
    }
}

fn redeem(code: &str, lock_id: LockId, now: DateTime<Utc>) -> ValidateTokenInput {
    ValidateTokenInput {
        code: code.to_owned(),
        lock_id,
        actor_id: None,
        now,
    }
}

// ── IssueToken ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_single_use_token_for_existing_lock() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();

    let token = issue(&store, ScriptedCodes::always("Ab3dEf7h"))
        .execute(IssueTokenInput {
            lock_id: lock.id,
            start: at(10, 0),
            end: at(11, 0),
            single_use: true,
        })
        .await
        .unwrap();

    assert_eq!(token.code, "Ab3dEf7h");
    assert_eq!(token.lock_id, lock.id);
    assert_eq!(token.uses, 0);
    assert_eq!(token.max_uses, 1);
    assert!(token.single_use);
}

#[tokio::test]
async fn should_issue_multi_use_token_with_large_budget() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();

    let token = issue(&store, ScriptedCodes::always("MultiUse"))
        .execute(IssueTokenInput {
            lock_id: lock.id,
            start: at(10, 0),
            end: at(11, 0),
            single_use: false,
        })
        .await
        .unwrap();

    assert!(!token.single_use);
    assert_eq!(token.max_uses, MULTI_USE_MAX_USES);
}

#[tokio::test]
async fn should_reject_issue_for_missing_lock() {
    let store = MemoryStore::new();

    let result = issue(&store, ScriptedCodes::always("Ab3dEf7h"))
        .execute(IssueTokenInput {
            lock_id: LockId(77),
            start: at(10, 0),
            end: at(11, 0),
            single_use: true,
        })
        .await;

    assert!(
        matches!(result, Err(AccessServiceError::LockNotFound)),
        "expected LockNotFound, got {result:?}"
    );
    assert!(store.tokens().is_empty());
}

#[tokio::test]
async fn should_reject_issue_with_inverted_window() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();

    let result = issue(&store, ScriptedCodes::always("Ab3dEf7h"))
        .execute(IssueTokenInput {
            lock_id: lock.id,
            start: at(11, 0),
            end: at(10, 0),
            single_use: true,
        })
        .await;

    assert!(
        matches!(result, Err(AccessServiceError::InvalidWindow)),
        "expected InvalidWindow, got {result:?}"
    );
}

#[tokio::test]
async fn should_retry_when_generated_code_is_taken() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("TAKEN001", lock.id, at(10, 0), at(11, 0), true);

    let token = issue(&store, ScriptedCodes::new(&["TAKEN001"], "Fresh002"))
        .execute(IssueTokenInput {
            lock_id: lock.id,
            start: at(10, 0),
            end: at(11, 0),
            single_use: true,
        })
        .await
        .unwrap();

    assert_eq!(token.code, "Fresh002");
    let codes: Vec<String> = store.tokens().into_iter().map(|t| t.code).collect();
    assert_eq!(codes, vec!["TAKEN001".to_owned(), "Fresh002".to_owned()]);
}

#[tokio::test]
async fn should_fail_internal_when_every_code_is_taken() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("TAKEN001", lock.id, at(10, 0), at(11, 0), true);

    let result = issue(&store, ScriptedCodes::always("TAKEN001"))
        .execute(IssueTokenInput {
            lock_id: lock.id,
            start: at(10, 0),
            end: at(11, 0),
            single_use: true,
        })
        .await;

    assert!(
        matches!(result, Err(AccessServiceError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert_eq!(store.tokens().len(), 1);
}

// ── ValidateAndConsume ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_consume_single_use_token_once() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    let t0 = at(10, 0);
    let token = issue(&store, ScriptedCodes::always("OnceOnly"))
        .execute(IssueTokenInput {
            lock_id: lock.id,
            start: t0,
            end: t0 + Duration::hours(1),
            single_use: true,
        })
        .await
        .unwrap();
    let usecase = validate(&store);
    let half_hour = t0 + Duration::minutes(30);

    let consumed = usecase
        .execute(redeem(&token.code, lock.id, half_hour))
        .await
        .unwrap();
    assert_eq!(consumed.uses, 1);
    assert!(!store.lock_state(lock.id).locked);

    let again = usecase.execute(redeem(&token.code, lock.id, half_hour)).await;
    assert!(
        matches!(again, Err(AccessServiceError::Expired)),
        "expected Expired, got {again:?}"
    );
}

#[tokio::test]
async fn should_accept_token_at_window_boundaries_only() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("MULTI001", lock.id, at(10, 0), at(11, 0), false);
    let usecase = validate(&store);
    let ms = Duration::milliseconds(1);

    assert!(usecase.execute(redeem("MULTI001", lock.id, at(10, 0))).await.is_ok());
    assert!(usecase.execute(redeem("MULTI001", lock.id, at(11, 0))).await.is_ok());

    let early = usecase
        .execute(redeem("MULTI001", lock.id, at(10, 0) - ms))
        .await;
    assert!(matches!(early, Err(AccessServiceError::Expired)));
    let late = usecase
        .execute(redeem("MULTI001", lock.id, at(11, 0) + ms))
        .await;
    assert!(matches!(late, Err(AccessServiceError::Expired)));
}

#[tokio::test]
async fn should_reject_unknown_code() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();

    let result = validate(&store)
        .execute(redeem("NOPE0000", lock.id, at(10, 30)))
        .await;

    assert!(
        matches!(result, Err(AccessServiceError::TokenNotFound)),
        "expected TokenNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_record_attempt_for_redeem_on_missing_lock() {
    let store = MemoryStore::new();

    let result = validate(&store)
        .execute(redeem("NOPE0000", LockId(424242), at(10, 30)))
        .await;

    assert!(
        matches!(result, Err(AccessServiceError::LockNotFound)),
        "expected LockNotFound, got {result:?}"
    );
    assert!(store.attempts().is_empty());
}

#[tokio::test]
async fn should_not_consume_token_redeemed_against_missing_lock() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("FRONT001", lock.id, at(10, 0), at(11, 0), true);

    let result = validate(&store)
        .execute(redeem("FRONT001", LockId(424242), at(10, 30)))
        .await;

    assert!(matches!(result, Err(AccessServiceError::LockNotFound)));
    assert_eq!(store.tokens()[0].uses, 0);
    assert!(store.attempts().is_empty());
}

#[tokio::test]
async fn should_reject_token_for_another_lock() {
    let store = MemoryStore::new();
    let (_, property, lock) = store.owner_with_lock();
    let other = store.add_lock(property.id);
    store.add_token("FRONT001", lock.id, at(10, 0), at(11, 0), true);

    let result = validate(&store)
        .execute(redeem("FRONT001", other.id, at(10, 30)))
        .await;

    assert!(
        matches!(result, Err(AccessServiceError::WrongLock)),
        "expected WrongLock, got {result:?}"
    );
    assert_eq!(store.tokens()[0].uses, 0);
    assert!(store.lock_state(other.id).locked);
}

#[tokio::test]
async fn should_let_exactly_one_concurrent_redemption_win() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("RACE0001", lock.id, at(10, 0), at(11, 0), true);
    let usecase = validate(&store);

    let results = join_all(
        (0..4).map(|_| usecase.execute(redeem("RACE0001", lock.id, at(10, 30)))),
    )
    .await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AccessServiceError::Expired))
    );
    assert_eq!(store.tokens()[0].uses, 1);
}

#[tokio::test]
async fn should_record_one_attempt_per_redemption() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("ONCE0001", lock.id, at(10, 0), at(11, 0), true);
    let usecase = validate(&store);
    let guest = UserId(55);

    usecase
        .execute(ValidateTokenInput {
            code: "ONCE0001".to_owned(),
            lock_id: lock.id,
            actor_id: Some(guest),
            now: at(10, 30),
        })
        .await
        .unwrap();
    let _ = usecase.execute(redeem("ONCE0001", lock.id, at(10, 31))).await;
    let _ = usecase.execute(redeem("MISSING0", lock.id, at(10, 32))).await;

    let attempts = store.attempts();
    assert_eq!(attempts.len(), 3);
    assert!(attempts[0].success);
    assert_eq!(attempts[0].reason, ATTEMPT_GRANTED);
    assert_eq!(attempts[0].user_id, Some(guest));
    assert!(!attempts[1].success);
    assert_eq!(attempts[1].reason, "token expired");
    assert_eq!(attempts[1].user_id, None);
    assert!(!attempts[2].success);
    assert_eq!(attempts[2].reason, "token not found");
}

// ── PurgeExpiredTokens ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_purge_only_tokens_past_their_end() {
    let store = MemoryStore::new();
    let (_, _, lock) = store.owner_with_lock();
    store.add_token("OLD00001", lock.id, at(8, 0), at(9, 0), true);
    store.add_token("EDGE0001", lock.id, at(9, 0), at(10, 0), true);
    store.add_token("LIVE0001", lock.id, at(10, 0), at(11, 0), true);

    let removed = PurgeExpiredTokensUseCase {
        tokens: store.clone(),
    }
    .execute(at(10, 0))
    .await
    .unwrap();

    assert_eq!(removed, 1);
    let codes: Vec<String> = store.tokens().into_iter().map(|t| t.code).collect();
    assert_eq!(codes, vec!["EDGE0001".to_owned(), "LIVE0001".to_owned()]);
}

// ── ListOwnerTokens ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_tokens_across_all_owned_locks() {
    let store = MemoryStore::new();
    let (owner, property, front) = store.owner_with_lock();
    let back = store.add_lock(property.id);
    store.add_token("111111", front.id, at(10, 0), at(12, 0), true);
    store.add_token("222222", back.id, at(10, 0), at(12, 0), false);

    let other_owner = store.add_user("oscar", UserRole::Owner);
    let other_property = store.add_property(other_owner.id);
    let other_lock = store.add_lock(other_property.id);
    store.add_token("333333", other_lock.id, at(10, 0), at(12, 0), true);

    let mut codes: Vec<_> = ListOwnerTokensUseCase {
        users: store.clone(),
        properties: store.clone(),
        locks: store.clone(),
        tokens: store.clone(),
    }
    .execute(owner.id)
    .await
    .unwrap()
    .into_iter()
    .map(|t| t.code)
    .collect();
    codes.sort();

    assert_eq!(codes, vec!["111111", "222222"]);
}
