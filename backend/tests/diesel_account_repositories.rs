//! Integration tests for the Diesel user and password reset repositories
//! against embedded PostgreSQL.

use carlot::domain::ports::{
    PasswordResetRecord, PasswordResetRepository, UserRepository, UserRepositoryError,
};
use carlot::domain::{DisplayName, EmailAddress, UserAccount, UserId};
use carlot::outbound::persistence::{DieselPasswordResetRepository, DieselUserRepository};
use chrono::Duration;
use rstest::{fixture, rstest};

mod support;

use support::{Database, account, handle_cluster_setup_failure, now_micros, setup_database};

struct TestContext {
    database: Database,
    users: DieselUserRepository,
    resets: DieselPasswordResetRepository,
}

impl TestContext {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.database.runtime.block_on(future)
    }
}

fn setup_context() -> Result<TestContext, String> {
    let database = setup_database()?;
    Ok(TestContext {
        users: DieselUserRepository::new(database.pool.clone()),
        resets: DieselPasswordResetRepository::new(database.pool.clone()),
        database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn credentials_are_found_by_normalised_email(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: credentials_are_found_by_normalised_email skipped");
        return;
    };
    let stored = account("Neha Kapoor");
    context
        .block_on(context.users.insert(&stored, "$argon2id$neha"))
        .expect("account inserted");

    let shouted = EmailAddress::new(stored.email().as_ref().to_uppercase()).expect("valid email");
    let credentials = context
        .block_on(context.users.find_credentials(&shouted))
        .expect("lookup succeeds")
        .expect("account found");
    assert_eq!(&credentials.account, &stored);
    assert_eq!(credentials.password_hash, "$argon2id$neha");
}

#[rstest]
fn a_taken_email_is_a_duplicate(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: a_taken_email_is_a_duplicate skipped");
        return;
    };
    let first = account("Neha Kapoor");
    context
        .block_on(context.users.insert(&first, "$argon2id$first"))
        .expect("first account inserted");

    let second = UserAccount::new(
        UserId::random(),
        DisplayName::new("Another Neha").expect("valid display name"),
        first.email().clone(),
        now_micros(),
    );
    let err = context
        .block_on(context.users.insert(&second, "$argon2id$second"))
        .expect_err("duplicate email rejected");
    assert!(
        matches!(err, UserRepositoryError::DuplicateEmail { .. }),
        "unexpected error: {err:?}"
    );
}

#[rstest]
fn reset_grants_are_single_use(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: reset_grants_are_single_use skipped");
        return;
    };
    let owner = account("Neha Kapoor");
    context
        .block_on(context.users.insert(&owner, "$argon2id$neha"))
        .expect("account inserted");
    let now = now_micros();
    let live = PasswordResetRecord {
        token_digest: "a".repeat(64),
        user_id: owner.id().clone(),
        expires_at: now + Duration::minutes(30),
    };
    let expired = PasswordResetRecord {
        token_digest: "b".repeat(64),
        user_id: owner.id().clone(),
        expires_at: now - Duration::minutes(1),
    };
    context.block_on(async {
        context.resets.store(&live).await.expect("live grant stored");
        context
            .resets
            .store(&expired)
            .await
            .expect("expired grant stored");
    });

    let redeemed = context
        .block_on(context.resets.consume(&live.token_digest, now))
        .expect("consume succeeds");
    assert_eq!(redeemed.as_ref(), Some(owner.id()));
    let again = context
        .block_on(context.resets.consume(&live.token_digest, now))
        .expect("consume succeeds");
    assert!(again.is_none(), "a grant redeems once");

    let stale = context
        .block_on(context.resets.consume(&expired.token_digest, now))
        .expect("consume succeeds");
    assert!(stale.is_none(), "expired grants do not redeem");
}
