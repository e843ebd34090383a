use super::*;
use crate::interfaces::document_store::DocumentStore;
use crate::interfaces::identity::{AuthError, IdentityProvider};
use crate::model::{InstallerStatus, NOTIFICATIONS};
use crate::test_utils::TestHarness;

fn request(name: &str, email: &str, role: Role) -> SignupRequest {
    SignupRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        role,
    }
}

#[test]
fn test_email_shape() {
    assert!(is_valid_email("ann.b+x@example.co"));
    assert!(!is_valid_email("ann@example"));
    assert!(!is_valid_email("not an email"));
    assert!(!is_valid_email(""));
}

#[tokio::test]
async fn test_signup_without_referral() {
    let harness = TestHarness::new();
    let accounts = AccountService::new(harness.ctx.clone());

    let outcome = accounts
        .signup(&request("Nia", "nia@example.com", Role::Dealer), None)
        .await
        .unwrap();
    let uid = outcome.user.uid.clone();

    let stored = harness.user(&uid).await.unwrap();
    assert_eq!(stored.role, Role::Dealer);
    assert!(stored.referral_id.starts_with("ref-"));
    assert!(stored.referrals.is_empty());
    assert_eq!(stored.total_earnings, Some(rust_decimal::Decimal::ZERO));

    let notes = harness.notifications_for(&uid).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].doc.kind, NotificationKind::Info);
    assert_eq!(
        notes[0].doc.message,
        "Welcome to DXD Dealer-Installer Manager, Nia! Thank you for joining us and being a part of our growing network."
    );
    assert!(harness.rewards_for(&uid).await.is_empty());
}

#[tokio::test]
async fn test_installer_starts_pending() {
    let harness = TestHarness::new();
    let accounts = AccountService::new(harness.ctx.clone());
    let outcome = accounts
        .signup(&request("Ivo", "ivo@example.com", Role::Installer), None)
        .await
        .unwrap();
    assert_eq!(outcome.user.status, Some(InstallerStatus::Pending));
}

#[tokio::test]
async fn test_signup_with_referral_links_and_rewards() {
    let harness = TestHarness::new();
    harness.seed_user("u1", "Ann", Role::Dealer, "ref-A").await;
    let accounts = AccountService::new(harness.ctx.clone());

    let mut field = ReferralCodeField::new();
    field.input(&accounts, "ref-A").await;
    assert_eq!(field.details().unwrap().uid, "u1");
    assert!(field.error_message().is_none());

    let outcome = accounts
        .signup(&request("Nia", "nia@example.com", Role::Dealer), field.details())
        .await
        .unwrap();
    let nid = outcome.user.uid.clone();

    let referrer = harness.user("u1").await.unwrap();
    assert_eq!(referrer.referrals, vec![nid.clone()]);

    let referrer_notes = harness.notifications_for("u1").await;
    assert_eq!(referrer_notes.len(), 1);
    assert_eq!(referrer_notes[0].doc.message, "Nia has joined using your referral code.");

    let referrer_rewards = harness.rewards_for("u1").await;
    assert_eq!(referrer_rewards.len(), 1);
    assert_eq!(referrer_rewards[0].doc.status, RewardStatus::Unclaimed);
    assert_eq!(referrer_rewards[0].doc.kind, "Referral");
    assert!(referrer_rewards[0].doc.coupon_number.starts_with("CPN-"));
    assert_eq!(referrer_rewards[0].doc.coupon_number.len(), 10);

    let new_rewards = harness.rewards_for(&nid).await;
    assert_eq!(new_rewards.len(), 1);
    assert!(new_rewards[0].doc.message.contains("Silver-level commission"));

    let welcome = harness.notifications_for(&nid).await;
    assert_eq!(welcome.len(), 1);
    assert_eq!(welcome[0].doc.kind, NotificationKind::Info);
}

#[tokio::test]
async fn test_invalid_referral_code() {
    let harness = TestHarness::new();
    harness.seed_user("u1", "Ann", Role::Dealer, "ref-A").await;
    let accounts = AccountService::new(harness.ctx.clone());

    let mut field = ReferralCodeField::new();
    field.input(&accounts, "ref-B").await;
    assert!(field.details().is_none());
    assert_eq!(
        field.error_message(),
        Some("Invalid referral code. Please check and try again.")
    );

    accounts
        .signup(&request("Nia", "nia@example.com", Role::Dealer), field.details())
        .await
        .unwrap();
    assert!(harness.user("u1").await.unwrap().referrals.is_empty());
    assert!(harness.notifications_for("u1").await.is_empty());
    assert!(harness.rewards_for("u1").await.is_empty());
    assert_eq!(harness.store.count(REWARDS).await, 0);
}

#[tokio::test]
async fn test_referral_field_keeps_last_lookup_and_resets_on_input() {
    let harness = TestHarness::new();
    harness.seed_user("u1", "Ann", Role::Dealer, "ref-A").await;
    let accounts = AccountService::new(harness.ctx.clone());

    let mut field = ReferralCodeField::new();
    field.input(&accounts, "ref-A").await;
    // The referrer disappears after validation; the stored lookup still counts.
    harness.store.delete(USERS, "u1").await.unwrap();
    assert!(field.details().is_some());

    field.input(&accounts, "").await;
    assert!(field.details().is_none());
    assert!(field.error_message().is_none());

    harness.store.set_unavailable(true).await;
    field.input(&accounts, "ref-A").await;
    assert_eq!(
        field.error_message(),
        Some("Failed to validate referral code. Please try again.")
    );
}

#[tokio::test]
async fn test_duplicate_email_and_weak_password() {
    let harness = TestHarness::new();
    let accounts = AccountService::new(harness.ctx.clone());
    accounts
        .signup(&request("Nia", "nia@example.com", Role::Dealer), None)
        .await
        .unwrap();

    let err = accounts
        .signup(&request("Nia2", "nia@example.com", Role::Dealer), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Auth(AuthError::EmailInUse(_))));
    assert_eq!(
        err.user_message(),
        "This email is already in use. Please try logging in or use a different email."
    );

    let mut weak = request("Bo", "bo@example.com", Role::Dealer);
    weak.password = "123".to_string();
    assert!(matches!(
        accounts.signup(&weak, None).await,
        Err(WorkflowError::Validation(ValidationError::WeakPassword { min: 6 }))
    ));
    assert_eq!(harness.identity.account_count().await, 1);
}

#[tokio::test]
async fn test_failed_signup_is_compensated() {
    let harness = TestHarness::new();
    harness.seed_user("u1", "Ann", Role::Dealer, "ref-A").await;
    harness.store.set_fail_writes(REWARDS, true).await;
    let accounts = AccountService::new(harness.ctx.clone());
    let referrer = accounts.validate_referral_code("ref-A").await.unwrap();

    let result = accounts
        .signup(&request("Nia", "nia@example.com", Role::Dealer), Some(&referrer))
        .await;
    assert!(result.is_err());

    assert_eq!(harness.identity.account_count().await, 0);
    assert_eq!(harness.store.count(USERS).await, 1);
    assert!(harness.user("u1").await.unwrap().referrals.is_empty());
    assert_eq!(harness.store.count(NOTIFICATIONS).await, 0);
}

#[tokio::test]
async fn test_login_checks_role() {
    let harness = TestHarness::new();
    let accounts = AccountService::new(harness.ctx.clone());
    let signed_up = accounts
        .signup(&request("Nia", "nia@example.com", Role::Dealer), None)
        .await
        .unwrap();

    let outcome = accounts
        .login(&LoginRequest {
            email: "nia@example.com".to_string(),
            password: "secret1".to_string(),
            role: Role::Dealer,
        })
        .await
        .unwrap();
    assert_eq!(outcome.session.user_id.as_deref(), Some(signed_up.user.uid.as_str()));
    assert_eq!(outcome.landing, Route::DealerDashboard);
    assert_eq!(
        accounts.resolve_session().await.unwrap().role,
        Some(Role::Dealer)
    );

    accounts.logout().await.unwrap();
    assert_eq!(accounts.resolve_session().await.unwrap(), Session::anonymous());

    let err = accounts
        .login(&LoginRequest {
            email: "nia@example.com".to_string(),
            password: "secret1".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "The role you selected does not match your credentials."
    );
    assert!(harness.identity.current_session().await.is_none());
}

#[tokio::test]
async fn test_login_rejects_bad_email_and_missing_profile() {
    let harness = TestHarness::new();
    let accounts = AccountService::new(harness.ctx.clone());

    let err = accounts
        .login(&LoginRequest {
            email: "nope".to_string(),
            password: "secret1".to_string(),
            role: Role::Dealer,
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Please enter a valid email.");

    harness
        .identity
        .create_account("ghost@example.com", "secret1")
        .await
        .unwrap();
    let err = accounts
        .login(&LoginRequest {
            email: "ghost@example.com".to_string(),
            password: "secret1".to_string(),
            role: Role::Dealer,
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "No user data found. Please contact support.");

    let session = accounts.resolve_session().await.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.role, None);
}
