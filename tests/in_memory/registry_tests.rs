//! In-memory integration tests for the subscriber registry.

use crate::in_memory::helpers::{Stack, stack};
use crate::test_helpers::SimulatedBrowser;
use feebell::subscription::{
    domain::{SubscriptionDomainError, TenantId, UserId},
    services::{SubscribeRequest, SubscriptionServiceError},
};
use rstest::rstest;

const ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send/d1b2c3";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn browser_json_round_trips_through_registry(stack: Stack) {
    let owner = UserId::new();
    let browser = SimulatedBrowser::new(ENDPOINT);

    let stored = stack
        .subscriptions
        .subscribe(browser.subscribe_request(owner, None))
        .await
        .expect("subscribe should succeed");

    let json = browser.subscription_json();
    assert_eq!(stored.endpoint().as_str(), json.endpoint);
    assert_eq!(stored.client_public_key().to_base64url(), json.keys.p256dh);
    assert_eq!(stored.client_auth_secret().to_base64url(), json.keys.auth);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn key_rotation_replaces_registration_in_place(stack: Stack) {
    let owner = UserId::new();
    let before = stack
        .subscriptions
        .subscribe(SimulatedBrowser::new(ENDPOINT).subscribe_request(owner, None))
        .await
        .expect("first subscribe should succeed");
    let rotated = SimulatedBrowser::new(ENDPOINT);
    let after = stack
        .subscriptions
        .subscribe(rotated.subscribe_request(owner, None))
        .await
        .expect("second subscribe should succeed");

    let listed = stack
        .subscriptions
        .list_all()
        .await
        .expect("listing should succeed");
    assert_eq!(listed, vec![after.clone()]);
    assert_eq!(after.id(), before.id());
    assert_eq!(
        after.client_public_key().to_base64url(),
        rotated.subscription_json().keys.p256dh
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_is_idempotent(stack: Stack) {
    stack
        .subscriptions
        .subscribe(SimulatedBrowser::new(ENDPOINT).subscribe_request(UserId::new(), None))
        .await
        .expect("subscribe should succeed");

    let first = stack
        .subscriptions
        .unsubscribe(ENDPOINT)
        .await
        .expect("unsubscribe should succeed");
    let second = stack
        .subscriptions
        .unsubscribe(ENDPOINT)
        .await
        .expect("repeat unsubscribe should succeed");

    assert!(first);
    assert!(!second);
    assert!(
        stack
            .subscriptions
            .list_all()
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_are_scoped(stack: Stack) {
    let alice = UserId::new();
    let bob = UserId::new();
    let acme = TenantId::new();
    for (n, (owner, tenant)) in [(alice, Some(acme)), (alice, None), (bob, Some(acme))]
        .into_iter()
        .enumerate()
    {
        let browser = SimulatedBrowser::new(format!("https://push.example.net/wpush/v2/{n}"));
        stack
            .subscriptions
            .subscribe(browser.subscribe_request(owner, tenant))
            .await
            .expect("subscribe should succeed");
    }

    let by_alice = stack
        .subscriptions
        .list_by_owner(alice)
        .await
        .expect("listing should succeed");
    let by_acme = stack
        .subscriptions
        .list_by_tenant(acme)
        .await
        .expect("listing should succeed");

    assert_eq!(by_alice.len(), 2);
    assert_eq!(by_acme.len(), 2);
    assert!(by_acme.iter().all(|entry| entry.tenant_id() == Some(acme)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_http_endpoint_is_rejected(stack: Stack) {
    let browser = SimulatedBrowser::new("ftp://push.example.net/wpush/v2/abc");
    let json = browser.subscription_json();

    let result = stack
        .subscriptions
        .subscribe(SubscribeRequest::new(
            UserId::new(),
            json.endpoint,
            json.keys.p256dh,
            json.keys.auth,
        ))
        .await;

    assert!(matches!(
        result,
        Err(SubscriptionServiceError::Domain(
            SubscriptionDomainError::UnsupportedScheme(scheme)
        )) if scheme == "ftp"
    ));
}
