//! Registry semantics against `PostgreSQL`.

use std::sync::Arc;

use crate::postgres::helpers::{PgContext, pg_context};
use crate::test_helpers::SimulatedBrowser;
use feebell::subscription::{
    domain::{TenantId, UserId},
    ports::SubscriptionRepository,
};
use rstest::rstest;
use tokio::task::JoinSet;

const ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send/pg-device";

#[rstest]
fn upsert_overwrites_keys_and_keeps_identity(pg_context: PgContext) {
    let PgContext {
        service, runtime, ..
    } = &pg_context;
    let owner = UserId::new();
    let first = runtime
        .block_on(service.subscribe(SimulatedBrowser::new(ENDPOINT).subscribe_request(owner, None)))
        .expect("first subscribe should succeed");
    let rotated = SimulatedBrowser::new(ENDPOINT);
    let second = runtime
        .block_on(
            service.subscribe(
                rotated
                    .subscribe_request(owner, None)
                    .with_user_agent("Mozilla/5.0 (X11; Linux x86_64) Firefox/131.0"),
            ),
        )
        .expect("second subscribe should succeed");

    assert_eq!(second.id(), first.id());
    assert_eq!(second.created_at(), first.created_at());
    assert_eq!(
        second.client_public_key().to_base64url(),
        rotated.subscription_json().keys.p256dh
    );
    assert!(second.user_agent().is_some());
    let all = runtime
        .block_on(service.list_all())
        .expect("listing should succeed");
    assert_eq!(all, vec![second]);
}

#[rstest]
fn concurrent_upserts_of_one_endpoint_leave_one_row(pg_context: PgContext) {
    let owner = UserId::new();
    let browsers: Vec<SimulatedBrowser> = (0..16).map(|_| SimulatedBrowser::new(ENDPOINT)).collect();
    let service = Arc::new(pg_context.service);

    let ids = pg_context.runtime.block_on(async {
        let mut tasks = JoinSet::new();
        for browser in &browsers {
            let shared = Arc::clone(&service);
            let request = browser.subscribe_request(owner, None);
            tasks.spawn(async move { shared.subscribe(request).await });
        }
        let mut ids = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let stored = joined
                .expect("task should not panic")
                .expect("subscribe should succeed");
            ids.push(stored.id());
        }
        ids
    });

    let listed = pg_context
        .runtime
        .block_on(service.list_by_owner(owner))
        .expect("listing should succeed");
    let [only] = listed.as_slice() else {
        panic!("exactly one row expected, got {}", listed.len());
    };
    assert_eq!(ids.len(), browsers.len());
    assert!(ids.iter().all(|id| *id == only.id()));
    assert!(
        browsers
            .iter()
            .any(|browser| browser.subscription_json().keys.p256dh
                == only.client_public_key().to_base64url())
    );
}

#[rstest]
fn guarded_removal_spares_a_newer_registration(pg_context: PgContext) {
    let PgContext {
        service,
        repository,
        runtime,
        ..
    } = &pg_context;
    let owner = UserId::new();
    let seen = runtime
        .block_on(service.subscribe(SimulatedBrowser::new(ENDPOINT).subscribe_request(owner, None)))
        .expect("subscribe should succeed");
    let seen = runtime
        .block_on(service.list_by_owner(owner))
        .expect("listing should succeed")
        .into_iter()
        .find(|registration| registration.id() == seen.id())
        .expect("stored registration");
    std::thread::sleep(std::time::Duration::from_millis(2));
    runtime
        .block_on(service.subscribe(SimulatedBrowser::new(ENDPOINT).subscribe_request(owner, None)))
        .expect("re-subscribe should succeed");

    let stale = runtime
        .block_on(repository.remove_if_unchanged(seen.endpoint(), seen.updated_at()))
        .expect("removal should succeed");
    let current = runtime
        .block_on(service.list_by_owner(owner))
        .expect("listing should succeed");
    let [latest] = current.as_slice() else {
        panic!("the newer registration should remain, got {}", current.len());
    };
    let removed = runtime
        .block_on(repository.remove_if_unchanged(latest.endpoint(), latest.updated_at()))
        .expect("removal should succeed");

    assert!(!stale);
    assert!(removed);
    assert!(
        runtime
            .block_on(service.list_all())
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
fn resubscribing_moves_ownership(pg_context: PgContext) {
    let PgContext {
        service, runtime, ..
    } = &pg_context;
    let previous = UserId::new();
    let current = UserId::new();
    let browser = SimulatedBrowser::new(ENDPOINT);
    for owner in [previous, current] {
        runtime
            .block_on(service.subscribe(browser.subscribe_request(owner, None)))
            .expect("subscribe should succeed");
    }

    let by_previous = runtime
        .block_on(service.list_by_owner(previous))
        .expect("listing should succeed");
    let by_current = runtime
        .block_on(service.list_by_owner(current))
        .expect("listing should succeed");

    assert!(by_previous.is_empty());
    assert_eq!(by_current.len(), 1);
}

#[rstest]
fn unsubscribe_reports_whether_anything_was_removed(pg_context: PgContext) {
    let PgContext {
        service, runtime, ..
    } = &pg_context;
    runtime
        .block_on(
            service.subscribe(SimulatedBrowser::new(ENDPOINT).subscribe_request(UserId::new(), None)),
        )
        .expect("subscribe should succeed");

    let removed = runtime
        .block_on(service.unsubscribe(ENDPOINT))
        .expect("unsubscribe should succeed");
    let removed_again = runtime
        .block_on(service.unsubscribe(ENDPOINT))
        .expect("repeat unsubscribe should succeed");

    assert!(removed);
    assert!(!removed_again);
}

#[rstest]
fn tenant_listing_excludes_other_tenants(pg_context: PgContext) {
    let PgContext {
        service, runtime, ..
    } = &pg_context;
    let acme = TenantId::new();
    let globex = TenantId::new();
    for (n, tenant) in [Some(acme), Some(acme), Some(globex), None]
        .into_iter()
        .enumerate()
    {
        let browser = SimulatedBrowser::new(format!("https://push.example.net/wpush/v2/pg-{n}"));
        runtime
            .block_on(service.subscribe(browser.subscribe_request(UserId::new(), tenant)))
            .expect("subscribe should succeed");
    }

    let by_acme = runtime
        .block_on(service.list_by_tenant(acme))
        .expect("listing should succeed");
    let all = runtime
        .block_on(service.list_all())
        .expect("listing should succeed");

    assert_eq!(by_acme.len(), 2);
    assert!(by_acme.iter().all(|entry| entry.tenant_id() == Some(acme)));
    assert_eq!(all.len(), 4);
}
