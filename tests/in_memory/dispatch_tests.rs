//! In-memory integration tests for end-to-end dispatch.

use std::ffi::OsString;

use crate::in_memory::helpers::{Stack, stack};
use crate::test_helpers::{EnvVarGuard, SimulatedBrowser};
use feebell::delivery::{
    adapters::memory::ScriptedReply,
    config::{
        VAPID_PRIVATE_KEY_VAR, VAPID_PUBLIC_KEY_VAR, VAPID_SUBJECT_VAR, VAPID_TOKEN_LIFETIME_VAR,
        VapidConfig,
    },
    crypto::VapidKeyPair,
    domain::{AudienceTarget, CallerAuthority, DispatchRequest, NotificationPayload},
};
use feebell::subscription::domain::{PushEndpoint, TenantId, UserId};
use rstest::rstest;

fn headline(title: &str) -> NotificationPayload {
    NotificationPayload::new(title, "Open the dashboard for details")
        .expect("valid payload")
        .with_tag("ops")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_device_of_an_owner_decrypts_the_same_notification(stack: Stack) {
    let owner = UserId::new();
    let devices = [
        SimulatedBrowser::new("https://fcm.googleapis.com/fcm/send/laptop"),
        SimulatedBrowser::new("https://updates.push.services.mozilla.com/wpush/v2/phone"),
    ];
    for device in &devices {
        stack
            .subscriptions
            .subscribe(device.subscribe_request(owner, None))
            .await
            .expect("subscribe should succeed");
    }

    let summary = stack
        .notifications
        .send(
            owner,
            &DispatchRequest::new(headline("Disk almost full"))
                .with_target(AudienceTarget::Owner(owner)),
        )
        .await
        .expect("dispatch should succeed");

    assert_eq!((summary.sent, summary.failed, summary.total), (2, 0, 2));
    let requests = stack.transport.requests().expect("transport log");
    for device in &devices {
        let request = requests
            .iter()
            .find(|request| request.endpoint.as_str() == device.endpoint())
            .expect("request for device");
        let payload = device.open(&request.body).expect("device should decrypt");
        assert_eq!(payload.title(), "Disk almost full");
        assert_eq!(payload.tag(), Some("ops"));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pruned_devices_are_skipped_next_time(stack: Stack) {
    let caller = UserId::new();
    let tenant = TenantId::new();
    stack
        .directory
        .grant(caller, CallerAuthority::Tenant(tenant))
        .expect("grant should succeed");
    let keep = SimulatedBrowser::new("https://push.example.net/wpush/v2/keep");
    let gone = SimulatedBrowser::new("https://push.example.net/wpush/v2/gone");
    for device in [&keep, &gone] {
        stack
            .subscriptions
            .subscribe(device.subscribe_request(UserId::new(), Some(tenant)))
            .await
            .expect("subscribe should succeed");
    }
    stack
        .transport
        .reply_for(
            &PushEndpoint::new(gone.endpoint()).expect("valid endpoint"),
            ScriptedReply::Status(410),
        )
        .expect("script should be stored");

    let first = stack
        .notifications
        .send(caller, &DispatchRequest::new(headline("First")))
        .await
        .expect("first dispatch should succeed");
    let second = stack
        .notifications
        .send(caller, &DispatchRequest::new(headline("Second")))
        .await
        .expect("second dispatch should succeed");

    assert_eq!((first.sent, first.failed, first.pruned), (1, 1, 1));
    assert_eq!((second.sent, second.failed, second.total), (1, 0, 1));
    assert_eq!(stack.transport.requests().expect("transport log").len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn signer_loaded_from_environment_identifies_the_server() {
    let keys = VapidKeyPair::generate();
    let public_key = keys.public_key_base64url().to_owned();
    let config = {
        let _guard = EnvVarGuard::set_many(&[
            (
                OsString::from(VAPID_PUBLIC_KEY_VAR),
                Some(OsString::from(&public_key)),
            ),
            (
                OsString::from(VAPID_PRIVATE_KEY_VAR),
                Some(OsString::from(keys.private_key_base64url())),
            ),
            (
                OsString::from(VAPID_SUBJECT_VAR),
                Some(OsString::from("https://example.com/contact")),
            ),
            (OsString::from(VAPID_TOKEN_LIFETIME_VAR), None),
        ]);
        VapidConfig::from_env().expect("environment should configure VAPID")
    };
    let stack = Stack::with_signer(config.into_signer().expect("valid signer"));
    let owner = UserId::new();
    let device = SimulatedBrowser::new("https://push.example.net/wpush/v2/env");
    stack
        .subscriptions
        .subscribe(device.subscribe_request(owner, None))
        .await
        .expect("subscribe should succeed");

    stack
        .notifications
        .send(
            owner,
            &DispatchRequest::new(headline("Configured"))
                .with_target(AudienceTarget::Owner(owner)),
        )
        .await
        .expect("dispatch should succeed");

    assert_eq!(stack.notifications.application_server_key(), public_key);
    let requests = stack.transport.requests().expect("transport log");
    let [request] = requests.as_slice() else {
        panic!("exactly one request expected");
    };
    assert!(
        request
            .vapid
            .authorization()
            .ends_with(&format!(", k={public_key}"))
    );
}
