//! Then steps for audience dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use eyre::eyre;
use rstest_bdd_macros::then;

#[then("the summary reports {sent:usize} sent and {failed:usize} failed out of {total:usize}")]
fn summary_reports(
    world: &DispatchWorld,
    sent: usize,
    failed: usize,
    total: usize,
) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre!("missing dispatch result in scenario world"))?;
    let summary = result
        .as_ref()
        .map_err(|err| eyre!("unexpected dispatch failure: {err}"))?;

    if (summary.sent, summary.failed, summary.total) != (sent, failed, total) {
        return Err(eyre!(
            "expected {sent} sent, {failed} failed of {total}, got {summary:?}"
        ));
    }
    Ok(())
}

#[then(r#"browser "{device}" shows "{title}""#)]
fn browser_shows(world: &DispatchWorld, device: String, title: String) -> Result<(), eyre::Report> {
    let requests = world.requests_for(&device)?;
    let [request] = requests.as_slice() else {
        return Err(eyre!(
            "expected one push message for {device}, found {}",
            requests.len()
        ));
    };
    let payload = world.browser(&device)?.open(&request.body)?;
    if payload.title() != title {
        return Err(eyre!(
            "expected title {title:?}, browser decrypted {:?}",
            payload.title()
        ));
    }
    Ok(())
}

#[then(r#"browser "{device}" received nothing"#)]
fn browser_received_nothing(world: &DispatchWorld, device: String) -> Result<(), eyre::Report> {
    let requests = world.requests_for(&device)?;
    if !requests.is_empty() {
        return Err(eyre!(
            "expected no push messages for {device}, found {}",
            requests.len()
        ));
    }
    Ok(())
}

#[then("the dispatch is rejected as unauthorized")]
fn dispatch_rejected(world: &DispatchWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre!("missing dispatch result in scenario world"))?;
    match result {
        Err(err) if err.is_unauthorized() => Ok(()),
        other => Err(eyre!("expected unauthorized error, got {other:?}")),
    }
}

#[then("no push messages were sent")]
fn no_push_messages(world: &DispatchWorld) -> Result<(), eyre::Report> {
    let requests = world
        .transport
        .requests()
        .map_err(|err| eyre!("read transport log: {err}"))?;
    if !requests.is_empty() {
        return Err(eyre!("expected no push messages, found {}", requests.len()));
    }
    Ok(())
}

fn is_registered(world: &DispatchWorld, device: &str) -> Result<bool, eyre::Report> {
    let endpoint = world.browser(device)?.endpoint().to_owned();
    let registrations = run_async(world.subscriptions.list_all())
        .map_err(|err| eyre!("list registrations: {err}"))?;
    Ok(registrations
        .iter()
        .any(|registration| registration.endpoint().as_str() == endpoint))
}

#[then(r#"browser "{device}" is no longer registered"#)]
fn browser_pruned(world: &DispatchWorld, device: String) -> Result<(), eyre::Report> {
    if is_registered(world, &device)? {
        return Err(eyre!("expected {device} to be pruned"));
    }
    Ok(())
}

#[then(r#"browser "{device}" is still registered"#)]
fn browser_kept(world: &DispatchWorld, device: String) -> Result<(), eyre::Report> {
    if !is_registered(world, &device)? {
        return Err(eyre!("expected {device} to remain registered"));
    }
    Ok(())
}
