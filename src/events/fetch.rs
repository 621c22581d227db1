use crate::events::model::{EventRecord, RawEvent};
use anyhow::{Context, Result};
use futures::future::{abortable, AbortHandle, Abortable};
use reqwest::Client;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::info;

const TOWN_HALLS_URL: &str = "https://townhall-project.firebaseio.com/townHalls.json";

/// Fetch the remote town-hall collection and produce the ordered event list:
/// nationwide campaign events, ascending by start time.
///
/// Network and parse failures propagate to the caller; there is no retry and
/// no partial result.
pub async fn fetch_events(client: &Client) -> Result<Vec<EventRecord>> {
    fetch_events_from(client, TOWN_HALLS_URL).await
}

/// Same as [`fetch_events`] with an explicit endpoint, for tests and mirrors.
pub async fn fetch_events_from(client: &Client, url: &str) -> Result<Vec<EventRecord>> {
    info!("Fetching events from {url}");
    let entries = client
        .get(url)
        .send()
        .await
        .context("event request failed")?
        .error_for_status()
        .context("event request rejected")?
        .json::<BTreeMap<String, RawEvent>>()
        .await
        .context("event response did not parse")?;

    let events = prepare(entries);
    info!("Loaded {} events", events.len());
    Ok(events)
}

/// Fetch wrapped in an abort handle so the owner can retract an in-flight
/// request on teardown instead of leaving the continuation pending.
pub fn abortable_fetch(
    client: &Client,
) -> (
    Abortable<impl Future<Output = Result<Vec<EventRecord>>>>,
    AbortHandle,
) {
    let client = client.clone();
    abortable(async move { fetch_events(&client).await })
}

/// Convert, filter, and order the raw keyed collection.
pub fn prepare(entries: BTreeMap<String, RawEvent>) -> Vec<EventRecord> {
    let mut events: Vec<EventRecord> = entries
        .into_iter()
        .map(|(key, raw)| EventRecord::from_raw(&key, raw))
        .filter(|event| event.icon_flag == "campaign" && event.chamber == "nationwide")
        .collect();

    // Stable sort: equal stamps keep collection-key order. Records without
    // a stamp sort first, matching the upstream same-or-after comparison
    // where an unparseable stamp never sorts after anything.
    events.sort_by(|a, b| match (a.starts_at, b.starts_at) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    events
}
