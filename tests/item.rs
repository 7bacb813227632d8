use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use xerpi::api::ImageId;
use xerpi::error::FetchError;
use xerpi::gallery::item::{load_detail, LoadOutcome, PresentationItem};

mod common;
use common::{detail_for, record, MockService};

#[tokio::test]
async fn init_external_data_populates_detail_once() {
    let service = MockService::new();
    let mut item = PresentationItem::new(record(4, 1, 0));
    let token = CancellationToken::new();

    item.init_external_data(&service, &token).await.unwrap();
    assert!(item.is_initialized());
    assert_eq!(item.tags()[0].name, "tag-4");

    item.init_external_data(&service, &token).await.unwrap();
    assert_eq!(service.detail_calls(), 1);
}

#[tokio::test]
async fn cancelled_before_start_leaves_item_untouched() {
    let service = MockService::new();
    let mut item = PresentationItem::new(record(4, 1, 0));
    let token = CancellationToken::new();
    token.cancel();

    let err = item.init_external_data(&service, &token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!item.is_initialized());
    assert!(item.detail().is_none());
    assert_eq!(service.detail_calls(), 0);
}

#[tokio::test]
async fn cancelled_mid_flight_leaves_item_untouched() {
    let service = Arc::new(MockService::new().with_detail_gate());
    let mut item = PresentationItem::new(record(4, 1, 0));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        canceller.cancel();
    });
    let result = item.init_external_data(service.as_ref(), &token).await;

    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(!item.is_initialized());
    assert!(item.tags().is_empty());

    // A late release of the gate changes nothing either.
    service.release_details(1);
    tokio::task::yield_now().await;
    assert!(!item.is_initialized());
}

#[tokio::test]
async fn load_detail_returns_payload() {
    let service = MockService::new();
    let detail = load_detail(&service, ImageId(3), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(detail, detail_for(ImageId(3)));
}

#[test]
fn finish_load_applies_only_the_matching_live_load() {
    let mut item = PresentationItem::new(record(4, 1, 0));
    let first = CancellationToken::new();
    item.begin_load(1, first.clone());
    assert!(item.is_loading());

    let second = CancellationToken::new();
    item.begin_load(2, second);
    assert!(first.is_cancelled());

    let outcome = item.finish_load(1, Ok(detail_for(ImageId(4))));
    assert!(matches!(outcome, LoadOutcome::Stale));
    assert!(!item.is_initialized());

    let outcome = item.finish_load(2, Ok(detail_for(ImageId(4))));
    assert!(matches!(outcome, LoadOutcome::Applied));
    assert!(item.is_initialized());
    assert!(!item.is_loading());
}

#[test]
fn finish_load_discards_cancelled_results() {
    let mut item = PresentationItem::new(record(4, 1, 0));
    let token = CancellationToken::new();
    item.begin_load(7, token.clone());
    token.cancel();
    assert!(!item.is_loading());

    let outcome = item.finish_load(7, Ok(detail_for(ImageId(4))));
    assert!(matches!(outcome, LoadOutcome::Cancelled));
    assert!(!item.is_initialized());
}

#[test]
fn failed_load_leaves_item_retryable() {
    let mut item = PresentationItem::new(record(4, 1, 0));
    item.begin_load(1, CancellationToken::new());
    let outcome = item.finish_load(1, Err(FetchError::Network("timeout".into())));
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert!(!item.is_initialized());
    assert!(!item.is_loading());
}

#[test]
fn dispose_is_idempotent() {
    let mut item = PresentationItem::new(record(4, 1, 0));
    let token = CancellationToken::new();
    item.begin_load(1, token.clone());
    item.dispose();
    item.dispose();
    assert!(token.is_cancelled());
    assert!(!item.is_loading());
}

#[test]
fn dropping_an_item_cancels_its_load() {
    let token = CancellationToken::new();
    {
        let mut item = PresentationItem::new(record(4, 1, 0));
        item.begin_load(1, token.clone());
    }
    assert!(token.is_cancelled());
}
