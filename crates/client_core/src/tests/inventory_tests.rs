use super::*;
use async_trait::async_trait;

use crate::error::ApiRequestError;

#[derive(Default)]
struct TestInventoryApi {
    items: Mutex<Vec<MenuItem>>,
    adjustments: Mutex<Vec<(ItemId, i64)>>,
    fail_with: Option<(u16, String)>,
    list_failure: Mutex<Option<(u16, String)>>,
}

impl TestInventoryApi {
    fn with_items(items: Vec<MenuItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }
}

#[async_trait]
impl InventoryApi for TestInventoryApi {
    async fn list_menu_items(&self) -> ApiResult<Vec<MenuItem>> {
        if let Some((status, body)) = self.list_failure.lock().await.clone() {
            return Err(ApiRequestError::Status { status, body });
        }
        Ok(self.items.lock().await.clone())
    }

    async fn adjust_stock(&self, item_id: ItemId, delta: i64) -> ApiResult<()> {
        self.adjustments.lock().await.push((item_id, delta));
        if let Some((status, body)) = &self.fail_with {
            return Err(ApiRequestError::Status {
                status: *status,
                body: body.clone(),
            });
        }
        if let Some(item) = self
            .items
            .lock()
            .await
            .iter_mut()
            .find(|item| item.id == item_id)
        {
            item.available_count += delta;
        }
        Ok(())
    }
}

fn item(id: i64, category: &str, flavor: &str, available_count: i64) -> MenuItem {
    MenuItem {
        id: ItemId(id),
        name: format!("{flavor} {category}"),
        description: String::new(),
        price: 120.0,
        category: category.to_string(),
        flavor: flavor.to_string(),
        available_count,
    }
}

async fn loaded_view(api: Arc<TestInventoryApi>) -> InventoryView {
    let view = InventoryView::new(api);
    view.reload().await.expect("initial reload");
    view
}

#[tokio::test]
async fn adjustment_is_confirmed_by_reload() {
    let api = Arc::new(TestInventoryApi::with_items(vec![item(
        1, "Cone", "Vanilla", 10,
    )]));
    let view = loaded_view(api.clone()).await;
    let mut events = view.subscribe_events();

    let outcome = view.adjust_stock(ItemId(1), 5).await.expect("adjust");

    assert_eq!(outcome.available_count, Some(15));
    assert_eq!(
        events.recv().await.expect("event"),
        AdminEvent::StockAdjusted {
            item_id: ItemId(1),
            delta: 5,
        }
    );
    assert_eq!(
        events.recv().await.expect("event"),
        AdminEvent::MenuItemsLoaded { count: 1 }
    );
}

#[tokio::test]
async fn failed_reconcile_keeps_accepted_adjustment() {
    let api = Arc::new(TestInventoryApi::with_items(vec![item(
        1, "Cone", "Vanilla", 10,
    )]));
    let view = loaded_view(api.clone()).await;
    *api.list_failure.lock().await = Some((502, "bad gateway".to_string()));
    let mut events = view.subscribe_events();

    let outcome = view.adjust_stock(ItemId(1), -3).await.expect("adjust");

    match &outcome.reconciled {
        Err(error) => assert_eq!(error.status_code(), Some(502)),
        other => panic!("unexpected reconcile result: {other:?}"),
    }
    assert_eq!(outcome.available_count, Some(7));
    assert_eq!(*api.adjustments.lock().await, vec![(ItemId(1), -3)]);
    assert_eq!(api.items.lock().await[0].available_count, 7);
    assert_eq!(
        events.recv().await.expect("event"),
        AdminEvent::StockAdjusted {
            item_id: ItemId(1),
            delta: -3,
        }
    );
    assert_eq!(
        events.recv().await.expect("event"),
        AdminEvent::Error("Failed to load items: HTTP 502: bad gateway".to_string())
    );

    *api.list_failure.lock().await = None;
    assert_eq!(
        view.reload().await.expect("reload"),
        LoadOutcome::Applied { records: 1 }
    );
    assert_eq!(
        view.snapshot()
            .await
            .find(ItemId(1))
            .map(|item| item.available_count),
        Some(7)
    );
}

#[tokio::test]
async fn adjustment_below_zero_is_rejected_before_any_request() {
    let api = Arc::new(TestInventoryApi::with_items(vec![item(
        1, "Cup", "Mint", 2,
    )]));
    let view = loaded_view(api.clone()).await;

    let err = view.adjust_stock(ItemId(1), -3).await.unwrap_err();

    assert!(matches!(
        err,
        ApiRequestError::Validation(DomainError::NegativeStock { resulting: -1, .. })
    ));
    assert!(api.adjustments.lock().await.is_empty());
}

#[tokio::test]
async fn zero_delta_and_unknown_items_are_rejected() {
    let api = Arc::new(TestInventoryApi::with_items(vec![item(
        1, "Cup", "Mint", 2,
    )]));
    let view = loaded_view(api.clone()).await;

    assert!(matches!(
        view.adjust_stock(ItemId(1), 0).await.unwrap_err(),
        ApiRequestError::Validation(DomainError::ZeroStockDelta)
    ));
    assert!(matches!(
        view.adjust_stock(ItemId(8), 1).await.unwrap_err(),
        ApiRequestError::Validation(DomainError::UnknownItem(8))
    ));
    assert!(api.adjustments.lock().await.is_empty());
}

#[tokio::test]
async fn rejected_adjustment_reports_update_failure() {
    let api = Arc::new(TestInventoryApi {
        fail_with: Some((409, "stock locked".to_string())),
        ..TestInventoryApi::with_items(vec![item(1, "Stick", "Chocolate", 4)])
    });
    let view = loaded_view(api.clone()).await;
    let mut events = view.subscribe_events();

    let err = view.adjust_stock(ItemId(1), 1).await.unwrap_err();

    assert_eq!(err.status_code(), Some(409));
    assert_eq!(
        events.recv().await.expect("event"),
        AdminEvent::Error("Update failed: HTTP 409: stock locked".to_string())
    );
    assert_eq!(
        view.snapshot()
            .await
            .find(ItemId(1))
            .map(|item| item.available_count),
        Some(4)
    );
}

#[tokio::test]
async fn availability_is_relative_to_highest_stock() {
    let api = Arc::new(TestInventoryApi::with_items(vec![
        item(1, "Cone", "Vanilla", 40),
        item(2, "Cup", "Chocolate", 10),
        item(3, "Sundae", "Strawberry", 0),
    ]));
    let view = loaded_view(api).await;
    let state = view.snapshot().await;

    let percents: Vec<_> = state
        .items
        .iter()
        .map(|item| state.availability(item))
        .collect();
    assert_eq!(percents, vec![100, 25, 0]);
}

#[tokio::test]
async fn highest_count_never_drops_below_one() {
    let api = Arc::new(TestInventoryApi::with_items(vec![item(
        1, "Cone", "Vanilla", 0,
    )]));
    let view = loaded_view(api).await;
    let state = view.snapshot().await;

    assert_eq!(state.highest_count(), 1);
    assert_eq!(state.availability(&state.items[0]), 0);
}

#[tokio::test]
async fn filters_narrow_and_clear_visible_items() {
    let api = Arc::new(TestInventoryApi::with_items(vec![
        item(1, "Cone", "Vanilla", 4),
        item(2, "Cone", "Mint", 4),
        item(3, "Cup", "Mint", 4),
    ]));
    let view = loaded_view(api).await;

    view.set_filter(ItemFilter {
        category: Some("cone".to_string()),
        flavor: Some("Mint".to_string()),
    })
    .await;
    let visible: Vec<_> = view
        .snapshot()
        .await
        .visible_items()
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(visible, vec![ItemId(2)]);

    view.clear_filters().await;
    assert_eq!(view.snapshot().await.visible_items().len(), 3);
}

#[tokio::test]
async fn reload_after_teardown_is_discarded() {
    let api = Arc::new(TestInventoryApi::with_items(vec![item(
        1, "Cone", "Vanilla", 4,
    )]));
    let view = InventoryView::new(api);
    view.teardown();

    assert_eq!(view.reload().await.expect("reload"), LoadOutcome::Discarded);
    assert!(view.snapshot().await.items.is_empty());
}
