use super::*;

fn item(available_count: i64) -> MenuItem {
    MenuItem {
        id: ItemId(4),
        name: "Double Scoop".to_string(),
        description: "Two scoops in a waffle cone".to_string(),
        price: 250.0,
        category: "Cone".to_string(),
        flavor: "Vanilla".to_string(),
        available_count,
    }
}

#[test]
fn canonicalizes_status_typos_and_casing() {
    assert_eq!(OrderStatus::canonicalize("canceled"), OrderStatus::Cancelled);
    assert_eq!(OrderStatus::canonicalize("cancled"), OrderStatus::Cancelled);
    assert_eq!(OrderStatus::canonicalize("Cancelled"), OrderStatus::Cancelled);
    assert_eq!(OrderStatus::canonicalize("  PENDING "), OrderStatus::Pending);
    assert_eq!(OrderStatus::canonicalize("Done"), OrderStatus::Done);
    assert_eq!(OrderStatus::canonicalize("shipped"), OrderStatus::Unknown);
    assert_eq!(OrderStatus::canonicalize(""), OrderStatus::Unknown);
}

#[test]
fn status_labels_are_title_cased() {
    assert_eq!(OrderStatus::canonicalize("pending").label(), "Pending");
    assert_eq!(OrderStatus::canonicalize("CANCELED").label(), "Cancelled");
    assert_eq!(OrderStatus::Unknown.label(), "Unknown");
}

#[test]
fn status_deserializes_through_canonicalization() {
    let status: OrderStatus = serde_json::from_str("\"Canceled\"").expect("status");
    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(
        serde_json::to_string(&OrderStatus::Done).expect("json"),
        "\"done\""
    );
}

#[test]
fn transition_to_current_status_is_skipped() {
    for status in OrderStatus::MUTATION_TARGETS {
        assert_eq!(
            plan_transition(status, status).expect("plan"),
            TransitionPlan::Skip
        );
    }
}

#[test]
fn cancellation_uses_dedicated_plan() {
    assert_eq!(
        plan_transition(OrderStatus::Pending, OrderStatus::Cancelled).expect("plan"),
        TransitionPlan::Cancel
    );
    assert_eq!(
        plan_transition(OrderStatus::Unknown, OrderStatus::Done).expect("plan"),
        TransitionPlan::UpdateStatus(OrderStatus::Done)
    );
}

#[test]
fn unknown_is_never_a_transition_target() {
    let err = plan_transition(OrderStatus::Pending, OrderStatus::Unknown).unwrap_err();
    assert_eq!(
        err,
        DomainError::InvalidTransitionTarget("unknown".to_string())
    );
}

#[test]
fn current_status_button_is_disabled() {
    let buttons = transition_buttons(OrderStatus::Done);
    let labels: Vec<_> = buttons.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Mark Pending", "Mark Done", "Mark Cancelled"]);
    assert!(buttons[0].enabled);
    assert!(!buttons[1].enabled && buttons[1].primary);
    assert!(buttons[2].enabled);
}

#[test]
fn stock_adjustment_cannot_go_negative() {
    assert_eq!(item(10).stock_after(-3), Ok(7));
    assert_eq!(item(2).stock_after(-2), Ok(0));
    assert_eq!(
        item(2).stock_after(-3),
        Err(DomainError::NegativeStock {
            item_id: 4,
            delta: -3,
            resulting: -1
        })
    );
    assert_eq!(item(2).stock_after(0), Err(DomainError::ZeroStockDelta));
}

#[test]
fn item_filters_combine() {
    let mut cup = item(3);
    cup.category = "Cup".to_string();
    cup.flavor = "Mint".to_string();

    let filter = ItemFilter {
        category: Some("cup".to_string()),
        flavor: None,
    };
    assert!(filter.matches(&cup));
    assert!(!filter.matches(&item(3)));

    let filter = ItemFilter {
        category: Some("Cup".to_string()),
        flavor: Some("Vanilla".to_string()),
    };
    assert!(!filter.matches(&cup));
    assert!(ItemFilter::default().matches(&cup));
}

#[test]
fn availability_is_relative_to_highest_count() {
    assert_eq!(availability_percent(5, 10), 50);
    assert_eq!(availability_percent(0, 0), 0);
    assert_eq!(availability_percent(1, 3), 33);
    assert_eq!(availability_percent(10, 10), 100);
}

#[test]
fn order_lines_flag_inconsistent_amounts() {
    let line = OrderLine {
        name: "Sundae".to_string(),
        qty: 2,
        price: 120.0,
        amount: 240.0,
        code: Some(7),
    };
    assert!(line.is_amount_consistent());
    let off = OrderLine {
        amount: 200.0,
        ..line
    };
    assert!(!off.is_amount_consistent());
}
