use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AdminClient, AdminEvent, AnalyticsView, InventoryView, LoadOutcome, OrderLifecycle,
    OverviewQuery, TransitionOutcome,
};
use shared::{
    domain::{ItemFilter, ItemId, OrderId, OrderStatus, MENU_CATEGORIES, MENU_FLAVORS},
    protocol::{FacialLogFilter, DEFAULT_LOG_LIMIT, DEFAULT_STATS_DAYS, DEFAULT_TOP_K},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::feedback::FailureContext;

mod config;
mod feedback;
mod render;

#[derive(Parser, Debug)]
#[command(name = "scoop-admin", about = "Inventory, order and insight console for the shop API")]
struct Args {
    /// Settings file; defaults to ./scoop-admin.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_base: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Items(ItemsCommand),
    #[command(subcommand)]
    Orders(OrdersCommand),
    #[command(subcommand)]
    Analytics(AnalyticsCommand),
}

#[derive(Subcommand, Debug)]
enum ItemsCommand {
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        flavor: Option<String>,
    },
    Adjust {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Show {
        id: String,
    },
    Mark {
        id: String,
        /// pending, done or cancelled
        status: String,
    },
}

#[derive(Subcommand, Debug)]
enum AnalyticsCommand {
    Overview {
        #[arg(long, default_value_t = DEFAULT_STATS_DAYS)]
        days: u32,
        #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
        weather_limit: u32,
        #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
        facial_limit: u32,
        #[arg(long)]
        age_group: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        emotion: Option<String>,
    },
    TopCategories {
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    init_tracing(&settings.log_filter);

    let client = Arc::new(AdminClient::new(settings.api_config()?)?);
    info!(api_base = client.config().base_url(), "admin: client ready");

    match args.command {
        Command::Items(command) => run_items(client, command).await,
        Command::Orders(command) => run_orders(client, command).await,
        Command::Analytics(command) => run_analytics(client, command).await,
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn drain_events(events: &mut broadcast::Receiver<AdminEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            AdminEvent::Error(message) => warn!(%message, "admin: view reported failure"),
            event => debug!(?event, "admin: view event"),
        }
    }
}

fn warn_unknown(kind: &str, value: Option<&str>, known: &[&str]) {
    if let Some(value) = value {
        if !known.iter().any(|known| known.eq_ignore_ascii_case(value)) {
            warn!(kind, value, "admin: filter value is not a known menu option");
        }
    }
}

async fn run_items(client: Arc<AdminClient>, command: ItemsCommand) -> Result<()> {
    let view = InventoryView::new(client);
    let mut events = view.subscribe_events();
    view.reload()
        .await
        .map_err(|err| feedback::report(FailureContext::LoadItems, &err))?;

    match command {
        ItemsCommand::List { category, flavor } => {
            warn_unknown("category", category.as_deref(), &MENU_CATEGORIES);
            warn_unknown("flavor", flavor.as_deref(), &MENU_FLAVORS);
            view.set_filter(ItemFilter { category, flavor }).await;
            println!("{}", render::items_table(&view.snapshot().await));
        }
        ItemsCommand::Adjust { id, delta } => {
            let outcome = view
                .adjust_stock(ItemId(id), delta)
                .await
                .map_err(|err| feedback::report(FailureContext::AdjustStock, &err))?;
            match outcome.available_count {
                Some(count) => println!("Item {id}: stock adjusted by {delta:+}, now {count}"),
                None => println!("Item {id}: stock adjusted by {delta:+}"),
            }
            if let Err(error) = &outcome.reconciled {
                eprintln!("{}", feedback::describe(FailureContext::LoadItems, error));
            }
        }
    }

    drain_events(&mut events);
    Ok(())
}

async fn run_orders(client: Arc<AdminClient>, command: OrdersCommand) -> Result<()> {
    let lifecycle = OrderLifecycle::new(client);
    let mut events = lifecycle.subscribe_events();
    lifecycle
        .reload()
        .await
        .map_err(|err| feedback::report(FailureContext::LoadOrders, &err))?;

    match command {
        OrdersCommand::List { status } => {
            if let Some(raw) = status {
                let status = OrderStatus::canonicalize(&raw);
                if status == OrderStatus::Unknown {
                    bail!("unknown order status '{raw}' (expected pending, done or cancelled)");
                }
                lifecycle.toggle_filter(Some(status)).await;
            }
            println!("{}", render::orders_table(&lifecycle.visible_orders().await));
        }
        OrdersCommand::Show { id } => {
            let Some(order) = lifecycle.open_order(&OrderId::new(id.clone())).await else {
                bail!("order {id} not found");
            };
            println!("{}", render::order_detail(&order));
        }
        OrdersCommand::Mark { id, status } => {
            let order_id = OrderId::new(id);
            lifecycle.open_order(&order_id).await;
            let target = OrderStatus::canonicalize(&status);
            let outcome = lifecycle
                .request_transition(&order_id, target)
                .await
                .map_err(|err| feedback::report(FailureContext::UpdateStatus, &err))?;
            match outcome {
                TransitionOutcome::Skipped => {
                    println!("Order {order_id} is already {}", target.label());
                }
                TransitionOutcome::Applied { status, reconciled } => {
                    println!("Order {order_id} marked {}", status.label());
                    if reconciled == LoadOutcome::Superseded {
                        debug!(order_id = %order_id, "admin: reconciling reload superseded");
                    }
                }
                TransitionOutcome::ReconcileFailed { status, error } => {
                    println!("Order {order_id} marked {}", status.label());
                    eprintln!("{}", feedback::describe(FailureContext::LoadOrders, &error));
                }
            }
            if let Some(order) = lifecycle.active_order().await {
                println!("\n{}", render::order_detail(&order));
            }
        }
    }

    drain_events(&mut events);
    Ok(())
}

async fn run_analytics(client: Arc<AdminClient>, command: AnalyticsCommand) -> Result<()> {
    let view = AnalyticsView::new(client);
    let mut events = view.subscribe_events();

    match command {
        AnalyticsCommand::Overview {
            days,
            weather_limit,
            facial_limit,
            age_group,
            gender,
            emotion,
        } => {
            let query = OverviewQuery {
                days,
                weather_limit,
                facial_limit,
                facial_filter: FacialLogFilter {
                    age_group,
                    gender,
                    dominant_emotion: emotion,
                },
            };
            view.load_overview(&query)
                .await
                .map_err(|err| feedback::report(FailureContext::LoadAnalytics, &err))?;
            println!("{}", render::overview(&view.snapshot().await));
        }
        AnalyticsCommand::TopCategories { k } => {
            let top = view
                .top_categories(k)
                .await
                .map_err(|err| feedback::report(FailureContext::LoadTopCategories, &err))?;
            println!("{}", render::top_categories(&top));
        }
    }

    drain_events(&mut events);
    Ok(())
}
