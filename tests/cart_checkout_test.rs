mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use common::{seed_customer, seed_product, TestApp};
use opsboard_api::entities::{cart_line, product, sale};
use opsboard_api::errors::ServiceError;
use opsboard_api::services::carts::{AddCartLineInput, CartOwner};

fn session(id: &str) -> CartOwner {
    CartOwner::Session(id.to_string())
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn adding_the_same_product_merges_into_one_line() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(10.00), 5).await;

    let first = app
        .services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 2,
            },
        )
        .await
        .expect("add should succeed");

    let merged = app
        .services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 3,
            },
        )
        .await
        .expect("add should merge");

    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 5);

    let view = app
        .services
        .carts
        .list_lines(session("s-1"))
        .await
        .expect("list should succeed");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.total, dec!(50.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn cart_cannot_exceed_live_stock() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(10.00), 5).await;

    app.services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 4,
            },
        )
        .await
        .expect("add should succeed");

    // 4 held + 2 more would pass 5 in stock.
    let over = app
        .services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 2,
            },
        )
        .await;
    assert_matches!(over, Err(ServiceError::Conflict(_)));

    let view = app
        .services
        .carts
        .list_lines(session("s-1"))
        .await
        .expect("list should succeed");
    assert_eq!(view.lines[0].quantity, 4, "held quantity unchanged");

    let bumped = app
        .services
        .carts
        .update_quantity(view.lines[0].id, 6)
        .await;
    assert_matches!(bumped, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn carts_are_isolated_per_owner() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(10.00), 10).await;

    app.services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 1,
            },
        )
        .await
        .expect("add should succeed");
    app.services
        .carts
        .add_line(
            CartOwner::User(app.member.user_id),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 2,
            },
        )
        .await
        .expect("add should succeed");

    let anon = app
        .services
        .carts
        .list_lines(session("s-1"))
        .await
        .expect("list");
    let owned = app
        .services
        .carts
        .list_lines(CartOwner::User(app.member.user_id))
        .await
        .expect("list");
    assert_eq!(anon.lines.len(), 1);
    assert_eq!(anon.lines[0].quantity, 1);
    assert_eq!(owned.lines.len(), 1);
    assert_eq!(owned.lines[0].quantity, 2);

    let cleared = app
        .services
        .carts
        .clear(session("s-1"))
        .await
        .expect("clear");
    assert_eq!(cleared, 1);
    let owned = app
        .services
        .carts
        .list_lines(CartOwner::User(app.member.user_id))
        .await
        .expect("list");
    assert_eq!(owned.lines.len(), 1, "other owner's cart untouched");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn checkout_carries_the_snapshot_price_and_drains_the_cart() {
    let app = TestApp::new().await;
    let customer = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let widget = seed_product(&app, "Widget", dec!(10.00), 5).await;

    app.services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 3,
            },
        )
        .await
        .expect("add should succeed");

    // Price rises while the cart sits; the line keeps its snapshot.
    let mut repriced: product::ActiveModel = widget.clone().into();
    repriced.price = Set(dec!(12.00));
    repriced.update(&*app.db).await.expect("reprice");

    let sale = app
        .services
        .sales
        .create_sale_from_cart(session("s-1"), Some(customer.id))
        .await
        .expect("checkout should succeed");

    assert_eq!(sale.lines.len(), 1);
    assert_eq!(sale.lines[0].unit_price, dec!(10.00));
    assert_eq!(sale.sale.total, dec!(30.00));

    let stock = product::Entity::find_by_id(widget.id)
        .one(&*app.db)
        .await
        .expect("query")
        .expect("exists")
        .stock;
    assert_eq!(stock, 2);

    let leftover = cart_line::Entity::find().all(&*app.db).await.expect("query");
    assert!(leftover.is_empty(), "cart drained on successful checkout");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn failed_checkout_leaves_the_cart_intact() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(10.00), 3).await;

    app.services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 3,
            },
        )
        .await
        .expect("add should succeed");

    // Stock disappears out from under the cart.
    let mut drained: product::ActiveModel = widget.clone().into();
    drained.stock = Set(1);
    drained.update(&*app.db).await.expect("restock");

    let result = app
        .services
        .sales
        .create_sale_from_cart(session("s-1"), None)
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    let view = app
        .services
        .carts
        .list_lines(session("s-1"))
        .await
        .expect("list");
    assert_eq!(view.lines.len(), 1, "cart survives a failed checkout");
    assert_eq!(view.lines[0].quantity, 3);

    let sales = sale::Entity::find().all(&*app.db).await.expect("query");
    assert!(sales.is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn empty_cart_cannot_be_checked_out() {
    let app = TestApp::new().await;

    let result = app
        .services
        .sales
        .create_sale_from_cart(session("never-used"), None)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn cart_rejects_unknown_products_and_bad_quantities() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(10.00), 5).await;

    let ghost = app
        .services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            },
        )
        .await;
    assert_matches!(ghost, Err(ServiceError::NotFound(_)));

    let zero = app
        .services
        .carts
        .add_line(
            session("s-1"),
            AddCartLineInput {
                product_id: widget.id,
                quantity: 0,
            },
        )
        .await;
    assert_matches!(zero, Err(ServiceError::ValidationError(_)));
}
