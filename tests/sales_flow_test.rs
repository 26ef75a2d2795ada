mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use common::{seed_customer, seed_product, TestApp};
use opsboard_api::entities::{product, sale, sale_line};
use opsboard_api::errors::ServiceError;
use opsboard_api::services::sales::{CreateSaleInput, SaleFilter, SaleLineInput};

async fn stock_of(app: &TestApp, id: Uuid) -> i32 {
    product::Entity::find_by_id(id)
        .one(&*app.db)
        .await
        .expect("query product")
        .expect("product exists")
        .stock
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sale_decrements_stock_and_sums_total() {
    let app = TestApp::new().await;
    let customer = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let widget = seed_product(&app, "Widget", dec!(25.00), 10).await;
    let gadget = seed_product(&app, "Gadget", dec!(9.50), 4).await;

    let sale = app
        .services
        .sales
        .create_sale(CreateSaleInput {
            customer_id: Some(customer.id),
            lines: vec![
                SaleLineInput {
                    product_id: widget.id,
                    quantity: 3,
                    unit_price: None,
                },
                SaleLineInput {
                    product_id: gadget.id,
                    quantity: 2,
                    unit_price: Some(dec!(9.00)),
                },
            ],
        })
        .await
        .expect("sale should succeed");

    // 3 * 25.00 + 2 * 9.00
    assert_eq!(sale.sale.total, dec!(93.00));
    assert_eq!(sale.lines.len(), 2);
    assert_eq!(stock_of(&app, widget.id).await, 7);
    assert_eq!(stock_of(&app, gadget.id).await, 2);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn failed_line_rolls_back_the_whole_sale() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(25.00), 10).await;
    let scarce = seed_product(&app, "Scarce", dec!(5.00), 1).await;

    let result = app
        .services
        .sales
        .create_sale(CreateSaleInput {
            customer_id: None,
            lines: vec![
                SaleLineInput {
                    product_id: widget.id,
                    quantity: 2,
                    unit_price: None,
                },
                SaleLineInput {
                    product_id: scarce.id,
                    quantity: 3,
                    unit_price: None,
                },
            ],
        })
        .await;

    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    // Nothing of the first line survived the rollback.
    assert_eq!(stock_of(&app, widget.id).await, 10);
    assert_eq!(stock_of(&app, scarce.id).await, 1);
    let sales = sale::Entity::find().all(&*app.db).await.expect("query");
    assert!(sales.is_empty());
    let lines = sale_line::Entity::find().all(&*app.db).await.expect("query");
    assert!(lines.is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn last_unit_goes_to_exactly_one_buyer() {
    let app = TestApp::new().await;
    let scarce = seed_product(&app, "Last One", dec!(15.00), 1).await;

    let svc = app.services.sales.clone();
    let buy = |svc: Arc<opsboard_api::services::SaleService>, product_id: Uuid| async move {
        svc.create_sale(CreateSaleInput {
            customer_id: None,
            lines: vec![SaleLineInput {
                product_id,
                quantity: 1,
                unit_price: None,
            }],
        })
        .await
    };

    let first = tokio::spawn(buy(svc.clone(), scarce.id));
    let second = tokio::spawn(buy(svc, scarce.id));
    let first = first.await.expect("task");
    let second = second.await.expect("task");

    let wins = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one buyer gets the last unit");
    for result in [first, second] {
        if let Err(e) = result {
            assert_matches!(e, ServiceError::InsufficientStock(_));
        }
    }
    assert_eq!(stock_of(&app, scarce.id).await, 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn deleting_a_sale_removes_its_lines_without_restocking() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(25.00), 10).await;
    let gadget = seed_product(&app, "Gadget", dec!(9.50), 4).await;

    let sale = app
        .services
        .sales
        .create_sale(CreateSaleInput {
            customer_id: None,
            lines: vec![
                SaleLineInput {
                    product_id: widget.id,
                    quantity: 1,
                    unit_price: None,
                },
                SaleLineInput {
                    product_id: gadget.id,
                    quantity: 1,
                    unit_price: None,
                },
            ],
        })
        .await
        .expect("sale should succeed");

    app.services
        .sales
        .delete_sale(sale.sale.id)
        .await
        .expect("delete should succeed");

    let sales = sale::Entity::find().all(&*app.db).await.expect("query");
    assert!(sales.is_empty());
    let lines = sale_line::Entity::find().all(&*app.db).await.expect("query");
    assert!(lines.is_empty(), "no orphan lines after delete");

    // Units already shipped stay shipped.
    assert_eq!(stock_of(&app, widget.id).await, 9);
    assert_eq!(stock_of(&app, gadget.id).await, 3);

    let missing = app.services.sales.get_sale(sale.sale.id).await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn list_sales_filters_by_customer() {
    let app = TestApp::new().await;
    let acme = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let globex = seed_customer(&app, "Globex", "ap@globex.test").await;
    let widget = seed_product(&app, "Widget", dec!(25.00), 10).await;

    for customer_id in [Some(acme.id), Some(acme.id), Some(globex.id), None] {
        app.services
            .sales
            .create_sale(CreateSaleInput {
                customer_id,
                lines: vec![SaleLineInput {
                    product_id: widget.id,
                    quantity: 1,
                    unit_price: None,
                }],
            })
            .await
            .expect("sale should succeed");
    }

    let page = app
        .services
        .sales
        .list_sales(
            SaleFilter {
                customer_id: Some(acme.id),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("list should succeed");

    assert_eq!(page.total, 2);
    assert!(page.sales.iter().all(|s| s.customer_id == Some(acme.id)));

    let all = app
        .services
        .sales
        .list_sales(SaleFilter::default(), 1, 20)
        .await
        .expect("list should succeed");
    assert_eq!(all.total, 4);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sale_rejects_unknown_customer_and_empty_lines() {
    let app = TestApp::new().await;
    let widget = seed_product(&app, "Widget", dec!(25.00), 10).await;

    let empty = app
        .services
        .sales
        .create_sale(CreateSaleInput {
            customer_id: None,
            lines: vec![],
        })
        .await;
    assert_matches!(empty, Err(ServiceError::ValidationError(_)));

    let ghost = app
        .services
        .sales
        .create_sale(CreateSaleInput {
            customer_id: Some(Uuid::new_v4()),
            lines: vec![SaleLineInput {
                product_id: widget.id,
                quantity: 1,
                unit_price: None,
            }],
        })
        .await;
    assert_matches!(ghost, Err(ServiceError::NotFound(_)));
    assert_eq!(stock_of(&app, widget.id).await, 10);
}
