mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use tower::ServiceExt;
use uuid::Uuid;

use common::{seed_customer, seed_product, TestApp};
use opsboard_api::auth::AuthService;
use opsboard_api::entities::user;
use opsboard_api::services::sales::{CreateSaleInput, SaleLineInput};

async fn bearer_token(app: &TestApp, auth_service: &AuthService, user_id: Uuid) -> String {
    let model = user::Entity::find_by_id(user_id)
        .one(&*app.db)
        .await
        .expect("query user")
        .expect("seeded user");
    let token = auth_service.generate_token(&model).expect("token");
    format!("Bearer {}", token.access_token)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn id_routes_match_real_identifiers() {
    let app = TestApp::new().await;
    let (router, _) = app.router();
    let id = Uuid::new_v4();

    // Each id-parameterized path must reach the auth wall, not fall
    // through the router as an unknown path.
    for uri in [
        format!("/api/v1/sales/{}", id),
        format!("/api/v1/sales/{}/lines", id),
        format!("/api/v1/customers/{}", id),
        format!("/api/v1/products/{}", id),
        format!("/api/v1/boards/{}", id),
        format!("/api/v1/boards/{}/columns", id),
        format!("/api/v1/cards/{}/history", id),
        format!("/api/v1/cards/{}/notifications", id),
    ] {
        let response = router.clone().oneshot(get(&uri)).await.expect("response");
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {}",
            uri
        );
    }

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/cards/{}/move", id))
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sale_is_fetchable_by_id_over_http() {
    let app = TestApp::new().await;
    let (router, auth_service) = app.router();
    let token = bearer_token(&app, &auth_service, app.admin.user_id).await;

    let customer = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let widget = seed_product(&app, "Widget", dec!(25.00), 10).await;
    let sale = app
        .services
        .sales
        .create_sale(CreateSaleInput {
            customer_id: Some(customer.id),
            lines: vec![SaleLineInput {
                product_id: widget.id,
                quantity: 2,
                unit_price: None,
            }],
        })
        .await
        .expect("create sale");

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/sales/{}", sale.sale.id))
                .method("GET")
                .header(header::AUTHORIZATION, &token)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let missing = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/sales/{}", Uuid::new_v4()))
                .method("GET")
                .header(header::AUTHORIZATION, &token)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
