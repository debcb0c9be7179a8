mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use presale_api::entities::{
    customer::Entity as CustomerEntity,
    order::{self, Entity as OrderEntity},
};

use common::{read_json, TestApp};

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}

#[tokio::test]
async fn create_order_persists_and_returns_dto() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Alice").await;
    let dist = app.seed_distribution("spring-round").await;

    let payload = json!({
        "customer_id": customer.id,
        "distribution_id": dist.id,
        "amount": 4
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert!(body["success"].as_bool().unwrap_or(false));
    let data = &body["data"];
    assert_eq!(data["customer_id"], customer.id);
    assert_eq!(data["distribution_id"], dist.id);
    assert_eq!(data["amount"], 4);
    // Audit fields are stripped from the DTO
    assert!(data.get("updated_at").is_none());
    assert!(data.get("deleted_at").is_none());

    let saved = OrderEntity::find()
        .filter(order::Column::CustomerId.eq(customer.id))
        .one(&*app.state.db)
        .await
        .expect("query order")
        .expect("order should exist");
    assert_eq!(saved.amount, 4);
    assert!(saved.deleted_at.is_none());
}

#[tokio::test]
async fn create_order_rejects_unknown_customer() {
    let app = TestApp::new().await;
    let dist = app.seed_distribution("round").await;

    let payload = json!({
        "customer_id": 9_999,
        "distribution_id": dist.id,
        "amount": 1
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json(response).await;
    assert_eq!(body["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn create_order_rejects_unknown_distribution() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Bob").await;

    let payload = json!({
        "customer_id": customer.id,
        "distribution_id": 4_242,
        "amount": 1
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json(response).await;
    assert_eq!(body["code"], "DISTRIBUTION_NOT_FOUND");
}

#[tokio::test]
async fn create_order_rejects_duplicate_active_pair() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Carla").await;
    let dist = app.seed_distribution("round").await;
    app.seed_order(customer.id, dist.id, 2).await;

    let payload = json!({
        "customer_id": customer.id,
        "distribution_id": dist.id,
        "amount": 3
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = read_json(response).await;
    assert_eq!(body["code"], "EXISTING_ORDER");
}

#[tokio::test]
async fn create_order_rejects_negative_amount() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Dora").await;
    let dist = app.seed_distribution("round").await;

    let payload = json!({
        "customer_id": customer.id,
        "distribution_id": dist.id,
        "amount": -2
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
}

#[tokio::test]
async fn zero_amount_create_marks_customer_served() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Eva").await;
    let dist = app.seed_distribution("round").await;

    let payload = json!({
        "customer_id": customer.id,
        "distribution_id": dist.id,
        "amount": 0
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let refreshed = CustomerEntity::find_by_id(customer.id)
        .one(&*app.state.db)
        .await
        .expect("query customer")
        .expect("customer should exist");
    assert!(refreshed.is_served);
}

#[tokio::test]
async fn nonzero_amount_create_leaves_served_flag_unchanged() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Finn").await;
    let dist = app.seed_distribution("round").await;

    let payload = json!({
        "customer_id": customer.id,
        "distribution_id": dist.id,
        "amount": 7
    });

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let refreshed = CustomerEntity::find_by_id(customer.id)
        .one(&*app.state.db)
        .await
        .expect("query customer")
        .expect("customer should exist");
    assert!(!refreshed.is_served);
}

#[tokio::test]
async fn update_applies_served_side_effect_and_never_resets_it() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Greta").await;
    let dist = app.seed_distribution("round").await;
    let order = app.seed_order(customer.id, dist.id, 5).await;

    // Updating to amount zero flips the flag
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}", order.id),
            Some(json!({
                "customer_id": customer.id,
                "distribution_id": dist.id,
                "amount": 0
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let refreshed = CustomerEntity::find_by_id(customer.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.is_served);

    // A later nonzero update leaves the flag set
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}", order.id),
            Some(json!({
                "customer_id": customer.id,
                "distribution_id": dist.id,
                "amount": 3
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["data"]["amount"], 3);

    let refreshed = CustomerEntity::find_by_id(customer.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.is_served);
}

#[tokio::test]
async fn update_missing_order_fails_with_order_not_found() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Hugo").await;
    let dist = app.seed_distribution("round").await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/orders/12345",
            Some(json!({
                "customer_id": customer.id,
                "distribution_id": dist.id,
                "amount": 1
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json(response).await;
    assert_eq!(body["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn delete_soft_deletes_and_excludes_from_listing() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ines").await;
    let dist = app.seed_distribution("round").await;
    let order = app.seed_order(customer.id, dist.id, 2).await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/orders/{}", order.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["data"]["id"], order.id);

    // The row remains, with the marker set
    let saved = OrderEntity::find_by_id(order.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(saved.deleted_at.is_some());

    // Deleted orders disappear from listings
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/find-all/1/10/{}", dist.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 0);

    // A second delete finds nothing
    let response = app
        .request(Method::DELETE, &format!("/api/v1/orders/{}", order.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], "ORDER_NOT_FOUND");

    // The pair is free again for a new pre-sale
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer.id,
                "distribution_id": dist.id,
                "amount": 1
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn listing_rejects_non_numeric_parameters() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/orders/find-all/abc/10/1", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "PARAMETERS_ARE_NUMBERS");
}

#[tokio::test]
async fn listing_rejects_non_positive_parameters() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/orders/find-all/0/10/1", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "PARAMETERS_POSITIVE_VALUES");

    let response = app
        .request(Method::GET, "/api/v1/orders/find-all/1/-3/1", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "PARAMETERS_POSITIVE_VALUES");
}

#[tokio::test]
async fn listing_rejects_unknown_or_deleted_distribution() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/orders/find-all/1/10/777", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], "DISTRIBUTION_NOT_FOUND");

    let deleted = app.seed_deleted_distribution("closed-round").await;
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/find-all/1/10/{}", deleted.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], "DISTRIBUTION_NOT_FOUND");
}

#[tokio::test]
async fn listing_paginates_with_ceiling_page_count() {
    let app = TestApp::new().await;
    let dist = app.seed_distribution("big-round").await;

    for i in 0..25 {
        let customer = app.seed_customer(&format!("customer-{i}")).await;
        app.seed_order(customer.id, dist.id, 1).await;
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/find-all/1/10/{}", dist.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let data = &body["data"];
    assert_eq!(data["total"], 25);
    assert_eq!(data["page"], 1);
    assert_eq!(data["limit"], 10);
    assert_eq!(data["total_pages"], 3);
    assert_eq!(data["items"].as_array().map(|a| a.len()), Some(10));

    // Last page carries the remainder
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/find-all/3/10/{}", dist.id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["items"].as_array().map(|a| a.len()), Some(5));
}
