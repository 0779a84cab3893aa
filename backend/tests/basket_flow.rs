//! Basket behaviour across customers and store outages.

#[macro_use]
mod support;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, RETRY_AFTER};
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};
use support::{ADMIN_EMAIL, ADMIN_PASSWORD, STAFF_EMAIL, STAFF_PASSWORD, gym, gymdesk_app};

#[rstest]
#[actix_web::test]
async fn customers_keep_separate_entries_for_the_same_product() {
    let gym = gym();
    gym.services.store.seed_product(1, "Towel", 4.0);
    let app = test::init_service(gymdesk_app(&gym.services)).await;
    let staff = sign_in!(&app, STAFF_EMAIL, STAFF_PASSWORD);
    let admin = sign_in!(&app, ADMIN_EMAIL, ADMIN_PASSWORD);

    for (cookie, quantity) in [(staff.clone(), 2), (admin.clone(), 5), (staff.clone(), 9)] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/basket")
                .cookie(cookie)
                .set_json(json!({ "productId": 1, "quantity": quantity }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let staff_rows = gym.services.store.basket_rows_for(gym.staff);
    let admin_rows = gym.services.store.basket_rows_for(gym.admin);
    assert_eq!(staff_rows.len(), 1);
    assert_eq!(staff_rows[0].2, 3);
    assert_eq!(admin_rows.len(), 1);
    assert_eq!(admin_rows[0].2, 5);
    assert_ne!(staff_rows[0].0, admin_rows[0].0);

    let listed: Value = test::read_body_json(
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/basket")
                .cookie(admin)
                .to_request(),
        )
        .await,
    )
    .await;
    assert_eq!(listed[0]["productName"], "Towel");
    assert_eq!(listed[0]["unitPrice"], 4.0);
    assert_eq!(listed[0]["quantity"], 5);
}

#[rstest]
#[actix_web::test]
async fn withdrawn_products_cannot_be_added() {
    let gym = gym();
    let towel = gym.services.store.seed_product(1, "Towel", 4.0);
    gym.services.store.withdraw_product(towel);
    let app = test::init_service(gymdesk_app(&gym.services)).await;
    let staff = sign_in!(&app, STAFF_EMAIL, STAFF_PASSWORD);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/basket")
            .cookie(staff)
            .set_json(json!({ "productId": 1, "quantity": 1 }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "not_found");
    assert!(gym.services.store.basket_rows_for(gym.staff).is_empty());
}

#[rstest]
#[actix_web::test]
async fn outages_ask_clients_to_retry() {
    let gym = gym();
    gym.services.store.seed_product(1, "Towel", 4.0);
    let app = test::init_service(gymdesk_app(&gym.services)).await;
    let staff = sign_in!(&app, STAFF_EMAIL, STAFF_PASSWORD);
    gym.services.store.set_unavailable(true);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/basket")
            .cookie(staff)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
        Some("1")
    );
    assert_eq!(
        res.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "service_unavailable");
}
