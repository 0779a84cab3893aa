//! End-to-end back office scenarios over the full HTTP stack.
//!
//! Accounts, sessions and announcements interact here the way a gym's staff
//! would drive them: an admin onboards a coach, broadcasts, and later
//! deactivates the account.

#[macro_use]
mod support;

use actix_web::cookie::SameSite;
use actix_web::cookie::time::Duration;
use actix_web::http::StatusCode;
use actix_web::test;
use gymdesk::domain::TRACE_ID_HEADER;
use rstest::rstest;
use serde_json::{Value, json};
use support::{ADMIN_EMAIL, ADMIN_PASSWORD, SESSION_COOKIE, STAFF_EMAIL, STAFF_PASSWORD, gym, gymdesk_app};

#[rstest]
#[actix_web::test]
async fn session_cookie_is_private_http_only_and_lax() {
    let gym = gym();
    let app = test::init_service(gymdesk_app(&gym.services)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/signin")
            .set_json(json!({ "email": STAFF_EMAIL, "password": STAFF_PASSWORD }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .expect("session cookie");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.max_age(), Some(Duration::hours(6)));
    let token = gym
        .services
        .store
        .session_token_of(gym.staff)
        .expect("token stored");
    assert!(
        !cookie.value().contains(&token),
        "the cookie payload is encrypted"
    );
}

#[rstest]
#[actix_web::test]
async fn onboarding_broadcast_and_offboarding() {
    let gym = gym();
    let app = test::init_service(gymdesk_app(&gym.services)).await;
    let admin = sign_in!(&app, ADMIN_EMAIL, ADMIN_PASSWORD);

    let created = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/admin/accounts")
            .cookie(admin.clone())
            .set_json(json!({
                "email": "Coach@Gym.Example",
                "name": "Coach",
                "password": "kettlebells"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let coach_id = test::read_body_json::<Value, _>(created).await["id"]
        .as_i64()
        .expect("numeric id");

    let coach = sign_in!(&app, "coach@gym.example", "kettlebells");
    let me: Value = test::read_body_json(
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/me")
                .cookie(coach.clone())
                .to_request(),
        )
        .await,
    )
    .await;
    assert_eq!(me["id"], coach_id);
    assert_eq!(me["email"], "coach@gym.example");
    assert_eq!(me["permission"], "standard");

    let sent = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/admin/announcements")
            .cookie(admin.clone())
            .set_json(json!({ "text": "Welcome aboard", "all": true }))
            .to_request(),
    )
    .await;
    assert_eq!(sent.status(), StatusCode::CREATED);

    let inbox: Value = test::read_body_json(
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/announcements")
                .cookie(coach.clone())
                .to_request(),
        )
        .await,
    )
    .await;
    assert_eq!(inbox.as_array().map(Vec::len), Some(1));
    assert_eq!(inbox[0]["read"], false);
    let message_id = inbox[0]["id"].as_i64().expect("message id");

    let read = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/announcements/{message_id}/read"))
            .cookie(coach.clone())
            .to_request(),
    )
    .await;
    assert_eq!(read.status(), StatusCode::OK);

    let summaries: Value = test::read_body_json(
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/admin/announcements")
                .cookie(admin.clone())
                .to_request(),
        )
        .await,
    )
    .await;
    assert_eq!(summaries[0]["recipientCount"], 3);
    assert_eq!(summaries[0]["readCount"], 1);

    let removed = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/admin/accounts/{coach_id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(removed.status(), StatusCode::OK);

    let replay = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(coach)
            .to_request(),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let again = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/signin")
            .set_json(json!({ "email": "coach@gym.example", "password": "kettlebells" }))
            .to_request(),
    )
    .await;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);

    let second = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/admin/announcements")
            .cookie(admin.clone())
            .set_json(json!({ "text": "Staff meeting", "all": true }))
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    let summaries: Value = test::read_body_json(
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/admin/announcements")
                .cookie(admin)
                .to_request(),
        )
        .await,
    )
    .await;
    let counts: Vec<i64> = summaries
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|summary| summary["recipientCount"].as_i64())
        .collect();
    assert!(counts.contains(&2), "deactivated accounts receive nothing new");
}

#[rstest]
#[actix_web::test]
async fn failed_broadcast_leaves_no_trace_in_any_inbox() {
    let gym = gym();
    gym.services.store.fail_receipt_for(gym.staff);
    let app = test::init_service(gymdesk_app(&gym.services)).await;
    let admin = sign_in!(&app, ADMIN_EMAIL, ADMIN_PASSWORD);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/admin/announcements")
            .cookie(admin.clone())
            .set_json(json!({ "text": "Half sent?", "all": true }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(gym.services.store.message_count(), 0);

    let inbox: Value = test::read_body_json(
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/announcements")
                .cookie(admin)
                .to_request(),
        )
        .await,
    )
    .await;
    assert_eq!(inbox, json!([]));
}

#[rstest]
#[actix_web::test]
async fn error_bodies_echo_the_trace_header() {
    let gym = gym();
    let app = test::init_service(gymdesk_app(&gym.services)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/me").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let header = res
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace header");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["traceId"], header.as_str());
}

#[rstest]
#[case(json!({ "email": STAFF_EMAIL, "password": "wrong" }))]
#[case(json!({ "email": "nobody@gym.example", "password": STAFF_PASSWORD }))]
#[actix_web::test]
async fn sign_in_failures_do_not_reveal_which_part_was_wrong(#[case] payload: Value) {
    let gym = gym();
    let app = test::init_service(gymdesk_app(&gym.services)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/signin")
            .set_json(payload)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "invalid credentials");
    assert!(gym.services.store.session_token_of(gym.staff).is_none());
}
