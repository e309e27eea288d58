mod common;

use http::{Method, StatusCode};
use serde_json::{json, Value};
use travelmate_backend::test_util::{seed_user, token_for};

use common::{send, setup};

fn trip_body(title: &str, location: &str) -> Value {
    json!({
        "title": title,
        "description": "A short trip",
        "location": location,
        "startDate": "2024-06-01",
        "endDate": "2024-06-07",
        "longitude": 2.35,
        "latitude": 48.85,
        "notes": ""
    })
}

async fn create_trip(app: &axum::Router, token: &str, title: &str, location: &str) -> u64 {
    let res = send(app, Method::POST, "/trips", Some(token), Some(trip_body(title, location))).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    res.body["id"].as_u64().unwrap()
}

#[tokio::test]
async fn test_create_trip_sets_owner_from_token() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let token = token_for(&state, &a);

    let mut body = trip_body("Paris", "France");
    body["userId"] = json!(b.id);
    let res = send(&app, Method::POST, "/trips", Some(&token), Some(body)).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["userId"], a.id);
    assert_eq!(res.body["startDate"], "2024-06-01");
}

#[tokio::test]
async fn test_create_trip_requires_title() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let token = token_for(&state, &a);

    let res = send(&app, Method::POST, "/trips", Some(&token), Some(trip_body("  ", "Nowhere"))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, Method::POST, "/trips", Some(&token), Some(json!("not an object"))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_trips_is_scoped_to_caller() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let admin = seed_user(&state, "Root", "root@x.com", "secret1", true).await;
    let (ta, tb) = (token_for(&state, &a), token_for(&state, &b));

    create_trip(&app, &ta, "A1", "Rome").await;
    create_trip(&app, &ta, "A2", "Milan").await;
    create_trip(&app, &tb, "B1", "Oslo").await;

    let res = send(&app, Method::GET, "/trips", Some(&ta), None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 2);
    let res = send(&app, Method::GET, "/trips", Some(&tb), None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    let res = send(&app, Method::GET, "/trips", Some(&token_for(&state, &admin)), None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_single_trip_access() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let admin = seed_user(&state, "Root", "root@x.com", "secret1", true).await;
    let ta = token_for(&state, &a);
    let id = create_trip(&app, &ta, "A1", "Rome").await;
    let uri = format!("/trips/{}", id);

    assert_eq!(send(&app, Method::GET, &uri, Some(&ta), None).await.status, StatusCode::OK);
    assert_eq!(
        send(&app, Method::GET, &uri, Some(&token_for(&state, &b)), None).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        send(&app, Method::GET, &uri, Some(&token_for(&state, &admin)), None).await.status,
        StatusCode::OK
    );
    assert_eq!(
        send(&app, Method::GET, "/trips/9999", Some(&ta), None).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        send(&app, Method::GET, "/trips/abc", Some(&ta), None).await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_update_trip() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let ta = token_for(&state, &a);
    let id = create_trip(&app, &ta, "A1", "Rome").await;
    let uri = format!("/trips/{}", id);

    let res = send(&app, Method::PUT, &uri, Some(&ta), Some(trip_body("A1 renamed", "Naples"))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "A1 renamed");
    assert_eq!(res.body["location"], "Naples");
    assert_eq!(res.body["userId"], a.id);

    let res = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token_for(&state, &b)),
        Some(trip_body("Stolen", "Oslo")),
    )
    .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(state.db.get_trip(id).unwrap().unwrap().title, "A1 renamed");
}

#[tokio::test]
async fn test_delete_trip_owner_or_admin() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let admin = seed_user(&state, "Root", "root@x.com", "secret1", true).await;
    let ta = token_for(&state, &a);
    let first = create_trip(&app, &ta, "A1", "Rome").await;
    let second = create_trip(&app, &ta, "A2", "Milan").await;

    let res = send(&app, Method::DELETE, &format!("/trips/{}", first), Some(&token_for(&state, &b)), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&app, Method::DELETE, &format!("/trips/{}", first), Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(
        &app,
        Method::DELETE,
        &format!("/trips/{}", second),
        Some(&token_for(&state, &admin)),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, Method::DELETE, &format!("/trips/{}", first), Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_update_only_touches_own_trips() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let (ta, tb) = (token_for(&state, &a), token_for(&state, &b));
    let mine = create_trip(&app, &ta, "A1", "Rome").await;
    let theirs = create_trip(&app, &tb, "B1", "Oslo").await;

    let res = send(
        &app,
        Method::PUT,
        "/trips",
        Some(&ta),
        Some(json!({ "ids": [mine, theirs], "update": { "notes": "bulk" } })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["updated"], 1);
    assert_eq!(state.db.get_trip(mine).unwrap().unwrap().notes, "bulk");
    assert_eq!(state.db.get_trip(theirs).unwrap().unwrap().notes, "");
}

#[tokio::test]
async fn test_bulk_update_validation() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let ta = token_for(&state, &a);
    let id = create_trip(&app, &ta, "A1", "Rome").await;

    let bodies = [
        json!({ "ids": [], "update": { "notes": "x" } }),
        json!({ "ids": [id], "update": {} }),
        json!({ "ids": [id], "update": { "userId": 99 } }),
        json!({ "ids": [id], "update": { "title": "" } }),
    ];
    for body in bodies {
        let res = send(&app, Method::PUT, "/trips", Some(&ta), Some(body.clone())).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", body);
    }
    assert_eq!(state.db.get_trip(id).unwrap().unwrap().user_id, a.id);
}

#[tokio::test]
async fn test_bulk_delete() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let (ta, tb) = (token_for(&state, &a), token_for(&state, &b));
    let a1 = create_trip(&app, &ta, "A1", "Rome").await;
    let a2 = create_trip(&app, &ta, "A2", "Milan").await;
    let b1 = create_trip(&app, &tb, "B1", "Oslo").await;

    let res = send(&app, Method::DELETE, "/trips", Some(&ta), Some(json!({ "ids": [a1, a2, b1] }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["deleted"], 2);
    assert!(state.db.get_trip(b1).unwrap().is_some());

    let res = send(&app, Method::DELETE, "/trips", Some(&ta), Some(json!({ "ids": [] }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_trips() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let (ta, tb) = (token_for(&state, &a), token_for(&state, &b));
    create_trip(&app, &ta, "Summer", "Lisbon").await;
    create_trip(&app, &ta, "Winter", "Oslo").await;
    create_trip(&app, &tb, "Spring", "Lisbon").await;

    let res = send(&app, Method::GET, "/trips/search?query=lisbon", Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let hits = res.body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Summer");

    let res = send(&app, Method::GET, "/trips/search?query=2024-06", Some(&ta), None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let res = send(&app, Method::GET, "/trips/search", Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = send(&app, Method::GET, "/trips/search?query=", Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_trips_endpoint() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let b = seed_user(&state, "B", "b@x.com", "secret1", false).await;
    let admin = seed_user(&state, "Root", "root@x.com", "secret1", true).await;
    let ta = token_for(&state, &a);
    create_trip(&app, &ta, "A1", "Rome").await;

    let uri = format!("/users/{}/trips", a.id);
    let res = send(&app, Method::GET, &uri, Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = send(&app, Method::GET, &uri, Some(&token_for(&state, &b)), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&app, Method::GET, &uri, Some(&token_for(&state, &admin)), None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_reset() {
    let (state, app) = setup();
    let admin = seed_user(&state, "Root", "root@x.com", "secret1", true).await;
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let ta = token_for(&state, &a);
    create_trip(&app, &ta, "A1", "Rome").await;
    create_trip(&app, &token_for(&state, &admin), "Admin trip", "Bern").await;

    let res = send(&app, Method::POST, "/admin/reset", Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(state.db.count_trips().unwrap(), 2);

    let res = send(&app, Method::POST, "/admin/reset", Some(&token_for(&state, &admin)), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["trips_deleted"], 2);
    assert_eq!(res.body["users_deleted"], 1);
    assert_eq!(state.db.count_users().unwrap(), 1);
    assert_eq!(state.db.count_trips().unwrap(), 0);
}

#[tokio::test]
async fn test_ids_beyond_rowid_range_are_bad_requests() {
    let (state, app) = setup();
    let a = seed_user(&state, "A", "a@x.com", "secret1", false).await;
    let ta = token_for(&state, &a);
    let id = create_trip(&app, &ta, "A1", "Rome").await;
    let huge = "9223372036854775808";

    let res = send(&app, Method::GET, &format!("/trips/{}", huge), Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"]["type"], "validation_error");

    let res = send(&app, Method::PUT, &format!("/users/{}", huge), Some(&ta), Some(json!({}))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, Method::GET, &format!("/users/{}/trips", huge), Some(&ta), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(
        &app,
        Method::PUT,
        "/trips",
        Some(&ta),
        Some(json!({ "ids": [id, u64::MAX], "update": { "notes": "x" } })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(state.db.get_trip(id).unwrap().unwrap().notes, "");

    let res = send(&app, Method::DELETE, "/trips", Some(&ta), Some(json!({ "ids": [u64::MAX] }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(state.db.count_trips().unwrap(), 1);
}
