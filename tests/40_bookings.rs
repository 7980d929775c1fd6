mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn ok(server: &common::TestServer, procedure: &str, token: &str, input: Value) -> Result<Value> {
    let (status, body) = server.call(procedure, Some(token), input).await?;
    anyhow::ensure!(status == StatusCode::OK, "{} failed: {} {}", procedure, status, body);
    Ok(body)
}

#[tokio::test]
async fn booking_lifecycle_moves_room_and_property_counts() -> Result<()> {
    let server = common::ensure_server().await?;
    let (token, registration) = server.landlord("lifecycle@example.com").await?;
    let landlord_id = registration["profile"]["id"].clone();

    let property = ok(
        server,
        "properties.create",
        &token,
        json!({ "landlord_id": landlord_id, "name": "Casa Luna", "address": "7 Luna St", "city": "Iloilo" }),
    )
    .await?;
    let room = ok(
        server,
        "rooms.create",
        &token,
        json!({ "property_id": property["id"], "room_number": "101", "capacity": 1, "monthly_rate": "3500" }),
    )
    .await?;
    let first = ok(server, "boarders.create", &token, json!({ "name": "Ana", "email": "ana@example.com" })).await?;
    let second = ok(server, "boarders.create", &token, json!({ "name": "Ben", "email": "ben@example.com" })).await?;

    let booking = ok(
        server,
        "bookings.create",
        &token,
        json!({ "boarder_id": first["id"], "room_id": room["id"], "start_date": "2026-06-01", "end_date": "2026-11-30" }),
    )
    .await?;
    let rival = ok(
        server,
        "bookings.create",
        &token,
        json!({ "boarder_id": second["id"], "room_id": room["id"], "start_date": "2026-07-01" }),
    )
    .await?;

    ok(server, "bookings.confirm", &token, json!({ "id": booking["id"] })).await?;

    // Capacity 1: the overlapping rival cannot be confirmed
    let (status, _) = server.call("bookings.confirm", Some(&token), json!({ "id": rival["id"] })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Illegal jump back to pending-only actions
    let (status, _) = server.call("bookings.confirm", Some(&token), json!({ "id": booking["id"] })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    ok(server, "bookings.activate", &token, json!({ "id": booking["id"] })).await?;
    let occupied = ok(server, "rooms.getById", &token, json!({ "id": room["id"] })).await?;
    assert_eq!(occupied["status"], "OCCUPIED");
    let p = ok(server, "properties.getById", &token, json!({ "id": property["id"] })).await?;
    assert_eq!((p["total_rooms"].clone(), p["available_rooms"].clone()), (json!(1), json!(0)));

    ok(server, "bookings.complete", &token, json!({ "id": booking["id"] })).await?;
    let freed = ok(server, "rooms.getById", &token, json!({ "id": room["id"] })).await?;
    assert_eq!(freed["status"], "AVAILABLE");
    let p = ok(server, "properties.getById", &token, json!({ "id": property["id"] })).await?;
    assert_eq!(p["available_rooms"], 1);

    let boarder = ok(server, "boarders.getById", &token, json!({ "id": first["id"] })).await?;
    assert!(boarder["room_id"].is_null());

    Ok(())
}
