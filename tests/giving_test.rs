mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Months, Utc};
use serde_json::json;

use common::{admin_token, json_request, member_token, send, spawn_app, token};

#[tokio::test]
async fn anonymous_donation_needs_no_token() -> anyhow::Result<()> {
    let app = spawn_app().await?;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/donations",
            None,
            Some(json!({
                "amount": "25.50",
                "donation_type": "offering",
                "payment_method": "cash",
                "donor_name": "Someone",
                "is_anonymous": true
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let donation = &body["data"];
    assert_eq!(donation["amount"], 25.5);
    assert_eq!(donation["currency"], "USD");
    assert!(donation["donor_name"].is_null());
    assert!(donation["donor_id"].is_null());
    assert!(donation["payment_id"].as_str().expect("payment id").starts_with("DON_"));
    Ok(())
}

#[tokio::test]
async fn signed_in_monthly_donation_is_linked_and_scheduled() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let bearer = token("donor-42", "giver@church.test", "member");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/donations",
            Some(&bearer),
            Some(json!({
                "amount": 100,
                "donation_type": "tithe",
                "payment_method": "card",
                "is_recurring": true,
                "recurrence_frequency": "monthly"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["donor_id"], "donor-42");

    let created: DateTime<Utc> = body["data"]["created_at"].as_str().expect("created_at").parse()?;
    let next: DateTime<Utc> = body["data"]["next_recurrence_date"].as_str().expect("next date").parse()?;
    assert_eq!(Some(next), created.checked_add_months(Months::new(1)));

    let (status, body) = send(&app, json_request(Method::GET, "/api/donations/user/donor-42", Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn stats_cover_completed_donations_only() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let bearer = admin_token();

    for (amount, kind, status) in [
        (50, "tithe", "completed"),
        (150, "tithe", "completed"),
        (40, "mission", "completed"),
        (999, "building", "pending"),
    ] {
        let (code, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/donations",
                Some(&bearer),
                Some(json!({
                    "amount": amount,
                    "donation_type": kind,
                    "payment_method": "bank",
                    "payment_status": status
                })),
            ),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, body) = send(&app, json_request(Method::GET, "/api/donations/stats", Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["total_amount"], 240.0);
    assert_eq!(stats["total_donations"], 3);
    assert_eq!(stats["max_amount"], 150.0);
    assert_eq!(stats["min_amount"], 40.0);
    assert_eq!(stats["by_type"][0]["donation_type"], "tithe");
    assert_eq!(stats["by_type"][0]["total_amount"], 200.0);

    let (status, _) = send(
        &app,
        json_request(
            Method::GET,
            "/api/donations/stats?start_date=2024-02-01&end_date=2024-01-01",
            Some(&bearer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn non_finite_amounts_are_rejected_and_leave_stats_intact() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let bearer = admin_token();

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/donations",
            Some(&bearer),
            Some(json!({
                "amount": 20,
                "donation_type": "offering",
                "payment_method": "cash",
                "payment_status": "completed"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for amount in ["inf", "-inf", "NaN", "infinity"] {
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/donations",
                Some(&bearer),
                Some(json!({
                    "amount": amount,
                    "donation_type": "offering",
                    "payment_method": "cash",
                    "payment_status": "completed"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
        assert_eq!(body["errors"][0]["field"], "body");
    }

    let (status, body) = send(&app, json_request(Method::GET, "/api/donations/stats", Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_donations"], 1);
    assert_eq!(body["data"]["total_amount"], 20.0);
    assert_eq!(body["data"]["max_amount"], 20.0);
    Ok(())
}

#[tokio::test]
async fn refunded_donation_cannot_be_completed_again() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let bearer = admin_token();

    let (_, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/donations",
            Some(&bearer),
            Some(json!({
                "amount": 10,
                "donation_type": "offering",
                "payment_method": "mobile",
                "payment_status": "completed"
            })),
        ),
    )
    .await;
    let payment_id = body["data"]["payment_id"].clone();
    let uri = format!("/api/donations/{}", body["data"]["id"].as_str().expect("id"));

    let (status, body) = send(&app, json_request(Method::PUT, &uri, Some(&bearer), Some(json!({ "payment_status": "refunded" })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_id"], payment_id);

    let (status, _) = send(&app, json_request(Method::PUT, &uri, Some(&bearer), Some(json!({ "payment_status": "completed" })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn member_emails_are_unique_and_searchable() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let bearer = member_token("office@church.test");
    let member = json!({
        "email": "Lydia@Church.test",
        "full_name": "Lydia Purple",
        "date_of_birth": "1990-05-20",
        "ministries": "choir, hospitality"
    });

    let (status, body) = send(&app, json_request(Method::POST, "/api/members", Some(&bearer), Some(member.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "lydia@church.test");
    assert!(body["data"]["age"].is_number());
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = send(&app, json_request(Method::POST, "/api/members", Some(&bearer), Some(member))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A member with this email already exists");

    let (status, body) = send(&app, json_request(Method::GET, "/api/members/email/lydia@church.test", Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (_, body) = send(&app, json_request(Method::GET, "/api/members?search=purple", Some(&bearer), None)).await;
    assert_eq!(body["pagination"]["total"], 1);

    let (status, body) = send(&app, json_request(Method::PATCH, &format!("/api/members/{}/activity", id), Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["last_activity"].is_string());

    let (_, body) = send(&app, json_request(Method::GET, "/api/members/stats", Some(&bearer), None)).await;
    assert_eq!(body["data"]["total"], 1);
    Ok(())
}
