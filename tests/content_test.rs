mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::task::JoinSet;
use tower::ServiceExt;
use uuid::Uuid;

use common::{admin_token, json_request, long_text, member_token, send, spawn_app};

#[tokio::test]
async fn sermon_update_by_another_member_is_forbidden() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let owner = member_token("owner@church.test");
    let other = member_token("other@church.test");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/sermons",
            Some(&owner),
            Some(json!({
                "title": "Walking in faith",
                "pastor_name": "Pastor John",
                "sermon_date": "2024-03-10",
                "tags": "faith, hope"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tags"], json!(["faith", "hope"]));
    let id = body["data"]["id"].as_str().expect("id").to_string();
    let uri = format!("/api/sermons/{}", id);

    let (status, _) = send(&app, json_request(Method::PUT, &uri, Some(&other), Some(json!({ "title": "Hijacked" })))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, json_request(Method::GET, &uri, Some(&other), None)).await;
    assert_eq!(body["data"]["title"], "Walking in faith");

    let (status, body) = send(&app, json_request(Method::PUT, &uri, Some(&admin_token()), Some(json!({ "title": "Walking by faith" })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Walking by faith");

    let (status, _) = send(&app, json_request(Method::DELETE, &uri, Some(&other), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, json_request(Method::DELETE, &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Sermon deleted successfully" }));
    Ok(())
}

#[tokio::test]
async fn sermon_search_matches_title_and_filters_by_series() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("owner@church.test");

    for (title, series) in [("Grace abounds", "Romans"), ("Living water", "John"), ("Amazing grace", "John")] {
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/sermons",
                Some(&token),
                Some(json!({
                    "title": title,
                    "pastor_name": "Pastor John",
                    "sermon_date": "2024-03-10",
                    "series": series
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, json_request(Method::GET, "/api/sermons?search=grace", Some(&token), None)).await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = send(&app, json_request(Method::GET, "/api/sermons?search=grace&series=John", Some(&token), None)).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Amazing grace");
    Ok(())
}

#[tokio::test]
async fn duplicate_slug_is_rejected_without_insert() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("writer@church.test");
    let post = json!({
        "title": "Welcome",
        "slug": "welcome",
        "content": long_text(120)
    });

    let (status, _) = send(&app, json_request(Method::POST, "/api/blog/posts", Some(&token), Some(post.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, json_request(Method::POST, "/api/blog/posts", Some(&token), Some(post))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A post with this slug already exists");

    let (_, body) = send(&app, json_request(Method::GET, "/api/blog/posts", Some(&token), None)).await;
    assert_eq!(body["pagination"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn publishing_stamps_once_and_content_edits_recompute_reading_time() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("writer@church.test");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/blog/posts",
            Some(&token),
            Some(json!({ "title": "Draft", "slug": "draft", "content": long_text(450) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(body["data"]["reading_time"], 3);
    assert!(body["data"]["published_at"].is_null());
    let uri = format!("/api/blog/posts/{}", body["data"]["id"].as_str().expect("id"));

    let (_, body) = send(&app, json_request(Method::PUT, &uri, Some(&token), Some(json!({ "status": "published" })))).await;
    let stamp = body["data"]["published_at"].as_str().expect("published_at").to_string();

    let (_, body) = send(&app, json_request(Method::PUT, &uri, Some(&token), Some(json!({ "content": long_text(150) })))).await;
    assert_eq!(body["data"]["reading_time"], 1);
    assert_eq!(body["data"]["published_at"], stamp.as_str());

    let (_, body) = send(&app, json_request(Method::PUT, &uri, Some(&token), Some(json!({ "status": "published" })))).await;
    assert_eq!(body["data"]["published_at"], stamp.as_str());

    let (status, body) = send(&app, json_request(Method::GET, "/api/blog/posts/slug/draft", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);
    Ok(())
}

#[tokio::test]
async fn drafts_are_hidden_from_public_listings() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("writer@church.test");

    for (slug, status) in [("live", "published"), ("hidden", "draft")] {
        send(
            &app,
            json_request(
                Method::POST,
                "/api/blog/posts",
                Some(&token),
                Some(json!({ "title": slug, "slug": slug, "content": long_text(30), "status": status })),
            ),
        )
        .await;
    }

    let (_, body) = send(&app, json_request(Method::GET, "/api/blog/posts/published", None, None)).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["slug"], "live");

    let (status, _) = send(&app, json_request(Method::GET, "/api/blog/posts/slug/hidden", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn praying_counts_and_unknown_requests_are_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("hannah@church.test");

    let missing = format!("/api/prayer-requests/{}/pray", Uuid::new_v4());
    let (status, _) = send(&app, json_request(Method::PATCH, &missing, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/prayer-requests",
            Some(&token),
            Some(json!({
                "title": "Healing",
                "description": "Please pray for my mother's recovery",
                "requester_name": "Hannah",
                "is_anonymous": true
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["requester_name"].is_null());
    assert_eq!(body["data"]["is_public"], true);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let pray = format!("/api/prayer-requests/{}/pray", id);
    for _ in 0..3 {
        let (status, _) = send(&app, json_request(Method::PATCH, &pray, None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, json_request(Method::GET, "/api/prayer-requests/public", None, None)).await;
    assert_eq!(body["data"][0]["prayer_count"], 3);
    assert!(body["data"][0].get("requester_id").is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_prayers_are_all_counted() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("hannah@church.test");

    let (_, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/prayer-requests",
            Some(&token),
            Some(json!({ "title": "Travel", "description": "Safe travels for the mission team" })),
        ),
    )
    .await;
    let id = body["data"]["id"].as_str().expect("id").to_string();
    let pray = format!("/api/prayer-requests/{}/pray", id);

    let mut tasks = JoinSet::new();
    for _ in 0..50 {
        let router = app.router.clone();
        let request = json_request(Method::PATCH, &pray, None, None);
        tasks.spawn(async move { router.oneshot(request).await.map(|response| response.status()) });
    }

    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined?? == StatusCode::OK {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 50);

    let (_, body) = send(&app, json_request(Method::GET, &format!("/api/prayer-requests/{}", id), Some(&token), None)).await;
    assert_eq!(body["data"]["prayer_count"], succeeded);
    Ok(())
}

#[tokio::test]
async fn prayer_list_filters_on_visibility() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("hannah@church.test");

    for (title, is_public) in [("Open", true), ("Private", false)] {
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/prayer-requests",
                Some(&token),
                Some(json!({ "title": title, "description": "Prayer for the family", "is_public": is_public })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, json_request(Method::GET, "/api/prayer-requests", Some(&token), None)).await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = send(&app, json_request(Method::GET, "/api/prayer-requests?is_public=false", Some(&token), None)).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Private");

    let (_, body) = send(&app, json_request(Method::GET, "/api/prayer-requests/public", None, None)).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Open");
    Ok(())
}

#[tokio::test]
async fn resource_publish_stamp_and_faq_shape() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("deacon@church.test");

    let before = Utc::now();
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/resources/admin",
            Some(&token),
            Some(json!({
                "title": "When is the Sunday service?",
                "description": "Every Sunday at 10am.",
                "category": "faq",
                "file_type": "none",
                "is_published": true
            })),
        ),
    )
    .await;
    let after = Utc::now();
    assert_eq!(status, StatusCode::CREATED);

    let stamp: DateTime<Utc> = body["data"]["published_at"].as_str().expect("published_at").parse()?;
    assert!(stamp >= before && stamp <= after);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (_, body) = send(&app, json_request(Method::GET, "/api/resources/public/faqs", None, None)).await;
    assert_eq!(
        body["data"],
        json!([{ "title": "When is the Sunday service?", "description": "Every Sunday at 10am." }])
    );

    let download = format!("/api/resources/public/{}/download", id);
    let (_, body) = send(&app, json_request(Method::PUT, &download, None, None)).await;
    assert_eq!(body["data"]["download_count"], 1);
    Ok(())
}

#[tokio::test]
async fn unpublished_resources_stay_private() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = member_token("deacon@church.test");

    let (_, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/resources/admin",
            Some(&token),
            Some(json!({
                "title": "Hymnal",
                "description": "Songbook draft",
                "category": "song",
                "file_type": "pdf",
                "file_url": "https://cdn.church.test/hymnal.pdf"
            })),
        ),
    )
    .await;
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, _) = send(&app, json_request(Method::GET, &format!("/api/resources/public/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, json_request(Method::PUT, &format!("/api/resources/public/{}/download", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, json_request(Method::GET, "/api/resources/public", None, None)).await;
    assert_eq!(body["pagination"]["total"], 0);
    Ok(())
}
