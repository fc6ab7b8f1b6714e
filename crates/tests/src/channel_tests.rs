use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/api/channel")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app.auth_get("/api/channel", "not-a-jwt").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn create_channel_and_list() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    app.seed_channel(&owner, "general", false).await;
    app.seed_channel(&owner, "secret", true).await;

    let resp = app.auth_get("/api/channel", &owner.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let channels: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(channels.len(), 2);
    assert!(channels.iter().all(|c| c["isNewInvite"] == false));
    assert!(channels.iter().all(|c| c["ownerId"] == owner.id.as_str()));

    // Discovery lists public channels only
    let resp = app.auth_get("/api/channel/public", &owner.access_token).send().await.unwrap();
    let public: Vec<Value> = resp.json().await.unwrap();
    let names: Vec<&str> = public.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["general"]);
}

#[tokio::test]
async fn channel_names_are_unique_ignoring_case() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let other = app.seed_user("other").await;
    app.seed_channel(&owner, "general", false).await;

    let resp = app
        .auth_post("/api/channel", &other.access_token)
        .json(&serde_json::json!({ "name": "General" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .auth_post("/api/channel", &other.access_token)
        .json(&serde_json::json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn private_channels_are_hidden_from_outsiders() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let outsider = app.seed_user("outsider").await;
    let channel = app.seed_channel(&owner, "secret", true).await;

    let resp = app
        .auth_get(&format!("/api/channel/{}", channel.id), &outsider.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/channel/{}/join", channel.id), &outsider.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_get(&format!("/api/channel/{}", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isPrivate"], true);
}

#[tokio::test]
async fn join_list_members_and_leave() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let channel = app.seed_channel(&owner, "general", false).await;

    app.join(&member, &channel).await;
    let resp = app
        .auth_post(&format!("/api/channel/{}/join", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .auth_get(&format!("/api/channel/{}/member", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    let members: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(members.len(), 2);
    let owner_entry = members.iter().find(|m| m["username"] == "owner").unwrap();
    assert_eq!(owner_entry["isOwner"], true);

    let resp = app
        .auth_post(&format!("/api/channel/{}/leave", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // Leaving twice is an invalid state, the owner cannot leave at all
    let resp = app
        .auth_post(&format!("/api/channel/{}/leave", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let resp = app
        .auth_post(&format!("/api/channel/{}/leave", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn invites_flag_the_new_member_until_cleared() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let guest = app.seed_user("guest").await;
    let channel = app.seed_channel(&owner, "secret", true).await;

    let resp = app
        .auth_post(&format!("/api/channel/{}/invite", channel.id), &owner.access_token)
        .json(&serde_json::json!({ "userId": guest.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.auth_get("/api/channel", &guest.access_token).send().await.unwrap();
    let channels: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["name"], channel.name.as_str());
    assert_eq!(channels[0]["isNewInvite"], true);

    let resp = app
        .auth_post(&format!("/api/channel/{}/clear-invite", channel.id), &guest.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.auth_get("/api/channel", &guest.access_token).send().await.unwrap();
    let channels: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(channels[0]["isNewInvite"], false);
}

#[tokio::test]
async fn only_the_owner_invites_to_private_channels() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let guest = app.seed_user("guest").await;
    let channel = app.seed_channel(&owner, "secret", true).await;

    app.auth_post(&format!("/api/channel/{}/invite", channel.id), &owner.access_token)
        .json(&serde_json::json!({ "userId": member.id }))
        .send()
        .await
        .unwrap();

    let resp = app
        .auth_post(&format!("/api/channel/{}/invite", channel.id), &member.access_token)
        .json(&serde_json::json!({ "userId": guest.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/channel/{}/invite", channel.id), &owner.access_token)
        .json(&serde_json::json!({ "userId": "zzz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn cancel_deletes_for_the_owner_and_leaves_for_members() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&member, &channel).await;

    let resp = app
        .auth_post(&format!("/api/channel/{}/cancel", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "left");

    let resp = app
        .auth_post(&format!("/api/channel/{}/cancel", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "deleted");

    let resp = app
        .auth_get(&format!("/api/channel/{}", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn only_the_owner_deletes() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&member, &channel).await;

    let resp = app
        .auth_delete(&format!("/api/channel/{}", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_delete(&format!("/api/channel/{}", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // The name is free again
    app.seed_channel(&member, "general", false).await;
}
