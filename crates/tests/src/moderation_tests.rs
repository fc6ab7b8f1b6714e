use crate::fixtures::seed::SeededUser;
use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn post_target(app: &TestApp, path: &str, actor: &SeededUser, target: &SeededUser) -> reqwest::Response {
    app.auth_post(path, &actor.access_token)
        .json(&serde_json::json!({ "userId": target.id }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn vote_kick_bans_at_quorum() {
    let app = TestApp::spawn_with_settings(|s| s.channels.kick_vote_quorum = 2).await;
    let owner = app.seed_user("owner").await;
    let a = app.seed_user("alpha").await;
    let b = app.seed_user("bravo").await;
    let target = app.seed_user("troll").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    for user in [&a, &b, &target] {
        app.join(user, &channel).await;
    }
    let path = format!("/api/channel/{}/vote-kick", channel.id);

    let resp = post_target(&app, &path, &a, &target).await;
    assert_eq!(resp.status().as_u16(), 200);
    let first: Value = resp.json().await.unwrap();
    assert_eq!(first, serde_json::json!({ "state": "accumulating", "votes": 1, "quorum": 2 }));

    // A repeated vote does not count twice
    let again: Value = post_target(&app, &path, &a, &target).await.json().await.unwrap();
    assert_eq!(again["votes"], 1);

    let second: Value = post_target(&app, &path, &b, &target).await.json().await.unwrap();
    assert_eq!(second, serde_json::json!({ "state": "banned", "votes": 2 }));

    // Banned users cannot come back on their own
    let resp = app
        .auth_post(&format!("/api/channel/{}/join", channel.id), &target.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // A further vote finds nobody to remove
    let resp = post_target(&app, &path, &a, &target).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn vote_kick_guards() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let outsider = app.seed_user("outsider").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&member, &channel).await;
    let path = format!("/api/channel/{}/vote-kick", channel.id);

    assert_eq!(post_target(&app, &path, &member, &owner).await.status().as_u16(), 400);
    assert_eq!(post_target(&app, &path, &member, &member).await.status().as_u16(), 409);
    assert_eq!(post_target(&app, &path, &outsider, &member).await.status().as_u16(), 403);
    assert_eq!(post_target(&app, &path, &member, &outsider).await.status().as_u16(), 400);

    let private = app.seed_channel(&owner, "secret", true).await;
    let resp = post_target(&app, &format!("/api/channel/{}/vote-kick", private.id), &owner, &member).await;
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn kick_command_depends_on_the_actor() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let target = app.seed_user("target").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&member, &channel).await;
    app.join(&target, &channel).await;
    let path = format!("/api/channel/{}/kick", channel.id);

    let voted: Value = post_target(&app, &path, &member, &target).await.json().await.unwrap();
    assert_eq!(voted["outcome"], "voted");
    assert_eq!(voted["vote"]["state"], "accumulating");

    let kicked: Value = post_target(&app, &path, &owner, &target).await.json().await.unwrap();
    assert_eq!(kicked, serde_json::json!({ "outcome": "kicked" }));

    let resp = app
        .auth_get(&format!("/api/channel/{}/member", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    let members: Vec<Value> = resp.json().await.unwrap();
    assert!(members.iter().all(|m| m["username"] != "target"));
}

#[tokio::test]
async fn unban_and_owner_invite_lift_bans() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let target = app.seed_user("target").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&target, &channel).await;

    post_target(&app, &format!("/api/channel/{}/kick", channel.id), &owner, &target).await;

    let unban = format!("/api/channel/{}/unban", channel.id);
    assert_eq!(post_target(&app, &unban, &target, &target).await.status().as_u16(), 403);
    assert_eq!(post_target(&app, &unban, &owner, &target).await.status().as_u16(), 200);
    assert_eq!(post_target(&app, &unban, &owner, &target).await.status().as_u16(), 400);
    app.join(&target, &channel).await;

    // Kick again, then the owner's invite readmits directly
    post_target(&app, &format!("/api/channel/{}/kick", channel.id), &owner, &target).await;
    let resp = post_target(&app, &format!("/api/channel/{}/invite", channel.id), &owner, &target).await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn revoke_only_applies_to_private_channels() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let guest = app.seed_user("guest").await;
    let private = app.seed_channel(&owner, "secret", true).await;
    let public = app.seed_channel(&owner, "general", false).await;

    post_target(&app, &format!("/api/channel/{}/invite", private.id), &owner, &guest).await;
    app.join(&guest, &public).await;

    let resp = post_target(&app, &format!("/api/channel/{}/revoke", public.id), &owner, &guest).await;
    assert_eq!(resp.status().as_u16(), 400);

    let resp = post_target(&app, &format!("/api/channel/{}/revoke", private.id), &owner, &guest).await;
    assert_eq!(resp.status().as_u16(), 200);

    // Revoked, not banned: a new invite works
    let resp = post_target(&app, &format!("/api/channel/{}/invite", private.id), &owner, &guest).await;
    assert_eq!(resp.status().as_u16(), 200);
}
