use crate::fixtures::seed::{expect_silence, next_json, subscribe};
use crate::fixtures::test_app::TestApp;
use huddle_config::ExpiryMode;
use std::time::Duration;
use tokio_test::assert_ok;

#[tokio::test]
async fn sweep_removes_idle_channels_and_tells_members() {
    let app = TestApp::spawn_with_settings(|s| s.channels.inactivity_threshold_secs = 0).await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&ben, &channel).await;

    let mut ws = app.connect_ws(&ben).await;
    subscribe(&mut ws, &format!("channel:{}", channel.id)).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let removed = assert_ok!(app.state.chat.lifecycle().sweep().await);
    assert_eq!(removed, 1);

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "channel_deleted");
    assert_eq!(event["reason"], "expired");
    assert_eq!(event["name"], "general");
    expect_silence(&mut ws).await;

    let resp = app
        .auth_get(&format!("/api/channel/{}", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn stale_names_can_be_reclaimed() {
    let app = TestApp::spawn_with_settings(|s| s.channels.inactivity_threshold_secs = 0).await;
    let owner = app.seed_user("owner").await;
    let other = app.seed_user("other").await;
    let old = app.seed_channel(&owner, "general", false).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let fresh = app.seed_channel(&other, "general", false).await;
    assert_ne!(fresh.id, old.id);

    let resp = app
        .auth_get(&format!("/api/channel/{}", old.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn timer_mode_expires_after_inactivity() {
    let app = TestApp::spawn_with_settings(|s| {
        s.channels.expiry_mode = ExpiryMode::Timer;
        s.channels.inactivity_threshold_secs = 1;
    })
    .await;
    let owner = app.seed_user("owner").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    let mut ws = app.connect_ws(&owner).await;

    // Activity pushes the deadline back
    tokio::time::sleep(Duration::from_millis(600)).await;
    app.auth_post(&format!("/api/channel/{}/message", channel.id), &owner.access_token)
        .json(&serde_json::json!({ "content": "still here" }))
        .send()
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    let resp = app
        .auth_get(&format!("/api/channel/{}", channel.id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "channel_deleted");
    assert_eq!(event["channelId"], channel.id.as_str());
    let channel_id = bson::oid::ObjectId::parse_str(&channel.id).unwrap();
    assert!(!app.state.chat.lifecycle().scheduler().is_pending(channel_id));
}
