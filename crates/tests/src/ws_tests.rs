use crate::fixtures::seed::{expect_silence, next_json, send_frame, subscribe};
use crate::fixtures::test_app::TestApp;
use serde_json::json;

#[tokio::test]
async fn connect_requires_a_valid_token() {
    let app = TestApp::spawn().await;
    let result = tokio_tungstenite::connect_async(app.ws_url("garbage")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn ping_and_malformed_frames_get_replies() {
    let app = TestApp::spawn().await;
    let ann = app.seed_user("ann").await;
    let mut ws = app.connect_ws(&ann).await;

    send_frame(&mut ws, json!({ "type": "ping" })).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");

    send_frame(&mut ws, json!({ "type": "dance" })).await;
    assert_eq!(next_json(&mut ws).await["type"], "error");

    let reply = subscribe(&mut ws, "nowhere:1").await;
    assert_eq!(reply["type"], "error");
}

#[tokio::test]
async fn channel_topics_require_membership() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    let topic = format!("channel:{}", channel.id);
    let mut ws = app.connect_ws(&ben).await;

    let reply = subscribe(&mut ws, &topic).await;
    assert_eq!(reply["type"], "error");

    let reply = subscribe(&mut ws, &format!("user:{}", owner.id)).await;
    assert_eq!(reply["type"], "error");

    app.join(&ben, &channel).await;
    let reply = subscribe(&mut ws, &topic).await;
    assert_eq!(reply, json!({ "type": "subscribed", "topic": topic }));
}

#[tokio::test]
async fn channel_messages_fan_out_in_order() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&ben, &channel).await;

    let mut ws = app.connect_ws(&ben).await;
    subscribe(&mut ws, &format!("channel:{}", channel.id)).await;

    for i in 0..5 {
        app.auth_post(&format!("/api/channel/{}/message", channel.id), &owner.access_token)
            .json(&json!({ "content": format!("msg {i}") }))
            .send()
            .await
            .unwrap();
    }

    for i in 0..5 {
        let event = next_json(&mut ws).await;
        assert_eq!(event["type"], "channel_message");
        assert_eq!(event["channelId"], channel.id.as_str());
        assert_eq!(event["message"]["content"], format!("msg {i}"));
        assert_eq!(event["message"]["sender"]["username"], "owner");
    }
}

#[tokio::test]
async fn mentions_and_direct_messages_notify_personally() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    let mut ws = app.connect_ws(&ben).await;

    app.auth_post(&format!("/api/channel/{}/message", channel.id), &owner.access_token)
        .json(&json!({ "content": "hey @ben" }))
        .send()
        .await
        .unwrap();
    let note = next_json(&mut ws).await;
    assert_eq!(note["type"], "notification");
    assert_eq!(note["kind"], "mention");
    assert_eq!(note["message"]["content"], "hey @ben");

    let dm: serde_json::Value = app
        .auth_post("/api/dm", &owner.access_token)
        .json(&json!({ "userId": ben.id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    app.auth_post(&format!("/api/dm/{}/message", dm["id"].as_str().unwrap()), &owner.access_token)
        .json(&json!({ "content": "private word" }))
        .send()
        .await
        .unwrap();

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "direct_message");
    assert_eq!(event["message"]["content"], "private word");
    let note = next_json(&mut ws).await;
    assert_eq!(note["kind"], "direct_message");
}

#[tokio::test]
async fn kicked_members_are_told_then_cut_off() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&ben, &channel).await;

    let mut ws = app.connect_ws(&ben).await;
    subscribe(&mut ws, &format!("channel:{}", channel.id)).await;

    app.auth_post(&format!("/api/channel/{}/kick", channel.id), &owner.access_token)
        .json(&json!({ "userId": ben.id }))
        .send()
        .await
        .unwrap();

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "channel_member_removed");
    assert_eq!(event["userId"], ben.id.as_str());
    assert_eq!(event["reason"], "kicked");

    app.auth_post(&format!("/api/channel/{}/message", channel.id), &owner.access_token)
        .json(&json!({ "content": "after the kick" }))
        .send()
        .await
        .unwrap();
    expect_silence(&mut ws).await;
}

#[tokio::test]
async fn removal_reaches_every_tab_exactly_once() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&ben, &channel).await;

    let mut following = app.connect_ws(&ben).await;
    subscribe(&mut following, &format!("channel:{}", channel.id)).await;
    let mut elsewhere = app.connect_ws(&ben).await;

    app.auth_post(&format!("/api/channel/{}/kick", channel.id), &owner.access_token)
        .json(&json!({ "userId": ben.id }))
        .send()
        .await
        .unwrap();

    for ws in [&mut following, &mut elsewhere] {
        let event = next_json(ws).await;
        assert_eq!(event["type"], "channel_member_removed");
        assert_eq!(event["reason"], "kicked");
        expect_silence(ws).await;
    }
}

#[tokio::test]
async fn joins_typing_and_status_are_broadcast() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let ben = app.seed_user("ben").await;
    let channel = app.seed_channel(&owner, "general", false).await;

    let mut ws = app.connect_ws(&owner).await;
    subscribe(&mut ws, &format!("channel:{}", channel.id)).await;

    app.join(&ben, &channel).await;
    let added = next_json(&mut ws).await;
    assert_eq!(added["type"], "channel_member_added");
    assert_eq!(added["member"]["username"], "ben");
    assert_eq!(added["member"]["isOwner"], false);

    let resp = app
        .auth_post("/api/typing", &ben.access_token)
        .json(&json!({ "channelId": channel.id, "isTyping": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let typing = next_json(&mut ws).await;
    assert_eq!(typing["type"], "typing");
    assert_eq!(typing["username"], "ben");

    let resp = app
        .auth_patch("/api/user/status", &ben.access_token)
        .json(&json!({ "status": "dnd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let status = next_json(&mut ws).await;
    assert_eq!(status, json!({ "type": "status_change", "userId": ben.id, "status": "dnd" }));
}

#[tokio::test]
async fn invites_reach_the_invitee() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let guest = app.seed_user("guest").await;
    let channel = app.seed_channel(&owner, "secret", true).await;
    let mut ws = app.connect_ws(&guest).await;

    app.auth_post(&format!("/api/channel/{}/invite", channel.id), &owner.access_token)
        .json(&json!({ "userId": guest.id }))
        .send()
        .await
        .unwrap();

    let invited = next_json(&mut ws).await;
    assert_eq!(invited["type"], "channel_invited");
    assert_eq!(invited["channel"]["name"], "secret");
    assert_eq!(invited["channel"]["isNewInvite"], true);
    assert_eq!(invited["invitedBy"]["username"], "owner");
}
