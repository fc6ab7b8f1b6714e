use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn post_and_read_channel_history() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&member, &channel).await;

    for content in ["first", "second", "third"] {
        let resp = app
            .auth_post(&format!("/api/channel/{}/message", channel.id), &member.access_token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let resp = app
        .auth_get(
            &format!("/api/channel/{}/message?page=1&per_page=2", channel.id),
            &owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    let contents: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["second", "third"]);
    assert_eq!(page["items"][0]["sender"]["username"], "member");
}

#[tokio::test]
async fn mentions_are_resolved_on_post() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let alice = app.seed_user("alice").await;
    let channel = app.seed_channel(&owner, "general", false).await;

    let resp = app
        .auth_post(&format!("/api/channel/{}/message", channel.id), &owner.access_token)
        .json(&serde_json::json!({ "content": "ping @alice and @ghost" }))
        .send()
        .await
        .unwrap();
    let message: Value = resp.json().await.unwrap();
    assert_eq!(message["mentions"], serde_json::json!([alice.id]));
    assert_eq!(message["channelId"], channel.id.as_str());
}

#[tokio::test]
async fn non_members_and_empty_messages_are_rejected() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let outsider = app.seed_user("outsider").await;
    let channel = app.seed_channel(&owner, "general", false).await;

    let resp = app
        .auth_post(&format!("/api/channel/{}/message", channel.id), &outsider.access_token)
        .json(&serde_json::json!({ "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/channel/{}/message", channel.id), &owner.access_token)
        .json(&serde_json::json!({ "content": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn only_the_author_deletes_a_message() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let member = app.seed_user("member").await;
    let channel = app.seed_channel(&owner, "general", false).await;
    app.join(&member, &channel).await;

    let resp = app
        .auth_post(&format!("/api/channel/{}/message", channel.id), &member.access_token)
        .json(&serde_json::json!({ "content": "oops" }))
        .send()
        .await
        .unwrap();
    let message: Value = resp.json().await.unwrap();
    let message_id = message["id"].as_str().unwrap();

    let resp = app
        .auth_delete(&format!("/api/message/{}", message_id), &owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_delete(&format!("/api/message/{}", message_id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get(&format!("/api/channel/{}/message", channel.id), &member.access_token)
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 0);
}
