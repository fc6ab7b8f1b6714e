use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn opening_is_symmetric() {
    let app = TestApp::spawn().await;
    let ann = app.seed_user("ann").await;
    let ben = app.seed_user("ben").await;

    let resp = app
        .auth_post("/api/dm", &ann.access_token)
        .json(&serde_json::json!({ "userId": ben.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let forward: Value = resp.json().await.unwrap();

    let resp = app
        .auth_post("/api/dm", &ben.access_token)
        .json(&serde_json::json!({ "userId": ann.id }))
        .send()
        .await
        .unwrap();
    let backward: Value = resp.json().await.unwrap();

    assert_eq!(forward["id"], backward["id"]);
    assert!(forward["user1Id"].as_str().unwrap() < forward["user2Id"].as_str().unwrap());
}

#[tokio::test]
async fn self_and_unknown_targets_are_rejected() {
    let app = TestApp::spawn().await;
    let ann = app.seed_user("ann").await;

    let resp = app
        .auth_post("/api/dm", &ann.access_token)
        .json(&serde_json::json!({ "userId": ann.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .auth_post("/api/dm", &ann.access_token)
        .json(&serde_json::json!({ "userId": bson::oid::ObjectId::new().to_hex() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn send_list_and_guard_conversations() {
    let app = TestApp::spawn().await;
    let ann = app.seed_user("ann").await;
    let ben = app.seed_user("ben").await;
    let cy = app.seed_user("cy").await;

    let resp = app
        .auth_post("/api/dm", &ann.access_token)
        .json(&serde_json::json!({ "userId": ben.id }))
        .send()
        .await
        .unwrap();
    let dm: Value = resp.json().await.unwrap();
    let dm_id = dm["id"].as_str().unwrap();

    let resp = app
        .auth_post(&format!("/api/dm/{}/message", dm_id), &ben.access_token)
        .json(&serde_json::json!({ "content": "hey ann" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let sent: Value = resp.json().await.unwrap();
    assert_eq!(sent["directMessageId"], dm_id);
    assert!(sent.get("channelId").is_none());

    let resp = app.auth_get("/api/dm", &ann.access_token).send().await.unwrap();
    let conversations: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["otherUser"]["username"], "ben");
    assert_eq!(conversations[0]["lastMessageAt"], sent["createdAt"]);

    let resp = app
        .auth_get(&format!("/api/dm/{}/message", dm_id), &ann.access_token)
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["items"][0]["content"], "hey ann");

    let resp = app
        .auth_get(&format!("/api/dm/{}/message", dm_id), &cy.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}
