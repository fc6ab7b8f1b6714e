use futures::{SinkExt, StreamExt};
use huddle_db::models::User;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

use super::test_app::TestApp;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct SeededUser {
    pub id: String,
    pub username: String,
    pub access_token: String,
}

pub struct SeededChannel {
    pub id: String,
    pub name: String,
}

impl TestApp {
    /// Insert a user directly into the store and mint a token for them.
    pub async fn seed_user(&self, username: &str) -> SeededUser {
        let user = User::new(username, username.to_uppercase(), "Tester");
        self.state
            .chat
            .store()
            .insert_user(&user)
            .await
            .expect("Failed to seed user");
        let access_token = self
            .state
            .auth
            .generate_access_token(user.id, &user.username)
            .expect("Failed to issue token");
        SeededUser {
            id: user.id.to_hex(),
            username: user.username,
            access_token,
        }
    }

    /// Create a channel over HTTP as `owner`.
    pub async fn seed_channel(&self, owner: &SeededUser, name: &str, is_private: bool) -> SeededChannel {
        let resp = self
            .auth_post("/api/channel", &owner.access_token)
            .json(&serde_json::json!({ "name": name, "isPrivate": is_private }))
            .send()
            .await
            .expect("Create channel request failed");
        assert_eq!(resp.status().as_u16(), 200, "Create channel failed");
        let body: Value = resp.json().await.unwrap();
        SeededChannel {
            id: body["id"].as_str().unwrap().to_string(),
            name: body["name"].as_str().unwrap().to_string(),
        }
    }

    pub async fn join(&self, user: &SeededUser, channel: &SeededChannel) {
        let resp = self
            .auth_post(&format!("/api/channel/{}/join", channel.id), &user.access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "Join failed");
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_patch(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    /// Open a socket for `user` and consume the `connected` frame.
    pub async fn connect_ws(&self, user: &SeededUser) -> WsClient {
        let (mut ws, _) = tokio_tungstenite::connect_async(self.ws_url(&user.access_token))
            .await
            .expect("WS connect failed");
        let connected = next_json(&mut ws).await;
        assert_eq!(connected["type"], "connected");
        ws
    }
}

/// Next text frame as JSON, failing after a few seconds.
pub async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timeout waiting for WS message")
            .expect("WS stream ended")
            .expect("WS error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Asserts nothing arrives within a short window.
pub async fn expect_silence(ws: &mut WsClient) {
    let next = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    if let Ok(Some(Ok(Message::Text(text)))) = next {
        panic!("unexpected WS frame: {}", text.as_str());
    }
}

pub async fn send_frame(ws: &mut WsClient, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

/// Subscribe and wait for the reply frame (`subscribed` or `error`).
pub async fn subscribe(ws: &mut WsClient, topic: &str) -> Value {
    send_frame(ws, serde_json::json!({ "type": "subscribe", "topic": topic })).await;
    next_json(ws).await
}
