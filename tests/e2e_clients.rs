// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

mod common;

use common::{MockPanel, ALICE_ID};
use serde_json::json;
use xui_core::{ClientLimits, Error, InboundClient, VlessClient};

fn vless_client(email: &str) -> InboundClient {
    InboundClient::from(VlessClient {
        limits: ClientLimits::with_email(email),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_add_clients() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    let bob = vless_client("bob");
    let carol = vless_client("carol");
    client
        .add_inbound_clients(1, &[bob.clone(), carol])
        .await
        .unwrap();

    let body = panel.state.lock().await.last_body.clone().unwrap();
    assert_eq!(body["id"], 1);
    assert!(body["settings"].is_string());

    let settings = panel.inbound_settings(1).await;
    let clients = settings["clients"].as_array().unwrap();
    assert_eq!(clients.len(), 3);
    assert_eq!(clients[1]["id"], bob.key());
    assert_eq!(clients[1]["email"], "bob");
    assert_eq!(clients[1]["enable"], true);
    assert_eq!(clients[1]["limitIp"], 0);
    assert_eq!(clients[2]["email"], "carol");

    let inbound = client.get_inbound(1).await.unwrap();
    assert_eq!(inbound.clients().len(), 3);
    let link = inbound.access_link("203.0.113.7", None, 1).unwrap();
    assert!(link.starts_with(&format!("vless://{}@vpn.example:443?", bob.key())));
    assert!(link.ends_with("#bob"));
}

#[tokio::test]
async fn test_add_no_clients() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    client.add_inbound_clients(1, &[]).await.unwrap();
    assert!(panel.state.lock().await.last_body.is_none());
}

#[tokio::test]
async fn test_add_duplicate_client() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    match client.add_inbound_clients(1, &[vless_client("alice")]).await {
        Err(Error::Panel(msg)) => assert!(msg.starts_with("Duplicate email")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(panel.inbound_settings(1).await["clients"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_client() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    let updated = InboundClient::from(VlessClient {
        id: ALICE_ID.to_string(),
        flow: String::new(),
        limits: ClientLimits {
            email: Some("alice".to_string()),
            limit_ip: Some(5),
            total_gb: Some(50 * 1024 * 1024 * 1024),
            ..Default::default()
        },
    });
    client
        .update_inbound_client(1, updated.key(), &updated)
        .await
        .unwrap();

    let settings = panel.inbound_settings(1).await;
    let stored = &settings["clients"][0];
    assert_eq!(stored["limitIp"], 5);
    assert_eq!(stored["totalGB"], 53687091200i64);
    assert_eq!(stored["expiryTime"], 0);
    assert_eq!(stored["enable"], true);

    let missing = vless_client("nobody");
    assert!(matches!(
        client.update_inbound_client(1, missing.key(), &missing).await,
        Err(Error::Panel(_))
    ));
}

#[tokio::test]
async fn test_delete_client() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    client.delete_inbound_client(1, ALICE_ID).await.unwrap();

    let settings = panel.inbound_settings(1).await;
    assert_eq!(settings["clients"], json!([]));
    assert!(client.client_traffics("alice").await.unwrap().is_none());

    match client.delete_inbound_client(1, ALICE_ID).await {
        Err(Error::Panel(msg)) => assert_eq!(msg, "Client Not Found"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_traffic() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    let stat = client.client_traffics("alice").await.unwrap().unwrap();
    assert_eq!(stat.inbound_id, 1);
    assert_eq!(stat.up, 1024);
    assert_eq!(stat.down, 4096);
    assert!(stat.enable);

    assert!(client.client_traffics("nobody").await.unwrap().is_none());

    client.reset_client_traffic(1, "alice").await.unwrap();
    let stat = client.client_traffics("alice").await.unwrap().unwrap();
    assert_eq!(stat.up, 0);
    assert_eq!(stat.down, 0);

    assert!(matches!(
        client.reset_client_traffic(1, "nobody").await,
        Err(Error::Panel(_))
    ));
}

#[tokio::test]
async fn test_client_ips() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    assert_eq!(
        client.client_ips("alice").await.unwrap(),
        vec!["10.0.0.2", "10.0.0.3"]
    );

    client.clear_client_ips("alice").await.unwrap();
    assert!(client.client_ips("alice").await.unwrap().is_empty());
    assert!(client.client_ips("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_depleted_clients() {
    let panel = MockPanel::start().await;
    let client = panel.client().await;

    let mut bob = vless_client("bob");
    bob.limits_mut().total_gb = Some(1000);
    client.add_inbound_clients(1, &[bob]).await.unwrap();

    {
        let mut state = panel.state.lock().await;
        let stats = state.inbounds[0]["clientStats"].as_array_mut().unwrap();
        let bob_stat = stats.iter_mut().find(|s| s["email"] == "bob").unwrap();
        bob_stat["up"] = json!(600);
        bob_stat["down"] = json!(400);
    }

    client.delete_depleted_clients(1).await.unwrap();

    let inbound = client.get_inbound(1).await.unwrap();
    let emails: Vec<String> = inbound
        .clients()
        .iter()
        .filter_map(|c| c.email().map(str::to_string))
        .collect();
    assert_eq!(emails, vec!["alice"]);
    assert!(client.client_traffics("bob").await.unwrap().is_none());
}
