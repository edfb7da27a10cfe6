// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use relay::{Accepted, Audience, ChannelBroadcaster, Delivery, Dispatcher};
use revlog::{CharDiffer, FirstSavePolicy, RevisionConfig, RevisionEngine, RevisionRecord};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use workfs::{MemoryFs, WorkspaceFs};

const LATER: i64 = 4_000_000_000_000;

struct Harness {
    fs: MemoryFs,
    dispatcher: Arc<Dispatcher>,
    rx: UnboundedReceiver<Delivery>,
}

impl Harness {
    async fn new(files: &[(&str, &str)], first_save: FirstSavePolicy) -> Self {
        let fs = MemoryFs::new();
        for (path, content) in files {
            fs.write(Path::new(path), content.as_bytes()).await.unwrap();
        }
        let config = RevisionConfig {
            first_save,
            ..RevisionConfig::default()
        };
        let engine = RevisionEngine::new(Arc::new(fs.clone()), Arc::new(CharDiffer), config).unwrap();
        let (broadcaster, rx) = ChannelBroadcaster::new();
        let dispatcher = Dispatcher::new(Arc::new(engine), Arc::new(broadcaster));
        Self { fs, dispatcher, rx }
    }

    async fn send(&self, user: &str, raw: Value) -> bool {
        let accepted = self.dispatcher.accept(user, &raw);
        let handled = accepted.is_handled();
        accepted.finish().await;
        handled
    }

    fn drain(&mut self) -> Vec<Delivery> {
        let mut out = Vec::new();
        while let Ok(delivery) = self.rx.try_recv() {
            out.push(delivery);
        }
        out
    }
}

fn save_message(path: &str, ts: i64, old: &str, new: &str) -> Value {
    let revision = RevisionRecord::from_diff(ts, old, new, &CharDiffer);
    json!({
        "command": "revisions",
        "subCommand": "saveRevision",
        "path": path,
        "revision": revision,
    })
}

#[tokio::test]
async fn test_ignores_other_commands() {
    let mut h = Harness::new(&[], FirstSavePolicy::SeedOnly).await;
    assert!(!h.send("u1", json!({"command": "save", "path": "a.txt"})).await);
    assert!(!h.send("u1", json!({"subCommand": "saveRevision"})).await);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_malformed_requests_are_dropped() {
    let mut h = Harness::new(&[("a.txt", "x")], FirstSavePolicy::SeedOnly).await;

    let accepted = h
        .dispatcher
        .accept("u1", &json!({"command": "revisions", "subCommand": "saveRevision"}));
    assert!(matches!(accepted, Accepted::Rejected));
    let accepted = h
        .dispatcher
        .accept("u1", &json!({"command": "revisions", "subCommand": "moveRevision", "path": "a.txt"}));
    assert!(matches!(accepted, Accepted::Rejected));
    let accepted = h.dispatcher.accept("u1", &json!({"command": "revisions"}));
    assert!(matches!(accepted, Accepted::Rejected));

    assert!(h.drain().is_empty());
    assert_eq!(h.fs.list_files().await, vec![Path::new("a.txt").to_path_buf()]);
}

#[tokio::test]
async fn test_save_confirms_to_workspace() {
    let mut h = Harness::new(&[("foo.txt", "hello")], FirstSavePolicy::SeedThenAppend).await;

    assert!(h.send("alice", save_message("foo.txt", LATER, "hello", "hello")).await);
    assert!(h.send("alice", save_message("foo.txt", LATER + 1, "hello", "hello world")).await);

    let deliveries = h.drain();
    assert_eq!(deliveries.len(), 2);
    for (delivery, ts) in deliveries.iter().zip([LATER, LATER + 1]) {
        assert_eq!(delivery.audience, Audience::Workspace);
        assert_eq!(
            delivery.message,
            json!({"type": "revision", "subtype": "confirmSave", "path": "foo.txt", "ts": ts})
        );
    }

    let engine = h.dispatcher.engine();
    assert_eq!(engine.content_at(Path::new("foo.txt"), None).await.unwrap(), "hello world");
}

#[tokio::test]
async fn test_forced_history_goes_to_requesting_user() {
    let mut h = Harness::new(&[("foo.txt", "hello")], FirstSavePolicy::SeedOnly).await;

    let mut message = save_message("foo.txt", 1, "", "hello");
    message["forceRevisionListResponse"] = json!(true);
    assert!(h.send("bob", message).await);

    let deliveries = h.drain();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].audience, Audience::Workspace);
    assert_eq!(deliveries[0].message["subtype"], "confirmSave");

    let history = &deliveries[1];
    assert_eq!(history.audience, Audience::User("bob".to_string()));
    assert_eq!(history.message["subtype"], "getRevisionHistory");
    assert_eq!(history.message["path"], "foo.txt");
    assert!(history.message.get("id").is_none());
    let revisions = history.message["body"]["revisions"].as_object().unwrap();
    assert_eq!(revisions.len(), 1);
    let seed = revisions.values().next().unwrap();
    assert_eq!(seed["length"], 5);
    assert_eq!(seed["silentsave"], true);
}

#[tokio::test]
async fn test_history_request_carries_id_and_next_action() {
    let mut h = Harness::new(&[("a.txt", "abc")], FirstSavePolicy::SeedOnly).await;

    assert!(
        h.send(
            "carol",
            json!({"command": "revisions", "subCommand": "getRevisionHistory", "path": "a.txt", "id": 7, "nextAction": "restore"}),
        )
        .await
    );
    assert!(
        h.send(
            "carol",
            json!({"command": "revisions", "subCommand": "getRevisionHistory", "path": "a.txt"}),
        )
        .await
    );

    let deliveries = h.drain();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].audience, Audience::User("carol".to_string()));
    assert_eq!(deliveries[0].message["id"], 7);
    assert_eq!(deliveries[0].message["nextAction"], "restore");
    // Created on first request, loaded from disk on the second.
    assert_eq!(deliveries[0].message["body"], deliveries[1].message["body"]);
    assert_eq!(deliveries[1].message.get("id"), Some(&Value::Null));
    assert!(deliveries[1].message.get("nextAction").is_none());
}

#[tokio::test]
async fn test_history_of_missing_file_sends_nothing() {
    let mut h = Harness::new(&[], FirstSavePolicy::SeedOnly).await;
    assert!(
        h.send(
            "dan",
            json!({"command": "revisions", "subCommand": "getRevisionHistory", "path": "ghost.txt"}),
        )
        .await
    );
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_real_file_contents() {
    let mut h = Harness::new(&[("live.txt", "on disk")], FirstSavePolicy::SeedOnly).await;

    assert!(
        h.send(
            "erin",
            json!({"command": "revisions", "subCommand": "getRealFileContents", "path": "live.txt", "nextAction": "diff"}),
        )
        .await
    );
    assert!(
        h.send(
            "erin",
            json!({"command": "revisions", "subCommand": "getRealFileContents", "path": "gone.txt"}),
        )
        .await
    );

    let deliveries = h.drain();
    assert_eq!(
        deliveries[0].message,
        json!({"type": "revision", "subtype": "getRealFileContents", "path": "live.txt", "nextAction": "diff", "contents": "on disk"})
    );
    assert_eq!(
        deliveries[1].message,
        json!({"type": "revision", "subtype": "getRealFileContents", "path": "gone.txt", "contents": null})
    );
}

#[tokio::test]
async fn test_move_remove_and_close() {
    let mut h = Harness::new(&[("a.txt", "a")], FirstSavePolicy::SeedOnly).await;
    let engine = h.dispatcher.engine().clone();
    let _ = engine.get_revisions(Path::new("a.txt")).await.unwrap();

    let accepted = h
        .dispatcher
        .accept("u", &json!({"command": "revisions", "subCommand": "closeFile", "path": "a.txt"}));
    assert!(matches!(accepted, Accepted::Completed));

    assert!(
        h.send(
            "u",
            json!({"command": "revisions", "subCommand": "moveRevision", "path": "a.txt", "newPath": "b/a.txt"}),
        )
        .await
    );
    assert!(h.fs.exists(Path::new(".revisions/b/a.txt.rev")).await.unwrap());
    assert!(!h.fs.exists(Path::new(".revisions/a.txt.rev")).await.unwrap());

    // Missing sources are silent.
    assert!(
        h.send(
            "u",
            json!({"command": "revisions", "subCommand": "moveRevision", "path": "zzz", "newPath": "yyy", "isFolder": true}),
        )
        .await
    );

    assert!(
        h.send(
            "u",
            json!({"command": "revisions", "subCommand": "removeRevision", "path": "b", "isFolder": true}),
        )
        .await
    );
    assert!(!h.fs.exists(Path::new(".revisions/b")).await.unwrap());
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_accept_order_is_save_order() {
    let mut h = Harness::new(&[("n.txt", "")], FirstSavePolicy::SeedThenAppend).await;

    // Accept every save before awaiting any of them.
    let mut previous = String::new();
    let mut accepted = Vec::new();
    for i in 0..10 {
        let next = format!("{previous}{i}");
        accepted.push(h.dispatcher.accept("u", &save_message("n.txt", LATER + i, &previous, &next)));
        previous = next;
    }
    for a in accepted {
        a.finish().await;
    }

    let engine = h.dispatcher.engine();
    assert_eq!(engine.content_at(Path::new("n.txt"), None).await.unwrap(), "0123456789");
    let confirmed: Vec<i64> = h
        .drain()
        .iter()
        .map(|d| d.message["ts"].as_i64().unwrap())
        .collect();
    let mut sorted = confirmed.clone();
    sorted.sort_unstable();
    assert_eq!(confirmed.len(), 10);
    assert_eq!(sorted, (0..10).map(|i| LATER + i).collect::<Vec<_>>());
}
