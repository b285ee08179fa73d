/// Integration tests: two users exchanging messages through the in-process
/// store, exercising the full subscribe/publish loop the way a UI would.
use chattr_client::{AuthProfile, ChatClient, SendOutcome, filter_by_name};
use chattr_store::MemoryStore;
use chattr_types::UserId;

fn profile(uid: &str, name: &str) -> AuthProfile {
    AuthProfile {
        uid: UserId::from(uid),
        name: name.to_owned(),
        email: format!("{uid}@example.com"),
        photo_url: None,
    }
}

async fn pair(store: &MemoryStore) -> (ChatClient, ChatClient) {
    let alice = ChatClient::sign_in(store.clone(), profile("u1", "Alice")).await;
    let bob = ChatClient::sign_in(store.clone(), profile("u2", "Bob")).await;
    (alice, bob)
}

#[tokio::test]
async fn snapshots_grow_in_order_and_summary_converges() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;

    let mut feed = alice.open_feed(bob.uid());
    assert!(feed.next().await.unwrap().is_empty());

    alice.send(bob.uid(), "hi").await.unwrap();
    let snap = feed.next().await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].text, "hi");
    assert_eq!(snap[0].sender_id, *alice.uid());

    // Bob publishes into the same conversation; both derive the same key.
    bob.send(alice.uid(), "hey").await.unwrap();
    let snap = feed.next().await.unwrap();
    assert_eq!(snap.len(), 2);
    assert_eq!(snap[0].text, "hi");
    assert_eq!(snap[1].text, "hey");
    assert!(snap[0].timestamp < snap[1].timestamp);

    let summary = alice.channel_summary(bob.uid()).unwrap();
    assert_eq!(summary.last_message, "hey");
    assert_eq!(summary.last_message_at, snap[1].timestamp);
    assert!(summary.users.contains(alice.uid()));
    assert!(summary.users.contains(bob.uid()));

    // Both sides read the same summary document.
    assert_eq!(bob.channel_summary(alice.uid()).unwrap(), summary);
}

#[tokio::test]
async fn whitespace_only_send_appends_nothing() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;

    let mut feed = alice.open_feed(bob.uid());
    assert!(feed.next().await.unwrap().is_empty());

    let outcome = alice.send(bob.uid(), "   \n\t").await.unwrap();
    assert_eq!(outcome, SendOutcome::Empty);
    assert!(alice.channel_summary(bob.uid()).is_none());

    // The next snapshot is triggered by the real send and holds only it.
    alice.send(bob.uid(), "hello").await.unwrap();
    let snap = feed.next().await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].text, "hello");
}

#[tokio::test]
async fn summary_timestamp_matches_message() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;

    let outcome = alice.send(bob.uid(), "hello").await.unwrap();
    let SendOutcome::Sent { timestamp } = outcome else {
        panic!("expected a sent outcome");
    };

    let summary = alice.channel_summary(bob.uid()).unwrap();
    assert_eq!(summary.last_message, "hello");
    assert_eq!(summary.last_message_at, timestamp);
}

#[tokio::test]
async fn closed_feed_receives_nothing_and_detaches() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;

    let path = format!("channels/{}/messages", alice.channel_with(bob.uid()));
    let feed = alice.open_feed(bob.uid());
    assert_eq!(store.watcher_count(&path), 1);

    feed.close();
    assert_eq!(store.watcher_count(&path), 0);

    // Appends after teardown go nowhere near the closed handle.
    alice.send(bob.uid(), "anyone there?").await.unwrap();
}

#[tokio::test]
async fn switching_channels_tears_down_the_old_feed() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;
    let carol = ChatClient::sign_in(store.clone(), profile("u3", "Carol")).await;

    let feed = alice.open_feed(bob.uid());
    drop(feed);
    let mut feed = alice.open_feed(carol.uid());
    assert!(feed.next().await.unwrap().is_empty());

    // Traffic on the old conversation must not reach the new view.
    alice.send(bob.uid(), "for bob").await.unwrap();
    alice.send(carol.uid(), "for carol").await.unwrap();

    let snap = feed.next().await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].text, "for carol");
}

#[tokio::test]
async fn directory_excludes_self_across_live_changes() {
    let store = MemoryStore::new();
    let (alice, _bob) = pair(&store).await;

    let mut directory = alice.directory();
    let users = directory.next().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].uid, UserId::from("u2"));

    let _carol = ChatClient::sign_in(store.clone(), profile("u3", "Carol")).await;
    let users = directory.next().await.unwrap();
    let uids: Vec<&str> = users.iter().map(|u| u.uid.as_str()).collect();
    assert_eq!(uids, vec!["u2", "u3"]);

    let carols = filter_by_name(&users, "car");
    assert_eq!(carols.len(), 1);
    assert_eq!(carols[0].name, "Carol");
}

#[tokio::test]
async fn sign_in_survives_a_directory_write_failure() {
    let store = MemoryStore::new();
    store.fail_next_write_to("users");

    let alice = ChatClient::sign_in(store.clone(), profile("u1", "Alice")).await;
    assert_eq!(alice.uid(), &UserId::from("u1"));
    assert_eq!(alice.user().name, "Alice");
    assert!(alice.user().last_seen.is_none());

    // The directory write never landed; the next sign-in repairs it.
    assert!(store.get("users", "u1").is_none());
    let again = ChatClient::sign_in(store.clone(), profile("u1", "Alice")).await;
    assert!(again.user().last_seen.is_some());
}

#[tokio::test]
async fn composer_restores_draft_when_append_fails() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;

    let mut composer = alice.composer(bob.uid());
    composer.set_draft("hello bob");

    let path = format!("channels/{}/messages", composer.channel_id());
    store.fail_next_write_to(&path);

    assert!(composer.submit(&store).await.is_err());
    assert_eq!(composer.draft(), "hello bob");

    // Retry with the restored draft goes through and clears it.
    let outcome = composer.submit(&store).await.unwrap();
    assert!(matches!(outcome, SendOutcome::Sent { .. }));
    assert_eq!(composer.draft(), "");

    let summary = alice.channel_summary(bob.uid()).unwrap();
    assert_eq!(summary.last_message, "hello bob");
}

#[tokio::test]
async fn summary_failure_does_not_fail_the_send() {
    let store = MemoryStore::new();
    let (alice, bob) = pair(&store).await;

    let mut feed = alice.open_feed(bob.uid());
    assert!(feed.next().await.unwrap().is_empty());

    store.fail_next_write_to("channels");
    let outcome = alice.send(bob.uid(), "hello").await.unwrap();
    assert!(matches!(outcome, SendOutcome::Sent { .. }));

    // Message landed; summary is stale until the next send.
    assert_eq!(feed.next().await.unwrap().len(), 1);
    assert!(alice.channel_summary(bob.uid()).is_none());

    alice.send(bob.uid(), "again").await.unwrap();
    assert_eq!(alice.channel_summary(bob.uid()).unwrap().last_message, "again");
}
