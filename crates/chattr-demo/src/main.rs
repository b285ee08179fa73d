//! Scripted two-user conversation over the in-process store: sign-in,
//! live feed, optimistic sends, directory view, teardown.

use anyhow::Result;
use tracing::info;

use chattr_client::{AuthProfile, ChatClient, filter_by_name};
use chattr_store::MemoryStore;
use chattr_types::UserId;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chattr=debug".into()),
        )
        .init();

    // Config
    let name_a = std::env::var("CHATTR_USER_A").unwrap_or_else(|_| "Alice".into());
    let name_b = std::env::var("CHATTR_USER_B").unwrap_or_else(|_| "Bob".into());

    let store = MemoryStore::new();

    let alice = ChatClient::sign_in(store.clone(), demo_profile("u-alice", &name_a)).await;
    let bob = ChatClient::sign_in(store.clone(), demo_profile("u-bob", &name_b)).await;
    info!(channel = %alice.channel_with(bob.uid()), "conversation key derived");

    // Print snapshots the way a chat view would re-render them: the initial
    // empty one plus one per delivered send, then tear the feed down.
    let mut feed = alice.open_feed(bob.uid());
    let printer = tokio::spawn(async move {
        for _ in 0..3 {
            let Some(messages) = feed.next().await else {
                info!("feed ended early");
                return;
            };
            let rendered: Vec<String> = messages
                .iter()
                .map(|m| format!("{}: {}", m.sender_id, m.text))
                .collect();
            info!(?rendered, "snapshot");
        }
        feed.close();
        info!("feed closed");
    });

    let mut composer = alice.composer(bob.uid());
    composer.set_draft(format!("hi {name_b}!"));
    composer.submit(&store).await?;

    bob.send(alice.uid(), &format!("hey {name_a}, got your message")).await?;
    alice.send(bob.uid(), "   ").await?; // dropped: whitespace only

    let mut directory = alice.directory();
    if let Some(users) = directory.next().await {
        info!(count = users.len(), "directory (excluding self)");
        for user in filter_by_name(&users, &name_b) {
            info!(uid = %user.uid, name = %user.name, "match");
        }
    }
    directory.close();

    if let Some(summary) = alice.channel_summary(bob.uid()) {
        info!(
            last_message = %summary.last_message,
            at = %summary.last_message_at,
            "channel summary"
        );
    }

    printer.await?;
    alice.sign_out();
    bob.sign_out();

    Ok(())
}

fn demo_profile(uid: &str, name: &str) -> AuthProfile {
    AuthProfile {
        uid: UserId::from(uid),
        name: name.to_owned(),
        email: format!("{uid}@chattr.dev"),
        photo_url: None,
    }
}
