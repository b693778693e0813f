//! Walks the u1/u2 friendship lifecycle against the configured backends.
//!
//! With the `memory` store the two users are registered on the fly. With the
//! `mysql` store they must already exist in the `user` table
//! (see `migrations/0001_friend_graph.sql`).
//!
//! $ cargo run --bin graph_demo -- --settings=settings/dev.toml
use rapport::app::App;
use rapport::domain_model::UserId;
use rapport::logger::*;
use rapport::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap()?;

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let app = App::try_new(&project_settings).await?;

    let u1 = UserId::from("u1");
    let u2 = UserId::from("u2");
    if let Some(store) = app.memory_store() {
        store.register_user(u1.clone()).await;
        store.register_user(u2.clone()).await;
    }
    let graph = app.graph_store();
    for user in [&u1, &u2] {
        if !graph.user_exists(user).await? {
            anyhow::bail!("user {user} has no active account");
        }
    }

    let friends = app.friendship_service.clone();

    app.session.sign_in(&u1)?;
    friends.send_friend_request(&u1, &u2).await?;
    let pending = friends.has_pending_request(&u1, &u2).await?;
    info!(pending, "u1 -> u2 request");

    app.session.sign_in(&u2)?;
    let incoming = friends.list_incoming_requests(&u2).await?;
    info!(?incoming, "u2 incoming");
    friends.accept_friend_request(&u2, &u1).await?;
    info!(friends = ?friends.list_friends(&u2).await?, "u2 friends");

    app.session.sign_in(&u1)?;
    info!(friends = ?friends.list_friends(&u1).await?, "u1 friends");
    info!(state = ?friends.relationship_state(&u1, &u2).await?, "u1/u2");

    friends.remove_friend(&u1, &u2).await?;
    info!(friends = ?friends.list_friends(&u1).await?, "u1 friends after removal");

    // a second removal is a conflict, not a no-op
    if let Err(e) = friends.remove_friend(&u1, &u2).await {
        info!(kind = %e.kind(), "second removal: {e}");
    }

    app.session.sign_out();
    app.shutdown().await;

    Ok(())
}
