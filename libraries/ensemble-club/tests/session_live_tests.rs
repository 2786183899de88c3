//! Session gate transitions, live views and snapshot sync

mod common;

use common::*;
use ensemble_club::{ClubConfig, ProfileEdit, SessionGate, SessionState};
use ensemble_core::{AuthFailure, ClubError, Collection, SongDraft, Tab};
use std::time::Duration;
use tokio::time::timeout;

fn draft(title: &str) -> SongDraft {
    SongDraft {
        title: title.into(),
        artist: "Band".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn anonymous_gate_sees_nothing() {
    let (_store, club) = local_club().await;
    let gate = SessionGate::new(club);
    assert_eq!(gate.state().await, SessionState::Anonymous);
    assert!(gate.visible_tabs().await.is_empty());
    assert!(matches!(
        gate.require().await,
        Err(ClubError::Auth(AuthFailure::NotSignedIn))
    ));
}

#[tokio::test]
async fn admin_tab_follows_role() {
    let (_store, club) = local_club().await;
    member(&club, "민수").await;
    let gate = SessionGate::new(club);

    gate.login("민수", "pw").await.unwrap();
    assert_eq!(gate.visible_tabs().await, [Tab::Playlist, Tab::Board]);

    gate.login("admin", ADMIN_PASSWORD).await.unwrap();
    assert_eq!(
        gate.visible_tabs().await,
        [Tab::Playlist, Tab::Board, Tab::Admin]
    );
}

#[tokio::test]
async fn session_survives_restart_until_logout() {
    let (store, club) = local_club().await;
    member(&club, "민수").await;

    let gate = SessionGate::new(club.clone());
    let actor = gate.login("민수", "pw").await.unwrap();

    let restored = SessionGate::new(store.open(ClubConfig::local(ADMIN_PASSWORD)).await);
    assert_eq!(restored.restore().await.unwrap(), Some(actor));

    restored.logout().await.unwrap();
    let fresh = SessionGate::new(club);
    assert_eq!(fresh.restore().await.unwrap(), None);
}

#[tokio::test]
async fn name_only_session_is_restored() {
    let (store, club) = local_club().await;
    member(&club, "민수").await;
    store
        .store
        .save(Collection::Session, &serde_json::json!({ "name": "민수" }))
        .await
        .unwrap();

    let gate = SessionGate::new(club);
    let actor = gate.restore().await.unwrap().unwrap();
    assert_eq!(actor.name, "민수");
}

#[tokio::test]
async fn deleted_user_is_forced_out() {
    let (_store, club) = local_club().await;
    let member = member(&club, "민수").await;
    let gate = SessionGate::new(club.clone());
    gate.login("민수", "pw").await.unwrap();

    let admin = admin(&club).await;
    club.delete_user(&admin, &member.id).await.unwrap();

    assert_eq!(gate.revalidate().await.unwrap(), SessionState::Anonymous);
    assert!(gate.actor().await.is_none());
    assert_eq!(SessionGate::new(club).restore().await.unwrap(), None);
}

#[tokio::test]
async fn session_follows_rename() {
    let (_store, club) = local_club().await;
    let member = member(&club, "민수").await;
    let gate = SessionGate::new(club.clone());
    gate.login("민수", "pw").await.unwrap();

    let form = ProfileEdit {
        name: "민수2".into(),
        ..Default::default()
    };
    club.update_profile(&member, form).await.unwrap();

    let SessionState::Authenticated(actor) = gate.revalidate().await.unwrap() else {
        panic!("expected session to survive a rename");
    };
    assert_eq!(actor.name, "민수2");
    assert_eq!(gate.actor().await.unwrap().name, "민수2");
}

#[tokio::test]
async fn local_store_has_no_live_views() {
    let (_store, club) = local_club().await;
    assert!(matches!(
        club.watch_songs().await,
        Err(ClubError::Unsupported(_))
    ));
    assert!(matches!(club.spawn_sync().await, Err(ClubError::Unsupported(_))));
}

#[tokio::test]
async fn live_view_delivers_then_stops_on_logout() {
    let (_store, club) = cloud_club().await;
    let admin = admin(&club).await;
    let gate = SessionGate::new(club.clone());
    gate.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let mut view = gate.watch_songs().await.unwrap();
    let initial = view.next().await.unwrap();
    assert!(initial.is_empty());

    club.create_song(&admin, draft("A")).await.unwrap();
    let pushed = timeout(Duration::from_secs(5), view.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].parts.len(), 10);

    gate.logout().await.unwrap();
    assert!(view.next().await.is_none());
    assert!(!view.is_active());
}

#[tokio::test]
async fn anonymous_gate_cannot_watch() {
    let (_store, club) = cloud_club().await;
    let gate = SessionGate::new(club);
    assert!(matches!(
        gate.watch_posts().await,
        Err(ClubError::Auth(AuthFailure::NotSignedIn))
    ));
}

#[tokio::test]
async fn sync_replaces_mirrors_from_other_writers() {
    let store = TestStore::new(ensemble_core::Backend::Cloud).await;
    let reader = store
        .open(ClubConfig::cloud(ADMIN_PASSWORD, ADMIN_EMAIL))
        .await;
    let writer = store
        .open(ClubConfig::cloud(ADMIN_PASSWORD, ADMIN_EMAIL))
        .await;
    let _sync = reader.spawn_sync().await.unwrap();

    let admin = admin(&writer).await;
    writer.create_song(&admin, draft("Pushed")).await.unwrap();

    let seen = timeout(Duration::from_secs(5), async {
        loop {
            if reader.songs().await.iter().any(|s| s.title == "Pushed") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(seen.is_ok());
}

#[tokio::test]
async fn dropping_sync_handle_stops_tasks() {
    let (_store, club) = cloud_club().await;
    let handle = club.spawn_sync().await.unwrap();
    assert!(handle.is_running());
    drop(handle);
    // Club still usable after the tasks are gone
    let admin = admin(&club).await;
    club.create_song(&admin, draft("after")).await.unwrap();
}
