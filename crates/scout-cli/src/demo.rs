//! Demo data for an empty database.

use chrono::{Duration, Utc};
use scout_shared::models::{GroupRole, Message, Town};
use scout_shared::onboarding::OnboardingStep;
use scout_shared::thread::{ChatType, ThreadKey};
use scout_shared::types::{GroupId, TownId, UserId};
use scout_store::Database;
use serde_json::json;

pub const DEMO_VIEWER: &str = "demo-viewer";

/// Whether the database already holds users.
pub fn is_seeded(db: &Database) -> anyhow::Result<bool> {
    let users: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(users > 0)
}

/// Populate friends, a group, towns, lounges, favorites and partial
/// onboarding for `viewer`.
pub fn seed(db: &mut Database, viewer: &UserId) -> anyhow::Result<()> {
    let now = Utc::now();
    let marta = UserId::new("marta");
    let joao = UserId::new("joao");
    let scout = UserId::scout();

    db.upsert_user(viewer, "You", now)?;
    db.upsert_user(&marta, "Marta Silva", now)?;
    db.upsert_user(&joao, "João Pereira", now)?;
    db.upsert_user(&scout, "Scout", now)?;
    db.add_friendship(viewer, &marta, now)?;
    db.add_friendship(viewer, &joao, now)?;

    let walkers = GroupId::new();
    db.create_group(walkers, "Algarve Walkers", &marta, now)?;
    db.add_group_member(walkers, viewer, GroupRole::Member)?;
    db.add_group_member(walkers, &joao, GroupRole::Moderator)?;

    let lagos = Town {
        id: TownId::new(),
        name: "Lagos".into(),
        country: "Portugal".into(),
    };
    let cuenca = Town {
        id: TownId::new(),
        name: "Cuenca".into(),
        country: "Ecuador".into(),
    };
    for town in [&lagos, &cuenca] {
        db.insert_town(town)?;
        db.insert_country(&town.country)?;
    }
    db.insert_country("Spain")?;

    let start = now - Duration::hours(2);
    let script: [(ThreadKey, &UserId, &str); 7] = [
        (ThreadKey::lounge(), &scout, "Welcome to the retirement lounge!"),
        (ThreadKey::lounge(), &marta, "Anyone been to Lagos in winter?"),
        (ThreadKey::lounge(), &joao, "Mild and sunny, highly recommend."),
        (ThreadKey::friend(viewer, &marta), &marta, "Coffee call this week?"),
        (ThreadKey::group(walkers), &marta, "Saturday walk starts at 9."),
        (ThreadKey::group(walkers), &joao, "I'll bring maps."),
        (ThreadKey::town(lagos.id), &joao, "Farmers market is on Saturdays."),
    ];
    for (i, (thread, author, body)) in script.into_iter().enumerate() {
        let message = Message::new(thread, author.clone(), body)
            .with_created_at(start + Duration::minutes(i as i64 * 5));
        db.insert_message(&message)?;
    }

    let walkers_ref = walkers.to_string();
    db.toggle_chat_favorite(viewer, ChatType::Group, &walkers_ref, "Algarve Walkers", now)?;
    db.toggle_chat_favorite(viewer, ChatType::CountryLounge, "Portugal", "Portugal", now)?;
    db.toggle_favorite_town(viewer, lagos.id, now)?;
    db.toggle_favorite_town(viewer, cuenca.id, now)?;

    db.save_onboarding_step(
        viewer,
        OnboardingStep::CurrentStatus,
        &json!({"retirement_timeline": "within_2_years"}),
        now,
    )?;
    db.save_onboarding_step(
        viewer,
        OnboardingStep::RegionPreferences,
        &json!({"regions": ["Southern Europe"]}),
        now,
    )?;

    tracing::info!(viewer = %viewer, "Demo data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_detected() {
        let mut db = Database::open_in_memory().unwrap();
        let viewer = UserId::new(DEMO_VIEWER);
        assert!(!is_seeded(&db).unwrap());
        seed(&mut db, &viewer).unwrap();
        assert!(is_seeded(&db).unwrap());

        assert_eq!(db.list_friends(&viewer).unwrap().len(), 2);
        assert_eq!(db.list_chat_favorites(&viewer).unwrap().len(), 2);
        assert_eq!(db.get_onboarding_progress(&viewer).unwrap().completed_count, 2);
    }
}
