//! In-memory reference backend for [`SessionStore`].
//!
//! Keeps every record behind sharded [`DashMap`]s so independent sessions never
//! contend. This is the backend the binary installs by default and the one the
//! test suite runs against; a database-backed store only needs to implement the
//! same trait.

mod store;

pub use store::MemoryStore;

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::MemoryStore;
    use crate::dao::models::{AnswerEntity, AnswerValueEntity, TeamEntity};
    use crate::dao::store::{InsertOutcome, SessionStore};

    fn answer(team_id: Uuid, question_id: Uuid) -> AnswerEntity {
        AnswerEntity {
            id: Uuid::new_v4(),
            team_id,
            question_id,
            value: AnswerValueEntity::Text {
                value: "42".into(),
            },
            points_used: None,
            is_correct: None,
            awarded_points: 0,
            items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn second_answer_for_same_pair_is_rejected() {
        let store = MemoryStore::new();
        let game_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();

        let first = store
            .create_answer(game_id, answer(team_id, question_id))
            .await
            .unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let second = store
            .create_answer(game_id, answer(team_id, question_id))
            .await
            .unwrap();
        assert_eq!(second, InsertOutcome::DuplicateAnswer);

        let stored = store.find_answers(game_id).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn same_question_different_teams_both_land() {
        let store = MemoryStore::new();
        let game_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();

        for _ in 0..3 {
            let outcome = store
                .create_answer(game_id, answer(Uuid::new_v4(), question_id))
                .await
                .unwrap();
            assert_eq!(outcome, InsertOutcome::Inserted);
        }

        assert_eq!(store.find_answers(game_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn teams_keep_join_order_on_upsert() {
        let store = MemoryStore::new();
        let game_id = Uuid::new_v4();

        let first = TeamEntity {
            id: Uuid::new_v4(),
            name: "Alpha".into(),
            joined_at: OffsetDateTime::now_utc(),
        };
        let second = TeamEntity {
            id: Uuid::new_v4(),
            name: "Beta".into(),
            joined_at: OffsetDateTime::now_utc(),
        };

        store.upsert_team(game_id, first.clone()).await.unwrap();
        store.upsert_team(game_id, second.clone()).await.unwrap();
        store
            .upsert_team(
                game_id,
                TeamEntity {
                    name: "Alpha Prime".into(),
                    ..first.clone()
                },
            )
            .await
            .unwrap();

        let teams = store.find_teams(game_id).await.unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].id, first.id);
        assert_eq!(teams[0].name, "Alpha Prime");
        assert_eq!(teams[1].id, second.id);
    }
}
