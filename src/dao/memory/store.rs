use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, GameEntity, GameListItemEntity, GameStateEntity, TeamEntity,
};
use crate::dao::storage::StorageResult;
use crate::dao::store::{InsertOutcome, SessionStore};

/// Per-game answer table with a unique index on (team, question).
#[derive(Default)]
struct AnswerTable {
    by_id: IndexMap<Uuid, AnswerEntity>,
    pairs: HashSet<(Uuid, Uuid)>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, GameEntity>,
    states: DashMap<Uuid, GameStateEntity>,
    teams: DashMap<Uuid, IndexMap<Uuid, TeamEntity>>,
    answers: DashMap<Uuid, AnswerTable>,
}

/// In-memory [`SessionStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.games.insert(game.id, game);
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.games.get(&id).map(|entry| entry.value().clone())) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut items: Vec<GameListItemEntity> = inner
                .games
                .iter()
                .map(|entry| GameListItemEntity {
                    id: entry.id,
                    name: entry.name.clone(),
                    status: entry.status,
                    updated_at: entry.updated_at,
                })
                .collect();
            items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(items)
        })
    }

    fn save_game_state(
        &self,
        game_id: Uuid,
        state: GameStateEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.states.insert(game_id, state);
            Ok(())
        })
    }

    fn find_game_state(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.states.get(&game_id).map(|entry| entry.value().clone())) })
    }

    fn delete_game_state(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.states.remove(&game_id);
            Ok(())
        })
    }

    fn upsert_team(
        &self,
        game_id: Uuid,
        team: TeamEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .teams
                .entry(game_id)
                .or_default()
                .insert(team.id, team);
            Ok(())
        })
    }

    fn find_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .teams
                .get(&game_id)
                .map(|entry| entry.values().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn create_answer(
        &self,
        game_id: Uuid,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            // The dashmap entry guard makes the uniqueness check and the
            // insert a single atomic step for this game.
            let mut table = inner.answers.entry(game_id).or_default();
            if !table.pairs.insert((answer.team_id, answer.question_id)) {
                return Ok(InsertOutcome::DuplicateAnswer);
            }
            table.by_id.insert(answer.id, answer);
            Ok(InsertOutcome::Inserted)
        })
    }

    fn update_answer(
        &self,
        game_id: Uuid,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some(mut table) = inner.answers.get_mut(&game_id) {
                table.by_id.insert(answer.id, answer);
            }
            Ok(())
        })
    }

    fn find_answer(
        &self,
        game_id: Uuid,
        answer_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .answers
                .get(&game_id)
                .and_then(|table| table.by_id.get(&answer_id).cloned()))
        })
    }

    fn find_answers(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .answers
                .get(&game_id)
                .map(|table| table.by_id.values().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn find_answers_for_team(
        &self,
        game_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .answers
                .get(&game_id)
                .map(|table| {
                    table
                        .by_id
                        .values()
                        .filter(|answer| answer.team_id == team_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}
