use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, GameEntity, GameListItemEntity, GameStateEntity, TeamEntity,
};
use crate::dao::storage::StorageResult;

/// Outcome of an answer insertion attempt.
///
/// Uniqueness of the (team, question) pair is enforced at write time by the
/// backend so that two racing submissions can never both land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The answer was created.
    Inserted,
    /// An answer already exists for this (team, question) pair.
    DuplicateAnswer,
}

/// Abstraction over the durable record store backing live sessions.
///
/// Backends only provide consistent single-record reads and writes; logical
/// invariants that span records (pool consumption together with answer
/// creation, pointer moves together with replenishment) are protected by the
/// per-session serialization gate in [`crate::state::AppState`].
pub trait SessionStore: Send + Sync {
    /// Persist a full game definition, overwriting any previous version.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game definition by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// List stored games, most recently updated first.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;

    /// Overwrite the session pointer for a game.
    fn save_game_state(
        &self,
        game_id: Uuid,
        state: GameStateEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the session pointer for a game.
    fn find_game_state(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;
    /// Remove the session pointer when a session is torn down.
    fn delete_game_state(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert or update a team registration for a game.
    fn upsert_team(
        &self,
        game_id: Uuid,
        team: TeamEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// All teams registered for a game, in join order.
    fn find_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;

    /// Insert an answer, refusing a second answer for the same (team, question).
    fn create_answer(
        &self,
        game_id: Uuid,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    /// Overwrite an existing answer (adjudication updates).
    fn update_answer(
        &self,
        game_id: Uuid,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a single answer by id.
    fn find_answer(
        &self,
        game_id: Uuid,
        answer_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>>;
    /// All answers recorded for a game.
    fn find_answers(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
    /// All answers recorded for one team of a game.
    fn find_answers_for_team(
        &self,
        game_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;

    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
