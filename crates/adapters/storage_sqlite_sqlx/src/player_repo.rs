//! `SQLite` implementation of [`PlayerRepository`].

use std::collections::BTreeSet;
use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, FromRow, Row, SqliteConnection};

use scoreboard_app::ports::{ChangePublisher, PlayerRepository, RefreshOutcome, RefreshPlanner};
use scoreboard_domain::error::ScoreboardError;
use scoreboard_domain::id::{PlayerId, TeamId};
use scoreboard_domain::ordering::PlayerOrdering;
use scoreboard_domain::player::Player;
use scoreboard_domain::table::{Table, TableChange, TableSet};
use scoreboard_domain::team::Team;

use crate::error::StorageError;
use crate::pool::Database;
use crate::team_repo;

/// Wrapper for converting database rows into domain [`Player`].
struct Wrapper(Player);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Player> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let score: i64 = row.try_get("score")?;
        let team_id: i64 = row.try_get("teamId")?;

        Ok(Self(Player {
            id: Some(PlayerId::from_row_id(id)),
            name,
            score,
            team_id: Some(TeamId::from_row_id(team_id)),
        }))
    }
}

const INSERT: &str = "INSERT INTO player (name, score, teamId) VALUES (?, ?, ?)";
const INSERT_WITH_ID: &str = "INSERT INTO player (id, name, score, teamId) VALUES (?, ?, ?, ?)";
const UPDATE: &str = "UPDATE player SET name = ?, score = ?, teamId = ? WHERE id = ?";
const SELECT_BY_ID: &str = "SELECT id, name, score, teamId FROM player WHERE id = ?";
const SELECT_BY_ROWID: &str = "SELECT id, name, score, teamId FROM player ORDER BY id";
const SELECT_BY_NAME: &str = "SELECT id, name, score, teamId FROM player ORDER BY name, id";
const SELECT_BY_SCORE: &str =
    "SELECT id, name, score, teamId FROM player ORDER BY score DESC, name, id";
const SELECT_BY_TEAM_NAME: &str = "SELECT player.id, player.name, player.score, player.teamId \
     FROM player JOIN team ON team.id = player.teamId \
     ORDER BY team.teamName, player.score DESC, player.name, player.id";
const COUNT: &str = "SELECT COUNT(*) FROM player";
const DELETE_BY_ID: &str = "DELETE FROM player WHERE id = ?";
const DELETE_ALL: &str = "DELETE FROM player";

const fn select_ordered(ordering: PlayerOrdering) -> &'static str {
    match ordering {
        PlayerOrdering::ByName => SELECT_BY_NAME,
        PlayerOrdering::ByScore => SELECT_BY_SCORE,
        PlayerOrdering::ByTeamName => SELECT_BY_TEAM_NAME,
    }
}

fn player_change() -> TableChange {
    TableChange::new(TableSet::single(Table::Player))
}

/// Insert or update `player` on an open transaction.
///
/// Updating an identity that matches no row inserts it under that identity.
async fn save_in(conn: &mut SqliteConnection, mut player: Player) -> Result<Player, StorageError> {
    let team_id = player.team_id.map(TeamId::get);
    match player.id {
        None => {
            let id = sqlx::query(INSERT)
                .bind(&player.name)
                .bind(player.score)
                .bind(team_id)
                .execute(&mut *conn)
                .await?
                .last_insert_rowid();
            player.id = Some(PlayerId::from_row_id(id));
        }
        Some(id) => {
            let updated = sqlx::query(UPDATE)
                .bind(&player.name)
                .bind(player.score)
                .bind(team_id)
                .bind(id.get())
                .execute(&mut *conn)
                .await?
                .rows_affected();
            if updated == 0 {
                sqlx::query(INSERT_WITH_ID)
                    .bind(id.get())
                    .bind(&player.name)
                    .bind(player.score)
                    .bind(team_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }
    Ok(player)
}

async fn fetch_teams_in(conn: &mut SqliteConnection) -> Result<Vec<Team>, StorageError> {
    let rows: Vec<team_repo::Wrapper> = sqlx::query_as(team_repo::SELECT_ALL)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|w| w.0).collect())
}

/// `SQLite`-backed player repository.
pub struct SqlitePlayerRepository<P> {
    db: Arc<Database>,
    publisher: P,
}

impl<P> SqlitePlayerRepository<P> {
    /// Create a new repository writing through `db` and announcing to `publisher`.
    #[must_use]
    pub fn new(db: Arc<Database>, publisher: P) -> Self {
        Self { db, publisher }
    }
}

impl<P: ChangePublisher + Send + Sync> PlayerRepository for SqlitePlayerRepository<P> {
    async fn save(&self, player: Player) -> Result<Player, ScoreboardError> {
        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let saved = save_in(&mut tx, player).await?;
        tx.commit().await.map_err(StorageError::from)?;

        self.publisher.publish(player_change()).await?;
        Ok(saved)
    }

    async fn save_all(&self, players: Vec<Player>) -> Result<Vec<Player>, ScoreboardError> {
        if players.is_empty() {
            return Ok(players);
        }

        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let mut saved = Vec::with_capacity(players.len());
        for player in players {
            saved.push(save_in(&mut tx, player).await?);
        }
        tx.commit().await.map_err(StorageError::from)?;

        self.publisher.publish(player_change()).await?;
        Ok(saved)
    }

    async fn get_by_id(&self, id: PlayerId) -> Result<Option<Player>, ScoreboardError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn fetch(&self, ordering: PlayerOrdering) -> Result<Vec<Player>, ScoreboardError> {
        let rows: Vec<Wrapper> = sqlx::query_as(select_ordered(ordering))
            .fetch_all(self.db.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn count(&self) -> Result<u64, ScoreboardError> {
        let count: i64 = sqlx::query_scalar(COUNT)
            .fetch_one(self.db.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(count.unsigned_abs())
    }

    async fn delete(&self, ids: &BTreeSet<PlayerId>) -> Result<u64, ScoreboardError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let deleted = team_repo::delete_ids_in(&mut tx, "player", &ids)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        if deleted > 0 {
            self.publisher.publish(player_change()).await?;
        }
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<u64, ScoreboardError> {
        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let deleted = sqlx::query(DELETE_ALL)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?
            .rows_affected();
        tx.commit().await.map_err(StorageError::from)?;

        if deleted > 0 {
            self.publisher.publish(player_change()).await?;
        }
        Ok(deleted)
    }

    async fn apply_planned<R: RefreshPlanner + Send>(
        &self,
        mut planner: R,
    ) -> Result<RefreshOutcome, ScoreboardError> {
        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let mut outcome = RefreshOutcome::default();

        let mut teams = fetch_teams_in(&mut tx).await?;
        let seeds = planner.seed_teams(&teams);
        if !seeds.is_empty() {
            for team in seeds {
                team_repo::save_in(&mut tx, Team { id: None, ..team }).await?;
                outcome.teams_inserted += 1;
            }
            teams = fetch_teams_in(&mut tx).await?;
        }

        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_ROWID)
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let players: Vec<Player> = rows.into_iter().map(|w| w.0).collect();

        let plan = planner.plan(&teams, &players);
        for player in plan.insert {
            save_in(&mut tx, Player { id: None, ..player }).await?;
            outcome.inserted += 1;
        }
        for id in plan.delete {
            let deleted = sqlx::query(DELETE_BY_ID)
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?
                .rows_affected();
            outcome.deleted += usize::from(deleted > 0);
        }
        for player in plan.update.into_iter().filter(Player::is_persisted) {
            save_in(&mut tx, player).await?;
            outcome.updated += 1;
        }
        tx.commit().await.map_err(StorageError::from)?;

        let mut tables = TableSet::empty();
        if outcome.teams_inserted > 0 {
            tables.insert(Table::Team);
        }
        if outcome.inserted + outcome.deleted + outcome.updated > 0 {
            tables.insert(Table::Player);
        }
        if !tables.is_empty() {
            self.publisher.publish(TableChange::new(tables)).await?;
        }

        tracing::debug!(
            teams_inserted = outcome.teams_inserted,
            inserted = outcome.inserted,
            deleted = outcome.deleted,
            updated = outcome.updated,
            "applied planned changes"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use scoreboard_app::change_bus::InProcessChangeBus;
    use scoreboard_app::live_query::LiveQuery;
    use scoreboard_app::ports::{ChangeSubscriber, RefreshPlan, TeamRepository};
    use sqlx::error::ErrorKind;
    use tokio_stream::StreamExt;

    use crate::error::constraint_violation;
    use crate::pool::tests::memory_database;
    use crate::team_repo::SqliteTeamRepository;

    type Bus = Arc<InProcessChangeBus>;

    struct Fixture {
        players: Arc<SqlitePlayerRepository<Bus>>,
        teams: SqliteTeamRepository<Bus>,
        bus: Bus,
    }

    async fn setup() -> Fixture {
        let bus = Arc::new(InProcessChangeBus::new(64));
        let db = Arc::new(memory_database().await);
        Fixture {
            players: Arc::new(SqlitePlayerRepository::new(Arc::clone(&db), Arc::clone(&bus))),
            teams: SqliteTeamRepository::new(db, Arc::clone(&bus)),
            bus,
        }
    }

    impl Fixture {
        async fn team(&self, name: &str) -> TeamId {
            let team = Team {
                id: None,
                name: name.to_string(),
                first_team_date: NaiveDate::from_ymd_opt(2021, 9, 4).unwrap(),
            };
            self.teams.save(team).await.unwrap().id.unwrap()
        }
    }

    fn player(name: &str, score: i64, team_id: TeamId) -> Player {
        Player {
            id: None,
            name: name.to_string(),
            score,
            team_id: Some(team_id),
        }
    }

    fn names(players: &[Player]) -> Vec<&str> {
        players.iter().map(|p| p.name.as_str()).collect()
    }

    /// Planner returning a fixed plan.
    struct FixedPlanner {
        seeds: Vec<Team>,
        plan: RefreshPlan,
        seen_players: usize,
    }

    impl RefreshPlanner for &mut FixedPlanner {
        fn seed_teams(&mut self, _existing: &[Team]) -> Vec<Team> {
            std::mem::take(&mut self.seeds)
        }

        fn plan(&mut self, _teams: &[Team], players: &[Player]) -> RefreshPlan {
            self.seen_players = players.len();
            std::mem::take(&mut self.plan)
        }
    }

    #[tokio::test]
    async fn should_assign_id_on_insert_and_keep_it_on_update() {
        let fx = setup().await;
        let red = fx.team("Red").await;

        let mut saved = fx.players.save(player("Arthur", 10, red)).await.unwrap();
        let id = saved.id.unwrap();
        saved.score = 40;
        let updated = fx.players.save(saved).await.unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(fx.players.count().await.unwrap(), 1);
        let fetched = fx.players.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.score, 40);
    }

    #[tokio::test]
    async fn should_reinsert_saved_player_whose_row_was_deleted() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let saved = fx.players.save(player("Arthur", 10, red)).await.unwrap();
        fx.players.delete_all().await.unwrap();

        fx.players.save(saved.clone()).await.unwrap();

        assert_eq!(
            fx.players.get_by_id(saved.id.unwrap()).await.unwrap(),
            Some(saved)
        );
    }

    #[tokio::test]
    async fn should_reject_player_without_team() {
        let fx = setup().await;
        let orphan = Player {
            team_id: None,
            ..player("Arthur", 10, TeamId::from_row_id(1))
        };

        let err = fx.players.save(orphan).await.unwrap_err();

        assert!(matches!(
            constraint_violation(&err),
            Some(ErrorKind::NotNullViolation)
        ));
        assert_eq!(fx.players.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_reject_player_of_unknown_team() {
        let fx = setup().await;

        let err = fx
            .players
            .save(player("Arthur", 10, TeamId::from_row_id(42)))
            .await
            .unwrap_err();

        assert!(matches!(
            constraint_violation(&err),
            Some(ErrorKind::ForeignKeyViolation)
        ));
    }

    #[tokio::test]
    async fn should_save_all_atomically() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let mut changes = fx.bus.subscribe();

        let result = fx
            .players
            .save_all(vec![
                player("Arthur", 10, red),
                player("Barbara", 20, TeamId::from_row_id(42)),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(fx.players.count().await.unwrap(), 0);
        assert!(changes.try_recv().is_err());

        let saved = fx
            .players
            .save_all(vec![player("Arthur", 10, red), player("Barbara", 20, red)])
            .await
            .unwrap();
        assert!(saved.iter().all(Player::is_persisted));
        assert_eq!(changes.try_recv().unwrap(), player_change());
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_order_by_score_then_name_ignoring_case() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        fx.players
            .save_all(vec![
                player("bob", 50, red),
                player("Alice", 50, red),
                player("Zoe", 90, red),
                player("alice", 50, red),
                player("Craig", 10, red),
            ])
            .await
            .unwrap();

        let players = fx.players.fetch(PlayerOrdering::ByScore).await.unwrap();

        assert_eq!(names(&players), ["Zoe", "Alice", "alice", "bob", "Craig"]);
    }

    #[tokio::test]
    async fn should_order_by_name_ignoring_case() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        fx.players
            .save_all(vec![
                player("craig", 1, red),
                player("Barbara", 2, red),
                player("arthur", 3, red),
            ])
            .await
            .unwrap();

        let players = fx.players.fetch(PlayerOrdering::ByName).await.unwrap();

        assert_eq!(names(&players), ["arthur", "Barbara", "craig"]);
    }

    #[tokio::test]
    async fn should_order_by_team_name_then_score() {
        let fx = setup().await;
        let yellow = fx.team("yellow").await;
        let blue = fx.team("Blue").await;
        fx.players
            .save_all(vec![
                player("Arthur", 10, yellow),
                player("Barbara", 30, blue),
                player("Craig", 20, yellow),
                player("David", 5, blue),
            ])
            .await
            .unwrap();

        let players = fx.players.fetch(PlayerOrdering::ByTeamName).await.unwrap();

        assert_eq!(names(&players), ["Barbara", "David", "Craig", "Arthur"]);
    }

    #[tokio::test]
    async fn should_delete_only_existing_ids() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let saved = fx
            .players
            .save_all(vec![player("Arthur", 10, red), player("Barbara", 20, red)])
            .await
            .unwrap();
        let mut changes = fx.bus.subscribe();

        let deleted = fx
            .players
            .delete(&BTreeSet::from([
                saved[0].id.unwrap(),
                PlayerId::from_row_id(999),
            ]))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(fx.players.count().await.unwrap(), 1);
        assert_eq!(changes.try_recv().unwrap(), player_change());

        assert_eq!(fx.players.delete(&BTreeSet::new()).await.unwrap(), 0);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_delete_id_sets_larger_than_the_bind_limit() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let saved = fx
            .players
            .save_all((0..1_200).map(|n| player(&format!("P{n}"), n, red)).collect())
            .await
            .unwrap();
        let mut changes = fx.bus.subscribe();

        let mut ids: BTreeSet<PlayerId> = (100_000..140_000).map(PlayerId::from_row_id).collect();
        ids.extend(saved.iter().skip(1).filter_map(|p| p.id));

        let deleted = fx.players.delete(&ids).await.unwrap();

        assert_eq!(deleted, 1_199);
        let left = fx.players.fetch(PlayerOrdering::ByName).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, saved[0].id);
        assert_eq!(changes.try_recv().unwrap(), player_change());
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_delete_all_players_and_keep_teams() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        fx.players
            .save_all(vec![player("Arthur", 10, red), player("Barbara", 20, red)])
            .await
            .unwrap();

        assert_eq!(fx.players.delete_all().await.unwrap(), 2);
        assert!(fx.players.fetch(PlayerOrdering::ByName).await.unwrap().is_empty());
        assert_eq!(fx.teams.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_apply_plan_in_one_transaction() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let saved = fx
            .players
            .save_all(vec![player("Arthur", 10, red), player("Barbara", 20, red)])
            .await
            .unwrap();
        let mut changes = fx.bus.subscribe();
        let mut planner = FixedPlanner {
            seeds: Vec::new(),
            plan: RefreshPlan {
                insert: vec![player("Craig", 30, red)],
                delete: vec![saved[0].id.unwrap()],
                update: vec![Player {
                    score: 70,
                    ..saved[1].clone()
                }],
            },
            seen_players: 0,
        };

        let outcome = fx.players.apply_planned(&mut planner).await.unwrap();

        assert_eq!(planner.seen_players, 2);
        assert_eq!(
            outcome,
            RefreshOutcome {
                teams_inserted: 0,
                inserted: 1,
                deleted: 1,
                updated: 1,
            }
        );
        let players = fx.players.fetch(PlayerOrdering::ByScore).await.unwrap();
        assert_eq!(names(&players), ["Barbara", "Craig"]);
        assert_eq!(players[0].score, 70);
        assert_eq!(changes.try_recv().unwrap(), player_change());
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_seed_teams_before_planning_players() {
        let fx = setup().await;
        let mut changes = fx.bus.subscribe();
        let mut planner = FixedPlanner {
            seeds: vec![Team::builder().name("Red").build().unwrap()],
            plan: RefreshPlan::default(),
            seen_players: 0,
        };

        let outcome = fx.players.apply_planned(&mut planner).await.unwrap();

        assert_eq!(outcome.teams_inserted, 1);
        assert_eq!(fx.teams.count().await.unwrap(), 1);
        assert_eq!(
            changes.try_recv().unwrap(),
            TableChange::new(TableSet::single(Table::Team))
        );
    }

    #[tokio::test]
    async fn should_roll_back_plan_when_a_write_fails() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let mut planner = FixedPlanner {
            seeds: Vec::new(),
            plan: RefreshPlan {
                insert: vec![
                    player("Arthur", 10, red),
                    player("Ghost", 10, TeamId::from_row_id(404)),
                ],
                ..RefreshPlan::default()
            },
            seen_players: 0,
        };

        let result = fx.players.apply_planned(&mut planner).await;

        assert!(result.is_err());
        assert_eq!(fx.players.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_not_announce_empty_plan() {
        let fx = setup().await;
        fx.team("Red").await;
        let mut changes = fx.bus.subscribe();
        let mut planner = FixedPlanner {
            seeds: Vec::new(),
            plan: RefreshPlan::default(),
            seen_players: 0,
        };

        let outcome = fx.players.apply_planned(&mut planner).await.unwrap();

        assert!(outcome.is_empty());
        assert!(changes.try_recv().is_err());
    }

    fn observe(fx: &Fixture) -> LiveQuery<Player> {
        let repo = Arc::clone(&fx.players);
        LiveQuery::spawn(
            fx.bus.subscribe(),
            PlayerOrdering::ByScore.observed_tables(),
            move || {
                let repo = Arc::clone(&repo);
                async move { repo.fetch(PlayerOrdering::ByScore).await }
            },
        )
    }

    #[tokio::test]
    async fn should_deliver_once_per_committed_transaction() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        let mut live = observe(&fx);
        assert!(live.next().await.unwrap().unwrap().is_empty());

        fx.players
            .save_all(vec![player("Arthur", 10, red), player("Barbara", 20, red)])
            .await
            .unwrap();

        let delivered = live.next().await.unwrap().unwrap();
        assert_eq!(names(&delivered), ["Barbara", "Arthur"]);
        let pending = tokio::time::timeout(std::time::Duration::from_millis(50), live.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn should_deliver_after_team_cascade() {
        let fx = setup().await;
        let red = fx.team("Red").await;
        fx.players.save(player("Arthur", 10, red)).await.unwrap();
        let mut live = observe(&fx);
        assert_eq!(live.next().await.unwrap().unwrap().len(), 1);

        fx.teams.delete(&BTreeSet::from([red])).await.unwrap();

        assert!(live.next().await.unwrap().unwrap().is_empty());
    }
}
