//! `SQLite` implementation of [`TeamRepository`].

use std::collections::BTreeSet;
use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, FromRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use scoreboard_app::ports::{ChangePublisher, TeamRepository};
use scoreboard_domain::error::ScoreboardError;
use scoreboard_domain::id::TeamId;
use scoreboard_domain::table::{Table, TableChange, TableSet};
use scoreboard_domain::team::Team;
use scoreboard_domain::time::{format_date, parse_date};

use crate::error::StorageError;
use crate::pool::Database;

/// Wrapper for converting database rows into domain [`Team`].
pub(crate) struct Wrapper(pub(crate) Team);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Team> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("teamName")?;
        let first_team_date: String = row.try_get("firstTeamDate")?;

        let first_team_date =
            parse_date(&first_team_date).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Team {
            id: Some(TeamId::from_row_id(id)),
            name,
            first_team_date,
        }))
    }
}

const INSERT: &str = "INSERT INTO team (teamName, firstTeamDate) VALUES (?, ?)";
const INSERT_WITH_ID: &str = "INSERT INTO team (id, teamName, firstTeamDate) VALUES (?, ?, ?)";
const UPDATE: &str = "UPDATE team SET teamName = ?, firstTeamDate = ? WHERE id = ?";
const SELECT_BY_ID: &str = "SELECT id, teamName, firstTeamDate FROM team WHERE id = ?";
pub(crate) const SELECT_ALL: &str =
    "SELECT id, teamName, firstTeamDate FROM team ORDER BY teamName, id";
const COUNT: &str = "SELECT COUNT(*) FROM team";
const DELETE_ALL: &str = "DELETE FROM team";

/// Deleting teams cascades to their players.
const DELETE_TABLES: TableSet = TableSet::single(Table::Team).with(Table::Player);

/// Most ids bound by a single `DELETE`. `SQLite` caps the number of bound
/// variables per statement.
const DELETE_CHUNK_SIZE: usize = 500;

/// Delete the rows of `table` whose id is in `ids` on an open transaction.
///
/// Large sets are split over several statements.
pub(crate) async fn delete_ids_in(
    conn: &mut SqliteConnection,
    table: &str,
    ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let mut deleted = 0;
    for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
        let mut query = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {table} WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        deleted += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(deleted)
}

/// Insert or update `team` on an open transaction.
pub(crate) async fn save_in(
    conn: &mut SqliteConnection,
    mut team: Team,
) -> Result<Team, StorageError> {
    let date = format_date(team.first_team_date);
    match team.id {
        None => {
            let id = sqlx::query(INSERT)
                .bind(&team.name)
                .bind(&date)
                .execute(&mut *conn)
                .await?
                .last_insert_rowid();
            team.id = Some(TeamId::from_row_id(id));
        }
        Some(id) => {
            let updated = sqlx::query(UPDATE)
                .bind(&team.name)
                .bind(&date)
                .bind(id.get())
                .execute(&mut *conn)
                .await?
                .rows_affected();
            if updated == 0 {
                sqlx::query(INSERT_WITH_ID)
                    .bind(id.get())
                    .bind(&team.name)
                    .bind(&date)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }
    Ok(team)
}

/// `SQLite`-backed team repository.
pub struct SqliteTeamRepository<P> {
    db: Arc<Database>,
    publisher: P,
}

impl<P> SqliteTeamRepository<P> {
    /// Create a new repository writing through `db` and announcing to `publisher`.
    #[must_use]
    pub fn new(db: Arc<Database>, publisher: P) -> Self {
        Self { db, publisher }
    }
}

impl<P: ChangePublisher + Send + Sync> TeamRepository for SqliteTeamRepository<P> {
    async fn save(&self, team: Team) -> Result<Team, ScoreboardError> {
        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let saved = save_in(&mut tx, team).await?;
        tx.commit().await.map_err(StorageError::from)?;

        self.publisher
            .publish(TableChange::new(TableSet::single(Table::Team)))
            .await?;
        Ok(saved)
    }

    async fn get_by_id(&self, id: TeamId) -> Result<Option<Team>, ScoreboardError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn fetch_all(&self) -> Result<Vec<Team>, ScoreboardError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
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

    async fn delete(&self, ids: &BTreeSet<TeamId>) -> Result<u64, ScoreboardError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let mut writer = self.db.writer().await;
        let mut tx = writer.begin().await.map_err(StorageError::from)?;
        let deleted = delete_ids_in(&mut tx, "team", &ids)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        if deleted > 0 {
            self.publisher
                .publish(TableChange::new(DELETE_TABLES))
                .await?;
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
            self.publisher
                .publish(TableChange::new(DELETE_TABLES))
                .await?;
        }
        Ok(deleted)
    }
}
