//! PostgreSQL implementations of the tournament store and player repository.

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::postgres::{PgListener, PgRow};
use sqlx::{PgPool, Row};
use tokio::sync::mpsc;

use crate::stats::{PlayerRecord, PlayerRepository, StatLine, StatsError, StatsResult};
use crate::stats::{generate_player_id, repository::clean_name};
use crate::sync::remote::{CHANGE_BUFFER, ChangeStream, RemoteDocument, RemoteStore, Revision};
use crate::sync::{SyncError, SyncResult};
use crate::tournament::models::{Tournament, TournamentId};

/// Notification channel for tournament writes; payload is `<id>:<revision>`
pub const CHANGE_CHANNEL: &str = "tournament_changes";

/// Split a change notification payload
pub fn parse_change_payload(payload: &str) -> Option<(&str, Revision)> {
    let (id, revision) = payload.rsplit_once(':')?;
    Some((id, revision.parse().ok()?))
}

/// Remote tournament store backed by the `tournaments` table
#[derive(Clone)]
pub struct PgTournamentStore {
    pool: PgPool,
}

impl PgTournamentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteStore for PgTournamentStore {
    async fn fetch(&self, id: &str) -> SyncResult<Option<RemoteDocument>> {
        let row = sqlx::query("SELECT document, revision FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: serde_json::Value = row.try_get("document")?;
                Ok(Some(RemoteDocument {
                    tournament: serde_json::from_value(document)?,
                    revision: row.try_get("revision")?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, tournament: &Tournament) -> SyncResult<Revision> {
        let document = serde_json::to_value(tournament)?;
        let mut tx = self.pool.begin().await?;

        let revision: Revision = sqlx::query(
            r#"
            INSERT INTO tournaments (id, document, revision, updated_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (id) DO UPDATE
            SET document = EXCLUDED.document,
                revision = tournaments.revision + 1,
                updated_at = NOW()
            RETURNING revision
            "#,
        )
        .bind(&tournament.id)
        .bind(document)
        .fetch_one(&mut *tx)
        .await?
        .try_get("revision")?;

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(format!("{}:{}", tournament.id, revision))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(revision)
    }

    async fn revision(&self, id: &str) -> SyncResult<Option<Revision>> {
        let row = sqlx::query("SELECT revision FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(row) => Some(row.try_get("revision")?),
            None => None,
        })
    }

    async fn delete(&self, id: &str) -> SyncResult<bool> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_ids(&self) -> SyncResult<Vec<TournamentId>> {
        let rows = sqlx::query("SELECT id FROM tournaments ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get("id").map_err(SyncError::from))
            .collect()
    }

    async fn watch(&self, id: &str) -> SyncResult<Option<ChangeStream>> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
        let id = id.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    received = listener.recv() => match received {
                        Ok(notification) => {
                            let Some((changed, revision)) = parse_change_payload(notification.payload()) else {
                                debug!("Ignoring malformed change payload {:?}", notification.payload());
                                continue;
                            };
                            if changed == id && tx.send(revision).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Change listener for {} stopped: {}", id, e);
                            break;
                        }
                    },
                }
            }
        });

        Ok(Some(rx))
    }
}

/// Player repository backed by the `players` table
#[derive(Clone)]
pub struct PgPlayerRepository {
    pool: PgPool,
}

impl PgPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PLAYER_COLUMNS: &str = "id, name, games_played, games_won, games_lost, games_drawn, goals, \
     assists, saves, clean_sheets, own_goals, fouls, yellow_cards, red_cards, finals_played, \
     finals_won, finals_lost, tournament_ids, created_at, last_played";

fn counter(row: &PgRow, column: &str) -> StatsResult<u32> {
    let value: i32 = row.try_get(column)?;
    Ok(u32::try_from(value).unwrap_or_default())
}

fn player_from_row(row: &PgRow) -> StatsResult<PlayerRecord> {
    let tournament_ids: Vec<String> = row.try_get("tournament_ids")?;
    Ok(PlayerRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        games_played: counter(row, "games_played")?,
        games_won: counter(row, "games_won")?,
        games_lost: counter(row, "games_lost")?,
        games_drawn: counter(row, "games_drawn")?,
        goals: counter(row, "goals")?,
        assists: counter(row, "assists")?,
        saves: counter(row, "saves")?,
        clean_sheets: counter(row, "clean_sheets")?,
        own_goals: counter(row, "own_goals")?,
        fouls: counter(row, "fouls")?,
        yellow_cards: counter(row, "yellow_cards")?,
        red_cards: counter(row, "red_cards")?,
        finals_played: counter(row, "finals_played")?,
        finals_won: counter(row, "finals_won")?,
        finals_lost: counter(row, "finals_lost")?,
        created_at: row.try_get("created_at")?,
        last_played: row.try_get("last_played")?,
        tournament_ids_applied: tournament_ids.into_iter().collect(),
    })
}

fn to_db(value: u32, player_id: &str) -> StatsResult<i32> {
    i32::try_from(value).map_err(|_| StatsError::CounterOverflow(player_id.to_string()))
}

#[async_trait]
impl PlayerRepository for PgPlayerRepository {
    async fn get_or_create(&self, name: &str) -> StatsResult<PlayerRecord> {
        let name = clean_name(name)?;
        sqlx::query("INSERT INTO players (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(generate_player_id(name))
            .bind(name)
            .execute(&self.pool)
            .await?;

        self.find_by_name(name)
            .await?
            .ok_or_else(|| StatsError::PlayerNotFound(name.to_string()))
    }

    async fn find_by_name(&self, name: &str) -> StatsResult<Option<PlayerRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM players WHERE name = $1", PLAYER_COLUMNS))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    async fn get(&self, player_id: &str) -> StatsResult<PlayerRecord> {
        let row = sqlx::query(&format!("SELECT {} FROM players WHERE id = $1", PLAYER_COLUMNS))
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StatsError::PlayerNotFound(player_id.to_string()))?;
        player_from_row(&row)
    }

    async fn list(&self) -> StatsResult<Vec<PlayerRecord>> {
        let rows = sqlx::query(&format!("SELECT {} FROM players ORDER BY name, id", PLAYER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(player_from_row).collect()
    }

    async fn apply_stat_line(
        &self,
        player_id: &str,
        tournament_id: &str,
        line: &StatLine,
    ) -> StatsResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE players SET
                games_played = games_played + $3,
                games_won = games_won + $4,
                games_lost = games_lost + $5,
                games_drawn = games_drawn + $6,
                goals = goals + $7,
                assists = assists + $8,
                saves = saves + $9,
                clean_sheets = clean_sheets + $10,
                own_goals = own_goals + $11,
                fouls = fouls + $12,
                yellow_cards = yellow_cards + $13,
                red_cards = red_cards + $14,
                finals_played = finals_played + $15,
                finals_won = finals_won + $16,
                finals_lost = finals_lost + $17,
                last_played = CASE WHEN $3 > 0 THEN NOW() ELSE last_played END,
                tournament_ids = array_append(tournament_ids, $2)
            WHERE id = $1 AND NOT ($2 = ANY(tournament_ids))
            "#,
        )
        .bind(player_id)
        .bind(tournament_id)
        .bind(to_db(line.games_played, player_id)?)
        .bind(to_db(line.games_won, player_id)?)
        .bind(to_db(line.games_lost, player_id)?)
        .bind(to_db(line.games_drawn, player_id)?)
        .bind(to_db(line.goals, player_id)?)
        .bind(to_db(line.assists, player_id)?)
        .bind(to_db(line.saves, player_id)?)
        .bind(to_db(line.clean_sheets, player_id)?)
        .bind(to_db(line.own_goals, player_id)?)
        .bind(to_db(line.fouls, player_id)?)
        .bind(to_db(line.yellow_cards, player_id)?)
        .bind(to_db(line.red_cards, player_id)?)
        .bind(to_db(line.finals_played, player_id)?)
        .bind(to_db(line.finals_won, player_id)?)
        .bind(to_db(line.finals_lost, player_id)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Either already applied or the player does not exist
        self.get(player_id).await?;
        Ok(false)
    }
}
