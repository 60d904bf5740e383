//! Governor persistence.
//!
//! Two tables:
//! - `governors` holds the latest scan, one row per governor. It is wiped
//!   before every scan and is what the export reads.
//! - `governor_baselines` holds the epoch baseline (power and kill points
//!   when the epoch started). It survives scans; `update` requires a row
//!   here, `insert_or_update` creates or resets it.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use crate::record::{Baseline, GovernorRecord, ResetFlags, StoredGovernor};

static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

/// Persistence collaborator used by the scan controller and the export.
pub trait GovernorStore {
    fn delete_all(&mut self) -> Result<()>;
    /// Fails when the governor has no baseline yet.
    fn update(&mut self, record: &GovernorRecord) -> Result<()>;
    fn insert_or_update(&mut self, record: &GovernorRecord, flags: ResetFlags) -> Result<()>;
    /// Latest scan, highest power first, with each governor's baseline.
    fn list_by_power_desc(&mut self) -> Result<Vec<StoredGovernor>>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS governors (
    id TEXT PRIMARY KEY,
    nickname TEXT NOT NULL,
    power TEXT NOT NULL,
    power_value INTEGER NOT NULL,
    kill_points TEXT NOT NULL,
    tier1_kills TEXT NOT NULL,
    tier2_kills TEXT NOT NULL,
    tier3_kills TEXT NOT NULL,
    tier4_kills TEXT NOT NULL,
    tier5_kills TEXT NOT NULL,
    deaths TEXT NOT NULL,
    resource_assistance TEXT NOT NULL,
    scanned_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS governor_baselines (
    id TEXT PRIMARY KEY,
    nickname TEXT NOT NULL,
    base_power TEXT NOT NULL,
    base_kill_points TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Parses the digits of an OCR number for ordering; garbage sorts last.
pub fn numeric_value(text: &str) -> i64 {
    NON_DIGITS.replace_all(text, "").parse().unwrap_or(0)
}

fn row_to_stored(row: &Row) -> rusqlite::Result<StoredGovernor> {
    let record = GovernorRecord {
        id: row.get("id")?,
        nickname: row.get("nickname")?,
        power: row.get("power")?,
        kill_points: row.get("kill_points")?,
        tier1_kills: row.get("tier1_kills")?,
        tier2_kills: row.get("tier2_kills")?,
        tier3_kills: row.get("tier3_kills")?,
        tier4_kills: row.get("tier4_kills")?,
        tier5_kills: row.get("tier5_kills")?,
        deaths: row.get("deaths")?,
        resource_assistance: row.get("resource_assistance")?,
    };

    let base_power: Option<String> = row.get("base_power")?;
    let base_kill_points: Option<String> = row.get("base_kill_points")?;
    let baseline = match (base_power, base_kill_points) {
        (Some(power), Some(kill_points)) => Some(Baseline { power, kill_points }),
        _ => None,
    };

    Ok(StoredGovernor { record, baseline })
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        info!("Database: {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(Self { conn })
    }

    fn write_snapshot(&self, record: &GovernorRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO governors (id, nickname, power, power_value, kill_points,
                 tier1_kills, tier2_kills, tier3_kills, tier4_kills, tier5_kills,
                 deaths, resource_assistance, scanned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(id) DO UPDATE SET
                 nickname = excluded.nickname,
                 power = excluded.power,
                 power_value = excluded.power_value,
                 kill_points = excluded.kill_points,
                 tier1_kills = excluded.tier1_kills,
                 tier2_kills = excluded.tier2_kills,
                 tier3_kills = excluded.tier3_kills,
                 tier4_kills = excluded.tier4_kills,
                 tier5_kills = excluded.tier5_kills,
                 deaths = excluded.deaths,
                 resource_assistance = excluded.resource_assistance,
                 scanned_at = excluded.scanned_at",
            params![
                record.id,
                record.nickname,
                record.power,
                numeric_value(&record.power),
                record.kill_points,
                record.tier1_kills,
                record.tier2_kills,
                record.tier3_kills,
                record.tier4_kills,
                record.tier5_kills,
                record.deaths,
                record.resource_assistance,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl GovernorStore for SqliteStore {
    fn delete_all(&mut self) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM governors", [])?;
        info!("Deleted {} governors from the previous scan", deleted);
        Ok(())
    }

    fn update(&mut self, record: &GovernorRecord) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE governor_baselines SET nickname = ?2, updated_at = ?3 WHERE id = ?1",
            params![record.id, record.nickname, Utc::now().to_rfc3339()],
        )?;
        if changed == 0 {
            bail!("Governor {} not found", record.id);
        }

        self.write_snapshot(record)
    }

    fn insert_or_update(&mut self, record: &GovernorRecord, flags: ResetFlags) -> Result<()> {
        self.conn.execute(
            "INSERT INTO governor_baselines (id, nickname, base_power, base_kill_points, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 nickname = excluded.nickname,
                 base_power = CASE WHEN ?6 THEN excluded.base_power ELSE base_power END,
                 base_kill_points = CASE WHEN ?7 THEN excluded.base_kill_points ELSE base_kill_points END,
                 updated_at = excluded.updated_at",
            params![
                record.id,
                record.nickname,
                record.power,
                record.kill_points,
                Utc::now().to_rfc3339(),
                flags.reset_power,
                flags.reset_kp,
            ],
        )?;

        self.write_snapshot(record)
    }

    fn list_by_power_desc(&mut self) -> Result<Vec<StoredGovernor>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id AS id, g.nickname AS nickname, g.power AS power,
                    g.kill_points AS kill_points, g.tier1_kills AS tier1_kills,
                    g.tier2_kills AS tier2_kills, g.tier3_kills AS tier3_kills,
                    g.tier4_kills AS tier4_kills, g.tier5_kills AS tier5_kills,
                    g.deaths AS deaths, g.resource_assistance AS resource_assistance,
                    b.base_power AS base_power, b.base_kill_points AS base_kill_points
             FROM governors g
             LEFT JOIN governor_baselines b ON b.id = g.id
             ORDER BY g.power_value DESC, g.id ASC",
        )?;
        let records = stmt
            .query_map([], row_to_stored)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
