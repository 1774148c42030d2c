//! Durable results store
//!
//! Every submitted session appends its rows here. Rows are never updated or
//! deleted; reads return them in append order.

use crate::db::init::init_database;
use crate::model::{PersistedResultRow, ResultRow, MAX_CONFIDENCE};
use crate::stats::TIMESTAMP_FORMAT;
use crate::Result;
use chrono::{DateTime, Local};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column header of the downloadable spreadsheet
pub const CSV_HEADER: &str =
    "Image_Number,User_Selection,Confidence,Actual_Type,Is_Correct,Image_Path,timestamp";

/// File name offered to the browser for the download
pub const DOWNLOAD_FILE_NAME: &str = "deepfake_survey_results.csv";

/// Append-only store of every participant's results
#[derive(Debug, Clone)]
pub struct ResultStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl ResultStore {
    /// Open the store at `path`, creating it on first use
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = init_database(path).await?;
        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Append one session's rows under a shared timestamp
    ///
    /// All rows are written in a single transaction, so concurrent
    /// submissions are serialized by SQLite and none are lost.
    pub async fn append_session(&self, rows: &[ResultRow], timestamp: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO survey_results
                    (Image_Number, User_Selection, Confidence, Actual_Type, Is_Correct, Image_Path, timestamp)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.image_number as i64)
            .bind(&row.user_selection)
            .bind(row.confidence as i64)
            .bind(&row.actual_type)
            .bind(row.is_correct)
            .bind(&row.image_path)
            .bind(timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!("Appended {} result rows at {}", rows.len(), timestamp);
        Ok(())
    }

    /// Every stored row, oldest first
    pub async fn load_all(&self) -> Result<Vec<PersistedResultRow>> {
        let records = sqlx::query_as::<_, (i64, i64, String, i64, String, bool, String, String)>(
            r#"
            SELECT id, Image_Number, User_Selection, Confidence, Actual_Type, Is_Correct, Image_Path, timestamp
            FROM survey_results
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(
                |(id, image_number, user_selection, confidence, actual_type, is_correct, image_path, timestamp)| {
                    PersistedResultRow {
                        id,
                        timestamp,
                        row: ResultRow {
                            image_number: image_number.max(0) as u32,
                            user_selection,
                            confidence: confidence.clamp(0, MAX_CONFIDENCE as i64) as u8,
                            actual_type,
                            is_correct,
                            image_path,
                        },
                    }
                },
            )
            .collect())
    }

    pub async fn row_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM survey_results")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Full store rendered as CSV
    pub async fn export_csv(&self) -> Result<String> {
        let rows = self.load_all().await?;
        Ok(render_csv(&rows))
    }
}

/// Timestamp string shared by every row of one submission
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Render rows as CSV, header first, one line per row
pub fn render_csv(rows: &[PersistedResultRow]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + rows.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for stored in rows {
        let row = &stored.row;
        let fields = [
            row.image_number.to_string(),
            csv_field(&row.user_selection),
            row.confidence.to_string(),
            csv_field(&row.actual_type),
            if row.is_correct { "True" } else { "False" }.to_string(),
            csv_field(&row.image_path),
            csv_field(&stored.timestamp),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
