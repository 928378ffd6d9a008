use sqlx::PgPool;
use tracing::info;

use crate::applications::ApplicationInput;
use crate::models::application::ApplicationRow;

const COLUMNS: &str =
    "id, title, company, location, length, url, posting, status, added, applied, coverletter";

pub async fn list_applications(pool: &PgPool) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM job_applications ORDER BY added DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get_application(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM job_applications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_application(
    pool: &PgPool,
    input: &ApplicationInput,
) -> Result<ApplicationRow, sqlx::Error> {
    let row: ApplicationRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO job_applications
            (title, company, location, length, url, posting, status, applied, added)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, CURRENT_DATE))
        RETURNING {COLUMNS}
        "#
    ))
    .bind(input.title.trim())
    .bind(input.company.trim())
    .bind(&input.location)
    .bind(&input.length)
    .bind(&input.url)
    .bind(&input.posting)
    .bind(input.status_or_default())
    .bind(input.applied)
    .bind(input.added)
    .fetch_one(pool)
    .await?;

    info!("Created application {} ({} at {})", row.id, row.title, row.company);
    Ok(row)
}

/// Replaces every editable field. `added` keeps its stored value when not supplied.
pub async fn update_application(
    pool: &PgPool,
    id: i64,
    input: &ApplicationInput,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE job_applications
        SET title = $1, company = $2, location = $3, length = $4, url = $5, posting = $6,
            status = $7, applied = $8, added = COALESCE($9, added)
        WHERE id = $10
        RETURNING {COLUMNS}
        "#
    ))
    .bind(input.title.trim())
    .bind(input.company.trim())
    .bind(&input.location)
    .bind(&input.length)
    .bind(&input.url)
    .bind(&input.posting)
    .bind(input.status_or_default())
    .bind(input.applied)
    .bind(input.added)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns whether a row was deleted. The saved cover letter goes with it (FK cascade).
pub async fn delete_application(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM job_applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_cover_letter(pool: &PgPool, id: i64) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT content FROM cover_letters WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Upserts the letter and flags the application in one transaction.
/// Returns `false` when the application does not exist.
pub async fn save_cover_letter(
    pool: &PgPool,
    id: i64,
    content: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let flagged = sqlx::query("UPDATE job_applications SET coverletter = TRUE WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if flagged.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO cover_letters (id, content) VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET content = EXCLUDED.content
        "#,
    )
    .bind(id)
    .bind(content)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Saved cover letter for application {id}");
    Ok(true)
}
