//! Transport tariff database queries

use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::types::{TariffConfigSnapshot, TariffRow};

const ROW_COLUMNS: &str = r#"
    distance_km,
    base_tariff_t, base_tariff_tkm, base_tariff_m3, base_tariff_m3km,
    outgoing_tariff_t, outgoing_tariff_tkm, outgoing_tariff_m3, outgoing_tariff_m3km,
    margin_t, margin_tkm, margin_m3, margin_m3km,
    volume_coeff, margin_percent
"#;

/// Replace the tariff table (and optionally the config snapshot) in one
/// transaction.
///
/// Rows are upserted by `distance_km` in batches of `batch_size`; rows past
/// the new maximum distance are removed. Nothing is visible until commit.
pub async fn replace_tariff_table(
    pool: &PgPool,
    rows: &[TariffRow],
    snapshot: Option<&TariffConfigSnapshot>,
    batch_size: usize,
) -> Result<usize> {
    let max_distance_km = rows.iter().map(|r| r.distance_km).max().unwrap_or(0);

    let mut tx = pool.begin().await?;

    for batch in rows.chunks(batch_size.max(1)) {
        upsert_batch(&mut tx, batch).await?;
    }

    sqlx::query("DELETE FROM transport_tariffs WHERE distance_km > $1")
        .bind(max_distance_km)
        .execute(&mut *tx)
        .await?;

    if let Some(snapshot) = snapshot {
        upsert_config_snapshot(&mut tx, snapshot).await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

async fn upsert_batch(tx: &mut Transaction<'_, Postgres>, batch: &[TariffRow]) -> Result<()> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO transport_tariffs ({ROW_COLUMNS}) "));

    builder.push_values(batch, |mut b, row| {
        b.push_bind(row.distance_km)
            .push_bind(row.base_tariff_t)
            .push_bind(row.base_tariff_tkm)
            .push_bind(row.base_tariff_m3)
            .push_bind(row.base_tariff_m3km)
            .push_bind(row.outgoing_tariff_t)
            .push_bind(row.outgoing_tariff_tkm)
            .push_bind(row.outgoing_tariff_m3)
            .push_bind(row.outgoing_tariff_m3km)
            .push_bind(row.margin_t)
            .push_bind(row.margin_tkm)
            .push_bind(row.margin_m3)
            .push_bind(row.margin_m3km)
            .push_bind(row.volume_coeff)
            .push_bind(row.margin_percent);
    });

    builder.push(
        r#"
        ON CONFLICT (distance_km) DO UPDATE SET
            base_tariff_t = EXCLUDED.base_tariff_t,
            base_tariff_tkm = EXCLUDED.base_tariff_tkm,
            base_tariff_m3 = EXCLUDED.base_tariff_m3,
            base_tariff_m3km = EXCLUDED.base_tariff_m3km,
            outgoing_tariff_t = EXCLUDED.outgoing_tariff_t,
            outgoing_tariff_tkm = EXCLUDED.outgoing_tariff_tkm,
            outgoing_tariff_m3 = EXCLUDED.outgoing_tariff_m3,
            outgoing_tariff_m3km = EXCLUDED.outgoing_tariff_m3km,
            margin_t = EXCLUDED.margin_t,
            margin_tkm = EXCLUDED.margin_tkm,
            margin_m3 = EXCLUDED.margin_m3,
            margin_m3km = EXCLUDED.margin_m3km,
            volume_coeff = EXCLUDED.volume_coeff,
            margin_percent = EXCLUDED.margin_percent,
            updated_at = NOW()
        "#,
    );

    builder.build().execute(&mut **tx).await?;
    Ok(())
}

async fn upsert_config_snapshot(
    tx: &mut Transaction<'_, Postgres>,
    snapshot: &TariffConfigSnapshot,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transport_tariff_config (
            id,
            point1_km, point1_tariff, point2_km, point2_tariff, point3_km, point3_tariff,
            a, b, c,
            hyper_min_km, hyper_max_km, volume_coeff, margin_percent, max_distance_km,
            updated_at
        )
        VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (id) DO UPDATE SET
            point1_km = EXCLUDED.point1_km,
            point1_tariff = EXCLUDED.point1_tariff,
            point2_km = EXCLUDED.point2_km,
            point2_tariff = EXCLUDED.point2_tariff,
            point3_km = EXCLUDED.point3_km,
            point3_tariff = EXCLUDED.point3_tariff,
            a = EXCLUDED.a,
            b = EXCLUDED.b,
            c = EXCLUDED.c,
            hyper_min_km = EXCLUDED.hyper_min_km,
            hyper_max_km = EXCLUDED.hyper_max_km,
            volume_coeff = EXCLUDED.volume_coeff,
            margin_percent = EXCLUDED.margin_percent,
            max_distance_km = EXCLUDED.max_distance_km,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(snapshot.point1_km)
    .bind(snapshot.point1_tariff)
    .bind(snapshot.point2_km)
    .bind(snapshot.point2_tariff)
    .bind(snapshot.point3_km)
    .bind(snapshot.point3_tariff)
    .bind(snapshot.a)
    .bind(snapshot.b)
    .bind(snapshot.c)
    .bind(snapshot.hyper_min_km)
    .bind(snapshot.hyper_max_km)
    .bind(snapshot.volume_coeff)
    .bind(snapshot.margin_percent)
    .bind(snapshot.max_distance_km)
    .bind(snapshot.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Get the singleton config snapshot
pub async fn get_config_snapshot(pool: &PgPool) -> Result<Option<TariffConfigSnapshot>> {
    let snapshot = sqlx::query_as::<_, TariffConfigSnapshot>(
        r#"
        SELECT point1_km, point1_tariff, point2_km, point2_tariff, point3_km, point3_tariff,
               a, b, c,
               hyper_min_km, hyper_max_km, volume_coeff, margin_percent, max_distance_km,
               updated_at
        FROM transport_tariff_config
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(snapshot)
}

/// Get the row for one distance
pub async fn get_tariff(pool: &PgPool, distance_km: i32) -> Result<Option<TariffRow>> {
    let row = sqlx::query_as::<_, TariffRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM transport_tariffs WHERE distance_km = $1"
    ))
    .bind(distance_km)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List rows in an inclusive distance range
pub async fn list_tariffs(pool: &PgPool, from_km: i32, to_km: i32) -> Result<Vec<TariffRow>> {
    let rows = sqlx::query_as::<_, TariffRow>(&format!(
        r#"
        SELECT {ROW_COLUMNS}
        FROM transport_tariffs
        WHERE distance_km BETWEEN $1 AND $2
        ORDER BY distance_km ASC
        "#
    ))
    .bind(from_km)
    .bind(to_km)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
