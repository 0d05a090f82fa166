//! Repositories for the `metrics` and `equipment_metrics` tables.

use equiplog_core::alarm::{validate_thresholds, AlarmThresholds};
use equiplog_core::conversion::ConversionRange;
use equiplog_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::error::RepoError;
use crate::models::metric_binding::{CreateMetric, CreateMetricBinding, Metric, MetricBinding};

/// Binding columns joined with the metric's name and unit (`em` / `m`).
const BINDING_COLUMNS: &str = "em.id, em.equipment_id, em.metric_id, em.valor_minimo, \
    em.valor_maximo, em.alarme_minimo, em.alarme_maximo, \
    m.name AS metric_name, m.unit AS metric_unit";

/// Provides access to metric definitions.
pub struct MetricRepo;

impl MetricRepo {
    pub async fn create(pool: &PgPool, input: &CreateMetric) -> Result<Metric, sqlx::Error> {
        sqlx::query_as::<_, Metric>(
            "INSERT INTO metrics (name, unit) VALUES ($1, $2) RETURNING id, name, unit",
        )
        .bind(&input.name)
        .bind(&input.unit)
        .fetch_one(pool)
        .await
    }
}

/// Provides access to equipment/metric bindings.
pub struct MetricBindingRepo;

impl MetricBindingRepo {
    /// Bind a metric to equipment after checking range and threshold order.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMetricBinding,
    ) -> Result<MetricBinding, RepoError> {
        validate_thresholds(
            ConversionRange::new(input.valor_minimo, input.valor_maximo),
            &AlarmThresholds {
                min: input.alarme_minimo,
                max: input.alarme_maximo,
            },
        )?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO equipment_metrics \
                (equipment_id, metric_id, valor_minimo, valor_maximo, alarme_minimo, alarme_maximo) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(input.equipment_id)
        .bind(input.metric_id)
        .bind(input.valor_minimo)
        .bind(input.valor_maximo)
        .bind(input.alarme_minimo)
        .bind(input.alarme_maximo)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {BINDING_COLUMNS} FROM equipment_metrics em \
             JOIN metrics m ON m.id = em.metric_id \
             WHERE em.id = $1"
        );
        let binding = sqlx::query_as::<_, MetricBinding>(&query)
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(binding)
    }

    /// All bindings of an equipment, ordered by metric id.
    ///
    /// Accepts any executor so ingestion can read inside its transaction.
    pub async fn list_for_equipment<'e, E>(
        executor: E,
        equipment_id: DbId,
    ) -> Result<Vec<MetricBinding>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {BINDING_COLUMNS} FROM equipment_metrics em \
             JOIN metrics m ON m.id = em.metric_id \
             WHERE em.equipment_id = $1 \
             ORDER BY em.metric_id"
        );
        sqlx::query_as::<_, MetricBinding>(&query)
            .bind(equipment_id)
            .fetch_all(executor)
            .await
    }

    /// The binding of one metric on one equipment, if any.
    pub async fn find_for_metric(
        pool: &PgPool,
        equipment_id: DbId,
        metric_id: DbId,
    ) -> Result<Option<MetricBinding>, sqlx::Error> {
        let query = format!(
            "SELECT {BINDING_COLUMNS} FROM equipment_metrics em \
             JOIN metrics m ON m.id = em.metric_id \
             WHERE em.equipment_id = $1 AND em.metric_id = $2"
        );
        sqlx::query_as::<_, MetricBinding>(&query)
            .bind(equipment_id)
            .bind(metric_id)
            .fetch_optional(pool)
            .await
    }
}
