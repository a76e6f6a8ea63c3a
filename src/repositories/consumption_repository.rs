use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::entities::consumption::{Column, Entity as Consumption};
use crate::errors::ServiceError;
use crate::models::ConsumptionSeries;

/// Read-only access to consumption history. Queries take the connection or
/// transaction they run on.
#[derive(Debug, Clone, Copy)]
pub struct ConsumptionRepository;

impl ConsumptionRepository {
    /// Distinct reagents present in consumption history, ordered by id.
    ///
    /// A reagent recorded under several names is listed once, under the
    /// greatest name.
    pub async fn distinct_reagents<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Vec<(i32, String)>, ServiceError> {
        Consumption::find()
            .select_only()
            .column(Column::ReagentId)
            .column_as(Column::ReagentName.max(), "reagent_name")
            .group_by(Column::ReagentId)
            .order_by_asc(Column::ReagentId)
            .into_tuple::<(i32, String)>()
            .all(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Date-ordered series of one reagent with quantities summed per date.
    ///
    /// Null totals become 0 so the calendar spacing of the series survives.
    pub async fn series<C: ConnectionTrait>(
        conn: &C,
        reagent_id: i32,
        reagent_name: &str,
    ) -> Result<ConsumptionSeries, ServiceError> {
        let rows = Consumption::find()
            .select_only()
            .column(Column::ConsumedOn)
            .column_as(Column::QuantityConsumed.sum(), "total_consumed")
            .filter(Column::ReagentId.eq(reagent_id))
            .group_by(Column::ConsumedOn)
            .order_by_asc(Column::ConsumedOn)
            .into_tuple::<(chrono::NaiveDate, Option<Decimal>)>()
            .all(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let points = rows
            .into_iter()
            .map(|(date, total)| (date, total.and_then(|t| t.to_f64()).unwrap_or(0.0)))
            .collect();

        Ok(ConsumptionSeries::new(reagent_id, reagent_name, points))
    }
}
