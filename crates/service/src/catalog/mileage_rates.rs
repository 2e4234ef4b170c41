use uuid::Uuid;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use models::{mileage_rate, user::normalize_charger, ChargerType, VehicleType};
use crate::errors::ServiceError;
use crate::mileage::pick_rate;

#[derive(Debug, Clone, Deserialize)]
pub struct RateInput {
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub charger_type: Option<ChargerType>,
    pub rate_pence_per_mile: i64,
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateUpdate {
    pub rate_pence_per_mile: Option<i64>,
    /// Close the rate's window; leave unset to keep the current end date.
    pub effective_to: Option<NaiveDate>,
}

fn check_window(from: NaiveDate, to: Option<NaiveDate>) -> Result<(), ServiceError> {
    if let Some(to) = to {
        models::validate::validate_date_range(from, to)?;
    }
    Ok(())
}

fn check_rate(pence: i64) -> Result<(), ServiceError> {
    if pence <= 0 {
        return Err(ServiceError::Validation("rate_pence_per_mile must be positive".into()));
    }
    Ok(())
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<mileage_rate::Model>, ServiceError> {
    Ok(mileage_rate::Entity::find()
        .order_by_asc(mileage_rate::Column::VehicleType)
        .order_by_asc(mileage_rate::Column::ChargerType)
        .order_by_desc(mileage_rate::Column::EffectiveFrom)
        .all(db)
        .await?)
}

pub async fn create(db: &DatabaseConnection, input: RateInput) -> Result<mileage_rate::Model, ServiceError> {
    check_rate(input.rate_pence_per_mile)?;
    check_window(input.effective_from, input.effective_to)?;
    let charger = normalize_charger(input.vehicle_type, input.charger_type)?;
    let created = mileage_rate::ActiveModel {
        id: Set(Uuid::new_v4()),
        vehicle_type: Set(input.vehicle_type.as_str().to_string()),
        charger_type: Set(charger.map(|c| c.as_str().to_string())),
        rate_pence_per_mile: Set(input.rate_pence_per_mile),
        effective_from: Set(input.effective_from),
        effective_to: Set(input.effective_to),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    info!(rate_id = %created.id, vehicle = %created.vehicle_type, pence = created.rate_pence_per_mile, "mileage_rate_created");
    Ok(created)
}

pub async fn update_rate(db: &DatabaseConnection, id: Uuid, input: RateUpdate) -> Result<mileage_rate::Model, ServiceError> {
    let found = mileage_rate::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("mileage rate"))?;
    if let Some(p) = input.rate_pence_per_mile {
        check_rate(p)?;
    }
    let to = input.effective_to.or(found.effective_to);
    check_window(found.effective_from, to)?;
    let mut am: mileage_rate::ActiveModel = found.into();
    if let Some(p) = input.rate_pence_per_mile {
        am.rate_pence_per_mile = Set(p);
    }
    am.effective_to = Set(to);
    Ok(am.update(db).await?)
}

/// Rates effective on `date`.
pub async fn current_rates(db: &DatabaseConnection, date: NaiveDate) -> Result<Vec<mileage_rate::Model>, ServiceError> {
    let rates = mileage_rate::Entity::find()
        .filter(mileage_rate::Column::EffectiveFrom.lte(date))
        .all(db)
        .await?;
    Ok(rates.into_iter().filter(|r| r.is_effective_on(date)).collect())
}

/// The rate a journey on `date` is priced at.
pub async fn resolve_rate(
    db: &DatabaseConnection,
    vehicle: VehicleType,
    charger: Option<ChargerType>,
    date: NaiveDate,
) -> Result<mileage_rate::Model, ServiceError> {
    let rates = mileage_rate::Entity::find()
        .filter(mileage_rate::Column::VehicleType.eq(vehicle.as_str()))
        .all(db)
        .await?;
    pick_rate(&rates, vehicle, charger, date).cloned().ok_or_else(|| {
        let charger = charger.map(|c| format!("/{c}")).unwrap_or_default();
        ServiceError::NotFound(format!("no mileage rate for {vehicle}{charger} on {date}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn resolve_uses_newest_window() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        // Far-future window so seeded rates do not interfere
        let from = NaiveDate::from_ymd_opt(2090, 1, 1).unwrap();
        let old = create(&db, RateInput {
            vehicle_type: VehicleType::Electric,
            charger_type: Some(ChargerType::Home),
            rate_pence_per_mile: 8,
            effective_from: from,
            effective_to: None,
        })
        .await?;
        let newer = create(&db, RateInput {
            vehicle_type: VehicleType::Electric,
            charger_type: Some(ChargerType::Home),
            rate_pence_per_mile: 9,
            effective_from: NaiveDate::from_ymd_opt(2090, 6, 1).unwrap(),
            effective_to: None,
        })
        .await?;

        let on = NaiveDate::from_ymd_opt(2090, 7, 1).unwrap();
        let r = resolve_rate(&db, VehicleType::Electric, Some(ChargerType::Home), on).await?;
        assert_eq!(r.id, newer.id);

        let closed = update_rate(&db, newer.id, RateUpdate { rate_pence_per_mile: None, effective_to: Some(NaiveDate::from_ymd_opt(2090, 6, 30).unwrap()) }).await?;
        assert!(closed.effective_to.is_some());
        let r = resolve_rate(&db, VehicleType::Electric, Some(ChargerType::Home), on).await?;
        assert_eq!(r.id, old.id);

        // Electric rates require a charger type
        let bad = create(&db, RateInput { vehicle_type: VehicleType::Electric, charger_type: None, rate_pence_per_mile: 5, effective_from: from, effective_to: None }).await;
        assert!(bad.is_err());

        mileage_rate::Entity::delete_by_id(old.id).exec(&db).await?;
        mileage_rate::Entity::delete_by_id(newer.id).exec(&db).await?;
        Ok(())
    }
}
