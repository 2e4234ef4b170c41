use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{ChargerType, VehicleType};

/// Pence per mile for a vehicle (and, for electric vehicles, charger) type
/// over an effective date window.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mileage_rate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vehicle_type: String,
    pub charger_type: Option<String>,
    pub rate_pence_per_mile: i64,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_effective_on(&self, date: Date) -> bool {
        self.effective_from <= date && self.effective_to.map_or(true, |to| to >= date)
    }

    /// Electric rates must name the same charger; standard rates carry none.
    pub fn applies_to(&self, vehicle: VehicleType, charger: Option<ChargerType>) -> bool {
        if self.vehicle_type != vehicle.as_str() {
            return false;
        }
        match vehicle {
            VehicleType::Electric => match charger {
                Some(c) => self.charger_type.as_deref() == Some(c.as_str()),
                None => false,
            },
            VehicleType::Standard => self.charger_type.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn rate(vehicle: &str, charger: Option<&str>, from: (i32, u32, u32), to: Option<(i32, u32, u32)>) -> Model {
        Model {
            id: Uuid::new_v4(),
            vehicle_type: vehicle.into(),
            charger_type: charger.map(Into::into),
            rate_pence_per_mile: 45,
            effective_from: NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            effective_to: to.map(|t| NaiveDate::from_ymd_opt(t.0, t.1, t.2).unwrap()),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn effective_window_is_inclusive() {
        let r = rate("standard", None, (2024, 1, 1), Some((2024, 12, 31)));
        assert!(r.is_effective_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(r.is_effective_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!r.is_effective_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(!r.is_effective_on(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    }

    #[test]
    fn charger_matching() {
        let home = rate("electric", Some("home"), (2024, 1, 1), None);
        assert!(home.applies_to(VehicleType::Electric, Some(ChargerType::Home)));
        assert!(!home.applies_to(VehicleType::Electric, Some(ChargerType::Public)));
        assert!(!home.applies_to(VehicleType::Electric, None));
        assert!(!home.applies_to(VehicleType::Standard, None));

        let standard = rate("standard", None, (2024, 1, 1), None);
        assert!(standard.applies_to(VehicleType::Standard, Some(ChargerType::Home)));
    }
}
