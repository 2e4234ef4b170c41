//! Reference data maintained by admins: expense categories, chargeable
//! clients and mileage rates.

pub mod categories;
pub mod clients;
pub mod mileage_rates;
