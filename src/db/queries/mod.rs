//! Database queries

pub mod transport_tariff;
