//! Business logic services

pub mod tariff;
