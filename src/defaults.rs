/// Rows written per INSERT statement during table replacement
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Upper bound for `TARIFF_BATCH_SIZE` (15 binds per row, well under the Postgres limit)
pub const MAX_BATCH_SIZE: usize = 2000;

/// Largest table a single generation run may produce
pub const MAX_DISTANCE_KM_LIMIT: i32 = 10_000;
