// Domain layer - Level-progression model, statistics and alert rules
pub mod alerts;
pub mod error;
pub mod events;
pub mod observation;
pub mod progress;
pub mod settings;
pub mod statistics;
