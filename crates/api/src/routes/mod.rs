pub mod agent;
pub mod alerts;
pub mod predictions;
pub mod stats;
