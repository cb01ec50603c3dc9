pub mod diaries;
pub mod events;
pub mod health;
pub mod heatmaps;
