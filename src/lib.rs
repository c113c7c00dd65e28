//! Sales Analytics Library
//!
//! This library turns a flat list of raw sale records and an optional date
//! range into chart-ready revenue series, scalar metrics and gamified journey
//! progress for the merchant dashboard. The engine is pure: no I/O, no
//! globals, every input passed explicitly.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core aggregation logic.
//! - `config`: Configuration management.
//! - `dashboard`: Pipeline orchestration.
//! - `errors`: Error handling types.
//! - `filter`: Approved/range sale filter.
//! - `handlers`: HTTP request handlers.
//! - `journey`: Tier table and progress scoring.
//! - `metrics`: Growth, payment-method breakdown and account health.
//! - `models`: Input and output data models.
//! - `normalization`: Tolerant parsing of upstream records.
//! - `range`: Date range normalization.
//! - `series`: Daily/monthly/yearly bucket series.

pub mod api;
pub mod core;

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod journey;
pub mod metrics;
pub mod models;
pub mod normalization;
pub mod range;
pub mod series;
