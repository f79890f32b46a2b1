//! Monte Carlo projection engine for multi-asset ETF portfolios.
//!
//! Given a percentage allocation across a fixed menu of eleven asset classes,
//! an initial investment, a recurring monthly contribution, and a horizon in
//! years, the engine runs many randomized trials of monthly portfolio growth
//! with correlated asset-class returns and reduces them to per-year percentile
//! bands (5th/25th/50th/75th/95th) plus the mean.

pub mod core;
