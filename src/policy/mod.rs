//! Growth policies: conversion rate and command amount ranges.

pub mod commands;
pub mod conversion;

pub use commands::GrowthCommand;
pub use conversion::{GrowthPolicy, DEFAULT_TICK_INTERVAL};
