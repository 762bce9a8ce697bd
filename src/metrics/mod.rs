//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Contadores del pool expuestos en `GET /metrics`:
//! - Workers vivos y ocupados
//! - Tamaño de la cola
//! - Requests atendidos

pub mod collector;

pub use collector::{MetricsProvider, MetricsSnapshot, PoolMetrics};
