//! Core geometric types and the scan-line accumulation entity.

pub mod geometry;
pub mod scan;
