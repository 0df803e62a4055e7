//! ELKT Core Types and Definitions
//!
//! This crate provides the foundational types for graphs written in the ELK
//! graph text format (`.elkt`). It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Points and shape layouts ([`geometry`] module)
//! - **Properties**: Typed layout option values ([`property`] module)
//! - **Graph**: The resolved, arena-backed graph model ([`graph::ElkGraph`])

pub mod geometry;
pub mod graph;
pub mod identifier;
pub mod property;
