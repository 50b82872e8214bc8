//! Record-store access for the engine
//!
//! The engine only reads stream definitions; record lifecycle belongs
//! to the management services.

pub mod streams;
