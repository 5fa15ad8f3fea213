//! Downlink MAC PDU definitions for the TETRA receiver
//!
//! One file per PDU, parsing from and serializing to a BitBuffer. Parsers
//! never touch receiver state; the upper MAC applies their side effects.

pub mod enums;
pub mod fields;
pub mod pdus;
