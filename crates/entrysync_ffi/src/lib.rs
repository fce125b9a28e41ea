//! Flutter bridge crate for entrysync.

pub mod api;
