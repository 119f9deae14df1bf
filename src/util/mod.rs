//! Shared client helpers: token decoding and durable key/value storage.

pub mod jwt;
pub mod storage;
