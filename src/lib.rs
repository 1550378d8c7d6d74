//! Verifies that two directory trees, local or reached through an open SFTP
//! session, contain the same files.

#![allow(async_fn_in_trait)]
#![allow(clippy::enum_variant_names)]

pub mod application;
pub mod cli;
pub mod compare;
pub mod config;
pub mod ext;
pub mod filesystem;
pub mod report;
pub mod walker;
