//! dbadmin library
//!
//! Database administration commands: schema migrations dispatched to a
//! pluggable migration backend, whole-schema create/drop, and PostgreSQL
//! dump/restore.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod migration;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
