#![allow(dead_code)]

use std::path::PathBuf;

use etude_core::{Discovery, HandlerRegistry};

#[path = "../units/accounts_resolvers.rs"]
pub mod accounts_resolvers;
#[path = "../units/nested/reports_resolvers.rs"]
pub mod reports_resolvers;
#[path = "../units/system_resolvers.rs"]
pub mod system_resolvers;

pub fn units_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/units"))
}

/// Registry discovered from the units linked above.
pub async fn registry() -> HandlerRegistry {
    Discovery::linked(units_dir())
        .discover()
        .await
        .expect("discovery of test units failed")
}
