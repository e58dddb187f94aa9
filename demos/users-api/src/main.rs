//! Users API: a handful of resolvers served from `POST /api/<name>`.
//!
//! ```bash
//! cargo run -p etude-users-api
//! curl -X POST localhost:3000/api/getUsersByName \
//!     -H 'Authorization: admin' -d '{"name":"Anatoly"}'
//! ```

mod resolvers;

use etude_core::prelude::*;

/// Where this crate's resolver units live, for runs from any directory.
const RESOLVERS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/resolvers");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut config = Config::from_env()?;
    if std::env::var_os("RESOLVERS_DIR").is_none() {
        config.resolvers_dir = RESOLVERS_DIR.to_string();
    }

    let app = App::with_config(config).await?;
    app.run().await?;

    Ok(())
}
