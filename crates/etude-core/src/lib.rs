//! # etude-core
//!
//! One HTTP endpoint, many resolvers. `POST /api/<name>` is resolved
//! against a registry populated at startup by discovering `*_resolvers.rs`
//! units, and each resolver may be gated on a caller identity.
//!
//! ```rust,ignore
//! // src/resolvers/users_resolvers.rs
//! use etude_core::prelude::*;
//!
//! #[derive(Default)]
//! pub struct UsersResolvers;
//!
//! #[resolvers]
//! impl UsersResolvers {
//!     #[require_identity("admin")]
//!     pub async fn get_users_by_name(&self, ctx: RequestContext) -> Result<Vec<User>, ResolverError> {
//!         // served as POST /api/getUsersByName
//!     }
//! }
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod logging;
pub mod naming;
pub mod prelude;
pub mod registry;
pub mod resolver;
pub mod testing;

pub use app::{App, AppState};
pub use client::{ClientError, ResolverClient};
pub use config::Config;
pub use discovery::{Discovery, LoadedUnit, UnitCatalog};
pub use dispatch::Dispatcher;
pub use error::{DiscoveryError, DuplicateHandlerError, ResolverError, UnknownHandlerError};
pub use gate::require_identity;
pub use registry::HandlerRegistry;
pub use resolver::{RequestContext, Resolver};
pub use testing::{TestApp, TestClient, TestResponse};

pub use etude_macros::resolvers;

// Used by macro expansions.
#[doc(hidden)]
pub use inventory;

/// Export free `async fn(RequestContext)` functions as one discoverable unit.
///
/// Each function is registered under its wire name (`purge_cache` →
/// `purgeCache`); `#[require_identity("label")]` gates a single entry.
///
/// ```rust,ignore
/// // src/resolvers/system_resolvers.rs
/// async fn ping(_ctx: RequestContext) -> Result<&'static str, ResolverError> {
///     Ok("pong")
/// }
///
/// async fn purge_cache(_ctx: RequestContext) -> Result<(), ResolverError> {
///     Ok(())
/// }
///
/// export_resolvers! {
///     ping,
///     #[require_identity("admin")] purge_cache,
/// }
/// ```
#[macro_export]
macro_rules! export_resolvers {
    ($( $(#[require_identity($label:literal)])? $func:ident ),+ $(,)?) => {
        const _: () = {
            fn __etude_load_unit() -> $crate::discovery::UnitFuture {
                $crate::discovery::unit_future(async {
                    let resolvers = ::std::vec![$(
                        {
                            let resolver = $crate::Resolver::new(
                                $crate::naming::wire_name(::std::stringify!($func)),
                                $func,
                            );
                            $( let resolver = $crate::gate::require_identity($label).wrap(resolver); )?
                            resolver
                        }
                    ),+];
                    ::std::result::Result::<_, $crate::discovery::LoadError>::Ok(
                        $crate::discovery::LoadedUnit::exports(resolvers),
                    )
                })
            }

            $crate::inventory::submit! {
                $crate::discovery::LinkedUnit::new(
                    ::std::file!(),
                    ::std::env!("CARGO_MANIFEST_DIR"),
                    ::std::module_path!(),
                    __etude_load_unit,
                )
            }
        };
    };
}
