// Prelude: import everything a resolver unit usually needs with one line.
//
// ```rust,ignore
// use etude_core::prelude::*;
// ```

pub use crate::app::{App, AppState};
pub use crate::config::Config;
pub use crate::discovery::{Discovery, LoadedUnit, ResolverGroup, UnitCatalog};
pub use crate::dispatch::Dispatcher;
pub use crate::error::{DiscoveryError, ResolverError};
pub use crate::export_resolvers;
pub use crate::gate::require_identity;
pub use crate::logging::{init_logging, init_logging_json, init_logging_pretty, init_logging_with_level};
pub use crate::registry::HandlerRegistry;
pub use crate::resolver::{RequestContext, Resolver};

pub use etude_macros::resolvers;

pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};
