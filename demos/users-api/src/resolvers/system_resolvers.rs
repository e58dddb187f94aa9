use etude_core::prelude::*;

async fn ping(_ctx: RequestContext) -> Result<&'static str, ResolverError> {
    Ok("pong")
}

async fn version(_ctx: RequestContext) -> Result<Value, ResolverError> {
    Ok(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

export_resolvers! {
    ping,
    version,
}
