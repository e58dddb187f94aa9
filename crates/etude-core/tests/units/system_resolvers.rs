use etude_core::prelude::*;

async fn ping(_ctx: RequestContext) -> Result<&'static str, ResolverError> {
    Ok("pong")
}

async fn echo(ctx: RequestContext) -> Result<Value, ResolverError> {
    Ok(ctx.into_body())
}

async fn purge_cache(_ctx: RequestContext) -> Result<bool, ResolverError> {
    Ok(true)
}

export_resolvers! {
    ping,
    echo,
    #[require_identity("admin")] purge_cache,
}
