use etude_core::prelude::*;

#[derive(Default)]
pub struct ReportsResolvers;

#[resolvers]
impl ReportsResolvers {
    pub async fn daily_report(&self) -> Result<Value, ResolverError> {
        Ok(json!({ "rows": 0 }))
    }
}
