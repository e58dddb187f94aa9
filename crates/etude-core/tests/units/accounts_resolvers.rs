use std::sync::atomic::{AtomicUsize, Ordering};

use etude_core::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub age: u32,
}

#[derive(Deserialize)]
struct ByName {
    name: String,
}

pub struct AccountsResolvers {
    users: Vec<User>,
    calls: AtomicUsize,
}

#[resolvers]
impl AccountsResolvers {
    pub fn new() -> Self {
        AccountsResolvers {
            users: vec![
                User {
                    id: 1,
                    name: "Anatoly".to_string(),
                    age: 42,
                },
                User {
                    id: 2,
                    name: "Grace".to_string(),
                    age: 36,
                },
            ],
            calls: AtomicUsize::new(0),
        }
    }

    #[require_identity("admin")]
    pub async fn get_users_by_name(&self, ctx: RequestContext) -> Result<Vec<User>, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let query: ByName = ctx.parse()?;
        Ok(self
            .users()
            .iter()
            .filter(|u| u.name == query.name)
            .cloned()
            .collect())
    }

    /// Counts every call made through this group instance, itself included.
    pub async fn count_calls(&self) -> Result<usize, ResolverError> {
        Ok(self.calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[resolver(rename = "whoAmI")]
    pub async fn caller(&self, ctx: RequestContext) -> Result<Option<String>, ResolverError> {
        Ok(ctx.caller_identity().map(str::to_owned))
    }

    pub async fn fail(&self) -> Result<(), ResolverError> {
        Err(ResolverError::internal("ledger unavailable"))
    }

    #[resolver(skip)]
    pub fn users(&self) -> &[User] {
        &self.users
    }
}
