use etude_core::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Deserialize)]
struct ByName {
    name: String,
}

/// User lookups over a fixed in-memory set.
pub struct UsersResolvers {
    users: Vec<User>,
}

#[resolvers]
impl UsersResolvers {
    pub fn new() -> Self {
        let users = [("Anatoly", 42), ("Ada", 36), ("Linus", 54)]
            .into_iter()
            .zip(1..)
            .map(|((name, age), id)| User {
                id,
                name: name.to_string(),
                age,
            })
            .collect();

        UsersResolvers { users }
    }

    #[require_identity("admin")]
    pub async fn get_users_by_name(&self, ctx: RequestContext) -> Result<Vec<User>, ResolverError> {
        let query: ByName = ctx.parse()?;
        tracing::debug!(name = %query.name, "looking up users");

        Ok(self
            .users
            .iter()
            .filter(|user| user.name == query.name)
            .cloned()
            .collect())
    }

    pub async fn count_users(&self) -> Result<usize, ResolverError> {
        Ok(self.users.len())
    }
}
