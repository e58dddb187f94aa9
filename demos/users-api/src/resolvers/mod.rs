mod system_resolvers;
mod users_resolvers;
