// Never compiled: no module declares this file. It sits in the unit tree so
// discovery has a `.rs` file without the `_resolvers` suffix to skip.
pub const REPORT_LIMIT: usize = 100;
