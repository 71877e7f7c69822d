pub mod claims;
pub mod middleware;
pub mod rate_limit;
