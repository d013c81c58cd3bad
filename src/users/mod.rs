// User management module
// Profile endpoints plus admin user administration; persistence lives in auth::repository

pub mod handlers;
pub mod models;
