mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod read_model;
    pub mod schema;
    pub mod shopping_list;
    pub mod write_model;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod handlers;
    pub mod rejection;
    pub mod routes;
    pub mod state;
}
mod constants;

mod cache {
    pub mod cache;
}

pub mod config;
pub mod media;

pub use api::*;
pub use authentication::*;
pub use cache::cache::*;
pub use constants::*;
pub use database::*;
