pub use actix_web::http::header::ContentType;
pub use actix_web::{get, post, web, HttpRequest, HttpResponse};
pub use serde::{Deserialize, Serialize};

pub use tourney_db as db;

pub use crate::engine;
pub use crate::handlers::tmpl_data::*;
pub use crate::http_types::*;
pub use crate::read_model;
pub use crate::server_state::*;
