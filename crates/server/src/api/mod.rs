mod handlers;
mod library;
mod middleware;
mod routes;
mod subtitles;

pub use handlers::ErrorResponse;
pub use routes::create_router;
