//! TalentRAG server library: shared state, HTTP routes and the `validate`
//! command, used by the `talentrag` binary.

pub mod routes;
pub mod state;
pub mod validate;

pub use routes::build_router;
pub use state::AppState;
