/// Handler Module Index
///
/// One module per resource family. Handlers stay thin: bind the request,
/// call the repository, map the outcome onto the error taxonomy. All
/// authorization that depends on a specific record happens inside the
/// repository call itself, never as a separate check here.
pub mod admin;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod jobs;
pub mod profile;
pub mod projects;
pub mod social;
pub mod uploads;
