pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod helpers;
pub(crate) mod pagination;
pub(crate) mod reports;
pub(crate) mod router;
pub(crate) mod student;
pub(crate) mod subjects;
pub(crate) mod teacher;
pub(crate) mod users;
pub(crate) mod validation;
