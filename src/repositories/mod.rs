pub(crate) mod health;
pub(crate) mod options;
pub(crate) mod questions;
pub(crate) mod responses;
pub(crate) mod sessions;
pub(crate) mod subjects;
pub(crate) mod users;
