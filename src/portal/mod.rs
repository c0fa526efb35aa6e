//! Portal domain rules: who may see what, how invitations move through their
//! states, and how a project's document tree is built, limited and deleted.
//!
//! Every portal-scoped operation passes through [`access::authorize`] first.

pub mod access;
pub mod documents;
pub mod membership;
pub mod projects;
pub mod quota;
pub mod tree;
