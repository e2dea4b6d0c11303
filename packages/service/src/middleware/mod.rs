//! Request middleware layered over the friend routes.

pub mod notify;
