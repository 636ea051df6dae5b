//! Flutter bridge for daylist.

pub mod api;
