pub mod bucket;
pub mod fragment;
pub mod posting;
pub mod search;
