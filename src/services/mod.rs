pub mod ranked_index;
pub mod ranking;
