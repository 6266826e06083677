pub mod recommend;
pub mod recommendations;
pub mod summarize;
