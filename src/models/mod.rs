pub mod category;
pub mod diary;
