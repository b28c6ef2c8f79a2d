pub mod hasher;
pub mod repository;
pub mod tokener;
