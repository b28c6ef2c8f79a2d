pub mod hasher;
pub mod tokener;
