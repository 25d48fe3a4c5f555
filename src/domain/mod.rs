pub mod decision;
pub mod entity;
pub mod grid;
pub mod rules;
pub mod scan;
pub mod tile;
