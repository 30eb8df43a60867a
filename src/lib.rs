// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod converter;
pub mod input;
pub mod table;

pub use converter::convert_dump_to_innodb;
