pub mod clear;
pub mod list;
pub mod load;
pub mod program;
pub mod reset;
pub mod run;
pub mod serve;
pub mod test_suite;
pub mod verify;
