pub mod guard_tests;
pub mod stability_tests;
pub mod scenario_tests;
