pub mod analyzer_suite;
