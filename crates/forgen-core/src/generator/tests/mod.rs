pub mod driver_tests;
