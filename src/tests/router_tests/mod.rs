mod audit_tests;
mod audit_trail_tests;
mod property_tests;
