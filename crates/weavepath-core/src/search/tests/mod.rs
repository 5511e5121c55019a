mod policy_tests;
mod support;
