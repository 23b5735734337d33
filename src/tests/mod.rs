mod support;

mod client_tests;
