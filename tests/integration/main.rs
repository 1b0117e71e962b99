//! End-to-end tests against a wiremock site

mod crawl_tests;
mod resume_tests;
