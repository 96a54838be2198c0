pub mod test_join_failures;
