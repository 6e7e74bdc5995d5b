mod common;
mod storage_tests;
