//! Integration tests for the asset uploader

mod test_utils;

mod manifest_merge;
mod resume;
