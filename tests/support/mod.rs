#![allow(dead_code)]

use std::path::Path;

use dagd::adapter::inbound::cli::Cli;
use dagd::infrastructure::config::Settings;
use dagd::testkit::TestNode;

use clap::Parser;

/// Node with `blocks` blocks and `peers` peers at the tip.
pub fn node(blocks: i64, peers: usize) -> TestNode {
    TestNode::builder().blocks(blocks).peers(peers).build()
}

/// Settings as the binary would build them for `--data-dir <dir>` plus `extra`.
pub fn settings(dir: &Path, extra: &[&str]) -> Settings {
    let mut argv = vec!["dagd", "--data-dir", dir.to_str().expect("utf-8 temp dir")];
    argv.extend_from_slice(extra);
    Settings::with_env_override(Cli::try_parse_from(argv).expect("valid flags"), None)
}

#[track_caller]
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "expected output to contain {needle:?}, got:\n{haystack}"
    );
}
