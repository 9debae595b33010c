use std::sync::LazyLock;

use crate::build_info::BUILD_INFO;

/// Version reported by `--version` and the startup log line, e.g.
/// `1.2.0-3f2c1ab` or `latest-unknown`.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    describe(
        env!("IMAGE_VERSION"),
        BUILD_INFO.commit_sha1,
        BUILD_INFO.git_dirty(),
    )
});

fn describe(release: &str, commit_sha1: Option<&str>, dirty: bool) -> String {
    let commit = commit_sha1.map(|sha| &sha[..sha.len().min(7)]);
    format!(
        "{}-{}{}",
        release,
        commit.unwrap_or("unknown"),
        if dirty { "-dirty" } else { "" }
    )
}
