#![allow(dead_code)]

pub use assetpipe_test_utils::builders;
pub use assetpipe_test_utils::fake_executor::FakeExecutor;
pub use assetpipe_test_utils::recording_reload::RecordingReload;
pub use assetpipe_test_utils::{init_tracing, with_timeout};

use std::path::Path;
use std::sync::Arc;

use assetpipe::fs::RealFileSystem;
use assetpipe::pipeline::{BannerContext, PackageInfo, PipelineEnv};

/// Write `(relative path, contents)` pairs under `root`.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

/// Pipeline environment over the real filesystem rooted at `root`, with
/// fixed package metadata and a recording reload sink.
pub fn real_env(root: &Path, reload: RecordingReload) -> PipelineEnv {
    let package = PackageInfo::from_json(
        r#"{"name":"botbot","title":"BotBot","url":"https://botbot.me","author":"Lincoln Loop","version":"1.2.3","license":"MIT"}"#,
    )
    .unwrap();

    PipelineEnv {
        root: root.to_path_buf(),
        fs: Arc::new(RealFileSystem),
        banner: Arc::new(BannerContext::new(package, None)),
        reload: Arc::new(reload),
    }
}
