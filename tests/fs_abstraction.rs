mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder, WatchRuleBuilder};
use crate::common::RecordingReload;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetpipe::config::StageConfig;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::FileSystem;
use assetpipe::pipeline::{build_stages, run_pipeline, BannerContext, PackageInfo, PipelineEnv};
use assetpipe::reload::ReloadEvent;
use assetpipe::watch::hash::compute_file_hash;
use assetpipe::watch::{build_rule_profiles, collect_matching_files};

#[test]
fn mock_fs_hashing() {
    let fs = MockFileSystem::new();
    fs.add_file("test.txt", "hello world");

    let hash = compute_file_hash(&fs, &PathBuf::from("test.txt")).unwrap();
    // blake3 hash of "hello world"
    assert_eq!(hash, "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24");
}

#[test]
fn mock_fs_watch_patterns() {
    let fs = MockFileSystem::new();
    fs.add_file("./scss/base/_type.scss", "h1{}");
    fs.add_file("./scss/screen.scss", "@import 'base/type';");
    fs.add_file("./README.md", "# Readme");
    fs.add_file("./node_modules/x/y.scss", "x{}");

    let cfg = ConfigFileBuilder::new()
        .with_global_exclude("node_modules/**")
        .with_task("css", TaskConfigBuilder::command("echo css").build())
        .with_watch_rule(WatchRuleBuilder::new("**/*.scss", &["css"]).build())
        .build();
    let profiles = build_rule_profiles(&cfg).unwrap();

    let files = collect_matching_files(&fs, Path::new("."), &profiles[0]).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(".").unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["scss/base/_type.scss", "scss/screen.scss"]);
}

#[test]
fn script_pipeline_runs_entirely_in_memory() {
    let fs = MockFileSystem::new();
    fs.add_file("package.json", r#"{"name":"botbot","author":{"name":"Lincoln Loop"},"version":"2.0.0","license":"MIT"}"#);
    fs.add_file(
        "src/js/scripts.js",
        "var unused = 1;\nfunction toggle(el) {\n  el.classList.toggle('open');\n}\ntoggle(document.body);\n",
    );

    let section = assetpipe::config::PackageSection {
        file: Some("package.json".to_string()),
        title: Some("BotBot.me".to_string()),
        ..Default::default()
    };
    let package = PackageInfo::load(&fs, Path::new("."), &section).unwrap();
    let reload = RecordingReload::new();
    let env = PipelineEnv {
        root: PathBuf::from("."),
        fs: Arc::new(fs.clone()),
        banner: Arc::new(BannerContext::new(package, None)),
        reload: Arc::new(reload.clone()),
    };

    let stages = build_stages(&[
        StageConfig::LintJs { fail_on_error: false },
        StageConfig::Banner { template: None },
        StageConfig::Dest { dir: "static/js".to_string() },
        StageConfig::MinifyJs,
        StageConfig::Banner { template: Some("/*! {{ package.name }} v{{ package.version }} */\n".to_string()) },
        StageConfig::Rename { prefix: None, suffix: Some(".min".to_string()), ext: None },
        StageConfig::Dest { dir: "static/js".to_string() },
        StageConfig::Reload { once: true },
    ])
    .unwrap();

    let report = run_pipeline("js", &["src/js/scripts.js".to_string()], &stages, &env).unwrap();
    assert_eq!(report.written.len(), 2);

    let plain = fs.contents("static/js/scripts.js").unwrap();
    assert!(plain.contains(" * BotBot.me\n"));
    assert!(plain.contains("@author Lincoln Loop"));
    assert!(plain.contains("el.classList.toggle('open')"));

    let min = fs.contents("static/js/scripts.min.js").unwrap();
    assert!(min.starts_with("/*! botbot v2.0.0 */\n"));
    assert!(min.len() < plain.len());
    assert!(!fs.exists(Path::new("static/js/scripts.min.min.js")));

    assert_eq!(reload.events(), vec![ReloadEvent::Reload]);
}
