mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{init_tracing, real_env, with_timeout, write_files, RecordingReload};

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;

use assetpipe::config::StageConfig;
use assetpipe::dag::Scheduler;
use assetpipe::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use assetpipe::errors::PipelineError;
use assetpipe::exec::RealExecutorBackend;
use assetpipe::pipeline::{build_stages, run_pipeline};
use assetpipe::reload::ReloadEvent;

type TestResult = Result<(), Box<dyn Error>>;

const SCREEN_CSS: &str = ".nav a {\n  color: red;\n  user-select: none;\n}\n\n.footer {\n  margin: 0px 0px 0px 0px;\n}\n";

fn style_stages() -> Vec<StageConfig> {
    vec![
        StageConfig::Autoprefix {
            browsers: vec!["safari 12".to_string()],
        },
        StageConfig::Dest {
            dir: "static/css".to_string(),
        },
        StageConfig::MinifyCss { browsers: vec![] },
        StageConfig::Rename {
            prefix: None,
            suffix: Some(".min".to_string()),
            ext: None,
        },
        StageConfig::Banner { template: None },
        StageConfig::Dest {
            dir: "static/css".to_string(),
        },
        StageConfig::Reload { once: false },
    ]
}

#[test]
fn style_pipeline_writes_plain_and_bannered_minified_variants() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    write_files(dir.path(), &[("styles/screen.css", SCREEN_CSS)]);
    let reload = RecordingReload::new();
    let env = real_env(dir.path(), reload.clone());

    let stages = build_stages(&style_stages())?;
    let report = run_pipeline("css", &["styles/*.css".to_string()], &stages, &env)?;

    assert_eq!(report.sources, 1);
    assert_eq!(
        report.written,
        vec![
            dir.path().join("static/css/screen.css"),
            dir.path().join("static/css/screen.min.css"),
        ]
    );

    let plain = std::fs::read_to_string(dir.path().join("static/css/screen.css"))?;
    assert!(plain.contains("-webkit-user-select"), "autoprefixed: {plain}");

    let min = std::fs::read_to_string(dir.path().join("static/css/screen.min.css"))?;
    assert!(min.starts_with("/*!\n * botbot\n * BotBot\n"), "banner first: {min}");
    assert!(min.contains("@author Lincoln Loop"));
    assert!(min.contains("MIT licensed."));
    let body = min.rsplit("*/\n").next().unwrap_or_default();
    assert!(body.len() < plain.len(), "minified body is shorter");
    assert!(body.contains(".nav a{"));

    assert_eq!(
        reload.events(),
        vec![ReloadEvent::Css {
            path: "screen.min.css".to_string()
        }]
    );
    Ok(())
}

#[test]
fn rerunning_on_unchanged_input_is_byte_identical() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_files(dir.path(), &[("styles/screen.css", SCREEN_CSS)]);
    let env = real_env(dir.path(), RecordingReload::new());
    let stages = build_stages(&style_stages())?;
    let src = vec!["styles/screen.css".to_string()];

    run_pipeline("css", &src, &stages, &env)?;
    let first = std::fs::read(dir.path().join("static/css/screen.min.css"))?;
    run_pipeline("css", &src, &stages, &env)?;
    let second = std::fs::read(dir.path().join("static/css/screen.min.css"))?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn entry_glob_decides_which_files_are_read() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_files(
        dir.path(),
        &[
            ("styles/screen.css", "a { color: red; }"),
            ("styles/print.css", "a { color: black; }"),
            ("styles/partials/_nav.css", "nav { color: blue; }"),
        ],
    );
    let env = real_env(dir.path(), RecordingReload::new());
    let stages = build_stages(&[StageConfig::Dest {
        dir: "out".to_string(),
    }])?;

    let one = run_pipeline("css", &["styles/screen.css".to_string()], &stages, &env)?;
    assert_eq!(one.written, vec![dir.path().join("out/screen.css")]);

    let top_level = run_pipeline("css", &["styles/*.css".to_string()], &stages, &env)?;
    assert_eq!(top_level.sources, 2);

    let nested = run_pipeline(
        "css",
        &["styles/**/*.css".to_string(), "!styles/print.css".to_string()],
        &stages,
        &env,
    )?;
    assert_eq!(
        nested.written,
        vec![dir.path().join("out/partials/_nav.css"), dir.path().join("out/screen.css")]
    );
    Ok(())
}

#[test]
fn missing_entry_file_fails_the_pipeline() -> TestResult {
    let dir = tempfile::tempdir()?;
    let env = real_env(dir.path(), RecordingReload::new());
    let stages = build_stages(&[StageConfig::MinifyJs])?;

    let err = run_pipeline("js", &["src/js/scripts.js".to_string()], &stages, &env).unwrap_err();
    assert!(matches!(err, PipelineError::MissingSource(path) if path.ends_with("src/js/scripts.js")));
    Ok(())
}

#[tokio::test]
async fn once_mode_runs_pipeline_then_dependent_command() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    write_files(
        dir.path(),
        &[("src/js/scripts.js", "function greet(name) {\n  return 'hi ' + name;\n}\ngreet('x');\n")],
    );

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "js",
            TaskConfigBuilder::pipeline(&["src/js/scripts.js"])
                .stage(StageConfig::MinifyJs)
                .stage(StageConfig::Rename {
                    prefix: None,
                    suffix: Some(".min".to_string()),
                    ext: None,
                })
                .stage(StageConfig::Dest {
                    dir: "static/js".to_string(),
                })
                .build(),
        )
        .with_task(
            "stamp",
            TaskConfigBuilder::command("test -f static/js/scripts.min.js && echo ok > stamp.txt")
                .after("js")
                .build(),
        )
        .build();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let env = Arc::new(real_env(dir.path(), RecordingReload::new()));
    let executor = RealExecutorBackend::new(rt_tx.clone(), env);

    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: "stamp".to_string(),
            reason: TriggerReason::Manual,
        })
        .await?;

    let core = CoreRuntime::new(
        Scheduler::from_config(&cfg),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    assert_eq!(std::fs::read_to_string(dir.path().join("stamp.txt"))?.trim(), "ok");
    Ok(())
}
