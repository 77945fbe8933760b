use std::fs;

use tempfile::TempDir;

use strata_core::commands::{CommandContext, PublishCommand, PublishOptions, VersionsCommand};
use strata_core::config::{ConfigStore, ServerEntry, StrataConfig};
use strata_core::deploy::PublishPhase;
use strata_core::transfer::CancelToken;
use strata_core::types::{DeltaKind, PublishKind, PublishState};

struct Env {
    temp: TempDir,
    ctx: CommandContext,
}

fn env() -> Env {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config").join("strata.toml");
    let mut config = StrataConfig::new();
    config
        .servers
        .insert("local".to_string(), ServerEntry::new(temp.path().join("deploy")));
    ConfigStore::new(config_path.clone()).save(&config).unwrap();

    let source = temp.path().join("src").join("orders");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("deploy.xml"), "<deploy/>").unwrap();
    fs::write(source.join("orders.bpel"), "<process/>").unwrap();

    let ctx = CommandContext::new(config_path, temp.path().join("state"));
    Env { temp, ctx }
}

fn publish_options(env: &Env) -> PublishOptions {
    PublishOptions::new("local", "orders", env.temp.path().join("src").join("orders"))
        .with_project("shop")
}

#[test]
fn publish_then_list_versions() {
    let env = env();
    let report = PublishCommand::new(&env.ctx)
        .execute(&publish_options(&env), &CancelToken::new())
        .unwrap();

    assert!(report.is_ok(), "{:?}", report.errors);
    assert_eq!(report.state, PublishState::None);
    assert!(report.recorded);
    let target = report.target_path.clone().unwrap();
    assert!(target.is_file());
    assert!(target.starts_with(env.temp.path().join("deploy")));

    let versions = VersionsCommand::new(&env.ctx).list("local", None).unwrap();
    assert_eq!(versions.total(), 1);
    assert_eq!(
        versions.projects["shop"],
        vec![target.to_string_lossy().to_string()]
    );
}

#[test]
fn unchanged_module_with_prior_version_is_not_republished() {
    let env = env();
    let cmd = PublishCommand::new(&env.ctx);
    cmd.execute(&publish_options(&env), &CancelToken::new())
        .unwrap();

    let report = cmd
        .execute(
            &publish_options(&env)
                .with_kind(PublishKind::Auto)
                .with_delta(DeltaKind::NoChange),
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(report.state, PublishState::Incremental);
    assert!(report.target_path.is_none());
    assert_eq!(
        VersionsCommand::new(&env.ctx)
            .list("local", Some("shop"))
            .unwrap()
            .total(),
        1
    );
}

#[test]
fn removed_delta_clears_deployed_versions() {
    let env = env();
    let cmd = PublishCommand::new(&env.ctx);
    let first = cmd
        .execute(&publish_options(&env), &CancelToken::new())
        .unwrap();
    let target = first.target_path.unwrap();

    let report = cmd
        .execute(
            &publish_options(&env).with_delta(DeltaKind::Removed),
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(report.state, PublishState::Unknown);
    assert_eq!(report.phase, PublishPhase::Done);
    assert!(report.removal.unwrap().ledger_cleared);
    assert!(!target.exists());
    assert_eq!(
        VersionsCommand::new(&env.ctx)
            .list("local", None)
            .unwrap()
            .total(),
        0
    );
}

#[test]
fn undeploy_rejects_unrecorded_paths() {
    let env = env();
    let err = VersionsCommand::new(&env.ctx)
        .undeploy("local", "shop", "/nowhere/orders.jar", &CancelToken::new())
        .unwrap_err();
    assert!(err.to_string().contains("is not a recorded version"));
}

#[test]
fn servers_report_recorded_counts() {
    let env = env();
    PublishCommand::new(&env.ctx)
        .execute(&publish_options(&env), &CancelToken::new())
        .unwrap();

    let servers = VersionsCommand::new(&env.ctx).servers().unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name, "local");
    assert!(servers[0].zip_deployments);
    assert_eq!(servers[0].recorded_versions, 1);
}

#[test]
fn servers_skip_blank_ledger_entries() {
    let env = env();
    let settings = env.ctx.server("local").unwrap();
    let ledger = env.ctx.ledger(&settings);
    ledger.add("shop", "/deploy/a.jar").unwrap();
    ledger.add("shop", "   ").unwrap();

    let cmd = VersionsCommand::new(&env.ctx);
    assert_eq!(cmd.servers().unwrap()[0].recorded_versions, 1);
    assert_eq!(cmd.list("local", None).unwrap().total(), 1);
}
