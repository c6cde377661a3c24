use canopy::tooling::cli::{CliContext, Commands};
use canopy::types::TreeFamily;
use canopy::audience::Audience;
use tempfile::TempDir;

fn context(temp: &TempDir, family: TreeFamily) -> CliContext {
    let config = temp.path().join("test.toml");
    std::fs::write(&config, "[storage]\nstore_path = \"db\"\n").unwrap();
    CliContext::new(temp.path().to_path_buf(), Some(config), family).unwrap()
}

fn create(ctx: &CliContext, label: &str, parent: Option<canopy::NodeId>) -> String {
    ctx.execute(&Commands::Create {
        label: label.to_string(),
        parent,
        kind: None,
        external_ref: Some(format!("/{}", label.to_lowercase())),
        description: None,
        role: None,
        inactive: false,
    })
    .unwrap()
}

#[test]
fn tree_json_contract_is_flat_preorder() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, TreeFamily::Navigation);
    create(&ctx, "Home", None);
    let home = ctx.service().list_all(None).unwrap()[0].id;
    create(&ctx, "News", Some(home));

    let output = ctx
        .execute(&Commands::Tree {
            audience: Audience::Guest,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["label"], "Home");
    assert_eq!(rows[0]["parent_id"], serde_json::Value::Null);
    assert_eq!(rows[0]["children"].as_array().unwrap().len(), 1);
    assert_eq!(rows[1]["label"], "News");
    assert_eq!(rows[1]["parent_id"], rows[0]["id"]);
    assert_eq!(rows[1]["depth"], 1);
    assert_eq!(rows[1]["children"], serde_json::json!([]));
}

#[test]
fn path_text_joins_labels() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, TreeFamily::Navigation);
    create(&ctx, "Home", None);
    let home = ctx.service().list_all(None).unwrap()[0].id;
    create(&ctx, "News", Some(home));

    let output = ctx
        .execute(&Commands::Path {
            id: None,
            external_ref: Some("/news".to_string()),
            format: "text".to_string(),
        })
        .unwrap();
    assert_eq!(output, "Home > News");
}

#[test]
fn stats_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, TreeFamily::Assets);
    create(&ctx, "Media", None);

    let output = ctx
        .execute(&Commands::Stats {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["family"], "assets");
    assert_eq!(parsed["stats"]["total"], 1);
    assert!(parsed["stats"]["by_kind"].is_object());
}

#[test]
fn config_command_prints_toml() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, TreeFamily::Navigation);
    let output = ctx.execute(&Commands::Config).unwrap();
    let parsed: toml::Value = toml::from_str(&output).unwrap();
    assert_eq!(parsed["tree"]["depth_policy"].as_str(), Some("cascade"));
}
