//! Configuration parsing and validation tests

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use vendorism::config::{Config, EditorLock, Hooks};
use vendorism::error::VendorError;
use vendorism::system::{MockSystem, RealSystem};
use vendorism::transforms::{InlineTransform, Rule};

fn load(content: &str, file_name: &str) -> anyhow::Result<Config> {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join(file_name);
    fs::write(&config_path, content).unwrap();
    Config::load_from_file(&RealSystem, config_path.to_str().unwrap())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<VendorError>()
        .map_or(1, VendorError::exit_code)
}

#[test]
fn test_full_yaml_config() {
    let config = load(
        r#"
source:
  path: ./vendor/source
  url: acme/widgets
  hooks:
    before: echo fetching
  download:
    ref: v1.2.0
    subdirectory: packages/core
    clean: true
target:
  path: ./src/vendor
  includes:
    - "lib/**/*.ts"
    - "README.md"
  excludeDependencies: true
  transforms:
    - name: rebrand
      files: ["**/*.ts"]
      content:
        - replace: Widgets
          with: Gadgets
        - between: ["/* start */", "/* end */"]
          with: ""
      path:
        - regex: "^lib/"
          with: ""
  globalTransformFolder: ./transforms/global
  fileTransformFolder: ./transforms/files
  patchFolder: ./patches
  hooks:
    after: npm run format
  removeVendors:
    dot: false
    ignore: ["generated/**"]
  lockFilesForVsCode: .vscode/custom.json
"#,
        "vendorism.yaml",
    )
    .unwrap();

    assert_eq!(config.source.path, "./vendor/source");
    assert_eq!(config.source.url.as_deref(), Some("acme/widgets"));
    assert_eq!(
        config.source.hooks,
        Some(Hooks {
            before: Some("echo fetching".to_owned()),
            after: None,
        })
    );
    let download = config.source.download.as_ref().unwrap();
    assert_eq!(download.git_ref.as_deref(), Some("v1.2.0"));
    assert_eq!(download.subdirectory.as_deref(), Some("packages/core"));
    assert!(download.clean);

    let target = &config.target;
    assert_eq!(target.path.as_deref(), Some("./src/vendor"));
    assert_eq!(target.includes, vec!["lib/**/*.ts", "README.md"]);
    assert!(target.exclude_dependencies);
    assert_eq!(target.patch_folder.as_deref(), Some("./patches"));
    assert!(target.remove_vendors.gitignore);
    assert!(!target.remove_vendors.dot);
    assert_eq!(target.remove_vendors.ignore, vec!["generated/**"]);
    assert_eq!(
        target.lock_files_for_vs_code,
        Some(EditorLock::SettingsPath(".vscode/custom.json".to_owned()))
    );
    assert_eq!(
        config.editor_settings(),
        Some(PathBuf::from(".vscode/custom.json"))
    );

    let InlineTransform::Rules(spec) = &target.transforms[0] else {
        panic!("expected declarative rules");
    };
    assert_eq!(spec.name.as_deref(), Some("rebrand"));
    assert_eq!(spec.content.len(), 2);
    assert!(matches!(spec.content[1], Rule::Between { .. }));
    assert!(matches!(spec.path[0], Rule::Regex { .. }));
}

#[test]
fn test_json_config() {
    let config = load(
        r#"{
    "source": { "path": "source" },
    "target": {
        "path": "target",
        "includes": ["*.js"],
        "lockFilesForVsCode": true
    }
}"#,
        "vendorism.json",
    )
    .unwrap();

    assert_eq!(config.target.includes, vec!["*.js"]);
    assert_eq!(
        config.editor_settings(),
        Some(PathBuf::from(".vscode/settings.json"))
    );
}

#[test]
fn test_source_only_config() {
    let config = load("source:\n  path: ./source\n", "vendorism.yaml").unwrap();

    assert_eq!(config.target.path, None);
    assert!(config.target.transforms.is_empty());
}

#[test]
fn test_missing_source_path() {
    let err = load("target:\n  path: out\n  includes: ['*']\n", "vendorism.yaml").unwrap_err();
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = load(
        "source:\n  path: src\n  branch: main\n",
        "vendorism.yaml",
    )
    .unwrap_err();
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_target_path_requires_includes() {
    let err = load(
        "source:\n  path: src\ntarget:\n  path: out\n",
        "vendorism.yaml",
    )
    .unwrap_err();
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_banner_override_must_carry_the_tag() {
    let err = load(
        "source:\n  path: src\ntarget:\n  path: out\n  includes: ['*']\n  banner: \"// generated\\n\"\n",
        "vendorism.yaml",
    )
    .unwrap_err();
    assert_eq!(exit_code(&err), 1);

    load(
        "source:\n  path: src\ntarget:\n  path: out\n  includes: ['*']\n  banner: \"// @vendorism generated\\n\"\n",
        "vendorism.yaml",
    )
    .unwrap();
}

#[test]
fn test_invalid_transform_regex() {
    let err = load(
        "source:\n  path: src\ntarget:\n  path: out\n  includes: ['*']\n  transforms:\n    - content:\n        - regex: \"(unclosed\"\n          with: x\n",
        "vendorism.yaml",
    )
    .unwrap_err();
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_malformed_yaml() {
    let err = load("source: [\n", "vendorism.yaml").unwrap_err();
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_mock_system_config() {
    let system = MockSystem::new()
        .with_file(
            "/project/vendorism.yaml",
            b"source:\n  path: /project/source\ntarget:\n  path: /project/target\n  includes: ['**/*']\n",
        )
        .unwrap();

    let config = Config::load_from_file(&system, "/project/vendorism.yaml").unwrap();

    assert_eq!(config.source_root(), PathBuf::from("/project/source"));
    assert_eq!(config.target_root(), Some(PathBuf::from("/project/target")));
    assert!(Config::load_from_file(&system, "/project/missing.yaml").is_err());
}
