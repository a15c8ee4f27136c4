//! Integration tests for CLI commands
//!
//! Every test runs the binary inside a fresh temporary directory against a
//! local-only configuration (EnvFile and Vars sources).

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const LOCAL_CONFIG: &str = r#"
contexts: [local, prod]
sources:
  - type: Vars
    name: defaults
    vars:
      - { name: LOG_LEVEL, value: info }
      - { name: FEATURE_X, value: "on" }
  - type: EnvFile
    path: local.env
    contexts:
      include: [local]
    variables:
      exclude: [SECRET_TOKEN]
  - type: Vars
    name: prod-only
    contexts:
      include: [prod]
    vars:
      - { name: REPLICAS, value: "3" }
executions:
  - name: local
    contexts: [local]
    output:
      directory: generated/local
  - name: prod
    contexts: [prod]
    output:
      name: prod.env
"#;

/// Helper to run enver inside `dir`
fn enver(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_enver"))
        .args(args)
        .current_dir(dir)
        .env("GIT_CEILING_DIRECTORIES", dir.parent().unwrap_or(dir))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute enver")
}

fn workspace(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".enver.yaml"), config).unwrap();
    std::fs::write(
        dir.path().join("local.env"),
        "# developer overrides\nDATABASE_URL=postgres://localhost/dev\nSECRET_TOKEN=abc\n",
    )
    .unwrap();
    dir
}

fn read(dir: &TempDir, path: &str) -> String {
    std::fs::read_to_string(dir.path().join(path)).unwrap()
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let dir = workspace(LOCAL_CONFIG);
        let output = enver(dir.path(), &["validate"]);

        assert!(output.status.success(), "Expected success for valid config");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Validation passed: 3 source(s), 2 execution(s)"));
    }

    #[test]
    fn test_validate_reports_every_error() {
        let dir = workspace(
            r#"
sources:
  - type: Vars
    name: a
    transformations: [{ type: rot13 }]
  - type: Secret
"#,
        );
        let output = enver(dir.path(), &["validate"]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("unknown transformation type: rot13"));
        assert!(stdout.contains("name is required for Secret source"));
    }

    #[test]
    fn test_missing_config() {
        let dir = TempDir::new().unwrap();
        let output = enver(dir.path(), &["validate"]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("failed to read .enver.yaml"));
    }
}

mod execute_command {
    use super::*;

    #[test]
    fn test_execute_all() {
        let dir = workspace(LOCAL_CONFIG);
        let output = enver(dir.path(), &["execute", "--all"]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Executing: local"));
        assert!(stdout.contains("Executing: prod"));
        assert!(stdout.contains("[local] Wrote 3 environment variables to generated/local/.env"));
        assert!(stdout.contains("[prod] Wrote 3 environment variables to generated/prod.env"));

        insta::assert_snapshot!(read(&dir, "generated/local/.env"), @r"
        # Vars defaults
        LOG_LEVEL=info
        FEATURE_X=on

        # EnvFile local.env
        DATABASE_URL=postgres://localhost/dev
        ");
        insta::assert_snapshot!(read(&dir, "generated/prod.env"), @r"
        # Vars defaults
        LOG_LEVEL=info
        FEATURE_X=on

        # Vars prod-only
        REPLICAS=3
        ");
    }

    #[test]
    fn test_execute_by_name() {
        let dir = workspace(LOCAL_CONFIG);
        let output = enver(dir.path(), &["execute", "--name", "prod"]);

        assert!(output.status.success());
        assert!(dir.path().join("generated/prod.env").exists());
        assert!(!dir.path().join("generated/local/.env").exists());
    }

    #[test]
    fn test_execute_unknown_name() {
        let dir = workspace(LOCAL_CONFIG);
        let output = enver(dir.path(), &["execute", "--name", "staging"]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("not found in .enver.yaml"));
    }

    #[test]
    fn test_execute_requires_selection() {
        let dir = workspace(LOCAL_CONFIG);
        let output = enver(dir.path(), &["execute"]);

        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_failures_are_aggregated() {
        let dir = workspace(
            r#"
sources:
  - type: EnvFile
    path: missing.env
    contexts: { include: [broken] }
  - type: ConfigMap
    name: app-config
    contexts: { include: [cluster] }
  - type: Vars
    name: inline
    vars: [{ name: A, value: "1" }]
executions:
  - name: ok
    contexts: [fine]
  - name: broken
    contexts: [broken]
  - name: cluster
    contexts: [cluster]
"#,
        );
        let output = enver(dir.path(), &["execute", "--all"]);

        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("execution errors:"));
        assert!(stderr.contains("broken: IO error: failed to read env file missing.env"));
        assert!(stderr.contains(
            "cluster: Configuration error: execution \"cluster\" requires Kubernetes sources"
        ));

        // Successful executions still write their output
        assert_eq!(read(&dir, "generated/.env"), "# Vars inline\nA=1\n");
    }
}

mod generate_command {
    use super::*;

    #[test]
    fn test_generate_with_contexts() {
        let dir = workspace(LOCAL_CONFIG);
        let output = enver(
            dir.path(),
            &[
                "generate",
                "--context",
                "prod",
                "--output-directory",
                "out",
                "--output-name",
                "app.env",
            ],
        );

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Wrote 3 environment variables to out/app.env"));
        assert!(read(&dir, "out/app.env").contains("REPLICAS=3"));
    }

    #[test]
    fn test_generate_file_transformation() {
        let dir = workspace(
            r#"
sources:
  - type: Vars
    name: certs
    vars:
      - { name: CA_CERT, value: "-----BEGIN CERTIFICATE-----" }
      - { name: HOST, value: api.local }
    transformations:
      - type: file
        variables: [CA_CERT]
        output: certs/ca.pem
        key: CA_CERT_PATH
      - type: prefix
        target: key
        variables: [HOST]
        value: APP_
"#,
        );
        let output = enver(dir.path(), &["generate"]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert_eq!(
            read(&dir, "generated/certs/ca.pem"),
            "-----BEGIN CERTIFICATE-----"
        );
        insta::assert_snapshot!(read(&dir, "generated/.env"), @r"
        # Vars certs
        CA_CERT_PATH=generated/certs/ca.pem
        APP_HOST=api.local
        ");
    }
}

mod gitignore_tracking {
    use super::*;

    /// Initialise a repository in `dir`; false when git is unavailable
    fn git_init(dir: &Path) -> bool {
        Command::new("git")
            .args(["init", "-q"])
            .current_dir(dir)
            .status()
            .is_ok_and(|status| status.success())
    }

    /// A Vars source whose certificate is written outside the output directory
    fn cert_workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let config = format!(
            r#"
sources:
  - type: Vars
    name: certs
    vars:
      - {{ name: CA_CERT, value: pem }}
    transformations:
      - type: file
        variables: [CA_CERT]
        output: {}
        key: CA_CERT_PATH
"#,
            dir.path().join("secrets/ca.pem").display()
        );
        std::fs::write(dir.path().join(".enver.yaml"), config).unwrap();
        dir
    }

    #[test]
    fn test_generate_appends_every_written_directory() {
        let dir = cert_workspace();
        if !git_init(dir.path()) {
            return;
        }

        let output = enver(dir.path(), &["generate", "--gitignore"]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert_eq!(read(&dir, "secrets/ca.pem"), "pem");
        assert_eq!(read(&dir, ".gitignore"), "generated/\nsecrets/\n");
    }

    #[test]
    fn test_generate_warns_about_unignored_files() {
        let dir = cert_workspace();
        if !git_init(dir.path()) {
            return;
        }
        std::fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();

        let output = enver(dir.path(), &["generate"]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("ca.pem is not covered by .gitignore"));
        assert!(!stdout.contains(".env is not covered"));
        assert_eq!(read(&dir, ".gitignore"), "generated/\n");
    }
}
