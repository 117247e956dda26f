//! CLI integration tests for Slipway.
//!
//! These tests verify the full CLI workflow from project creation through
//! deploying, inspecting, and destroying a stack.

use std::fs;

use assert_cmd::Command;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use slipway::test_support::ProjectFixture;

/// Get the slipway binary command.
fn slipway() -> Command {
    Command::cargo_bin("slipway").unwrap()
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// ============================================================================
// slipway new
// ============================================================================

#[test]
fn test_new_scaffolds_project() {
    let tmp = temp_dir();
    let project_dir = tmp.path().join("myapp");

    slipway()
        .args(["new", "myapp"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Created"));

    // Check project structure
    assert!(project_dir.join("Slipway.toml").exists());
    assert!(project_dir.join("web/index.html").exists());
    assert!(project_dir.join("web/main.js").exists());
    assert!(project_dir.join(".gitignore").exists());

    // Check manifest content
    let manifest = fs::read_to_string(project_dir.join("Slipway.toml")).unwrap();
    assert!(manifest.contains("name = \"myapp\""));
    assert!(manifest.contains("[web]"));
}

#[test]
fn test_new_fails_if_directory_exists() {
    let tmp = temp_dir();
    let project_dir = tmp.path().join("existing");
    fs::create_dir(&project_dir).unwrap();

    slipway()
        .args(["new", "existing"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_new_rejects_invalid_name() {
    let tmp = temp_dir();

    slipway()
        .args(["new", "bad name"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid characters"));
}

// ============================================================================
// slipway init
// ============================================================================

#[test]
fn test_init_in_empty_directory() {
    let tmp = temp_dir();
    let project_dir = tmp.path().join("mynotes");
    fs::create_dir(&project_dir).unwrap();

    slipway()
        .args(["init"])
        .current_dir(&project_dir)
        .assert()
        .success();

    assert!(project_dir.join("Slipway.toml").exists());
    assert!(project_dir.join("web").exists());

    // The stack name comes from the directory
    let manifest = fs::read_to_string(project_dir.join("Slipway.toml")).unwrap();
    assert!(manifest.contains("name = \"mynotes\""));
}

#[test]
fn test_init_fails_if_manifest_exists() {
    let tmp = temp_dir();
    let project_dir = tmp.path().join("twice");
    fs::create_dir(&project_dir).unwrap();
    fs::write(
        project_dir.join("Slipway.toml"),
        "[stack]\nname = \"twice\"\n",
    )
    .unwrap();

    slipway()
        .args(["init"])
        .current_dir(&project_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ============================================================================
// slipway deploy
// ============================================================================

#[test]
fn test_deploy_fails_without_manifest() {
    let tmp = temp_dir();

    slipway()
        .args(["deploy"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find"))
        .stderr(predicate::str::contains("Slipway.toml"));
}

#[cfg(unix)]
#[test]
fn test_deploy_materializes_the_stack() {
    let fixture = ProjectFixture::new("cli-deploy").with_fake_tooling();

    slipway()
        .args(["deploy"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished"))
        .stderr(predicate::str::contains("Outputs:"))
        .stderr(predicate::str::contains("HttpApiUrl"));

    let state_dir = fixture.root().join(".slipway");
    assert!(state_dir.join("state.json").exists());

    // The site publish landed in the bucket, config document included
    let bucket = state_dir.join("buckets/cli-deploy-site");
    assert!(bucket.join("index.html").exists());

    let config = fs::read_to_string(bucket.join("config.json")).unwrap();
    assert!(config.contains("cli-deploy"));
    assert!(config.contains("HttpApiUrl"));
}

#[cfg(unix)]
#[test]
fn test_deploy_fails_without_build_tool() {
    // The fixture manifest points at tool paths that do not exist, so the
    // local probe fails and the container fallback reports its stub error.
    let fixture = ProjectFixture::new("cli-nobundle");

    slipway()
        .args(["deploy"])
        .current_dir(fixture.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("container builds are not supported"));

    assert!(!fixture.root().join(".slipway/state.json").exists());
}

// ============================================================================
// slipway outputs
// ============================================================================

#[test]
fn test_outputs_before_any_deploy() {
    let fixture = ProjectFixture::new("cli-noout");

    slipway()
        .args(["outputs"])
        .current_dir(fixture.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recorded deployment"));
}

#[cfg(unix)]
#[test]
fn test_outputs_after_deploy() {
    let fixture = ProjectFixture::new("cli-outputs").with_fake_tooling();

    slipway()
        .args(["deploy"])
        .current_dir(fixture.root())
        .assert()
        .success();

    // All outputs
    slipway()
        .args(["outputs"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "HttpApiUrl = http://127.0.0.1:8787/api",
        ))
        .stdout(predicate::str::contains("DistributionDomain"));

    // One output by name, value only
    slipway()
        .args(["outputs", "HttpApiUrl"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stdout(predicate::eq("http://127.0.0.1:8787/api\n"));

    // Unknown output name
    slipway()
        .args(["outputs", "Nonexistent"])
        .current_dir(fixture.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no output named `Nonexistent`"));
}

// ============================================================================
// slipway graph
// ============================================================================

#[test]
fn test_graph_lists_resources_in_dependency_order() {
    let fixture = ProjectFixture::new("cli-graph");

    let output = slipway()
        .args(["graph"])
        .current_dir(fixture.root())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("stack `cli-graph`"));
    assert!(stdout.contains("table `notes-table`"));
    assert!(stdout.contains("endpoint-config `endpoint-config`"));

    // Dependencies come before their dependents
    let bucket = stdout.find("bucket `site-bucket`").unwrap();
    let distribution = stdout.find("distribution `site-distribution`").unwrap();
    let config = stdout.find("endpoint-config `endpoint-config`").unwrap();
    assert!(bucket < distribution);
    assert!(distribution < config);
}

#[test]
fn test_graph_edges_flag() {
    let fixture = ProjectFixture::new("cli-edges");

    slipway()
        .args(["graph", "--edges"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("depends on"));
}

// ============================================================================
// slipway doctor
// ============================================================================

#[test]
fn test_doctor_prints_report() {
    let tmp = temp_dir();

    // Exit status depends on what the host has installed, so only the
    // report shape is asserted.
    slipway()
        .args(["doctor"])
        .current_dir(tmp.path())
        .assert()
        .stdout(predicate::str::contains("Slipway Doctor"))
        .stdout(predicate::str::contains("Node.js"));
}

// ============================================================================
// slipway destroy
// ============================================================================

#[test]
fn test_destroy_without_deployment() {
    let fixture = ProjectFixture::new("cli-nodestate");

    slipway()
        .args(["destroy", "--yes"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing to destroy"));
}

#[cfg(unix)]
#[test]
fn test_destroy_removes_deployed_state() {
    let fixture = ProjectFixture::new("cli-destroy").with_fake_tooling();

    slipway()
        .args(["deploy"])
        .current_dir(fixture.root())
        .assert()
        .success();

    assert!(fixture.root().join(".slipway/state.json").exists());

    slipway()
        .args(["destroy", "--yes"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("destroyed"));

    assert!(!fixture.root().join(".slipway").exists());
}

#[cfg(unix)]
#[test]
fn test_destroy_prompt_aborts_on_no() {
    let fixture = ProjectFixture::new("cli-abort").with_fake_tooling();

    slipway()
        .args(["deploy"])
        .current_dir(fixture.root())
        .assert()
        .success();

    slipway()
        .args(["destroy"])
        .current_dir(fixture.root())
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("destroy aborted"));

    assert!(fixture.root().join(".slipway/state.json").exists());
}

// ============================================================================
// slipway completions
// ============================================================================

#[test]
fn test_completions_bash() {
    slipway()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slipway"));
}

// ============================================================================
// Full workflow test
// ============================================================================

#[cfg(unix)]
#[test]
fn test_full_workflow() {
    use slipway::test_support::write_script;

    let tmp = temp_dir();

    // 1. Scaffold a project
    slipway()
        .args(["new", "workflow"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let project_dir = tmp.path().join("workflow");

    // 2. Point the manifest at controlled build tooling
    write_script(&project_dir.join("bin/esbuild"), "echo \"0.20.1\"");
    write_script(
        &project_dir.join("bin/build-site"),
        "mkdir -p dist\ncp index.html dist/index.html",
    );
    fs::write(
        project_dir.join("Slipway.toml"),
        format!(
            r#"[stack]
name = "workflow"

[web]
source = "web"
output = "dist"
build_command = "{root}/bin/build-site"
tool = "{root}/bin/esbuild"

[serve]
port = 8899
"#,
            root = project_dir.display()
        ),
    )
    .unwrap();

    // 3. Inspect the graph before deploying
    slipway()
        .args(["graph"])
        .current_dir(&project_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("stack `workflow`"));

    // 4. Deploy
    slipway()
        .args(["deploy"])
        .current_dir(&project_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished"));

    // 5. Outputs reflect the configured port
    slipway()
        .args(["outputs", "HttpApiUrl"])
        .current_dir(&project_dir)
        .assert()
        .success()
        .stdout(predicate::eq("http://127.0.0.1:8899/api\n"));

    // 6. The published site and its config document are in the bucket
    let bucket = project_dir.join(".slipway/buckets/workflow-site");
    assert!(bucket.join("index.html").exists());
    assert!(bucket.join("config.json").exists());

    // 7. Redeploy is idempotent
    slipway()
        .args(["deploy"])
        .current_dir(&project_dir)
        .assert()
        .success();

    // 8. Destroy tears it all down
    slipway()
        .args(["destroy", "--yes"])
        .current_dir(&project_dir)
        .assert()
        .success();

    assert!(!project_dir.join(".slipway").exists());
}
