// ABOUTME: Integration tests for the deployment state model.
// ABOUTME: Covers lookup, inheritance, path resolution, serialization and persistence.

mod support;

use escape::state::{
    DeploymentState, EnvironmentState, LocalBackend, ProjectState, StageState, StateError,
    StatusCode,
};
use escape::types::DeploymentAddress;
use serde_json::json;
use support::project_with_backend;

fn environment() -> EnvironmentState {
    EnvironmentState::new("my-project", "dev").unwrap()
}

/// Root `parent` with `child` nested under its deploy stage.
fn nested_environment() -> (EnvironmentState, DeploymentAddress) {
    let mut env = environment();
    let child = env
        .get_or_create_deployment_state("parent")
        .unwrap()
        .get_or_create_dependency("deploy", "child", "_/child")
        .unwrap();
    let address = child.address().clone();
    (env, address)
}

// =============================================================================
// Construction and Lookup
// =============================================================================

/// Test: Creating the same deployment twice yields the same state.
#[test]
fn get_or_create_deployment_state_is_idempotent() {
    let mut env = environment();

    env.get_or_create_deployment_state("webapp")
        .unwrap()
        .set_input("domain", json!("example.com"));
    let first = env.get_or_create_deployment_state("webapp").unwrap().clone();
    let second = env.get_or_create_deployment_state("webapp").unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(first.inputs()["domain"], json!("example.com"));
    assert_eq!(env.deployment_names().collect::<Vec<_>>(), vec!["webapp"]);
}

/// Test: New deployments know where they live.
#[test]
fn created_deployments_are_attached() {
    let (env, address) = nested_environment();
    let child = env.deployment(&address).unwrap();

    assert_eq!(child.project_name(), "my-project");
    assert_eq!(child.environment_name(), "dev");
    assert_eq!(child.deployment_path(), "parent:child");
    assert_eq!(child.root_deployment_name(), "parent");
    assert!(!child.is_root());
    assert_eq!(child.release(), "_/child");
}

/// Test: A deployment's release defaults to its name.
#[test]
fn release_defaults_to_deployment_name() {
    let deployment = DeploymentState::new("archive-full", None).unwrap();
    assert_eq!(deployment.release(), "archive-full");
}

/// Test: Invalid names are rejected with the matching error.
#[test]
fn invalid_names_are_rejected() {
    assert!(matches!(
        ProjectState::new(""),
        Err(StateError::MissingProjectName)
    ));
    assert!(matches!(
        EnvironmentState::new("p", "bad env"),
        Err(StateError::InvalidEnvironmentName(_))
    ));
    assert!(matches!(
        DeploymentState::new("a:b", None),
        Err(StateError::InvalidDeploymentName(_))
    ));

    let mut env = environment();
    let result = env
        .get_or_create_deployment_state("webapp")
        .unwrap()
        .get_or_create_dependency("not a stage", "db", "_/db");
    assert!(matches!(result, Err(StateError::InvalidStageName(_))));
}

/// Test: Deleting a deployment removes it and everything below it.
#[test]
fn delete_deployment_removes_subtree() {
    let (mut env, address) = nested_environment();

    let removed = env.delete_deployment("parent").unwrap();
    assert_eq!(removed.name(), "parent");
    assert!(env.deployment(&address).is_err());
    assert!(matches!(
        env.delete_deployment("parent"),
        Err(StateError::DeploymentNotFound(_))
    ));
}

// =============================================================================
// Inheritance
// =============================================================================

/// Test: The closest source of an input wins.
#[test]
fn pre_step_inputs_prefer_closest_value() {
    let (mut env, address) = nested_environment();
    env.set_input("x", json!("env"));
    env.set_input("region", json!("eu"));
    env.get_or_create_deployment_state("parent")
        .unwrap()
        .set_input("x", json!("depl"));

    let leaf = env.deployment(&address).unwrap();
    let inputs = leaf.pre_step_inputs(&env, "deploy").unwrap();
    assert_eq!(inputs["x"], json!("depl"));
    assert_eq!(inputs["region"], json!("eu"));

    env.deployment_mut(&address)
        .unwrap()
        .get_stage_or_create_new("deploy")
        .set_user_input("x", json!("user"));

    let leaf = env.deployment(&address).unwrap();
    let inputs = leaf.pre_step_inputs(&env, "deploy").unwrap();
    assert_eq!(inputs["x"], json!("user"));
}

/// Test: A parent's stage user inputs are visible to the deployments below it.
#[test]
fn pre_step_inputs_include_ancestor_stage_inputs() {
    let (mut env, address) = nested_environment();
    env.get_or_create_deployment_state("parent")
        .unwrap()
        .get_stage_or_create_new("deploy")
        .set_user_input("replicas", json!(3));

    let leaf = env.deployment(&address).unwrap();
    let inputs = leaf.pre_step_inputs(&env, "build").unwrap();
    assert_eq!(inputs["replicas"], json!(3));
}

/// Test: Providers fall back to the parent stage; own entries win.
#[test]
fn providers_fall_back_to_ancestors() {
    let (mut env, address) = nested_environment();
    env.get_or_create_deployment_state("parent")
        .unwrap()
        .get_stage_or_create_new("deploy")
        .set_provider("iface", "X");

    let leaf = env.deployment(&address).unwrap();
    assert_eq!(leaf.providers(&env, "deploy").unwrap()["iface"], "X");

    env.deployment_mut(&address)
        .unwrap()
        .get_stage_or_create_new("deploy")
        .set_provider("iface", "Y");

    let leaf = env.deployment(&address).unwrap();
    assert_eq!(leaf.providers(&env, "deploy").unwrap()["iface"], "Y");
}

// =============================================================================
// Paths and Providers
// =============================================================================

/// Test: The lineage walks from the root down, naming the stage of each hop.
#[test]
fn lineage_walks_root_to_leaf() {
    let (env, address) = nested_environment();

    let lineage = env.lineage(&address).unwrap();
    let hops: Vec<(&str, Option<&str>)> = lineage
        .iter()
        .map(|(deployment, via)| (deployment.name(), *via))
        .collect();
    assert_eq!(hops, vec![("parent", Some("deploy")), ("child", None)]);

    let deployments: Vec<_> = {
        let temporary = address.clone();
        env.lineage(&temporary)
            .unwrap()
            .into_iter()
            .map(|(deployment, _)| deployment)
            .collect()
    };
    assert_eq!(deployments.last().unwrap().name(), "child");

    let missing = address.child("deploy", "ghost");
    assert!(matches!(
        env.lineage(&missing),
        Err(StateError::DeploymentPathNotFound { segment, .. }) if segment == "ghost"
    ));
}

/// Test: Paths switch to the deploy stage after the first hop.
#[test]
fn resolve_deployment_path_switches_to_deploy_stage() {
    let mut env = environment();
    env.get_or_create_deployment_state("app")
        .unwrap()
        .get_or_create_dependency("build", "toolchain", "_/toolchain")
        .unwrap()
        .get_or_create_dependency("deploy", "compiler", "_/compiler")
        .unwrap();

    let address = env
        .resolve_deployment_path("app:toolchain:compiler", "build")
        .unwrap();
    assert_eq!(address.to_string(), "app:toolchain:compiler");
    assert_eq!(env.deployment(&address).unwrap().name(), "compiler");

    let missing = env.resolve_deployment_path("app:toolchain", "deploy");
    assert!(matches!(
        missing,
        Err(StateError::DeploymentPathNotFound { segment, .. }) if segment == "toolchain"
    ));
}

/// Test: Providers are read from committed deploy stages.
#[test]
fn get_providers_lists_deploy_stage_interfaces() {
    let mut env = environment();
    support::commit(&mut env, "k8s-a", "1.0", &["kubernetes"]);
    support::commit(&mut env, "k8s-b", "2.0", &["kubernetes", "dns"]);
    env.get_or_create_deployment_state("builder")
        .unwrap()
        .commit_version("build", "1.0", vec!["kubernetes".to_string()]);

    let providers = env.get_providers();
    assert_eq!(providers["kubernetes"], vec!["k8s-a", "k8s-b"]);
    assert_eq!(providers["dns"], vec!["k8s-b"]);
    assert_eq!(env.get_providers_of_type("dns"), vec!["k8s-b"]);
    assert!(env.get_providers_of_type("nothing").is_empty());
}

// =============================================================================
// Stages and Status
// =============================================================================

/// Test: A stage with a version but no status was a successful run.
#[test]
fn stage_status_bootstrap() {
    let with_version: StageState = serde_json::from_value(json!({"version": "1.0"})).unwrap();
    assert_eq!(with_version.status().code, StatusCode::Ok);

    let without: StageState = serde_json::from_value(json!({})).unwrap();
    assert_eq!(without.status().code, StatusCode::Empty);

    let explicit: StageState =
        serde_json::from_value(json!({"version": "1.0", "status": {"status": "failure"}}))
            .unwrap();
    assert_eq!(explicit.status().code, StatusCode::Failure);
}

/// Test: Status updates go through the transition table.
#[test]
fn update_status_rejects_illegal_transitions() {
    let mut env = environment();
    let deployment = env.get_or_create_deployment_state("webapp").unwrap();

    deployment
        .get_stage_or_create_new("deploy")
        .transition(StatusCode::Pending)
        .unwrap();
    let result = deployment
        .get_stage_or_create_new("deploy")
        .transition(StatusCode::Ok);
    assert!(matches!(
        result,
        Err(StateError::IllegalStatusTransition {
            from: StatusCode::Pending,
            to: StatusCode::Ok
        })
    ));
    assert_eq!(deployment.status("deploy").unwrap().code, StatusCode::Pending);
}

/// Test: A stage is deployed only at its committed version.
#[test]
fn is_deployed_matches_committed_version() {
    let mut deployment = DeploymentState::new("webapp", None).unwrap();
    assert!(!deployment.is_deployed("deploy", ""));

    deployment.get_stage_or_create_new("deploy");
    assert!(deployment.is_deployed("deploy", ""));
    assert!(!deployment.is_deployed("deploy", "1.2"));

    deployment.commit_version("deploy", "1.2", vec!["http".to_string()]);
    assert!(deployment.is_deployed("deploy", "1.2"));
    assert!(!deployment.is_deployed("deploy", "1.3"));
    assert!(!deployment.is_deployed("build", "1.2"));
    assert_eq!(deployment.release_reference("deploy"), "webapp-v1.2");
    assert_eq!(deployment.release_reference("build"), "webapp-latest");
}

// =============================================================================
// Serialization
// =============================================================================

/// Test: Persisted documents use the documented field names and omit empties.
#[test]
fn serialized_shape_is_compact() {
    let mut project = ProjectState::new("my-project").unwrap();
    let env = project.get_or_create_environment("dev").unwrap();
    let stage = env
        .get_or_create_deployment_state("webapp")
        .unwrap()
        .get_stage_or_create_new("deploy");
    stage.set_user_input("domain", json!("example.com"));
    stage.set_provider("kubernetes", "k8s");

    let value: serde_json::Value = serde_json::from_str(&project.to_json().unwrap()).unwrap();
    let deployment = &value["environments"]["dev"]["deployments"]["webapp"];
    assert_eq!(deployment["name"], "webapp");
    assert_eq!(deployment["release"], "webapp");

    let stage = &deployment["stages"]["deploy"];
    assert_eq!(stage["inputs"]["domain"], "example.com");
    assert_eq!(stage["providers"]["kubernetes"], "k8s");
    assert_eq!(stage["status"]["status"], "empty");
    assert!(stage.get("calculated_inputs").is_none());
    assert!(stage.get("version").is_none());
    assert!(stage.get("provides").is_none());
}

/// Test: Loading re-attaches every nested deployment.
#[test]
fn from_json_reattaches_nested_deployments() {
    let document = json!({
        "name": "my-project",
        "environments": {
            "dev": {
                "name": "dev",
                "deployments": {
                    "parent": {
                        "name": "parent",
                        "stages": {
                            "deploy": {
                                "deployments": {
                                    "child": {"name": "child", "release": "_/child"}
                                }
                            }
                        }
                    }
                }
            }
        }
    });

    let project = ProjectState::from_json(&document.to_string()).unwrap();
    let env = project.environment("dev").unwrap();
    assert_eq!(env.project_name(), "my-project");

    let address = env.resolve_deployment_path("parent:child", "deploy").unwrap();
    let child = env.deployment(&address).unwrap();
    assert_eq!(child.deployment_path(), "parent:child");
    assert_eq!(child.environment_name(), "dev");
    assert_eq!(child.project_name(), "my-project");
}

/// Test: Loading rejects invalid names anywhere in the tree.
#[test]
fn from_json_validates_names() {
    let missing_name = json!({"name": ""});
    assert!(matches!(
        ProjectState::from_json(&missing_name.to_string()),
        Err(StateError::MissingProjectName)
    ));

    let bad_deployment = json!({
        "name": "p",
        "environments": {"dev": {"name": "dev", "deployments": {"x": {"name": "bad name"}}}}
    });
    assert!(matches!(
        ProjectState::from_json(&bad_deployment.to_string()),
        Err(StateError::InvalidDeploymentName(_))
    ));
}

// =============================================================================
// Persistence
// =============================================================================

/// Test: Saving without a backend fails.
#[test]
fn save_without_backend_fails() {
    let mut project = ProjectState::new("my-project").unwrap();
    project
        .get_or_create_environment("dev")
        .unwrap()
        .get_or_create_deployment_state("webapp")
        .unwrap();

    let result = project.save("dev", &DeploymentAddress::root("webapp"));
    assert!(matches!(result, Err(StateError::NoBackend)));
}

/// Test: Saves are delegated to the backend with the deployment's path.
#[test]
fn save_delegates_to_backend() {
    let (mut project, backend) = project_with_backend("dev");
    let address = project
        .get_or_create_environment("dev")
        .unwrap()
        .get_or_create_deployment_state("parent")
        .unwrap()
        .get_or_create_dependency("deploy", "child", "_/child")
        .unwrap()
        .address()
        .clone();

    project.save("dev", &address).unwrap();
    let env = project.environment("dev").unwrap();
    env.deployment(&address).unwrap().save(&project).unwrap();

    assert_eq!(backend.saved(), vec!["parent:child", "parent:child"]);
}

/// Test: The JSON file backend round-trips a project.
#[test]
fn local_backend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("state.json");

    let mut project = LocalBackend::open(&path, "my-project").unwrap();
    assert!(!path.exists());
    project
        .get_or_create_environment("dev")
        .unwrap()
        .get_or_create_deployment_state("webapp")
        .unwrap()
        .commit_version("deploy", "1.0", vec!["http".to_string()]);
    project
        .save("dev", &DeploymentAddress::root("webapp"))
        .unwrap();
    assert!(path.exists());

    let reloaded = LocalBackend::open(&path, "ignored").unwrap();
    assert_eq!(reloaded.name(), "my-project");
    let webapp = reloaded
        .environment("dev")
        .unwrap()
        .get_deployment_state("webapp")
        .unwrap();
    assert_eq!(webapp.version("deploy"), "1.0");
    assert_eq!(webapp.stage("deploy").unwrap().provides(), ["http".to_string()]);
    assert_eq!(webapp.status("deploy").unwrap().code, StatusCode::Empty);
}
