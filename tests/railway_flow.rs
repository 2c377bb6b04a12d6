//! End-to-end Railway flows against a scripted runner and a fake API

mod common;

use std::sync::Arc;

use shipwright::cli::locate::Invocation;
use shipwright::deploy::railway::RailwayDeployer;
use shipwright::models::request::Provider;

use common::{fail, ok, request, FakeApi, ScriptedRunner};

const PROJECT_ID: &str = "11111111-2222-3333-4444-555555555555";
const SERVICE_ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

fn deployer(runner: Arc<ScriptedRunner>, api: Arc<FakeApi>) -> RailwayDeployer {
    RailwayDeployer::new(runner, api, Invocation::direct("/opt/cli/railway"))
}

fn full_stack_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("backend")).unwrap();
    std::fs::create_dir(dir.path().join("frontend")).unwrap();
    dir
}

#[tokio::test]
async fn test_full_stack_deploy_cross_wires_urls() {
    let project = full_stack_project();
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_arg("init", ok(&format!("Created project {PROJECT_ID}")));
    runner.on_arg("domain", ok("https://api.example.com"));

    let mut api = FakeApi::with_environment("env-1", "production");
    api.created_domain = Some("my-app-frontend.up.railway.app".to_string());
    let api = Arc::new(api);
    api.queue_service(Some("svc-backend"));
    api.queue_service(Some("svc-frontend"));

    let mut req = request(Provider::Railway, project.path());
    req.env_vars = vec![
        ("DATABASE_URL".to_string(), "postgres://db".to_string()),
        ("VITE_THEME".to_string(), "dark".to_string()),
    ];

    let result = deployer(runner.clone(), api).deploy(&req).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    assert_eq!(
        result.url.as_deref(),
        Some("https://my-app-frontend.up.railway.app")
    );
    assert_eq!(result.site_or_project_id.as_deref(), Some(PROJECT_ID));

    // Each service deploys once and redeploys once after wiring.
    let ups = runner.calls_with_arg("up");
    assert_eq!(ups.len(), 4);
    assert_eq!(ups.iter().filter(|c| c.has_arg("backend")).count(), 2);
    assert_eq!(ups.iter().filter(|c| c.has_arg("frontend")).count(), 2);

    // The frontend learns the backend URL, plus its own VITE_ variables.
    let var_calls = runner.calls_with_arg("variables");
    assert!(var_calls
        .iter()
        .any(|c| c.has_arg("VITE_API_URL=https://api.example.com") && c.has_arg("svc-frontend")));
    assert!(var_calls
        .iter()
        .any(|c| c.has_arg("VITE_THEME=dark") && c.has_arg("svc-frontend")));

    // The backend learns the frontend URL, plus the non-VITE variables.
    assert!(var_calls.iter().any(|c| {
        c.has_arg("FRONTEND_URL=https://my-app-frontend.up.railway.app")
            && c.has_arg("svc-backend")
    }));
    assert!(var_calls
        .iter()
        .any(|c| c.has_arg("DATABASE_URL=postgres://db") && c.has_arg("svc-backend")));
    assert!(!var_calls
        .iter()
        .any(|c| c.has_arg("VITE_THEME=dark") && c.has_arg("svc-backend")));
}

#[tokio::test]
async fn test_full_stack_backend_failure_stops_before_frontend() {
    let project = full_stack_project();
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_arg("init", ok(&format!("Created project {PROJECT_ID}")));
    runner.on_arg("backend", fail("out of memory"));

    let result = deployer(runner.clone(), Arc::new(FakeApi::default()))
        .deploy(&request(Provider::Railway, project.path()))
        .await;

    assert!(!result.success);
    let message = result.error.unwrap();
    assert!(message.contains("Backend deploy failed"), "{message}");
    assert!(message.contains("out of memory"), "{message}");
    assert!(runner.calls_with_arg("frontend").is_empty());
}

#[tokio::test]
async fn test_single_service_deploy_sets_vars_and_redeploys() {
    let project = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_arg("init", ok(&format!("Created project {PROJECT_ID}")));
    runner.on_arg(
        "up",
        ok(&format!(
            "Indexed\nUploaded\nBuild Logs: https://railway.app/project/x/service/{SERVICE_ID}?id=y"
        )),
    );
    runner.on_arg("domain", ok("https://my-app.up.railway.app"));

    let mut req = request(Provider::Railway, project.path());
    req.env_vars = vec![("API_KEY".to_string(), "abc".to_string())];

    let result = deployer(runner.clone(), Arc::new(FakeApi::default()))
        .deploy(&req)
        .await;

    assert!(result.success);
    assert_eq!(result.url.as_deref(), Some("https://my-app.up.railway.app"));
    assert_eq!(result.site_or_project_id.as_deref(), Some(PROJECT_ID));

    let var_calls = runner.calls_with_arg("variables");
    assert_eq!(var_calls.len(), 1);
    assert!(var_calls[0].has_arg("API_KEY=abc"));
    assert!(var_calls[0].has_arg(SERVICE_ID));

    // Initial deploy plus the redeploy that picks up the new variables.
    assert_eq!(runner.calls_with_arg("up").len(), 2);
}

#[tokio::test]
async fn test_single_service_without_vars_deploys_once() {
    let project = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_arg("init", ok(&format!("Created project {PROJECT_ID}")));
    runner.on_arg("up", ok(&format!("/service/{SERVICE_ID}")));
    runner.on_arg("domain", ok("https://my-app.up.railway.app"));

    let result = deployer(runner.clone(), Arc::new(FakeApi::default()))
        .deploy(&request(Provider::Railway, project.path()))
        .await;

    assert!(result.success);
    assert_eq!(runner.calls_with_arg("up").len(), 1);
    assert!(runner.calls_with_arg("variables").is_empty());
}

#[tokio::test]
async fn test_existing_project_id_skips_init() {
    let project = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_arg("up", ok(&format!("/service/{SERVICE_ID}")));
    runner.on_arg("domain", ok("https://my-app.up.railway.app"));

    let mut req = request(Provider::Railway, project.path());
    req.existing_id = Some(PROJECT_ID.to_string());

    let result = deployer(runner.clone(), Arc::new(FakeApi::default()))
        .deploy(&req)
        .await;

    assert!(result.success);
    assert_eq!(result.site_or_project_id.as_deref(), Some(PROJECT_ID));
    assert!(runner.calls_with_arg("init").is_empty());
}

#[tokio::test]
async fn test_frontend_domain_falls_back_to_existing_domains() {
    use shipwright::api::schema::ServiceDomain;

    let project = full_stack_project();
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_arg("init", ok(&format!("Created project {PROJECT_ID}")));
    runner.on_arg("domain", ok("https://api.example.com"));

    // Domain creation yields nothing; the lookup query has the answer.
    let mut api = FakeApi::with_environment("env-1", "production");
    api.existing_domains = vec![
        ServiceDomain {
            domain: "other.up.railway.app".to_string(),
            service_id: "svc-backend".to_string(),
        },
        ServiceDomain {
            domain: "my-app-frontend.up.railway.app".to_string(),
            service_id: "svc-frontend".to_string(),
        },
    ];
    let api = Arc::new(api);
    api.queue_service(Some("svc-backend"));
    api.queue_service(Some("svc-frontend"));

    let result = deployer(runner, api)
        .deploy(&request(Provider::Railway, project.path()))
        .await;

    assert!(result.success);
    assert_eq!(
        result.url.as_deref(),
        Some("https://my-app-frontend.up.railway.app")
    );
}
