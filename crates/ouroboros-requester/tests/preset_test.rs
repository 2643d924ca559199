//! Preset construction of requester-backed resources

use ouroboros_requester::{
    create_requester_fn, preset_resource_arguments, ConfigMap, IdentityOptionsHandler,
    Requester, RequestHandler, RequestOptions, RequesterResult, Resource, ResourceOptions,
    FormattedResponse, ResponseBody,
};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recording {
    calls: Mutex<Vec<(String, RequestOptions)>>,
}

#[async_trait::async_trait]
impl RequestHandler for Recording {
    async fn send(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> RequesterResult<FormattedResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), options));
        Ok(FormattedResponse::new(
            ResponseBody::Json(json!([])),
            HashMap::new(),
            200,
        ))
    }
}

fn config(value: serde_json::Value) -> ConfigMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn resource_set(recording: &Arc<Recording>) -> BTreeMap<String, Resource<RequesterResult<Requester>>> {
    let requester_fn = create_requester_fn(IdentityOptionsHandler, Arc::clone(recording));

    let mut resources = BTreeMap::new();
    resources.insert(
        "Projects".to_string(),
        Resource::constructor(move |config: ConfigMap| {
            ResourceOptions::from_config(&config).map(&requester_fn)
        }),
    );
    resources
}

fn build(
    resources: &BTreeMap<String, Resource<RequesterResult<Requester>>>,
    config: ConfigMap,
) -> RequesterResult<Requester> {
    let ctor = resources["Projects"]
        .as_constructor()
        .expect("Projects is a constructor");
    ctor(config)
}

#[tokio::test]
async fn test_preset_url_and_headers_reach_requests() {
    let recording = Arc::new(Recording::default());
    let preset = config(json!({
        "url": "https://gitlab.example.com/api/v4",
        "headers": { "user-agent": "gitlab-sync" },
    }));

    let resources = preset_resource_arguments(resource_set(&recording), &preset);
    let projects = build(&resources, ConfigMap::new()).unwrap();
    projects.get("projects", None).await.unwrap();

    let calls = recording.calls.lock().unwrap();
    assert_eq!(calls[0].0, "projects");
    assert_eq!(calls[0].1.prefix_url, "https://gitlab.example.com/api/v4");
    assert_eq!(calls[0].1.header("user-agent"), Some("gitlab-sync"));
}

#[tokio::test]
async fn test_caller_config_shadows_preset() {
    let recording = Arc::new(Recording::default());
    let preset = config(json!({
        "url": "https://gitlab.example.com/api/v4",
        "headers": { "user-agent": "gitlab-sync" },
    }));

    let resources = preset_resource_arguments(resource_set(&recording), &preset);
    let projects = build(
        &resources,
        config(json!({ "url": "https://self-hosted.example.org/api/v4" })),
    )
    .unwrap();
    projects.get("projects", None).await.unwrap();

    let calls = recording.calls.lock().unwrap();
    assert_eq!(calls[0].1.prefix_url, "https://self-hosted.example.org/api/v4");
    // Headers were not overridden, so the preset's survive
    assert_eq!(calls[0].1.header("user-agent"), Some("gitlab-sync"));
}

#[test]
fn test_missing_url_surfaces_constructor_error() {
    let recording = Arc::new(Recording::default());
    let resources = preset_resource_arguments(resource_set(&recording), &ConfigMap::new());

    assert!(build(&resources, ConfigMap::new()).is_err());
}
