//! Mock tower service that routes API server requests to the fake client

use crate::action::{Action, Verb};
use crate::client::FakeClient;
use crate::client_utils::extract_name;
use crate::error::Error;
use crate::field_selectors::{matches_field_selector, parse_field_selector, FieldRequirement};
use crate::interceptor;
use crate::label_selector::{matches_object, parse_label_selector};
use crate::registry::ResourceMetadata;
use crate::tracker::{WatchRecord, GVK, GVR};
use crate::Result;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, StreamExt};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use kube::api::ListParams;
use kube::client::Body as KubeBody;
use kube::core::Selector;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::broadcast;
use tower::Service;
use tracing::{debug, trace};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub(crate) type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Parsed API path
#[derive(Debug, PartialEq)]
struct ParsedPath {
    group: String,
    version: String,
    namespace: Option<String>,
    resource: String,
    name: Option<String>,
    subresource: Option<String>,
}

/// Query parameters the fake server understands
#[derive(Debug, Default)]
struct Query {
    label_selector: Option<String>,
    field_selector: Option<String>,
    limit: Option<usize>,
    continue_token: Option<String>,
    resource_version: Option<String>,
    timeout_seconds: Option<u64>,
    watch: bool,
}

impl Query {
    fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();

        for pair in query.unwrap_or_default().split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            // Form encoding turns spaces into '+'
            let value = value.replace('+', " ");
            let value = urlencoding::decode(&value)
                .map(|v| v.into_owned())
                .unwrap_or(value);

            match key {
                "labelSelector" => parsed.label_selector = Some(value),
                "fieldSelector" => parsed.field_selector = Some(value),
                "limit" => parsed.limit = value.parse().ok().filter(|l| *l > 0),
                "continue" => parsed.continue_token = Some(value).filter(|c| !c.is_empty()),
                "resourceVersion" => parsed.resource_version = Some(value),
                "timeoutSeconds" => parsed.timeout_seconds = value.parse().ok(),
                "watch" => parsed.watch = value == "true" || value == "1",
                _ => {}
            }
        }

        parsed
    }

    fn list_params(&self) -> ListParams {
        ListParams {
            label_selector: self.label_selector.clone(),
            field_selector: self.field_selector.clone(),
            timeout: self.timeout_seconds.map(|t| t as u32),
            limit: self.limit.map(|l| l as u32),
            continue_token: self.continue_token.clone(),
            resource_version: self.resource_version.clone(),
            ..ListParams::default()
        }
    }
}

/// Patch types based on Content-Type header
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::enum_variant_names)]
enum PatchType {
    /// RFC 6902 - application/json-patch+json
    JsonPatch,
    /// RFC 7386 - application/merge-patch+json
    MergePatch,
    /// application/strategic-merge-patch+json
    StrategicMergePatch,
    /// application/apply-patch+yaml
    ApplyPatch,
}

/// Selectors of a list, watch or deletecollection request
struct Filter {
    labels: Selector,
    fields: Vec<FieldRequirement>,
    resource: Arc<ResourceMetadata>,
    indexes: HashMap<String, crate::field_selectors::IndexerFunc>,
}

impl Filter {
    fn matches(&self, obj: &Value) -> Result<bool> {
        if !matches_object(obj, &self.labels) {
            return Ok(false);
        }
        matches_field_selector(
            obj,
            &self.fields,
            &self.resource.kind,
            &self.resource.selectable_fields,
            |field| self.indexes.get(field),
        )
    }
}

/// Everything a handler needs about the request target
struct Target {
    resource: Arc<ResourceMetadata>,
    gvr: GVR,
    gvk: GVK,
    /// `None` for requests across all namespaces
    namespace: Option<String>,
    name: Option<String>,
    is_status: bool,
}

impl Target {
    fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    fn name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .ok_or_else(|| Error::InvalidRequest("resource name may not be empty".to_string()))
    }
}

/// Mock HTTP service that serves registered resources from the fake client
#[derive(Clone)]
pub struct MockService {
    client: FakeClient,
}

impl MockService {
    pub fn new(client: FakeClient) -> Self {
        Self { client }
    }

    /// Parse API paths such as
    /// - /apis/ocicore.oracle.com/v1alpha1/subnets
    /// - /apis/ocicore.oracle.com/v1alpha1/namespaces/dev/subnets/web
    /// - /apis/ocicore.oracle.com/v1alpha1/namespaces/dev/subnets/web/status
    /// - /api/v1/namespaces/dev/configmaps (core group)
    fn parse_path(path: &str) -> Option<ParsedPath> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let (group, rest) = match parts.as_slice() {
            ["api", rest @ ..] => (String::new(), rest),
            ["apis", group, rest @ ..] => (group.to_string(), rest),
            _ => return None,
        };

        let (version, rest) = rest.split_first()?;
        let (namespace, rest) = match rest {
            ["namespaces", ns, resource, tail @ ..] => {
                (Some(ns.to_string()), [&[*resource][..], tail].concat())
            }
            _ => (None, rest.to_vec()),
        };

        let (resource, name, subresource) = match rest.as_slice() {
            [resource] => (resource, None, None),
            [resource, name] => (resource, Some(name.to_string()), None),
            [resource, name, sub] => (resource, Some(name.to_string()), Some(sub.to_string())),
            _ => return None,
        };

        Some(ParsedPath {
            group,
            version: version.to_string(),
            namespace,
            resource: resource.to_string(),
            name,
            subresource,
        })
    }

    fn determine_patch_type(content_type: Option<&str>) -> PatchType {
        match content_type {
            Some(ct) if ct.contains("application/json-patch+json") => PatchType::JsonPatch,
            Some(ct) if ct.contains("application/merge-patch+json") => PatchType::MergePatch,
            Some(ct) if ct.contains("application/apply-patch+yaml") => PatchType::ApplyPatch,
            _ => PatchType::StrategicMergePatch,
        }
    }

    /// Strategic merge and server-side apply are approximated by JSON merge patch
    fn apply_patch(existing: &mut Value, patch: &Value, patch_type: PatchType) -> Result<()> {
        match patch_type {
            PatchType::JsonPatch => {
                let patch_doc: json_patch::Patch = serde_json::from_value(patch.clone())?;
                json_patch::patch(existing, &patch_doc)?;
            }
            PatchType::MergePatch | PatchType::StrategicMergePatch | PatchType::ApplyPatch => {
                json_patch::merge(existing, patch);
            }
        }
        Ok(())
    }

    fn target(&self, parsed: ParsedPath) -> Result<Target> {
        let resource = self
            .client
            .resolve(&parsed.group, &parsed.version, &parsed.resource)?;

        let is_status = match parsed.subresource.as_deref() {
            None => false,
            Some("status") if resource.status_subresource => true,
            Some(sub) => {
                return Err(Error::ResourceNotRegistered {
                    group: parsed.group,
                    version: parsed.version,
                    resource: format!("{}/{}", parsed.resource, sub),
                })
            }
        };

        // Cluster-scoped resources ignore any namespace segment
        let namespace = if resource.namespaced {
            parsed.namespace
        } else {
            Some(String::new())
        };

        Ok(Target {
            gvr: GVR::new(&resource.group, &resource.version, &resource.plural),
            gvk: GVK::new(&resource.group, &resource.version, &resource.kind),
            resource,
            namespace,
            name: parsed.name,
            is_status,
        })
    }

    fn filter(&self, target: &Target, query: &Query) -> Result<Filter> {
        Ok(Filter {
            labels: parse_label_selector(query.label_selector.as_deref().unwrap_or(""))?,
            fields: parse_field_selector(query.field_selector.as_deref().unwrap_or(""))?,
            resource: target.resource.clone(),
            indexes: self.client.indexes_for(&target.gvk),
        })
    }

    /// Fill in apiVersion, kind and namespace the way the API server defaults them
    fn normalize_body(target: &Target, body: &[u8]) -> Result<Value> {
        let mut obj: Value = serde_json::from_slice(body)?;
        if !obj.is_object() {
            return Err(Error::InvalidRequest("request body must be an object".to_string()));
        }

        if obj.get("apiVersion").is_none() {
            obj["apiVersion"] = json!(target.resource.api_version());
        }
        if obj.get("kind").is_none() {
            obj["kind"] = json!(target.resource.kind);
        }
        if obj.get("metadata").is_none() {
            obj["metadata"] = json!({});
        }

        if target.resource.namespaced {
            let url_ns = target.namespace();
            match obj["metadata"].get("namespace").and_then(Value::as_str) {
                Some(ns) if !url_ns.is_empty() && ns != url_ns => {
                    return Err(Error::InvalidRequest(
                        "the namespace of the provided object does not match the namespace sent on the request"
                            .to_string(),
                    ))
                }
                Some(_) => {}
                None if !url_ns.is_empty() => obj["metadata"]["namespace"] = json!(url_ns),
                None => obj["metadata"]["namespace"] = json!("default"),
            }
        } else if let Some(meta) = obj["metadata"].as_object_mut() {
            meta.remove("namespace");
        }

        Ok(obj)
    }

    async fn handle_request(&self, req: Request<KubeBody>) -> std::result::Result<Response<ResponseBody>, BoxError> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let raw_query = req.uri().query().map(|s| s.to_string());
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = req.into_body().collect().await?.to_bytes();

        trace!("{} {}?{}", method, path, raw_query.as_deref().unwrap_or(""));

        let result = self
            .dispatch(&method, &path, raw_query, content_type.as_deref(), body)
            .await;

        Ok(result.unwrap_or_else(|err| {
            debug!("{} {} failed: {}", method, path, err);
            Self::error_response(&err)
        }))
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        raw_query: Option<String>,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<ResponseBody>> {
        let parsed = Self::parse_path(path).ok_or_else(|| Error::ResourceNotRegistered {
            group: String::new(),
            version: String::new(),
            resource: path.to_string(),
        })?;
        let query = Query::parse(raw_query.as_deref());
        let target = self.target(parsed)?;

        let verb = match (method.as_str(), target.name.is_some()) {
            ("GET", true) => Verb::Get,
            ("GET", false) if query.watch => Verb::Watch,
            ("GET", false) => Verb::List,
            ("POST", false) => Verb::Create,
            ("PUT", true) => Verb::Update,
            ("PATCH", true) => Verb::Patch,
            ("DELETE", true) => Verb::Delete,
            ("DELETE", false) => Verb::DeleteCollection,
            _ => {
                return Ok(Self::json_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    &json!({
                        "kind": "Status",
                        "apiVersion": "v1",
                        "status": "Failure",
                        "reason": "MethodNotAllowed",
                        "message": format!("{} is not supported on {}", method, path),
                        "code": 405,
                    }),
                ))
            }
        };

        let request_object = if body.is_empty() {
            None
        } else {
            serde_json::from_slice::<Value>(&body).ok()
        };
        let mut action = Action::new(verb, target.gvr.clone());
        action.namespace = target.namespace.clone().filter(|ns| !ns.is_empty());
        action.name = target.name.clone();
        action.subresource = target.is_status.then(|| "status".to_string());
        action.object = match verb {
            Verb::Create | Verb::Update | Verb::Patch => request_object,
            _ => None,
        };
        action.query = raw_query;
        self.client.record(action);

        match verb {
            Verb::Get => self.handle_get(&target),
            Verb::List => self.handle_list(&target, &query),
            Verb::Watch => self.handle_watch(&target, &query),
            Verb::Create => self.handle_create(&target, &body),
            Verb::Update => self.handle_update(&target, &body),
            Verb::Patch => self.handle_patch(&target, &body, content_type),
            Verb::Delete => self.handle_delete(&target),
            Verb::DeleteCollection => self.handle_delete_collection(&target, &query),
        }
    }

    fn handle_get(&self, target: &Target) -> Result<Response<ResponseBody>> {
        let name = target.name()?;

        let intercepted = match self.interceptors().and_then(|i| i.get.clone()) {
            Some(get) => get(interceptor::GetContext {
                client: &self.client,
                resource: &target.gvr,
                namespace: target.namespace(),
                name,
            })?,
            None => None,
        };

        let mut obj = match intercepted {
            Some(obj) => obj,
            None => self.client.tracker().get(&target.gvr, target.namespace(), name)?,
        };
        self.client.strip_managed_fields(&mut obj);
        Ok(Self::json_response(StatusCode::OK, &obj))
    }

    /// Selected objects, ordered by namespace and name
    fn select(&self, target: &Target, query: &Query, objects: Vec<Value>) -> Result<Vec<Value>> {
        let filter = self.filter(target, query)?;
        let mut selected = Vec::with_capacity(objects.len());
        for obj in objects {
            if filter.matches(&obj)? {
                selected.push(obj);
            }
        }
        Ok(selected)
    }

    fn handle_list(&self, target: &Target, query: &Query) -> Result<Response<ResponseBody>> {
        let params = query.list_params();
        let intercepted = match self.interceptors().and_then(|i| i.list.clone()) {
            Some(list) => list(interceptor::ListContext {
                client: &self.client,
                resource: &target.gvr,
                namespace: target.namespace.as_deref(),
                params: &params,
            })?,
            None => None,
        };

        let revision = self.client.tracker().revision();
        let objects = match intercepted {
            Some(objects) => objects,
            None => self
                .client
                .tracker()
                .list(&target.gvr, target.namespace.as_deref())?,
        };
        let mut items = self.select(target, query, objects)?;

        if let Some(token) = &query.continue_token {
            // Namespaces never contain '/', so the first one separates the pair
            let after = token.split_once('/').unwrap_or(("", token.as_str()));
            items.retain(|obj| object_key(obj) > after);
        }

        let mut continue_token = None;
        let mut remaining = None;
        if let Some(limit) = query.limit {
            if items.len() > limit {
                remaining = Some(items.len() - limit);
                items.truncate(limit);
                continue_token = items.last().map(|obj| {
                    let (namespace, name) = object_key(obj);
                    format!("{}/{}", namespace, name)
                });
            }
        }

        for item in &mut items {
            self.client.strip_managed_fields(item);
        }

        let mut metadata = json!({ "resourceVersion": revision.to_string() });
        if let Some(token) = continue_token {
            metadata["continue"] = json!(token);
            metadata["remainingItemCount"] = json!(remaining);
        }

        Ok(Self::json_response(
            StatusCode::OK,
            &json!({
                "kind": format!("{}List", target.resource.kind),
                "apiVersion": target.resource.api_version(),
                "metadata": metadata,
                "items": items,
            }),
        ))
    }

    fn handle_watch(&self, target: &Target, query: &Query) -> Result<Response<ResponseBody>> {
        let params = query.list_params();
        let intercepted = match self.interceptors().and_then(|i| i.watch.clone()) {
            Some(watch) => watch(interceptor::ListContext {
                client: &self.client,
                resource: &target.gvr,
                namespace: target.namespace.as_deref(),
                params: &params,
            })?,
            None => None,
        };

        if let Some(objects) = intercepted {
            let frames: Vec<Bytes> = objects
                .into_iter()
                .map(|object| event_line(&json!({"type": "ADDED", "object": object})))
                .collect();
            return Ok(Self::stream_response(stream::iter(frames).boxed()));
        }

        let filter = self.filter(target, query)?;
        let namespace = target.namespace.clone().filter(|ns| !ns.is_empty());
        let start = match self.client.tracker().watch(
            &target.gvr,
            namespace.as_deref(),
            query.resource_version.as_deref(),
        ) {
            Ok(start) => start,
            // The API server reports an expired version inside the watch stream
            Err(err @ Error::Expired(_)) => {
                let frame = event_line(&json!({"type": "ERROR", "object": err.to_status()}));
                return Ok(Self::stream_response(stream::iter([frame]).boxed()));
            }
            Err(err) => return Err(err),
        };

        debug!(
            "Watch {:?} in {:?} from {:?}",
            target.gvr, namespace, query.resource_version
        );

        let client = self.client.clone();
        let gvr = target.gvr.clone();
        let filter = Arc::new(filter);

        let render = {
            let filter = filter.clone();
            move |record: WatchRecord| -> Option<Bytes> {
                // Filter errors were already surfaced when the watch was opened
                if !filter.matches(&record.object).unwrap_or(false) {
                    return None;
                }
                let mut object = record.object.clone();
                client.strip_managed_fields(&mut object);
                Some(event_line(&json!({"type": record.event_type, "object": object})))
            }
        };

        let backlog = stream::iter(start.backlog).filter_map({
            let render = render.clone();
            move |record| futures::future::ready(render(record))
        });

        let live = stream::unfold(Some(start.receiver), move |receiver| {
            let gvr = gvr.clone();
            let namespace = namespace.clone();
            let render = render.clone();
            async move {
                let mut receiver = receiver?;
                loop {
                    match receiver.recv().await {
                        Ok(record) => {
                            if !record_in_scope(&record, &gvr, namespace.as_deref()) {
                                continue;
                            }
                            if let Some(frame) = render(record) {
                                return Some((frame, Some(receiver)));
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            let err = Error::Expired(format!("watcher fell behind by {} events", missed));
                            let frame = event_line(&json!({"type": "ERROR", "object": err.to_status()}));
                            return Some((frame, None));
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        let events = backlog.chain(live);
        let events = match query.timeout_seconds {
            Some(secs) => events
                .take_until(tokio::time::sleep(Duration::from_secs(secs)))
                .boxed(),
            None => events.boxed(),
        };

        Ok(Self::stream_response(events))
    }

    fn handle_create(&self, target: &Target, body: &[u8]) -> Result<Response<ResponseBody>> {
        let mut obj = Self::normalize_body(target, body)?;

        // generateName gets a random suffix when no name is given
        if obj["metadata"].get("name").and_then(Value::as_str).is_none() {
            let prefix = obj["metadata"]
                .get("generateName")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::Invalid {
                    kind: target.resource.kind.clone(),
                    name: String::new(),
                    message: "metadata.name: Required value: name or generateName is required"
                        .to_string(),
                })?;
            let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..5].to_string();
            obj["metadata"]["name"] = json!(format!("{}{}", prefix, suffix));
        }

        let namespace = obj["metadata"]
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        self.client.validate(&target.resource, &obj)?;

        let intercepted = match self.interceptors().and_then(|i| i.create.clone()) {
            Some(create) => create(interceptor::CreateContext {
                client: &self.client,
                resource: &target.gvr,
                object: &obj,
                namespace: &namespace,
            })?,
            None => None,
        };

        let mut created = match intercepted {
            Some(obj) => obj,
            None => self
                .client
                .tracker()
                .create(&target.gvr, &target.gvk, obj, &namespace)?,
        };
        self.client.strip_managed_fields(&mut created);
        Ok(Self::json_response(StatusCode::CREATED, &created))
    }

    fn handle_update(&self, target: &Target, body: &[u8]) -> Result<Response<ResponseBody>> {
        let name = target.name()?;
        let obj = Self::normalize_body(target, body)?;

        match obj["metadata"].get("name").and_then(Value::as_str) {
            Some(body_name) if body_name == name => {}
            _ => {
                return Err(Error::InvalidRequest(
                    "the name of the object does not match the name on the URL".to_string(),
                ))
            }
        }

        if !target.is_status {
            let existing = self.client.tracker().get(&target.gvr, target.namespace(), name)?;
            self.client
                .validate_immutable_fields(&target.resource, &existing, &obj)?;
        }
        self.client.validate(&target.resource, &obj)?;

        let hook = self.interceptors().and_then(|i| {
            if target.is_status {
                i.replace_status.clone()
            } else {
                i.replace.clone()
            }
        });
        let intercepted = match hook {
            Some(replace) => replace(interceptor::ReplaceContext {
                client: &self.client,
                resource: &target.gvr,
                object: &obj,
                namespace: target.namespace(),
                name,
            })?,
            None => None,
        };

        let mut updated = match intercepted {
            Some(obj) => obj,
            None => self.client.tracker().update(
                &target.gvr,
                &target.gvk,
                obj,
                target.namespace(),
                target.is_status,
            )?,
        };
        self.client.strip_managed_fields(&mut updated);
        Ok(Self::json_response(StatusCode::OK, &updated))
    }

    fn handle_patch(
        &self,
        target: &Target,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<Response<ResponseBody>> {
        let name = target.name()?;
        let patch: Value = serde_json::from_slice(body)?;
        let patch_type = Self::determine_patch_type(content_type);

        let hook = self.interceptors().and_then(|i| {
            if target.is_status {
                i.patch_status.clone()
            } else {
                i.patch.clone()
            }
        });
        let intercepted = match hook {
            Some(hook) => hook(interceptor::PatchContext {
                client: &self.client,
                resource: &target.gvr,
                patch: &patch,
                namespace: target.namespace(),
                name,
            })?,
            None => None,
        };

        let mut updated = match intercepted {
            Some(obj) => obj,
            None => {
                let existing = match self.client.tracker().get(&target.gvr, target.namespace(), name) {
                    Ok(existing) => existing,
                    // Server-side apply creates missing objects
                    Err(Error::NotFound { .. }) if patch_type == PatchType::ApplyPatch && !target.is_status => {
                        let obj = Self::normalize_body(target, body)?;
                        self.client.validate(&target.resource, &obj)?;
                        let mut created = self.client.tracker().create(
                            &target.gvr,
                            &target.gvk,
                            obj,
                            target.namespace(),
                        )?;
                        self.client.strip_managed_fields(&mut created);
                        return Ok(Self::json_response(StatusCode::CREATED, &created));
                    }
                    Err(err) => return Err(err),
                };

                let mut patched = existing.clone();
                Self::apply_patch(&mut patched, &patch, patch_type)?;
                if !target.is_status {
                    self.client
                        .validate_immutable_fields(&target.resource, &existing, &patched)?;
                }
                self.client.validate(&target.resource, &patched)?;

                self.client.tracker().update(
                    &target.gvr,
                    &target.gvk,
                    patched,
                    target.namespace(),
                    target.is_status,
                )?
            }
        };
        self.client.strip_managed_fields(&mut updated);
        Ok(Self::json_response(StatusCode::OK, &updated))
    }

    fn handle_delete(&self, target: &Target) -> Result<Response<ResponseBody>> {
        let name = target.name()?;

        let intercepted = match self.interceptors().and_then(|i| i.delete.clone()) {
            Some(delete) => delete(interceptor::DeleteContext {
                client: &self.client,
                resource: &target.gvr,
                namespace: target.namespace(),
                name,
            })?,
            None => None,
        };

        let mut deleted = match intercepted {
            Some(obj) => obj,
            None => self
                .client
                .tracker()
                .delete(&target.gvr, target.namespace(), name)?,
        };
        self.client.strip_managed_fields(&mut deleted);
        Ok(Self::json_response(StatusCode::OK, &deleted))
    }

    fn handle_delete_collection(&self, target: &Target, query: &Query) -> Result<Response<ResponseBody>> {
        let params = query.list_params();
        let intercepted = match self.interceptors().and_then(|i| i.delete_collection.clone()) {
            Some(hook) => hook(interceptor::ListContext {
                client: &self.client,
                resource: &target.gvr,
                namespace: target.namespace.as_deref(),
                params: &params,
            })?,
            None => None,
        };

        let deleted = match intercepted {
            Some(objects) => objects,
            None => {
                let objects = self
                    .client
                    .tracker()
                    .list(&target.gvr, target.namespace.as_deref())?;
                let mut deleted = Vec::new();
                for obj in self.select(target, query, objects)? {
                    let namespace = obj["metadata"]["namespace"].as_str().unwrap_or_default();
                    let name = obj["metadata"]["name"].as_str().unwrap_or_default();
                    let mut gone = self.client.tracker().delete(&target.gvr, namespace, name)?;
                    self.client.strip_managed_fields(&mut gone);
                    deleted.push(gone);
                }
                deleted
            }
        };

        Ok(Self::json_response(
            StatusCode::OK,
            &json!({
                "kind": format!("{}List", target.resource.kind),
                "apiVersion": target.resource.api_version(),
                "metadata": { "resourceVersion": self.client.tracker().revision().to_string() },
                "items": deleted,
            }),
        ))
    }

    fn interceptors(&self) -> Option<&interceptor::Funcs> {
        self.client.interceptors.as_deref()
    }

    fn json_response(status: StatusCode, data: &Value) -> Response<ResponseBody> {
        let body = Full::new(Bytes::from(data.to_string()))
            .map_err(|never| -> BoxError { match never {} })
            .boxed_unsync();
        let mut response = Response::new(body);
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    fn stream_response(events: BoxStream<'static, Bytes>) -> Response<ResponseBody> {
        let frames = events.map(|line| Ok::<_, BoxError>(Frame::data(line)));
        let mut response = Response::new(StreamBody::new(frames).boxed_unsync());
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    /// Kubernetes `Status` response for an error
    fn error_response(err: &Error) -> Response<ResponseBody> {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::json_response(status, &err.to_status())
    }
}

/// Pagination key of a stored object, ordered like the tracker's lists
fn object_key(obj: &Value) -> (&str, &str) {
    (
        obj["metadata"]["namespace"].as_str().unwrap_or_default(),
        extract_name(obj).unwrap_or_default(),
    )
}

fn record_in_scope(record: &WatchRecord, gvr: &GVR, namespace: Option<&str>) -> bool {
    &record.gvr == gvr && namespace.is_none_or(|ns| ns == record.namespace)
}

fn event_line(event: &Value) -> Bytes {
    let mut line = event.to_string();
    line.push('\n');
    Bytes::from(line)
}

impl Service<Request<KubeBody>> for MockService {
    type Response = Response<ResponseBody>;
    type Error = BoxError;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<KubeBody>) -> Self::Future {
        let this = self.clone();
        async move { this.handle_request(req).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        let parsed =
            MockService::parse_path("/apis/ocicore.oracle.com/v1alpha1/namespaces/dev/subnets/web/status")
                .unwrap();
        assert_eq!(parsed.group, "ocicore.oracle.com");
        assert_eq!(parsed.namespace.as_deref(), Some("dev"));
        assert_eq!(parsed.resource, "subnets");
        assert_eq!(parsed.name.as_deref(), Some("web"));
        assert_eq!(parsed.subresource.as_deref(), Some("status"));

        let parsed = MockService::parse_path("/apis/ocilb.oracle.com/v1alpha1/backends").unwrap();
        assert_eq!(parsed.namespace, None);
        assert_eq!(parsed.name, None);

        let parsed = MockService::parse_path("/api/v1/namespaces/dev/configmaps").unwrap();
        assert_eq!(parsed.group, "");
        assert_eq!(parsed.resource, "configmaps");

        assert!(MockService::parse_path("/healthz").is_none());
    }

    #[test]
    fn test_parse_query_decodes_selectors() {
        let query = Query::parse(Some(
            "labelSelector=tier+in+%28web%2Capi%29&fieldSelector=spec.vcnRef%3Dmain&limit=2&watch=true&timeoutSeconds=5",
        ));
        assert_eq!(query.label_selector.as_deref(), Some("tier in (web,api)"));
        assert_eq!(query.field_selector.as_deref(), Some("spec.vcnRef=main"));
        assert_eq!(query.limit, Some(2));
        assert!(query.watch);
        assert_eq!(query.timeout_seconds, Some(5));
        assert_eq!(query.list_params().limit, Some(2));
    }
}
