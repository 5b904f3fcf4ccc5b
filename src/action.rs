//! Requests recorded by the fake client, in the order they were served

use crate::tracker::GVR;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    List,
    Watch,
    Create,
    Update,
    Patch,
    Delete,
    DeleteCollection,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::List => "list",
            Verb::Watch => "watch",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
            Verb::DeleteCollection => "deletecollection",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the fake API server
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub verb: Verb,
    pub resource: GVR,
    /// `None` for requests across all namespaces
    pub namespace: Option<String>,
    pub name: Option<String>,
    /// e.g. `status`
    pub subresource: Option<String>,
    /// Request body: the object for create/update, the patch document for patch
    pub object: Option<Value>,
    /// Raw query string (selectors, pagination, watch options)
    pub query: Option<String>,
}

impl Action {
    pub(crate) fn new(verb: Verb, resource: GVR) -> Self {
        Self {
            verb,
            resource,
            namespace: None,
            name: None,
            subresource: None,
            object: None,
            query: None,
        }
    }

    /// Whether this action is `verb` on the plural `resource` (e.g. "subnets")
    pub fn matches(&self, verb: Verb, resource: &str) -> bool {
        self.verb == verb && self.resource.resource == resource
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.resource.resource)?;
        if let Some(sub) = &self.subresource {
            write!(f, "/{}", sub)?;
        }
        match (&self.namespace, &self.name) {
            (Some(ns), Some(name)) => write!(f, " {}/{}", ns, name),
            (None, Some(name)) => write!(f, " {}", name),
            (Some(ns), None) => write!(f, " in {}", ns),
            (None, None) => Ok(()),
        }
    }
}
