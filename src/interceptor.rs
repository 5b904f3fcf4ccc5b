//! Interceptors for customizing fake client behavior during testing

use crate::client::FakeClient;
use crate::tracker::GVR;
use crate::Result;
use kube::api::ListParams;
use serde_json::Value;
use std::sync::Arc;

/// Interceptor functions, one per verb
///
/// Return `Ok(Some(value))` to override, `Ok(None)` to continue, or `Err(e)` to inject an error.
///
/// # Example
/// ```
/// use oci_manager_client::{interceptor, Error};
///
/// let funcs = interceptor::Funcs::new()
///     .create(|ctx| {
///         if ctx.resource.resource == "subnets" {
///             return Err(Error::Internal("quota exceeded".to_string()));
///         }
///         Ok(None)
///     })
///     .get(|_ctx| Ok(None));
/// ```
#[derive(Default)]
pub struct Funcs {
    pub(crate) create: Option<CreateInterceptor>,
    pub(crate) get: Option<GetInterceptor>,
    pub(crate) list: Option<ListInterceptor>,
    pub(crate) watch: Option<WatchInterceptor>,
    /// PUT on the main resource
    pub(crate) replace: Option<ReplaceInterceptor>,
    /// PUT on the status subresource
    pub(crate) replace_status: Option<ReplaceInterceptor>,
    pub(crate) patch: Option<PatchInterceptor>,
    pub(crate) patch_status: Option<PatchInterceptor>,
    pub(crate) delete: Option<DeleteInterceptor>,
    pub(crate) delete_collection: Option<DeleteCollectionInterceptor>,
}

pub struct CreateContext<'a> {
    pub client: &'a FakeClient,
    pub resource: &'a GVR,
    /// The object being created
    pub object: &'a Value,
    pub namespace: &'a str,
}

pub struct GetContext<'a> {
    pub client: &'a FakeClient,
    pub resource: &'a GVR,
    pub namespace: &'a str,
    pub name: &'a str,
}

pub struct ListContext<'a> {
    pub client: &'a FakeClient,
    pub resource: &'a GVR,
    pub namespace: Option<&'a str>,
    pub params: &'a ListParams,
}

/// Shared by replace and replace_status
pub struct ReplaceContext<'a> {
    pub client: &'a FakeClient,
    pub resource: &'a GVR,
    /// The replacement object
    pub object: &'a Value,
    pub namespace: &'a str,
    pub name: &'a str,
}

/// Shared by patch and patch_status
pub struct PatchContext<'a> {
    pub client: &'a FakeClient,
    pub resource: &'a GVR,
    /// The patch document as sent
    pub patch: &'a Value,
    pub namespace: &'a str,
    pub name: &'a str,
}

pub struct DeleteContext<'a> {
    pub client: &'a FakeClient,
    pub resource: &'a GVR,
    pub namespace: &'a str,
    pub name: &'a str,
}

pub type CreateInterceptor = Arc<dyn Fn(CreateContext) -> Result<Option<Value>> + Send + Sync>;
pub type GetInterceptor = Arc<dyn Fn(GetContext) -> Result<Option<Value>> + Send + Sync>;
pub type ListInterceptor = Arc<dyn Fn(ListContext) -> Result<Option<Vec<Value>>> + Send + Sync>;
/// Overriding a watch streams the returned objects as ADDED events, then ends
pub type WatchInterceptor = Arc<dyn Fn(ListContext) -> Result<Option<Vec<Value>>> + Send + Sync>;
pub type ReplaceInterceptor = Arc<dyn Fn(ReplaceContext) -> Result<Option<Value>> + Send + Sync>;
pub type PatchInterceptor = Arc<dyn Fn(PatchContext) -> Result<Option<Value>> + Send + Sync>;
pub type DeleteInterceptor = Arc<dyn Fn(DeleteContext) -> Result<Option<Value>> + Send + Sync>;
pub type DeleteCollectionInterceptor =
    Arc<dyn Fn(ListContext) -> Result<Option<Vec<Value>>> + Send + Sync>;

impl Funcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<F>(mut self, f: F) -> Self
    where
        F: Fn(CreateContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.create = Some(Arc::new(f));
        self
    }

    pub fn get<F>(mut self, f: F) -> Self
    where
        F: Fn(GetContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.get = Some(Arc::new(f));
        self
    }

    pub fn list<F>(mut self, f: F) -> Self
    where
        F: Fn(ListContext) -> Result<Option<Vec<Value>>> + Send + Sync + 'static,
    {
        self.list = Some(Arc::new(f));
        self
    }

    pub fn watch<F>(mut self, f: F) -> Self
    where
        F: Fn(ListContext) -> Result<Option<Vec<Value>>> + Send + Sync + 'static,
    {
        self.watch = Some(Arc::new(f));
        self
    }

    pub fn replace<F>(mut self, f: F) -> Self
    where
        F: Fn(ReplaceContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.replace = Some(Arc::new(f));
        self
    }

    pub fn replace_status<F>(mut self, f: F) -> Self
    where
        F: Fn(ReplaceContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.replace_status = Some(Arc::new(f));
        self
    }

    pub fn patch<F>(mut self, f: F) -> Self
    where
        F: Fn(PatchContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.patch = Some(Arc::new(f));
        self
    }

    pub fn patch_status<F>(mut self, f: F) -> Self
    where
        F: Fn(PatchContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.patch_status = Some(Arc::new(f));
        self
    }

    pub fn delete<F>(mut self, f: F) -> Self
    where
        F: Fn(DeleteContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.delete = Some(Arc::new(f));
        self
    }

    pub fn delete_collection<F>(mut self, f: F) -> Self
    where
        F: Fn(ListContext) -> Result<Option<Vec<Value>>> + Send + Sync + 'static,
    {
        self.delete_collection = Some(Arc::new(f));
        self
    }
}
