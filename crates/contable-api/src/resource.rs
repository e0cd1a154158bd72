//! # Generic REST Resource
//!
//! List/get/create/update/delete over one collection path. The domain
//! services are built on top of it.
//!
//! ```text
//! Resource<Invoice>("contabilidad/facturas/")
//!   list(q)            GET    contabilidad/facturas/?q
//!   get(12)            GET    contabilidad/facturas/12/
//!   create(b)          POST   contabilidad/facturas/
//!   update(12, b)      PATCH  contabilidad/facturas/12/
//!   delete(12)         DELETE contabilidad/facturas/12/
//!   action(12, "x", b) POST   contabilidad/facturas/12/x/
//! ```

use std::fmt::Display;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, Download, Page};
use crate::error::ApiResult;

/// List endpoints answer either a page envelope or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> From<ListBody<T>> for Page<T> {
    fn from(body: ListBody<T>) -> Self {
        match body {
            ListBody::Paged(page) => page,
            ListBody::Plain(results) => Page {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}

/// A REST collection of `T`.
#[derive(Debug, Clone)]
pub struct Resource<T> {
    client: ApiClient,
    path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Resource<T> {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        let mut path = path.into().trim_start_matches('/').to_string();
        if !path.ends_with('/') {
            path.push('/');
        }

        Resource {
            client,
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn item_path(&self, id: impl Display) -> String {
        format!("{}{}/", self.path, id)
    }

    /// Path of a sub-route: `{collection}{id}/{action}/`.
    pub fn action_path(&self, id: impl Display, action: &str) -> String {
        format!("{}{}/{}/", self.path, id, action.trim_matches('/'))
    }

    pub async fn list<Q: Serialize + ?Sized>(&self, query: &Q) -> ApiResult<Page<T>> {
        self.list_at(&self.path, query).await
    }

    /// Lists `T` from another route, e.g. a nested `{id}/movimientos/`.
    pub async fn list_at<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ApiResult<Page<T>> {
        let body: ListBody<T> = self.client.get_query(path, query).await?;
        Ok(body.into())
    }

    pub async fn get(&self, id: impl Display) -> ApiResult<T> {
        self.client.get(&self.item_path(id)).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> ApiResult<T> {
        self.client.post(&self.path, body).await
    }

    /// Partial update (PATCH).
    pub async fn update<B: Serialize + ?Sized>(&self, id: impl Display, body: &B) -> ApiResult<T> {
        self.client.patch(&self.item_path(id), body).await
    }

    pub async fn delete(&self, id: impl Display) -> ApiResult<()> {
        self.client.delete(&self.item_path(id)).await
    }

    /// POSTs to a detail route and decodes whatever it answers.
    pub async fn action<B, R>(&self, id: impl Display, action: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.client.post(&self.action_path(id, action), body).await
    }

    /// Downloads a file from a detail route.
    pub async fn download<Q: Serialize + ?Sized>(
        &self,
        id: impl Display,
        action: &str,
        query: &Q,
    ) -> ApiResult<Download> {
        self.client.download(&self.action_path(id, action), query).await
    }
}
