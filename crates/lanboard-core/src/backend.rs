// ── REST-backed entity source ──
//
// Bridges `lanboard_api::ApiClient` into the store layer: list calls feed
// `EntitySource` impls, mutation calls return domain types. Wire types
// never leave this module.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use lanboard_api::ApiClient;

use crate::error::CoreError;
use crate::model::{Category, Device, EntityId, Location, Mac, Owner};
use crate::store::EntitySource;

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct Backend {
    client: ApiClient,
}

impl Backend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn create_device(
        &self,
        request: &lanboard_api::types::DeviceRequest,
    ) -> Result<Device, CoreError> {
        Ok(self.client.create_device(request).await?.into())
    }

    pub async fn update_device(
        &self,
        id: EntityId,
        request: &lanboard_api::types::DeviceRequest,
    ) -> Result<Device, CoreError> {
        Ok(self.client.update_device(id.get(), request).await?.into())
    }

    pub async fn delete_device(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_device(id.get()).await?)
    }

    // ── Owners ───────────────────────────────────────────────────────

    pub async fn create_owner(
        &self,
        request: &lanboard_api::types::OwnerRequest,
    ) -> Result<Owner, CoreError> {
        Ok(self.client.create_owner(request).await?.into())
    }

    pub async fn update_owner(
        &self,
        id: EntityId,
        request: &lanboard_api::types::OwnerRequest,
    ) -> Result<Owner, CoreError> {
        Ok(self.client.update_owner(id.get(), request).await?.into())
    }

    pub async fn delete_owner(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_owner(id.get()).await?)
    }
}

macro_rules! backend_source {
    ($ty:ty, $call:ident) => {
        impl EntitySource<$ty> for Backend {
            fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<$ty>, CoreError>> {
                async move {
                    let items = self.client.$call().await?;
                    Ok(items.into_iter().map(<$ty>::from).collect())
                }
                .boxed()
            }
        }
    };
}

backend_source!(Device, list_devices);
backend_source!(Owner, list_owners);
backend_source!(Mac, list_macs);
backend_source!(Category, list_categories);
backend_source!(Location, list_locations);
