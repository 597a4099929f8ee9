//! DriveRemoteStore - IRemoteStore implementation for the Google Drive API
//!
//! Wraps the [`DriveClient`] and delegates to the files, upload and client
//! modules to fulfil the [`IRemoteStore`] port contract.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use drivesync_core::config::RemoteConfig;
use drivesync_core::domain::{RemoteId, RemoteItem};
use drivesync_core::ports::{IRemoteStore, ListFilter, RemotePage};

use crate::client::DriveClient;
use crate::files::{self, MAX_PAGE_SIZE};
use crate::upload;

/// Remote store backed by the user's Google Drive
pub struct DriveRemoteStore {
    client: DriveClient,
    page_size: u32,
}

impl DriveRemoteStore {
    /// Creates a store over `client` requesting the largest pages
    pub fn new(client: DriveClient) -> Self {
        Self {
            client,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Creates a store from an access token and the `remote` configuration
    pub fn from_config(access_token: impl Into<String>, config: &RemoteConfig) -> Result<Self> {
        let client = DriveClient::from_config(access_token, config)
            .context("Failed to build Drive client")?;
        Ok(Self::new(client).with_page_size(config.page_size))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait::async_trait]
impl IRemoteStore for DriveRemoteStore {
    async fn list_page(&self, filter: ListFilter, page_token: Option<&str>) -> Result<RemotePage> {
        debug!(has_token = page_token.is_some(), "DriveRemoteStore::list_page");
        files::list_page(&self.client, filter, page_token, self.page_size)
            .await
            .context("Listing files failed")
    }

    async fn get_item(&self, id: &RemoteId) -> Result<Option<RemoteItem>> {
        debug!(%id, "DriveRemoteStore::get_item");
        files::get(&self.client, id)
            .await
            .with_context(|| format!("Fetching item {id} failed"))
    }

    async fn create_folder(&self, name: &str, parent: &RemoteId) -> Result<RemoteItem> {
        debug!(name, %parent, "DriveRemoteStore::create_folder");
        files::create_folder(&self.client, name, parent)
            .await
            .with_context(|| format!("Creating folder '{name}' failed"))
    }

    async fn create_file(
        &self,
        name: &str,
        parent: Option<&RemoteId>,
        source: &Path,
    ) -> Result<RemoteItem> {
        debug!(name, parent = ?parent.map(RemoteId::as_str), "DriveRemoteStore::create_file");
        upload::create_file(&self.client, name, parent, source)
            .await
            .with_context(|| format!("Uploading '{name}' failed"))
    }

    async fn update_file(
        &self,
        id: &RemoteId,
        source: &Path,
        content_type: &str,
    ) -> Result<RemoteItem> {
        debug!(%id, content_type, "DriveRemoteStore::update_file");
        upload::update_file(&self.client, id, source, content_type)
            .await
            .with_context(|| format!("Updating {id} failed"))
    }

    async fn download(&self, id: &RemoteId, destination: &Path) -> Result<()> {
        debug!(%id, "DriveRemoteStore::download");
        self.client
            .download_file(id, destination)
            .await
            .with_context(|| format!("Downloading {id} failed"))?;
        Ok(())
    }

    async fn trash(&self, id: &RemoteId) -> Result<()> {
        debug!(%id, "DriveRemoteStore::trash");
        files::trash(&self.client, id)
            .await
            .with_context(|| format!("Trashing {id} failed"))
    }
}
