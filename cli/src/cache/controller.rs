use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::fetch::{FetchError, FetchedBody, Fetcher};
use super::storage::{CacheStorage, CachedResponse};
use super::{
    CURRENT_CACHES, MEDIA_CACHE, OFFLINE_FALLBACK, RUNTIME_CACHE, STATIC_ASSETS, STATIC_CACHE,
};

#[derive(Debug, Error)]
pub enum CacheError {
    /// Transport failure with no cached fallback defined for the class.
    #[error("network fetch failed: {0}")]
    Network(#[from] FetchError),
    #[error("cache storage error: {0}")]
    Storage(#[from] std::io::Error),
    /// A precache asset failed during install; the previous static cache
    /// keeps serving.
    #[error("precache of {url} failed: {reason}")]
    Install { url: String, reason: String },
}

/// Request classes. Classification is stateless per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Navigation,
    Document,
    Media,
    Data,
    Other,
}

/// The slice of an incoming GET request the controller cares about.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub url: String,
    pub navigate: bool,
    pub destination: Option<String>,
}

impl AssetRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            navigate: false,
            destination: None,
        }
    }

    #[must_use]
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            navigate: true,
            destination: None,
        }
    }
}

fn path_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("/", |i| &without_scheme[i..]);
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end.max(1)]
}

fn extension_of(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next().unwrap_or("");
    file.rsplit_once('.').map(|(_, ext)| ext)
}

#[must_use]
pub fn classify(request: &AssetRequest) -> RequestClass {
    if request.navigate {
        return RequestClass::Navigation;
    }
    if let Some(dest) = request.destination.as_deref() {
        match dest {
            "document" | "style" | "script" => return RequestClass::Document,
            "image" | "font" => return RequestClass::Media,
            _ => {}
        }
    }
    let path = path_of(&request.url);
    if path.contains("/data/") || extension_of(path) == Some("json") {
        return RequestClass::Data;
    }
    match extension_of(path) {
        Some("html" | "css" | "js" | "mjs" | "webmanifest") => RequestClass::Document,
        Some(
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "woff" | "woff2" | "ttf"
            | "otf",
        ) => RequestClass::Media,
        _ => RequestClass::Other,
    }
}

/// Per-class caching strategies over three named caches, with the
/// install/activate lifecycle of the versioned cache set. Holds no state
/// beyond the caches themselves.
pub struct CacheController<F: Fetcher> {
    origin: String,
    storage: CacheStorage,
    fetcher: Arc<F>,
}

impl<F: Fetcher> CacheController<F> {
    pub fn new(origin: impl Into<String>, storage: CacheStorage, fetcher: Arc<F>) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }
        Self {
            origin,
            storage,
            fetcher,
        }
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Absolute URL of an origin-relative asset path.
    #[must_use]
    pub fn asset_url(&self, path: &str) -> String {
        format!("{}{path}", self.origin)
    }

    /// Dispatch one GET request through its class strategy. Non-GET traffic
    /// never reaches the controller.
    pub async fn handle(&self, request: &AssetRequest) -> Result<CachedResponse, CacheError> {
        match classify(request) {
            RequestClass::Navigation => Ok(self.network_first(&request.url).await),
            RequestClass::Media => self.cache_first(&request.url, MEDIA_CACHE).await,
            RequestClass::Document | RequestClass::Data | RequestClass::Other => {
                self.stale_while_revalidate(&request.url, RUNTIME_CACHE).await
            }
        }
    }

    /// Navigation: try the network and cache the result; a transport
    /// failure falls back to the precached shell, or a synthesized 503 when
    /// even that is missing. HTTP error statuses still count as responses.
    async fn network_first(&self, url: &str) -> CachedResponse {
        match self.fetcher.fetch(url).await {
            Ok(fetched) => {
                let response = snapshot(url, fetched);
                if let Err(err) = self.storage.put(RUNTIME_CACHE, &response) {
                    warn!(url, error = %err, "failed to cache navigation response");
                }
                response
            }
            Err(err) => {
                debug!(url, error = %err, "navigation fetch failed, trying offline fallback");
                let fallback_url = self.asset_url(OFFLINE_FALLBACK);
                self.storage
                    .lookup(STATIC_CACHE, &fallback_url)
                    .unwrap_or_else(|| offline_response(url))
            }
        }
    }

    /// Serve the cached copy immediately and refresh it in the background;
    /// without a cached copy the caller waits on the network directly, and a
    /// transport failure then fails the operation.
    async fn stale_while_revalidate(
        &self,
        url: &str,
        cache: &'static str,
    ) -> Result<CachedResponse, CacheError> {
        if let Some(cached) = self.storage.lookup(cache, url) {
            self.spawn_revalidate(url.to_string(), cache);
            return Ok(cached);
        }
        let fetched = self.fetcher.fetch(url).await?;
        let response = snapshot(url, fetched);
        if let Err(err) = self.storage.put(cache, &response) {
            warn!(url, error = %err, "failed to cache response");
        }
        Ok(response)
    }

    /// Detached revalidation task. Never awaited by the request path and
    /// never cancelled; errors are logged and the stale entry keeps serving.
    fn spawn_revalidate(&self, url: String, cache: &'static str) {
        let fetcher = Arc::clone(&self.fetcher);
        let storage = self.storage.clone();
        tokio::spawn(async move {
            match fetcher.fetch(&url).await {
                Ok(fetched) => {
                    let response = snapshot(&url, fetched);
                    if let Err(err) = storage.put(cache, &response) {
                        warn!(url, error = %err, "failed to store revalidated response");
                    }
                }
                Err(err) => debug!(url, error = %err, "background revalidation failed"),
            }
        });
    }

    /// Cached copies are served without touching the network.
    async fn cache_first(
        &self,
        url: &str,
        cache: &'static str,
    ) -> Result<CachedResponse, CacheError> {
        if let Some(cached) = self.storage.lookup(cache, url) {
            return Ok(cached);
        }
        let fetched = self.fetcher.fetch(url).await?;
        let response = snapshot(url, fetched);
        if let Err(err) = self.storage.put(cache, &response) {
            warn!(url, error = %err, "failed to cache response");
        }
        Ok(response)
    }

    /// Precache every core asset into a staged cache and promote it only
    /// when all of them succeeded. Unlike the runtime strategies, install
    /// requires a 2xx for every asset; any failure aborts the whole step
    /// and the previous static cache keeps serving.
    pub async fn install(&self) -> Result<usize, CacheError> {
        let staging = format!("{STATIC_CACHE}.install");
        self.storage.delete_cache(&staging)?;
        for path in STATIC_ASSETS {
            let url = self.asset_url(path);
            let fetched = match self.fetcher.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(err) => {
                    self.storage.delete_cache(&staging)?;
                    return Err(CacheError::Install {
                        url,
                        reason: err.to_string(),
                    });
                }
            };
            if !fetched.is_success() {
                let reason = format!("status {}", fetched.status);
                self.storage.delete_cache(&staging)?;
                return Err(CacheError::Install { url, reason });
            }
            self.storage.put(&staging, &snapshot(&url, fetched))?;
        }
        self.storage.promote(&staging, STATIC_CACHE)?;
        Ok(STATIC_ASSETS.len())
    }

    /// Delete every cache whose name is not one of the current three.
    /// Returns the purged names.
    pub fn activate(&self) -> Result<Vec<String>, CacheError> {
        let mut purged = Vec::new();
        for name in self.storage.cache_names()? {
            if !CURRENT_CACHES.contains(&name.as_str()) {
                self.storage.delete_cache(&name)?;
                purged.push(name);
            }
        }
        Ok(purged)
    }
}

/// Cache entries are keyed by the *requested* URL, not the final one after
/// redirects.
fn snapshot(url: &str, fetched: FetchedBody) -> CachedResponse {
    CachedResponse {
        url: url.to_string(),
        status: fetched.status,
        content_type: fetched.content_type,
        body: fetched.body,
    }
}

/// Synthesized last-resort response for offline navigations.
fn offline_response(url: &str) -> CachedResponse {
    CachedResponse {
        url: url.to_string(),
        status: 503,
        content_type: Some("text/plain".to_string()),
        body: b"Offline".to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Scripted fetcher: `None` simulates a transport failure (offline).
    #[derive(Default)]
    struct MockFetcher {
        responses: Mutex<HashMap<String, Option<FetchedBody>>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl MockFetcher {
        fn serve(&self, url: &str, status: u16, body: &[u8]) {
            self.responses.lock().unwrap().insert(
                url.to_string(),
                Some(FetchedBody {
                    url: url.to_string(),
                    status,
                    content_type: Some("text/plain".to_string()),
                    body: body.to_vec(),
                }),
            );
        }

        fn go_offline(&self, url: &str) {
            self.responses.lock().unwrap().insert(url.to_string(), None);
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl Fetcher for MockFetcher {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedBody, FetchError>> + Send {
            *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
            let scripted = self.responses.lock().unwrap().get(url).cloned();
            async move {
                match scripted {
                    Some(Some(body)) => Ok(body),
                    _ => Err(FetchError::new("connection refused")),
                }
            }
        }
    }

    const ORIGIN: &str = "https://juice.test";

    fn controller() -> (tempfile::TempDir, Arc<MockFetcher>, CacheController<MockFetcher>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::open(dir.path()).unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let controller = CacheController::new(ORIGIN, storage, Arc::clone(&fetcher));
        (dir, fetcher, controller)
    }

    fn serve_all_static(fetcher: &MockFetcher) {
        for path in STATIC_ASSETS {
            fetcher.serve(&format!("{ORIGIN}{path}"), 200, format!("asset {path}").as_bytes());
        }
    }

    async fn wait_for<C: Fn() -> bool>(condition: C) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    // --- Classification ---

    #[test]
    fn test_classify_navigation_wins() {
        let request = AssetRequest::navigation("https://juice.test/anything.png");
        assert_eq!(classify(&request), RequestClass::Navigation);
    }

    #[test]
    fn test_classify_by_destination() {
        let mut request = AssetRequest::get("https://juice.test/x");
        request.destination = Some("style".to_string());
        assert_eq!(classify(&request), RequestClass::Document);
        request.destination = Some("font".to_string());
        assert_eq!(classify(&request), RequestClass::Media);
    }

    #[test]
    fn test_classify_by_extension_and_data_path() {
        assert_eq!(
            classify(&AssetRequest::get("https://juice.test/ui.css")),
            RequestClass::Document
        );
        assert_eq!(
            classify(&AssetRequest::get("https://juice.test/icons/192.png")),
            RequestClass::Media
        );
        assert_eq!(
            classify(&AssetRequest::get("https://juice.test/data/recipes.json?v=2")),
            RequestClass::Data
        );
        assert_eq!(
            classify(&AssetRequest::get("https://juice.test/api/ping")),
            RequestClass::Other
        );
    }

    // --- Navigation strategy ---

    #[tokio::test]
    async fn test_offline_navigation_without_fallback_is_503() {
        let (_dir, fetcher, controller) = controller();
        fetcher.go_offline("https://juice.test/");

        let response = controller
            .handle(&AssetRequest::navigation("https://juice.test/"))
            .await
            .unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, b"Offline");
    }

    #[tokio::test]
    async fn test_offline_navigation_serves_precached_shell() {
        let (_dir, fetcher, controller) = controller();
        serve_all_static(&fetcher);
        controller.install().await.unwrap();

        fetcher.go_offline("https://juice.test/");
        let response = controller
            .handle(&AssetRequest::navigation("https://juice.test/"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"asset /index.html");
    }

    #[tokio::test]
    async fn test_successful_navigation_is_cached_into_runtime() {
        let (_dir, fetcher, controller) = controller();
        fetcher.serve("https://juice.test/", 200, b"shell");

        let response = controller
            .handle(&AssetRequest::navigation("https://juice.test/"))
            .await
            .unwrap();
        assert_eq!(response.body, b"shell");

        let cached = controller
            .storage()
            .lookup(RUNTIME_CACHE, "https://juice.test/")
            .unwrap();
        assert_eq!(cached.body, b"shell");
    }

    #[tokio::test]
    async fn test_navigation_caches_http_error_statuses_too() {
        // Only transport failures trigger the fallback path.
        let (_dir, fetcher, controller) = controller();
        fetcher.serve("https://juice.test/gone", 404, b"not found");

        let response = controller
            .handle(&AssetRequest::navigation("https://juice.test/gone"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert!(
            controller
                .storage()
                .lookup(RUNTIME_CACHE, "https://juice.test/gone")
                .is_some()
        );
    }

    // --- Cache-first strategy ---

    #[tokio::test]
    async fn test_cache_first_never_refetches() {
        let (_dir, fetcher, controller) = controller();
        let url = "https://juice.test/icons/192.png";
        fetcher.serve(url, 200, b"png bytes");

        let first = controller.handle(&AssetRequest::get(url)).await.unwrap();
        let second = controller.handle(&AssetRequest::get(url)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(url), 1);
    }

    #[tokio::test]
    async fn test_cache_first_miss_propagates_network_fault() {
        let (_dir, fetcher, controller) = controller();
        let url = "https://juice.test/icons/192.png";
        fetcher.go_offline(url);

        let result = controller.handle(&AssetRequest::get(url)).await;
        assert!(matches!(result, Err(CacheError::Network(_))));
    }

    // --- Stale-while-revalidate strategy ---

    #[tokio::test]
    async fn test_swr_serves_stale_and_revalidates_in_background() {
        let (_dir, fetcher, controller) = controller();
        let url = "https://juice.test/data/recipes.json";
        fetcher.serve(url, 200, b"v1");

        // Miss: awaits the network and caches.
        let first = controller.handle(&AssetRequest::get(url)).await.unwrap();
        assert_eq!(first.body, b"v1");
        assert_eq!(fetcher.calls(url), 1);

        // Hit: returns the stale copy immediately, refreshes behind it.
        fetcher.serve(url, 200, b"v2");
        let second = controller.handle(&AssetRequest::get(url)).await.unwrap();
        assert_eq!(second.body, b"v1");

        let storage = controller.storage().clone();
        wait_for(|| {
            storage
                .lookup(RUNTIME_CACHE, url)
                .is_some_and(|c| c.body == b"v2")
        })
        .await;

        let third = controller.handle(&AssetRequest::get(url)).await.unwrap();
        assert_eq!(third.body, b"v2");
    }

    #[tokio::test]
    async fn test_swr_failed_revalidation_keeps_stale_entry() {
        let (_dir, fetcher, controller) = controller();
        let url = "https://juice.test/app.js";
        fetcher.serve(url, 200, b"v1");
        controller.handle(&AssetRequest::get(url)).await.unwrap();

        fetcher.go_offline(url);
        let stale = controller.handle(&AssetRequest::get(url)).await.unwrap();
        assert_eq!(stale.body, b"v1");

        wait_for(|| fetcher.calls(url) >= 2).await;
        let cached = controller.storage().lookup(RUNTIME_CACHE, url).unwrap();
        assert_eq!(cached.body, b"v1");
    }

    #[tokio::test]
    async fn test_swr_miss_with_network_fault_fails() {
        let (_dir, fetcher, controller) = controller();
        let url = "https://juice.test/ui.css";
        fetcher.go_offline(url);

        let result = controller.handle(&AssetRequest::get(url)).await;
        assert!(matches!(result, Err(CacheError::Network(_))));
    }

    // --- Install / activate lifecycle ---

    #[tokio::test]
    async fn test_install_precaches_every_asset() {
        let (_dir, fetcher, controller) = controller();
        serve_all_static(&fetcher);

        let count = controller.install().await.unwrap();
        assert_eq!(count, STATIC_ASSETS.len());
        for path in STATIC_ASSETS {
            let url = format!("{ORIGIN}{path}");
            assert!(controller.storage().lookup(STATIC_CACHE, &url).is_some(), "{path} missing");
        }
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let (_dir, fetcher, controller) = controller();
        serve_all_static(&fetcher);
        controller.install().await.unwrap();

        // One broken asset fails the whole next install...
        fetcher.serve("https://juice.test/ui.css", 404, b"gone");
        let err = controller.install().await.unwrap_err();
        assert!(matches!(err, CacheError::Install { .. }));

        // ...and the previous static cache keeps serving.
        let shell = controller
            .storage()
            .lookup(STATIC_CACHE, "https://juice.test/index.html")
            .unwrap();
        assert_eq!(shell.body, b"asset /index.html");
        // No staging leftovers.
        assert!(
            !controller
                .storage()
                .cache_names()
                .unwrap()
                .iter()
                .any(|n| n.ends_with(".install"))
        );
    }

    #[tokio::test]
    async fn test_failed_first_install_leaves_no_static_cache() {
        let (_dir, fetcher, controller) = controller();
        serve_all_static(&fetcher);
        fetcher.go_offline("https://juice.test/app.js");

        assert!(controller.install().await.is_err());
        assert!(!controller.storage().cache_names().unwrap().contains(&STATIC_CACHE.to_string()));
    }

    #[tokio::test]
    async fn test_activate_purges_only_stale_caches() {
        let (_dir, fetcher, controller) = controller();
        serve_all_static(&fetcher);
        controller.install().await.unwrap();

        // A leftover cache from a previous version.
        controller
            .storage()
            .put(
                "juicy-static-v1",
                &CachedResponse {
                    url: "https://juice.test/old".to_string(),
                    status: 200,
                    content_type: None,
                    body: b"old".to_vec(),
                },
            )
            .unwrap();

        let purged = controller.activate().unwrap();
        assert_eq!(purged, vec!["juicy-static-v1".to_string()]);

        let names = controller.storage().cache_names().unwrap();
        assert!(names.contains(&STATIC_CACHE.to_string()));
        assert!(!names.contains(&"juicy-static-v1".to_string()));
    }
}
