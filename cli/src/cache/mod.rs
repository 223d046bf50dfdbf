pub mod controller;
pub mod fetch;
pub mod storage;

pub use controller::{AssetRequest, CacheController, CacheError, RequestClass, classify};
pub use fetch::{FetchError, FetchedBody, Fetcher, HttpFetcher};
pub use storage::{CacheStorage, CachedResponse};

/// Versioned cache names. Bumping the suffix is the deploy-time mechanism
/// for full cache invalidation: activation purges every name not listed in
/// [`CURRENT_CACHES`].
pub const STATIC_CACHE: &str = "juicy-static-v2";
pub const RUNTIME_CACHE: &str = "juicy-runtime-v2";
pub const MEDIA_CACHE: &str = "juicy-media-v2";
pub const CURRENT_CACHES: [&str; 3] = [STATIC_CACHE, RUNTIME_CACHE, MEDIA_CACHE];

/// Replacement document served for navigations that fail offline.
pub const OFFLINE_FALLBACK: &str = "/index.html";

/// Core assets precached on install, all-or-nothing.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/ui.css",
    "/app.js",
    "/manifest.webmanifest",
    "/icons/192.png",
    "/icons/512.png",
    "/data/recipes.json",
    "/data/plan-7days.json",
    "/data/motivation.json",
];
