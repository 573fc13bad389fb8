//! Upload orchestration.
//!
//! # Architecture
//!
//! ```text
//! urls ─▶ resolve ─▶ validate ─┬─ split ──▶ loader + chunks ─┐
//!                              └─ upload ─────────────────────┤
//!                                                             ▼
//!                                       webp variant (images, optional)
//!                                                             │
//!                        BatchResult (input order) ◀──────────┘
//!                                │
//!                                └─▶ manifest merge (once, at the end)
//! ```
//!
//! Every failure is local to its URL: it becomes that URL's outcome and the
//! batch moves on. Panics are caught at the same boundary.

mod outcome;

use std::error::Error as StdError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;

use crate::asset::{AssetError, AssetKind, AssetLocation, AssetResolver, Validator};
use crate::config::CdnConfig;
use crate::core::{CancelToken, shutdown_token};
use crate::image::{ImageProcessor, WebpTranscoder, variant_key};
use crate::logger::ProgressLine;
use crate::manifest::{ManifestFile, ManifestStore};
use crate::split::{CriticalClassifier, CriticalFiles, Splitter};
use crate::store::{RemoteStore, build_store};
use crate::utils::plural_count;
use crate::{debug, log};

pub use outcome::{AssetDetail, AssetOutcome, BatchResult, BatchStatus, WebpOutcome};

pub struct Pipeline {
    enabled: bool,
    parallel: bool,
    webp: bool,
    resolver: AssetResolver,
    validator: Validator,
    splitter: Splitter,
    store: Arc<dyn RemoteStore>,
    images: Arc<dyn ImageProcessor>,
    manifest: Option<Arc<dyn ManifestStore>>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Build a pipeline around explicit collaborators.
    ///
    /// The configuration is copied in; later changes to `config` have no
    /// effect on this pipeline.
    pub fn new(
        config: &CdnConfig,
        store: Arc<dyn RemoteStore>,
        images: Arc<dyn ImageProcessor>,
        classifier: Arc<dyn CriticalClassifier>,
    ) -> Self {
        let parallel = config.cdn.parallel && store.concurrent_uploads();
        if config.cdn.parallel && !parallel {
            debug!("upload"; "{} store takes one upload at a time, processing sequentially", store.name());
        }

        Self {
            enabled: config.cdn.enable,
            parallel,
            webp: config.webp.enable,
            resolver: AssetResolver::new(&config.paths),
            validator: Validator::new(config.cdn.max_file_size),
            splitter: Splitter::new(config.split.clone(), store.clone(), classifier),
            store,
            images,
            manifest: None,
            cancel: CancelToken::new(),
        }
    }

    /// Pipeline with the configured store, the WebP transcoder, the
    /// manifest file and the Ctrl+C token.
    pub fn from_config(config: &CdnConfig) -> Result<Self> {
        let store = build_store(&config.store)?;
        let images = Arc::new(WebpTranscoder::new(&config.webp));
        let classifier = Arc::new(CriticalFiles::new(&config.split.critical_files));
        let manifest = Arc::new(ManifestFile::new(config.manifest.path.clone()));

        Ok(Self::new(config, store, images, classifier)
            .with_manifest(manifest)
            .with_cancel(shutdown_token()))
    }

    pub fn with_manifest(mut self, manifest: Arc<dyn ManifestStore>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Process `urls` and fold their outcomes in input order.
    pub fn process_batch(&self, urls: &[String], progress: Option<&ProgressLine>) -> BatchResult {
        if let Err(reason) = self.preflight() {
            log!("error"; "{}", reason);
            return BatchResult::aborted(urls.len(), reason);
        }

        log!("upload"; "processing {} to {}", plural_count(urls.len(), "url"), self.store.name());

        let run = |url: &String| {
            let detail = self.process_guarded(url);
            if let Some(progress) = progress {
                progress.inc();
            }
            detail
        };

        let details: Vec<AssetDetail> = if self.parallel {
            urls.par_iter().map(run).collect()
        } else {
            urls.iter().map(run).collect()
        };

        let mut result = BatchResult::new(urls.len());
        for detail in details {
            result.record(detail);
        }

        self.save_manifest(&mut result);
        log!("upload"; "{}", result.summary());
        result
    }

    /// Batch-level checks, run before any asset is touched.
    fn preflight(&self) -> Result<(), String> {
        if !self.enabled {
            return Err("CDN integration is disabled".to_string());
        }
        for root in self.resolver.roots() {
            debug!("upload"; "root directory: {}", root.display());
            if !root.is_dir() {
                return Err(format!("root directory not found: {}", root.display()));
            }
        }
        Ok(())
    }

    fn process_guarded(&self, url: &str) -> AssetDetail {
        if self.cancel.is_cancelled() {
            return AssetDetail::skipped(url, "cancelled");
        }

        catch_unwind(AssertUnwindSafe(|| self.process_one(url))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            log!("error"; "exception processing {}: {}", url, message);
            AssetDetail::failed(url, AssetError::Unexpected { message })
        })
    }

    fn process_one(&self, url: &str) -> AssetDetail {
        debug!("upload"; "processing url: {}", url);

        let location = match self.resolver.resolve(url) {
            Ok(location) => location,
            Err(e) => {
                log!("warning"; "{} [{}]", e, e.code());
                return AssetDetail::failed(url, e);
            }
        };
        debug!("upload"; "{:?} asset, local path: {}", location.origin, location.local_path.display());

        if let Err(e) = self.validator.validate(&location.local_path) {
            return AssetDetail::failed(url, e);
        }

        let outcome = self.publish(&location);
        if !outcome.is_success() {
            return AssetDetail::new(url, outcome);
        }
        log!("upload"; "uploaded {}", url);

        let webp = if self.webp && self.images.is_image_file(&location.local_path) {
            self.publish_webp_guarded(&location)
        } else {
            WebpOutcome::None
        };

        AssetDetail {
            url: url.to_string(),
            outcome,
            webp,
        }
    }

    /// Split or upload directly.
    fn publish(&self, location: &AssetLocation) -> AssetOutcome {
        let local = &location.local_path;

        if AssetKind::from_path(local).is_script() && self.splitter.should_split(local) {
            log!("split"; "splitting {}", location.remote_path);
            return match self.splitter.split(local, &location.remote_path) {
                Ok(split) => AssetOutcome::UploadedSplit {
                    loader_path: split.loader,
                    chunk_paths: split.chunks,
                },
                Err(e) => {
                    let reason = error_chain(&e);
                    log!("error"; "split failed for {}: {}", location.remote_path, reason);
                    AssetOutcome::Failed(AssetError::SplitFailed { reason })
                }
            };
        }

        match self.store.upload_file(local, &location.remote_path) {
            Ok(()) => AssetOutcome::Uploaded {
                remote_path: location.remote_path.clone(),
            },
            Err(e) => {
                let reason = error_chain(&e);
                log!("error"; "upload failed for {}: {}", location.remote_path, reason);
                AssetOutcome::Failed(AssetError::UploadFailed {
                    key: location.remote_path.clone(),
                    reason,
                })
            }
        }
    }

    /// The primary upload is already published; a panic here only affects
    /// the variant.
    fn publish_webp_guarded(&self, location: &AssetLocation) -> WebpOutcome {
        catch_unwind(AssertUnwindSafe(|| self.publish_webp(location))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            log!("error"; "exception converting {}: {}", location.remote_path, message);
            WebpOutcome::ConversionFailed(AssetError::Unexpected { message })
        })
    }

    fn publish_webp(&self, location: &AssetLocation) -> WebpOutcome {
        let Some(webp_path) = self.images.convert_to_webp(&location.local_path) else {
            return WebpOutcome::ConversionFailed(AssetError::VariantConversionFailed {
                path: location.local_path.clone(),
            });
        };

        let key = variant_key(&location.remote_path, "webp");
        match self.store.upload_file(&webp_path, &key) {
            Ok(()) => {
                log!("webp"; "uploaded {}", key);
                WebpOutcome::Converted { remote_path: key }
            }
            Err(e) => {
                let reason = error_chain(&e);
                log!("error"; "webp upload failed for {}: {}", key, reason);
                WebpOutcome::ConversionFailed(AssetError::UploadFailed { key, reason })
            }
        }
    }

    fn save_manifest(&self, result: &mut BatchResult) {
        let records = result.split_records();
        if records.is_empty() {
            return;
        }
        let Some(manifest) = &self.manifest else {
            return;
        };

        log!("manifest"; "saving {}", plural_count(records.len(), "split record"));
        if let Err(e) = manifest.update(records) {
            let reason = error_chain(&e);
            log!("error"; "failed to save split manifest: {}", reason);
            result.manifest_error = Some(reason);
        }
    }
}

/// `outer: inner: root` message of an error and its sources.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::testing::FakeImages;
    use crate::manifest::SplitRecord;
    use crate::store::testing::RecordingStore;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: CdnConfig,
        store: Arc<RecordingStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_store(RecordingStore::new())
        }

        fn with_store(store: RecordingStore) -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = CdnConfig::default();
            config.paths.static_root = dir.path().join("pub/static");
            config.paths.media_root = dir.path().join("pub/media");
            config.split.temp_dir = Some(dir.path().join("tmp"));
            fs::create_dir_all(&config.paths.static_root).unwrap();
            fs::create_dir_all(&config.paths.media_root).unwrap();
            Self {
                dir,
                config,
                store: Arc::new(store),
            }
        }

        fn write(&self, rel: &str, bytes: &[u8]) -> PathBuf {
            let path = self.dir.path().join("pub").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, bytes).unwrap();
            path
        }

        fn pipeline(&self) -> Pipeline {
            self.pipeline_with_images(FakeImages::default())
        }

        fn pipeline_with_images(&self, images: FakeImages) -> Pipeline {
            Pipeline::new(
                &self.config,
                self.store.clone(),
                Arc::new(images),
                Arc::new(CriticalFiles::new(&self.config.split.critical_files)),
            )
        }

        fn manifest_path(&self) -> PathBuf {
            self.dir.path().join("manifest.json")
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn script(len: usize) -> Vec<u8> {
        b"console.log('x');\n".iter().copied().cycle().take(len).collect()
    }

    #[test]
    fn test_small_script_uploaded_directly() {
        let f = Fixture::new();
        f.write("static/app.js", &script(50 * 1024));

        let result = f.pipeline().process_batch(&urls(&["/static/app.js"]), None);
        assert_eq!(
            result.details()[0].outcome,
            AssetOutcome::Uploaded {
                remote_path: "app.js".into()
            }
        );
        assert_eq!((result.success, result.failed, result.webp_converted), (1, 0, 0));
        assert_eq!(f.store.keys(), ["app.js"]);
    }

    #[test]
    fn test_big_script_uploaded_split() {
        let f = Fixture::new();
        let content = script(500 * 1024);
        f.write("static/big.js", &content);

        let result = f.pipeline().process_batch(&urls(&["/static/big.js"]), None);
        let AssetOutcome::UploadedSplit {
            loader_path,
            chunk_paths,
        } = &result.details()[0].outcome
        else {
            panic!("expected split outcome: {:?}", result.details()[0].outcome);
        };
        assert_eq!(loader_path, "big_loader.js");
        assert_eq!(chunk_paths.len(), 6);
        assert_eq!(f.store.keys().len(), 6);
        assert_eq!(f.store.keys()[0], "big_loader.js");

        let joined: Vec<u8> = chunk_paths[1..]
            .iter()
            .flat_map(|k| f.store.content(k).unwrap())
            .collect();
        assert_eq!(joined, content);
        assert_eq!(result.split_records().len(), 1);
        assert_eq!(result.split_records()[0].chunks, 5);
    }

    #[test]
    fn test_unsupported_url_fails_without_io() {
        let f = Fixture::new();
        let result = f.pipeline().process_batch(&urls(&["/unsupported/path.css"]), None);
        assert_eq!(
            result.details()[0].outcome,
            AssetOutcome::Failed(AssetError::UnsupportedUrlFormat {
                url: "/unsupported/path.css".into()
            })
        );
        assert_eq!((result.success, result.failed), (0, 1));
        assert!(f.store.keys().is_empty());
    }

    #[test]
    fn test_image_gets_webp_variant() {
        let mut f = Fixture::new();
        f.config.webp.enable = true;
        f.write("media/catalog/a.png", b"png bytes");

        let result = f.pipeline().process_batch(&urls(&["/media/catalog/a.png"]), None);
        assert_eq!(f.store.keys(), ["catalog/a.png", "catalog/a.webp"]);
        assert_eq!(result.webp_converted, 1);
        assert_eq!(
            result.details()[0].webp,
            WebpOutcome::Converted {
                remote_path: "catalog/a.webp".into()
            }
        );
    }

    #[test]
    fn test_webp_failure_keeps_primary_success() {
        let mut f = Fixture::with_store(RecordingStore::failing(|k| k.ends_with(".webp")));
        f.config.webp.enable = true;
        f.write("media/a.png", b"png bytes");
        f.write("media/b.jpg", b"jpg bytes");

        let images = FakeImages::default();
        let result = f
            .pipeline_with_images(images)
            .process_batch(&urls(&["/media/a.png"]), None);
        assert_eq!((result.success, result.failed, result.webp_converted), (1, 0, 0));
        assert!(matches!(
            result.details()[0].webp,
            WebpOutcome::ConversionFailed(AssetError::UploadFailed { .. })
        ));

        let result = f
            .pipeline_with_images(FakeImages { fail: true })
            .process_batch(&urls(&["/media/b.jpg"]), None);
        assert_eq!(result.success, 1);
        assert!(matches!(
            result.details()[0].webp,
            WebpOutcome::ConversionFailed(AssetError::VariantConversionFailed { .. })
        ));
    }

    #[test]
    fn test_webp_disabled_uploads_once() {
        let f = Fixture::new();
        f.write("media/a.png", b"png bytes");
        let result = f.pipeline().process_batch(&urls(&["/media/a.png"]), None);
        assert_eq!(f.store.keys(), ["a.png"]);
        assert_eq!(result.details()[0].webp, WebpOutcome::None);
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut f = Fixture::with_store(RecordingStore::failing(|k| k == "broken.js"));
        f.config.cdn.max_file_size = 1024;
        f.write("static/ok1.js", b"var a;");
        f.write("static/empty.js", b"");
        f.write("static/huge.js", &script(4096));
        f.write("static/broken.js", b"var b;");
        f.write("static/ok2.js", b"var c;");

        let list = urls(&[
            "/static/ok1.js",
            "/elsewhere/x.js",
            "/static/missing.js",
            "/static/empty.js",
            "/static/huge.js",
            "/static/broken.js",
            "/static/ok2.js",
        ]);
        let result = f.pipeline().process_batch(&list, None);

        assert_eq!(result.total, list.len());
        assert_eq!((result.success, result.failed), (2, 5));
        let codes: Vec<_> = result
            .details()
            .iter()
            .map(|d| match &d.outcome {
                AssetOutcome::Failed(e) => e.code(),
                _ => "ok",
            })
            .collect();
        assert_eq!(
            codes,
            [
                "ok",
                "unsupported_url_format",
                "file_not_found",
                "file_empty",
                "file_too_large",
                "upload_failed",
                "ok"
            ]
        );
        assert_eq!(result.status(), BatchStatus::Partial);
    }

    struct SerialStore;

    impl RemoteStore for SerialStore {
        fn name(&self) -> &'static str {
            "serial"
        }

        fn concurrent_uploads(&self) -> bool {
            false
        }

        fn upload_file(&self, _: &Path, _: &str) -> Result<(), crate::store::StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_parallel_needs_concurrent_store() {
        let mut f = Fixture::new();
        f.config.cdn.parallel = true;

        assert!(f.pipeline().parallel);
        let serial = Pipeline::new(
            &f.config,
            Arc::new(SerialStore),
            Arc::new(FakeImages::default()),
            Arc::new(CriticalFiles::default()),
        );
        assert!(!serial.parallel);
    }

    #[test]
    fn test_parallel_keeps_input_order() {
        let mut f = Fixture::new();
        f.config.cdn.parallel = true;
        let names: Vec<String> = (0..16).map(|i| format!("/static/f{i}.js")).collect();
        for name in &names {
            f.write(name.trim_start_matches('/'), b"var x;");
        }

        let result = f.pipeline().process_batch(&names, None);
        let got: Vec<_> = result.details().iter().map(|d| d.url.clone()).collect();
        assert_eq!(got, names);
        assert_eq!(result.success, 16);
    }

    #[test]
    fn test_split_failure_records_no_manifest_entry() {
        let f = Fixture::with_store(RecordingStore::failing(|k| k.ends_with("_chunk2.js")));
        f.write("static/big.js", &script(500 * 1024));
        let manifest = Arc::new(ManifestFile::new(f.manifest_path()));

        let result = f
            .pipeline()
            .with_manifest(manifest.clone())
            .process_batch(&urls(&["/static/big.js"]), None);
        assert!(matches!(
            result.details()[0].outcome,
            AssetOutcome::Failed(AssetError::SplitFailed { .. })
        ));
        assert!(result.split_records().is_empty());
        assert!(!f.manifest_path().exists());
    }

    #[test]
    fn test_manifest_merged_once_after_batch() {
        let f = Fixture::new();
        f.write("static/a.js", &script(200 * 1024));
        f.write("static/b.js", &script(300 * 1024));
        let manifest = Arc::new(ManifestFile::new(f.manifest_path()));
        manifest
            .update(&[SplitRecord {
                original: "/static/old.js".into(),
                loader: "old_loader.js".into(),
                chunks: 5,
            }])
            .unwrap();

        let pipeline = f.pipeline().with_manifest(manifest.clone());
        pipeline.process_batch(&urls(&["/static/a.js", "/static/b.js"]), None);
        pipeline.process_batch(&urls(&["/static/a.js"]), None);

        let stored = manifest.load().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored.get("/static/a.js").unwrap().loader, "a_loader.js");
    }

    #[test]
    fn test_disabled_cdn_aborts_batch() {
        let mut f = Fixture::new();
        f.config.cdn.enable = false;
        f.write("static/app.js", b"var a;");

        let result = f.pipeline().process_batch(&urls(&["/static/app.js", "/x"]), None);
        assert_eq!((result.total, result.failed), (2, 2));
        assert!(result.details().is_empty());
        assert!(result.error.is_some());
        assert!(f.store.keys().is_empty());
    }

    #[test]
    fn test_missing_root_aborts_batch() {
        let f = Fixture::new();
        fs::remove_dir_all(&f.config.paths.media_root).unwrap();
        let result = f.pipeline().process_batch(&urls(&["/static/app.js"]), None);
        assert!(result.error.unwrap().contains("root directory"));
    }

    #[test]
    fn test_cancelled_batch_skips_remaining() {
        let f = Fixture::new();
        f.write("static/app.js", b"var a;");
        let token = CancelToken::new();
        token.cancel();

        let result = f
            .pipeline()
            .with_cancel(token)
            .process_batch(&urls(&["/static/app.js"]), None);
        assert_eq!((result.success, result.failed, result.skipped), (0, 0, 1));
        assert!(f.store.keys().is_empty());
    }

    #[test]
    fn test_duplicate_urls_processed_independently() {
        let f = Fixture::new();
        f.write("static/app.js", b"var a;");
        let result = f
            .pipeline()
            .process_batch(&urls(&["/static/app.js", "/static/app.js"]), None);
        assert_eq!(result.success, 2);
        assert_eq!(f.store.keys(), ["app.js", "app.js"]);
    }

    struct PanickingImages;

    impl ImageProcessor for PanickingImages {
        fn is_image_file(&self, path: &Path) -> bool {
            AssetKind::from_path(path) == AssetKind::Image
        }

        fn convert_to_webp(&self, _: &Path) -> Option<PathBuf> {
            panic!("decoder exploded")
        }
    }

    #[test]
    fn test_webp_panic_keeps_primary_upload() {
        let mut f = Fixture::new();
        f.config.webp.enable = true;
        f.write("media/a.png", b"png");
        f.write("static/app.js", b"var a;");

        let pipeline = Pipeline::new(
            &f.config,
            f.store.clone(),
            Arc::new(PanickingImages),
            Arc::new(CriticalFiles::default()),
        );
        let result = pipeline.process_batch(&urls(&["/media/a.png", "/static/app.js"]), None);

        let png = &result.details()[0];
        assert_eq!(
            png.outcome,
            AssetOutcome::Uploaded {
                remote_path: "a.png".into()
            }
        );
        assert_eq!(
            png.webp,
            WebpOutcome::ConversionFailed(AssetError::Unexpected {
                message: "decoder exploded".into()
            })
        );
        assert!(result.details()[1].outcome.is_success());
        assert_eq!(result.success, 2);
        assert_eq!(result.failed, 0);
        assert_eq!(f.store.keys(), ["a.png", "app.js"]);
    }

    struct PanickingStore;

    impl RemoteStore for PanickingStore {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn upload_file(&self, _: &Path, key: &str) -> Result<(), crate::store::StoreError> {
            if key == "boom.js" {
                panic!("connection pool poisoned");
            }
            Ok(())
        }
    }

    #[test]
    fn test_upload_panic_is_contained_per_url() {
        let f = Fixture::new();
        f.write("static/boom.js", b"var b;");
        f.write("static/app.js", b"var a;");

        let pipeline = Pipeline::new(
            &f.config,
            Arc::new(PanickingStore),
            Arc::new(FakeImages::default()),
            Arc::new(CriticalFiles::default()),
        );
        let result = pipeline.process_batch(&urls(&["/static/boom.js", "/static/app.js"]), None);
        assert_eq!(
            result.details()[0].outcome,
            AssetOutcome::Failed(AssetError::Unexpected {
                message: "connection pool poisoned".into()
            })
        );
        assert!(result.details()[1].outcome.is_success());
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let inner = std::io::Error::other("disk full");
        let err = crate::store::StoreError::Write {
            path: "cdn/a.js".into(),
            source: inner,
        };
        assert_eq!(error_chain(&err), "failed to write `cdn/a.js`: disk full");
    }
}
