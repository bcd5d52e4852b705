//! Particle feed: record types, feed sources, and the caching loader.
//!
//! ## Fetch order
//!
//! [`ParticleLoader::fetch_particles`] never fails:
//!
//! 1. a cached result younger than the cache window is returned as-is;
//! 2. otherwise the primary source is tried;
//! 3. on error, the fallback source (if configured) is tried;
//! 4. if everything fails the result is an empty list.
//!
//! Fetching runs on Bevy's [`AsyncComputeTaskPool`] so the scene keeps
//! rendering (with zero cubes) until the feed resolves.  The resolved list is
//! announced with a [`ParticlesLoaded`] message.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task};
use serde::{Deserialize, Serialize};

use crate::config::{GalleryConfig, PrimarySource};
use crate::constants::DEFAULT_CUBE_COLOR;
use crate::error::{GalleryError, GalleryResult};

// ── Records ───────────────────────────────────────────────────────────────────

/// Unique key of a particle record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticleId(pub u64);

/// What an interactive cube opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// `src` is trusted markup.
    Html,
    /// `src` is an image path or URL.
    Photo,
    /// `src` is a target URL.
    Link,
}

/// One entry of the particle feed.  Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleRecord {
    pub id: ParticleId,
    /// Display label; `None` marks a decoy cube.
    #[serde(default)]
    pub name: Option<String>,
    /// `None` means decorative-only.
    #[serde(rename = "type", default)]
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Orbital radius.
    pub distance: f32,
    /// Whether the record appears in the side legend.
    #[serde(default)]
    pub is_listed: bool,
}

impl ParticleRecord {
    /// Interactive records open content when clicked or shot.
    #[inline]
    pub fn is_interactive(&self) -> bool {
        self.kind.is_some()
    }

    /// Record color, falling back to the default cyan when absent or invalid.
    pub fn color(&self) -> Color {
        match self.color.as_deref() {
            None => default_cube_color(),
            Some(hex) => parse_hex_color(hex).unwrap_or_else(|e| {
                warn!("particle {}: {e}; using default color", self.id.0);
                default_cube_color()
            }),
        }
    }

    /// Legend / panel label.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// Parse `#rrggbb`, `#rgb` (with or without `#`, optional alpha) into a color.
pub fn parse_hex_color(hex: &str) -> GalleryResult<Color> {
    Srgba::hex(hex)
        .map(Color::from)
        .map_err(|_| GalleryError::InvalidColor(hex.to_string()))
}

/// The fixed cyan used for records without a color.
pub fn default_cube_color() -> Color {
    Srgba::hex(DEFAULT_CUBE_COLOR)
        .map(Color::from)
        .unwrap_or(Color::srgb(0.0, 0.96, 1.0))
}

/// Parse a feed body and drop records the scene cannot place.
///
/// The body must be a JSON array.  Records that do not deserialize (unknown
/// `type`, missing `distance`, ...) or have a non-finite or non-positive
/// `distance` are skipped, and only the first record of any repeated `id` is
/// kept.
pub fn parse_feed(body: &str) -> GalleryResult<Vec<ParticleRecord>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let record: ParticleRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!("particle #{index}: {e}; skipped");
                continue;
            }
        };
        if !record.distance.is_finite() || record.distance <= 0.0 {
            warn!(
                "particle {}: distance {} is not a positive radius; skipped",
                record.id.0, record.distance
            );
            continue;
        }
        if !seen.insert(record.id) {
            warn!("particle {}: duplicate id; skipped", record.id.0);
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// Anything that can produce the particle list.
pub trait ParticleSource: Send + Sync {
    /// Human-readable origin for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> GalleryResult<Vec<ParticleRecord>>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    pub path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ParticleSource for LocalFileSource {
    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }

    fn fetch(&self) -> GalleryResult<Vec<ParticleRecord>> {
        let body = std::fs::read_to_string(&self.path)?;
        parse_feed(&body)
    }
}

/// HTTP endpoint returning the JSON array.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub url: String,
    pub timeout: Duration,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl ParticleSource for RemoteSource {
    fn describe(&self) -> String {
        format!("remote feed {}", self.url)
    }

    fn fetch(&self) -> GalleryResult<Vec<ParticleRecord>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::HttpStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text()?;
        parse_feed(&body)
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

struct CachedFeed {
    records: Vec<ParticleRecord>,
    fetched_at: Instant,
}

/// Primary/fallback loader with a freshness cache.
///
/// Cloning shares the cache, so a clone moved into a fetch task still
/// populates the cache seen by later reloads.
#[derive(Clone)]
pub struct ParticleLoader {
    primary: Arc<dyn ParticleSource>,
    fallback: Option<Arc<dyn ParticleSource>>,
    cache_duration: Duration,
    cache: Arc<Mutex<Option<CachedFeed>>>,
}

impl ParticleLoader {
    pub fn new(
        primary: Arc<dyn ParticleSource>,
        fallback: Option<Arc<dyn ParticleSource>>,
        cache_duration: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache_duration,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Build the loader described by the config: a remote primary falls back
    /// to the local file when `particles_fallback` is set.
    pub fn from_config(config: &GalleryConfig) -> Self {
        let local: Arc<dyn ParticleSource> =
            Arc::new(LocalFileSource::new(&config.particles_local_path));
        let cache = Duration::from_secs_f32(config.particles_cache_secs.max(0.0));
        match config.particles_source {
            PrimarySource::Local => Self::new(local, None, cache),
            PrimarySource::Remote => {
                let remote: Arc<dyn ParticleSource> = Arc::new(RemoteSource::new(
                    config.particles_remote_url.clone(),
                    Duration::from_secs_f32(config.particles_http_timeout_secs.max(0.1)),
                ));
                let fallback = config.particles_fallback.then_some(local);
                Self::new(remote, fallback, cache)
            }
        }
    }

    /// Fetch the particle list.  Never fails; the worst case is an empty list.
    pub fn fetch_particles(&self, now: Instant) -> Vec<ParticleRecord> {
        if let Some(cached) = self.cached(now) {
            debug!("particles: using cached feed ({} records)", cached.len());
            return cached;
        }

        match self.primary.fetch() {
            Ok(records) => {
                info!(
                    "particles: loaded {} records from {}",
                    records.len(),
                    self.primary.describe()
                );
                return self.store(records, now);
            }
            Err(e) => error!("particles: {} failed: {e}", self.primary.describe()),
        }

        if let Some(fallback) = &self.fallback {
            info!("particles: falling back to {}", fallback.describe());
            match fallback.fetch() {
                Ok(records) => {
                    info!("particles: fallback loaded {} records", records.len());
                    return self.store(records, now);
                }
                Err(e) => error!("particles: fallback {} failed: {e}", fallback.describe()),
            }
        }

        Vec::new()
    }

    fn cached(&self, now: Instant) -> Option<Vec<ParticleRecord>> {
        let guard = self.lock_cache();
        let cached = guard.as_ref()?;
        let age = now.saturating_duration_since(cached.fetched_at);
        (age < self.cache_duration).then(|| cached.records.clone())
    }

    fn store(&self, records: Vec<ParticleRecord>, now: Instant) -> Vec<ParticleRecord> {
        *self.lock_cache() = Some(CachedFeed {
            records: records.clone(),
            fetched_at: now,
        });
        records
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Option<CachedFeed>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Bevy integration ──────────────────────────────────────────────────────────

/// The configured loader, shared by the initial load and every reload.
#[derive(Resource, Clone)]
pub struct ParticleFeed(pub ParticleLoader);

/// In-flight fetch task, if any.
#[derive(Resource, Default)]
pub struct PendingFeed(pub Option<Task<Vec<ParticleRecord>>>);

/// Most recently resolved feed; read by the legend.
#[derive(Resource, Default, Debug, Clone)]
pub struct LoadedParticles(pub Vec<ParticleRecord>);

/// Emitted when a fetch resolves (possibly with an empty list).
#[derive(Message, Debug, Clone)]
pub struct ParticlesLoaded(pub Vec<ParticleRecord>);

/// Request to tear down the cubes and fetch the feed again.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ReloadParticles;

pub struct ParticleFeedPlugin;

impl Plugin for ParticleFeedPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingFeed>()
            .init_resource::<LoadedParticles>()
            .add_message::<ParticlesLoaded>()
            .add_message::<ReloadParticles>()
            .add_systems(
                Startup,
                start_initial_fetch.after(crate::config::load_gallery_config),
            )
            .add_systems(
                Update,
                (
                    reload_hotkey_system,
                    restart_fetch_on_reload,
                    poll_particle_feed_system,
                )
                    .chain(),
            );
    }
}

/// Spawn a fetch on the async compute pool, replacing any pending one.
pub fn spawn_fetch(feed: &ParticleFeed, pending: &mut PendingFeed) {
    let loader = feed.0.clone();
    let task = AsyncComputeTaskPool::get().spawn(async move { loader.fetch_particles(Instant::now()) });
    pending.0 = Some(task);
}

/// Startup system: build the loader from config and kick off the first fetch.
pub fn start_initial_fetch(
    mut commands: Commands,
    config: Res<GalleryConfig>,
    mut pending: ResMut<PendingFeed>,
) {
    let feed = ParticleFeed(ParticleLoader::from_config(&config));
    spawn_fetch(&feed, &mut pending);
    commands.insert_resource(feed);
}

/// `R` reloads the scene's cubes.
pub fn reload_hotkey_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut reloads: MessageWriter<ReloadParticles>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        reloads.write(ReloadParticles);
    }
}

/// Start a new fetch for every reload request (coalesced per frame).
pub fn restart_fetch_on_reload(
    mut reloads: MessageReader<ReloadParticles>,
    feed: Option<Res<ParticleFeed>>,
    mut pending: ResMut<PendingFeed>,
) {
    if reloads.read().count() == 0 {
        return;
    }
    let Some(feed) = feed else {
        return;
    };
    spawn_fetch(&feed, &mut pending);
}

/// Poll the in-flight fetch and announce its result once ready.
pub fn poll_particle_feed_system(
    mut pending: ResMut<PendingFeed>,
    mut loaded: ResMut<LoadedParticles>,
    mut announcements: MessageWriter<ParticlesLoaded>,
) {
    let Some(task) = pending.0.as_mut() else {
        return;
    };
    let Some(records) = block_on(future::poll_once(task)) else {
        return;
    };
    pending.0 = None;
    loaded.0 = records.clone();
    announcements.write(ParticlesLoaded(records));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn shipped_feed_parses() {
        let records = parse_feed(include_str!("../assets/particles.json")).unwrap();
        assert_eq!(records.len(), 10);
        assert!(records.iter().any(|r| r.is_interactive()));
        assert!(records.iter().any(|r| !r.is_interactive()));
    }

    struct Unreachable;

    impl ParticleSource for Unreachable {
        fn describe(&self) -> String {
            "unreachable".into()
        }
        fn fetch(&self) -> GalleryResult<Vec<ParticleRecord>> {
            Err(GalleryError::HttpStatus { status: 503 })
        }
    }

    struct Fixed {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ParticleSource for Fixed {
        fn describe(&self) -> String {
            "fixed".into()
        }
        fn fetch(&self) -> GalleryResult<Vec<ParticleRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            parse_feed(self.body)
        }
    }

    const ONE_DECOY: &str =
        r#"[{"id":1,"name":null,"type":null,"distance":4,"isListed":false}]"#;

    #[test]
    fn unreachable_primary_uses_fallback_records() {
        let loader = ParticleLoader::new(
            Arc::new(Unreachable),
            Some(Fixed::new(ONE_DECOY)),
            Duration::from_secs(300),
        );
        let records = loader.fetch_particles(Instant::now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, ParticleId(1));
        assert_eq!(records[0].distance, 4.0);
        assert!(!records[0].is_interactive());
        assert!(!records[0].is_listed);
    }

    #[test]
    fn all_sources_failing_resolves_to_empty() {
        let loader = ParticleLoader::new(
            Arc::new(Unreachable),
            Some(Arc::new(Unreachable)),
            Duration::from_secs(300),
        );
        assert!(loader.fetch_particles(Instant::now()).is_empty());
    }

    #[test]
    fn fresh_cache_skips_sources_until_it_expires() {
        let source = Fixed::new(ONE_DECOY);
        let loader = ParticleLoader::new(source.clone(), None, Duration::from_secs(300));
        let t0 = Instant::now();

        loader.fetch_particles(t0);
        loader.fetch_particles(t0 + Duration::from_secs(100));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        loader.fetch_particles(t0 + Duration::from_secs(301));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_the_cache() {
        let source = Fixed::new(ONE_DECOY);
        let loader = ParticleLoader::new(source.clone(), None, Duration::from_secs(300));
        let t0 = Instant::now();
        loader.clone().fetch_particles(t0);
        loader.fetch_particles(t0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let loader = ParticleLoader::new(Arc::new(Unreachable), None, Duration::from_secs(300));
        assert!(loader.fetch_particles(Instant::now()).is_empty());
        assert!(loader.cached(Instant::now()).is_none());
    }

    #[test]
    fn feed_parsing_accepts_full_records_and_skips_bad_ones() {
        let body = r##"[
            {"id":7,"name":"About Me","type":"html","src":"<p>hi</p>","color":"#ffffff","distance":3.5,"isListed":true},
            {"id":8,"name":null,"type":null,"distance":-1},
            {"id":7,"name":"dup","type":"link","distance":2}
        ]"##;
        let records = parse_feed(body).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.kind, Some(ContentKind::Html));
        assert_eq!(r.label(), "About Me");
        assert!(r.is_listed);
        assert_eq!(r.color(), Color::from(Srgba::hex("#ffffff").unwrap()));
    }

    #[test]
    fn malformed_records_are_skipped_without_losing_the_feed() {
        let body = r#"[
            {"id":1,"name":null,"type":null,"distance":4},
            {"id":2,"name":"x","type":"video","distance":2},
            {"id":3,"name":"no distance","type":"html"},
            {"id":4,"name":"Links","type":"link","src":"https://example.org","distance":5}
        ]"#;
        let ids: Vec<u64> = parse_feed(body).unwrap().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn non_array_body_is_an_error() {
        assert!(matches!(
            parse_feed(r#"{"id":1}"#),
            Err(GalleryError::Json(_))
        ));
    }

    #[test]
    fn invalid_or_missing_color_falls_back_to_cyan() {
        let mut record: ParticleRecord =
            serde_json::from_str(r#"{"id":1,"distance":2}"#).unwrap();
        assert_eq!(record.color(), default_cube_color());
        record.color = Some("not-a-color".into());
        assert_eq!(record.color(), default_cube_color());
        assert!(parse_hex_color("zz").is_err());
    }
}
