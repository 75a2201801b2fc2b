//! Configuration file watcher for hot reload.
//!
//! Each reload is compiled into a ready [`ClusterUpdate`]. Reloads whose
//! balancer section and endpoint list match the last accepted ones are
//! dropped, so editing only the observability section never rebuilds the
//! published cluster.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::balancers::Policy;
use crate::cluster::Cluster;
use crate::config::loader::load_config;
use crate::config::schema::{BalancerConfig, DriverConfig};
use crate::endpoint::EndpointInfo;

/// A compiled routing configuration, ready to be published.
#[derive(Debug, Clone)]
pub struct ClusterUpdate {
    pub policy: Policy,
    pub endpoints: Vec<Arc<EndpointInfo>>,
    pub local_dc: Option<String>,
}

impl ClusterUpdate {
    /// Compile the routing part of `config`.
    ///
    /// A balancer config that does not compile is logged and degraded to the
    /// configured fallback.
    pub fn compile(config: &DriverConfig) -> Self {
        let policy = config.balancer.policy(|e| {
            tracing::error!(error = %e, "Balancer config rejected");
        });
        Self {
            policy,
            endpoints: config.endpoint_handles(),
            local_dc: config.balancer.local_dc.clone(),
        }
    }

    pub fn build_cluster(&self) -> Cluster<EndpointInfo> {
        self.policy
            .build_cluster(self.endpoints.iter().cloned(), self.local_dc.as_deref())
    }
}

/// Remembers the routing inputs of the last accepted config.
#[derive(Debug, Default)]
pub struct ReloadFilter {
    last: Option<(BalancerConfig, Vec<EndpointInfo>)>,
}

impl ReloadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter treating `config` as already published.
    pub fn seeded(config: &DriverConfig) -> Self {
        Self {
            last: Some((config.balancer.clone(), config.endpoints.clone())),
        }
    }

    /// Compile `config`, or `None` if its routing inputs are unchanged.
    pub fn accept(&mut self, config: &DriverConfig) -> Option<ClusterUpdate> {
        if let Some((balancer, endpoints)) = &self.last {
            if *balancer == config.balancer && *endpoints == config.endpoints {
                return None;
            }
        }
        self.last = Some((config.balancer.clone(), config.endpoints.clone()));
        Some(ClusterUpdate::compile(config))
    }
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    filter: ReloadFilter,
    update_tx: mpsc::UnboundedSender<ClusterUpdate>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// `current` is the config already published; reloads equal to it in
    /// routing terms are not sent. Returns the watcher and a receiver for
    /// compiled updates.
    pub fn new(path: &Path, current: &DriverConfig) -> (Self, mpsc::UnboundedReceiver<ClusterUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                filter: ReloadFilter::seeded(current),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The parent directory is watched so that editors replacing the file
    /// by rename are still seen. Watching stops when the returned watcher
    /// is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut filter,
            update_tx,
        } = self;
        let dir = watch_dir(&path);
        let file_name = path.file_name().map(ToOwned::to_owned);
        let target = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if !event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                        return;
                    }
                    match load_config(&target) {
                        Ok(config) => match filter.accept(&config) {
                            Some(update) => {
                                tracing::info!(
                                    strategy = %update.policy.strategy,
                                    endpoints = update.endpoints.len(),
                                    "Config file changed, routing update compiled"
                                );
                                let _ = update_tx.send(update);
                            }
                            None => tracing::debug!("Config file changed, routing unchanged"),
                        },
                        Err(e) => {
                            tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancers::{Preference, Strategy};
    use std::fs;

    const SINGLE: &str = r#"
        [balancer]
        config = "single"

        [[endpoints]]
        node_id = 1
        address = "a:2135"
        location = "VLA"
    "#;

    fn parse(content: &str) -> DriverConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_first_config_is_accepted() {
        let mut filter = ReloadFilter::new();
        let update = filter.accept(&parse(SINGLE)).unwrap();
        assert_eq!(update.policy.strategy, Strategy::SingleConnection);
        assert_eq!(update.endpoints.len(), 1);
        assert!(filter.accept(&parse(SINGLE)).is_none());
    }

    #[test]
    fn test_observability_change_is_skipped() {
        let current = parse(SINGLE);
        let mut filter = ReloadFilter::seeded(&current);

        let mut reloaded = current.clone();
        reloaded.observability.log_level = "debug".into();
        assert!(filter.accept(&reloaded).is_none());
    }

    #[test]
    fn test_endpoint_change_is_accepted() {
        let current = parse(SINGLE);
        let mut filter = ReloadFilter::seeded(&current);

        let mut reloaded = current.clone();
        reloaded.endpoints.push(EndpointInfo::new(2, "b:2135", "MAN"));
        let update = filter.accept(&reloaded).unwrap();
        assert_eq!(update.endpoints.len(), 2);

        // the new list is now the baseline
        assert!(filter.accept(&reloaded).is_none());
        assert!(filter.accept(&current).is_some());
    }

    #[test]
    fn test_update_builds_cluster() {
        let config = parse(
            r#"
            [balancer]
            config = '{"type":"round_robin","prefer":"nearest_dc","fallback":true}'
            local_dc = "vla"

            [[endpoints]]
            node_id = 1
            address = "a:2135"
            location = "VLA"

            [[endpoints]]
            node_id = 2
            address = "b:2135"
            location = "MAN"
            "#,
        );
        let update = ClusterUpdate::compile(&config);
        assert_eq!(update.policy.preference, Preference::NearestDc);

        let cluster = update.build_cluster();
        assert_eq!(cluster.prefer()[0].node_id, 1);
        assert_eq!(cluster.fallback()[0].node_id, 2);
    }

    #[test]
    fn test_rejected_balancer_degrades() {
        let mut config = parse(SINGLE);
        config.balancer.config = "weighted".into();
        let update = ClusterUpdate::compile(&config);
        assert_eq!(update.policy, crate::balancers::default_policy());
    }

    #[test]
    fn test_watch_dir_of_bare_file_name() {
        assert_eq!(watch_dir(Path::new("driver.toml")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("/etc/driver.toml")), PathBuf::from("/etc"));
    }

    #[tokio::test]
    async fn test_reload_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driver.toml");
        fs::write(&path, SINGLE).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path, &parse(SINGLE));
        let _guard = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(&path, SINGLE.replace("\"single\"", "\"random_choice\"")).unwrap();

        let update = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match updates.recv().await {
                    Some(u) if u.policy.strategy == Strategy::RandomChoice => return u,
                    Some(_) => continue,
                    None => panic!("watcher channel closed"),
                }
            }
        })
        .await
        .expect("no reload observed");

        assert_eq!(update.endpoints.len(), 1);
        assert_eq!(update.endpoints[0].address, "a:2135");
    }
}
