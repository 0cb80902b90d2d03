//! The dealer-facing surface, one cached query per data domain.
//!
//! Screens call [`DealerPortal`] instead of the fetchers directly:
//! each domain (dealer details, catalog, orders, finance) sits behind
//! its own [`CachedQuery`], so repeat reads inside the validity window
//! cost nothing and a submission can invalidate exactly the domains it
//! changed. Domains are independent; there is no ordering between a
//! catalog load and a finance load.
//!
//! Cached rows belong to the signed-in user. The portal stamps the
//! owning user into the cache store and checks the stamp on every
//! read, purging all four domains before the read proceeds when it
//! does not match; a watcher on the session subscription clears them
//! on sign-out as well.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{spawn_refresh, CacheStore, CachedQuery, FileStore, RefreshHandle};
use crate::config::Config;
use crate::fetch::{Dealers, FetchError, Finance, OrderDraft, Orders, Pricing};
use crate::models::{Catalog, Dealer, DealerFinance, Order};
use crate::session::SessionHandle;
use crate::store::{RecordStore, RestStore};

const DEALER_KEY: &str = "dealer_details";
const CATALOG_KEY: &str = "products";
const ORDERS_KEY: &str = "orders";
const FINANCE_KEY: &str = "finance";
const OWNER_KEY: &str = "cache_owner";

pub struct DealerPortal {
    session: SessionHandle,
    cache: Arc<dyn CacheStore>,
    owner_gate: Mutex<()>,
    dealers: Dealers,
    pricing: Pricing,
    orders: Orders,
    finance: Finance,
    dealer_cache: Arc<CachedQuery<Dealer>>,
    catalog_cache: Arc<CachedQuery<Catalog>>,
    orders_cache: Arc<CachedQuery<Vec<Order>>>,
    finance_cache: Arc<CachedQuery<DealerFinance>>,
}

impl DealerPortal {
    /// Wire up a portal against the configured remote store, caching
    /// to the configured cache directory.
    pub fn from_config(config: &Config, session: SessionHandle) -> Result<Self> {
        let (url, anon_key) = config.store_settings()?;
        let store = Arc::new(RestStore::new(url, anon_key, session.subscribe())?);
        let cache = Arc::new(FileStore::new(config.cache_dir()?)?);
        Ok(Self::new(store, cache, session))
    }

    /// Must run inside a runtime: a watcher task is spawned that
    /// purges every cached domain when the session changes. The purge
    /// also runs inline on the first read after a sign-in switch, so a
    /// new user is never served rows fetched under the previous one.
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn CacheStore>,
        session: SessionHandle,
    ) -> Self {
        let portal = Self {
            dealers: Dealers::new(Arc::clone(&store)),
            pricing: Pricing::new(Arc::clone(&store)),
            orders: Orders::new(Arc::clone(&store)),
            finance: Finance::new(store),
            dealer_cache: Arc::new(CachedQuery::new(DEALER_KEY, Arc::clone(&cache))),
            catalog_cache: Arc::new(CachedQuery::new(CATALOG_KEY, Arc::clone(&cache))),
            orders_cache: Arc::new(CachedQuery::new(ORDERS_KEY, Arc::clone(&cache))),
            finance_cache: Arc::new(CachedQuery::new(FINANCE_KEY, Arc::clone(&cache))),
            cache,
            owner_gate: Mutex::new(()),
            session,
        };
        portal.watch_session();
        portal
    }

    fn watch_session(&self) {
        let mut rx = self.session.subscribe();
        let dealer = Arc::clone(&self.dealer_cache);
        let catalog = Arc::clone(&self.catalog_cache);
        let orders = Arc::clone(&self.orders_cache);
        let finance = Arc::clone(&self.finance_cache);
        let store = Arc::clone(&self.cache);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                debug!("Session changed, clearing cached domains");
                dealer.clear().await;
                catalog.clear().await;
                orders.clear().await;
                finance.clear().await;
                if let Err(e) = store.remove(OWNER_KEY).await {
                    warn!(error = %e, "Failed to clear cache owner");
                }
            }
        });
    }

    fn user_id(&self) -> Result<String, FetchError> {
        self.session.user_id().ok_or_else(|| FetchError::Validation {
            field: "user_id",
            message: "No signed-in user".to_string(),
        })
    }

    /// Cached rows belong to the user whose token fetched them. The
    /// owner is stamped into the cache store next to the domain keys;
    /// a read by anyone else purges every domain before its own cache
    /// is consulted. Rows persisted by an earlier process run are
    /// covered the same way.
    async fn ensure_owner(&self, user_id: &str) {
        let _guard = self.owner_gate.lock().await;
        let owner = match self.cache.get(OWNER_KEY).await {
            Ok(owner) => owner,
            Err(e) => {
                warn!(error = %e, "Cache owner unreadable, treating as foreign");
                None
            }
        };
        if owner.as_deref() == Some(user_id) {
            return;
        }
        debug!(user_id, "Cache owner changed, purging cached domains");
        self.purge_caches().await;
        if let Err(e) = self.cache.put(OWNER_KEY, user_id).await {
            warn!(error = %e, "Failed to stamp cache owner");
        }
    }

    async fn purge_caches(&self) {
        self.dealer_cache.clear().await;
        self.catalog_cache.clear().await;
        self.orders_cache.clear().await;
        self.finance_cache.clear().await;
    }

    /// The signed-in user's dealer record.
    pub async fn dealer(&self, refresh: bool) -> Result<Dealer, FetchError> {
        let user_id = self.user_id()?;
        self.ensure_owner(&user_id).await;
        self.dealer_cache
            .load(refresh, || async move { self.dealers.by_user(&user_id).await })
            .await
    }

    /// The dealer's assigned price chart with its active items.
    pub async fn catalog(&self, refresh: bool) -> Result<Catalog, FetchError> {
        let user_id = self.user_id()?;
        self.ensure_owner(&user_id).await;
        self.catalog_cache
            .load(refresh, || self.fetch_catalog(user_id))
            .await
    }

    async fn fetch_catalog(&self, user_id: String) -> Result<Catalog, FetchError> {
        let dealer = self.dealers.by_user(&user_id).await?;
        let code = dealer
            .price_chart_code
            .as_deref()
            .ok_or(FetchError::NotFound("Price chart"))?;
        let chart = self.pricing.chart(code).await?;
        let items = self.pricing.active_items(&chart.id).await?;
        Ok(Catalog { chart, items })
    }

    /// The dealer's order history, newest first.
    pub async fn orders(&self, refresh: bool) -> Result<Vec<Order>, FetchError> {
        let user_id = self.user_id()?;
        self.ensure_owner(&user_id).await;
        self.orders_cache
            .load(refresh, || async move {
                let dealer = self.dealers.by_user(&user_id).await?;
                self.orders.for_dealer(&dealer.id).await
            })
            .await
    }

    /// The dealer's transaction ledger and running balance.
    pub async fn finance(&self, refresh: bool) -> Result<DealerFinance, FetchError> {
        let user_id = self.user_id()?;
        self.ensure_owner(&user_id).await;
        self.finance_cache
            .load(refresh, || async move { self.finance.for_user(&user_id).await })
            .await
    }

    /// Validate and submit an order, then invalidate the domains the
    /// new order changes so their next load refetches.
    pub async fn submit_order(&self, draft: &OrderDraft) -> Result<Order, FetchError> {
        let order = self.orders.create(draft).await?;
        self.orders_cache.invalidate();
        self.finance_cache.invalidate();
        Ok(order)
    }

    /// Keep every domain warm with one refresh per validity window.
    pub fn auto_refresh(self: &Arc<Self>) -> AutoRefresh {
        AutoRefresh {
            dealer: self.spawn_domain(DEALER_KEY, |p| async move { p.dealer(true).await.map(|_| ()) }),
            catalog: self.spawn_domain(CATALOG_KEY, |p| async move { p.catalog(true).await.map(|_| ()) }),
            orders: self.spawn_domain(ORDERS_KEY, |p| async move { p.orders(true).await.map(|_| ()) }),
            finance: self.spawn_domain(FINANCE_KEY, |p| async move { p.finance(true).await.map(|_| ()) }),
        }
    }

    fn spawn_domain<F, Fut>(self: &Arc<Self>, key: &'static str, refresh: F) -> RefreshHandle
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), FetchError>> + Send + 'static,
    {
        let portal = Arc::clone(self);
        spawn_refresh(key, move || refresh(Arc::clone(&portal)))
    }

    pub fn dealer_cache(&self) -> &CachedQuery<Dealer> {
        &self.dealer_cache
    }

    pub fn catalog_cache(&self) -> &CachedQuery<Catalog> {
        &self.catalog_cache
    }

    pub fn orders_cache(&self) -> &CachedQuery<Vec<Order>> {
        &self.orders_cache
    }

    pub fn finance_cache(&self) -> &CachedQuery<DealerFinance> {
        &self.finance_cache
    }
}

/// Background refresh schedules for all four domains. Dropping the
/// struct stops them.
pub struct AutoRefresh {
    dealer: RefreshHandle,
    catalog: RefreshHandle,
    orders: RefreshHandle,
    finance: RefreshHandle,
}

impl AutoRefresh {
    pub async fn stop(self) {
        self.dealer.stop().await;
        self.catalog.stop().await;
        self.orders.stop().await;
        self.finance.stop().await;
    }
}
