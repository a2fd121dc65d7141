//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use secret_menu_core::Catalog;
use secret_menu_core::checkout::CheckoutUrls;
use secret_menu_core::menu::MenuCatalog;
use secret_menu_core::zone::ServiceArea;

use crate::config::StorefrontConfig;
use crate::services::stripe::{StripeClient, StripeError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: Catalog,
    menus: MenuCatalog,
    service_area: ServiceArea,
    checkout_urls: CheckoutUrls,
    stripe: StripeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        menus: MenuCatalog,
    ) -> Result<Self, StripeError> {
        let stripe = StripeClient::new(&config.stripe)?;
        let checkout_urls = CheckoutUrls::new(&config.base_url);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog: Catalog::standard(),
                menus,
                service_area: ServiceArea::san_francisco(),
                checkout_urls,
                stripe,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The plan tier table.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn menus(&self) -> &MenuCatalog {
        &self.inner.menus
    }

    /// Delivery-zone keyword sets.
    #[must_use]
    pub fn service_area(&self) -> &ServiceArea {
        &self.inner.service_area
    }

    /// Success and cancel URLs handed to checkout.
    #[must_use]
    pub fn checkout_urls(&self) -> &CheckoutUrls {
        &self.inner.checkout_urls
    }

    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }
}
