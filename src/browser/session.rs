use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            dom::{self, DomTree},
            error::{RecorderError, Result},
            session::Environment};
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};
use url::Url;

/// Browser session that hosts the recorded tab
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab the recording runs in
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A long walk over many pages must not hit the idle timeout
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path;
        launch_opts.user_data_dir = options.user_data_dir;
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| RecorderError::LaunchFailed(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| RecorderError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::debug!("Browser launched (headless: {})", options.headless);
        Ok(Self { browser, tab })
    }

    /// Connect to an existing browser instance via WebSocket
    ///
    /// The first open tab is used, or a new one when none is open.
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser =
            Browser::connect(options.ws_url.clone()).map_err(|e| RecorderError::ConnectionFailed(e.to_string()))?;

        let existing = browser
            .get_tabs()
            .lock()
            .map_err(|e| RecorderError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .first()
            .cloned();

        let tab = match existing {
            Some(tab) => tab,
            None => browser
                .new_tab()
                .map_err(|e| RecorderError::TabOperationFailed(format!("Failed to create tab: {}", e)))?,
        };
        tab.set_default_timeout(Duration::from_millis(options.timeout));

        log::debug!("Connected to {}", options.ws_url);
        Ok(Self { browser, tab })
    }

    /// Get the recorded tab
    pub fn tab(&self) -> Arc<Tab> {
        self.tab.clone()
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the tab and wait for the load to finish
    pub fn navigate(&self, url: &Url) -> Result<()> {
        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| RecorderError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        self.wait_for_navigation()
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| RecorderError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Current location of the tab
    pub fn location(&self) -> Result<Url> {
        Url::parse(&self.tab.get_url())
            .map_err(|e| RecorderError::NavigationFailed(format!("Tab has no usable URL: {}", e)))
    }

    /// Snapshot the page currently loaded in the tab
    pub fn snapshot(&self) -> Result<DomTree> {
        dom::extract_dom(&self.tab)
    }

    /// Browser name and version reported by DevTools
    pub fn version(&self) -> Result<(String, String)> {
        let version = self
            .browser
            .get_version()
            .map_err(|e| RecorderError::TabOperationFailed(format!("Failed to query version: {}", e)))?;

        Ok(split_product(&version.product))
    }

    /// Environment description for export summaries
    pub fn environment(&self) -> Environment {
        match self.version() {
            Ok((name, version)) => Environment::detect(name, version),
            Err(e) => {
                log::warn!("{}", e);
                Environment::default()
            }
        }
    }

    /// Close the tab; the browser shuts down when the session is dropped
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| RecorderError::TabOperationFailed(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}

/// `HeadlessChrome/120.0.6099.109` → (`HeadlessChrome`, `120.0.6099.109`)
fn split_product(product: &str) -> (String, String) {
    match product.split_once('/') {
        Some((name, version)) => (name.to_string(), version.to_string()),
        None => (product.to_string(), "unknown".to_string()),
    }
}
