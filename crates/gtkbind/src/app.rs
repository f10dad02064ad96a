use std::path::Path;

use gtkbind_sys::constants::GTK_STYLE_PROVIDER_PRIORITY_APPLICATION;
use tracing::{debug, warn};

use crate::component::Component;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::widgets::StyleProvider;

/// Owns the root window and application-wide style sheets.
pub struct Application {
    context: Context,
    root: Option<Component>,
    styles: Vec<StyleProvider>,
    /// Providers loaded before the root window was mounted.
    pending: Vec<StyleProvider>,
}

impl Application {
    pub fn new(context: &Context) -> Self {
        Self {
            context: context.clone(),
            root: None,
            styles: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Loads GTK from the default locations or the `GTKBIND_*_LIBRARY` overrides.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(&Context::from_env()?))
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn init(&self) {
        self.context.init();
    }

    /// Creates the root window, replacing any earlier one.
    pub fn create_window(&mut self, title: &str, width: i32, height: i32) -> Component {
        let window = Component::window(&self.context, title, width, height);
        if self.root.replace(window.clone()).is_some() {
            debug!(title, "replacing root window");
        }
        window
    }

    pub fn root_window(&self) -> Option<Component> {
        self.root.clone()
    }

    /// Mounts and shows the root window, then blocks in the main loop until it quits.
    pub fn run(&mut self) -> Result<()> {
        let root = self.root.clone().ok_or(Error::NoRootWindow)?;
        self.context.init();
        root.mount()?;
        self.apply_pending();
        root.show();
        self.context.run()
    }

    pub fn quit(&self) {
        self.context.quit();
    }

    /// Adds a style sheet for every widget on the screen. Returns `false` if it did not load.
    pub fn load_css(&mut self, css: &str) -> bool {
        let Some(provider) = self.provider() else {
            return false;
        };
        if !provider.load_from_data(css) {
            provider.release();
            return false;
        }
        self.install(provider);
        true
    }

    pub fn load_css_file(&mut self, path: impl AsRef<Path>) -> bool {
        let Some(provider) = self.provider() else {
            return false;
        };
        if !provider.load_from_path(path.as_ref()) {
            provider.release();
            return false;
        }
        self.install(provider);
        true
    }

    fn provider(&self) -> Option<StyleProvider> {
        self.context.init();
        match StyleProvider::new(&self.context) {
            Ok(provider) => Some(provider),
            Err(err) => {
                warn!(%err, "failed to create style provider");
                None
            }
        }
    }

    fn install(&mut self, provider: StyleProvider) {
        self.pending.push(provider);
        if self.root.as_ref().is_some_and(Component::is_mounted) {
            self.apply_pending();
        }
    }

    fn apply_pending(&mut self) {
        let Some(anchor) = self.root.as_ref().and_then(Component::widget) else {
            return;
        };
        for provider in self.pending.drain(..) {
            match provider.apply_to_screen(&anchor, GTK_STYLE_PROVIDER_PRIORITY_APPLICATION) {
                Ok(()) => self.styles.push(provider),
                Err(err) => warn!(%err, "failed to apply style sheet"),
            }
        }
    }
}
